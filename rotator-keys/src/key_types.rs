//! Credential record and identity types
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Account alias an identity is filed under in the credential file
pub type AccountAlias = String;

/// Every identity in the credential file, keyed by account alias
pub type CredentialMap = BTreeMap<AccountAlias, CredentialRecord>;

/// Access key id / secret pair
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl KeyPair {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Both halves must be present before a session can be opened
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// A CI project and the variable names the keys are exposed under there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectExposure {
    /// Variable receiving the access key id
    #[serde(rename = "AWS_ACCESS_KEY_ID", default)]
    pub access_key_var: String,
    /// Variable receiving the secret access key
    #[serde(rename = "AWS_SECRET_ACCESS_KEY", default)]
    pub secret_var: String,
    /// CI project name
    #[serde(default)]
    pub name: String,
}

/// Persisted credentials for one identity
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "AWS_ACCESS_KEY_ID", default)]
    pub access_key_id: String,
    #[serde(rename = "AWS_SECRET_ACCESS_KEY", default)]
    pub secret_access_key: String,
    /// Optional session token; written back even when empty
    #[serde(rename = "TOKEN", default)]
    pub token: String,
    #[serde(default)]
    pub projects: Vec<ProjectExposure>,
}

impl CredentialRecord {
    pub fn key_pair(&self) -> KeyPair {
        KeyPair::new(self.access_key_id.clone(), self.secret_access_key.clone())
    }

    pub fn session_token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    /// Copy of this record carrying a freshly issued key pair.
    ///
    /// A new access key never has a session token, so the token is cleared.
    pub fn with_key_pair(&self, key: KeyPair) -> Self {
        Self {
            access_key_id: key.access_key_id,
            secret_access_key: key.secret_access_key,
            token: String::new(),
            projects: self.projects.clone(),
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("projects", &self.projects)
            .finish()
    }
}

/// Who a key pair authenticates as
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Account id
    pub account: String,
    /// Caller ARN, e.g. `arn:aws:iam::123:user/deploy-bot`
    pub arn: String,
    /// Provider-specific unique id; informational only
    pub user_id: String,
}

impl CallerIdentity {
    /// IAM user name: whatever follows the last `/` of the ARN
    pub fn user_name(&self) -> &str {
        after(&self.arn, "/")
    }

    /// Two identities are the same caller when account and ARN both match.
    pub fn same_caller(&self, other: &CallerIdentity) -> bool {
        self.account == other.account && self.arn == other.arn
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (account {})", self.arn, self.account)
    }
}

/// Substring after the last occurrence of `separator`.
///
/// Empty when the separator is absent or is the final character.
pub fn after<'a>(value: &'a str, separator: &str) -> &'a str {
    match value.rfind(separator) {
        Some(pos) => &value[pos + separator.len()..],
        None => "",
    }
}
