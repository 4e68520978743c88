//! Identity verification
//!
//! Opens a session for a key pair and resolves who it authenticates as.
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


use rotator_keys::{
    CallerIdentity, IdentityProvider, IdentitySession, KeyPair, RotateError, RotateResult,
};
use std::sync::Arc;
use tracing::debug;

/// Result of a successful verification.
///
/// Built once per key pair and threaded through the rest of the rotation,
/// so later steps reuse the same session instead of reconnecting.
pub struct VerifiedIdentity {
    pub session: Arc<dyn IdentitySession>,
    /// First account alias reported by the provider
    pub alias: String,
    pub caller: CallerIdentity,
}

impl VerifiedIdentity {
    pub fn account_id(&self) -> &str {
        &self.caller.account
    }

    pub fn user_name(&self) -> &str {
        self.caller.user_name()
    }
}

/// Verify that `key` authenticates, returning its alias and caller identity
pub async fn verify_identity(
    provider: &dyn IdentityProvider,
    key: &KeyPair,
    token: Option<&str>,
) -> RotateResult<VerifiedIdentity> {
    if !key.is_complete() {
        return Err(RotateError::InvalidKey(format!(
            "access key id {:?} has an empty id or secret",
            key.access_key_id
        )));
    }

    debug!(access_key_id = %key.access_key_id, "Opening session");
    let session = provider.open_session(key, token).await?;

    let alias = session
        .account_aliases()
        .await?
        .into_iter()
        .next()
        .ok_or(RotateError::NoAccountAlias)?;

    let caller = session.caller_identity().await?;

    debug!(
        access_key_id = %key.access_key_id,
        alias = %alias,
        caller = %caller,
        "Verified key pair"
    );

    Ok(VerifiedIdentity {
        session,
        alias,
        caller,
    })
}
