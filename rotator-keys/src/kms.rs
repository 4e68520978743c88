//! Capability interfaces for the identity provider
//!
//! The rotation core only talks to the cloud through these traits:
//! - [`IdentityProvider`] opens a session from a key pair
//! - [`IdentitySession`] answers "who am I" and hands out key managers
//! - [`AccessKeyManager`] creates and deletes access keys
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


use crate::error::RotateResult;
use crate::key_types::{CallerIdentity, KeyPair};
use async_trait::async_trait;
use std::sync::Arc;

/// Opens authenticated sessions against the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Establish a session for a key pair and optional session token
    async fn open_session(
        &self,
        key: &KeyPair,
        token: Option<&str>,
    ) -> RotateResult<Arc<dyn IdentitySession>>;
}

/// A live session authenticated as one identity
#[async_trait]
pub trait IdentitySession: Send + Sync {
    /// Account aliases, in the order the provider returns them
    async fn account_aliases(&self) -> RotateResult<Vec<String>>;

    /// Caller identity of this session
    async fn caller_identity(&self) -> RotateResult<CallerIdentity>;

    /// Key manager acting with the session's own credentials
    fn direct_client(&self) -> Arc<dyn AccessKeyManager>;

    /// Key manager acting through a role assumed with this session
    fn assume_role(&self, role_arn: &str) -> RotateResult<Arc<dyn AccessKeyManager>>;
}

/// Access key lifecycle for IAM users
#[async_trait]
pub trait AccessKeyManager: Send + Sync {
    /// Create a new access key for `user_name`
    async fn create_access_key(&self, user_name: &str) -> RotateResult<KeyPair>;

    /// Delete `access_key_id` belonging to `user_name`
    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> RotateResult<()>;
}
