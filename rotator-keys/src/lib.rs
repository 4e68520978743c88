//! Credential model and identity-provider capabilities for the rotator
//!
//! Provides the persisted credential records, the rotation error taxonomy,
//! the traits the rotation core consumes, and the JSON credential file store.
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


pub mod error;
pub mod key_types;
pub mod kms;
pub mod local_store;

pub use error::{RotateError, RotateResult};
pub use key_types::{
    after, AccountAlias, CallerIdentity, CredentialMap, CredentialRecord, KeyPair,
    ProjectExposure,
};
pub use kms::{AccessKeyManager, IdentityProvider, IdentitySession};
pub use local_store::CredentialStore;
