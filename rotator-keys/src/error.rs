//! Error types for credential rotation
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


use std::path::PathBuf;
use thiserror::Error;

/// Credential rotation errors
#[derive(Error, Debug)]
pub enum RotateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse credentials: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to back up {path:?}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key pair: {0}")]
    InvalidKey(String),

    #[error("Verification failed: {0}")]
    Verify(String),

    #[error("No account alias configured for this account")]
    NoAccountAlias,

    #[error("Alias did not match. Expected: {expected:?} Got: {actual:?}")]
    AliasMismatch { expected: String, actual: String },

    #[error("Access key creation failed: {0}")]
    KeyCreate(String),

    #[error("Role assumption failed: {0}")]
    AssumeRole(String),

    #[error("Identity changed. Expected {expected} Got {actual}")]
    IdentityDrift { expected: String, actual: String },

    #[error("Failed to set {variable} on {project}: {reason}")]
    Publish {
        project: String,
        variable: String,
        reason: String,
    },

    #[error("Access key deletion failed: {0}")]
    KeyDelete(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for rotation operations
pub type RotateResult<T> = Result<T, RotateError>;
