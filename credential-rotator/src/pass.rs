//! One rotation pass over a credential file
//!
//! Load, rotate every identity, write the file back once, and reduce the
//! result to a process exit status.
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


use crate::rotation::Rotator;
use rotator_keys::CredentialStore;
use std::process::ExitCode;
use tracing::{error, info};

/// Overall result of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Every identity rotated and the file was written
    Success,
    /// The file could not be read or written, or an identity did not
    /// rotate cleanly
    Failure,
}

impl From<PassStatus> for ExitCode {
    fn from(status: PassStatus) -> Self {
        match status {
            PassStatus::Success => ExitCode::SUCCESS,
            PassStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Rotate every identity in `store` and persist the result
pub async fn run_pass(store: &CredentialStore, rotator: &Rotator) -> PassStatus {
    let path = store.path().display();

    let credentials = match store.load().await {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read credentials");
            return PassStatus::Failure;
        }
    };
    info!(
        path = %path,
        identities = credentials.len(),
        "Starting rotation"
    );

    let report = rotator.rotate_all(&credentials).await;

    if let Err(e) = store.save(&report.credentials).await {
        error!(
            path = %path,
            error = %e,
            rotated = report.rotated_count(),
            "Failed to write credentials file; rotated keys were not persisted"
        );
        return PassStatus::Failure;
    }

    let status = report.pass_status();
    if status == PassStatus::Failure {
        error!(
            failed = report.failure_count(),
            "Some identities were not rotated cleanly"
        );
    }
    status
}
