//! Credential Rotator Library
//!
//! Rotates IAM access keys for the identities in a credential file:
//! - Identity verification and alias checks
//! - Role elevation for management accounts
//! - Publishing new keys to CircleCI projects
//! - The per-identity rotation state machine
//! - A full pass over the credential file and its exit status
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


pub mod aws;
pub mod elevation;
pub mod pass;
pub mod publisher;
pub mod rotation;
pub mod verify;

pub use pass::{run_pass, PassStatus};
pub use rotation::{IdentityStatus, RotationOutcome, RotationReport, RotationStep, Rotator};
