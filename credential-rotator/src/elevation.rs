//! Acting-client resolution
//!
//! Management accounts (`{org}-{env}-management`) may only manage their own
//! access keys through the `{org}-{env}-operations-iamAdmin` role in the
//! same account. Every other identity acts with its own credentials.
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


use crate::verify::VerifiedIdentity;
use rotator_keys::{AccessKeyManager, RotateResult};
use std::sync::Arc;
use tracing::info;

const MANAGEMENT_SUFFIX: &str = "management";

/// Name of the admin role for a management account alias, if any
pub fn admin_role_name(alias: &str) -> Option<String> {
    match alias.split('-').collect::<Vec<_>>().as_slice() {
        [org, env, suffix] if *suffix == MANAGEMENT_SUFFIX => {
            Some(format!("{}-{}-operations-iamAdmin", org, env))
        }
        _ => None,
    }
}

/// ARN of the role to assume for key management, if the alias needs one
pub fn admin_role_arn(alias: &str, account_id: &str) -> Option<String> {
    admin_role_name(alias).map(|role| format!("arn:aws:iam::{}:role/{}", account_id, role))
}

/// Key manager that performs create/delete for a verified identity
pub fn acting_client(identity: &VerifiedIdentity) -> RotateResult<Arc<dyn AccessKeyManager>> {
    match admin_role_arn(&identity.alias, identity.account_id()) {
        Some(role_arn) => {
            info!(alias = %identity.alias, role_arn = %role_arn, "Assuming admin role");
            identity.session.assume_role(&role_arn)
        }
        None => Ok(identity.session.direct_client()),
    }
}
