//! Rotation orchestration
//!
//! Per identity: verify → create key → settle → re-verify → publish →
//! delete old key. Every step before the old key is deleted is reversible;
//! a failure there leaves the original record in the output untouched.
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


use crate::elevation::acting_client;
use crate::pass::PassStatus;
use crate::publisher::{publish_key_pair, CredentialPublisher};
use crate::verify::{verify_identity, VerifiedIdentity};
use rotator_keys::{
    AccessKeyManager, CredentialMap, CredentialRecord, IdentityProvider, KeyPair, RotateError,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Step of the rotation at which an identity failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStep {
    Verify,
    AliasMismatch,
    CreateKey,
    Reverify,
    IdentityDrift,
    Publish,
    DeleteOldKey,
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationStep::Verify => "verify",
            RotationStep::AliasMismatch => "alias_mismatch",
            RotationStep::CreateKey => "create_key",
            RotationStep::Reverify => "reverify",
            RotationStep::IdentityDrift => "identity_drift",
            RotationStep::Publish => "publish",
            RotationStep::DeleteOldKey => "delete_old_key",
        };
        f.write_str(name)
    }
}

/// A per-identity failure tagged with the step it happened at
#[derive(Debug)]
pub struct RotationFailure {
    pub step: RotationStep,
    pub error: RotateError,
}

impl RotationFailure {
    pub fn new(step: RotationStep, error: RotateError) -> Self {
        Self { step, error }
    }

    fn at(step: RotationStep) -> impl FnOnce(RotateError) -> Self {
        move |error| Self::new(step, error)
    }
}

impl fmt::Display for RotationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

/// What happened to one identity
#[derive(Debug)]
pub enum RotationOutcome {
    /// New key verified, published, old key deleted
    Rotated(CredentialRecord),
    /// New key verified and published, but the old key could not be deleted.
    /// The new key is kept; both keys remain live.
    RotatedOldKeyLive {
        record: CredentialRecord,
        error: RotateError,
    },
    /// Rotation abandoned; the original record stands
    Failed(RotationFailure),
}

impl RotationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RotationOutcome::Rotated(_))
    }

    /// Record to persist, given the record the identity started with
    pub fn into_record(self, original: CredentialRecord) -> CredentialRecord {
        match self {
            RotationOutcome::Rotated(record)
            | RotationOutcome::RotatedOldKeyLive { record, .. } => record,
            RotationOutcome::Failed(_) => original,
        }
    }
}

/// Summary of one identity for the run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStatus {
    Rotated,
    RotatedOldKeyLive { error: String },
    Failed { step: RotationStep, error: String },
}

/// Result of a full pass over the credential file
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Mapping to persist: new records for rotated identities, originals otherwise
    pub credentials: CredentialMap,
    pub statuses: Vec<(String, IdentityStatus)>,
}

impl RotationReport {
    pub fn rotated_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == IdentityStatus::Rotated)
            .count()
    }

    /// Identities that did not rotate cleanly, including old-key-live ones
    pub fn failure_count(&self) -> usize {
        self.statuses.len() - self.rotated_count()
    }

    /// Failure if any identity did not rotate cleanly, including ones whose
    /// old key is still live
    pub fn pass_status(&self) -> PassStatus {
        if self.failure_count() > 0 {
            PassStatus::Failure
        } else {
            PassStatus::Success
        }
    }

    pub fn status(&self, alias: &str) -> Option<&IdentityStatus> {
        self.statuses
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, status)| status)
    }

    fn record(&mut self, alias: &str, outcome: RotationOutcome, original: &CredentialRecord) {
        let status = match &outcome {
            RotationOutcome::Rotated(_) => IdentityStatus::Rotated,
            RotationOutcome::RotatedOldKeyLive { error, .. } => IdentityStatus::RotatedOldKeyLive {
                error: error.to_string(),
            },
            RotationOutcome::Failed(failure) => IdentityStatus::Failed {
                step: failure.step,
                error: failure.error.to_string(),
            },
        };
        self.credentials
            .insert(alias.to_string(), outcome.into_record(original.clone()));
        self.statuses.push((alias.to_string(), status));
    }
}

/// Drives the rotation state machine for every identity
pub struct Rotator {
    provider: Arc<dyn IdentityProvider>,
    publisher: Arc<dyn CredentialPublisher>,
    settle_delay: Duration,
    cleanup_orphaned_keys: bool,
}

impl Rotator {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        publisher: Arc<dyn CredentialPublisher>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            provider,
            publisher,
            settle_delay,
            cleanup_orphaned_keys: false,
        }
    }

    /// Delete the unused new key when a rotation is abandoned after creating it
    pub fn with_orphan_cleanup(mut self, enabled: bool) -> Self {
        self.cleanup_orphaned_keys = enabled;
        self
    }

    /// Rotate every identity in turn and fold the outcomes into one mapping
    pub async fn rotate_all(&self, credentials: &CredentialMap) -> RotationReport {
        let mut report = RotationReport::default();

        for (alias, record) in credentials {
            let outcome = self.rotate_identity(alias, record).await;
            match &outcome {
                RotationOutcome::Rotated(record) => {
                    info!(
                        alias = %alias,
                        access_key_id = %record.access_key_id,
                        "Rotation complete"
                    );
                }
                RotationOutcome::RotatedOldKeyLive { error, .. } => {
                    warn!(
                        alias = %alias,
                        step = %RotationStep::DeleteOldKey,
                        error = %error,
                        "New key in use but old key is still live"
                    );
                }
                RotationOutcome::Failed(failure) => {
                    error!(
                        alias = %alias,
                        step = %failure.step,
                        error = %failure.error,
                        "Rotation abandoned, keeping original credentials"
                    );
                }
            }
            report.record(alias, outcome, record);
        }

        info!(
            rotated = report.rotated_count(),
            failed = report.failure_count(),
            "Rotation pass finished"
        );
        report
    }

    /// Run the state machine for one identity
    pub async fn rotate_identity(&self, alias: &str, record: &CredentialRecord) -> RotationOutcome {
        match self.try_rotate(alias, record).await {
            Ok(outcome) => outcome,
            Err(failure) => RotationOutcome::Failed(failure),
        }
    }

    async fn try_rotate(
        &self,
        alias: &str,
        record: &CredentialRecord,
    ) -> Result<RotationOutcome, RotationFailure> {
        info!(alias = alias, access_key_id = %record.access_key_id, "Checking current credentials");
        let current = verify_identity(&*self.provider, &record.key_pair(), record.session_token())
            .await
            .map_err(RotationFailure::at(RotationStep::Verify))?;

        if current.alias != alias {
            return Err(RotationFailure::new(
                RotationStep::AliasMismatch,
                RotateError::AliasMismatch {
                    expected: alias.to_string(),
                    actual: current.alias.clone(),
                },
            ));
        }

        let acting = acting_client(&current).map_err(RotationFailure::at(RotationStep::CreateKey))?;
        let new_key = acting
            .create_access_key(current.user_name())
            .await
            .map_err(RotationFailure::at(RotationStep::CreateKey))?;
        info!(
            alias = alias,
            user = current.user_name(),
            access_key_id = %new_key.access_key_id,
            "Created new access key"
        );

        // IAM is eventually consistent; a new key is not usable immediately.
        info!(
            alias = alias,
            delay_ms = self.settle_delay.as_millis() as u64,
            "Waiting for new key to settle"
        );
        tokio::time::sleep(self.settle_delay).await;

        let replacement = record.with_key_pair(new_key.clone());
        if let Err(failure) = self.adopt_replacement(&current, &replacement).await {
            self.discard_orphaned_key(alias, &*acting, &current, &new_key).await;
            return Err(failure);
        }

        info!(alias = alias, access_key_id = %record.access_key_id, "Deleting old access key");
        match acting
            .delete_access_key(current.user_name(), &record.access_key_id)
            .await
        {
            Ok(()) => Ok(RotationOutcome::Rotated(replacement)),
            Err(error) => Ok(RotationOutcome::RotatedOldKeyLive {
                record: replacement,
                error,
            }),
        }
    }

    /// Re-verify with the new key, check it is the same caller, publish it
    async fn adopt_replacement(
        &self,
        current: &VerifiedIdentity,
        replacement: &CredentialRecord,
    ) -> Result<(), RotationFailure> {
        let key = replacement.key_pair();
        let renewed = verify_identity(&*self.provider, &key, replacement.session_token())
            .await
            .map_err(RotationFailure::at(RotationStep::Reverify))?;

        if !renewed.caller.same_caller(&current.caller) {
            return Err(RotationFailure::new(
                RotationStep::IdentityDrift,
                RotateError::IdentityDrift {
                    expected: current.caller.to_string(),
                    actual: renewed.caller.to_string(),
                },
            ));
        }
        info!(alias = %current.alias, "New credentials work");

        publish_key_pair(&*self.publisher, &replacement.projects, &key)
            .await
            .map_err(RotationFailure::at(RotationStep::Publish))
    }

    async fn discard_orphaned_key(
        &self,
        alias: &str,
        acting: &dyn AccessKeyManager,
        current: &VerifiedIdentity,
        new_key: &KeyPair,
    ) {
        if !self.cleanup_orphaned_keys {
            warn!(
                alias = alias,
                access_key_id = %new_key.access_key_id,
                "Unused new access key left in place"
            );
            return;
        }

        match acting
            .delete_access_key(current.user_name(), &new_key.access_key_id)
            .await
        {
            Ok(()) => info!(
                alias = alias,
                access_key_id = %new_key.access_key_id,
                "Deleted unused new access key"
            ),
            Err(e) => warn!(
                alias = alias,
                access_key_id = %new_key.access_key_id,
                error = %e,
                "Failed to delete unused new access key"
            ),
        }
    }
}
