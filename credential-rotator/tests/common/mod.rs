//! In-memory identity provider and CI publisher for rotation tests

#![allow(dead_code)]

use async_trait::async_trait;
use credential_rotator::publisher::CredentialPublisher;
use rotator_keys::{
    AccessKeyManager, CallerIdentity, CredentialRecord, IdentityProvider, IdentitySession,
    KeyPair, ProjectExposure, RotateError, RotateResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Who a fake key authenticates as
#[derive(Debug, Clone)]
pub struct Principal {
    pub account: String,
    pub alias: Option<String>,
    pub arn: String,
}

#[derive(Default)]
pub struct CloudState {
    /// Live keys: access key id -> (secret, principal)
    pub keys: HashMap<String, (String, Principal)>,
    pub next_key: u32,
    pub sessions_opened: Vec<String>,
    /// When each session was opened, as (access key id, instant)
    pub session_times: Vec<(String, Instant)>,
    pub created_for: Vec<String>,
    /// When each new key was issued, as (access key id, instant)
    pub created_at: Vec<(String, Instant)>,
    /// Every delete attempt as (user, access key id), successful or not
    pub delete_calls: Vec<(String, String)>,
    pub assumed_roles: Vec<String>,
    pub fail_create: bool,
    pub fail_delete: bool,
    /// New keys are issued but never become valid
    pub reject_new_keys: bool,
    /// New keys authenticate as a different user
    pub drift_new_keys: bool,
}

/// Shared fake of IAM + STS
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().unwrap()
    }

    /// Register an identity with one live key and return that key
    pub fn add_identity(&self, alias: Option<&str>, account: &str, user: &str) -> KeyPair {
        let mut state = self.state();
        state.next_key += 1;
        let key = KeyPair::new(
            format!("AKIAOLD{}", state.next_key),
            format!("old-secret-{}", state.next_key),
        );
        let principal = Principal {
            account: account.to_string(),
            alias: alias.map(str::to_string),
            arn: format!("arn:aws:iam::{}:user/{}", account, user),
        };
        state.keys.insert(
            key.access_key_id.clone(),
            (key.secret_access_key.clone(), principal),
        );
        key
    }

    pub fn is_live(&self, access_key_id: &str) -> bool {
        self.state().keys.contains_key(access_key_id)
    }

    /// True when nothing was created, deleted or assumed
    pub fn no_writes(&self) -> bool {
        let state = self.state();
        state.created_for.is_empty()
            && state.delete_calls.is_empty()
            && state.assumed_roles.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for FakeCloud {
    async fn open_session(
        &self,
        key: &KeyPair,
        _token: Option<&str>,
    ) -> RotateResult<Arc<dyn IdentitySession>> {
        let mut state = self.state();
        state.sessions_opened.push(key.access_key_id.clone());
        state
            .session_times
            .push((key.access_key_id.clone(), Instant::now()));
        match state.keys.get(&key.access_key_id) {
            Some((secret, principal)) if *secret == key.secret_access_key => {
                Ok(Arc::new(FakeSession {
                    cloud: self.clone(),
                    principal: principal.clone(),
                }))
            }
            _ => Err(RotateError::Verify(format!(
                "InvalidClientTokenId: {}",
                key.access_key_id
            ))),
        }
    }
}

pub struct FakeSession {
    cloud: FakeCloud,
    principal: Principal,
}

#[async_trait]
impl IdentitySession for FakeSession {
    async fn account_aliases(&self) -> RotateResult<Vec<String>> {
        Ok(self.principal.alias.iter().cloned().collect())
    }

    async fn caller_identity(&self) -> RotateResult<CallerIdentity> {
        Ok(CallerIdentity {
            account: self.principal.account.clone(),
            arn: self.principal.arn.clone(),
            user_id: format!("AIDA-{}", self.principal.arn.len()),
        })
    }

    fn direct_client(&self) -> Arc<dyn AccessKeyManager> {
        Arc::new(FakeKeyManager {
            cloud: self.cloud.clone(),
            principal: self.principal.clone(),
        })
    }

    fn assume_role(&self, role_arn: &str) -> RotateResult<Arc<dyn AccessKeyManager>> {
        self.cloud.state().assumed_roles.push(role_arn.to_string());
        Ok(self.direct_client())
    }
}

pub struct FakeKeyManager {
    cloud: FakeCloud,
    principal: Principal,
}

#[async_trait]
impl AccessKeyManager for FakeKeyManager {
    async fn create_access_key(&self, user_name: &str) -> RotateResult<KeyPair> {
        let mut state = self.cloud.state();
        state.created_for.push(user_name.to_string());
        if state.fail_create {
            return Err(RotateError::KeyCreate("LimitExceeded".to_string()));
        }

        state.next_key += 1;
        let key = KeyPair::new(
            format!("AKIANEW{}", state.next_key),
            format!("new-secret-{}", state.next_key),
        );
        state
            .created_at
            .push((key.access_key_id.clone(), Instant::now()));
        let mut principal = self.principal.clone();
        if state.drift_new_keys {
            principal.arn = format!("arn:aws:iam::{}:user/imposter", principal.account);
        }
        if !state.reject_new_keys {
            state.keys.insert(
                key.access_key_id.clone(),
                (key.secret_access_key.clone(), principal),
            );
        }
        Ok(key)
    }

    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> RotateResult<()> {
        let mut state = self.cloud.state();
        state
            .delete_calls
            .push((user_name.to_string(), access_key_id.to_string()));
        if state.fail_delete {
            return Err(RotateError::KeyDelete("AccessDenied".to_string()));
        }
        state.keys.remove(access_key_id);
        Ok(())
    }
}

/// Records every successful upsert; fails for one configurable project
#[derive(Default)]
pub struct FakePublisher {
    pub calls: Mutex<Vec<(String, String, String)>>,
    pub fail_project: Mutex<Option<String>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(project: &str) -> Self {
        let publisher = Self::default();
        *publisher.fail_project.lock().unwrap() = Some(project.to_string());
        publisher
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialPublisher for FakePublisher {
    async fn publish(&self, project: &str, name: &str, value: &str) -> RotateResult<()> {
        if self.fail_project.lock().unwrap().as_deref() == Some(project) {
            return Err(RotateError::Publish {
                project: project.to_string(),
                variable: name.to_string(),
                reason: "HTTP 403 Forbidden".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap()
            .push((project.to_string(), name.to_string(), value.to_string()));
        Ok(())
    }
}

pub fn project(name: &str) -> ProjectExposure {
    ProjectExposure {
        access_key_var: "AWS_ACCESS_KEY_ID".to_string(),
        secret_var: "AWS_SECRET_ACCESS_KEY".to_string(),
        name: name.to_string(),
    }
}

pub fn record(key: &KeyPair, projects: &[&str]) -> CredentialRecord {
    CredentialRecord {
        access_key_id: key.access_key_id.clone(),
        secret_access_key: key.secret_access_key.clone(),
        token: String::new(),
        projects: projects.iter().map(|name| project(name)).collect(),
    }
}
