//! CI credential publishing
//!
//! Pushes a key pair into the environment-variable store of every CI project
//! listed on an identity's record.
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


use async_trait::async_trait;
use rotator_config::CiProviderConfig;
use rotator_keys::{KeyPair, ProjectExposure, RotateError, RotateResult};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Upserts environment variables on a CI project
#[async_trait]
pub trait CredentialPublisher: Send + Sync {
    /// Set `name` to `value` on `project`
    async fn publish(&self, project: &str, name: &str, value: &str) -> RotateResult<()>;
}

/// Push `key` to every project. Stops at the first failure.
pub async fn publish_key_pair(
    publisher: &dyn CredentialPublisher,
    projects: &[ProjectExposure],
    key: &KeyPair,
) -> RotateResult<()> {
    for project in projects {
        info!(
            project = %project.name,
            variable = %project.access_key_var,
            "Pushing access key id"
        );
        publisher
            .publish(&project.name, &project.access_key_var, &key.access_key_id)
            .await?;

        info!(
            project = %project.name,
            variable = %project.secret_var,
            "Pushing secret access key"
        );
        publisher
            .publish(&project.name, &project.secret_var, &key.secret_access_key)
            .await?;
    }
    Ok(())
}

#[derive(Serialize)]
struct EnvVar<'a> {
    name: &'a str,
    value: &'a str,
}

/// CircleCI v1.1 environment-variable API
pub struct CircleCiPublisher {
    config: CiProviderConfig,
    client: reqwest::Client,
}

impl CircleCiPublisher {
    pub fn new(config: CiProviderConfig) -> RotateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                RotateError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn envvar_url(&self, project: &str) -> String {
        format!(
            "{}/project/{}/{}/{}/envvar",
            self.config.base_url, self.config.vcs, self.config.org, project
        )
    }

    /// Token is looked up on every call so a rotated CI token is picked up.
    fn token(&self) -> Result<String, String> {
        std::env::var(&self.config.token_var)
            .map_err(|_| format!("{} is not set", self.config.token_var))
    }
}

#[async_trait]
impl CredentialPublisher for CircleCiPublisher {
    async fn publish(&self, project: &str, name: &str, value: &str) -> RotateResult<()> {
        let publish_error = |reason: String| RotateError::Publish {
            project: project.to_string(),
            variable: name.to_string(),
            reason,
        };

        let token = self.token().map_err(publish_error)?;

        let response = self
            .client
            .post(self.envvar_url(project))
            .header("Circle-Token", token)
            .json(&EnvVar { name, value })
            .send()
            .await
            .map_err(|e| publish_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(publish_error(format!("HTTP {}: {}", status, body)));
        }

        debug!(project = project, variable = name, status = %status, "Environment variable set");
        Ok(())
    }
}
