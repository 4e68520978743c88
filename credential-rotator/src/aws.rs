//! AWS identity provider backed by IAM and STS
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
use rotator_keys::{
    AccessKeyManager, CallerIdentity, IdentityProvider, IdentitySession, KeyPair, RotateError,
    RotateResult,
};
use rusoto_core::{request::HttpClient, Region};
use rusoto_credential::{AutoRefreshingProvider, StaticProvider};
use rusoto_iam::{
    CreateAccessKeyRequest, DeleteAccessKeyRequest, Iam, IamClient, ListAccountAliasesRequest,
};
use rusoto_sts::{GetCallerIdentityRequest, Sts, StsAssumeRoleSessionCredentialsProvider, StsClient};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

fn http_client() -> RotateResult<HttpClient> {
    HttpClient::new()
        .map_err(|e| RotateError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Opens IAM/STS sessions in a fixed region
pub struct AwsIdentityProvider {
    region: Region,
}

impl AwsIdentityProvider {
    pub fn new(region: &str) -> RotateResult<Self> {
        let region = Region::from_str(region).map_err(|e| {
            RotateError::Configuration(format!("Invalid region {:?}: {}", region, e))
        })?;
        Ok(Self { region })
    }
}

#[async_trait]
impl IdentityProvider for AwsIdentityProvider {
    async fn open_session(
        &self,
        key: &KeyPair,
        token: Option<&str>,
    ) -> RotateResult<Arc<dyn IdentitySession>> {
        let credentials = StaticProvider::new(
            key.access_key_id.clone(),
            key.secret_access_key.clone(),
            token.map(str::to_string),
            None,
        );

        let iam = IamClient::new_with(http_client()?, credentials.clone(), self.region.clone());
        let sts = StsClient::new_with(http_client()?, credentials, self.region.clone());

        Ok(Arc::new(AwsSession {
            iam,
            sts,
            region: self.region.clone(),
        }))
    }
}

/// IAM and STS clients sharing one set of static credentials
pub struct AwsSession {
    iam: IamClient,
    sts: StsClient,
    region: Region,
}

#[async_trait]
impl IdentitySession for AwsSession {
    async fn account_aliases(&self) -> RotateResult<Vec<String>> {
        let response = self
            .iam
            .list_account_aliases(ListAccountAliasesRequest::default())
            .await
            .map_err(|e| RotateError::Verify(format!("ListAccountAliases: {}", e)))?;
        Ok(response.account_aliases)
    }

    async fn caller_identity(&self) -> RotateResult<CallerIdentity> {
        let response = self
            .sts
            .get_caller_identity(GetCallerIdentityRequest::default())
            .await
            .map_err(|e| RotateError::Verify(format!("GetCallerIdentity: {}", e)))?;

        match (response.account, response.arn) {
            (Some(account), Some(arn)) => Ok(CallerIdentity {
                account,
                arn,
                user_id: response.user_id.unwrap_or_default(),
            }),
            _ => Err(RotateError::Verify(
                "GetCallerIdentity returned no account or ARN".to_string(),
            )),
        }
    }

    fn direct_client(&self) -> Arc<dyn AccessKeyManager> {
        Arc::new(IamKeyManager {
            iam: self.iam.clone(),
        })
    }

    fn assume_role(&self, role_arn: &str) -> RotateResult<Arc<dyn AccessKeyManager>> {
        let session_name = format!("credential-rotator-{}", chrono::Utc::now().timestamp_millis());
        let role = StsAssumeRoleSessionCredentialsProvider::new(
            self.sts.clone(),
            role_arn.to_string(),
            session_name,
            None,
            None,
            None,
            None,
        );
        // Cache the assumed-role credentials across create and delete.
        let credentials = AutoRefreshingProvider::new(role)
            .map_err(|e| RotateError::AssumeRole(format!("{}: {}", role_arn, e)))?;

        debug!(role_arn = role_arn, "Built assumed-role IAM client");
        Ok(Arc::new(IamKeyManager {
            iam: IamClient::new_with(http_client()?, credentials, self.region.clone()),
        }))
    }
}

/// Access key management through an IAM client
pub struct IamKeyManager {
    iam: IamClient,
}

#[async_trait]
impl AccessKeyManager for IamKeyManager {
    async fn create_access_key(&self, user_name: &str) -> RotateResult<KeyPair> {
        let response = self
            .iam
            .create_access_key(CreateAccessKeyRequest {
                user_name: Some(user_name.to_string()),
            })
            .await
            .map_err(|e| RotateError::KeyCreate(e.to_string()))?;

        Ok(KeyPair::new(
            response.access_key.access_key_id,
            response.access_key.secret_access_key,
        ))
    }

    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> RotateResult<()> {
        self.iam
            .delete_access_key(DeleteAccessKeyRequest {
                access_key_id: access_key_id.to_string(),
                user_name: Some(user_name.to_string()),
            })
            .await
            .map_err(|e| RotateError::KeyDelete(e.to_string()))
    }
}
