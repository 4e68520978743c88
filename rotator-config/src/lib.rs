//! Configuration management for the credential rotator

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Prefix shared by every rotator environment variable
pub const ENV_PREFIX: &str = "ROTATOR";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Console,
    Json,
}

/// CI provider (CircleCI) configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiProviderConfig {
    pub base_url: String,
    pub vcs: String,
    pub org: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API token.
    /// The token itself is read at publish time, never stored here.
    pub token_var: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    pub credentials_file: String,
    pub region: String,
    pub settle_delay_secs: u64,
    pub cleanup_orphaned_keys: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub ci: CiProviderConfig,
}

/// Flat view of the `ROTATOR_*` variables
#[derive(Debug, Deserialize)]
struct Settings {
    credentials_file: String,
    region: String,
    settle_delay_secs: u64,
    cleanup_orphaned_keys: bool,
    log_level: String,
    log_format: LogFormat,
    circleci_base_url: String,
    circleci_vcs: String,
    circleci_org: String,
    circleci_timeout_secs: u64,
    ci_token_var: String,
}

impl RotatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("credentials_file", "testdata/credentials.json")?
            .set_default("region", "us-east-1")?
            .set_default("settle_delay_secs", 10_i64)?
            .set_default("cleanup_orphaned_keys", false)?
            .set_default("log_level", "info")?
            .set_default("log_format", "console")?
            .set_default("circleci_base_url", "https://circleci.com/api/v1.1")?
            .set_default("circleci_vcs", "github")?
            .set_default("circleci_org", "GSA")?
            .set_default("circleci_timeout_secs", 30_i64)?
            .set_default("ci_token_var", "CIRCLE_TOKEN")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.region.trim().is_empty() {
            return Err(ConfigError::Message("region must not be empty".to_string()));
        }

        Ok(Self {
            credentials_file: settings.credentials_file,
            region: settings.region,
            settle_delay_secs: settings.settle_delay_secs,
            cleanup_orphaned_keys: settings.cleanup_orphaned_keys,
            log_level: settings.log_level,
            log_format: settings.log_format,
            ci: CiProviderConfig {
                base_url: settings.circleci_base_url.trim_end_matches('/').to_string(),
                vcs: settings.circleci_vcs,
                org: settings.circleci_org,
                timeout_secs: settings.circleci_timeout_secs,
                token_var: settings.ci_token_var,
            },
        })
    }

    /// Delay between creating a key and first using it
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}
