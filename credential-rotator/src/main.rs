//! Credential Rotator
//!
//! Rotates the IAM access keys in a credential file, publishes the new keys
//! to CircleCI, deletes the old keys and writes the file back.

use anyhow::Result;
use clap::Parser;
use credential_rotator::aws::AwsIdentityProvider;
use credential_rotator::publisher::CircleCiPublisher;
use credential_rotator::{run_pass, Rotator};
use rotator_config::{LogFormat, RotatorConfig};
use rotator_keys::CredentialStore;
use rotator_logging::{init_console_logging, init_logging};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "credential-rotator",
    version,
    about = "Rotate IAM access keys and publish them to CircleCI"
)]
struct Args {
    /// Credential file to rotate [default: $ROTATOR_CREDENTIALS_FILE or testdata/credentials.json]
    path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = RotatorConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    match config.log_format {
        LogFormat::Json => init_logging("credential-rotator", config.log_level()),
        LogFormat::Console => init_console_logging("credential-rotator", config.log_level()),
    }

    let path = args
        .path
        .unwrap_or_else(|| PathBuf::from(&config.credentials_file));
    let store = CredentialStore::new(&path);

    let provider = Arc::new(AwsIdentityProvider::new(&config.region)?);
    let publisher = Arc::new(CircleCiPublisher::new(config.ci.clone())?);
    let rotator = Rotator::new(provider, publisher, config.settle_delay())
        .with_orphan_cleanup(config.cleanup_orphaned_keys);

    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, region = %config.region, "Credential rotator starting");
    let status = run_pass(&store, &rotator)
        .instrument(info_span!("rotation_run", run_id = %run_id))
        .await;

    Ok(status.into())
}
