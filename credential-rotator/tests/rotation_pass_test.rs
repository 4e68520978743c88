//! End-to-end pass over a credential file

mod common;

use common::{record, FakeCloud, FakePublisher};
use credential_rotator::{run_pass, PassStatus, Rotator};
use pretty_assertions::assert_eq;
use rotator_keys::{CredentialMap, CredentialStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn rotator(cloud: &FakeCloud) -> Rotator {
    Rotator::new(
        Arc::new(cloud.clone()),
        Arc::new(FakePublisher::new()),
        Duration::ZERO,
    )
}

/// Write `credentials` to a fresh credential file and return its contents
async fn write_credentials(dir: &TempDir, credentials: &CredentialMap) -> (PathBuf, String) {
    let path = dir.path().join("credentials.json");
    let content = serde_json::to_string_pretty(credentials).unwrap();
    tokio::fs::write(&path, &content).await.unwrap();
    (path, content)
}

#[tokio::test]
async fn test_pass_rotates_and_persists_with_backup() {
    let cloud = FakeCloud::new();
    let publisher = Arc::new(FakePublisher::new());
    let rotating = cloud.add_identity(Some("grace-dev-management"), "111122223333", "circleci");
    let stale = cloud.add_identity(Some("acme-stale"), "444455556666", "deploy-bot");

    let mut credentials = CredentialMap::new();
    credentials.insert("grace-dev-management".into(), record(&rotating, &["infra"]));
    credentials.insert("acme-other".into(), record(&stale, &["web"]));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.json");
    let original = serde_json::to_string_pretty(&credentials).unwrap();
    tokio::fs::write(&path, &original).await.unwrap();

    let store = CredentialStore::new(&path);
    let loaded = store.load().await.unwrap();
    let rotator = Rotator::new(Arc::new(cloud.clone()), publisher.clone(), Duration::ZERO);
    let report = rotator.rotate_all(&loaded).await;
    store.save(&report.credentials).await.unwrap();

    let backup = tokio::fs::read_to_string(store.backup_path()).await.unwrap();
    assert_eq!(backup, original);

    let written = store.load().await.unwrap();
    let rotated = &written["grace-dev-management"];
    assert_ne!(rotated.access_key_id, rotating.access_key_id);
    assert!(cloud.is_live(&rotated.access_key_id));
    assert!(!cloud.is_live(&rotating.access_key_id));
    assert_eq!(written["acme-other"], credentials["acme-other"]);
    assert_eq!(report.failure_count(), 1);
}

#[tokio::test]
async fn test_pass_succeeds_when_every_identity_rotates() {
    let cloud = FakeCloud::new();
    let first = cloud.add_identity(Some("acme-shared"), "111122223333", "deploy-bot");
    let second = cloud.add_identity(Some("grace-dev-management"), "444455556666", "circleci");

    let mut credentials = CredentialMap::new();
    credentials.insert("acme-shared".into(), record(&first, &["web"]));
    credentials.insert("grace-dev-management".into(), record(&second, &["infra"]));

    let dir = TempDir::new().unwrap();
    let (path, _) = write_credentials(&dir, &credentials).await;
    let store = CredentialStore::new(&path);

    let status = run_pass(&store, &rotator(&cloud)).await;

    assert_eq!(status, PassStatus::Success);
    let written = store.load().await.unwrap();
    assert_ne!(written["acme-shared"].access_key_id, first.access_key_id);
    assert_ne!(written["grace-dev-management"].access_key_id, second.access_key_id);
}

#[tokio::test]
async fn test_pass_fails_when_one_identity_fails() {
    let cloud = FakeCloud::new();
    let live = cloud.add_identity(Some("acme-shared"), "111122223333", "deploy-bot");
    let unknown = rotator_keys::KeyPair::new("AKIAUNKNOWN", "no-such-secret");

    let mut credentials = CredentialMap::new();
    credentials.insert("acme-shared".into(), record(&live, &["web"]));
    credentials.insert("acme-gone".into(), record(&unknown, &["api"]));

    let dir = TempDir::new().unwrap();
    let (path, _) = write_credentials(&dir, &credentials).await;
    let store = CredentialStore::new(&path);

    let status = run_pass(&store, &rotator(&cloud)).await;

    assert_eq!(status, PassStatus::Failure);
    // The identity that did rotate is still persisted.
    let written = store.load().await.unwrap();
    assert_ne!(written["acme-shared"].access_key_id, live.access_key_id);
    assert_eq!(written["acme-gone"], credentials["acme-gone"]);
}

#[tokio::test]
async fn test_pass_fails_when_old_key_stays_live() {
    let cloud = FakeCloud::new();
    let old_key = cloud.add_identity(Some("acme-shared"), "111122223333", "deploy-bot");
    cloud.state().fail_delete = true;

    let mut credentials = CredentialMap::new();
    credentials.insert("acme-shared".into(), record(&old_key, &["web"]));

    let dir = TempDir::new().unwrap();
    let (path, _) = write_credentials(&dir, &credentials).await;
    let store = CredentialStore::new(&path);

    let status = run_pass(&store, &rotator(&cloud)).await;

    assert_eq!(status, PassStatus::Failure);
    let written = store.load().await.unwrap();
    assert_ne!(written["acme-shared"].access_key_id, old_key.access_key_id);
    assert!(cloud.is_live(&old_key.access_key_id));
}

#[tokio::test]
async fn test_pass_fails_when_backup_cannot_be_made() {
    let cloud = FakeCloud::new();
    let old_key = cloud.add_identity(Some("acme-shared"), "111122223333", "deploy-bot");

    let mut credentials = CredentialMap::new();
    credentials.insert("acme-shared".into(), record(&old_key, &["web"]));

    let dir = TempDir::new().unwrap();
    let (path, original) = write_credentials(&dir, &credentials).await;
    let store = CredentialStore::new(&path);
    // A directory in the backup's place makes the rename fail.
    tokio::fs::create_dir(store.backup_path()).await.unwrap();

    let status = run_pass(&store, &rotator(&cloud)).await;

    assert_eq!(status, PassStatus::Failure);
    let untouched = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(untouched, original);
}

#[tokio::test]
async fn test_pass_fails_when_file_is_missing() {
    let cloud = FakeCloud::new();
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("missing.json"));

    let status = run_pass(&store, &rotator(&cloud)).await;

    assert_eq!(status, PassStatus::Failure);
    assert!(cloud.no_writes());
}

#[test]
fn test_pass_status_maps_to_exit_code() {
    assert_eq!(
        format!("{:?}", ExitCode::from(PassStatus::Success)),
        format!("{:?}", ExitCode::SUCCESS)
    );
    assert_eq!(
        format!("{:?}", ExitCode::from(PassStatus::Failure)),
        format!("{:?}", ExitCode::FAILURE)
    );
}
