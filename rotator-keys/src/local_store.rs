//! Credential file storage
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


use crate::error::{RotateError, RotateResult};
use crate::key_types::CredentialMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Owner read/write only
const CREDENTIAL_FILE_MODE: u32 = 0o600;

/// JSON credential file holding every identity's record
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store backed by `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the previous file is renamed to before every write
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = OsString::from(self.path.as_os_str());
        backup.push(".bak");
        PathBuf::from(backup)
    }

    /// Read and parse the credential file
    pub async fn load(&self) -> RotateResult<CredentialMap> {
        let content = fs::read(&self.path).await?;
        let credentials: CredentialMap =
            serde_json::from_slice(&content).map_err(RotateError::Deserialize)?;

        debug!(
            path = %self.path.display(),
            identities = credentials.len(),
            "Loaded credentials"
        );
        Ok(credentials)
    }

    /// Back up the current file, then write `credentials` in its place.
    ///
    /// A failed backup aborts the write and leaves the original untouched.
    pub async fn save(&self, credentials: &CredentialMap) -> RotateResult<()> {
        let json = serde_json::to_vec_pretty(credentials).map_err(RotateError::Serialize)?;

        let backup = self.backup_path();
        fs::rename(&self.path, &backup)
            .await
            .map_err(|source| RotateError::Backup {
                path: self.path.clone(),
                source,
            })?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(CREDENTIAL_FILE_MODE);

        let mut file = options.open(&self.path).await?;
        file.write_all(&json).await?;
        file.flush().await?;

        info!(
            path = %self.path.display(),
            backup = %backup.display(),
            identities = credentials.len(),
            "Credentials written"
        );
        Ok(())
    }
}
