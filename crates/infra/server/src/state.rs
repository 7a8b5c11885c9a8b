//! File-backed subscription record storage.

use async_trait::async_trait;
use statamic_webhooks::{SubscriptionRecord, SubscriptionStore, WebhookError, WebhookResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Stores all records as one JSON object keyed by installation id.
///
/// Writes go to a sibling temporary file which then replaces the original,
/// so a crash mid-write never leaves a truncated state file behind.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> WebhookResult<BTreeMap<String, SubscriptionRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    async fn write_all(&self, records: &BTreeMap<String, SubscriptionRecord>) -> WebhookResult<()> {
        let bytes = serde_json::to_vec_pretty(records)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> WebhookError {
    WebhookError::Storage(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn load(&self, installation_id: &str) -> WebhookResult<Option<SubscriptionRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(installation_id))
    }

    async fn save(&self, installation_id: &str, record: &SubscriptionRecord) -> WebhookResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.insert(installation_id.to_string(), record.clone());
        self.write_all(&records).await
    }

    async fn remove(&self, installation_id: &str) -> WebhookResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        if records.remove(installation_id).is_some() {
            self.write_all(&records).await?;
        }
        Ok(())
    }
}
