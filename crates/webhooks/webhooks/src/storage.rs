//! Subscription record storage.
//!
//! The host keeps one [`SubscriptionRecord`] per installation between
//! invocations. This trait is that key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::WebhookResult;
use crate::record::SubscriptionRecord;

/// Trait for subscription record storage backends.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Loads the record of an installation.
    async fn load(&self, installation_id: &str) -> WebhookResult<Option<SubscriptionRecord>>;

    /// Saves the record of an installation.
    async fn save(&self, installation_id: &str, record: &SubscriptionRecord) -> WebhookResult<()>;

    /// Removes the record of an installation.
    async fn remove(&self, installation_id: &str) -> WebhookResult<()>;

    /// Loads a record, falling back to an empty one.
    async fn load_or_default(&self, installation_id: &str) -> WebhookResult<SubscriptionRecord> {
        Ok(self.load(installation_id).await?.unwrap_or_default())
    }
}

/// In-memory subscription storage for testing.
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<String, SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn load(&self, installation_id: &str) -> WebhookResult<Option<SubscriptionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(installation_id).cloned())
    }

    async fn save(&self, installation_id: &str, record: &SubscriptionRecord) -> WebhookResult<()> {
        let mut records = self.records.write().await;
        records.insert(installation_id.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, installation_id: &str) -> WebhookResult<()> {
        let mut records = self.records.write().await;
        records.remove(installation_id);
        Ok(())
    }
}
