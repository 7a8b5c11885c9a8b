//! In-memory event registry for testing and development.

use async_trait::async_trait;
use serde_json::{json, Value};
use statamic_core::{ApiError, Method};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{WebhookError, WebhookResult};
use crate::handler::HandlerSpec;
use crate::registry::EventRegistry;

/// A call observed by [`InMemoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method the call maps to.
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
}

/// Registry that keeps handlers in memory.
///
/// Clones share state, so a test can hand one clone to the manager and
/// inspect another. Data is lost when the process exits.
#[derive(Debug, Clone)]
pub struct InMemoryRegistry {
    events: Arc<RwLock<Option<BTreeMap<String, String>>>>,
    handlers: Arc<RwLock<BTreeMap<String, Value>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    failure: Arc<RwLock<Option<String>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Some(BTreeMap::new()))),
            handlers: Arc::new(RwLock::new(BTreeMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            failure: Arc::new(RwLock::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Replaces the catalogue of subscribable events.
    pub async fn set_events(&self, events: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) {
        let catalogue = events
            .into_iter()
            .map(|(key, name)| (key.into(), name.into()))
            .collect();
        *self.events.write().await = Some(catalogue);
    }

    /// Makes the event listing answer without a `data` field.
    pub async fn drop_event_data(&self) {
        *self.events.write().await = None;
    }

    /// Inserts a handler as if another client had created it. Returns its id.
    pub async fn insert_handler(&self, mut handler: Value) -> String {
        let id = self.allocate_id();
        if let Some(obj) = handler.as_object_mut() {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        self.handlers.write().await.insert(id.clone(), handler);
        id
    }

    /// Returns a handler by id.
    pub async fn handler(&self, id: &str) -> Option<Value> {
        self.handlers.read().await.get(id).cloned()
    }

    /// Returns all handlers.
    pub async fn handlers(&self) -> Vec<Value> {
        self.handlers.read().await.values().cloned().collect()
    }

    /// Returns every call made so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Makes every following call fail with a transport error.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    /// Stops injecting failures.
    pub async fn recover(&self) {
        *self.failure.write().await = None;
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn record(&self, method: Method, path: String) -> WebhookResult<()> {
        self.requests.write().await.push(RecordedRequest { method, path });

        match self.failure.read().await.as_ref() {
            Some(message) => Err(WebhookError::Api(ApiError::Http(message.clone()))),
            None => Ok(()),
        }
    }

    fn not_found(id: &str) -> WebhookError {
        WebhookError::Api(ApiError::Status {
            status: 404,
            body: format!("handler {} not found", id),
        })
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRegistry for InMemoryRegistry {
    async fn list_events(&self) -> WebhookResult<Value> {
        self.record(Method::GET, "/statamic-events/events".into()).await?;

        Ok(match self.events.read().await.as_ref() {
            Some(events) => json!({ "data": events }),
            None => json!({ "message": "No events available" }),
        })
    }

    async fn list_handlers(&self) -> WebhookResult<Value> {
        self.record(Method::GET, "/statamic-events/handlers".into()).await?;
        Ok(json!({ "data": self.handlers().await }))
    }

    async fn create_handler(&self, spec: &HandlerSpec) -> WebhookResult<Value> {
        self.record(Method::POST, "/statamic-events/handlers".into()).await?;

        let id = self.insert_handler(serde_json::to_value(spec)?).await;
        let handler = self.handler(&id).await.unwrap_or(Value::Null);
        Ok(json!({ "data": handler }))
    }

    async fn update_handler(&self, id: &str, spec: &HandlerSpec) -> WebhookResult<Value> {
        self.record(Method::PATCH, format!("/statamic-events/handlers/{}", id))
            .await?;

        let mut handlers = self.handlers.write().await;
        let handler = handlers.get_mut(id).ok_or_else(|| Self::not_found(id))?;

        let mut updated = serde_json::to_value(spec)?;
        if let Some(obj) = updated.as_object_mut() {
            obj.insert("id".to_string(), Value::String(id.to_string()));
        }
        *handler = updated.clone();

        Ok(json!({ "data": updated }))
    }

    async fn disable_handler(&self, id: &str) -> WebhookResult<()> {
        self.record(Method::PATCH, format!("/statamic-events/handlers/{}", id))
            .await?;

        let mut handlers = self.handlers.write().await;
        let handler = handlers.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if let Some(obj) = handler.as_object_mut() {
            obj.insert("enabled".to_string(), Value::Bool(false));
        }
        Ok(())
    }

    async fn delete_handler(&self, id: &str) -> WebhookResult<()> {
        self.record(Method::DELETE, format!("/statamic-events/handlers/{}", id))
            .await?;

        self.handlers
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}
