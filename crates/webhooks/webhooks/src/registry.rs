//! Remote event registry abstraction.

use async_trait::async_trait;
use serde_json::{json, Value};
use statamic_core::{ApiClient, Method};

use crate::error::WebhookResult;
use crate::handler::HandlerSpec;

/// Maximum number of entries requested from list endpoints.
pub const DEFAULT_LIST_LIMIT: usize = 10_000;

const API_PREFIX: &str = "statamic-events";

/// The CMS endpoint that manages webhook handlers.
///
/// Methods return the decoded response body. Interpreting its shape is left
/// to the caller so that an unexpected body can be treated as a soft failure.
#[async_trait]
pub trait EventRegistry: Send + Sync {
    /// Lists subscribable events: `{data: {<key>: <display name>}}`.
    async fn list_events(&self) -> WebhookResult<Value>;

    /// Lists existing handlers: `{data: [{id, driver, url, ...}]}`.
    async fn list_handlers(&self) -> WebhookResult<Value>;

    /// Creates a handler: `{data: {id, ...}}`.
    async fn create_handler(&self, spec: &HandlerSpec) -> WebhookResult<Value>;

    /// Replaces the configuration of an existing handler.
    async fn update_handler(&self, id: &str, spec: &HandlerSpec) -> WebhookResult<Value>;

    /// Disables a handler, keeping its delivery history.
    async fn disable_handler(&self, id: &str) -> WebhookResult<()>;

    /// Deletes a handler.
    async fn delete_handler(&self, id: &str) -> WebhookResult<()>;
}

/// Registry reached over the private API.
#[derive(Debug, Clone)]
pub struct HttpEventRegistry {
    client: ApiClient,
    limit: usize,
}

impl HttpEventRegistry {
    /// Creates a registry on top of an authenticated client.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Sets the list limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn limit_query(&self) -> [(&'static str, String); 1] {
        [("limit", self.limit.to_string())]
    }
}

#[async_trait]
impl EventRegistry for HttpEventRegistry {
    async fn list_events(&self) -> WebhookResult<Value> {
        Ok(self
            .client
            .get([API_PREFIX, "events"], &self.limit_query())
            .await?)
    }

    async fn list_handlers(&self) -> WebhookResult<Value> {
        Ok(self
            .client
            .get([API_PREFIX, "handlers"], &self.limit_query())
            .await?)
    }

    async fn create_handler(&self, spec: &HandlerSpec) -> WebhookResult<Value> {
        let url = self.client.url([API_PREFIX, "handlers"])?;
        let body = serde_json::to_value(spec)?;
        Ok(self.client.send_json(Method::POST, url, Some(&body)).await?)
    }

    async fn update_handler(&self, id: &str, spec: &HandlerSpec) -> WebhookResult<Value> {
        let url = self.client.url([API_PREFIX, "handlers", id])?;
        let body = serde_json::to_value(spec)?;
        Ok(self.client.send_json(Method::PATCH, url, Some(&body)).await?)
    }

    async fn disable_handler(&self, id: &str) -> WebhookResult<()> {
        let url = self.client.url([API_PREFIX, "handlers", id])?;
        let body = json!({ "enabled": false });
        self.client.send_json(Method::PATCH, url, Some(&body)).await?;
        Ok(())
    }

    async fn delete_handler(&self, id: &str) -> WebhookResult<()> {
        let url = self.client.url([API_PREFIX, "handlers", id])?;
        self.client.send_json(Method::DELETE, url, None).await?;
        Ok(())
    }
}
