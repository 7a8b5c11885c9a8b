//! Route mounting for the inbound delivery endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use statamic_webhooks::{
    DeliveryEnvelope, DeliveryResult, Installation, SubscriptionLifecycle, SubscriptionStore,
    HOOK_SECRET_HEADER,
};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::sink::{EventSink, TriggeredRun};

/// Path the registry posts to when none is configured.
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Shared state of the delivery route.
#[derive(Clone)]
pub struct DeliveryState {
    manager: Arc<dyn SubscriptionLifecycle>,
    installation: Arc<Mutex<Installation>>,
    sink: Arc<dyn EventSink>,
    store: Option<Arc<dyn SubscriptionStore>>,
}

impl DeliveryState {
    /// Creates the state for one installation.
    pub fn new(
        manager: Arc<dyn SubscriptionLifecycle>,
        installation: Arc<Mutex<Installation>>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            manager,
            installation,
            sink,
            store: None,
        }
    }

    /// Persists the record whenever a delivery changes it.
    pub fn with_store(mut self, store: Arc<dyn SubscriptionStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Creates an Axum router serving the delivery endpoint at `path`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .merge(delivery_routes(DEFAULT_WEBHOOK_PATH, state));
/// ```
pub fn delivery_routes<S>(path: &str, state: DeliveryState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(path, post(delivery_handler))
        .with_state(state)
}

async fn delivery_handler(
    State(state): State<DeliveryState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = headers.get(HOOK_SECRET_HEADER) {
        if secret.to_str().is_err() {
            tracing::warn!("Rejecting handshake with a non-ASCII secret");
            return StatusCode::BAD_REQUEST.into_response();
        }
    }

    let envelope = DeliveryEnvelope::from_parts(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string()))),
        body.to_vec(),
    );

    let (result, installation_id, changed) = {
        let mut installation = state.installation.lock().await;
        let before = installation.record.clone();
        let result = state.manager.receive(&mut *installation, &envelope);
        let changed = (installation.record != before).then(|| installation.record.clone());
        (result, installation.id.clone(), changed)
    };

    // Only a handshake touches the record; event deliveries skip the write.
    if let (Some(store), Some(record)) = (&state.store, changed) {
        if let Err(e) = store.save(&installation_id, &record).await {
            tracing::warn!(installation = %installation_id, "Failed to persist subscription record: {}", e);
        }
    }

    match result {
        DeliveryResult::Handshake { secret } => match HeaderValue::from_str(&secret) {
            Ok(value) => (
                StatusCode::OK,
                [(HeaderName::from_static(HOOK_SECRET_HEADER), value)],
            )
                .into_response(),
            Err(_) => StatusCode::BAD_REQUEST.into_response(),
        },
        DeliveryResult::Events(events) => {
            let received = events.len();
            if received > 0 {
                state
                    .sink
                    .dispatch(TriggeredRun {
                        installation_id,
                        events,
                    })
                    .await;
            }
            Json(json!({ "received": received })).into_response()
        }
    }
}
