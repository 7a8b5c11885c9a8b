//! Tests for the delivery route
//!
//! Tests cover:
//! - Handshake response headers
//! - Event forwarding to the sink
//! - Record persistence after a handshake

use axum::body::{to_bytes, Body};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use statamic_axum::*;
use statamic_webhooks::{
    InMemoryRegistry, InMemorySubscriptionStore, Installation, SubscriptionConfig,
    SubscriptionLifecycle, SubscriptionManager, SubscriptionStore,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;

struct Harness {
    app: Router,
    installation: Arc<Mutex<Installation>>,
    runs: mpsc::Receiver<TriggeredRun>,
    store: Arc<InMemorySubscriptionStore>,
}

fn harness() -> Harness {
    let manager: Arc<dyn SubscriptionLifecycle> =
        Arc::new(SubscriptionManager::new(InMemoryRegistry::new()));
    let installation = Arc::new(Mutex::new(Installation::new(
        "node-1",
        "https://hooks.example.com/webhook",
        SubscriptionConfig::new(["EntrySaved"]),
    )));
    let (sink, runs) = ChannelSink::new(8);
    let store = Arc::new(InMemorySubscriptionStore::new());

    let state = DeliveryState::new(manager, installation.clone(), Arc::new(sink))
        .with_store(store.clone());

    Harness {
        app: delivery_routes(DEFAULT_WEBHOOK_PATH, state),
        installation,
        runs,
        store,
    }
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

mod handshake_tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_echoes_secret() {
        let mut h = harness();

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("X-Hook-Secret", "abc")
            .body(Body::empty())
            .unwrap();

        let response = h.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-hook-secret").unwrap(), "abc");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        assert_eq!(
            h.installation.lock().await.record.handshake_secret.as_deref(),
            Some("abc")
        );
        assert!(h.runs.try_recv().is_err());

        let stored = h.store.load("node-1").await.unwrap().unwrap();
        assert_eq!(stored.handshake_secret.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_non_ascii_secret_is_rejected() {
        let mut h = harness();

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("X-Hook-Secret", HeaderValue::from_bytes(b"ab\xffc").unwrap())
            .header("content-type", "application/json")
            .body(Body::from(json!({"events": [{"type": "EntrySaved"}]}).to_string()))
            .unwrap();

        let response = h.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("x-hook-secret").is_none());
        assert!(h.runs.try_recv().is_err());
        assert!(h.installation.lock().await.record.handshake_secret.is_none());
        assert!(h.store.load("node-1").await.unwrap().is_none());
    }
}

mod event_tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_forwarded() {
        let mut h = harness();

        let response = h
            .app
            .clone()
            .oneshot(post(json!({"events": [{"type": "EntrySaved", "id": "1"}]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["received"], 1);

        let run = h.runs.recv().await.unwrap();
        assert_eq!(run.installation_id, "node-1");
        assert_eq!(run.events.len(), 1);
        assert_eq!(run.events[0].event_type(), Some("EntrySaved"));

        // Event deliveries leave the record alone, so nothing is written.
        assert!(h.store.load("node-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_delivery_is_accepted_silently() {
        let mut h = harness();

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from("{broken"))
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["received"], 0);
        assert!(h.runs.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_is_not_routed() {
        let h = harness();

        let request = Request::builder()
            .method("GET")
            .uri("/webhook")
            .body(Body::empty())
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
