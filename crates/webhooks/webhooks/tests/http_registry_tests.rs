//! Tests for the HTTP registry against a fake Statamic Events API
//!
//! Tests cover:
//! - Endpoint paths, methods and query parameters
//! - Bearer authentication
//! - Full lifecycle over HTTP

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method as HttpMethod, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use statamic_core::{ApiClient, Credentials};
use statamic_webhooks::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    path: String,
    query: HashMap<String, String>,
    authorization: String,
    body: Value,
}

#[derive(Clone, Default)]
struct FakeStatamic {
    captured: Arc<Mutex<Vec<Captured>>>,
    handlers: Arc<Mutex<Vec<Value>>>,
}

impl FakeStatamic {
    fn capture(&self, method: HttpMethod, path: String, query: HashMap<String, String>, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.captured.lock().unwrap().push(Captured {
            method: method.to_string(),
            path,
            query,
            authorization,
            body,
        });
    }

    fn captured(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn list_events(
    State(fake): State<FakeStatamic>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.capture(HttpMethod::GET, "/statamic-events/events".into(), query, &headers, Value::Null);
    Json(json!({"data": {"Statamic\\Events\\EntrySaved": "Entry Saved", "Statamic\\Events\\AssetSaved": "Asset Saved"}}))
}

async fn list_handlers(
    State(fake): State<FakeStatamic>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.capture(HttpMethod::GET, "/statamic-events/handlers".into(), query, &headers, Value::Null);
    let handlers = fake.handlers.lock().unwrap().clone();
    Json(json!({ "data": handlers }))
}

async fn create_handler(
    State(fake): State<FakeStatamic>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    fake.capture(HttpMethod::POST, "/statamic-events/handlers".into(), HashMap::new(), &headers, body.clone());
    let mut handler = body;
    handler["id"] = json!(41);
    fake.handlers.lock().unwrap().push(handler.clone());
    Json(json!({ "data": handler }))
}

async fn update_handler(
    State(fake): State<FakeStatamic>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    fake.capture(
        HttpMethod::PATCH,
        format!("/statamic-events/handlers/{}", id),
        HashMap::new(),
        &headers,
        body.clone(),
    );

    let mut handlers = fake.handlers.lock().unwrap();
    let handler = handlers
        .iter_mut()
        .find(|h| h["id"].to_string() == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(target), Some(patch)) = (handler.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(Json(json!({ "data": handler.clone() })))
}

async fn delete_handler(
    State(fake): State<FakeStatamic>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    fake.capture(
        HttpMethod::DELETE,
        format!("/statamic-events/handlers/{}", id),
        HashMap::new(),
        &headers,
        Value::Null,
    );
    fake.handlers.lock().unwrap().retain(|h| h["id"].to_string() != id);
    StatusCode::NO_CONTENT
}

async fn spawn(fake: FakeStatamic) -> HttpEventRegistry {
    let app = Router::new()
        .route("/cms/api/private/statamic-events/events", get(list_events))
        .route(
            "/cms/api/private/statamic-events/handlers",
            get(list_handlers).post(create_handler),
        )
        .route(
            "/cms/api/private/statamic-events/handlers/{id}",
            patch(update_handler).delete(delete_handler),
        )
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let credentials = Credentials::new("cms-token", format!("http://{}/cms/api/private/", addr));
    HttpEventRegistry::new(ApiClient::new(&credentials).unwrap())
}

fn installation() -> Installation {
    Installation::new(
        "node-7",
        "https://hooks.example.com/webhook/7",
        SubscriptionConfig::new(["Statamic\\Events\\EntrySaved"]),
    )
}

mod endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_event_options_over_http() {
        let fake = FakeStatamic::default();
        let registry = spawn(fake.clone()).await;

        let options = load_event_options(&registry).await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "Asset Saved");

        let captured = fake.captured();
        assert_eq!(captured[0].query.get("limit").map(String::as_str), Some("10000"));
        assert_eq!(captured[0].authorization, "Bearer cms-token");
    }

    #[tokio::test]
    async fn test_custom_list_limit() {
        let fake = FakeStatamic::default();
        let registry = spawn(fake.clone()).await.with_limit(50);

        registry.list_handlers().await.unwrap();
        assert_eq!(fake.captured()[0].query.get("limit").map(String::as_str), Some("50"));
    }

    #[tokio::test]
    async fn test_create_sends_desired_state() {
        let fake = FakeStatamic::default();
        let manager = SubscriptionManager::new(spawn(fake.clone()).await);
        let mut inst = installation();

        assert!(manager.register(&mut inst).await);
        assert_eq!(inst.record.remote_handler_id.as_deref(), Some("41"));

        let create = &fake.captured()[0];
        assert_eq!(create.method, "POST");
        assert_eq!(create.body["driver"], "webhook");
        assert_eq!(create.body["url"], "https://hooks.example.com/webhook/7");
        assert_eq!(create.body["method"], "post");
        assert_eq!(create.body["events"], json!(["Statamic\\Events\\EntrySaved"]));
        assert_eq!(create.authorization, "Bearer cms-token");
    }
}

mod lifecycle_over_http_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_lifecycle() {
        let fake = FakeStatamic::default();
        let manager = SubscriptionManager::new(spawn(fake.clone()).await);
        let mut inst = installation();

        assert!(manager.activate(&mut inst).await);
        assert!(manager.verify(&mut inst).await);

        assert!(manager.deregister(&mut inst).await);
        assert!(inst.record.is_empty());

        let captured = fake.captured();
        let disable = captured.last().unwrap();
        assert_eq!(disable.method, "PATCH");
        assert_eq!(disable.path, "/statamic-events/handlers/41");
        assert_eq!(disable.body, json!({"enabled": false}));

        let handlers = fake.handlers.lock().unwrap().clone();
        assert_eq!(handlers[0]["enabled"], false);
    }

    #[tokio::test]
    async fn test_delete_mode_over_http() {
        let fake = FakeStatamic::default();
        let manager = SubscriptionManager::with_config(
            spawn(fake.clone()).await,
            ManagerConfig::new().removal_mode(RemovalMode::Delete),
        );
        let mut inst = installation();

        assert!(manager.register(&mut inst).await);
        assert!(manager.deregister(&mut inst).await);

        assert_eq!(fake.captured().last().unwrap().method, "DELETE");
        assert!(fake.handlers.lock().unwrap().is_empty());
    }
}
