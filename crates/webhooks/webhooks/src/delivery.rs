//! Inbound deliveries from the registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Header carrying the handshake secret.
pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";

/// Raw inbound request.
#[derive(Debug, Clone, Default)]
pub struct DeliveryEnvelope {
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl DeliveryEnvelope {
    /// Creates an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an envelope from header pairs and a body.
    pub fn from_parts<I, K, V>(headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();

        Self {
            headers,
            body: body.into(),
        }
    }

    /// Adds a header. Names are case-insensitive.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: &Value) -> Self {
        self.body = body.to_string().into_bytes();
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Looks up a header.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns the handshake secret, if this is a handshake.
    pub fn hook_secret(&self) -> Option<&str> {
        self.get_header(HOOK_SECRET_HEADER)
    }

    /// Returns the raw body.
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the events carried by the body.
    ///
    /// Accepts `{"events": [...]}` or a bare array. Only JSON objects become
    /// events; anything else yields nothing.
    pub fn events(&self) -> Vec<DeliveredEvent> {
        let Ok(body) = serde_json::from_slice::<Value>(&self.body) else {
            return Vec::new();
        };

        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("events") {
                Some(Value::Array(items)) => items,
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(fields) => Some(DeliveredEvent(fields)),
                _ => None,
            })
            .collect()
    }
}

/// One event handed to the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveredEvent(pub Map<String, Value>);

impl DeliveredEvent {
    /// Event name, read from `type` or `event`.
    pub fn event_type(&self) -> Option<&str> {
        self.0
            .get("type")
            .or_else(|| self.0.get("event"))
            .and_then(Value::as_str)
    }

    /// Returns a field of the payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Converts the event into a JSON value.
    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}

/// Outcome of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Ownership challenge. The secret must be echoed back with status 200
    /// and no workflow runs.
    Handshake {
        /// Secret to echo back.
        secret: String,
    },
    /// Events for the workflow. May be empty.
    Events(Vec<DeliveredEvent>),
}

impl DeliveryResult {
    /// Whether the delivery produces no workflow run.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, DeliveryResult::Handshake { .. })
    }

    /// Returns the delivered events.
    pub fn events(&self) -> &[DeliveredEvent] {
        match self {
            DeliveryResult::Events(events) => events,
            DeliveryResult::Handshake { .. } => &[],
        }
    }

    /// Consumes the result, returning the delivered events.
    pub fn into_events(self) -> Vec<DeliveredEvent> {
        match self {
            DeliveryResult::Events(events) => events,
            DeliveryResult::Handshake { .. } => Vec::new(),
        }
    }
}
