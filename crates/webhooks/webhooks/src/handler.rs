//! Desired state of a remote webhook handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::record::Installation;

/// Driver name of webhook handlers.
pub const WEBHOOK_DRIVER: &str = "webhook";

/// Filter block sent with the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HandlerFilter {
    /// Filter expression, evaluated by the registry.
    pub code: String,
}

/// Body of the create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub driver: String,
    pub events: Vec<String>,
    pub title: String,
    pub url: String,
    pub method: String,
    pub should_queue: bool,
    pub authentication_type: String,
    pub enabled: bool,
    pub throw_exception_on_fail: bool,
    pub filter: HandlerFilter,
    pub payload: Option<String>,
    pub payload_antlers_parse: bool,
    pub payload_content_type: String,
}

impl HandlerSpec {
    /// Builds the desired state of an installation's handler.
    pub fn for_installation(installation: &Installation, title_prefix: &str) -> Self {
        let config = &installation.config;

        Self {
            driver: WEBHOOK_DRIVER.to_string(),
            events: config.events.clone(),
            title: format!("{} {}", title_prefix, installation.id),
            url: installation.callback_url.clone(),
            method: "post".to_string(),
            should_queue: config.should_queue(),
            authentication_type: "none".to_string(),
            enabled: true,
            throw_exception_on_fail: config.throw_exception_on_fail,
            filter: HandlerFilter {
                code: config.filter.clone(),
            },
            payload: config.payload_template().map(str::to_string),
            payload_antlers_parse: config.payload_antlers_parse,
            payload_content_type: config.content_type().to_string(),
        }
    }

    /// Checks whether a handler returned by the registry already has this
    /// configuration.
    ///
    /// Events compare as sets. A missing field, `null` and `""` are treated
    /// alike, and booleans also match `0`/`1`. Any other difference is a
    /// mismatch.
    pub fn matches(&self, remote: &Value) -> bool {
        let remote_events: Option<BTreeSet<&str>> = remote
            .get("events")
            .and_then(Value::as_array)
            .map(|events| events.iter().filter_map(Value::as_str).collect());
        let desired_events: BTreeSet<&str> = self.events.iter().map(String::as_str).collect();

        if remote_events.as_ref() != Some(&desired_events) {
            return false;
        }

        let Ok(Value::Object(desired)) = serde_json::to_value(self) else {
            return false;
        };

        desired
            .iter()
            .filter(|(key, _)| key.as_str() != "events")
            .all(|(key, value)| field_matches(value, remote.get(key)))
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Object(map)) => map.values().all(|v| is_blank(Some(v))),
        _ => false,
    }
}

fn field_matches(desired: &Value, remote: Option<&Value>) -> bool {
    match (desired, remote) {
        (Value::Bool(d), Some(Value::Number(n))) => n.as_i64() == Some(i64::from(*d)),
        (Value::Object(d), Some(Value::Object(r))) => {
            d.iter().all(|(key, value)| field_matches(value, r.get(key)))
        }
        (d, r) if is_blank(Some(d)) && is_blank(r) => true,
        (d, Some(r)) => d == r,
        (_, None) => false,
    }
}

/// Extracts a handler identifier. The registry may send it as a string or a
/// number.
pub fn handler_id(handler: &Value) -> Option<String> {
    match handler.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Whether a listed handler is a webhook pointing at `callback_url`.
pub fn targets_url(handler: &Value, callback_url: &str) -> bool {
    handler.get("driver").and_then(Value::as_str) == Some(WEBHOOK_DRIVER)
        && handler.get("url").and_then(Value::as_str) == Some(callback_url)
}
