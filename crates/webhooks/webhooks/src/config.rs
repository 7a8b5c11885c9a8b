//! Subscription configuration entered by the user.

use serde::{Deserialize, Serialize};

/// Content type used when none is configured.
pub const DEFAULT_PAYLOAD_CONTENT_TYPE: &str = "application/json";

/// Per-installation subscription settings.
///
/// `filter` and `payload` are forwarded to the registry verbatim; they are
/// evaluated remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Event names to subscribe to.
    #[serde(default)]
    pub events: Vec<String>,
    /// Filter expression. Empty means no filter.
    #[serde(default)]
    pub filter: String,
    /// Payload template. `None` lets the registry send its default payload.
    #[serde(default)]
    pub payload: Option<String>,
    /// Content type of the delivered payload.
    #[serde(default)]
    pub payload_content_type: Option<String>,
    /// Whether the registry renders the payload template.
    #[serde(default)]
    pub payload_antlers_parse: bool,
    /// Deliver synchronously inside the triggering request.
    #[serde(default = "default_true")]
    pub blocking: bool,
    /// Let a failed delivery raise inside the CMS.
    #[serde(default = "default_true")]
    pub throw_exception_on_fail: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            filter: String::new(),
            payload: None,
            payload_content_type: None,
            payload_antlers_parse: false,
            blocking: true,
            throw_exception_on_fail: true,
        }
    }
}

impl SubscriptionConfig {
    /// Creates a configuration subscribed to the given events.
    pub fn new(events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the payload template.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Sets the payload content type.
    pub fn payload_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.payload_content_type = Some(content_type.into());
        self
    }

    /// Enables remote template rendering of the payload.
    pub fn parse_payload(mut self, parse: bool) -> Self {
        self.payload_antlers_parse = parse;
        self
    }

    /// Sets the blocking mode.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Sets the failure escalation flag.
    pub fn throw_exception_on_fail(mut self, throw: bool) -> Self {
        self.throw_exception_on_fail = throw;
        self
    }

    /// Queued delivery is the inverse of blocking delivery.
    pub fn should_queue(&self) -> bool {
        !self.blocking
    }

    /// Returns the configured content type, or the JSON default.
    pub fn content_type(&self) -> &str {
        match self.payload_content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() => ct,
            _ => DEFAULT_PAYLOAD_CONTENT_TYPE,
        }
    }

    /// Returns the payload template, treating an empty string as unset.
    pub fn payload_template(&self) -> Option<&str> {
        self.payload.as_deref().filter(|p| !p.is_empty())
    }
}

/// How the remote handler is removed on deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// PATCH `enabled: false`, keeping the remote delivery history.
    #[default]
    Disable,
    /// DELETE the handler.
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SubscriptionConfig::default();
        assert!(config.blocking);
        assert!(config.throw_exception_on_fail);
        assert!(!config.should_queue());
        assert_eq!(config.content_type(), DEFAULT_PAYLOAD_CONTENT_TYPE);
        assert_eq!(config.payload_template(), None);
    }

    #[test]
    fn test_content_type_falls_back_when_blank() {
        let config = SubscriptionConfig::default().payload_content_type("  ");
        assert_eq!(config.content_type(), "application/json");

        let config = SubscriptionConfig::default().payload_content_type("text/plain");
        assert_eq!(config.content_type(), "text/plain");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SubscriptionConfig =
            serde_json::from_str(r#"{"events": ["EntrySaved"], "blocking": false}"#).unwrap();
        assert_eq!(config.events, vec!["EntrySaved"]);
        assert!(config.should_queue());
        assert!(config.throw_exception_on_fail);
    }

    #[test]
    fn test_removal_mode_names() {
        let mode: RemovalMode = serde_json::from_str(r#""delete""#).unwrap();
        assert_eq!(mode, RemovalMode::Delete);
        assert_eq!(RemovalMode::default(), RemovalMode::Disable);
    }
}
