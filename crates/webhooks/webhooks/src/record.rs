//! Per-installation subscription state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::SubscriptionConfig;

/// State that survives between lifecycle invocations of one installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Identifier assigned by the registry. Absent until registration succeeds.
    #[serde(default)]
    pub remote_handler_id: Option<String>,
    /// Callback URL the handler was registered with.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Events the handler was registered for.
    #[serde(default)]
    pub subscribed_events: BTreeSet<String>,
    /// Secret captured during the handshake.
    #[serde(default)]
    pub handshake_secret: Option<String>,
    /// When the handler was last created or updated.
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a remote handler is known.
    pub fn is_registered(&self) -> bool {
        self.remote_handler_id.is_some()
    }

    /// Stores the outcome of a successful registration.
    pub fn mark_registered(
        &mut self,
        handler_id: impl Into<String>,
        callback_url: &str,
        events: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.remote_handler_id = Some(handler_id.into());
        self.callback_url = Some(callback_url.to_string());
        self.subscribed_events = events.into_iter().map(Into::into).collect();
        self.registered_at = Some(Utc::now());
    }

    /// Drops the handler reference, keeping the handshake secret.
    pub fn forget_handler(&mut self) {
        self.remote_handler_id = None;
        self.callback_url = None;
        self.subscribed_events.clear();
        self.registered_at = None;
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether the record holds no state at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The context handed to every lifecycle method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    /// Trigger identifier, used in the remote handler title.
    pub id: String,
    /// Externally reachable address the registry posts to.
    pub callback_url: String,
    /// User configuration.
    pub config: SubscriptionConfig,
    /// Persisted state.
    #[serde(default)]
    pub record: SubscriptionRecord,
}

impl Installation {
    /// Creates an installation with an empty record.
    pub fn new(
        id: impl Into<String>,
        callback_url: impl Into<String>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            id: id.into(),
            callback_url: callback_url.into(),
            config,
            record: SubscriptionRecord::new(),
        }
    }

    /// Restores a previously persisted record.
    pub fn with_record(mut self, record: SubscriptionRecord) -> Self {
        self.record = record;
        self
    }
}
