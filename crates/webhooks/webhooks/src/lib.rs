//! # Statamic Webhooks
//!
//! Webhook trigger for the Statamic Events add-on, providing:
//! - Idempotent registration of remote webhook handlers
//! - Handshake handling and event delivery mapping
//! - Event option listing for the trigger configuration
//! - HTTP and in-memory registries
//!
//! ## Example
//!
//! ```rust,ignore
//! use statamic_webhooks::{
//!     HttpEventRegistry, Installation, SubscriptionConfig, SubscriptionLifecycle,
//!     SubscriptionManager,
//! };
//!
//! let manager = SubscriptionManager::new(HttpEventRegistry::new(client));
//!
//! let mut installation = Installation::new(
//!     "trigger-1",
//!     "https://hooks.example.com/webhook",
//!     SubscriptionConfig::new(["Statamic\\Events\\EntrySaved"]),
//! );
//!
//! if !manager.activate(&mut installation).await {
//!     tracing::warn!("webhook could not be registered");
//! }
//! ```

mod config;
mod delivery;
mod error;
mod handler;
mod manager;
mod memory;
mod options;
mod record;
mod registry;
mod storage;

pub use config::{RemovalMode, SubscriptionConfig, DEFAULT_PAYLOAD_CONTENT_TYPE};
pub use delivery::{DeliveredEvent, DeliveryEnvelope, DeliveryResult, HOOK_SECRET_HEADER};
pub use error::{WebhookError, WebhookResult};
pub use handler::{handler_id, HandlerFilter, HandlerSpec, WEBHOOK_DRIVER};
pub use manager::{ManagerConfig, SubscriptionLifecycle, SubscriptionManager};
pub use memory::{InMemoryRegistry, RecordedRequest};
pub use options::{load_event_options, EventOption};
pub use record::{Installation, SubscriptionRecord};
pub use registry::{EventRegistry, HttpEventRegistry, DEFAULT_LIST_LIMIT};
pub use storage::{InMemorySubscriptionStore, SubscriptionStore};
