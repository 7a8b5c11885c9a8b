//! # Statamic Axum Integration
//!
//! This crate exposes the webhook trigger's inbound endpoint over Axum:
//! - Handshake answers echoing `X-Hook-Secret`
//! - Event deliveries forwarded to an [`EventSink`]
//! - Optional persistence of the subscription record
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statamic_axum::{delivery_routes, ChannelSink, DeliveryState, DEFAULT_WEBHOOK_PATH};
//!
//! let (sink, mut runs) = ChannelSink::new(64);
//! let state = DeliveryState::new(manager, installation, Arc::new(sink));
//!
//! let app = Router::new().merge(delivery_routes(DEFAULT_WEBHOOK_PATH, state));
//! ```

mod routes;
mod sink;

pub use routes::{delivery_routes, DeliveryState, DEFAULT_WEBHOOK_PATH};
pub use sink::{ChannelSink, EventSink, TriggeredRun};
