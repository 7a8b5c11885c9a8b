//! Webhook subscription manager - main entry point.
//!
//! The host drives an installation through [`SubscriptionLifecycle`]:
//! `verify` when the trigger is activated, `register` when `verify` says the
//! remote side is not in the desired state, `deregister` on teardown, and
//! `receive` for every inbound request.
//!
//! `verify` answers `true` only when the registry already holds a webhook
//! handler for the callback URL whose configuration equals the desired
//! state. Any drift answers `false`, so `register` PATCHes the handler
//! found by `verify` instead of creating a duplicate.
//!
//! Lifecycle methods never return errors. Registry failures are logged and
//! reported as `false`.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RemovalMode;
use crate::delivery::{DeliveryEnvelope, DeliveryResult};
use crate::error::{WebhookError, WebhookResult};
use crate::handler::{handler_id, targets_url, HandlerSpec};
use crate::options::{load_event_options, EventOption};
use crate::record::Installation;
use crate::registry::EventRegistry;

/// Marker of a malformed callback URL produced by some hosts.
const ENCODED_SPACE: &str = "%20";

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Prefix of the remote handler title; the installation id follows it.
    pub title_prefix: String,
    /// How handlers are removed on deregistration.
    pub removal_mode: RemovalMode,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            title_prefix: "Workflow".to_string(),
            removal_mode: RemovalMode::Disable,
        }
    }
}

impl ManagerConfig {
    /// Creates a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title prefix.
    pub fn title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    /// Sets the removal mode.
    pub fn removal_mode(mut self, mode: RemovalMode) -> Self {
        self.removal_mode = mode;
        self
    }
}

/// Lifecycle callbacks invoked by the host runtime.
#[async_trait]
pub trait SubscriptionLifecycle: Send + Sync {
    /// Checks whether the registry already holds the desired handler.
    async fn verify(&self, installation: &mut Installation) -> bool;

    /// Creates or updates the remote handler.
    async fn register(&self, installation: &mut Installation) -> bool;

    /// Removes the remote handler and clears local state.
    async fn deregister(&self, installation: &mut Installation) -> bool;

    /// Maps an inbound request.
    fn receive(&self, installation: &mut Installation, envelope: &DeliveryEnvelope) -> DeliveryResult;

    /// Runs `verify` and, when needed, `register`.
    async fn activate(&self, installation: &mut Installation) -> bool {
        if self.verify(installation).await {
            return true;
        }
        self.register(installation).await
    }
}

/// Manages one registry's webhook subscriptions.
pub struct SubscriptionManager<R: EventRegistry> {
    registry: R,
    config: ManagerConfig,
}

impl<R: EventRegistry> SubscriptionManager<R> {
    /// Creates a manager with default configuration.
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, ManagerConfig::default())
    }

    /// Creates a manager with custom configuration.
    pub fn with_config(registry: R, config: ManagerConfig) -> Self {
        Self { registry, config }
    }

    /// Gets the registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Gets the configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Builds the desired handler state of an installation.
    pub fn desired_state(&self, installation: &Installation) -> HandlerSpec {
        HandlerSpec::for_installation(installation, &self.config.title_prefix)
    }

    /// Lists subscribable events for the configuration form.
    pub async fn event_options(&self) -> WebhookResult<Vec<EventOption>> {
        load_event_options(&self.registry).await
    }

    async fn try_verify(&self, installation: &mut Installation) -> WebhookResult<bool> {
        let response = self.registry.list_handlers().await?;

        let handlers = response
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| WebhookError::InvalidPayload("handler list has no data".into()))?;

        let found = handlers
            .iter()
            .filter(|h| targets_url(h, &installation.callback_url))
            .find_map(|h| handler_id(h).map(|id| (id, h)));

        let Some((id, handler)) = found else {
            tracing::debug!(
                installation = %installation.id,
                stale = ?installation.record.remote_handler_id,
                "No remote handler targets the callback URL"
            );
            installation.record.forget_handler();
            return Ok(false);
        };

        let desired = self.desired_state(installation);
        let up_to_date = desired.matches(handler);

        installation.record.remote_handler_id = Some(id);
        if up_to_date {
            installation.record.callback_url = Some(installation.callback_url.clone());
            installation.record.subscribed_events = desired.events.into_iter().collect();
        }

        Ok(up_to_date)
    }

    async fn try_register(&self, installation: &mut Installation) -> WebhookResult<bool> {
        let spec = self.desired_state(installation);

        let response = match installation.record.remote_handler_id.as_deref() {
            Some(id) => match self.registry.update_handler(id, &spec).await {
                Err(e) if e.is_not_found() => {
                    tracing::info!(
                        installation = %installation.id,
                        handler = %id,
                        "Remote handler is gone, creating a new one"
                    );
                    self.registry.create_handler(&spec).await?
                }
                other => other?,
            },
            None => self.registry.create_handler(&spec).await?,
        };

        let Some(id) = response.get("data").and_then(handler_id) else {
            return Ok(false);
        };

        installation
            .record
            .mark_registered(id, &installation.callback_url, spec.events);

        Ok(true)
    }

    async fn remove_remote(&self, id: &str) -> WebhookResult<()> {
        let result = match self.config.removal_mode {
            RemovalMode::Disable => self.registry.disable_handler(id).await,
            RemovalMode::Delete => self.registry.delete_handler(id).await,
        };

        match result {
            Err(e) if e.is_not_found() => {
                tracing::debug!(handler = %id, "Remote handler already gone");
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl<R: EventRegistry> SubscriptionLifecycle for SubscriptionManager<R> {
    async fn verify(&self, installation: &mut Installation) -> bool {
        match self.try_verify(installation).await {
            Ok(up_to_date) => up_to_date,
            Err(e) => {
                tracing::warn!(installation = %installation.id, "Failed to verify webhook: {}", e);
                false
            }
        }
    }

    async fn register(&self, installation: &mut Installation) -> bool {
        if installation.callback_url.contains(ENCODED_SPACE) {
            tracing::warn!(
                installation = %installation.id,
                url = %installation.callback_url,
                "Refusing to register a callback URL containing %20"
            );
            return false;
        }

        if installation.config.events.is_empty() {
            tracing::warn!(installation = %installation.id, "Refusing to register without events");
            return false;
        }

        match self.try_register(installation).await {
            Ok(true) => {
                tracing::info!(
                    installation = %installation.id,
                    handler = ?installation.record.remote_handler_id,
                    "Registered webhook"
                );
                true
            }
            Ok(false) => {
                tracing::warn!(
                    installation = %installation.id,
                    "Registry response carried no handler id"
                );
                false
            }
            Err(e) => {
                tracing::warn!(installation = %installation.id, "Failed to register webhook: {}", e);
                false
            }
        }
    }

    async fn deregister(&self, installation: &mut Installation) -> bool {
        let Some(id) = installation.record.remote_handler_id.clone() else {
            return true;
        };

        let result = self.remove_remote(&id).await;

        // Local state is dropped even when the remote call failed.
        installation.record.clear();

        match result {
            Ok(()) => {
                tracing::info!(installation = %installation.id, handler = %id, "Deregistered webhook");
                true
            }
            Err(e) => {
                tracing::warn!(
                    installation = %installation.id,
                    handler = %id,
                    "Failed to deregister webhook: {}",
                    e
                );
                false
            }
        }
    }

    fn receive(&self, installation: &mut Installation, envelope: &DeliveryEnvelope) -> DeliveryResult {
        if let Some(secret) = envelope.hook_secret() {
            tracing::info!(installation = %installation.id, "Received webhook handshake");
            installation.record.handshake_secret = Some(secret.to_string());
            return DeliveryResult::Handshake {
                secret: secret.to_string(),
            };
        }

        let events = envelope.events();
        if events.is_empty() {
            tracing::debug!(installation = %installation.id, "Delivery carried no events");
        }
        DeliveryResult::Events(events)
    }
}
