//! # Statamic Events Server
//!
//! Standalone host for one Statamic webhook trigger. On start it restores the
//! subscription record, makes sure the remote handler matches the configured
//! state, then serves the delivery endpoint. Delivered events are written to
//! stdout as JSON lines. On shutdown the handler is removed again.

mod cli;
mod config;
mod state;

pub use cli::{Cli, Command, ResourceArg, DEFAULT_CONFIG_PATH};
pub use config::{
    load_config, parse_config, AppConfig, ConfigError, CredentialsConfig, ServerConfig,
    TriggerConfig,
};
pub use state::JsonFileStore;

use serde_json::Value;
use statamic_axum::{delivery_routes, ChannelSink, DeliveryState, TriggeredRun};
use statamic_core::{ApiClient, ApiError, ResourceRequest};
use statamic_webhooks::{
    EventOption, HttpEventRegistry, Installation, SubscriptionLifecycle, SubscriptionManager,
    SubscriptionStore, WebhookError,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

/// Buffered runs between the delivery route and the consumer.
const RUN_BUFFER: usize = 64;

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The events server.
pub struct EventsServer {
    config: AppConfig,
    manager: Arc<SubscriptionManager<HttpEventRegistry>>,
    store: Arc<JsonFileStore>,
}

impl EventsServer {
    /// Creates a server from a validated configuration.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let client = ApiClient::with_options(
            &config.credentials.credentials,
            config.credentials.client_options(),
        )?;
        let manager = SubscriptionManager::with_config(
            HttpEventRegistry::new(client),
            config.trigger.manager_config(),
        );
        let store = JsonFileStore::new(&config.server.state_file);

        Ok(Self {
            config,
            manager: Arc::new(manager),
            store: Arc::new(store),
        })
    }

    /// Gets the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Gets the subscription manager.
    pub fn manager(&self) -> &SubscriptionManager<HttpEventRegistry> {
        &self.manager
    }

    /// Lists the events the CMS can deliver.
    pub async fn event_options(&self) -> Result<Vec<EventOption>, ServerError> {
        Ok(self.manager.event_options().await?)
    }

    /// Runs one CRUD request against the private API.
    pub async fn execute(
        &self,
        request: &ResourceRequest,
        body: Option<&Value>,
    ) -> Result<Value, ServerError> {
        Ok(self.manager.registry().client().execute(request, body).await?)
    }

    /// Binds the configured address and serves until Ctrl+C.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Starting Statamic Events Server on {}", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// Activates the subscription, serves deliveries on `listener` until
    /// `shutdown` resolves, then deregisters.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let trigger = &self.config.trigger;

        let record = self.store.load_or_default(&trigger.id).await?;
        let mut installation = Installation::new(
            trigger.id.clone(),
            trigger.callback_url.clone(),
            trigger.subscription.clone(),
        )
        .with_record(record);

        if self.manager.activate(&mut installation).await {
            tracing::info!(
                installation = %installation.id,
                handler = ?installation.record.remote_handler_id,
                "Webhook subscription active"
            );
        } else {
            tracing::warn!(
                installation = %installation.id,
                "Webhook subscription could not be activated, deliveries may not arrive"
            );
        }
        self.store.save(&installation.id, &installation.record).await?;

        let installation = Arc::new(Mutex::new(installation));
        let (sink, runs) = ChannelSink::new(RUN_BUFFER);
        let consumer = tokio::spawn(print_runs(runs));

        let lifecycle: Arc<dyn SubscriptionLifecycle> = self.manager.clone();
        let store: Arc<dyn SubscriptionStore> = self.store.clone();
        let state = DeliveryState::new(lifecycle, installation.clone(), Arc::new(sink))
            .with_store(store);
        let app = delivery_routes(&trigger.path, state);

        tracing::info!(path = %trigger.path, "Serving deliveries");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        // The router owned the last sender, so the consumer drains and stops.
        if let Err(e) = consumer.await {
            tracing::warn!("Event consumer stopped abnormally: {}", e);
        }

        if trigger.deregister_on_shutdown {
            let mut installation = installation.lock().await;
            if !self.manager.deregister(&mut *installation).await {
                tracing::warn!(
                    installation = %installation.id,
                    "Remote handler could not be removed, local state cleared anyway"
                );
            }
            self.store.save(&installation.id, &installation.record).await?;
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn print_runs(mut runs: mpsc::Receiver<TriggeredRun>) {
    while let Some(run) = runs.recv().await {
        match serde_json::to_string(&run) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Failed to encode run: {}", e),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
