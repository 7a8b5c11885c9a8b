//! Server configuration.

use serde::{Deserialize, Serialize};
use statamic_core::{ClientOptions, Credentials};
use statamic_webhooks::{ManagerConfig, RemovalMode, SubscriptionConfig};
use std::time::Duration;

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// File holding subscription records between runs.
    pub state_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            state_file: "statamic-events.state.json".to_string(),
        }
    }
}

/// Private API credentials plus transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl CredentialsConfig {
    /// Client options derived from this configuration.
    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new().accept_invalid_certs(self.accept_invalid_certs);
        match self.timeout_secs {
            Some(secs) => options.timeout(Duration::from_secs(secs)),
            None => options,
        }
    }
}

/// Webhook trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Installation id. Keys the state file and ends the handler title.
    pub id: String,
    /// Public URL the CMS posts to. Must route to `path` on this server.
    pub callback_url: String,
    /// Local path of the delivery endpoint.
    pub path: String,
    /// Prefix of the remote handler title.
    pub title_prefix: String,
    /// How the handler is removed on shutdown.
    pub removal_mode: RemovalMode,
    /// Deregister when the server stops.
    pub deregister_on_shutdown: bool,
    /// Subscription settings.
    pub subscription: SubscriptionConfig,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            callback_url: String::new(),
            path: "/webhook".to_string(),
            title_prefix: "Workflow".to_string(),
            removal_mode: RemovalMode::Disable,
            deregister_on_shutdown: true,
            subscription: SubscriptionConfig::default(),
        }
    }
}

impl TriggerConfig {
    /// Manager settings derived from this configuration.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig::new()
            .title_prefix(self.title_prefix.clone())
            .removal_mode(self.removal_mode)
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub credentials: CredentialsConfig,
    pub trigger: TriggerConfig,
}

impl AppConfig {
    /// Checks the values the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials
            .credentials
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.trigger.id.trim().is_empty() {
            return Err(ConfigError::Invalid("trigger.id must not be empty".into()));
        }
        if self.trigger.callback_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "trigger.callback_url is required".into(),
            ));
        }
        if !self.trigger.path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "trigger.path must start with '/'".into(),
            ));
        }

        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Parses a TOML document. Missing tables fall back to their defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: toml::Value =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let config = AppConfig {
        server: table(&config, "server")?,
        credentials: table(&config, "credentials")?,
        trigger: table(&config, "trigger")?,
    };
    config.validate()?;

    Ok(config)
}

fn table<T>(config: &toml::Value, name: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    Ok(config
        .get(name)
        .map(|v| toml::Value::try_into(v.clone()))
        .transpose()
        .map_err(|e| ConfigError::ParseError(format!("[{}]: {}", name, e)))?
        .unwrap_or_default())
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
