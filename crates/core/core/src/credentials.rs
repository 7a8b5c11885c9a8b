//! Credential definition for the Statamic private API.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Domain pre-filled for new credentials.
pub const DEFAULT_DOMAIN: &str = "https://yoursite.statamic.com/api/private";

/// Link shown next to the credential form.
pub const DOCUMENTATION_URL: &str = "https://statamic.com/addons/tv2reg/private-api";

/// Stored `{token, domain}` pair.
///
/// `domain` is the API base URL. A single trailing slash is ignored so that
/// `https://site/api/private/` and `https://site/api/private` address the
/// same endpoints.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token issued by the private API add-on.
    #[serde(default)]
    pub token: String,
    /// API base URL.
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(token: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            domain: domain.into(),
        }
    }

    /// Returns the domain with one trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.domain.strip_suffix('/').unwrap_or(&self.domain)
    }

    /// Returns the value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Checks the pair and parses the base URL.
    pub fn validate(&self) -> ApiResult<Url> {
        if self.token.trim().is_empty() {
            return Err(ApiError::InvalidCredentials("token is empty".into()));
        }

        let url = Url::parse(self.base_url())
            .map_err(|e| ApiError::InvalidCredentials(format!("domain: {}", e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ApiError::InvalidCredentials(format!(
                "unsupported scheme '{}'",
                other
            ))),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            token: String::new(),
            domain: default_domain(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}
