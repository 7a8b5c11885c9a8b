//! Authenticated HTTP client for the private API.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::{ApiError, ApiResult};
use crate::resource::ResourceRequest;

/// Transport options for [`ApiClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// Per-request timeout. The reqwest default (none) applies when unset.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables certificate verification.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Client that sends JSON requests with bearer authentication.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    authorization: String,
}

impl ApiClient {
    /// Creates a client with default options.
    pub fn new(credentials: &Credentials) -> ApiResult<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Creates a client with custom transport options.
    pub fn with_options(credentials: &Credentials, options: ClientOptions) -> ApiResult<Self> {
        let base_url = credentials.validate()?;

        let mut builder = Client::builder().danger_accept_invalid_certs(options.accept_invalid_certs);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            authorization: credentials.authorization_header(),
        })
    }

    /// Returns the normalised base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments. Segments are percent-encoded.
    pub fn url<I, S>(&self, segments: I) -> ApiResult<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidCredentials("domain cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// Non-success statuses become [`ApiError::Status`]. An empty body
    /// decodes to `Value::Null`.
    pub async fn send_json(&self, method: Method, url: Url, body: Option<&Value>) -> ApiResult<Value> {
        tracing::debug!(%method, %url, "Sending private API request");

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// GET with query parameters.
    pub async fn get<I, S>(&self, segments: I, query: &[(&str, String)]) -> ApiResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.url(segments)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        self.send_json(Method::GET, url, None).await
    }

    /// Executes a routed resource request. The body is only sent for
    /// operations that carry one.
    pub async fn execute(&self, request: &ResourceRequest, body: Option<&Value>) -> ApiResult<Value> {
        let url = self.url(&request.segments)?;
        let body = if request.operation.has_body() { body } else { None };
        self.send_json(request.method.clone(), url, body).await
    }
}
