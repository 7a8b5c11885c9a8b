//! # Statamic Core
//!
//! This crate provides the foundation shared by the Statamic integration:
//! the stored credential pair, the authenticated API client, and the routing
//! table of the generic CRUD resource node.
//!
//! ## Example
//!
//! ```rust,ignore
//! use statamic_core::{ApiClient, Credentials, Operation, Resource, ResourceParams, ResourceRequest};
//!
//! let client = ApiClient::new(&Credentials::new(token, "https://site.test/api/private"))?;
//! let request = ResourceRequest::build(
//!     Resource::CollectionEntries,
//!     Operation::Get,
//!     &ResourceParams::new().collection("blog"),
//! )?;
//! let entries = client.execute(&request, None).await?;
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod resource;

// Re-export commonly used items at the crate root
pub use client::{ApiClient, ClientOptions};
pub use credentials::{Credentials, DEFAULT_DOMAIN, DOCUMENTATION_URL};
pub use error::{ApiError, ApiResult};
pub use resource::{Operation, Resource, ResourceParams, ResourceRequest};

pub use reqwest::{Method, Url};
