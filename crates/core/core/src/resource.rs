//! Routing table for the generic CRUD resource node.
//!
//! Every resource exposes the same five operations. Most resources live at
//! `/{resource}`; collection entries and taxonomy terms are nested under
//! their parent and need the parent handle as an extra parameter.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

/// Resources exposed by the private API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    AssetContainers,
    Collections,
    #[default]
    CollectionEntries,
    Forms,
    Globals,
    Navs,
    Taxonomies,
    TaxonomyTerms,
    Users,
}

impl Resource {
    /// All resources in display order.
    pub const ALL: [Resource; 9] = [
        Resource::AssetContainers,
        Resource::Collections,
        Resource::CollectionEntries,
        Resource::Forms,
        Resource::Globals,
        Resource::Navs,
        Resource::Taxonomies,
        Resource::TaxonomyTerms,
        Resource::Users,
    ];

    /// URL slug of the resource.
    pub fn slug(&self) -> &'static str {
        match self {
            Resource::AssetContainers => "asset-containers",
            Resource::Collections => "collections",
            Resource::CollectionEntries => "collection-entries",
            Resource::Forms => "forms",
            Resource::Globals => "globals",
            Resource::Navs => "navs",
            Resource::Taxonomies => "taxonomies",
            Resource::TaxonomyTerms => "taxonomy-terms",
            Resource::Users => "users",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::AssetContainers => "Asset Containers",
            Resource::Collections => "Collections",
            Resource::CollectionEntries => "Collection Entries",
            Resource::Forms => "Forms",
            Resource::Globals => "Globals",
            Resource::Navs => "Navigations",
            Resource::Taxonomies => "Taxonomies",
            Resource::TaxonomyTerms => "Taxonomy Terms",
            Resource::Users => "Users",
        }
    }

    /// Returns the path segments of the collection endpoint.
    fn base_segments(&self, params: &ResourceParams) -> ApiResult<Vec<String>> {
        match self {
            Resource::CollectionEntries => {
                let collection = params.require("collection", params.collection.as_deref())?;
                Ok(vec![
                    "collections".to_string(),
                    collection.to_string(),
                    "entries".to_string(),
                ])
            }
            Resource::TaxonomyTerms => {
                let taxonomy = params.require("taxonomy", params.taxonomy.as_deref())?;
                Ok(vec![
                    self.slug().to_string(),
                    taxonomy.to_string(),
                    "terms".to_string(),
                ])
            }
            _ => Ok(vec![self.slug().to_string()]),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .find(|r| r.slug() == s)
            .copied()
            .ok_or_else(|| ApiError::Unknown {
                kind: "resource",
                value: s.to_string(),
            })
    }
}

/// Operations available on every resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Get all.
    #[default]
    Get,
    /// Get one.
    Show,
    /// Create.
    Post,
    /// Delete.
    Delete,
    /// Update.
    Patch,
}

impl Operation {
    /// HTTP method the operation maps to.
    pub fn method(&self) -> Method {
        match self {
            Operation::Get | Operation::Show => Method::GET,
            Operation::Post => Method::POST,
            Operation::Delete => Method::DELETE,
            Operation::Patch => Method::PATCH,
        }
    }

    /// Whether the operation addresses a single item.
    pub fn targets_item(&self) -> bool {
        matches!(self, Operation::Show | Operation::Patch | Operation::Delete)
    }

    /// Whether the operation sends a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Operation::Post | Operation::Patch)
    }

    fn value(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Show => "show",
            Operation::Post => "post",
            Operation::Delete => "delete",
            Operation::Patch => "patch",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Operation::Get),
            "show" => Ok(Operation::Show),
            "post" => Ok(Operation::Post),
            "delete" => Ok(Operation::Delete),
            "patch" => Ok(Operation::Patch),
            other => Err(ApiError::Unknown {
                kind: "operation",
                value: other.to_string(),
            }),
        }
    }
}

/// Parameters filling the path placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceParams {
    /// Collection handle (collection entries only).
    #[serde(default)]
    pub collection: Option<String>,
    /// Taxonomy handle (taxonomy terms only).
    #[serde(default)]
    pub taxonomy: Option<String>,
    /// Item identifier (show, patch, delete).
    #[serde(default)]
    pub id: Option<String>,
}

impl ResourceParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collection handle.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the taxonomy handle.
    pub fn taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = Some(taxonomy.into());
        self
    }

    /// Sets the item identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn require<'a>(&self, name: &str, value: Option<&'a str>) -> ApiResult<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ApiError::missing(name)),
        }
    }
}

/// A routed request: method plus unencoded path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Resource being addressed.
    pub resource: Resource,
    /// Operation being performed.
    pub operation: Operation,
    /// HTTP method.
    pub method: Method,
    /// Path segments relative to the API base URL.
    pub segments: Vec<String>,
}

impl ResourceRequest {
    /// Routes an operation on a resource.
    pub fn build(
        resource: Resource,
        operation: Operation,
        params: &ResourceParams,
    ) -> ApiResult<Self> {
        let mut segments = resource.base_segments(params)?;

        if operation.targets_item() {
            let id = params.require("id", params.id.as_deref())?;
            segments.push(id.to_string());
        }

        Ok(Self {
            resource,
            operation,
            method: operation.method(),
            segments,
        })
    }

    /// Returns the path as `/a/b/c`, without percent-encoding.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_resource_routes() {
        let params = ResourceParams::new().id("blog");

        let req = ResourceRequest::build(Resource::Collections, Operation::Get, &params).unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path(), "/collections");

        let req = ResourceRequest::build(Resource::Collections, Operation::Show, &params).unwrap();
        assert_eq!(req.path(), "/collections/blog");

        let req = ResourceRequest::build(Resource::Users, Operation::Post, &params).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path(), "/users");

        let req = ResourceRequest::build(Resource::Navs, Operation::Delete, &params).unwrap();
        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.path(), "/navs/blog");
    }

    #[test]
    fn test_collection_entry_routes() {
        let params = ResourceParams::new().collection("pages").id("home");

        let req =
            ResourceRequest::build(Resource::CollectionEntries, Operation::Get, &params).unwrap();
        assert_eq!(req.path(), "/collections/pages/entries");

        let req =
            ResourceRequest::build(Resource::CollectionEntries, Operation::Patch, &params).unwrap();
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.path(), "/collections/pages/entries/home");
    }

    #[test]
    fn test_taxonomy_term_routes() {
        let params = ResourceParams::new().taxonomy("tags").id("rust");

        let req = ResourceRequest::build(Resource::TaxonomyTerms, Operation::Post, &params).unwrap();
        assert_eq!(req.path(), "/taxonomy-terms/tags/terms");

        let req = ResourceRequest::build(Resource::TaxonomyTerms, Operation::Show, &params).unwrap();
        assert_eq!(req.path(), "/taxonomy-terms/tags/terms/rust");
    }

    #[test]
    fn test_missing_parameters() {
        let err = ResourceRequest::build(
            Resource::CollectionEntries,
            Operation::Get,
            &ResourceParams::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { ref name } if name == "collection"));

        let err = ResourceRequest::build(
            Resource::Forms,
            Operation::Show,
            &ResourceParams::new().id("   "),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { ref name } if name == "id"));

        // get-all never needs an id
        assert!(ResourceRequest::build(Resource::Forms, Operation::Get, &ResourceParams::new()).is_ok());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("taxonomy-terms".parse::<Resource>().unwrap(), Resource::TaxonomyTerms);
        assert_eq!("patch".parse::<Operation>().unwrap(), Operation::Patch);
        assert!("entries".parse::<Resource>().is_err());
        assert!("put".parse::<Operation>().is_err());

        for resource in Resource::ALL {
            assert_eq!(resource.slug().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_operation_flags() {
        assert!(Operation::Patch.has_body());
        assert!(!Operation::Delete.has_body());
        assert!(Operation::Delete.targets_item());
        assert!(!Operation::Post.targets_item());
    }
}
