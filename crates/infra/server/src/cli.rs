//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use serde_json::Value;
use statamic_core::{Operation, Resource, ResourceParams};

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "statamic-events.toml";

#[derive(Debug, Parser)]
#[command(name = "statamic-events-server")]
#[command(version)]
#[command(about = "Statamic Events webhook trigger and private API client", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Register the webhook and serve deliveries until Ctrl+C
    Serve,

    /// List subscribable events
    Events,

    /// Run one request against the private API
    Resource {
        /// Resource slug, e.g. collection-entries
        #[arg(value_parser = parse_resource)]
        resource: Resource,

        /// get, show, post, patch or delete
        #[arg(value_parser = parse_operation)]
        operation: Operation,

        /// collection=..., taxonomy=..., id=... or body=<JSON>
        #[arg(value_parser = parse_resource_arg, value_name = "KEY=VALUE")]
        args: Vec<ResourceArg>,
    },
}

/// One `KEY=VALUE` argument of the `resource` command.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceArg {
    Collection(String),
    Taxonomy(String),
    Id(String),
    Body(Value),
}

impl ResourceArg {
    /// Folds arguments into route parameters and an optional body.
    pub fn collect(args: &[ResourceArg]) -> (ResourceParams, Option<Value>) {
        args.iter()
            .fold((ResourceParams::new(), None), |(params, body), arg| match arg {
                ResourceArg::Collection(c) => (params.collection(c.clone()), body),
                ResourceArg::Taxonomy(t) => (params.taxonomy(t.clone()), body),
                ResourceArg::Id(id) => (params.id(id.clone()), body),
                ResourceArg::Body(value) => (params, Some(value.clone())),
            })
    }
}

fn parse_resource(s: &str) -> Result<Resource, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_resource_arg(s: &str) -> Result<ResourceArg, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;

    match key {
        "collection" => Ok(ResourceArg::Collection(value.to_string())),
        "taxonomy" => Ok(ResourceArg::Taxonomy(value.to_string())),
        "id" => Ok(ResourceArg::Id(value.to_string())),
        "body" => serde_json::from_str(value)
            .map(ResourceArg::Body)
            .map_err(|e| format!("body: {}", e)),
        other => Err(format!("unknown parameter '{}'", other)),
    }
}
