//! Statamic Events Server binary.

use clap::Parser;
use statamic_core::ResourceRequest;
use statamic_events_server::{load_config, Cli, Command, EventsServer, ResourceArg};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(&cli.config)?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server = EventsServer::new(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server.run().await?,
        Command::Events => {
            for option in server.event_options().await? {
                println!("{}\t{}", option.value, option.name);
            }
        }
        Command::Resource {
            resource,
            operation,
            args,
        } => {
            let (params, body) = ResourceArg::collect(&args);
            let request = ResourceRequest::build(resource, operation, &params)?;
            let response = server.execute(&request, body.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
