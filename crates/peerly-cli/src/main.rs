mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use peerly_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Serve {
            host,
            port,
            directory,
            default_capacity,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let directory = directory.or_else(|| config.directory.path.clone());
            let default_capacity = default_capacity.unwrap_or(config.directory.default_slot_capacity);
            commands::serve::handle(&config, host, port, directory, default_capacity).await
        }
        cli::Commands::Search(args) => commands::search::handle(args).await,
        cli::Commands::Check { feed } => commands::check::handle(&feed).await,
    }
}
