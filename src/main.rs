mod cli;
mod runner;

use clap::Parser;
use cli::{Cli, Commands};
use fetchflow::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Fetch(args) => {
            if !runner::fetch(&config, args.urls).await? {
                std::process::exit(1);
            }
        }
        Commands::Dispatch(args) => runner::dispatch(&config, args.urls).await?,
    }

    Ok(())
}
