use clap::{Parser, Subcommand};
use reqwest::Url;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fetchflow")]
#[command(about = "Concurrent fetch engine CLI", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides FETCHFLOW_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every URL in parallel and print a summary
    Fetch(FetchArgs),
    /// Submit every URL to the async dispatcher and print responses as they arrive
    Dispatch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// URLs to fetch
    #[arg(required = true)]
    pub urls: Vec<Url>,
}
