//! Skillbook CLI application
//!
//! Thin command surface over the skillbook engine: every subcommand detects
//! the project context, merges the applicable layers, runs one engine
//! operation, and prints the result as JSON on stdout.

mod args;
mod commands;

use clap::Parser;

pub use args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with environment-based filtering
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::run(cli).await
}
