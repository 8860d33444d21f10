mod auth;
mod cli;
mod config;
mod download;
mod error;
mod junit;
mod output;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ciunit - JUnit CI Report Tool");
    cli.execute().await?;

    Ok(())
}
