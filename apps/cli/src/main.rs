//! nightbrief CLI — scheduled AI-news briefings.
//!
//! Searches configured keywords overnight, fetches and summarizes the
//! articles, and delivers a markdown briefing to the configured channels.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
