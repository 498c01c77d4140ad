//! Newsroom CLI: offline maintenance runs over published marketing articles.
//!
//! Each subcommand selects articles from the content store, applies one or
//! more body operations and publishes a new revision where the body changed.

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
