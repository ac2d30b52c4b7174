//! Versa command line tool

mod cli;
mod commands;
mod manifest;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();
    cli.execute().await
}
