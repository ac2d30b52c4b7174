//! CLI argument parsing

use crate::commands::{self, ChangelogArgs, GenerateArgs, VersionsArgs};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Versa CLI - generate versioned schemas, OpenAPI documents and changelogs
#[derive(Parser, Debug)]
#[command(name = "versa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log what the tool is doing
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write schemas.json and openapi.json for every version
    Generate(GenerateArgs),

    /// Print the changelog of every version
    Changelog(ChangelogArgs),

    /// List declared versions
    Versions(VersionsArgs),
}

impl Cli {
    pub fn init_tracing(&self) {
        let default = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Execute the CLI command
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Generate(args) => commands::generate(args).await,
            Commands::Changelog(args) => commands::changelog(args).await,
            Commands::Versions(args) => commands::versions(args).await,
        }
    }
}
