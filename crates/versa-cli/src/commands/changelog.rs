//! Changelog command

use crate::manifest;
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use versa_core::generate_changelog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangelogFormat {
    Markdown,
    Json,
}

/// Arguments for the `changelog` command
#[derive(Args, Debug)]
pub struct ChangelogArgs {
    /// Path to the version manifest
    #[arg(short, long, default_value = "versa.toml")]
    pub manifest: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: ChangelogFormat,
}

/// Print the client-facing changelog of every version
pub async fn changelog(args: ChangelogArgs) -> Result<()> {
    let project = manifest::load(&args.manifest).await?;
    let changelog = generate_changelog(&project.bundle);

    match args.format {
        ChangelogFormat::Markdown => print!("{}", changelog.to_markdown()),
        ChangelogFormat::Json => println!("{}", serde_json::to_string_pretty(&changelog)?),
    }
    Ok(())
}
