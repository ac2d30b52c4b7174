//! Version listing command

use crate::manifest;
use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

/// Arguments for the `versions` command
#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Path to the version manifest
    #[arg(short, long, default_value = "versa.toml")]
    pub manifest: PathBuf,
}

/// List declared versions, newest first
pub async fn versions(args: VersionsArgs) -> Result<()> {
    let project = manifest::load(&args.manifest).await?;
    let latest = project.bundle.latest();

    for version in project.bundle.iter() {
        let visible = version.changes().iter().filter(|c| !c.is_hidden()).count();
        let marker = if version.value() == latest {
            style(" (latest)").green().to_string()
        } else {
            String::new()
        };
        println!(
            "{}{}  {} change(s)",
            style(version.value()).bold(),
            marker,
            visible
        );
        for change in version.changes().iter().filter(|c| !c.is_hidden()) {
            println!("    {} {}", style("-").dim(), change.name());
        }
    }
    Ok(())
}
