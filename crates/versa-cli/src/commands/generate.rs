//! Per-version schema and OpenAPI file generation

use crate::manifest;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use versa_core::{generate_versioned_models, ApiVersion, ModelSet};
use versa_openapi::build_version_spec;

pub(crate) const GENERATED_NOTICE: &str =
    "This file was generated by versa from the version manifest. Do not edit it by hand.";

/// Arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the version manifest
    #[arg(short, long, default_value = "versa.toml")]
    pub manifest: PathBuf,

    /// Output directory, one subdirectory per version
    #[arg(short, long, default_value = "versions")]
    pub out: PathBuf,
}

/// Write `schemas.json` and `openapi.json` for every version
pub async fn generate(args: GenerateArgs) -> Result<()> {
    let project = manifest::load(&args.manifest).await?;
    let models = generate_versioned_models(&project.bundle, &project.registry)?;

    fs::create_dir_all(&args.out)
        .await
        .with_context(|| format!("Failed to create {}", args.out.display()))?;
    remove_version_dirs(&args.out).await?;

    for (version, set) in models.iter() {
        let dir = args.out.join(version.to_string());
        fs::create_dir_all(&dir).await?;

        write_json(&dir.join("schemas.json"), &render_schemas(version, set)).await?;

        let deprecated = false;
        let mut openapi = build_version_spec(&project.title, version, set, deprecated).to_json();
        if let Value::Object(map) = &mut openapi {
            map.insert("x-generated".to_string(), Value::String(GENERATED_NOTICE.to_string()));
        }
        write_json(&dir.join("openapi.json"), &openapi).await?;

        println!("  {} {}", style("✓").green(), dir.display());
    }

    println!(
        "{} Generated {} versions into {}",
        style("✓").green().bold(),
        project.bundle.versions().len(),
        style(args.out.display()).cyan()
    );
    Ok(())
}

/// Schemas and enums of one version under their exposed names
pub(crate) fn render_schemas(version: ApiVersion, set: &ModelSet) -> Value {
    let schemas: serde_json::Map<String, Value> = set
        .schemas()
        .map(|schema| (schema.exposed_name().to_string(), schema.to_json_schema(set)))
        .collect();
    let enums: serde_json::Map<String, Value> = set
        .enums()
        .map(|enum_def| (enum_def.exposed_name().to_string(), enum_def.to_json_schema()))
        .collect();

    json!({
        "x-generated": GENERATED_NOTICE,
        "version": version,
        "schemas": schemas,
        "enums": enums,
    })
}

/// Drop every previously generated version directory
///
/// Anything in `out` that is not named after a version is left alone.
async fn remove_version_dirs(out: &Path) -> Result<()> {
    let mut entries = fs::read_dir(out).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_version = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.parse::<ApiVersion>().is_ok());
        if is_version && entry.file_type().await?.is_dir() {
            tracing::debug!(path = %entry.path().display(), "Removing stale version directory");
            fs::remove_dir_all(entry.path()).await?;
        }
    }
    Ok(())
}

async fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_core::model::{EnumDef, FieldDef, FieldType, SchemaDef};
    use versa_core::ModelRegistry;

    #[test]
    fn test_render_schemas() {
        let set = ModelRegistry::new()
            .enum_def(EnumDef::new("Role").string_members(["admin"]))
            .schema(SchemaDef::new("User").field(FieldDef::new("name", FieldType::String)))
            .head();
        let rendered = render_schemas("2024-01-01".parse().unwrap(), &set);

        assert_eq!(rendered["version"], "2024-01-01");
        assert_eq!(rendered["x-generated"], GENERATED_NOTICE);
        assert_eq!(rendered["schemas"]["User"]["type"], "object");
        assert_eq!(rendered["enums"]["Role"]["enum"][0], "admin");
    }

    #[tokio::test]
    async fn test_remove_version_dirs_keeps_other_entries() {
        let out = tempfile::tempdir().unwrap();
        fs::create_dir(out.path().join("2023-01-01")).await.unwrap();
        fs::write(out.path().join("2023-01-01/notes.txt"), "stale").await.unwrap();
        fs::create_dir(out.path().join("shared")).await.unwrap();
        fs::write(out.path().join("README.md"), "keep").await.unwrap();

        remove_version_dirs(out.path()).await.unwrap();

        assert!(!out.path().join("2023-01-01").exists());
        assert!(out.path().join("shared").exists());
        assert!(out.path().join("README.md").exists());
    }
}
