//! Tests for the versa binary

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"
title = "Users"
head_schemas = "components/schemas.json"

[[routes]]
path = "/users"
methods = ["POST"]
request_schema = "UserCreate"
response_schema = "User"
status_code = 201

[[versions]]
value = "2024-06-01"

[[versions.changes]]
name = "AddressesBecameAList"
description = "`address` became `addresses`, a list"
instructions = [
    { kind = "schema", action = "field_didnt_exist", schema = "UserCreate", field = "addresses" },
    { kind = "schema", action = "field_existed_as", schema = "UserCreate", field = "address", type = { type = "string" } },
]

[[versions.changes]]
name = "InternalCleanup"
description = "Nothing a client can see"
hidden = true

[[versions]]
value = "2024-01-01"

[[versions.changes]]
name = "GuestsIntroduced"
description = "Users can be guests"
instructions = [
    { kind = "enum", action = "didnt_have", enum = "Role", members = ["guest"] },
]

[[versions]]
value = "2023-01-01"
"#;

const COMPONENTS: &str = r##"{
  "schemas": {
    "Role": { "type": "string", "enum": ["admin", "member", "guest"] },
    "UserCreate": {
      "type": "object",
      "properties": {
        "name": { "type": "string" },
        "addresses": { "type": "array", "items": { "type": "string" } },
        "role": { "$ref": "#/components/schemas/Role" }
      },
      "required": ["name", "addresses", "role"]
    },
    "User": {
      "type": "object",
      "properties": {
        "id": { "type": "integer" },
        "name": { "type": "string" },
        "addresses": { "type": "array", "items": { "type": "string" } },
        "role": { "$ref": "#/components/schemas/Role" }
      },
      "required": ["id", "name", "addresses", "role"]
    }
  }
}"##;

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("components")).unwrap();
    fs::write(dir.path().join("components/schemas.json"), COMPONENTS).unwrap();
    fs::write(dir.path().join("versa.toml"), MANIFEST).unwrap();
    dir
}

fn versa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("versa").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_generate_writes_every_version() {
    let dir = project();
    versa(dir.path())
        .args(["generate", "--out", "generated"])
        .assert()
        .success();

    let out = dir.path().join("generated");
    for version in ["2024-06-01", "2024-01-01", "2023-01-01"] {
        assert!(out.join(version).join("schemas.json").is_file(), "{version}");
        assert!(out.join(version).join("openapi.json").is_file(), "{version}");
    }

    let head = read_json(&out.join("2024-06-01/schemas.json"));
    assert!(head["x-generated"].is_string());
    assert!(head["schemas"]["UserCreate"]["properties"]["addresses"].is_object());

    let older = read_json(&out.join("2024-01-01/schemas.json"));
    assert!(older["schemas"]["UserCreate"]["properties"]["address"].is_object());
    assert!(older["schemas"]["UserCreate"]["properties"].get("addresses").is_none());

    let oldest = read_json(&out.join("2023-01-01/schemas.json"));
    assert_eq!(oldest["enums"]["Role"]["enum"], serde_json::json!(["admin", "member"]));

    let openapi = read_json(&out.join("2023-01-01/openapi.json"));
    assert!(openapi["x-generated"].is_string());
    assert_eq!(openapi["info"]["version"], "2023-01-01");
    assert!(openapi["paths"]["/users"]["post"].is_object());
}

#[test]
fn test_generate_removes_stale_files() {
    let dir = project();
    let out = dir.path().join("generated");
    fs::create_dir_all(out.join("2024-01-01")).unwrap();
    fs::write(out.join("2024-01-01/leftover.json"), "{}").unwrap();
    fs::create_dir_all(out.join("2022-01-01")).unwrap();
    fs::write(out.join("index.md"), "hand written").unwrap();

    versa(dir.path())
        .args(["generate", "--out", "generated"])
        .assert()
        .success();

    assert!(!out.join("2024-01-01/leftover.json").exists());
    assert!(!out.join("2022-01-01").exists());
    assert!(out.join("index.md").exists());
}

#[test]
fn test_changelog_markdown_and_json() {
    let dir = project();

    let output = versa(dir.path()).arg("changelog").output().unwrap();
    assert!(output.status.success());
    let markdown = String::from_utf8(output.stdout).unwrap();
    assert!(markdown.contains("AddressesBecameAList"));
    assert!(markdown.contains("GuestsIntroduced"));
    assert!(!markdown.contains("InternalCleanup"));

    let output = versa(dir.path())
        .args(["changelog", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["versions"][0]["value"], "2024-06-01");
}

#[test]
fn test_versions_lists_newest_first() {
    let dir = project();
    let output = versa(dir.path()).arg("versions").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let newest = stdout.find("2024-06-01").unwrap();
    let oldest = stdout.find("2023-01-01").unwrap();
    assert!(newest < oldest);
    assert!(stdout.contains("latest"));
}

#[test]
fn test_missing_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    versa(dir.path())
        .args(["versions", "--manifest", "nope.toml"])
        .assert()
        .failure();
}

#[test]
fn test_unapplicable_instruction_fails() {
    let dir = project();
    fs::write(
        dir.path().join("versa.toml"),
        MANIFEST.replace("field = \"addresses\"", "field = \"no_such_field\""),
    )
    .unwrap();

    let output = versa(dir.path()).arg("generate").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no_such_field"));
}
