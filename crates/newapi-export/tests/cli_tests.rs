//! CLI tests for `newapi-export` using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn export_cmd() -> Command {
    let mut cmd = Command::cargo_bin("newapi-export").unwrap();
    cmd.env_remove("NEWAPI_SOURCE_DSN");
    cmd
}

async fn sqlite_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("new-api.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    for statement in [
        r#"CREATE TABLE channels (id INTEGER PRIMARY KEY, type INTEGER, key TEXT, status INTEGER,
            name TEXT, models TEXT, "group" TEXT, priority INTEGER, auto_ban INTEGER)"#,
        r#"CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT, role INTEGER, status INTEGER,
            email TEXT, "group" TEXT, deleted_at DATETIME)"#,
        r#"CREATE TABLE tokens (id INTEGER PRIMARY KEY, user_id INTEGER, key TEXT, status INTEGER,
            expired_time INTEGER, remain_quota INTEGER, used_quota INTEGER,
            unlimited_quota INTEGER, "group" TEXT, deleted_at DATETIME)"#,
        r#"CREATE TABLE abilities ("group" TEXT, model TEXT, channel_id INTEGER, enabled INTEGER)"#,
        r#"INSERT INTO channels VALUES (1, 1, 'sk-a
sk-b', 1, 'acme', 'gpt-4o', 'default,vip', 0, 1)"#,
        r#"INSERT INTO channels VALUES (2, 999, 'sk-x', 1, 'mystery', '', 'default', 0, 1)"#,
        r#"INSERT INTO users VALUES (1, 'bob', 1, 1, '', 'default', NULL)"#,
        r#"INSERT INTO tokens VALUES (1, 1, 'tok-bob', 1, -1, 0, 0, 1, 'default', NULL)"#,
        r#"INSERT INTO abilities VALUES ('default', 'gpt-4o', 1, 1)"#,
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
    path
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    export_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EZ-API"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_displays_version() {
    export_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("newapi-export"));
}

#[test]
fn test_invalid_command_shows_error() {
    export_cmd()
        .arg("import")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Export Command Tests
// =============================================================================

#[test]
fn test_export_mysql_requires_dsn() {
    export_cmd()
        .args(["export", "--source-type", "mysql"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source-dsn is required for MySQL"));
}

#[test]
fn test_export_rejects_unknown_source_type() {
    export_cmd()
        .args(["export", "--source-type", "postgres"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid source-type: postgres"));
}

#[tokio::test]
async fn test_export_sqlite_writes_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = sqlite_fixture(temp_dir.path()).await;
    let output = temp_dir.path().join("export.json");

    export_cmd()
        .args(["export", "--source-type", "sqlite", "--include-abilities"])
        .arg("--source-path")
        .arg(&db_path)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Channels:  2"))
        .stdout(predicate::str::contains("Providers: 3"))
        .stdout(predicate::str::contains("has unknown type 999"))
        .stdout(predicate::str::contains("File size:"));

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["version"], "1.0.0");
    assert_eq!(doc["data"]["providers"][1]["name"], "acme-2");
    assert_eq!(doc["data"]["keys"][0]["master_ref"], "bob");
    assert_eq!(doc["data"]["bindings"][0]["status"], "active");
}

#[tokio::test]
async fn test_export_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = sqlite_fixture(temp_dir.path()).await;
    let output = temp_dir.path().join("export.json");

    export_cmd()
        .args(["export", "--source-type", "sqlite", "--dry-run"])
        .args(["--include-tokens", "false"])
        .arg("--source-path")
        .arg(&db_path)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Masters:   0"))
        .stdout(predicate::str::contains("Dry run complete"));

    assert!(!output.exists());
}

#[tokio::test]
async fn test_stats_verbose_breakdown() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = sqlite_fixture(temp_dir.path()).await;

    export_cmd()
        .args(["stats", "--source-type", "sqlite", "--verbose"])
        .arg("--source-path")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tokens:    1"))
        .stdout(predicate::str::contains("- OpenAI: 1"))
        .stdout(predicate::str::contains("- Unknown: 1"));
}

// =============================================================================
// Validate & Init Tests
// =============================================================================

#[test]
fn test_validate_valid_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("export.json");
    fs::write(
        &file,
        r#"{"version":"1.0.0","source":{"type":"newapi","version":"unknown","exported_at":"2025-01-02T03:04:05Z"},
            "data":{"providers":[{},{}]},"warnings":["w"]}"#,
    )
    .unwrap();

    export_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Version: 1.0.0"))
        .stdout(predicate::str::contains("Providers: 2"))
        .stdout(predicate::str::contains("Warnings: 1"))
        .stdout(predicate::str::contains("File is valid"));
}

#[test]
fn test_validate_missing_field() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("export.json");
    fs::write(&file, r#"{"version":"1.0.0","source":{}}"#).unwrap();

    export_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required field: data"));
}

#[test]
fn test_init_writes_template() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("config.yaml");

    export_cmd()
        .args(["init", "--source", "sqlite", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated configuration"));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("type: sqlite"));
}

#[test]
fn test_init_unknown_source_fails() {
    let temp_dir = TempDir::new().unwrap();

    export_cmd()
        .args(["init", "--source", "oracle", "-o"])
        .arg(temp_dir.path().join("config.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown source type: oracle"));
}

#[tokio::test]
async fn test_export_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = sqlite_fixture(temp_dir.path()).await;
    let output = temp_dir.path().join("out.json");
    let config = temp_dir.path().join("export.yaml");
    fs::write(
        &config,
        format!(
            "source:\n  type: sqlite\n  path: {}\noptions:\n  output: {}\n",
            db_path.display(),
            output.display()
        ),
    )
    .unwrap();

    export_cmd()
        .args(["export", "--config"])
        .arg(&config)
        .assert()
        .success();

    assert!(output.exists());
}
