//! Integration tests for the captiond CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn captiond_bin() -> Command {
    let mut cmd = Command::cargo_bin("captiond").expect("binary is built");
    for var in ["LOG_LEVEL", "MODEL_NAME", "CACHE_MAXSIZE", "HTTP_TIMEOUT", "DEVICE"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_version_command() {
    captiond_bin()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("captiond"));
}

#[test]
fn test_help_command() {
    captiond_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("serve")
                .and(predicate::str::contains("caption"))
                .and(predicate::str::contains("init"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("captiond.toml");

    captiond_bin()
        .arg("init")
        .arg("--path")
        .arg(temp_dir.path())
        .assert()
        .success();

    assert!(config_path.exists(), "Config file was not created");

    let content = std::fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[general]"));
    assert!(content.contains("[model]"));
    assert!(content.contains("[cache]"));
    assert!(content.contains("[fetch]"));
}

#[test]
fn test_config_shows_file_values() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("custom.toml");
    std::fs::write(&config_path, "[cache]\ncapacity = 21\n").unwrap();

    captiond_bin()
        .arg("--config")
        .arg(&config_path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity = 21"));
}

#[test]
fn test_config_applies_env_overrides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    captiond_bin()
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("config")
        .env("CACHE_MAXSIZE", "64")
        .env("MODEL_NAME", "org/tiny-captioner")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("capacity = 64")
                .and(predicate::str::contains("org/tiny-captioner")),
        );
}

#[test]
fn test_bad_env_override_fails() {
    captiond_bin()
        .arg("config")
        .env("HTTP_TIMEOUT", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP_TIMEOUT"));
}

#[test]
fn test_caption_rejects_bad_url() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    captiond_bin()
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("caption")
        .arg("not-a-url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("image_urls[0]"));
}

#[test]
fn test_invalid_command() {
    captiond_bin()
        .arg("invalid-command-that-does-not-exist")
        .assert()
        .failure();
}

#[test]
fn test_verbose_and_quiet_flags() {
    captiond_bin().arg("-v").arg("version").assert().success();
    captiond_bin().arg("-q").arg("version").assert().success();
}
