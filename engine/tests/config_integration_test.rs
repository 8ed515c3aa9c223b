//! Integration tests for configuration management
//!
//! These tests verify that config.toml files are parsed, defaulted,
//! validated, and that the data directory is created on load.

use bow_engine::config::Config;
use bow_engine::executor::ExecutorSettings;
use sdk::errors::EngineError;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_config_toml_parsing() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let path = write_config(
        &dir,
        &format!(
            r#"
[core]
log_level = "debug"
data_dir = "{}"

[actuation]
scale = 5000.0
frame_interval_ms = 250

[executor]
until_poll_ms = 10
max_steps = 500

[feedback]
speech_command = "say -v Junior"
prompt = "Next?"
"#,
            data_dir.display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.actuation.scale, 5000.0);
    assert_eq!(config.executor.max_steps, 500);
    assert_eq!(config.feedback.speech_command.as_deref(), Some("say -v Junior"));
    assert_eq!(config.feedback.prompt, "Next?");
    assert!(data_dir.is_dir());
    assert_eq!(config.plans_dir(), data_dir.join("plans"));

    let settings = ExecutorSettings::from_config(&config);
    assert_eq!(settings.frame_interval, Duration::from_millis(250));
    assert_eq!(settings.until_poll, Duration::from_millis(10));
}

#[test]
fn test_missing_sections_use_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!("[core]\ndata_dir = \"{}\"\n", dir.path().display()),
    );

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.actuation.scale, 10000.0);
    assert_eq!(config.actuation.frame_interval_ms, 1000);
    assert_eq!(config.executor.until_poll_ms, 0);
    assert_eq!(config.feedback.prompt, "What should I do next?");
}

#[test]
fn test_blank_speech_command_is_disabled() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_toml_str(&format!(
        "[core]\ndata_dir = \"{}\"\n[feedback]\nspeech_command = \"  \"\n",
        dir.path().display()
    ))
    .unwrap();
    assert!(config.feedback.speech_command.is_none());
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().display();

    let bad_level = Config::from_toml_str(&format!(
        "[core]\nlog_level = \"chatty\"\ndata_dir = \"{}\"\n",
        data_dir
    ));
    assert!(matches!(bad_level, Err(EngineError::Config(_))));

    let bad_scale = Config::from_toml_str(&format!(
        "[core]\ndata_dir = \"{}\"\n[actuation]\nscale = -1.0\n",
        data_dir
    ));
    assert!(matches!(bad_scale, Err(EngineError::Config(_))));

    let not_toml = Config::from_toml_str("[core");
    assert!(matches!(not_toml, Err(EngineError::Config(_))));
}

#[test]
fn test_unreadable_config_file() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Config(msg) if msg.contains("read")));
}
