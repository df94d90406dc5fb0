use predicates::prelude::*;
use std::fs;
use assert_cmd::Command;
use tempfile::TempDir;

fn locallm_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_locallm"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    locallm_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("local causal language models"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--log-file"));
}

#[test]
fn test_cli_version() {
    locallm_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("locallm"));
}

#[test]
fn test_config_where() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    locallm_cmd()
        .current_dir(temp_dir.path())
        .args(["config", "where"])
        .assert()
        .success()
        .stdout(predicate::str::contains("model_config.json"));
}

#[test]
fn test_config_init_writes_template() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    locallm_cmd()
        .current_dir(temp_dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let content =
        fs::read_to_string(temp_dir.path().join("model_config.json")).expect("template written");
    assert!(content.contains("\"repetition_penalty\""));
}

#[test]
fn test_invalid_subcommand() {
    locallm_cmd().arg("invalid-command").assert().failure();
}

#[test]
fn test_missing_config_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    locallm_cmd()
        .current_dir(temp_dir.path())
        .args(["--log-file", "responses/model-responses.log"])
        .write_stdin("Hello\nquit\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Loading configuration..."))
        .stdout(predicate::str::contains(
            "Error initializing model: Config file not found",
        ));
}

#[test]
fn test_missing_key_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("model_config.json"),
        r#"{"model_name": "m", "max_length": 50, "temperature": 0.7, "top_p": 0.9}"#,
    )
    .expect("Failed to write config");

    locallm_cmd()
        .current_dir(temp_dir.path())
        .args(["--log-file", "responses/model-responses.log"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("repetition_penalty"));

    assert!(!temp_dir.path().join("responses").exists());
}
