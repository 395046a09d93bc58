//! Smoke tests for the `flightops` binary.

mod common;

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use common::fixture_path;
use serde_json::Value;

fn flightops(args: &[&str], config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flightops"));
    cmd.arg("--config").arg(config).args(args);
    cmd
}

fn run_with_input(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("binary should start");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();

    child.wait_with_output().unwrap()
}

#[test]
fn test_flight_ops_server_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let data = fixture_path("frankfurt.json");
    let cmd = flightops(&["flight-ops", "--data", data.to_str().unwrap()], &config);

    let output = run_with_input(
        cmd,
        concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"get_flight_delays\",\"arguments\":{\"severity\":\"severe\"}}}\n",
        ),
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let responses: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout carries only JSON-RPC"))
        .collect();
    assert_eq!(responses.len(), 2);
    assert!(responses[1]["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("LH902"));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Flight Operations MCP server running on stdio"));
}

#[test]
fn test_missing_data_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let missing = dir.path().join("missing.json");

    let output = run_with_input(
        flightops(&["customer-service", "--data", missing.to_str().unwrap()], &config),
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to load data"));
}

#[test]
fn test_check_against_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let data = fixture_path("frankfurt.json");

    let output = flightops(&["check", "--data", data.to_str().unwrap()], &config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Connection test successful"));
    assert!(stdout.contains("PassengerPreferences"));
}

#[test]
fn test_config_set_get_show() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.toml");

    let set = flightops(&["config", "set", "store.endpoint", "http://localhost:8000"], &config)
        .output()
        .unwrap();
    assert!(set.status.success());
    assert!(config.exists());

    flightops(&["config", "set", "store.authorization", "secret-token"], &config)
        .output()
        .unwrap();

    let get = flightops(&["config", "get", "store.endpoint"], &config)
        .output()
        .unwrap();
    assert_eq!(String::from_utf8(get.stdout).unwrap().trim(), "http://localhost:8000");

    let show = flightops(&["config", "show"], &config).output().unwrap();
    let shown = String::from_utf8(show.stdout).unwrap();
    assert!(shown.contains("region = \"eu-central-1\""));
    assert!(!shown.contains("secret-token"));

    let bad = flightops(&["config", "set", "store.colour", "blue"], &config)
        .output()
        .unwrap();
    assert!(!bad.status.success());
}

#[test]
fn test_config_path_honours_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");

    let output = flightops(&["config", "path"], &config).output().unwrap();

    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim(),
        config.display().to_string()
    );
}
