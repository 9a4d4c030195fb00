//! E2E CLI tests that need no server.
//!
//! Each test runs `dsr` as a subprocess in an isolated temp directory with its
//! own config home. Where a server URL is needed it points at a closed local
//! port, so remote calls fail fast.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const DEAD_URL: &str = "http://127.0.0.1:9/graphql";

/// Build a Command targeting the dsr binary, rooted in `dir`.
fn dsr_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dsr"));
    cmd.current_dir(dir);
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("DOSSIER_URL");
    cmd.env_remove("DOSSIER_TOKEN");
    cmd.env_remove("DOSSIER_ME");
    cmd.env_remove("FORMAT");
    // Suppress tracing output that goes to stderr
    cmd.env("DOSSIER_LOG", "error");
    cmd
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = dsr_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("dsr should not crash");
    assert!(
        output.status.success(),
        "dsr {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn help_lists_edit_commands() {
    let dir = TempDir::new().expect("tempdir");
    dsr_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("patch"))
        .stdout(predicate::str::contains("markings"))
        .stdout(predicate::str::contains("author"));
}

#[test]
fn missing_server_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    dsr_cmd(dir.path())
        .args(["patch", "report-1", "name", "x", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn invalid_date_is_skipped_without_network() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(
        dir.path(),
        &["patch", "report-1", "published", "someday", "--url", DEAD_URL],
    );
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["field"], "published");
    assert_eq!(json["reason"], "The value must be a date (YYYY-MM-DD)");
}

#[test]
fn empty_name_is_skipped() {
    let dir = TempDir::new().expect("tempdir");
    dsr_cmd(dir.path())
        .args(["patch", "report-1", "name", "", "--url", DEAD_URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped name"));
}

#[test]
fn unknown_field_fails() {
    let dir = TempDir::new().expect("tempdir");
    dsr_cmd(dir.path())
        .args(["patch", "report-1", "title", "x", "--url", DEAD_URL, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
}

#[test]
fn failed_autosave_is_swallowed() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(
        dir.path(),
        &["patch", "report-1", "description", "new text", "--url", DEAD_URL],
    );
    assert_eq!(json["status"], "dispatched");
    assert_eq!(json["failed"], 1);
}

#[test]
fn project_config_supplies_server() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(dir.path().join(".dossier")).expect("mkdir");
    std::fs::write(
        dir.path().join(".dossier/config.toml"),
        format!("[server]\nurl = \"{DEAD_URL}\"\n"),
    )
    .expect("write config");

    let json = run_json(dir.path(), &["focus", "report-1", "description"]);
    assert_eq!(json["focus_on"], "description");
    assert_eq!(json["failed"], 1);
}

#[test]
fn fetch_failures_are_not_swallowed() {
    let dir = TempDir::new().expect("tempdir");
    dsr_cmd(dir.path())
        .args(["show", "report-1", "--url", DEAD_URL, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"));
}
