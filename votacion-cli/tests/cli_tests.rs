//! Integration tests for the votacion binary. None of them reach a backend.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use tempfile::TempDir;

fn votacion(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("votacion");
    cmd.current_dir(dir.path())
        .env("VOTACION_STORAGE_DIR", dir.path())
        .env_remove("VOTACION_API_ROOT")
        .env_remove("VOTACION_APP_BASE_URL")
        .env_remove("RUST_LOG")
        .timeout(std::time::Duration::from_secs(10));
    cmd
}

fn write_session(dir: &TempDir) {
    fs::write(
        dir.path().join("storage.json"),
        r#"{"token": "tok-1", "user": "{\"name\":\"Ana\",\"email\":\"ana@example.com\"}"}"#,
    )
    .unwrap();
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("login"))
        .stdout(predicates::str::contains("surveys"))
        .stdout(predicates::str::contains("templates"))
        .stdout(predicates::str::contains("completion"));
}

#[test]
fn test_templates_lists_catalog() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .arg("templates")
        .assert()
        .success()
        .stdout(predicates::str::contains("yes-no"))
        .stdout(predicates::str::contains("Pizza"))
        .stdout(predicates::str::contains("rating"));
}

#[test]
fn test_status_without_session() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("Not logged in."));
}

#[test]
fn test_status_reads_stored_session() {
    let dir = TempDir::new().unwrap();
    write_session(&dir);
    votacion(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("Logged in as"))
        .stdout(predicates::str::contains("Ana"))
        .stdout(predicates::str::contains("ana@example.com"));
}

#[test]
fn test_logout_removes_stored_session() {
    let dir = TempDir::new().unwrap();
    write_session(&dir);
    votacion(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicates::str::contains("Logged out."));
    assert!(!dir.path().join("storage.json").exists());
}

#[test]
fn test_protected_commands_require_session() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .args(["surveys", "list"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not logged in"));
}

#[test]
fn test_route_guard_outcomes() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .args(["route", "/votacion/abc"])
        .assert()
        .success()
        .stdout(predicates::str::contains("allowed"));

    votacion(&dir)
        .args(["route", "/encuestas-realizadas"])
        .assert()
        .success()
        .stdout(predicates::str::contains("redirected").and(predicates::str::contains("to /")));

    write_session(&dir);
    votacion(&dir)
        .args(["route", "/"])
        .assert()
        .success()
        .stdout(predicates::str::contains("redirected").and(predicates::str::contains("/plantillas")));
}

#[test]
fn test_unknown_route_fails() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .args(["route", "/nope"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown route"));
}

#[test]
fn test_share_link_uses_app_base_url() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .env("VOTACION_APP_BASE_URL", "https://votar.example.com")
        .args(["surveys", "share", "abc"])
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "https://votar.example.com/votacion/abc",
        ));
}

#[test]
fn test_config_generation() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicates::str::contains("config.json"));

    let written = fs::read_to_string(dir.path().join("config.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["timeout_ms"], 5000);

    votacion(&dir)
        .args(["config", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unsupported format"));
}

#[test]
fn test_completion_script() {
    let dir = TempDir::new().unwrap();
    votacion(&dir)
        .args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicates::str::contains("votacion"));
}
