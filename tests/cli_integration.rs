//! Integration tests for the `tf` CLI.
//!
//! Each test points `TASKFLOW_HOME` at a temp directory, runs `tf` as a
//! subprocess, and checks stdout, stderr, and the files it leaves behind.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use common::serve;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Get the path to the built `tf` binary.
fn tf_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tf");
    path
}

/// Run `tf` with the given args against `home`, returning (stdout, stderr, success).
fn run_tf(home: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tf_bin())
        .args(args)
        .env("TASKFLOW_HOME", home)
        .env_remove("TASKFLOW_PASSWORD")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run tf");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `tf` expecting success, return stdout.
fn run_tf_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tf(home, args);
    if !success {
        panic!(
            "tf {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Point the config at `base` and store a token
fn sign_in_against(home: &Path, base: &str) {
    run_tf_ok(home, &["config", "set", "api.base_url", base]);
    fs::write(home.join("state.json"), r#"{"token": "jwt-123"}"#).unwrap();
}

fn read_state(home: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(home.join("state.json")).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[test]
fn test_theme_defaults_and_toggles() {
    let tmp = tempfile::TempDir::new().unwrap();

    assert_eq!(run_tf_ok(tmp.path(), &["theme"]), "dark\n");
    assert_eq!(run_tf_ok(tmp.path(), &["theme", "toggle"]), "light\n");
    assert_eq!(read_state(tmp.path())["theme"], json!("light"));
    assert_eq!(run_tf_ok(tmp.path(), &["theme", "dark"]), "dark\n");
    assert_eq!(run_tf_ok(tmp.path(), &["theme"]), "dark\n");
}

#[test]
fn test_theme_rejects_unknown() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_tf(tmp.path(), &["theme", "blue"]);
    assert!(!success);
    assert!(stderr.starts_with("error: invalid theme 'blue'"));
}

#[test]
fn test_config_set_preserves_comments() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "# my backend\n[api]\nbase_url = \"http://old/api\" # keep me\n",
    )
    .unwrap();

    let out = run_tf_ok(tmp.path(), &["config", "set", "api.base_url", "http://new/api/"]);
    assert_eq!(out, "api.base_url = http://new/api\n");

    let text = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
    assert!(text.starts_with("# my backend\n"));
    assert!(text.contains("base_url = \"http://new/api\""));

    let shown = run_tf_ok(tmp.path(), &["config", "show"]);
    assert!(shown.contains("base_url = \"http://new/api\""));
}

#[test]
fn test_config_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_tf_ok(tmp.path(), &["config", "set", "api.timeout_secs", "3"]);
    let out = run_tf_ok(tmp.path(), &["config", "show", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["api"]["timeout_secs"], json!(3));
    assert_eq!(parsed["timeline"]["days"], json!(14));
}

#[test]
fn test_config_rejects_unknown_key() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_tf(tmp.path(), &["config", "set", "ui.theme", "x"]);
    assert!(!success);
    assert!(stderr.contains("unknown config key: ui.theme"));

    let (_stdout, stderr, success) =
        run_tf(tmp.path(), &["config", "set", "api.timeout_secs", "soon"]);
    assert!(!success);
    assert!(stderr.contains("invalid value for api.timeout_secs"));
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[test]
fn test_commands_need_a_session() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_tf(tmp.path(), &["list"]);
    assert!(!success);
    assert_eq!(stderr.trim_end(), "error: not signed in (run `tf login`)");
}

#[test]
fn test_login_requires_password() {
    let tmp = tempfile::TempDir::new().unwrap();
    // stdin is empty, so the password is empty
    let (_stdout, stderr, success) = run_tf(tmp.path(), &["login", "ada@example.com"]);
    assert!(!success);
    assert!(stderr.contains("password is required"));
}

#[test]
fn test_login_stores_token() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (base, rx) = serve(vec![(
        200,
        json!({"token": "jwt-123", "user": {"id": 1, "name": "Ada", "email": "ada@example.com"}})
            .to_string(),
    )]);
    run_tf_ok(tmp.path(), &["config", "set", "api.base_url", &base]);

    let out = run_tf_ok(
        tmp.path(),
        &["login", "ada@example.com", "--password", "pw"],
    );
    assert_eq!(out, "Signed in as Ada\n");
    assert_eq!(read_state(tmp.path())["token"], json!("jwt-123"));
    assert_eq!(rx.recv().unwrap().path, "/api/v1/auth/login");

    run_tf_ok(tmp.path(), &["logout"]);
    assert_eq!(read_state(tmp.path()).get("token"), None);
}

#[test]
fn test_oauth_error_clears_token() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("state.json"), r#"{"token": "old"}"#).unwrap();
    let (_stdout, stderr, success) = run_tf(
        tmp.path(),
        &["oauth", "http://localhost/oauth2/redirect?error=access%20denied"],
    );
    assert!(!success);
    assert!(stderr.contains("Authentication failed: access denied"));
    assert_eq!(read_state(tmp.path()).get("token"), None);
}

#[test]
fn test_rejected_token_is_forgotten() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (base, _rx) = serve(vec![(401, String::new())]);
    sign_in_against(tmp.path(), &base);

    let (_stdout, stderr, success) = run_tf(tmp.path(), &["whoami"]);
    assert!(!success);
    assert!(stderr.contains("Session expired"));
    assert_eq!(read_state(tmp.path()).get("token"), None);
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[test]
fn test_list_groups_by_status() {
    let tmp = tempfile::TempDir::new().unwrap();
    let tasks = json!([
        {"id": 1, "title": "Login page", "status": "IN_PROGRESS", "labels": ["ui"]},
        {"id": 2, "title": "Write docs", "status": "TODO"},
        {"id": 3, "title": "Setup", "status": "DONE"}
    ]);
    let (base, rx) = serve(vec![(200, tasks.to_string()), (200, tasks.to_string())]);
    sign_in_against(tmp.path(), &base);

    let out = run_tf_ok(tmp.path(), &["list"]);
    assert_eq!(
        out,
        "== Current Sprint (1) ==\n[>] 1 Login page #ui\n\n== Backlog (1) ==\n[ ] 2 Write docs\n\n== Done (1) ==\n[x] 3 Setup\n"
    );
    assert_eq!(
        rx.recv().unwrap().authorization.as_deref(),
        Some("Bearer jwt-123")
    );

    let out = run_tf_ok(tmp.path(), &["list", "--search", "DOCS", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed[1]["id"], json!("backlog"));
    assert_eq!(parsed[1]["tasks"][0]["title"], json!("Write docs"));
    assert_eq!(parsed[0]["tasks"], json!([]));
}

#[test]
fn test_status_saves_task() {
    let tmp = tempfile::TempDir::new().unwrap();
    let task = json!({"id": 5, "title": "Ship", "status": "TODO"});
    let (base, rx) = serve(vec![(200, task.to_string()), (200, String::new())]);
    sign_in_against(tmp.path(), &base);

    let out = run_tf_ok(tmp.path(), &["status", "5", "done"]);
    assert_eq!(out, "[x] 5 Ship\n");

    assert_eq!(rx.recv().unwrap().path, "/api/v1/tasks/5");
    let put = rx.recv().unwrap();
    assert_eq!(put.method, "PUT");
    assert_eq!(put.json()["status"], json!("done"));
    assert_eq!(put.json()["completed"], json!(true));
}

#[test]
fn test_status_rejects_unknown_value() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("state.json"), r#"{"token": "t"}"#).unwrap();
    let (_stdout, stderr, success) = run_tf(tmp.path(), &["status", "5", "blocked"]);
    assert!(!success);
    assert!(stderr.contains("invalid status 'blocked'"));
}

#[test]
fn test_add_validates_before_sending() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("state.json"), r#"{"token": "t"}"#).unwrap();
    let (_stdout, stderr, success) =
        run_tf(tmp.path(), &["add", "Ship", "--due", "next week"]);
    assert!(!success);
    assert!(stderr.contains("next week"));
}

#[test]
fn test_show_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (base, _rx) = serve(vec![(404, String::new())]);
    sign_in_against(tmp.path(), &base);

    let (_stdout, stderr, success) = run_tf(tmp.path(), &["show", "99"]);
    assert!(!success);
    assert!(stderr.contains("task not found: 99"));
}
