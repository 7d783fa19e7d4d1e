//! CLI smoke tests for the users-cli binary
//!
//! Every invocation runs in its own process against a file database inside a
//! temporary directory, so state carries over between calls the same way it
//! does for a real user.

use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn dsn(&self) -> String {
        format!(
            "sqlite://{}",
            self.dir
                .path()
                .join("data/users.db")
                .to_string_lossy()
                .replace('\\', "/")
        )
    }

    /// Run the binary with `--db` pointing into the sandbox.
    fn run(&self, args: &[&str]) -> Output {
        let dsn = self.dsn();
        let mut full = vec!["--db", dsn.as_str()];
        full.extend_from_slice(args);
        self.run_raw(&full)
    }

    fn run_raw(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_users-cli"))
            .args(args)
            .env("HOME", self.dir.path())
            .env("RUST_LOG", "off")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .expect("Failed to execute users-cli")
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"))
}

/// The Problem body is the last line written to stderr.
fn stderr_problem(output: &Output) -> serde_json::Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().last().unwrap_or_default();
    serde_json::from_str(last).unwrap_or_else(|e| panic!("stderr is not a Problem ({e}): {stderr}"))
}

#[test]
fn test_cli_help_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_raw(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    for sub in ["list", "get", "get-by-email", "create", "update", "delete", "check"] {
        assert!(stdout.contains(sub), "Should contain '{sub}' subcommand");
    }
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--db"), "Should mention db option");
}

#[test]
fn test_cli_version_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_raw(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("users-cli"), "Should contain binary name");
}

#[test]
fn test_cli_invalid_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_raw(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report an error");
}

#[test]
fn test_cli_missing_config_file() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_raw(&["--config", "/nonexistent/users.yaml", "list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "stderr: {stderr}");
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_raw(&["--db", "sqlite::memory:", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sqlite::memory:"));
    assert!(stdout.contains("home_dir"));
}

#[test]
fn test_cli_check_creates_database() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["check"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert!(sandbox.dir.path().join("data/users.db").exists());
}

#[test]
fn test_cli_config_file_and_relative_db_path() {
    let sandbox = Sandbox::new();
    let home = sandbox.dir.path().join("home");
    let cfg_path = sandbox.dir.path().join("users.yaml");
    std::fs::write(
        &cfg_path,
        format!(
            "home_dir: \"{}\"\ndatabase:\n  url: \"sqlite://db/users.db?wal=true\"\nlogging:\n  default:\n    console_level: \"off\"\n    file: \"logs/users.log\"\n    file_level: info\nmodules:\n  users:\n    max_name_length: 5\n",
            home.to_string_lossy().replace('\\', "/")
        ),
    )
    .unwrap();
    let cfg_owned = cfg_path.to_string_lossy().to_string();
    let cfg = cfg_owned.as_str();

    let output = sandbox.run_raw(&["--config", cfg, "create", "--name", "Ann", "--email", "ann@x.com"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(home.join("db/users.db").exists(), "relative DSN resolved against home_dir");

    // module config is honoured
    let output = sandbox.run_raw(&[
        "--config", cfg, "create", "--name", "Annabel", "--email", "annabel@x.com",
    ]);
    assert!(!output.status.success());
    let problem = stderr_problem(&output);
    assert_eq!(problem["status"], 422);
}

#[test]
fn test_cli_user_lifecycle() {
    let sandbox = Sandbox::new();

    // 1. create
    let output = sandbox.run(&["create", "--name", "Ann", "--email", "ann@x.com"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let ann = stdout_json(&output);
    assert_eq!(ann["id"], 1);
    assert_eq!(ann["name"], "Ann");
    assert_eq!(ann["created_at"], ann["updated_at"]);

    // 2. duplicate email
    let output = sandbox.run(&["create", "--name", "Bob", "--email", "ann@x.com"]);
    assert!(!output.status.success());
    let problem = stderr_problem(&output);
    assert_eq!(problem["status"], 409);
    assert_eq!(problem["code"], "USERS_EMAIL_CONFLICT");

    // 3. rename
    let output = sandbox.run(&["update", "1", "--name", "Ann2"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let renamed = stdout_json(&output);
    assert_eq!(renamed["name"], "Ann2");
    assert_eq!(renamed["email"], "ann@x.com");

    // 4. empty patch
    let output = sandbox.run(&["update", "1"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), renamed);

    // lookups
    let output = sandbox.run(&["get-by-email", "ann@x.com"]);
    assert_eq!(stdout_json(&output)["id"], 1);
    let output = sandbox.run(&["get-by-email", "nobody@x.com"]);
    assert!(output.status.success());
    assert!(stdout_json(&output).is_null());
    let output = sandbox.run(&["list"]);
    assert_eq!(stdout_json(&output).as_array().map(Vec::len), Some(1));

    // 5. delete, then it is gone
    let output = sandbox.run(&["delete", "1"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["deleted"], 1);

    let output = sandbox.run(&["get", "1"]);
    assert!(!output.status.success());
    let problem = stderr_problem(&output);
    assert_eq!(problem["status"], 404);
    assert_eq!(problem["instance"], "/users/1");

    // 6. unknown id
    let output = sandbox.run(&["delete", "999"]);
    assert!(!output.status.success());
    assert_eq!(stderr_problem(&output)["code"], "USERS_NOT_FOUND");
}

#[test]
fn test_cli_rejects_malformed_input() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["create", "--name", " ", "--email", "not-an-email"]);

    assert!(!output.status.success());
    let problem = stderr_problem(&output);
    assert_eq!(problem["status"], 422);
    let pointers: Vec<_> = problem["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["pointer"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(pointers, vec!["/name", "/email"]);

    // nothing was written
    let output = sandbox.run(&["list"]);
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}
