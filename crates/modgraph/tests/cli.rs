//! Black-box tests of the `modgraph` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_module(root: &Path, dir: &str, body: &str) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("module.toml"), body).unwrap();
}

fn sample_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("workspace.yml"), "modules:\n  - app\n  - core\n").unwrap();
    write_module(
        dir.path(),
        "app",
        "identity = \"com.example:app\"\nlibraries = [\"com.example:core\"]\n",
    );
    write_module(dir.path(), "core", "identity = \"com.example:core\"\nlibrary = true\n");
    dir
}

fn modgraph(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modgraph"));
    cmd.env_remove("RUST_LOG")
        .env_remove("MODGRAPH_OUTPUT")
        .arg("--workdir")
        .arg(dir.path())
        .args(["--color", "never"]);
    cmd
}

#[test]
fn version_prints_package_version() {
    let dir = TempDir::new().unwrap();
    modgraph(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("modgraph "));
}

#[test]
fn resolve_prints_closure() {
    let dir = sample_workspace();
    modgraph(&dir)
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("app (com.example:app, application)"))
        .stdout(predicate::str::contains("core (com.example:core, library)"));
}

#[test]
fn resolve_json_after_subcommand() {
    let dir = sample_workspace();
    modgraph(&dir)
        .args(["resolve", "app", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["))
        .stdout(predicate::str::contains("\"module\": \"app\""))
        .stdout(predicate::str::contains("\"module\": \"core\"").not());
}

#[test]
fn check_fails_with_missing_library() {
    let dir = sample_workspace();
    fs::write(dir.path().join("workspace.yml"), "modules:\n  - app\n").unwrap();

    modgraph(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing com.example:core"))
        .stderr(predicate::str::contains("Workspace check failed"));
}

#[test]
fn check_passes_on_healthy_workspace() {
    let dir = sample_workspace();
    modgraph(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("All libraries resolved"));
}

#[test]
fn dependents_requires_module_argument() {
    let dir = sample_workspace();
    modgraph(&dir)
        .arg("dependents")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<MODULE>"));
}

#[test]
fn missing_workspace_is_reported() {
    let dir = TempDir::new().unwrap();
    modgraph(&dir)
        .arg("order")
        .assert()
        .failure()
        .stderr(predicate::str::contains("workspace.yml"));
}
