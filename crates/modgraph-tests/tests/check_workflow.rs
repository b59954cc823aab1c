//! E2E tests for the check and order commands

use anyhow::Result;
use modgraph_lib::application::Commands;
use modgraph_lib::primitives::OutputFormat;
use modgraph_tests::{ModuleFixture, WorkspaceFixture, run_command};
use serde_json::{Value, json};
use std::fs;

#[test]
fn e2e_check_healthy_workspace() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Text, Commands::Check);
    result?;
    assert!(output.contains("All libraries resolved"));

    Ok(())
}

#[test]
fn e2e_check_reports_every_problem() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::application("app").needs(&["b", "gone"]))
        .module(ModuleFixture::library("b"))
        .module(ModuleFixture::library("b-fork").artifact("b"))
        .module(ModuleFixture::library("broken"))
        .write()?;
    fs::write(dir.path().join("broken/module.toml"), "library = \"yes\"\n")?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Check);
    let err = result.expect_err("unhealthy workspace must fail");
    assert!(err.to_string().contains("1 module(s) missing libraries, 1 unreadable"));

    let report: Value = serde_json::from_str(&output)?;
    assert_eq!(report["missing"]["app"], json!(["com.example:gone"]));
    assert_eq!(report["collisions"]["com.example:b"], json!(["b", "b-fork"]));
    assert_eq!(report["unreadable"][0]["module"], "broken");

    Ok(())
}

#[test]
fn e2e_check_detects_library_cycle() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::library("a").needs(&["b"]))
        .module(ModuleFixture::library("b").needs(&["c"]))
        .module(ModuleFixture::library("c").needs(&["a"]))
        .write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Text, Commands::Check);
    let err = result.expect_err("cycle must fail the check");
    assert!(err.to_string().contains("dependency cycle"));
    assert!(output.contains("dependency cycle"));

    let (order, _) = run_command(dir.path(), OutputFormat::Text, Commands::Order);
    assert!(order.is_err());

    Ok(())
}

#[test]
fn e2e_order_lists_libraries_before_consumers() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Order);
    result?;

    let report: Value = serde_json::from_str(&output)?;
    let order: Vec<String> = serde_json::from_value(report["order"].clone())?;
    let pos = |name: &str| order.iter().position(|m| m == name);

    assert_eq!(order.len(), 4);
    assert!(pos("d") < pos("b"));
    assert!(pos("b") < pos("app"));
    assert!(pos("c") < pos("app"));

    Ok(())
}

#[test]
fn e2e_missing_workspace_file() -> Result<()> {
    let dir = tempfile::TempDir::new()?;

    let (result, _) = run_command(dir.path(), OutputFormat::Text, Commands::Check);
    let err = result.expect_err("no workspace.yml");
    assert!(format!("{:#}", err).contains("workspace.yml"));

    Ok(())
}
