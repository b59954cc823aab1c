//! E2E tests for the resolve and dependents commands
//!
//! Each test writes a real workspace to a temporary directory and runs the
//! command in-process through the library entry point.

use anyhow::Result;
use modgraph_lib::application::Commands;
use modgraph_lib::primitives::OutputFormat;
use modgraph_tests::{ModuleFixture, WorkspaceFixture, run_command};
use serde_json::{Value, json};

#[test]
fn e2e_resolve_reports_priority_closure() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Resolve { modules: vec![] });
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert_eq!(reports[0]["module"], "app");
    assert_eq!(reports[0]["libraries"], json!(["b", "d", "c"]));
    assert_eq!(reports[1]["libraries"], json!(["d"]));
    assert_eq!(reports[3]["libraries"], json!([]));

    Ok(())
}

#[test]
fn e2e_resolve_is_independent_of_open_order() -> Result<()> {
    // Libraries listed before their consumers
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::library("libs/d"))
        .module(ModuleFixture::library("libs/c"))
        .module(ModuleFixture::library("libs/b").needs(&["d"]))
        .module(ModuleFixture::application("app").needs(&["b", "c"]))
        .write()?;

    let (result, output) = run_command(
        dir.path(),
        OutputFormat::Json,
        Commands::Resolve {
            modules: vec!["app".to_string()],
        },
    );
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert_eq!(reports.as_array().map(Vec::len), Some(1));
    assert_eq!(reports[0]["libraries"], json!(["b", "d", "c"]));
    assert_eq!(reports[0]["pending"], json!([]));

    Ok(())
}

#[test]
fn e2e_resolve_shows_missing_libraries() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::application("app").needs(&["b", "gone"]))
        .module(ModuleFixture::library("b"))
        .write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Text, Commands::Resolve { modules: vec![] });
    result?;

    assert!(output.contains("app (com.example:app, application)"));
    assert!(output.contains("  - b"));
    assert!(output.contains("missing: com.example:gone"));

    Ok(())
}

#[test]
fn e2e_application_never_satisfies_a_library_edge() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::application("app").needs(&["tool"]))
        .module(ModuleFixture::application("tool"))
        .write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Resolve { modules: vec![] });
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert_eq!(reports[0]["libraries"], json!([]));
    assert_eq!(reports[0]["pending"], json!(["com.example:tool"]));

    Ok(())
}

#[test]
fn e2e_closed_module_reverts_edges() -> Result<()> {
    let dir = WorkspaceFixture::sample().closed("d").write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Resolve { modules: vec![] });
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert_eq!(reports.as_array().map(Vec::len), Some(3));
    assert_eq!(reports[0]["libraries"], json!(["b", "c"]));
    assert_eq!(reports[1]["pending"], json!(["com.example:d"]));

    Ok(())
}

#[test]
fn e2e_resolve_unknown_module_fails() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, _) = run_command(
        dir.path(),
        OutputFormat::Text,
        Commands::Resolve {
            modules: vec!["ghost".to_string()],
        },
    );
    let err = result.expect_err("unknown module must fail");
    assert!(format!("{:#}", err).contains("ghost"));

    Ok(())
}

#[test]
fn e2e_dependents_follow_library_chain() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, output) = run_command(
        dir.path(),
        OutputFormat::Json,
        Commands::Dependents {
            module: "d".to_string(),
        },
    );
    result?;

    let report: Value = serde_json::from_str(&output)?;
    assert_eq!(report["module"], "d");
    assert_eq!(report["dependents"], json!(["app", "b"]));

    Ok(())
}

#[test]
fn e2e_dependents_text_for_leaf_application() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;

    let (result, output) = run_command(
        dir.path(),
        OutputFormat::Text,
        Commands::Dependents {
            module: "app".to_string(),
        },
    );
    result?;
    assert!(output.contains("Nothing depends on app"));

    Ok(())
}
