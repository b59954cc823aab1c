//! E2E tests for SDK target and build-tools binding

use anyhow::Result;
use modgraph_lib::application::Commands;
use modgraph_lib::primitives::OutputFormat;
use modgraph_tests::{ModuleFixture, WorkspaceFixture, run_command};
use serde_json::Value;

const SDK: &str = r#"targets:
  - hash: android-34
    api-level: 34
build-tools:
  - 33.0.2
  - 34.0.0
"#;

#[test]
fn e2e_target_and_build_tools_are_bound() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::application("app").target("android-34"))
        .module(ModuleFixture::library("lib").target("android-99"))
        .yaml(SDK)
        .write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Resolve { modules: vec![] });
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert_eq!(reports[0]["target"], "android-34");
    assert_eq!(reports[0]["build_tools"], "34.0.0");
    assert!(reports[1].get("target").is_none());

    Ok(())
}

#[test]
fn e2e_no_sdk_means_no_binding() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::application("app").target("android-34"))
        .write()?;

    let (result, output) = run_command(dir.path(), OutputFormat::Json, Commands::Resolve { modules: vec![] });
    result?;

    let reports: Value = serde_json::from_str(&output)?;
    assert!(reports[0].get("target").is_none());
    assert!(reports[0].get("build_tools").is_none());

    Ok(())
}
