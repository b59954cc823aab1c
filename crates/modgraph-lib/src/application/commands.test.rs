use super::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// (directory, identity artifact, is_library, declared artifacts)
type ModuleSpec<'a> = (&'a str, &'a str, bool, &'a [&'a str]);

fn workspace_with(modules: &[ModuleSpec<'_>], extra_yaml: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut yaml = String::from("modules:\n");
    for (module_dir, artifact, is_library, libraries) in modules {
        yaml.push_str(&format!("  - {}\n", module_dir));

        let libraries: Vec<String> = libraries
            .iter()
            .map(|l| format!("\"com.example:{}\"", l))
            .collect();
        let toml = format!(
            "identity = \"com.example:{}\"\nlibrary = {}\nlibraries = [{}]\n",
            artifact,
            is_library,
            libraries.join(", ")
        );
        let path = dir.path().join(module_dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("module.toml"), toml).unwrap();
    }
    yaml.push_str(extra_yaml);
    fs::write(dir.path().join("workspace.yml"), yaml).unwrap();
    dir
}

/// app: [b, c], b: [d], c, d
fn sample() -> TempDir {
    workspace_with(
        &[
            ("app", "app", false, &["b", "c"]),
            ("libs/b", "b", true, &["d"]),
            ("libs/c", "c", true, &[]),
            ("libs/d", "d", true, &[]),
        ],
        "",
    )
}

fn session_for(dir: &TempDir) -> WorkspaceSession {
    WorkspaceSession::open(dir.path(), &Display::plain()).unwrap()
}

fn run(dir: &TempDir, output: OutputFormat, command: Commands) -> (Result<()>, String) {
    let config = AppConfig {
        workdir: Some(dir.path().to_path_buf()),
        output,
        ..AppConfig::default()
    };
    let mut buffer = Vec::new();
    let result = execute_command_with_output(&config, Some(command), &Display::plain(), &mut buffer);
    (result, String::from_utf8(buffer).unwrap())
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn test_session_opens_every_module() {
    let dir = sample();
    let session = session_for(&dir);

    assert_eq!(session.registry().len(), 4);
    assert!(session.unreadable().is_empty());
    assert_eq!(session.workspace().handles().len(), 4);
}

#[test]
fn test_session_skips_unreadable_modules() {
    let dir = sample();
    fs::write(dir.path().join("libs/c/module.toml"), "identity = 42\n").unwrap();

    let session = session_for(&dir);
    assert_eq!(session.registry().len(), 3);
    assert_eq!(session.unreadable().len(), 1);
    assert_eq!(session.unreadable()[0].module, "c");
}

#[test]
fn test_session_closes_listed_modules() {
    let dir = workspace_with(
        &[("app", "app", false, &["b"]), ("b", "b", true, &[])],
        "closed:\n  - b\n",
    );

    let session = session_for(&dir);
    assert!(!session.registry().contains(&ModuleHandle::new("b")));
    assert!(session.registry().is_missing_libraries(&ModuleHandle::new("app")));
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_resolve_report_orders_closure() {
    let dir = sample();
    let session = session_for(&dir);

    let reports = resolve_report(&session, &[]).unwrap();
    let modules: Vec<&str> = reports.iter().map(|r| r.module.as_str()).collect();
    assert_eq!(modules, vec!["app", "b", "c", "d"]);

    assert_eq!(reports[0].libraries, vec!["b", "d", "c"]);
    assert!(reports[0].pending.is_empty());
    assert!(!reports[0].library);
    assert_eq!(reports[1].libraries, vec!["d"]);
}

#[test]
fn test_resolve_report_filter_and_unknown_module() {
    let dir = sample();
    let session = session_for(&dir);

    let reports = resolve_report(&session, &["b".to_string()]).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].identity, "com.example:b");

    let err = resolve_report(&session, &["ghost".to_string()]).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_dependents_report() {
    let dir = sample();
    let session = session_for(&dir);

    let report = dependents_report(&session, "d").unwrap();
    assert_eq!(report.dependents, vec!["app", "b"]);
    assert!(dependents_report(&session, "app").unwrap().dependents.is_empty());
}

#[test]
fn test_check_report_healthy() {
    let dir = sample();
    let report = check_report(&session_for(&dir));
    assert!(report.is_healthy());
    assert!(report.collisions.is_empty());
}

#[test]
fn test_check_report_missing_and_collisions() {
    let dir = workspace_with(
        &[
            ("app", "app", false, &["b", "gone"]),
            ("b", "b", true, &[]),
            ("b-fork", "b", true, &[]),
        ],
        "",
    );
    let report = check_report(&session_for(&dir));

    assert!(!report.is_healthy());
    assert_eq!(report.missing.get("app").unwrap(), &vec!["com.example:gone".to_string()]);
    assert_eq!(
        report.collisions.get("com.example:b").unwrap(),
        &vec!["b".to_string(), "b-fork".to_string()]
    );
}

#[test]
fn test_check_report_cycle() {
    let dir = workspace_with(&[("a", "a", true, &["b"]), ("b", "b", true, &["a"])], "");
    let report = check_report(&session_for(&dir));

    let mut cycle = report.cycle.clone().unwrap();
    cycle.sort();
    assert_eq!(cycle, vec!["a", "b"]);
    assert!(report.missing.is_empty());
    assert!(!report.is_healthy());
    assert!(order_report(&session_for(&dir)).is_err());
}

#[test]
fn test_order_report_libraries_first() {
    let dir = sample();
    let order = order_report(&session_for(&dir)).unwrap().order;
    let pos = |name: &str| order.iter().position(|m| m == name).unwrap();

    assert!(pos("d") < pos("b"));
    assert!(pos("b") < pos("app"));
    assert!(pos("c") < pos("app"));
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_resolve_text_output() {
    let dir = sample();
    let (result, output) = run(&dir, OutputFormat::Text, Commands::Resolve { modules: vec![] });

    result.unwrap();
    assert!(output.contains("app (com.example:app, application)"));
    assert!(output.contains("  - b\n  - d\n  - c\n"));
    assert!(output.contains("d (com.example:d, library)\n  no libraries"));
}

#[test]
fn test_resolve_json_output() {
    let dir = sample();
    let (result, output) = run(&dir, OutputFormat::Json, Commands::Resolve { modules: vec![] });

    result.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value[0]["module"], "app");
    assert_eq!(value[0]["libraries"], serde_json::json!(["b", "d", "c"]));
    assert!(value[0].get("target").is_none());
}

#[test]
fn test_check_fails_on_missing_library() {
    let dir = workspace_with(&[("app", "app", false, &["gone"])], "");
    let (result, output) = run(&dir, OutputFormat::Text, Commands::Check);

    let err = result.unwrap_err();
    assert!(err.to_string().contains("1 module(s) missing libraries"));
    assert!(output.contains("x app: missing com.example:gone"));
}

#[test]
fn test_check_passes_on_healthy_workspace() {
    let dir = sample();
    let (result, output) = run(&dir, OutputFormat::Text, Commands::Check);

    result.unwrap();
    assert!(output.contains("+ All libraries resolved"));
}

#[test]
fn test_dependents_unknown_module_fails() {
    let dir = sample();
    let (result, _) = run(
        &dir,
        OutputFormat::Text,
        Commands::Dependents {
            module: "ghost".to_string(),
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_version_needs_no_workspace() {
    let config = AppConfig {
        workdir: Some("/no/workspace/here".into()),
        ..AppConfig::default()
    };
    let mut buffer = Vec::new();
    execute_command_with_output(&config, Some(Commands::Version), &Display::plain(), &mut buffer)
        .unwrap();

    let output = String::from_utf8(buffer).unwrap();
    assert!(output.starts_with("modgraph "));
}

#[test]
fn test_missing_workspace_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (result, _) = run(&dir, OutputFormat::Text, Commands::Order);
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("workspace.yml"));
}
