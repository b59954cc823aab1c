use super::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

fn write_workspace(dir: &TempDir, yaml: &str) {
    fs::write(dir.path().join(WORKSPACE_FILE), yaml).unwrap();
}

fn write_module(dir: &TempDir, relative: &str, toml: &str) {
    let module_dir = dir.path().join(relative);
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(module_dir.join(MODULE_FILE), toml).unwrap();
}

// ============================================================================
// workspace.yml
// ============================================================================

#[test]
fn test_load_lists_modules_in_order() {
    let dir = TempDir::new().unwrap();
    write_workspace(
        &dir,
        r#"
modules:
  - app
  - libs/core
  - libs/ui/
closed:
  - libs/ui
"#,
    );

    let workspace = FileWorkspace::load(dir.path()).unwrap();
    assert_eq!(
        workspace.handles(),
        &[
            ModuleHandle::new("app"),
            ModuleHandle::new("core"),
            ModuleHandle::new("ui")
        ]
    );
    assert_eq!(workspace.closed(), vec![ModuleHandle::new("ui")]);
    assert_eq!(
        workspace.module_dir(&ModuleHandle::new("core")).unwrap(),
        dir.path().join("libs/core")
    );
    assert!(!workspace.has_sdk());
}

#[test]
fn test_load_rejects_duplicate_directory_names() {
    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules:\n  - a/core\n  - b/core\n");

    match FileWorkspace::load(dir.path()) {
        Err(WorkspaceError::DuplicateHandle { handle, first, second }) => {
            assert_eq!(handle, ModuleHandle::new("core"));
            assert_eq!(first, "a/core");
            assert_eq!(second, "b/core");
        }
        other => panic!("Expected DuplicateHandle, got {:?}", other),
    }
}

#[test]
fn test_load_missing_workspace_file() {
    let dir = TempDir::new().unwrap();
    let err = FileWorkspace::load(dir.path()).unwrap_err();
    assert!(matches!(err, WorkspaceError::Io { .. }));
    assert!(err.to_string().contains(WORKSPACE_FILE));
}

#[test]
fn test_load_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules: [unterminated\n");
    assert!(matches!(
        FileWorkspace::load(dir.path()),
        Err(WorkspaceError::Yaml { .. })
    ));
}

#[test]
fn test_sdk_description() {
    let dir = TempDir::new().unwrap();
    write_workspace(
        &dir,
        r#"
modules: []
targets:
  - hash: android-34
    api-level: 34
build-tools:
  - 33.0.2
  - 34.0.0
"#,
    );

    let workspace = FileWorkspace::load(dir.path()).unwrap();
    assert!(workspace.has_sdk());

    let sdk = workspace.target_provider();
    let target = crate::resolver::TargetProvider::resolve_target(&sdk, "android-34").unwrap();
    assert_eq!(target.api_level, Some(34));
    let tools = crate::resolver::TargetProvider::resolve_build_tools(&sdk, None).unwrap();
    assert_eq!(tools.revision, "34.0.0");
}

// ============================================================================
// module.toml
// ============================================================================

#[test]
fn test_read_profile() {
    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules:\n  - libs/core\n");
    write_module(
        &dir,
        "libs/core",
        r#"
identity = "com.example:core:1.0"
library = true
libraries = ["com.example:base", "com.example:util:2.1"]
target = "android-34"
build-tools = "34.0.0"

[manifest]
application-id = "com.example.core"
min-sdk = 21
target-sdk = 34
"#,
    );

    let workspace = FileWorkspace::load(dir.path()).unwrap();
    let profile = workspace.read_profile(&ModuleHandle::new("core")).unwrap();

    assert_eq!(profile.identity.to_string(), "com.example:core:1.0");
    assert!(profile.is_library);
    assert_eq!(
        profile.libraries,
        vec![
            Identity::new("com.example", "base"),
            Identity::new("com.example", "util").with_version("2.1"),
        ]
    );
    assert_eq!(profile.target.as_deref(), Some("android-34"));
    assert_eq!(profile.build_tools.as_deref(), Some("34.0.0"));
    assert_eq!(profile.manifest.min_sdk, Some(21));
    assert_eq!(profile.manifest.application_id.as_deref(), Some("com.example.core"));
}

#[test]
fn test_read_profile_defaults() {
    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules:\n  - app\n");
    write_module(&dir, "app", "identity = \"com.example:app\"\n");

    let workspace = FileWorkspace::load(dir.path()).unwrap();
    let profile = workspace.read_profile(&ModuleHandle::new("app")).unwrap();

    assert!(!profile.is_library);
    assert!(profile.libraries.is_empty());
    assert!(profile.target.is_none());
    assert_eq!(profile.manifest, ManifestInfo::default());
}

#[test]
fn test_read_profile_errors() {
    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules:\n  - empty\n  - broken\n");
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    write_module(&dir, "broken", "identity = \"not-an-identity\"\n");

    let workspace = FileWorkspace::load(dir.path()).unwrap();

    assert!(matches!(
        workspace.read_profile(&ModuleHandle::new("empty")),
        Err(WorkspaceError::MissingModuleFile { .. })
    ));
    assert!(matches!(
        workspace.read_profile(&ModuleHandle::new("broken")),
        Err(WorkspaceError::Toml { .. })
    ));
    assert!(matches!(
        workspace.read_profile(&ModuleHandle::new("unlisted")),
        Err(WorkspaceError::UnknownModule { .. })
    ));
}

#[test]
fn test_provider_feeds_registry() {
    use crate::resolver::ProjectRegistry;

    let dir = TempDir::new().unwrap();
    write_workspace(&dir, "modules:\n  - app\n  - core\n");
    write_module(
        &dir,
        "app",
        "identity = \"com.example:app\"\nlibraries = [\"com.example:core\"]\n",
    );
    write_module(&dir, "core", "identity = \"com.example:core\"\nlibrary = true\n");

    let workspace = FileWorkspace::load(dir.path()).unwrap();
    let registry = ProjectRegistry::new();
    for handle in workspace.handles() {
        registry.open_with_provider(handle, &workspace).unwrap();
    }

    let closure = registry.resolved_library_projects(&ModuleHandle::new("app"));
    assert_eq!(closure.len(), 1);
    assert_eq!(closure[0].handle(), &ModuleHandle::new("core"));
}
