//! E2E tests for the registry event stream over a workspace on disk

use anyhow::Result;
use modgraph_lib::primitives::ModuleHandle;
use modgraph_lib::resolver::{ProjectRegistry, RecordedEvent, RecordingListener};
use modgraph_lib::workspace::FileWorkspace;
use modgraph_tests::{ModuleFixture, WorkspaceFixture};

fn handle(name: &str) -> ModuleHandle {
    ModuleHandle::new(name)
}

fn open_workspace(workspace: &FileWorkspace, registry: &ProjectRegistry) -> Result<()> {
    for module in workspace.handles() {
        registry.open_with_provider(module, workspace)?;
    }
    Ok(())
}

#[test]
fn e2e_open_emits_library_found_in_open_order() -> Result<()> {
    let dir = WorkspaceFixture::sample().write()?;
    let workspace = FileWorkspace::load(dir.path())?;
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    open_workspace(&workspace, &registry)?;

    assert_eq!(
        recorder.take(),
        vec![
            RecordedEvent::ProjectOpened(handle("app")),
            RecordedEvent::LibraryFound {
                library: handle("b"),
                consumer: handle("app"),
            },
            RecordedEvent::ProjectOpened(handle("b")),
            RecordedEvent::LibraryFound {
                library: handle("c"),
                consumer: handle("app"),
            },
            RecordedEvent::ProjectOpened(handle("c")),
            RecordedEvent::LibraryFound {
                library: handle("d"),
                consumer: handle("b"),
            },
            RecordedEvent::ProjectOpened(handle("d")),
        ]
    );

    registry.close(&handle("d"));
    assert_eq!(
        recorder.take(),
        vec![
            RecordedEvent::DependencyLost {
                consumer: handle("b"),
                library: handle("d"),
            },
            RecordedEvent::ProjectRemoved {
                handle: handle("d"),
                orphaned: vec![],
            },
        ]
    );

    Ok(())
}

#[test]
fn e2e_consumer_opened_last_reports_resolved_dependencies() -> Result<()> {
    let dir = WorkspaceFixture::new()
        .module(ModuleFixture::library("libs/core"))
        .module(ModuleFixture::application("app").needs(&["core"]))
        .write()?;
    let workspace = FileWorkspace::load(dir.path())?;
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    open_workspace(&workspace, &registry)?;

    assert_eq!(
        recorder.events(),
        vec![
            RecordedEvent::ProjectOpened(handle("core")),
            RecordedEvent::DependencyResolved {
                consumer: handle("app"),
                library: handle("core"),
            },
            RecordedEvent::ProjectOpened(handle("app")),
        ]
    );

    Ok(())
}
