// Tests for workspace-wide open/close reconciliation

use super::*;
use crate::resolver::fixtures::{app, handle, handles, id, library, sorted_handles};
use crate::resolver::listener::{RecordedEvent, RecordingListener};
use crate::resolver::profile::{BuildToolsError, BuildToolsInfo, StaticTargetProvider, TargetBinding};
use parking_lot::Mutex;
use std::collections::HashMap;

/// a: [b, c], b: [d], c, d
fn sample_workspace() -> Vec<(ModuleHandle, ModuleProfile)> {
    vec![
        (handle("a"), app("a", &["b", "c"])),
        (handle("b"), library("b", &["d"])),
        (handle("c"), library("c", &[])),
        (handle("d"), library("d", &[])),
    ]
}

fn open_all(registry: &ProjectRegistry, modules: &[(ModuleHandle, ModuleProfile)]) {
    for (handle, profile) in modules {
        registry.open(handle.clone(), profile.clone());
    }
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            result.push(tail);
        }
    }
    result
}

// ============================================================================
// Open order and idempotence
// ============================================================================

#[test]
fn test_open_order_does_not_change_the_result() {
    let orders = permutations(&sample_workspace());
    assert_eq!(orders.len(), 24);

    for order in orders {
        let registry = ProjectRegistry::new();
        open_all(&registry, &order);

        let opened: Vec<String> = order.iter().map(|(h, _)| h.to_string()).collect();
        assert_eq!(
            handles(&registry.resolved_library_projects(&handle("a"))),
            vec!["b", "d", "c"],
            "open order {:?}",
            opened
        );
        assert_eq!(handles(&registry.resolved_library_projects(&handle("b"))), vec!["d"]);
        for name in ["a", "b", "c", "d"] {
            assert!(!registry.is_missing_libraries(&handle(name)), "{} after {:?}", name, opened);
        }
        assert_eq!(
            sorted_handles(&registry.main_projects_for(&handle("d"))),
            vec!["a", "b"]
        );
    }
}

#[test]
fn test_open_is_idempotent() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());
    open_all(&registry, &sample_workspace());
    recorder.take();

    let first = registry.get(&handle("b")).unwrap();
    let again = registry.open(handle("b"), library("b", &["d"]));

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(registry.len(), 4);
    assert_eq!(first.parent_projects().len(), 1);
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b", "d", "c"]);
    assert!(recorder.events().is_empty(), "Reopening must not emit events");
}

#[test]
fn test_missing_library_resolves_when_it_opens() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["b"]));

    assert!(registry.is_missing_libraries(&handle("a")));
    assert_eq!(registry.pending_libraries(&handle("a")), vec![id("b")]);

    registry.open(handle("b"), library("b", &[]));

    assert!(!registry.is_missing_libraries(&handle("a")));
    assert!(registry.pending_libraries(&handle("a")).is_empty());
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b"]);
}

#[test]
fn test_application_never_satisfies_an_edge() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("b"), app("b", &[]));
    registry.open(handle("c"), app("c", &[]));
    registry.open(handle("x"), app("x", &["c"]));

    assert!(registry.is_missing_libraries(&handle("a")));
    assert!(registry.find_libraries(&handle("b")).is_empty());
    assert!(registry.is_missing_libraries(&handle("x")));
}

// ============================================================================
// Close
// ============================================================================

#[test]
fn test_close_reverts_consumer_edges() {
    let registry = ProjectRegistry::new();
    open_all(&registry, &sample_workspace());

    let closed = registry.close(&handle("b")).expect("b was open");
    assert!(closed.is_closed());
    assert!(!registry.contains(&handle("b")));

    assert_eq!(registry.pending_libraries(&handle("a")), vec![id("b")]);
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["c"]);
    let d = registry.get(&handle("d")).unwrap();
    assert!(d.parent_projects().is_empty());
    assert!(registry.main_projects_for(&handle("d")).is_empty());

    // Reopening restores the edge
    registry.open(handle("b"), library("b", &["d"]));
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b", "d", "c"]);
}

#[test]
fn test_close_unknown_module_is_noop() {
    let registry = ProjectRegistry::new();
    assert!(registry.close(&handle("ghost")).is_none());
}

#[test]
fn test_close_falls_back_to_colliding_library() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());
    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("b1"), library("b", &[]));
    registry.open(handle("b2"), library("b", &[]));
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b1"]);
    recorder.take();

    registry.close(&handle("b1"));

    assert!(!registry.is_missing_libraries(&handle("a")));
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b2"]);
    let events = recorder.events();
    assert_eq!(
        &events[..2],
        &[
            RecordedEvent::DependencyLost {
                consumer: handle("a"),
                library: handle("b1"),
            },
            RecordedEvent::DependencyResolved {
                consumer: handle("a"),
                library: handle("b2"),
            },
        ]
    );
}

#[test]
fn test_clear_closes_everything() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());
    open_all(&registry, &sample_workspace());
    let a = registry.get(&handle("a")).unwrap();
    recorder.take();

    registry.clear();

    assert!(registry.is_empty());
    assert!(registry.profile(&handle("a")).is_none());
    assert!(a.is_closed());
    let removed = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, RecordedEvent::ProjectRemoved { .. }))
        .count();
    assert_eq!(removed, 4);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_main_projects_for_stops_at_applications() {
    // d <- b <- x, and y declares x which is not a library
    let registry = ProjectRegistry::new();
    registry.open(handle("d"), library("d", &[]));
    registry.open(handle("b"), library("b", &["d"]));
    registry.open(handle("x"), app("x", &["b"]));
    registry.open(handle("y"), app("y", &["x"]));

    assert_eq!(sorted_handles(&registry.main_projects_for(&handle("d"))), vec!["b", "x"]);
    assert_eq!(sorted_handles(&registry.main_projects_for(&handle("b"))), vec!["x"]);
    assert!(registry.main_projects_for(&handle("x")).is_empty());
}

#[test]
fn test_main_projects_shrink_after_reload() {
    let registry = ProjectRegistry::new();
    open_all(&registry, &sample_workspace());
    assert_eq!(sorted_handles(&registry.main_projects_for(&handle("d"))), vec!["a", "b"]);

    let difference = registry.reload(&handle("b"), library("b", &[])).unwrap();
    assert_eq!(difference.removed, vec![id("d")]);
    assert!(difference.added.is_empty());

    assert!(registry.main_projects_for(&handle("d")).is_empty());
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b", "c"]);
}

#[test]
fn test_unknown_handle_queries() {
    let registry = ProjectRegistry::new();
    let ghost = handle("ghost");

    assert!(matches!(
        registry.get(&ghost),
        Err(RegistryError::NotRegistered { .. })
    ));
    assert!(registry.find(&ghost).is_none());
    assert!(registry.find_libraries(&ghost).is_empty());
    assert!(registry.main_projects_for(&ghost).is_empty());
    assert!(registry.resolved_library_projects(&ghost).is_empty());
    assert!(registry.pending_libraries(&ghost).is_empty());
    assert!(!registry.is_missing_libraries(&ghost));
}

#[test]
fn test_find_libraries_returns_every_edge_to_module() {
    let registry = ProjectRegistry::new();
    open_all(&registry, &sample_workspace());
    registry.open(handle("x"), app("x", &["d"]));

    let edges = registry.find_libraries(&handle("d"));
    let mut consumers: Vec<String> = edges
        .iter()
        .map(|e| e.parent().unwrap().handle().to_string())
        .collect();
    consumers.sort();

    assert_eq!(consumers, vec!["b", "x"]);
    assert!(edges.iter().all(|e| *e == handle("d")));
}

#[test]
fn test_handles_are_sorted() {
    let registry = ProjectRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.open(handle(name), app(name, &[]));
    }
    assert_eq!(
        registry.handles(),
        vec![handle("alpha"), handle("mid"), handle("zeta")]
    );
}

#[test]
fn test_identity_collisions_are_reported() {
    let registry = ProjectRegistry::new();
    registry.open(handle("core"), library("core", &[]));
    registry.open(handle("core-copy"), library("core", &[]));
    registry.open(handle("ui"), library("ui", &[]));

    let collisions = registry.identity_collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(
        collisions.get(&id("core")).unwrap(),
        &vec![handle("core"), handle("core-copy")]
    );
}

#[test]
fn test_dependency_graph_snapshot() {
    let registry = ProjectRegistry::new();
    open_all(&registry, &sample_workspace());

    let graph = registry.dependency_graph();
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 3);
    assert!(!graph.has_cycles());

    let order: Vec<String> = graph
        .build_order()
        .unwrap()
        .into_iter()
        .map(|n| n.handle.to_string())
        .collect();
    let pos = |name: &str| order.iter().position(|h| h == name).unwrap();
    assert!(pos("d") < pos("b"));
    assert!(pos("b") < pos("a"));
    assert!(pos("c") < pos("a"));
}

// ============================================================================
// Profiles and providers
// ============================================================================

struct MapProvider(HashMap<String, ModuleProfile>);

impl ModuleConfigProvider for MapProvider {
    fn load_profile(&self, handle: &ModuleHandle) -> anyhow::Result<ModuleProfile> {
        self.0
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no module.toml for {}", handle))
    }
}

#[test]
fn test_open_with_provider() {
    let provider = MapProvider(HashMap::from([
        ("a".to_string(), app("a", &["b"])),
        ("b".to_string(), library("b", &[])),
    ]));
    let registry = ProjectRegistry::new();

    registry.open_with_provider(&handle("a"), &provider).unwrap();
    registry.open_with_provider(&handle("b"), &provider).unwrap();
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b"]);

    let err = registry
        .open_with_provider(&handle("nope"), &provider)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Provider { .. }));
    assert!(err.to_string().contains("nope"));
    assert!(!registry.contains(&handle("nope")));
}

#[test]
fn test_open_registered() {
    let registry = ProjectRegistry::new();
    registry.register_profile(handle("b"), library("b", &[]));

    let b = registry.open_registered(&handle("b")).unwrap();
    assert!(b.is_library());
    assert!(matches!(
        registry.open_registered(&handle("a")),
        Err(RegistryError::MissingProfile { .. })
    ));
}

#[test]
fn test_reload_with_new_identity_reopens() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("lib"), library("b", &[]));
    let old = registry.get(&handle("lib")).unwrap();
    assert!(!registry.is_missing_libraries(&handle("a")));

    registry.reload(&handle("lib"), library("renamed", &[])).unwrap();

    let new = registry.get(&handle("lib")).unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(old.is_closed());
    assert_eq!(new.identity(), &id("renamed"));
    assert!(registry.is_missing_libraries(&handle("a")));
}

#[test]
fn test_reload_losing_library_flag_drops_consumers() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());
    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("b"), library("b", &[]));
    recorder.take();

    registry.reload(&handle("b"), app("b", &[])).unwrap();

    assert!(registry.is_missing_libraries(&handle("a")));
    assert!(recorder.events().contains(&RecordedEvent::DependencyLost {
        consumer: handle("a"),
        library: handle("b"),
    }));
}

#[test]
fn test_reload_losing_library_flag_falls_back_to_collision() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("b1"), library("b", &[]));
    registry.open(handle("b2"), library("b", &[]));

    registry.reload(&handle("b1"), app("b", &[])).unwrap();

    assert!(!registry.is_missing_libraries(&handle("a")));
    assert_eq!(handles(&registry.resolved_library_projects(&handle("a"))), vec!["b2"]);
}

#[test]
fn test_reload_unknown_module_fails() {
    let registry = ProjectRegistry::new();
    assert!(matches!(
        registry.reload(&handle("ghost"), app("ghost", &[])),
        Err(RegistryError::NotRegistered { .. })
    ));
}

#[test]
fn test_retarget_library() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["typo"]));
    registry.open(handle("b"), library("b", &[]));

    let edge = registry
        .retarget_library(&handle("a"), &id("typo"), id("b"))
        .unwrap()
        .unwrap();
    assert!(edge.is_resolved());
    assert!(!registry.is_missing_libraries(&handle("a")));

    // Resolved edges cannot be retargeted
    assert!(matches!(
        registry.retarget_library(&handle("a"), &id("b"), id("c")),
        Err(RegistryError::Library(LibraryError::AlreadyResolved { .. }))
    ));
    assert!(registry
        .retarget_library(&handle("a"), &id("absent"), id("c"))
        .unwrap()
        .is_none());
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_listener_events_for_open_and_close() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    registry.open(handle("a"), app("a", &["b"]));
    registry.open(handle("b"), library("b", &["d"]));
    registry.open(handle("d"), library("d", &[]));

    assert_eq!(
        recorder.take(),
        vec![
            RecordedEvent::ProjectOpened(handle("a")),
            RecordedEvent::LibraryFound {
                library: handle("b"),
                consumer: handle("a"),
            },
            RecordedEvent::ProjectOpened(handle("b")),
            RecordedEvent::LibraryFound {
                library: handle("d"),
                consumer: handle("b"),
            },
            RecordedEvent::ProjectOpened(handle("d")),
        ]
    );

    registry.close(&handle("b"));
    assert_eq!(
        recorder.take(),
        vec![
            RecordedEvent::DependencyLost {
                consumer: handle("a"),
                library: handle("b"),
            },
            RecordedEvent::ProjectRemoved {
                handle: handle("b"),
                orphaned: vec![handle("d")],
            },
        ]
    );
}

#[test]
fn test_removed_listener_stops_receiving() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    let listener: Arc<dyn BuildEventListener> = recorder.clone();
    registry.add_listener(listener.clone());

    assert!(registry.remove_listener(&listener));
    assert!(!registry.remove_listener(&listener));

    registry.open(handle("a"), app("a", &[]));
    assert!(recorder.events().is_empty());
}

// ============================================================================
// Targets and build tools
// ============================================================================

fn sdk() -> Arc<StaticTargetProvider> {
    Arc::new(StaticTargetProvider::new(
        vec![TargetBinding {
            hash: "android-34".to_string(),
            api_level: Some(34),
        }],
        vec!["33.0.2".to_string(), "34.0.0".to_string()],
    ))
}

#[test]
fn test_target_and_build_tools_bound_on_open() {
    let registry = ProjectRegistry::new().with_target_provider(sdk());
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    let a = registry.open(
        handle("a"),
        app("a", &[]).with_target("android-34").with_build_tools("33.0.2"),
    );
    let b = registry.open(handle("b"), library("b", &[]).with_target("android-99"));

    assert_eq!(a.target().unwrap().api_level, Some(34));
    assert_eq!(a.build_tools().unwrap().revision, "33.0.2");
    assert!(b.target().is_none());
    // No revision requested: newest installed
    assert_eq!(b.build_tools().unwrap().revision, "34.0.0");

    assert!(recorder.events().contains(&RecordedEvent::BuildToolsStatus {
        handle: handle("a"),
        message: None,
    }));
}

#[test]
fn test_missing_build_tools_reported() {
    let registry = ProjectRegistry::new().with_target_provider(sdk());
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    let a = registry.open(handle("a"), app("a", &[]).with_build_tools("19.1.0"));

    assert!(a.build_tools().is_none());
    assert!(recorder.events().contains(&RecordedEvent::BuildToolsStatus {
        handle: handle("a"),
        message: Some("Build tools 19.1.0 are not installed".to_string()),
    }));
}

#[test]
fn test_static_provider_build_tools_errors() {
    let empty = StaticTargetProvider::default();
    assert_eq!(
        empty.resolve_build_tools(None),
        Err(BuildToolsError::NoneInstalled)
    );

    let installed = StaticTargetProvider::new(vec![], vec!["34.0.0".to_string()]);
    let err = installed.resolve_build_tools(Some("19.1.0")).unwrap_err();
    assert_eq!(
        err,
        BuildToolsError::NotInstalled {
            revision: "19.1.0".to_string()
        }
    );
    assert_eq!(err.to_string(), "Build tools 19.1.0 are not installed");
}

#[test]
fn test_no_provider_leaves_targets_unbound() {
    let registry = ProjectRegistry::new();
    let recorder = RecordingListener::new();
    registry.add_listener(recorder.clone());

    let a = registry.open(handle("a"), app("a", &[]).with_target("android-34"));
    assert!(a.target().is_none());
    assert!(a.build_tools().is_none());
    assert_eq!(recorder.events(), vec![RecordedEvent::ProjectOpened(handle("a"))]);
}

/// SDK whose installed targets change at runtime
#[derive(Default)]
struct MutableSdk {
    targets: Mutex<HashMap<String, TargetBinding>>,
}

impl MutableSdk {
    fn install(&self, hash: &str) {
        self.targets.lock().insert(
            hash.to_string(),
            TargetBinding {
                hash: hash.to_string(),
                api_level: None,
            },
        );
    }

    fn uninstall(&self, hash: &str) {
        self.targets.lock().remove(hash);
    }
}

impl TargetProvider for MutableSdk {
    fn resolve_target(&self, hash: &str) -> Option<TargetBinding> {
        self.targets.lock().get(hash).cloned()
    }

    fn resolve_build_tools(&self, _revision: Option<&str>) -> Result<BuildToolsInfo, BuildToolsError> {
        Ok(BuildToolsInfo {
            revision: "34.0.0".to_string(),
        })
    }
}

#[test]
fn test_target_events_rebind_matching_modules() {
    let sdk = Arc::new(MutableSdk::default());
    let registry = ProjectRegistry::new().with_target_provider(sdk.clone());
    let a = registry.open(handle("a"), app("a", &[]).with_target("android-35"));
    let b = registry.open(handle("b"), app("b", &[]).with_target("android-34"));
    assert!(a.target().is_none());

    sdk.install("android-35");
    registry.on_target_binding_event(TargetEvent::Loaded("android-35".to_string()));
    assert_eq!(a.target().unwrap().hash, "android-35");
    assert!(b.target().is_none());

    registry.on_target_binding_event(TargetEvent::Unloaded("android-35".to_string()));
    assert!(a.target().is_none());
}

#[test]
fn test_refresh_rebinds_targets_without_touching_edges() {
    let sdk = Arc::new(MutableSdk::default());
    sdk.install("android-34");
    let registry = ProjectRegistry::new().with_target_provider(sdk.clone());
    let a = registry.open(handle("a"), app("a", &["b"]).with_target("android-34"));
    registry.open(handle("b"), library("b", &[]));
    assert!(a.target().is_some());

    sdk.uninstall("android-34");
    registry.refresh();

    assert!(a.target().is_none());
    assert!(!registry.is_missing_libraries(&handle("a")));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_opens_converge() {
    for _ in 0..20 {
        let registry = Arc::new(ProjectRegistry::new());
        let threads: Vec<_> = sample_workspace()
            .into_iter()
            .map(|(handle, profile)| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.open(handle, profile);
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(registry.len(), 4);
        assert_eq!(
            handles(&registry.resolved_library_projects(&handle("a"))),
            vec!["b", "d", "c"]
        );
        assert!(!registry.is_missing_libraries(&handle("a")));
        assert!(!registry.is_missing_libraries(&handle("b")));
    }
}

#[test]
fn test_concurrent_open_and_close_leave_no_dangling_edges() {
    for _ in 0..20 {
        let registry = Arc::new(ProjectRegistry::new());
        registry.open(handle("a"), app("a", &["b"]));

        let opener = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry.open(handle("b"), library("b", &[]));
            })
        };
        let closer = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry.close(&handle("b"));
            })
        };
        opener.join().unwrap();
        closer.join().unwrap();

        let a = registry.get(&handle("a")).unwrap();
        match registry.find(&handle("b")) {
            Some(b) => assert!(a.depends_on(&b)),
            None => {
                assert!(a.is_missing_libraries());
                assert!(a.full_library_projects().is_empty());
            }
        }
    }
}

#[test]
fn test_retarget_to_declared_identity_is_rejected() {
    let registry = ProjectRegistry::new();
    registry.open(handle("a"), app("a", &["b", "c"]));

    assert!(matches!(
        registry.retarget_library(&handle("a"), &id("c"), id("b")),
        Err(RegistryError::Library(LibraryError::DuplicateLibrary { identity })) if identity == id("b")
    ));
    let a = registry.get(&handle("a")).unwrap();
    let declared: Vec<Identity> = a.libraries().iter().map(|l| l.identity().clone()).collect();
    assert_eq!(declared, vec![id("b"), id("c")]);

    registry.open(handle("b"), library("b", &[]));
    assert_eq!(registry.pending_libraries(&handle("a")), vec![id("c")]);
}
