// Tests for per-module resolution and closure ordering

use super::*;
use crate::resolver::fixtures::{app, handle, handles, id, library, sorted_handles};
use crate::resolver::listener::{RecordedEvent, RecordingListener};

fn state(name: &str, profile: ModuleProfile) -> Arc<ProjectState> {
    ProjectState::new(handle(name), profile)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_state_has_everything_pending() {
    let a = state("a", app("a", &["b", "c", "b"]));

    assert_eq!(a.pending_libraries(), vec![id("b"), id("c")]);
    assert!(a.is_missing_libraries());
    assert!(a.has_libraries());
    assert!(a.full_library_projects().is_empty());
    assert!(a.parent_projects().is_empty());
    assert!(!a.is_library());
    assert!(!a.is_closed());
}

#[test]
fn test_state_without_libraries() {
    let d = state("d", library("d", &[]));
    assert!(!d.has_libraries());
    assert!(!d.is_missing_libraries());
    assert!(d.is_library());
}

// ============================================================================
// needs / depends_on / resolve
// ============================================================================

#[test]
fn test_needs_resolves_matching_edge() {
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &[]));

    let edge = a.needs(&b).expect("b satisfies a pending edge");
    assert_eq!(edge.identity(), &id("b"));
    assert!(edge.resolves_to(&b));

    assert_eq!(a.pending_libraries(), vec![id("c")]);
    assert!(a.depends_on(&b));
    assert!(b.parents_contain(&a));
    assert_eq!(handles(&a.full_library_projects()), vec!["b"]);
    assert!(a.library_for(&handle("b")).is_some());
}

#[test]
fn test_needs_is_idempotent() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &[]));

    assert!(a.needs(&b).is_some());
    assert!(a.needs(&b).is_none());
    assert_eq!(b.parent_projects().len(), 1);
    assert_eq!(a.full_library_projects().len(), 1);
}

#[test]
fn test_needs_ignores_unrelated_and_self() {
    let a = state("a", app("a", &["b", "a"]));
    let x = state("x", library("x", &[]));

    assert!(a.needs(&x).is_none());
    assert!(a.needs(&a).is_none());
    assert!(!a.depends_on(&x));
    assert_eq!(a.pending_libraries(), vec![id("b"), id("a")]);
}

#[test]
fn test_depends_on_unaffected_by_failed_attempts() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &[]));
    let x = state("x", library("x", &[]));

    assert!(!a.depends_on(&b));
    a.needs(&x);
    assert!(!a.depends_on(&b));
    a.needs(&b);
    assert!(a.depends_on(&b));
    assert!(!a.depends_on(&x));
}

#[test]
fn test_resolve_only_acts_while_pending() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &[]));
    let other_b = state("b2", library("b", &[]));

    assert!(a.resolve(&b).is_some());
    assert!(!a.is_missing_libraries());
    // Nothing pending: a second module with the same identity is not taken
    assert!(a.resolve(&other_b).is_none());
    assert!(other_b.parent_projects().is_empty());
}

#[test]
fn test_closed_candidate_is_refused() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &[]));

    b.mark_closed();
    assert!(a.needs(&b).is_none());
    assert!(a.is_missing_libraries());
}

// ============================================================================
// Closure ordering
// ============================================================================

#[test]
fn test_priority_ordering_declarer_before_its_dependencies() {
    // a: [b, c], b: [d]
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &["d"]));
    let c = state("c", library("c", &[]));
    let d = state("d", library("d", &[]));

    b.needs(&d);
    a.needs(&b);
    a.needs(&c);

    assert_eq!(handles(&a.full_library_projects()), vec!["b", "d", "c"]);
    assert_eq!(handles(&b.full_library_projects()), vec!["d"]);
}

#[test]
fn test_closure_independent_of_resolution_order() {
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &["d"]));
    let c = state("c", library("c", &[]));
    let d = state("d", library("d", &[]));

    // Consumer first, deepest library last
    a.needs(&c);
    a.needs(&b);
    assert_eq!(handles(&a.full_library_projects()), vec!["b", "c"]);

    b.needs(&d);
    assert_eq!(handles(&a.full_library_projects()), vec!["b", "d", "c"]);
}

#[test]
fn test_shared_dependency_appears_once_at_highest_priority() {
    // a: [b, c], b: [e], c: [e]
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &["e"]));
    let c = state("c", library("c", &["e"]));
    let e = state("e", library("e", &[]));

    b.needs(&e);
    c.needs(&e);
    a.needs(&b);
    a.needs(&c);

    assert_eq!(handles(&a.full_library_projects()), vec!["b", "c", "e"]);
}

#[test]
fn test_unresolved_edges_contribute_nothing() {
    let a = state("a", app("a", &["b", "missing", "c"]));
    let b = state("b", library("b", &["also-missing"]));
    let c = state("c", library("c", &[]));

    a.needs(&b);
    a.needs(&c);

    assert_eq!(handles(&a.full_library_projects()), vec!["b", "c"]);
    assert_eq!(a.pending_libraries(), vec![id("missing")]);
}

#[test]
fn test_cyclic_declarations_terminate() {
    let a = state("a", library("a", &["b"]));
    let b = state("b", library("b", &["c"]));
    let c = state("c", library("c", &["a"]));

    a.needs(&b);
    b.needs(&c);
    c.needs(&a);

    assert_eq!(handles(&a.full_library_projects()), vec!["b", "c"]);
    assert_eq!(handles(&b.full_library_projects()), vec!["c", "a"]);
    assert_eq!(handles(&c.full_library_projects()), vec!["a", "b"]);
    assert_eq!(sorted_handles(&a.full_parent_projects()), vec!["b", "c"]);
}

// ============================================================================
// Reverse edges
// ============================================================================

#[test]
fn test_full_parent_projects_is_transitive() {
    let a = state("a", app("a", &["b"]));
    let x = state("x", app("x", &["c"]));
    let b = state("b", library("b", &["c"]));
    let c = state("c", library("c", &[]));

    b.needs(&c);
    a.needs(&b);
    x.needs(&c);

    assert_eq!(sorted_handles(&c.full_parent_projects()), vec!["a", "b", "x"]);
    assert_eq!(sorted_handles(&b.full_parent_projects()), vec!["a"]);
    assert!(a.full_parent_projects().is_empty());
}

#[test]
fn test_close_library_reverts_edge() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &["d"]));
    let d = state("d", library("d", &[]));

    b.needs(&d);
    a.needs(&b);
    assert_eq!(handles(&a.full_library_projects()), vec!["b", "d"]);

    let edge = a.close_library(&b).expect("edge was resolved");
    assert!(!edge.is_resolved());
    assert_eq!(a.pending_libraries(), vec![id("b")]);
    assert!(a.full_library_projects().is_empty());
    assert!(b.parent_projects().is_empty());
    assert!(a.close_library(&b).is_none());
}

#[test]
fn test_transitive_consumer_sees_library_closing() {
    let a = state("a", app("a", &["b"]));
    let b = state("b", library("b", &["d"]));
    let d = state("d", library("d", &[]));

    a.needs(&b);
    b.needs(&d);
    assert_eq!(handles(&a.full_library_projects()), vec!["b", "d"]);

    b.close_library(&d);
    assert_eq!(handles(&a.full_library_projects()), vec!["b"]);
}

#[test]
fn test_release_libraries_detaches_from_targets() {
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &[]));
    let c = state("c", library("c", &[]));

    a.needs(&b);
    a.needs(&c);

    let released = a.release_libraries();
    assert_eq!(sorted_handles(&released), vec!["b", "c"]);
    assert!(b.parent_projects().is_empty());
    assert!(c.parent_projects().is_empty());
    assert!(a.full_library_projects().is_empty());
}

// ============================================================================
// Declared library changes
// ============================================================================

#[test]
fn test_reconcile_libraries_keeps_surviving_edges() {
    let a = state("a", app("a", &["b", "c"]));
    let b = state("b", library("b", &[]));
    let c = state("c", library("c", &[]));

    a.needs(&b);
    a.needs(&c);

    let difference = a.reconcile_libraries(&[id("x"), id("b")]);
    assert_eq!(difference.added, vec![id("x")]);
    assert_eq!(difference.removed, vec![id("c")]);

    let declared: Vec<Identity> = a.libraries().iter().map(|l| l.identity().clone()).collect();
    assert_eq!(declared, vec![id("x"), id("b")]);
    assert!(a.library(&id("b")).unwrap().is_resolved());
    assert_eq!(a.pending_libraries(), vec![id("x")]);
    assert!(c.parent_projects().is_empty());
    assert_eq!(b.parent_projects().len(), 1);
    assert_eq!(handles(&a.full_library_projects()), vec!["b"]);
}

#[test]
fn test_reconcile_with_same_list_is_empty_difference() {
    let a = state("a", app("a", &["b"]));
    assert!(a.reconcile_libraries(&[id("b")]).is_empty());
}

#[test]
fn test_update_library_identity() {
    let a = state("a", app("a", &["old"]));
    let new_lib = state("new", library("new", &[]));

    let edge = a.update_library_identity(&id("old"), id("new")).unwrap().unwrap();
    assert_eq!(edge.identity(), &id("new"));
    assert_eq!(a.pending_libraries(), vec![id("new")]);
    assert!(a.update_library_identity(&id("absent"), id("x")).unwrap().is_none());

    a.needs(&new_lib);
    assert!(matches!(
        a.update_library_identity(&id("new"), id("other")),
        Err(LibraryError::AlreadyResolved { .. })
    ));
}

// ============================================================================
// scan_libraries
// ============================================================================

#[test]
fn test_scan_libraries_resolves_both_directions() {
    let a = state("a", app("a", &["b"]));
    let d = state("d", library("d", &[]));
    let b = state("b", library("b", &["d"]));
    let recorder = RecordingListener::new();

    b.scan_libraries(&[a.clone(), d.clone(), b.clone()], recorder.as_ref());

    assert_eq!(
        recorder.events(),
        vec![
            RecordedEvent::DependencyResolved {
                consumer: handle("b"),
                library: handle("d"),
            },
            RecordedEvent::LibraryFound {
                library: handle("b"),
                consumer: handle("a"),
            },
        ]
    );
    assert_eq!(handles(&a.full_library_projects()), vec!["b", "d"]);

    // Second scan changes nothing
    b.scan_libraries(&[a.clone(), d.clone()], recorder.as_ref());
    assert_eq!(recorder.events().len(), 2);
}

#[test]
fn test_scan_skips_library_direction_for_applications() {
    let consumer = state("a", app("a", &["b"]));
    let impostor = state("b", app("b", &[]));
    let recorder = RecordingListener::new();

    impostor.scan_libraries(&[consumer.clone()], recorder.as_ref());
    assert!(recorder.events().is_empty());
    assert!(consumer.is_missing_libraries());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_cross_resolution_does_not_deadlock() {
    // a and b are libraries of each other; resolving both directions from
    // two threads at once must take the pair of locks in a consistent order
    for _ in 0..50 {
        let a = state("a", library("a", &["b"]));
        let b = state("b", library("b", &["a"]));

        let (a1, b1) = (a.clone(), b.clone());
        let t1 = std::thread::spawn(move || a1.needs(&b1).is_some());
        let (a2, b2) = (a.clone(), b.clone());
        let t2 = std::thread::spawn(move || b2.needs(&a2).is_some());

        assert!(t1.join().unwrap());
        assert!(t2.join().unwrap());
        assert_eq!(handles(&a.full_library_projects()), vec!["b"]);
        assert_eq!(handles(&b.full_library_projects()), vec!["a"]);
    }
}
