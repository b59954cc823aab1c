// Tests for library edge transitions

use super::*;
use crate::resolver::fixtures::{app, handle, id, library};

fn edge_of(consumer: &Arc<ProjectState>, artifact: &str) -> LibraryState {
    LibraryState::new(Arc::downgrade(consumer), id(artifact))
}

#[test]
fn test_new_edge_is_unresolved() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let edge = edge_of(&consumer, "core");

    assert!(!edge.is_resolved());
    assert!(edge.resolved().is_none());
    assert_eq!(edge.identity(), &id("core"));
    assert!(Arc::ptr_eq(&edge.parent().unwrap(), &consumer));
    assert!(edge.is_owned_by(&consumer));
}

#[test]
fn test_set_resolved_links_both_directions() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let core = ProjectState::new(handle("core"), library("core", &[]));
    let mut edge = edge_of(&consumer, "core");
    let mut core_parents = Vec::new();

    edge.set_resolved(&core, &mut core_parents).unwrap();

    assert!(edge.resolves_to(&core));
    assert!(Arc::ptr_eq(&edge.resolved().unwrap(), &core));
    assert_eq!(core_parents.len(), 1);
    assert!(Arc::ptr_eq(&core_parents[0].upgrade().unwrap(), &consumer));
}

#[test]
fn test_set_resolved_rejects_identity_mismatch() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let other = ProjectState::new(handle("ui"), library("ui", &[]));
    let mut edge = edge_of(&consumer, "core");
    let mut parents = Vec::new();

    let err = edge.set_resolved(&other, &mut parents).unwrap_err();
    assert_eq!(
        err,
        LibraryError::IdentityMismatch {
            expected: id("core"),
            found: id("ui"),
        }
    );
    assert!(!edge.is_resolved());
    assert!(parents.is_empty());
}

#[test]
fn test_set_resolved_twice_is_rejected() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let core = ProjectState::new(handle("core"), library("core", &[]));
    let mut edge = edge_of(&consumer, "core");
    let mut parents = Vec::new();

    edge.set_resolved(&core, &mut parents).unwrap();
    assert!(matches!(
        edge.set_resolved(&core, &mut parents),
        Err(LibraryError::AlreadyResolved { .. })
    ));
    assert_eq!(parents.len(), 1, "Parent must not be linked twice");
}

#[test]
fn test_close_unlinks_parent_and_reverts() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let bystander = ProjectState::new(handle("tool"), app("tool", &["core"]));
    let core = ProjectState::new(handle("core"), library("core", &[]));
    let mut edge = edge_of(&consumer, "core");
    let mut parents = vec![Arc::downgrade(&bystander)];

    edge.set_resolved(&core, &mut parents).unwrap();
    assert_eq!(parents.len(), 2);

    let closed = edge.close(&mut parents).unwrap();
    assert!(std::ptr::eq(closed.as_ptr(), Arc::as_ptr(&core)));
    assert!(!edge.is_resolved());
    assert_eq!(parents.len(), 1);
    assert!(Arc::ptr_eq(&parents[0].upgrade().unwrap(), &bystander));

    // Closing an unresolved edge is a no-op
    assert!(edge.close(&mut parents).is_none());
    assert_eq!(parents.len(), 1);
}

#[test]
fn test_update_identity_only_before_resolution() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let renamed = ProjectState::new(handle("core2"), library("core2", &[]));
    let mut edge = edge_of(&consumer, "core");

    edge.update_identity(id("core2")).unwrap();
    assert_eq!(edge.identity(), &id("core2"));

    let mut parents = Vec::new();
    edge.set_resolved(&renamed, &mut parents).unwrap();
    assert_eq!(
        edge.update_identity(id("core3")),
        Err(LibraryError::AlreadyResolved {
            identity: id("core2")
        })
    );
}

#[test]
fn test_equality_rules() {
    let consumer = ProjectState::new(handle("app"), app("app", &["core"]));
    let other_consumer = ProjectState::new(handle("tool"), app("tool", &["core"]));
    let core = ProjectState::new(handle("core"), library("core", &[]));

    // Same identity and parent
    assert_eq!(edge_of(&consumer, "core"), edge_of(&consumer, "core"));
    // Same identity, different parent, unresolved
    assert_ne!(edge_of(&consumer, "core"), edge_of(&other_consumer, "core"));

    // Different parents resolved to the same module compare equal
    let mut a = edge_of(&consumer, "core");
    let mut b = edge_of(&other_consumer, "core");
    let mut parents = Vec::new();
    a.set_resolved(&core, &mut parents).unwrap();
    b.set_resolved(&core, &mut parents).unwrap();
    assert_eq!(a, b);

    // Against a bare handle, only the resolved side matches
    assert!(a == handle("core"));
    assert!(edge_of(&consumer, "core") != handle("core"));

    // Same for a bare identity
    assert!(a == id("core"));
    assert!(a != id("other"));
    assert!(edge_of(&consumer, "core") != id("core"));
}
