// Tests for the workspace graph snapshot

use super::*;
use crate::resolver::fixtures::{app, handle, id, library};

// ============================================================================
// Test Utilities
// ============================================================================

fn node(name: &str, is_library: bool) -> GraphNode {
    GraphNode {
        handle: handle(name),
        identity: id(name),
        is_library,
    }
}

/// Graph from `(consumer, library)` pairs; every name becomes a library node
fn graph_of(names: &[&str], edges: &[(&str, &str)]) -> WorkspaceGraph {
    let mut graph = WorkspaceGraph::new();
    for name in names {
        graph.add_node(node(name, true));
    }
    for (consumer, library) in edges {
        graph
            .add_dependency(&handle(consumer), &handle(library))
            .unwrap();
    }
    graph
}

fn names(nodes: &[GraphNode]) -> Vec<String> {
    let mut names: Vec<String> = nodes.iter().map(|n| n.handle.to_string()).collect();
    names.sort();
    names
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_add_node_is_idempotent() {
    let mut graph = WorkspaceGraph::new();
    let first = graph.add_node(node("a", false));
    let second = graph.add_node(node("a", true));

    assert_eq!(first, second);
    assert_eq!(graph.node_count(), 1);
    assert!(!graph.node(&handle("a")).unwrap().is_library);
}

#[test]
fn test_add_dependency_requires_both_nodes() {
    let mut graph = graph_of(&["a"], &[]);
    let err = graph
        .add_dependency(&handle("a"), &handle("missing"))
        .unwrap_err();

    assert!(matches!(err, GraphError::NodeNotFound { .. }));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_duplicate_edges_collapse() {
    let graph = graph_of(&["a", "b"], &[("a", "b"), ("a", "b")]);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_from_states_only_uses_resolved_edges() {
    let a = ProjectState::new(handle("a"), app("a", &["b", "missing"]));
    let b = ProjectState::new(handle("b"), library("b", &[]));
    a.needs(&b);

    let graph = WorkspaceGraph::from_states(&[a.clone(), b.clone()]);

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(names(&graph.dependencies(&handle("a")).unwrap()), vec!["b"]);
    assert_eq!(names(&graph.dependents(&handle("b")).unwrap()), vec!["a"]);
    assert!(graph.node(&handle("b")).unwrap().is_library);
}

#[test]
fn test_from_states_skips_targets_outside_snapshot() {
    let a = ProjectState::new(handle("a"), app("a", &["b"]));
    let b = ProjectState::new(handle("b"), library("b", &[]));
    a.needs(&b);

    let graph = WorkspaceGraph::from_states(&[a]);
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_dependencies_and_dependents() {
    let graph = graph_of(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d")]);

    assert_eq!(names(&graph.dependencies(&handle("a")).unwrap()), vec!["b", "c"]);
    assert_eq!(names(&graph.dependents(&handle("d")).unwrap()), vec!["b"]);
    assert!(graph.dependents(&handle("a")).unwrap().is_empty());
    assert!(graph.dependencies(&handle("ghost")).is_none());
}

#[test]
fn test_build_order_puts_libraries_first() {
    let graph = graph_of(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d")]);

    let order: Vec<String> = graph
        .build_order()
        .unwrap()
        .into_iter()
        .map(|n| n.handle.to_string())
        .collect();
    let pos = |name: &str| order.iter().position(|h| h == name).unwrap();

    assert_eq!(order.len(), 4);
    assert!(pos("d") < pos("b"));
    assert!(pos("b") < pos("a"));
    assert!(pos("c") < pos("a"));
}

// ============================================================================
// Cycles
// ============================================================================

#[test]
fn test_acyclic_graph_has_no_cycle() {
    let graph = graph_of(&["a", "b"], &[("a", "b")]);
    assert!(!graph.has_cycles());
    assert!(graph.detect_cycle().is_none());
}

#[test]
fn test_detect_cycle_returns_members() {
    let graph = graph_of(
        &["app", "a", "b", "c"],
        &[("app", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
    );

    assert!(graph.has_cycles());
    let mut cycle: Vec<String> = graph
        .detect_cycle()
        .unwrap()
        .iter()
        .map(|h| h.to_string())
        .collect();
    cycle.sort();
    assert_eq!(cycle, vec!["a", "b", "c"]);
}

#[test]
fn test_build_order_fails_on_cycle() {
    let graph = graph_of(&["a", "b"], &[("a", "b"), ("b", "a")]);

    match graph.build_order() {
        Err(GraphError::CircularDependency { cycle }) => {
            assert!(cycle.contains('a'));
            assert!(cycle.contains('b'));
            assert!(cycle.contains('→'));
        }
        other => panic!("Expected CircularDependency, got {:?}", other),
    }
}
