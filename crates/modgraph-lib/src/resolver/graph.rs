//! Dependency graph snapshot with cycle detection and build ordering
//!
//! A [`WorkspaceGraph`] is a point-in-time copy of the open modules and their
//! resolved library edges, built on petgraph. It backs diagnostics: cycle
//! reports and a libraries-first build order.

use super::project::ProjectState;
use crate::primitives::{Identity, ModuleHandle};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors that can occur while querying the graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Module not found in graph: {handle}")]
    NodeNotFound { handle: ModuleHandle },
}

/// A module in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub handle: ModuleHandle,
    pub identity: Identity,
    pub is_library: bool,
}

/// Directed graph of resolved library edges
#[derive(Debug, Default)]
pub struct WorkspaceGraph {
    /// Edges run from library to consumer, so a topological sort yields
    /// libraries before the modules that use them
    graph: DiGraph<GraphNode, ()>,
    node_map: HashMap<ModuleHandle, NodeIndex>,
}

impl WorkspaceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the resolved edges between `states`
    pub fn from_states(states: &[Arc<ProjectState>]) -> Self {
        let mut graph = Self::new();
        for state in states {
            graph.add_node(GraphNode {
                handle: state.handle().clone(),
                identity: state.identity().clone(),
                is_library: state.is_library(),
            });
        }

        for state in states {
            for library in state.libraries() {
                let Some(target) = library.resolved() else {
                    continue;
                };
                // Targets outside the snapshot were closed mid-read
                if graph.contains(target.handle()) {
                    let _ = graph.add_dependency(state.handle(), target.handle());
                }
            }
        }

        graph
    }

    /// Add a module (idempotent)
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node.handle) {
            trace!("Node already exists: {}", node.handle);
            return idx;
        }

        let handle = node.handle.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(handle, idx);
        idx
    }

    /// Record that `consumer` uses `library`
    pub fn add_dependency(
        &mut self,
        consumer: &ModuleHandle,
        library: &ModuleHandle,
    ) -> Result<(), GraphError> {
        let consumer_idx = self.index_of(consumer)?;
        let library_idx = self.index_of(library)?;
        self.graph.update_edge(library_idx, consumer_idx, ());
        Ok(())
    }

    fn index_of(&self, handle: &ModuleHandle) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(handle)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound {
                handle: handle.clone(),
            })
    }

    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// One cycle, as module handles in edge order, if any exists
    pub fn detect_cycle(&self) -> Option<Vec<ModuleHandle>> {
        if !self.has_cycles() {
            return None;
        }

        let mut finished = HashSet::new();
        let mut stack = Vec::new();

        for node_idx in self.graph.node_indices() {
            if !finished.contains(&node_idx) {
                if let Some(cycle) = self.dfs_cycle_detect(node_idx, &mut finished, &mut stack) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        finished: &mut HashSet<NodeIndex>,
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<ModuleHandle>> {
        stack.push(node);

        for neighbor in self.graph.neighbors(node) {
            if let Some(pos) = stack.iter().position(|&n| n == neighbor) {
                return Some(
                    stack[pos..]
                        .iter()
                        .map(|&idx| self.graph[idx].handle.clone())
                        .collect(),
                );
            }
            if !finished.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, finished, stack) {
                    return Some(cycle);
                }
            }
        }

        stack.pop();
        finished.insert(node);
        None
    }

    /// Libraries before their consumers. Fails on cycles.
    pub fn build_order(&self) -> Result<Vec<GraphNode>, GraphError> {
        if let Some(cycle) = self.detect_cycle() {
            return Err(GraphError::CircularDependency {
                cycle: cycle
                    .iter()
                    .map(ModuleHandle::as_str)
                    .collect::<Vec<_>>()
                    .join(" → "),
            });
        }

        let sorted = toposort(&self.graph, None).map_err(|_| GraphError::CircularDependency {
            cycle: "unknown".to_string(),
        })?;

        Ok(sorted
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Libraries `handle` uses directly
    pub fn dependencies(&self, handle: &ModuleHandle) -> Option<Vec<GraphNode>> {
        let idx = self.node_map.get(handle)?;
        Some(
            self.graph
                .neighbors_directed(*idx, Direction::Incoming)
                .map(|n| self.graph[n].clone())
                .collect(),
        )
    }

    /// Modules using `handle` directly
    pub fn dependents(&self, handle: &ModuleHandle) -> Option<Vec<GraphNode>> {
        let idx = self.node_map.get(handle)?;
        Some(
            self.graph
                .neighbors_directed(*idx, Direction::Outgoing)
                .map(|n| self.graph[n].clone())
                .collect(),
        )
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, handle: &ModuleHandle) -> bool {
        self.node_map.contains_key(handle)
    }

    pub fn node(&self, handle: &ModuleHandle) -> Option<&GraphNode> {
        let idx = self.node_map.get(handle)?;
        Some(&self.graph[*idx])
    }
}

#[cfg(test)]
mod tests {
    include!("graph.test.rs");
}
