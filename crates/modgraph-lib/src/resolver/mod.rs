//! # Resolver
//!
//! Incremental library resolution for a multi-module workspace.
//!
//! ## Modules
//!
//! - [`library`] - Library edges (`LibraryState`)
//! - [`project`] - Per-module state and library closure (`ProjectState`)
//! - [`registry`] - Workspace-wide open/close reconciliation (`ProjectRegistry`)
//! - [`listener`] - Outbound build events
//! - [`profile`] - Module profiles and external provider contracts
//! - [`graph`] - petgraph snapshot for cycle reports and build order

pub mod graph;
pub mod library;
pub mod listener;
pub mod profile;
pub mod project;
pub mod registry;

pub use graph::{GraphError, GraphNode, WorkspaceGraph};
pub use library::{LibraryError, LibraryState};
pub use listener::{BuildEventListener, ListenerSet, TracingListener};
#[cfg(any(test, feature = "test-utils"))]
pub use listener::{RecordedEvent, RecordingListener};
pub use profile::{
    BuildToolsError, BuildToolsInfo, ManifestInfo, ModuleConfigProvider, ModuleProfile,
    StaticTargetProvider, TargetBinding, TargetEvent, TargetProvider,
};
pub use project::{LibraryDifference, ProjectState};
pub use registry::{ProjectRegistry, RegistryError};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared builders for resolver unit tests

    use super::*;
    use crate::primitives::{Identity, ModuleHandle};
    use std::sync::Arc;

    pub fn id(artifact: &str) -> Identity {
        Identity::new("com.example", artifact)
    }

    pub fn handle(name: &str) -> ModuleHandle {
        ModuleHandle::new(name)
    }

    /// Library module `name` declaring `libraries`
    pub fn library(name: &str, libraries: &[&str]) -> ModuleProfile {
        ModuleProfile::new(id(name))
            .library()
            .with_libraries(libraries.iter().map(|l| id(l)))
    }

    /// Application module `name` declaring `libraries`
    pub fn app(name: &str, libraries: &[&str]) -> ModuleProfile {
        ModuleProfile::new(id(name)).with_libraries(libraries.iter().map(|l| id(l)))
    }

    pub fn handles(states: &[Arc<ProjectState>]) -> Vec<String> {
        states.iter().map(|s| s.handle().to_string()).collect()
    }

    pub fn sorted_handles<'a, I>(states: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Arc<ProjectState>>,
    {
        let mut names: Vec<String> = states.into_iter().map(|s| s.handle().to_string()).collect();
        names.sort();
        names
    }
}
