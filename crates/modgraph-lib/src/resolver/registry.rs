//! Workspace-wide module registry
//!
//! [`ProjectRegistry`] is the single owner of every open [`ProjectState`]:
//! a concurrent `handle -> state` table plus the lighter `handle -> profile`
//! table used before a state exists. It drives open/close reconciliation and
//! answers the cross-module queries used by the build layer.
//!
//! The registry is an ordinary value. Create one per workspace and pass it
//! to whoever needs it.

use super::graph::WorkspaceGraph;
use super::library::{LibraryError, LibraryState};
use super::listener::{BuildEventListener, ListenerSet};
use super::profile::{
    BuildToolsError, ModuleConfigProvider, ModuleProfile, TargetEvent, TargetProvider,
};
use super::project::{LibraryDifference, ProjectState};
use crate::primitives::{Identity, ModuleHandle};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registry failures
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Query against a module the registry never opened
    #[error("Module not registered: {handle}")]
    NotRegistered { handle: ModuleHandle },

    #[error("No profile registered for module: {handle}")]
    MissingProfile { handle: ModuleHandle },

    #[error("Failed to load configuration for module {handle}: {source}")]
    Provider {
        handle: ModuleHandle,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Registry of open modules
#[derive(Default)]
pub struct ProjectRegistry {
    states: DashMap<ModuleHandle, Arc<ProjectState>>,
    profiles: DashMap<ModuleHandle, ModuleProfile>,
    listeners: ListenerSet,
    targets: Option<Arc<dyn TargetProvider>>,
}

impl ProjectRegistry {
    /// Empty registry, as at workspace start
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind SDK targets and build tools through `provider` when modules open
    pub fn with_target_provider(mut self, provider: Arc<dyn TargetProvider>) -> Self {
        self.targets = Some(provider);
        self
    }

    pub fn add_listener(&self, listener: Arc<dyn BuildEventListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn BuildEventListener>) -> bool {
        self.listeners.remove(listener)
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Record a module's profile ahead of opening it
    pub fn register_profile(&self, handle: ModuleHandle, profile: ModuleProfile) {
        self.profiles.insert(handle, profile);
    }

    pub fn profile(&self, handle: &ModuleHandle) -> Option<ModuleProfile> {
        self.profiles.get(handle).map(|p| p.value().clone())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open a module. Idempotent: an already open handle returns its
    /// existing state untouched.
    pub fn open(&self, handle: ModuleHandle, profile: ModuleProfile) -> Arc<ProjectState> {
        if let Some(existing) = self.find(&handle) {
            return existing;
        }

        // Fully initialise before the state becomes visible to other scans
        let candidate = ProjectState::new(handle.clone(), profile.clone());
        self.bind_target(&candidate);
        let build_tools_status = self.bind_build_tools(&candidate);

        let state = match self.states.entry(handle.clone()) {
            Entry::Occupied(entry) => return entry.get().clone(),
            Entry::Vacant(entry) => {
                entry.insert(candidate.clone());
                candidate
            }
        };
        self.profiles.insert(handle, profile);

        info!(
            module = %state.handle(),
            identity = %state.identity(),
            libraries = state.libraries().len(),
            library = state.is_library(),
            "Module opened"
        );

        let others = self.states();
        for other in &others {
            if !Arc::ptr_eq(other, &state) && other.identity() == state.identity() {
                warn!(
                    identity = %state.identity(),
                    module = %state.handle(),
                    other = %other.handle(),
                    "Identity collision: library resolution for this identity is ambiguous"
                );
            }
        }

        state.scan_libraries(&others, &self.listeners);

        if let Some(status) = build_tools_status {
            let message = status.err().map(|e| e.to_string());
            self.listeners.on_build_tools_status(&state, message.as_deref());
        }
        self.listeners.on_project_opened(&state);
        state
    }

    /// Open a module whose profile was registered beforehand
    pub fn open_registered(&self, handle: &ModuleHandle) -> Result<Arc<ProjectState>, RegistryError> {
        if let Some(existing) = self.find(handle) {
            return Ok(existing);
        }
        let profile = self
            .profile(handle)
            .ok_or_else(|| RegistryError::MissingProfile {
                handle: handle.clone(),
            })?;
        Ok(self.open(handle.clone(), profile))
    }

    /// Open a module, asking `provider` for its profile
    pub fn open_with_provider(
        &self,
        handle: &ModuleHandle,
        provider: &dyn ModuleConfigProvider,
    ) -> Result<Arc<ProjectState>, RegistryError> {
        if let Some(existing) = self.find(handle) {
            return Ok(existing);
        }
        let profile = provider
            .load_profile(handle)
            .map_err(|source| RegistryError::Provider {
                handle: handle.clone(),
                source,
            })?;
        Ok(self.open(handle.clone(), profile))
    }

    /// Close a module. Consumers of it see their edge revert to pending and
    /// the libraries it consumed lose it as a parent.
    pub fn close(&self, handle: &ModuleHandle) -> Option<Arc<ProjectState>> {
        let (_, state) = self.states.remove(handle)?;
        self.profiles.remove(handle);

        let consumers = state.mark_closed();
        for consumer in &consumers {
            if consumer.close_library(&state).is_some() {
                self.listeners.on_dependency_lost(consumer, &state);
                self.resolve_pending(consumer, &state);
            }
        }

        let orphaned = state.release_libraries();
        info!(
            module = %handle,
            consumers = consumers.len(),
            libraries = orphaned.len(),
            "Module closed"
        );
        self.listeners.on_project_removed(&state, &orphaned);
        Some(state)
    }

    /// Close every module (workspace teardown)
    pub fn clear(&self) {
        for handle in self.handles() {
            self.close(&handle);
        }
        self.profiles.clear();
    }

    /// Re-read a module's profile. Same identity reconciles the declared
    /// libraries in place; a new identity closes and reopens the module.
    pub fn reload(
        &self,
        handle: &ModuleHandle,
        profile: ModuleProfile,
    ) -> Result<LibraryDifference, RegistryError> {
        let state = self.get(handle)?;

        if state.identity() != &profile.identity {
            debug!(
                module = %handle,
                from = %state.identity(),
                to = %profile.identity,
                "Identity changed; reopening module"
            );
            let difference = LibraryDifference {
                added: profile.libraries.clone(),
                removed: state.libraries().iter().map(|l| l.identity().clone()).collect(),
            };
            self.close(handle);
            self.open(handle.clone(), profile);
            return Ok(difference);
        }

        let was_library = state.is_library();
        let difference = state.reconcile_libraries(&profile.libraries);
        state.set_profile(profile.clone());
        self.profiles.insert(handle.clone(), profile);

        if was_library && !state.is_library() {
            for consumer in state.parent_projects() {
                if consumer.close_library(&state).is_some() {
                    self.listeners.on_dependency_lost(&consumer, &state);
                    self.resolve_pending(&consumer, &state);
                }
            }
        }

        self.bind_target(&state);
        if let Some(status) = self.bind_build_tools(&state) {
            let message = status.err().map(|e| e.to_string());
            self.listeners.on_build_tools_status(&state, message.as_deref());
        }

        state.scan_libraries(&self.states(), &self.listeners);
        Ok(difference)
    }

    /// Point a pending library edge of `handle` at a different identity and
    /// try to resolve it against the open modules.
    pub fn retarget_library(
        &self,
        handle: &ModuleHandle,
        current: &Identity,
        identity: Identity,
    ) -> Result<Option<LibraryState>, RegistryError> {
        let state = self.get(handle)?;
        let Some(edge) = state.update_library_identity(current, identity)? else {
            return Ok(None);
        };

        for other in self.states() {
            if Arc::ptr_eq(&other, &state) || !other.is_library() {
                continue;
            }
            if let Some(resolved) = state.needs(&other) {
                self.listeners.on_dependency_resolved(&state, &other);
                return Ok(Some(resolved));
            }
        }
        Ok(Some(edge))
    }

    /// Offer the open libraries other than `skip`, in handle order, to the
    /// pending edges of `consumer` after one of its edges reverted.
    fn resolve_pending(&self, consumer: &Arc<ProjectState>, skip: &ProjectState) {
        let mut others = self.states();
        others.sort_by(|a, b| a.handle().cmp(b.handle()));

        for other in others {
            if Arc::ptr_eq(&other, consumer) || std::ptr::eq(other.as_ref(), skip) || !other.is_library() {
                continue;
            }
            if consumer.needs(&other).is_some() {
                self.listeners.on_dependency_resolved(consumer, &other);
            }
            if !consumer.is_missing_libraries() {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// State for `handle`. Asking for a module that was never opened is a
    /// caller bug and the only query that fails.
    pub fn get(&self, handle: &ModuleHandle) -> Result<Arc<ProjectState>, RegistryError> {
        self.find(handle).ok_or_else(|| RegistryError::NotRegistered {
            handle: handle.clone(),
        })
    }

    pub fn find(&self, handle: &ModuleHandle) -> Option<Arc<ProjectState>> {
        self.states.get(handle).map(|s| s.value().clone())
    }

    pub fn contains(&self, handle: &ModuleHandle) -> bool {
        self.states.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Snapshot of every open state
    pub fn states(&self) -> Vec<Arc<ProjectState>> {
        self.states.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Sorted handles of every open module
    pub fn handles(&self) -> Vec<ModuleHandle> {
        let mut handles: Vec<ModuleHandle> =
            self.states.iter().map(|entry| entry.key().clone()).collect();
        handles.sort();
        handles
    }

    /// Every edge, across all open modules, currently resolved to `handle`
    pub fn find_libraries(&self, handle: &ModuleHandle) -> Vec<LibraryState> {
        match self.find(handle) {
            Some(target) => self.edges_resolved_to(&target),
            None => Vec::new(),
        }
    }

    fn edges_resolved_to(&self, target: &ProjectState) -> Vec<LibraryState> {
        self.states()
            .iter()
            .flat_map(|state| state.libraries())
            .filter(|library| library.resolves_to(target))
            .collect()
    }

    /// Modules depending on `handle` directly or through other libraries
    pub fn main_projects_for(&self, handle: &ModuleHandle) -> HashSet<Arc<ProjectState>> {
        let mut result = HashSet::new();
        let Some(root) = self.find(handle) else {
            return result;
        };

        let mut queue = VecDeque::from([root.clone()]);
        while let Some(library) = queue.pop_front() {
            for edge in self.edges_resolved_to(&library) {
                let Some(consumer) = edge.parent() else {
                    continue;
                };
                if Arc::ptr_eq(&consumer, &root) {
                    continue;
                }
                if result.insert(consumer.clone()) && consumer.is_library() {
                    queue.push_back(consumer);
                }
            }
        }

        result
    }

    /// Priority-ordered library closure of `handle`; empty when unknown
    pub fn resolved_library_projects(&self, handle: &ModuleHandle) -> Vec<Arc<ProjectState>> {
        self.find(handle)
            .map(|state| state.full_library_projects())
            .unwrap_or_default()
    }

    pub fn is_missing_libraries(&self, handle: &ModuleHandle) -> bool {
        self.find(handle)
            .is_some_and(|state| state.is_missing_libraries())
    }

    pub fn pending_libraries(&self, handle: &ModuleHandle) -> Vec<Identity> {
        self.find(handle)
            .map(|state| state.pending_libraries())
            .unwrap_or_default()
    }

    /// Identities claimed by more than one open module
    pub fn identity_collisions(&self) -> BTreeMap<Identity, Vec<ModuleHandle>> {
        let mut by_identity: BTreeMap<Identity, Vec<ModuleHandle>> = BTreeMap::new();
        for state in self.states() {
            by_identity
                .entry(state.identity().clone())
                .or_default()
                .push(state.handle().clone());
        }
        by_identity.retain(|_, handles| {
            handles.sort();
            handles.len() > 1
        });
        by_identity
    }

    /// Graph snapshot of open modules and resolved edges
    pub fn dependency_graph(&self) -> WorkspaceGraph {
        WorkspaceGraph::from_states(&self.states())
    }

    // ------------------------------------------------------------------
    // Target binding
    // ------------------------------------------------------------------

    /// Drop and re-resolve every module's SDK target. Library edges are
    /// not touched.
    pub fn refresh(&self) {
        for state in self.states() {
            state.set_target(None);
            self.bind_target(&state);
        }
        debug!(modules = self.len(), "Targets refreshed");
    }

    /// React to an SDK target being loaded or unloaded
    pub fn on_target_binding_event(&self, event: TargetEvent) {
        match event {
            TargetEvent::Loaded(hash) => {
                for state in self.states() {
                    if state.target().is_none() && state.profile().target.as_deref() == Some(hash.as_str()) {
                        self.bind_target(&state);
                    }
                }
            }
            TargetEvent::Unloaded(hash) => {
                for state in self.states() {
                    if state.target().is_some_and(|t| t.hash == hash) {
                        state.set_target(None);
                    }
                }
            }
        }
    }

    fn bind_target(&self, state: &ProjectState) {
        let Some(provider) = &self.targets else {
            return;
        };
        let target = state
            .profile()
            .target
            .and_then(|hash| provider.resolve_target(&hash));
        state.set_target(target);
    }

    /// `None` when no provider is configured, otherwise the lookup outcome
    fn bind_build_tools(&self, state: &ProjectState) -> Option<Result<(), BuildToolsError>> {
        let provider = self.targets.as_ref()?;
        let revision = state.profile().build_tools;
        match provider.resolve_build_tools(revision.as_deref()) {
            Ok(info) => {
                state.set_build_tools(Some(info));
                Some(Ok(()))
            }
            Err(error) => {
                warn!(module = %state.handle(), %error, "Build tools unavailable");
                state.set_build_tools(None);
                Some(Err(error))
            }
        }
    }
}

impl std::fmt::Debug for ProjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("modules", &self.states.len())
            .field("profiles", &self.profiles.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    include!("registry.test.rs");
}
