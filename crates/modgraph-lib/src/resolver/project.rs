//! Per-module resolver state
//!
//! A [`ProjectState`] holds one open module's declared library edges, the
//! reverse edges from modules consuming it, and a cached priority-ordered
//! closure of its libraries. Edges live behind a per-module lock; when an
//! operation must touch two modules at once both locks are taken in address
//! order. The closure and the pending list are published as immutable
//! snapshots, so readers never see a half-built list.

use super::library::{LibraryError, LibraryState};
use super::listener::BuildEventListener;
use super::profile::{BuildToolsInfo, ManifestInfo, ModuleProfile, TargetBinding};
use crate::primitives::{Identity, ModuleHandle};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Edge lists guarded by the per-module lock
#[derive(Debug, Default)]
pub(crate) struct ProjectLinks {
    pub(crate) libraries: Vec<LibraryState>,
    pub(crate) parents: Vec<Weak<ProjectState>>,
}

/// Outcome of re-reading a module's declared libraries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryDifference {
    pub added: Vec<Identity>,
    pub removed: Vec<Identity>,
}

impl LibraryDifference {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// State of one open module
pub struct ProjectState {
    me: Weak<ProjectState>,
    handle: ModuleHandle,
    identity: Identity,
    profile: RwLock<ModuleProfile>,
    links: Mutex<ProjectLinks>,
    closed: AtomicBool,
    library_projects: RwLock<Arc<[Weak<ProjectState>]>>,
    pending: RwLock<Arc<[Identity]>>,
    rebuild: Mutex<()>,
    target: RwLock<Option<TargetBinding>>,
    build_tools: RwLock<Option<BuildToolsInfo>>,
}

impl ProjectState {
    /// Build a fully initialised state; every declared library starts pending.
    pub fn new(handle: ModuleHandle, profile: ModuleProfile) -> Arc<Self> {
        let declared = dedup_identities(&profile.libraries);
        Arc::new_cyclic(|me: &Weak<ProjectState>| {
            let libraries = declared
                .iter()
                .map(|identity| LibraryState::new(me.clone(), identity.clone()))
                .collect();

            Self {
                me: me.clone(),
                handle,
                identity: profile.identity.clone(),
                profile: RwLock::new(profile),
                links: Mutex::new(ProjectLinks {
                    libraries,
                    parents: Vec::new(),
                }),
                closed: AtomicBool::new(false),
                library_projects: RwLock::new(Arc::from(Vec::new())),
                pending: RwLock::new(Arc::from(declared)),
                rebuild: Mutex::new(()),
                target: RwLock::new(None),
                build_tools: RwLock::new(None),
            }
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn handle(&self) -> &ModuleHandle {
        &self.handle
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> ModuleProfile {
        self.profile.read().clone()
    }

    pub fn manifest(&self) -> ManifestInfo {
        self.profile.read().manifest.clone()
    }

    pub fn is_library(&self) -> bool {
        self.profile.read().is_library
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn target(&self) -> Option<TargetBinding> {
        self.target.read().clone()
    }

    pub fn build_tools(&self) -> Option<BuildToolsInfo> {
        self.build_tools.read().clone()
    }

    pub(crate) fn set_target(&self, target: Option<TargetBinding>) {
        *self.target.write() = target;
    }

    pub(crate) fn set_build_tools(&self, build_tools: Option<BuildToolsInfo>) {
        *self.build_tools.write() = build_tools;
    }

    /// Replace the profile of a module whose identity did not change.
    /// Declared libraries are reconciled separately.
    pub(crate) fn set_profile(&self, profile: ModuleProfile) {
        debug_assert_eq!(profile.identity, self.identity);
        *self.profile.write() = profile;
    }

    /// Snapshot of every declared edge, in declaration order
    pub fn libraries(&self) -> Vec<LibraryState> {
        self.links.lock().libraries.clone()
    }

    pub fn has_libraries(&self) -> bool {
        !self.links.lock().libraries.is_empty()
    }

    /// The declared edge for `identity`
    pub fn library(&self, identity: &Identity) -> Option<LibraryState> {
        self.links
            .lock()
            .libraries
            .iter()
            .find(|l| l.identity() == identity)
            .cloned()
    }

    /// The edge currently resolved to the module behind `handle`
    pub fn library_for(&self, handle: &ModuleHandle) -> Option<LibraryState> {
        self.links
            .lock()
            .libraries
            .iter()
            .find(|l| **l == *handle)
            .cloned()
    }

    /// Declared identities that no open module has satisfied yet
    pub fn pending_libraries(&self) -> Vec<Identity> {
        self.pending.read().to_vec()
    }

    pub fn is_missing_libraries(&self) -> bool {
        !self.pending.read().is_empty()
    }

    /// Modules that declared this module as a library (direct reverse edges)
    pub fn parent_projects(&self) -> Vec<Arc<ProjectState>> {
        self.links
            .lock()
            .parents
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Resolved library closure, highest resource-merge priority first
    pub fn full_library_projects(&self) -> Vec<Arc<ProjectState>> {
        self.library_projects
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Transitive closure over reverse edges
    pub fn full_parent_projects(&self) -> HashSet<Arc<ProjectState>> {
        let mut result: HashSet<Arc<ProjectState>> = HashSet::new();
        let mut stack = self.parent_projects();

        while let Some(parent) = stack.pop() {
            if std::ptr::eq(parent.as_ref(), self) {
                continue;
            }
            if result.insert(parent.clone()) {
                stack.extend(parent.parent_projects());
            }
        }

        result
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the first pending edge whose identity matches `candidate`.
    ///
    /// Already-resolved edges are skipped, so repeated calls are no-ops.
    pub fn needs(&self, candidate: &Arc<ProjectState>) -> Option<LibraryState> {
        if std::ptr::eq(self, candidate.as_ref()) {
            return None;
        }

        let resolved = {
            let (mut mine, mut theirs) = lock_pair(self, candidate);
            if self.is_closed() || candidate.is_closed() {
                return None;
            }

            let library = mine
                .libraries
                .iter_mut()
                .find(|l| !l.is_resolved() && l.identity() == candidate.identity())?;

            if let Err(e) = library.set_resolved(candidate, &mut theirs.parents) {
                debug!(consumer = %self.handle, error = %e, "Library resolution rejected");
                return None;
            }
            let snapshot = library.clone();
            self.publish_pending(&mine);
            snapshot
        };

        debug!(
            consumer = %self.handle,
            library = %candidate.handle,
            identity = %candidate.identity,
            "Library resolved"
        );
        self.refresh_library_closures();
        Some(resolved)
    }

    /// Whether a resolved edge of this module points at `candidate`
    pub fn depends_on(&self, candidate: &ProjectState) -> bool {
        self.links
            .lock()
            .libraries
            .iter()
            .any(|l| l.resolves_to(candidate))
    }

    /// Offer a just-opened module to this module's pending edges.
    ///
    /// Only does work while something is pending. The closure is rebuilt by
    /// the match itself, so once nothing is pending the list is final.
    pub fn resolve(&self, newly_opened: &Arc<ProjectState>) -> Option<LibraryState> {
        if !self.is_missing_libraries() {
            return None;
        }

        let found = self.needs(newly_opened)?;
        if !self.is_missing_libraries() {
            trace!(module = %self.handle, "All libraries resolved");
        }
        Some(found)
    }

    /// Reconcile a newly registered module against every other known state,
    /// in both directions.
    pub fn scan_libraries(&self, others: &[Arc<ProjectState>], listener: &dyn BuildEventListener) {
        let Some(me) = self.me.upgrade() else {
            return;
        };

        if self.has_libraries() {
            for other in others {
                if Arc::ptr_eq(other, &me) || !other.is_library() {
                    continue;
                }
                if self.needs(other).is_some() {
                    listener.on_dependency_resolved(&me, other);
                }
            }
        }

        if self.is_library() {
            for other in others {
                if Arc::ptr_eq(other, &me) {
                    continue;
                }
                if other.resolve(&me).is_some() {
                    listener.on_library_found(&me, other);
                }
            }
        }
    }

    /// Revert the edge pointing at `library` to pending
    pub fn close_library(&self, library: &ProjectState) -> Option<LibraryState> {
        let closed = self.unlink_library(library)?;
        debug!(consumer = %self.handle, library = %library.handle, "Library edge reverted to pending");
        self.refresh_library_closures();
        Some(closed)
    }

    fn unlink_library(&self, library: &ProjectState) -> Option<LibraryState> {
        if std::ptr::eq(self, library) {
            return None;
        }

        let (mut mine, mut theirs) = lock_pair(self, library);
        let edge = mine
            .libraries
            .iter_mut()
            .find(|l| l.resolves_to(library))?;
        edge.close(&mut theirs.parents);
        let snapshot = edge.clone();
        self.publish_pending(&mine);
        Some(snapshot)
    }

    /// Detach every resolved edge of a closing module from its libraries.
    /// Returns the libraries that were detached.
    pub(crate) fn release_libraries(&self) -> Vec<Arc<ProjectState>> {
        let targets = self.resolved_library_targets();
        for target in &targets {
            self.unlink_library(target);
        }
        self.update_full_library_list();
        targets
    }

    /// Mark the state closed so no further edge can resolve to or from it,
    /// and return its current consumers.
    pub(crate) fn mark_closed(&self) -> Vec<Arc<ProjectState>> {
        let links = self.links.lock();
        self.closed.store(true, Ordering::Release);
        links.parents.iter().filter_map(Weak::upgrade).collect()
    }

    /// Replace the declared library list, keeping edges (resolved or not)
    /// whose identity is still declared.
    pub fn reconcile_libraries(&self, declared: &[Identity]) -> LibraryDifference {
        let declared = dedup_identities(declared);

        // Unlink resolved edges that are going away while both sides are locked
        let dropped: Vec<Arc<ProjectState>> = {
            let links = self.links.lock();
            links
                .libraries
                .iter()
                .filter(|l| !declared.contains(l.identity()))
                .filter_map(LibraryState::resolved)
                .collect()
        };
        for library in &dropped {
            self.unlink_library(library);
        }

        let (difference, stragglers) = {
            let mut links = self.links.lock();
            let mut existing = std::mem::take(&mut links.libraries);
            let mut next = Vec::with_capacity(declared.len());
            let mut added = Vec::new();

            for identity in &declared {
                match existing.iter().position(|l| l.identity() == identity) {
                    Some(pos) => next.push(existing.remove(pos)),
                    None => {
                        next.push(LibraryState::new(self.me.clone(), identity.clone()));
                        added.push(identity.clone());
                    }
                }
            }

            let removed = existing.iter().map(|l| l.identity().clone()).collect();
            // Edges that resolved between the unlink pass and now
            let stragglers: Vec<Arc<ProjectState>> =
                existing.iter().filter_map(LibraryState::resolved).collect();

            links.libraries = next;
            self.publish_pending(&links);
            (LibraryDifference { added, removed }, stragglers)
        };

        for library in stragglers {
            library
                .links
                .lock()
                .parents
                .retain(|p| !std::ptr::eq(p.as_ptr(), self));
        }

        if !difference.is_empty() {
            debug!(
                module = %self.handle,
                added = difference.added.len(),
                removed = difference.removed.len(),
                "Declared libraries changed"
            );
        }
        self.refresh_library_closures();
        difference
    }

    /// Change the identity of a still-pending edge
    pub fn update_library_identity(
        &self,
        current: &Identity,
        identity: Identity,
    ) -> Result<Option<LibraryState>, LibraryError> {
        let mut links = self.links.lock();
        if &identity != current && links.libraries.iter().any(|l| l.identity() == &identity) {
            return Err(LibraryError::DuplicateLibrary { identity });
        }
        let Some(edge) = links.libraries.iter_mut().find(|l| l.identity() == current) else {
            return Ok(None);
        };
        edge.update_identity(identity)?;
        let snapshot = edge.clone();
        self.publish_pending(&links);
        Ok(Some(snapshot))
    }

    // ------------------------------------------------------------------
    // Closure maintenance
    // ------------------------------------------------------------------

    /// Rebuild this module's closure and the closure of every module that
    /// consumes it, directly or transitively.
    pub fn refresh_library_closures(&self) {
        self.update_full_library_list();
        for parent in self.full_parent_projects() {
            parent.update_full_library_list();
        }
    }

    /// Recompute the cached library closure and publish it.
    ///
    /// Walk declared libraries last to first; expand each resolved library's
    /// own libraries first, then insert the library at the front unless it is
    /// already present. The result runs from highest to lowest merge priority.
    pub fn update_full_library_list(&self) {
        // Held across read and publish so the last publish sees the newest edges
        let _rebuild = self.rebuild.lock();

        let mut visited: HashSet<*const ProjectState> = HashSet::new();
        visited.insert(self as *const ProjectState);
        let mut closure: Vec<Arc<ProjectState>> = Vec::new();
        collect_library_closure(
            self,
            &self.resolved_library_targets(),
            &mut visited,
            &mut closure,
        );

        trace!(
            module = %self.handle,
            closure = ?closure.iter().map(|p| p.handle.as_str()).collect::<Vec<_>>(),
            "Library closure rebuilt"
        );

        let published: Vec<Weak<ProjectState>> = closure.iter().map(Arc::downgrade).collect();
        *self.library_projects.write() = Arc::from(published);
    }

    /// Resolved library targets in declaration order
    fn resolved_library_targets(&self) -> Vec<Arc<ProjectState>> {
        self.links
            .lock()
            .libraries
            .iter()
            .filter_map(LibraryState::resolved)
            .collect()
    }

    fn publish_pending(&self, links: &ProjectLinks) {
        let pending: Vec<Identity> = links
            .libraries
            .iter()
            .filter(|l| !l.is_resolved())
            .map(|l| l.identity().clone())
            .collect();
        *self.pending.write() = Arc::from(pending);
    }

    #[cfg(test)]
    pub(crate) fn parents_contain(&self, consumer: &ProjectState) -> bool {
        self.links
            .lock()
            .parents
            .iter()
            .any(|p| std::ptr::eq(p.as_ptr(), consumer))
    }
}

fn collect_library_closure(
    root: &ProjectState,
    libraries: &[Arc<ProjectState>],
    visited: &mut HashSet<*const ProjectState>,
    closure: &mut Vec<Arc<ProjectState>>,
) {
    for library in libraries.iter().rev() {
        // A revisit can only add what is already present, and skipping it
        // stops cyclic declarations from recursing forever.
        if visited.insert(Arc::as_ptr(library)) {
            let nested = library.resolved_library_targets();
            collect_library_closure(root, &nested, visited, closure);
        }

        if !std::ptr::eq(library.as_ref(), root) && !closure.iter().any(|p| Arc::ptr_eq(p, library))
        {
            closure.insert(0, library.clone());
        }
    }
}

/// Lock two distinct states' edges in address order
fn lock_pair<'a>(
    first: &'a ProjectState,
    second: &'a ProjectState,
) -> (MutexGuard<'a, ProjectLinks>, MutexGuard<'a, ProjectLinks>) {
    debug_assert!(!std::ptr::eq(first, second));
    if (first as *const ProjectState) < (second as *const ProjectState) {
        let a = first.links.lock();
        let b = second.links.lock();
        (a, b)
    } else {
        let b = second.links.lock();
        let a = first.links.lock();
        (a, b)
    }
}

fn dedup_identities(identities: &[Identity]) -> Vec<Identity> {
    let mut seen = HashSet::new();
    identities
        .iter()
        .filter(|identity| seen.insert(*identity))
        .cloned()
        .collect()
}

impl PartialEq for ProjectState {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ProjectState {}

impl Hash for ProjectState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const ProjectState).hash(state);
    }
}

impl std::fmt::Debug for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectState")
            .field("handle", &self.handle)
            .field("identity", &self.identity)
            .field("is_library", &self.is_library())
            .field("pending", &self.pending.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    include!("project.test.rs");
}
