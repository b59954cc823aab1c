//! Library edges
//!
//! A [`LibraryState`] is one declared library dependency of a consuming
//! module. It names its target by [`Identity`] until resolved, then observes
//! the target's [`ProjectState`] through a non-owning reference. The parent
//! pointer is non-owning as well: the registry is the only owner of states.

use super::project::ProjectState;
use crate::primitives::{Identity, ModuleHandle};
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Edge state transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("Library {expected} cannot be resolved to module with identity {found}")]
    IdentityMismatch { expected: Identity, found: Identity },

    #[error("Library {identity} is already resolved")]
    AlreadyResolved { identity: Identity },

    #[error("Library {identity} is already declared")]
    DuplicateLibrary { identity: Identity },
}

/// Directed edge from a consuming module to one declared library
#[derive(Debug, Clone)]
pub struct LibraryState {
    parent: Weak<ProjectState>,
    identity: Identity,
    resolved: Option<Weak<ProjectState>>,
}

impl LibraryState {
    pub(crate) fn new(parent: Weak<ProjectState>, identity: Identity) -> Self {
        Self {
            parent,
            identity,
            resolved: None,
        }
    }

    /// Declared target identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The consuming module, if it is still alive
    pub fn parent(&self) -> Option<Arc<ProjectState>> {
        self.parent.upgrade()
    }

    /// The library module this edge resolved to
    pub fn resolved(&self) -> Option<Arc<ProjectState>> {
        self.resolved.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Whether this edge currently points at `state`
    pub fn resolves_to(&self, state: &ProjectState) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|r| std::ptr::eq(r.as_ptr(), state))
    }

    pub(crate) fn is_owned_by(&self, state: &ProjectState) -> bool {
        std::ptr::eq(self.parent.as_ptr(), state)
    }

    /// Replace the declared identity. Only legal before resolution.
    pub fn update_identity(&mut self, identity: Identity) -> Result<(), LibraryError> {
        if self.resolved.is_some() {
            return Err(LibraryError::AlreadyResolved {
                identity: self.identity.clone(),
            });
        }
        self.identity = identity;
        Ok(())
    }

    /// Link this edge to `candidate`.
    ///
    /// `candidate_parents` is the candidate's reverse-edge list, borrowed from
    /// under the candidate's lock; the parent is added to it so that both
    /// directions change together. The caller rebuilds the parent's closure
    /// once the locks are released.
    pub(crate) fn set_resolved(
        &mut self,
        candidate: &Arc<ProjectState>,
        candidate_parents: &mut Vec<Weak<ProjectState>>,
    ) -> Result<(), LibraryError> {
        if self.resolved.is_some() {
            return Err(LibraryError::AlreadyResolved {
                identity: self.identity.clone(),
            });
        }
        if candidate.identity() != &self.identity {
            return Err(LibraryError::IdentityMismatch {
                expected: self.identity.clone(),
                found: candidate.identity().clone(),
            });
        }

        self.resolved = Some(Arc::downgrade(candidate));
        if !candidate_parents.iter().any(|p| Weak::ptr_eq(p, &self.parent)) {
            candidate_parents.push(self.parent.clone());
        }
        Ok(())
    }

    /// Revert to unresolved, unlinking the parent from the library's
    /// reverse-edge list. Returns the library the edge pointed at.
    pub(crate) fn close(
        &mut self,
        library_parents: &mut Vec<Weak<ProjectState>>,
    ) -> Option<Weak<ProjectState>> {
        let resolved = self.resolved.take()?;
        library_parents.retain(|p| !Weak::ptr_eq(p, &self.parent));
        Some(resolved)
    }
}

impl PartialEq for LibraryState {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(mine), Some(theirs)) = (&self.resolved, &other.resolved) {
            if Weak::ptr_eq(mine, theirs) {
                return true;
            }
        }
        self.identity == other.identity && Weak::ptr_eq(&self.parent, &other.parent)
    }
}

impl PartialEq<ModuleHandle> for LibraryState {
    fn eq(&self, handle: &ModuleHandle) -> bool {
        self.resolved().is_some_and(|r| r.handle() == handle)
    }
}

impl PartialEq<Identity> for LibraryState {
    fn eq(&self, identity: &Identity) -> bool {
        self.resolved().is_some_and(|r| r.identity() == identity)
    }
}

#[cfg(test)]
mod tests {
    include!("library.test.rs");
}
