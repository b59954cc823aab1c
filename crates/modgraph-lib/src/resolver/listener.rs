//! Outbound build events
//!
//! The registry reports every graph change through [`BuildEventListener`].
//! Callbacks run synchronously, after the change is committed and after all
//! module locks are released, so a listener may call back into the registry.

use super::project::ProjectState;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receiver of registry events. Every method defaults to a no-op.
pub trait BuildEventListener: Send + Sync {
    /// `consumer` just had one of its own pending libraries resolved to `library`
    fn on_dependency_resolved(&self, _consumer: &Arc<ProjectState>, _library: &Arc<ProjectState>) {}

    /// `library` just opened and satisfied a pending edge of `consumer`
    fn on_library_found(&self, _library: &Arc<ProjectState>, _consumer: &Arc<ProjectState>) {}

    /// `consumer` lost its resolved edge to `library`, which is now pending again
    fn on_dependency_lost(&self, _consumer: &Arc<ProjectState>, _library: &Arc<ProjectState>) {}

    fn on_project_opened(&self, _state: &Arc<ProjectState>) {}

    /// `state` was closed; `orphaned_libraries` are the libraries it consumed
    fn on_project_removed(
        &self,
        _state: &Arc<ProjectState>,
        _orphaned_libraries: &[Arc<ProjectState>],
    ) {
    }

    /// Build-tools lookup outcome for `state`; `None` means they are available
    fn on_build_tools_status(&self, _state: &Arc<ProjectState>, _message: Option<&str>) {}
}

/// Fan-out over registered listeners
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn BuildEventListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn BuildEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Remove by identity; returns whether it was registered
    pub fn remove(&self, listener: &Arc<dyn BuildEventListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    // Listeners may register further listeners from a callback, so never
    // dispatch while holding the list lock.
    fn snapshot(&self) -> Vec<Arc<dyn BuildEventListener>> {
        self.listeners.read().clone()
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("count", &self.len())
            .finish()
    }
}

impl BuildEventListener for ListenerSet {
    fn on_dependency_resolved(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
        for listener in self.snapshot() {
            listener.on_dependency_resolved(consumer, library);
        }
    }

    fn on_library_found(&self, library: &Arc<ProjectState>, consumer: &Arc<ProjectState>) {
        for listener in self.snapshot() {
            listener.on_library_found(library, consumer);
        }
    }

    fn on_dependency_lost(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
        for listener in self.snapshot() {
            listener.on_dependency_lost(consumer, library);
        }
    }

    fn on_project_opened(&self, state: &Arc<ProjectState>) {
        for listener in self.snapshot() {
            listener.on_project_opened(state);
        }
    }

    fn on_project_removed(&self, state: &Arc<ProjectState>, orphaned_libraries: &[Arc<ProjectState>]) {
        for listener in self.snapshot() {
            listener.on_project_removed(state, orphaned_libraries);
        }
    }

    fn on_build_tools_status(&self, state: &Arc<ProjectState>, message: Option<&str>) {
        for listener in self.snapshot() {
            listener.on_build_tools_status(state, message);
        }
    }
}

/// Listener that reports every event through `tracing`
#[derive(Debug, Default)]
pub struct TracingListener;

impl BuildEventListener for TracingListener {
    fn on_dependency_resolved(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
        debug!(consumer = %consumer.handle(), library = %library.handle(), "Dependency resolved");
    }

    fn on_library_found(&self, library: &Arc<ProjectState>, consumer: &Arc<ProjectState>) {
        debug!(library = %library.handle(), consumer = %consumer.handle(), "Library found");
    }

    fn on_dependency_lost(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
        debug!(consumer = %consumer.handle(), library = %library.handle(), "Dependency lost");
    }

    fn on_project_removed(&self, state: &Arc<ProjectState>, orphaned_libraries: &[Arc<ProjectState>]) {
        debug!(
            module = %state.handle(),
            orphaned = orphaned_libraries.len(),
            "Module removed"
        );
    }

    fn on_build_tools_status(&self, state: &Arc<ProjectState>, message: Option<&str>) {
        if let Some(message) = message {
            warn!(module = %state.handle(), %message, "Build tools missing");
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::{RecordedEvent, RecordingListener};

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use super::*;
    use crate::primitives::ModuleHandle;
    use parking_lot::Mutex;

    /// Event captured by [`RecordingListener`], keyed by module handle
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RecordedEvent {
        DependencyResolved {
            consumer: ModuleHandle,
            library: ModuleHandle,
        },
        LibraryFound {
            library: ModuleHandle,
            consumer: ModuleHandle,
        },
        DependencyLost {
            consumer: ModuleHandle,
            library: ModuleHandle,
        },
        ProjectOpened(ModuleHandle),
        ProjectRemoved {
            handle: ModuleHandle,
            orphaned: Vec<ModuleHandle>,
        },
        BuildToolsStatus {
            handle: ModuleHandle,
            message: Option<String>,
        },
    }

    /// Listener that records every event for later assertions
    #[derive(Debug, Default)]
    pub struct RecordingListener {
        events: Mutex<Vec<RecordedEvent>>,
    }

    impl RecordingListener {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn events(&self) -> Vec<RecordedEvent> {
            self.events.lock().clone()
        }

        /// Drain recorded events
        pub fn take(&self) -> Vec<RecordedEvent> {
            std::mem::take(&mut *self.events.lock())
        }

        fn push(&self, event: RecordedEvent) {
            self.events.lock().push(event);
        }
    }

    impl BuildEventListener for RecordingListener {
        fn on_dependency_resolved(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
            self.push(RecordedEvent::DependencyResolved {
                consumer: consumer.handle().clone(),
                library: library.handle().clone(),
            });
        }

        fn on_library_found(&self, library: &Arc<ProjectState>, consumer: &Arc<ProjectState>) {
            self.push(RecordedEvent::LibraryFound {
                library: library.handle().clone(),
                consumer: consumer.handle().clone(),
            });
        }

        fn on_dependency_lost(&self, consumer: &Arc<ProjectState>, library: &Arc<ProjectState>) {
            self.push(RecordedEvent::DependencyLost {
                consumer: consumer.handle().clone(),
                library: library.handle().clone(),
            });
        }

        fn on_project_opened(&self, state: &Arc<ProjectState>) {
            self.push(RecordedEvent::ProjectOpened(state.handle().clone()));
        }

        fn on_project_removed(
            &self,
            state: &Arc<ProjectState>,
            orphaned_libraries: &[Arc<ProjectState>],
        ) {
            self.push(RecordedEvent::ProjectRemoved {
                handle: state.handle().clone(),
                orphaned: orphaned_libraries
                    .iter()
                    .map(|l| l.handle().clone())
                    .collect(),
            });
        }

        fn on_build_tools_status(&self, state: &Arc<ProjectState>, message: Option<&str>) {
            self.push(RecordedEvent::BuildToolsStatus {
                handle: state.handle().clone(),
                message: message.map(str::to_string),
            });
        }
    }
}
