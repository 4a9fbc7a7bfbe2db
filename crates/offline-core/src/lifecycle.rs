//! Worker lifecycle tracking.

use std::time::Duration;

/// Lifecycle states of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Created, nothing run yet.
    Parsed,
    /// Install handler is populating the cache.
    Installing,
    /// Install finished, waiting to activate.
    Installed,
    /// Activate handler is cleaning up old caches.
    Activating,
    /// Controlling pages and intercepting fetches.
    Activated,
    /// Install or activation failed; a later load may retry.
    Redundant,
}

impl WorkerState {
    /// Whether fetches from controlled pages are routed to the worker.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Whether install may be (re)attempted from this state.
    pub fn can_install(&self) -> bool {
        matches!(self, Self::Parsed | Self::Redundant)
    }

    /// Whether activation may start from this state.
    pub fn can_activate(&self) -> bool {
        matches!(self, Self::Installed)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Observer trait for lifecycle transitions.
pub trait LifecycleObserver: Send + Sync {
    /// Called after the worker moves from `from` to `to`.
    ///
    /// `elapsed` is measured from the start of the phase that just ended.
    fn on_transition(&self, from: WorkerState, to: WorkerState, elapsed: Duration);
}
