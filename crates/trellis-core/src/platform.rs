//! Host integration hooks.
//!
//! The core never decides when a pass runs. It tells the host that one is
//! needed and the host calls back into [`crate::BuildOwner::build_scope`] and
//! [`crate::BuildOwner::finalize_tree`] when it is ready.

/// Receives "a build was scheduled" notifications.
///
/// Called at most once per pending pass. Implementations must be safe to
/// share between threads so the host can hand the same scheduler to its
/// event loop.
pub trait BuildScheduler: Send + Sync {
    fn on_build_scheduled(&self);
}

/// Scheduler for owners that are pumped manually.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl BuildScheduler for NoopScheduler {
    fn on_build_scheduled(&self) {}
}
