//! Standard runtime services backed by Rust's `std` library.
//!
//! [`StdScheduler`] turns the core's "a build was scheduled" notification
//! into a pending-frame flag a host event loop polls, plus an optional waker
//! for loops that sleep. [`StdRuntime`] runs one frame against an
//! [`ElementTree`]: rebuild, finalize, then drain deferred tasks.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use trellis_core::{Applier, BuildScheduler, ElementTree, OwnerOptions, TreeError};

type FrameWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Host side of [`BuildScheduler`].
///
/// The owner reports at most one scheduled build per pending pass; this
/// folds those reports into a single pending frame until the host takes it,
/// and wakes the host only when a frame becomes pending.
pub struct StdScheduler {
    pending: AtomicBool,
    builds_scheduled: AtomicU64,
    waker: RwLock<Option<FrameWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            builds_scheduled: AtomicU64::new(0),
            waker: RwLock::new(None),
        }
    }

    /// Takes the pending frame, if any.
    pub fn take_frame_request(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_frame_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Build notifications received so far, including those folded into an
    /// already pending frame.
    pub fn builds_scheduled(&self) -> u64 {
        self.builds_scheduled.load(Ordering::Relaxed)
    }

    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.replace_waker(Some(Arc::new(waker)));
    }

    pub fn clear_frame_waker(&self) {
        self.replace_waker(None);
    }

    fn replace_waker(&self, waker: Option<FrameWaker>) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = waker;
    }

    fn current_waker(&self) -> Option<FrameWaker> {
        self.waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("pending", &self.is_frame_pending())
            .field("builds_scheduled", &self.builds_scheduled())
            .finish_non_exhaustive()
    }
}

impl BuildScheduler for StdScheduler {
    fn on_build_scheduled(&self) {
        self.builds_scheduled.fetch_add(1, Ordering::Relaxed);
        if self.pending.swap(true, Ordering::AcqRel) {
            log::trace!("build scheduled while a frame is already pending");
            return;
        }
        if let Some(waker) = self.current_waker() {
            waker();
        }
    }
}

/// Outcome of [`StdRuntime::run_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// A frame request was pending when the frame started.
    pub requested: bool,
    /// A build pass ran.
    pub built: bool,
    /// Deferred tasks drained after finalizing.
    pub tasks: usize,
    pub elapsed: Duration,
}

/// Frame driver bundling the standard scheduler.
#[derive(Clone, Default)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner options wired to this runtime's scheduler.
    pub fn options(&self) -> OwnerOptions {
        OwnerOptions::new().scheduler(self.scheduler.clone())
    }

    /// Creates a tree whose rebuild requests reach this runtime.
    pub fn tree(&self, applier: impl Applier) -> ElementTree {
        ElementTree::with_options(applier, self.options())
    }

    /// Returns the scheduler implementation.
    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Registers a waker to be called when the tree schedules a new build.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    /// Clears any previously registered frame waker.
    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    /// Runs one frame: rebuild dirty elements, unmount what was dropped,
    /// then run the tasks queued by the pass.
    pub fn run_frame(&self, tree: &ElementTree) -> Result<FrameReport, TreeError> {
        let requested = self.take_frame_request();
        let started = Instant::now();
        let pass = tree.owner().pass_id();
        tree.pump()?;
        let tasks = tree.drain_tasks();
        let report = FrameReport {
            requested,
            built: tree.owner().pass_id() != pass,
            tasks,
            elapsed: started.elapsed(),
        };
        log::debug!(
            "frame: built={} tasks={} in {:?}",
            report.built,
            report.tasks,
            report.elapsed
        );
        Ok(report)
    }

    /// Runs frames while requests keep arriving, up to `max_frames`.
    /// Returns the number of frames run.
    pub fn run_until_idle(
        &self,
        tree: &ElementTree,
        max_frames: usize,
    ) -> Result<usize, TreeError> {
        let mut frames = 0;
        while frames < max_frames && (tree.needs_build() || self.scheduler.is_frame_pending()) {
            self.run_frame(tree)?;
            frames += 1;
        }
        if frames == max_frames && tree.needs_build() {
            log::warn!("tree still dirty after {max_frames} frame(s)");
        }
        Ok(frames)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
