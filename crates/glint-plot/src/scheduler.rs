//! Frame scheduling.
//!
//! A [`Plot`](crate::Plot) marks itself busy while an update is in flight
//! and asks its scheduler for one frame; the host answers by calling
//! [`Plot::on_animation_frame`](crate::Plot::on_animation_frame) on its next
//! refresh, which lets the next update through.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Host hook for "call me back on the next frame".
///
/// The plot calls [`request_frame`](Self::request_frame) at most once per
/// frame; implementations do not need to deduplicate.
pub trait FrameScheduler: Send + Sync {
    fn request_frame(&self);
}

/// Scheduler that does nothing. Hosts using it must call
/// `on_animation_frame` themselves after every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFrameScheduler;

impl FrameScheduler for NoopFrameScheduler {
    fn request_frame(&self) {}
}

/// Deterministic scheduler driven by hand, for tests and headless hosts.
///
/// # Example
///
/// ```rust
/// use glint_plot::{FrameScheduler, ManualFrameScheduler};
///
/// let scheduler = ManualFrameScheduler::new();
/// scheduler.request_frame();
///
/// assert!(scheduler.take_pending());
/// assert!(!scheduler.take_pending());
/// assert_eq!(scheduler.request_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ManualFrameScheduler {
    pending: AtomicBool,
    requests: AtomicUsize,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame was requested and not yet taken.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume the pending request, returning whether there was one.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Total number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Acquire)
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self) {
        self.requests.fetch_add(1, Ordering::AcqRel);
        self.pending.store(true, Ordering::Release);
    }
}
