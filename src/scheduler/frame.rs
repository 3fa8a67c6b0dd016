//! Frame pacing for background main-thread tasks.
//!
//! The frame boundary may spend leftover frame time on
//! [`SomeFrameMainThread`](crate::priority::TaskPriority::SomeFrameMainThread)
//! tasks, but only when the previous frame came in under a target time. A
//! fixed threshold would starve those tasks forever on a machine that never
//! hits the target, so the threshold adapts: every frame that is too slow
//! raises it a little, and executing a task resets it back to the target.
//! Under sustained frame pressure this still lets one task through every few
//! frames: starvation is bounded, latency is not guaranteed.

use std::time::{Duration, Instant};

/// How much more permissive the pacer gets per skipped frame.
const THRESHOLD_INCREMENT: Duration = Duration::from_millis(5);

/// Adaptive admission control for paced background tasks.
#[derive(Debug)]
pub(crate) struct FramePacer {
    /// Frame time the application is aiming for.
    target: Duration,
    /// Current admission threshold. Never below `target`.
    threshold: Duration,
    /// End of the previous frame, if one was recorded.
    last_frame_end: Option<Instant>,
}

impl FramePacer {
    pub fn new(target: Duration) -> Self {
        Self {
            target,
            threshold: target,
            last_frame_end: None,
        }
    }

    /// Record a frame boundary and return the duration of the frame that
    /// just ended. The very first boundary reports a zero-length frame.
    pub fn end_frame(&mut self) -> Duration {
        let now = Instant::now();
        let frame_time = self
            .last_frame_end
            .map(|previous| now.duration_since(previous))
            .unwrap_or(Duration::ZERO);
        self.last_frame_end = Some(now);
        frame_time
    }

    /// Whether a frame of the given duration leaves room for background work.
    #[inline]
    pub fn admits(&self, frame_time: Duration) -> bool {
        frame_time < self.threshold
    }

    /// A background task was executed: demand the full target again.
    pub fn note_executed(&mut self) {
        self.threshold = self.target;
    }

    /// The frame was too slow to run background work: loosen the threshold
    /// so a long streak of slow frames cannot defer the work forever.
    pub fn note_skipped(&mut self) {
        self.threshold = self.threshold.saturating_add(THRESHOLD_INCREMENT);
    }

    #[cfg(test)]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}
