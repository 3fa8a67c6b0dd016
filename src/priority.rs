//! Priority buckets and worker categories.
//!
//! Tasks are dispatched from an ordered set of priority buckets. The first
//! fourteen buckets are frame-relative: work can be scheduled for the current
//! frame, the next frame, or "in N frames", and the frame boundary shifts
//! everything one step closer to the present (see `scheduler::frame`).
//! The remaining buckets cover main-thread-only work, file access and
//! long-running background jobs, each serviced by its own worker category.

use std::fmt;

/// Priority bucket of a task group.
///
/// Ordering is total: a lower bucket is always serviced before a higher one
/// within the range a thread is scanning. The frame-relative buckets decay
/// toward [`TaskPriority::EarlyThisFrame`] at every frame boundary, so work
/// scheduled "in N frames" runs no later than N frame boundaries from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TaskPriority {
    /// Must run this frame, before the other this-frame buckets.
    EarlyThisFrame = 0,
    /// Must run this frame.
    ThisFrame = 1,
    /// Must run this frame, after the other this-frame buckets.
    LateThisFrame = 2,
    /// Runs next frame at the latest, early in the frame.
    EarlyNextFrame = 3,
    /// Runs next frame at the latest.
    NextFrame = 4,
    /// Runs next frame at the latest, late in the frame.
    LateNextFrame = 5,
    /// Runs within the next 2 frames.
    In2Frames = 6,
    /// Runs within the next 3 frames.
    In3Frames = 7,
    /// Runs within the next 4 frames.
    In4Frames = 8,
    /// Runs within the next 5 frames.
    In5Frames = 9,
    /// Runs within the next 6 frames.
    In6Frames = 10,
    /// Runs within the next 7 frames.
    In7Frames = 11,
    /// Runs within the next 8 frames.
    In8Frames = 12,
    /// Runs within the next 9 frames.
    In9Frames = 13,
    /// Main-thread-only work, drained completely at the frame boundary.
    ThisFrameMainThread = 14,
    /// Main-thread-only background work, paced against the frame budget.
    SomeFrameMainThread = 15,
    /// Urgent file access work.
    FileAccessHighPriority = 16,
    /// Regular file access work.
    FileAccess = 17,
    /// Urgent long-running work.
    LongRunningHighPriority = 18,
    /// Long-running background work.
    LongRunning = 19,
}

/// Number of priority buckets.
pub const PRIORITY_COUNT: usize = 20;

/// All priority buckets, in dispatch order.
pub const ALL_PRIORITIES: [TaskPriority; PRIORITY_COUNT] = [
    TaskPriority::EarlyThisFrame,
    TaskPriority::ThisFrame,
    TaskPriority::LateThisFrame,
    TaskPriority::EarlyNextFrame,
    TaskPriority::NextFrame,
    TaskPriority::LateNextFrame,
    TaskPriority::In2Frames,
    TaskPriority::In3Frames,
    TaskPriority::In4Frames,
    TaskPriority::In5Frames,
    TaskPriority::In6Frames,
    TaskPriority::In7Frames,
    TaskPriority::In8Frames,
    TaskPriority::In9Frames,
    TaskPriority::ThisFrameMainThread,
    TaskPriority::SomeFrameMainThread,
    TaskPriority::FileAccessHighPriority,
    TaskPriority::FileAccess,
    TaskPriority::LongRunningHighPriority,
    TaskPriority::LongRunning,
];

impl TaskPriority {
    /// Index of this bucket in dispatch order.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bucket for the given index, if valid.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        ALL_PRIORITIES.get(index).copied()
    }

    /// Iterate over all buckets from `first` to `last`, inclusive.
    pub fn span(first: Self, last: Self) -> impl Iterator<Item = Self> {
        (first.index()..=last.index()).filter_map(Self::from_index)
    }

    /// Whether this bucket may only ever be serviced by the main thread.
    #[inline]
    pub fn is_main_thread_only(self) -> bool {
        matches!(
            self,
            TaskPriority::ThisFrameMainThread | TaskPriority::SomeFrameMainThread
        )
    }

    /// Bucket this one decays into at a frame boundary.
    ///
    /// Leftover this-frame work is late and moves to the front of the line;
    /// next-frame work becomes this-frame work; "in N frames" work moves one
    /// bucket closer. `None` means the bucket does not take part in decay.
    pub fn decay_target(self) -> Option<Self> {
        use TaskPriority::*;
        match self {
            ThisFrame | LateThisFrame | EarlyNextFrame => Some(EarlyThisFrame),
            NextFrame => Some(ThisFrame),
            LateNextFrame => Some(LateThisFrame),
            In2Frames => Some(LateNextFrame),
            In3Frames => Some(In2Frames),
            In4Frames => Some(In3Frames),
            In5Frames => Some(In4Frames),
            In6Frames => Some(In5Frames),
            In7Frames => Some(In6Frames),
            In8Frames => Some(In7Frames),
            In9Frames => Some(In8Frames),
            _ => None,
        }
    }

    /// Worker category that services this bucket.
    pub fn worker_category(self) -> WorkerCategory {
        use TaskPriority::*;
        match self {
            ThisFrameMainThread | SomeFrameMainThread => WorkerCategory::MainThread,
            FileAccessHighPriority | FileAccess => WorkerCategory::FileAccess,
            LongRunningHighPriority | LongRunning => WorkerCategory::LongTasks,
            _ => WorkerCategory::ShortTasks,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::ThisFrame
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Category of work a thread services.
///
/// Each category owns a fixed pool of worker threads (except
/// [`WorkerCategory::MainThread`], whose buckets are drained by the frame
/// boundary and by cooperative waiters running on the main thread) and only
/// ever dequeues from its own contiguous bucket range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerCategory {
    /// Short compute tasks; the bulk of per-frame work.
    ShortTasks,
    /// Long-running background tasks.
    LongTasks,
    /// File access tasks.
    FileAccess,
    /// The thread that drives the frame loop.
    MainThread,
}

/// Categories that own a worker pool.
pub(crate) const POOLED_CATEGORIES: [WorkerCategory; 3] = [
    WorkerCategory::ShortTasks,
    WorkerCategory::LongTasks,
    WorkerCategory::FileAccess,
];

impl WorkerCategory {
    /// Inclusive bucket range serviced by this category.
    ///
    /// The main thread additionally covers the short-task range so that a
    /// cooperatively waiting main thread can help with regular frame work.
    pub fn priority_range(self) -> (TaskPriority, TaskPriority) {
        match self {
            WorkerCategory::ShortTasks => (TaskPriority::EarlyThisFrame, TaskPriority::In9Frames),
            WorkerCategory::MainThread => {
                (TaskPriority::EarlyThisFrame, TaskPriority::SomeFrameMainThread)
            }
            WorkerCategory::FileAccess => {
                (TaskPriority::FileAccessHighPriority, TaskPriority::FileAccess)
            }
            WorkerCategory::LongTasks => {
                (TaskPriority::LongRunningHighPriority, TaskPriority::LongRunning)
            }
        }
    }

    /// Short name used for thread names and logging.
    pub fn short_name(self) -> &'static str {
        match self {
            WorkerCategory::ShortTasks => "short",
            WorkerCategory::LongTasks => "long",
            WorkerCategory::FileAccess => "file",
            WorkerCategory::MainThread => "main",
        }
    }

    /// Index into per-category pool storage. Only valid for pooled categories.
    #[inline]
    pub(crate) fn pool_index(self) -> Option<usize> {
        match self {
            WorkerCategory::ShortTasks => Some(0),
            WorkerCategory::LongTasks => Some(1),
            WorkerCategory::FileAccess => Some(2),
            WorkerCategory::MainThread => None,
        }
    }
}

impl fmt::Display for WorkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
