//! Task definitions.
//!
//! A [`Task`] is the smallest schedulable unit of work. Tasks are created by
//! the caller, handed to a task group and executed by whichever thread
//! dequeues them. A task may run more than once ("multiplicity"); every
//! invocation receives its own index through the [`TaskContext`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::group::TaskGroupId;

/// The work a task performs.
///
/// `run` executes synchronously on whichever thread dequeues the task and
/// must not assume any particular thread unless the task is scheduled into a
/// main-thread-only bucket. Long-running work should poll
/// [`TaskContext::is_cancel_requested`] periodically and return early when it
/// is set; the scheduler never interrupts a running task.
pub trait Workload: Send + Sync {
    /// Execute one invocation of the task.
    fn run(&self, ctx: &TaskContext<'_>);
}

impl<F> Workload for F
where
    F: Fn(&TaskContext<'_>) + Send + Sync,
{
    fn run(&self, ctx: &TaskContext<'_>) {
        self(ctx)
    }
}

/// Per-invocation context passed to [`Workload::run`].
pub struct TaskContext<'a> {
    invocation: u32,
    cancel_requested: &'a AtomicBool,
}

impl TaskContext<'_> {
    /// Index of this invocation, in `0..multiplicity`.
    #[inline]
    pub fn invocation(&self) -> u32 {
        self.invocation
    }

    /// Whether cancellation has been requested for this task.
    ///
    /// Well-behaved long tasks check this periodically and return early.
    #[inline]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}

/// Whether a task may cooperatively wait on other groups while running.
///
/// Threads that must not run blocking work (for example a thread that is
/// itself inside a cooperative wait) will only pick up `NeverWaits` tasks,
/// plus tasks of the very group they are waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestingMode {
    /// The task may call `wait_for_group` while running.
    #[default]
    MayWait,
    /// The task never waits on other groups and cannot block a thread.
    NeverWaits,
}

/// Task state, stored atomically for observation from any thread.
///
/// Correctness never derives from this value alone; the scheduler tracks
/// completion through the remaining-invocation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, not yet scheduled.
    Created,
    /// Pushed into a ready queue.
    Queued,
    /// At least one invocation is executing.
    Running,
    /// All invocations have completed.
    Finished,
    /// Removed before any invocation ran.
    Canceled,
}

impl TaskState {
    /// Convert from u8 (for atomic storage).
    #[inline]
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => TaskState::Queued,
            2 => TaskState::Running,
            3 => TaskState::Finished,
            4 => TaskState::Canceled,
            _ => TaskState::Created,
        }
    }

    /// Convert to u8 (for atomic storage).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            TaskState::Created => 0,
            TaskState::Queued => 1,
            TaskState::Running => 2,
            TaskState::Finished => 3,
            TaskState::Canceled => 4,
        }
    }
}

/// A single schedulable unit of work.
///
/// Tasks are shared as `Arc<Task>`: the owning group keeps one reference
/// until the task finishes or is canceled, and the caller may keep another to
/// observe or cancel it. A task belongs to at most one group, ever; once its
/// remaining-invocation counter reaches zero it is terminal and is never
/// enqueued again.
pub struct Task {
    /// Human-readable name for logging.
    name: String,
    /// Whether the task may wait on other groups while running.
    nesting: NestingMode,
    /// Total number of invocations.
    multiplicity: u32,
    /// Invocations that have not yet completed. Zero means terminal.
    remaining_runs: AtomicU32,
    /// Invocations that have started executing.
    started_runs: AtomicU32,
    /// Current state (observability only).
    state: AtomicU8,
    /// Cooperative cancellation flag, polled by the workload.
    cancel_requested: AtomicBool,
    /// Group this task was added to. Set once, never changes.
    owner: OnceCell<TaskGroupId>,
    /// The actual work.
    work: Box<dyn Workload>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("nesting", &self.nesting)
            .field("multiplicity", &self.multiplicity)
            .field("remaining_runs", &self.remaining_runs.load(Ordering::SeqCst))
            .field("state", &self.state())
            .finish()
    }
}

impl Task {
    /// Create a task from a closure with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use frameflow::Task;
    ///
    /// let task = Task::from_fn("blink", |_ctx| {
    ///     // do the work
    /// });
    /// assert_eq!(task.name(), "blink");
    /// ```
    pub fn from_fn<F>(name: impl Into<String>, work: F) -> Arc<Self>
    where
        F: Fn(&TaskContext<'_>) + Send + Sync + 'static,
    {
        TaskBuilder::new().name(name).build(work)
    }

    /// Get the task name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the nesting mode.
    #[inline]
    pub fn nesting(&self) -> NestingMode {
        self.nesting
    }

    /// Total number of invocations this task runs.
    #[inline]
    pub fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether all invocations have completed (or were prevented).
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.remaining_runs.load(Ordering::SeqCst) == 0
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Group this task was added to, if any.
    #[inline]
    pub fn owner(&self) -> Option<TaskGroupId> {
        self.owner.get().copied()
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Record the owner group. Fails if the task was already added somewhere.
    pub(crate) fn claim(&self, owner: TaskGroupId) -> bool {
        self.owner.set(owner).is_ok()
    }

    #[inline]
    pub(crate) fn remaining_runs(&self) -> u32 {
        self.remaining_runs.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn started_runs(&self) -> u32 {
        self.started_runs.load(Ordering::SeqCst)
    }

    /// Drop `count` pending invocations without running them.
    ///
    /// Returns the remaining count afterwards.
    pub(crate) fn discard_runs(&self, count: u32) -> u32 {
        self.remaining_runs.fetch_sub(count, Ordering::SeqCst) - count
    }

    /// Execute one invocation on the calling thread.
    pub(crate) fn run_invocation(&self, invocation: u32) {
        self.started_runs.fetch_add(1, Ordering::SeqCst);
        self.set_state(TaskState::Running);
        let ctx = TaskContext {
            invocation,
            cancel_requested: &self.cancel_requested,
        };
        self.work.run(&ctx);
    }

    /// Mark one invocation as completed. Returns the remaining count.
    pub(crate) fn complete_invocation(&self) -> u32 {
        let remaining = self.remaining_runs.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.set_state(TaskState::Finished);
        }
        remaining
    }
}

/// Builder for tasks with non-default settings.
///
/// # Examples
///
/// ```
/// use frameflow::{NestingMode, TaskBuilder, TaskContext};
///
/// let task = TaskBuilder::new()
///     .name("chunk-update")
///     .nesting(NestingMode::NeverWaits)
///     .multiplicity(8)
///     .build(|ctx: &TaskContext<'_>| {
///         let _slice = ctx.invocation();
///         // process one slice of the work
///     });
/// assert_eq!(task.multiplicity(), 8);
/// ```
#[derive(Debug, Default)]
pub struct TaskBuilder {
    name: Option<String>,
    nesting: NestingMode,
    multiplicity: Option<u32>,
}

impl TaskBuilder {
    /// Create a new task builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the task name.
    #[inline]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the nesting mode.
    #[inline]
    pub fn nesting(mut self, nesting: NestingMode) -> Self {
        self.nesting = nesting;
        self
    }

    /// Set the number of invocations. Clamped to at least 1.
    #[inline]
    pub fn multiplicity(mut self, multiplicity: u32) -> Self {
        self.multiplicity = Some(multiplicity.max(1));
        self
    }

    /// Build the task around the given workload.
    pub fn build<W>(self, work: W) -> Arc<Task>
    where
        W: Workload + 'static,
    {
        let multiplicity = self.multiplicity.unwrap_or(1);
        Arc::new(Task {
            name: self.name.unwrap_or_else(|| "unnamed".to_string()),
            nesting: self.nesting,
            multiplicity,
            remaining_runs: AtomicU32::new(multiplicity),
            started_runs: AtomicU32::new(0),
            state: AtomicU8::new(TaskState::Created.as_u8()),
            cancel_requested: AtomicBool::new(false),
            owner: OnceCell::new(),
            work: Box::new(work),
        })
    }
}
