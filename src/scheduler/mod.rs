//! The scheduler core.
//!
//! [`FrameScheduler`] owns the group table and the ready queues, dispatches
//! tasks to the worker pools, and propagates completion through the
//! dependency graph. One mutex guards all queue and group mutation; tasks
//! always execute with that lock released.
//!
//! # Overview
//!
//! Work enters the system in groups: create a group, add tasks, declare
//! dependencies on other groups, start it. Tasks of a started group whose
//! dependencies are all satisfied are pushed into the ready queue of the
//! group's priority bucket and picked up by the worker pool for that bucket's
//! category. When the last task of a group finishes, the group's generation
//! advances, blocked waiters wake, dependent groups are unblocked and the
//! completion callback fires, exactly once per group incarnation.
//!
//! Waiting is cooperative: a thread that waits for a group keeps executing
//! ready tasks (tasks of that very group, or tasks that never wait) instead
//! of going to sleep, so even a single-threaded category cannot deadlock on
//! itself.

pub mod frame;


use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::group::{GroupPool, OnGroupFinished, TaskGroupId, GENERATION_STEP};
use crate::priority::{TaskPriority, WorkerCategory, POOLED_CATEGORIES};
use crate::queue::{ReadyQueues, TaskData};
use crate::task::{Task, TaskState};
use crate::worker::{self, WorkerPool};

use frame::FramePacer;

/// What to do when a canceled task turns out to be already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Cooperatively wait until the running task has finished.
    Block,
    /// Report [`SchedulerError::MustWait`] without blocking.
    ReturnImmediately,
}

/// How a cancellation request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The task was removed before any invocation ran.
    Prevented,
    /// The task had already finished (or had partially run) when the request
    /// took effect; nothing was left to remove.
    AlreadyFinished,
    /// The task was running; the call blocked until it finished.
    WaitedUntilFinished,
}

/// Execution counters, updated as the scheduler runs.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Task invocations pushed into the ready queues.
    pub invocations_scheduled: AtomicUsize,
    /// Task invocations executed to completion.
    pub invocations_executed: AtomicUsize,
    /// Tasks removed by cancellation before running.
    pub tasks_canceled: AtomicUsize,
    /// Groups that ran to completion.
    pub groups_finished: AtomicUsize,
}

impl SchedulerStats {
    #[inline]
    fn record_scheduled(&self, count: usize) {
        self.invocations_scheduled.fetch_add(count, Ordering::SeqCst);
    }

    #[inline]
    fn record_executed(&self) {
        self.invocations_executed.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    fn record_canceled(&self) {
        self.tasks_canceled.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    fn record_group_finished(&self) {
        self.groups_finished.fetch_add(1, Ordering::SeqCst);
    }
}

/// Queue and group state guarded by the scheduler lock.
pub(crate) struct State {
    pub groups: GroupPool,
    pub ready: ReadyQueues,
}

impl State {
    fn new() -> Self {
        Self {
            groups: GroupPool::new(),
            ready: ReadyQueues::new(),
        }
    }
}

/// A finished group whose callback still has to run (with the lock released).
struct FinishNotice {
    id: TaskGroupId,
    slot: usize,
    callback: Option<OnGroupFinished>,
}

/// State shared between the scheduler handle and its worker threads.
pub(crate) struct Shared {
    pub state: Mutex<State>,
    pub pools: Vec<WorkerPool>,
    pub running: AtomicBool,
    pub stats: SchedulerStats,
}

impl Shared {
    /// Run one invocation on the calling thread and do the completion
    /// bookkeeping. The scheduler lock is only held for the bookkeeping.
    ///
    /// Whatever happens inside the task body is the task's own business: a
    /// panicking invocation is caught and still counts as completed, so its
    /// group cannot be wedged by a failing task.
    pub(crate) fn run_task(&self, data: &TaskData) {
        trace!(task = data.task.name(), invocation = data.invocation, "executing task");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            data.task.run_invocation(data.invocation);
        }));
        if outcome.is_err() {
            warn!(task = data.task.name(), "task panicked during execution");
        }
        self.stats.record_executed();

        let mut notices = Vec::new();
        {
            let mut state = self.state.lock();
            if data.task.complete_invocation() == 0 {
                self.on_task_terminal(&mut state, data.group, &mut notices);
            }
        }
        self.dispatch_notices(notices);
    }

    /// Dequeue and run one suitable invocation. Returns false if none exists.
    pub(crate) fn execute_one(
        &self,
        first: TaskPriority,
        last: TaskPriority,
        only_non_waiting: bool,
        waiting_for: Option<TaskGroupId>,
    ) -> bool {
        let data = self
            .state
            .lock()
            .ready
            .pop_next(first, last, only_non_waiting, waiting_for);
        match data {
            Some(data) => {
                self.run_task(&data);
                true
            }
            None => false,
        }
    }

    /// A task has no invocations left: count it against its group.
    fn on_task_terminal(
        &self,
        state: &mut State,
        group: TaskGroupId,
        notices: &mut Vec<FinishNotice>,
    ) {
        let Some(slot) = state.groups.get_mut(group) else {
            return;
        };
        let remaining = slot.remaining_tasks.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.finish_group(state, group.slot(), notices);
        }
    }

    /// Mark a group finished and propagate through the dependency graph.
    ///
    /// The generation bump, the condvar wake and the dependent bookkeeping
    /// all happen under the one scheduler lock; callbacks are deferred to
    /// [`Shared::dispatch_notices`] so they run with the lock released.
    /// Unblocked dependents that turn out to be empty finish right here,
    /// hence the worklist.
    fn finish_group(&self, state: &mut State, slot_index: usize, notices: &mut Vec<FinishNotice>) {
        let mut worklist = vec![slot_index];
        while let Some(index) = worklist.pop() {
            let slot = state.groups.slot_mut(index);
            let finished_id = slot.id(index);
            slot.generation = slot.generation.wrapping_add(GENERATION_STEP);
            let condvar = slot.condvar.clone();
            let dependents = std::mem::take(&mut slot.dependents);
            condvar.notify_all();

            for dependent in dependents {
                let Some(dependent_slot) = state.groups.get_mut(dependent) else {
                    continue;
                };
                dependent_slot.unfinished_dependencies -= 1;
                if dependent_slot.unfinished_dependencies == 0 && dependent_slot.started {
                    if let Some(empty) = self.schedule_group_tasks(state, dependent) {
                        worklist.push(empty);
                    }
                }
            }

            let slot = state.groups.slot_mut(index);
            slot.tasks.clear();
            let callback = slot.on_finished.take();
            self.stats.record_group_finished();
            notices.push(FinishNotice {
                id: finished_id,
                slot: index,
                callback,
            });
        }
    }

    /// Push every runnable task of a (started, unblocked) group into the
    /// ready queue of its bucket and kick workers of the covering category.
    ///
    /// Returns the slot index if the group has nothing to run, so the caller
    /// can finish it.
    fn schedule_group_tasks(&self, state: &mut State, id: TaskGroupId) -> Option<usize> {
        let Some(slot) = state.groups.get_mut(id) else {
            return None;
        };
        slot.tasks_scheduled = true;
        let priority = slot.priority;
        let condvar = slot.condvar.clone();
        let runnable: Vec<Arc<Task>> = slot
            .tasks
            .iter()
            .filter(|task| task.remaining_runs() > 0)
            .cloned()
            .collect();
        slot.remaining_tasks
            .store(runnable.len() as u32, Ordering::SeqCst);

        if runnable.is_empty() {
            return Some(id.slot());
        }

        let mut pushed = 0usize;
        for task in runnable {
            task.set_state(TaskState::Queued);
            for invocation in 0..task.multiplicity() {
                state.ready.push(
                    priority,
                    TaskData {
                        task: task.clone(),
                        group: id,
                        invocation,
                    },
                );
                pushed += 1;
            }
        }
        self.stats.record_scheduled(pushed);
        trace!(group = %id, %priority, invocations = pushed, "group tasks scheduled");
        self.wake_for_priority(priority, pushed);
        // a cooperative waiter may be blocked on this group from before it
        // had runnable work
        condvar.notify_all();
        None
    }

    /// Wake up to `count` idle workers of the pool covering `priority`.
    fn wake_for_priority(&self, priority: TaskPriority, count: usize) {
        if let Some(pool_index) = priority.worker_category().pool_index() {
            self.pools[pool_index].wake(count);
        }
    }

    /// Run finish callbacks with the lock released, then recycle the slots.
    ///
    /// A slot only becomes reusable after its callback has returned; until
    /// then it is out of the free list, so the callback may re-enter the
    /// scheduler freely.
    fn dispatch_notices(&self, notices: Vec<FinishNotice>) {
        if notices.is_empty() {
            return;
        }
        let mut slots = Vec::with_capacity(notices.len());
        for notice in notices {
            debug!(group = %notice.id, "task group finished");
            if let Some(callback) = notice.callback {
                callback(notice.id);
            }
            slots.push(notice.slot);
        }
        let mut state = self.state.lock();
        for slot in slots {
            state.groups.release(slot);
        }
    }
}

/// Dependency-aware, priority-bucketed task scheduler.
///
/// An application owns exactly one `FrameScheduler` and passes it to
/// everything that schedules work; there is no hidden global instance. The
/// frame loop must call [`FrameScheduler::run_frame_boundary`] once per
/// frame, otherwise main-thread tasks never execute and frame-relative
/// buckets never decay.
///
/// # Examples
///
/// ```
/// use frameflow::{FrameScheduler, Task, TaskPriority};
///
/// let scheduler = FrameScheduler::new();
/// let group = scheduler.create_group(TaskPriority::ThisFrame);
/// scheduler
///     .add_task(group, Task::from_fn("warm-cache", |_| {}))
///     .unwrap();
/// scheduler.start_group(group).unwrap();
/// scheduler.wait_for_group(group);
/// assert!(scheduler.is_group_finished(group));
/// ```
pub struct FrameScheduler {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
    pacer: Mutex<FramePacer>,
    config: SchedulerConfig,
}

impl FrameScheduler {
    /// Create a scheduler with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let pools = POOLED_CATEGORIES
            .iter()
            .map(|&category| WorkerPool::new(category, pool_size(&config, category)))
            .collect();
        let shared = Arc::new(Shared {
            state: Mutex::new(State::new()),
            pools,
            running: AtomicBool::new(true),
            stats: SchedulerStats::default(),
        });
        let workers = worker::spawn_workers(&shared, &config);
        debug!(
            short = config.short_threads,
            long = config.long_threads,
            file = config.file_threads,
            "scheduler started"
        );
        Self {
            shared,
            workers,
            pacer: Mutex::new(FramePacer::new(config.target_frame_time)),
            config,
        }
    }

    /// Create a new task group. Tasks added to it run at `priority`.
    pub fn create_group(&self, priority: TaskPriority) -> TaskGroupId {
        self.shared.state.lock().groups.alloc(priority, None)
    }

    /// Create a new task group with a completion callback.
    ///
    /// The callback is invoked exactly once, after every task of the group
    /// has finished and before the group's slot can be reused. It runs with
    /// the scheduler lock released and may schedule new work.
    pub fn create_group_with_callback<F>(&self, priority: TaskPriority, on_finished: F) -> TaskGroupId
    where
        F: FnOnce(TaskGroupId) + Send + 'static,
    {
        self.shared
            .state
            .lock()
            .groups
            .alloc(priority, Some(Box::new(on_finished)))
    }

    /// Add a task to a group. Legal only before the group is started.
    pub fn add_task(&self, group: TaskGroupId, task: Arc<Task>) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        let Some(slot) = state.groups.get_mut(group) else {
            return Err(SchedulerError::StaleHandle(group));
        };
        if slot.started {
            return Err(SchedulerError::GroupSealed(group));
        }
        if !task.claim(group) {
            return Err(SchedulerError::TaskAlreadyOwned {
                name: task.name().to_string(),
            });
        }
        slot.tasks.push(task);
        Ok(())
    }

    /// Make `group` wait for `depends_on` to finish before its tasks run.
    ///
    /// Legal only before `group` is started. A dependency on a group that
    /// has already finished is silently satisfied. An edge that would close
    /// a dependency cycle is rejected, since a cycle could never finish.
    pub fn add_dependency(
        &self,
        group: TaskGroupId,
        depends_on: TaskGroupId,
    ) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        {
            let Some(slot) = state.groups.get(group) else {
                return Err(SchedulerError::StaleHandle(group));
            };
            if slot.started {
                return Err(SchedulerError::GroupSealed(group));
            }
        }
        if state.groups.is_finished(depends_on) {
            return Ok(());
        }
        if dependency_would_cycle(&state, group, depends_on) {
            return Err(SchedulerError::DependencyCycle { group, depends_on });
        }
        state
            .groups
            .get_mut(depends_on)
            .expect("liveness checked above")
            .dependents
            .push(group);
        state
            .groups
            .get_mut(group)
            .expect("liveness checked above")
            .unfinished_dependencies += 1;
        Ok(())
    }

    /// Start a group. No further tasks or dependencies can be added.
    ///
    /// If all dependencies are already satisfied the group's tasks become
    /// ready immediately; otherwise they become ready when the last
    /// dependency finishes. A group without runnable tasks finishes on the
    /// spot. Starting a group twice is an error.
    pub fn start_group(&self, group: TaskGroupId) -> Result<(), SchedulerError> {
        let mut notices = Vec::new();
        {
            let mut state = self.shared.state.lock();
            let Some(slot) = state.groups.get_mut(group) else {
                return Err(SchedulerError::StaleHandle(group));
            };
            if slot.started {
                return Err(SchedulerError::GroupAlreadyStarted(group));
            }
            slot.started = true;
            if slot.unfinished_dependencies == 0 {
                if let Some(empty) = self.shared.schedule_group_tasks(&mut state, group) {
                    self.shared.finish_group(&mut state, empty, &mut notices);
                }
            }
        }
        self.shared.dispatch_notices(notices);
        Ok(())
    }

    /// Insert a single task and start it right away.
    ///
    /// Returns the group the task was put into, for waiting or dependencies.
    pub fn start_single_task(&self, task: Arc<Task>, priority: TaskPriority) -> TaskGroupId {
        let group = self.create_group(priority);
        self.add_task(group, task)
            .expect("a freshly created group accepts tasks");
        self.start_group(group)
            .expect("a freshly created group starts once");
        group
    }

    /// Insert a single task that runs only after `dependency` has finished.
    pub fn start_single_task_after(
        &self,
        task: Arc<Task>,
        priority: TaskPriority,
        dependency: TaskGroupId,
    ) -> TaskGroupId {
        let group = self.create_group(priority);
        self.add_task(group, task)
            .expect("a freshly created group accepts tasks");
        self.add_dependency(group, dependency)
            .expect("a freshly created group accepts dependencies");
        self.start_group(group)
            .expect("a freshly created group starts once");
        group
    }

    /// Whether the group behind the handle has finished.
    ///
    /// Valid for handles of any age: once the group finished, every handle to
    /// that incarnation reports `true` forever, even after the slot has been
    /// reused for other groups.
    pub fn is_group_finished(&self, group: TaskGroupId) -> bool {
        self.shared.state.lock().groups.is_finished(group)
    }

    /// Wait until a group has finished, helping with ready work meanwhile.
    ///
    /// Instead of sleeping, the calling thread executes tasks of the awaited
    /// group itself, plus tasks that never wait, restricted to the bucket
    /// range of the calling thread's category. Only when no such task is
    /// ready does the thread block, on a signal raised under the same lock
    /// that guards the group's completion, so the "about to finish" /
    /// "about to wait" race cannot be lost.
    pub fn wait_for_group(&self, group: TaskGroupId) {
        let (first, last) = worker::current_help_range();
        loop {
            let data = {
                let mut state = self.shared.state.lock();
                if state.groups.is_finished(group) {
                    return;
                }
                match state.ready.pop_next(first, last, true, Some(group)) {
                    Some(data) => Some(data),
                    None => {
                        let condvar = state
                            .groups
                            .get(group)
                            .expect("liveness checked above")
                            .condvar
                            .clone();
                        condvar.wait(&mut state);
                        None
                    }
                }
            };
            if let Some(data) = data {
                self.shared.run_task(&data);
            }
        }
    }

    /// Poll a condition, executing non-blocking ready work between polls.
    ///
    /// Prefer [`FrameScheduler::wait_for_group`] where possible; use this
    /// only for conditions that are not a group's completion.
    pub fn wait_for_condition<F>(&self, condition: F)
    where
        F: Fn() -> bool,
    {
        let (first, last) = worker::current_help_range();
        while !condition() {
            if !self.shared.execute_one(first, last, true, None) {
                thread::yield_now();
            }
        }
    }

    /// Execute one ready task suitable for the calling thread, if any.
    ///
    /// Lets external systems (for example a resource loader stalled on I/O
    /// elsewhere) donate their idle time to the scheduler.
    pub fn help_execute_one(&self) -> bool {
        let (first, last) = worker::current_help_range();
        self.shared.execute_one(first, last, false, None)
    }

    /// Try to prevent a task from executing.
    ///
    /// The cooperative cancel flag is set in every case, so a running task
    /// that polls it may still terminate early. The outcome depends on where
    /// the task is:
    ///
    /// - still in its group's pre-start list: removed, never runs,
    ///   [`CancelOutcome::Prevented`];
    /// - in a ready queue: removed (all queued invocations), never runs,
    ///   and its group's completion accounting proceeds as if it had
    ///   finished, [`CancelOutcome::Prevented`];
    /// - already executing: with [`WaitPolicy::Block`] the call waits
    ///   cooperatively for the task to finish, otherwise it reports
    ///   [`SchedulerError::MustWait`].
    pub fn cancel_task(
        &self,
        task: &Arc<Task>,
        policy: WaitPolicy,
    ) -> Result<CancelOutcome, SchedulerError> {
        task.request_cancel();
        if task.is_finished() {
            return Ok(CancelOutcome::AlreadyFinished);
        }

        let mut notices = Vec::new();
        let revoked = {
            let mut state = self.shared.state.lock();
            self.try_revoke_task(&mut state, task, &mut notices)
        };
        self.shared.dispatch_notices(notices);

        match revoked {
            Some(outcome) => Ok(outcome),
            None => match policy {
                WaitPolicy::ReturnImmediately => Err(SchedulerError::MustWait {
                    name: task.name().to_string(),
                }),
                WaitPolicy::Block => {
                    self.wait_for_condition(|| task.is_finished());
                    Ok(CancelOutcome::WaitedUntilFinished)
                }
            },
        }
    }

    /// Cancel every task of a group.
    ///
    /// Tasks that were not running are removed without executing; the group
    /// still runs its completion (callback included). If at least one task
    /// was already running, the call blocks on the whole group or reports
    /// [`SchedulerError::MustWait`], depending on the policy.
    pub fn cancel_group(
        &self,
        group: TaskGroupId,
        policy: WaitPolicy,
    ) -> Result<CancelOutcome, SchedulerError> {
        let tasks = {
            let state = self.shared.state.lock();
            match state.groups.get(group) {
                Some(slot) => slot.tasks.clone(),
                None => return Ok(CancelOutcome::AlreadyFinished),
            }
        };

        let mut running: Option<String> = None;
        for task in &tasks {
            match self.cancel_task(task, WaitPolicy::ReturnImmediately) {
                Ok(_) => {}
                Err(SchedulerError::MustWait { name }) => running = Some(name),
                Err(other) => return Err(other),
            }
        }

        match running {
            None => Ok(CancelOutcome::Prevented),
            Some(name) => match policy {
                WaitPolicy::ReturnImmediately => Err(SchedulerError::MustWait { name }),
                WaitPolicy::Block => {
                    self.wait_for_group(group);
                    Ok(CancelOutcome::WaitedUntilFinished)
                }
            },
        }
    }

    /// The lock-held part of cancellation: the pending / queued / running
    /// three-way branch. `None` means the task is running somewhere.
    fn try_revoke_task(
        &self,
        state: &mut State,
        task: &Arc<Task>,
        notices: &mut Vec<FinishNotice>,
    ) -> Option<CancelOutcome> {
        if task.is_finished() {
            return Some(CancelOutcome::AlreadyFinished);
        }

        let owner = match task.owner() {
            Some(owner) => owner,
            None => {
                // never handed to a group; just neutralize it
                task.discard_runs(task.remaining_runs());
                task.set_state(TaskState::Canceled);
                self.shared.stats.record_canceled();
                return Some(CancelOutcome::Prevented);
            }
        };

        if let Some(slot) = state.groups.get_mut(owner) {
            if !slot.tasks_scheduled {
                // pre-start: drop it from the group's task list
                if let Some(position) = slot.tasks.iter().position(|t| Arc::ptr_eq(t, task)) {
                    slot.tasks.remove(position);
                    task.discard_runs(task.remaining_runs());
                    task.set_state(TaskState::Canceled);
                    self.shared.stats.record_canceled();
                    return Some(CancelOutcome::Prevented);
                }
                return Some(CancelOutcome::AlreadyFinished);
            }
        } else {
            // owner finished, so the task has too
            return Some(CancelOutcome::AlreadyFinished);
        }

        // queued: pull every pending invocation out of the ready lists
        let removed = state.ready.remove_task(task);
        if removed > 0 {
            let remaining = task.discard_runs(removed);
            if remaining == 0 {
                let outcome = if task.started_runs() == 0 {
                    task.set_state(TaskState::Canceled);
                    self.shared.stats.record_canceled();
                    CancelOutcome::Prevented
                } else {
                    // some invocations had already run; the rest were removed
                    task.set_state(TaskState::Finished);
                    CancelOutcome::AlreadyFinished
                };
                self.shared.on_task_terminal(state, owner, notices);
                return Some(outcome);
            }
        }
        None
    }

    /// Per-frame maintenance. Call once per rendered frame, from the thread
    /// that runs the frame loop.
    ///
    /// Drains all [`TaskPriority::ThisFrameMainThread`] work on the calling
    /// thread, decays the frame-relative buckets one step toward the present,
    /// and, if the previous frame left slack, executes a bounded number of
    /// [`TaskPriority::SomeFrameMainThread`] tasks. Frames that keep missing
    /// the target raise the pacing threshold a little each time, so paced
    /// background work is starved for at most a bounded number of frames.
    pub fn run_frame_boundary(&self) {
        // main-thread work that must happen this frame
        while self.shared.execute_one(
            TaskPriority::ThisFrameMainThread,
            TaskPriority::ThisFrameMainThread,
            false,
            None,
        ) {}

        {
            let mut state = self.shared.state.lock();
            state.ready.decay_frame_buckets();
        }

        let mut pacer = self.pacer.lock();
        let frame_time = pacer.end_frame();
        if pacer.admits(frame_time) {
            let mut executed = 0;
            while executed < self.config.frame_task_budget
                && self.shared.execute_one(
                    TaskPriority::SomeFrameMainThread,
                    TaskPriority::SomeFrameMainThread,
                    false,
                    None,
                )
            {
                executed += 1;
            }
            if executed > 0 {
                pacer.note_executed();
                trace!(executed, "paced background tasks executed");
            }
        } else {
            let pending = {
                let state = self.shared.state.lock();
                state.ready.len(TaskPriority::SomeFrameMainThread)
            };
            if pending > 0 {
                pacer.note_skipped();
                trace!(?frame_time, pending, "frame too slow, deferring background tasks");
            }
        }
    }

    /// Execution counters.
    #[inline]
    pub fn stats(&self) -> &SchedulerStats {
        &self.shared.stats
    }

    /// The configuration this scheduler was built with.
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of worker threads serving a category.
    pub fn worker_count(&self, category: WorkerCategory) -> usize {
        match category {
            WorkerCategory::ShortTasks => self.config.short_threads,
            WorkerCategory::LongTasks => self.config.long_threads,
            WorkerCategory::FileAccess => self.config.file_threads,
            WorkerCategory::MainThread => 0,
        }
    }

    /// Stop all worker threads and wait for them to exit.
    ///
    /// Queued tasks that no worker picked up remain unexecuted; groups they
    /// belong to never finish. Called automatically on drop.
    pub fn shutdown(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // fence: workers re-check `running` under this lock before parking,
        // so after this acquire/release no worker can park unnotified
        drop(self.shared.state.lock());
        for pool in &self.shared.pools {
            pool.wake_all();
        }
        for handle in self.workers.drain(..) {
            handle.join().expect("worker thread panicked");
        }
        debug!("scheduler stopped");
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Whether making `group` depend on `depends_on` would close a cycle.
///
/// Dependent edges point away from the finishing group, so `depends_on`
/// (transitively) depending on `group` shows up as a path from `group` to
/// `depends_on` along the dependent lists.
fn dependency_would_cycle(state: &State, group: TaskGroupId, depends_on: TaskGroupId) -> bool {
    let mut stack = vec![group];
    let mut visited = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == depends_on {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(slot) = state.groups.get(current) {
            stack.extend(slot.dependents.iter().copied());
        }
    }
    false
}

fn pool_size(config: &SchedulerConfig, category: WorkerCategory) -> usize {
    match category {
        WorkerCategory::ShortTasks => config.short_threads,
        WorkerCategory::LongTasks => config.long_threads,
        WorkerCategory::FileAccess => config.file_threads,
        WorkerCategory::MainThread => 0,
    }
}
