//! Worker threads.
//!
//! Each work category owns a fixed pool of threads. A worker only ever
//! dequeues from its category's bucket range: lock, select, unlock, run,
//! relock to report completion. When its range is empty the worker parks on
//! its own signal; pushing ready work kicks idle pool members round-robin so
//! load spreads instead of always waking the same thread.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Condvar;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::priority::{TaskPriority, WorkerCategory};
use crate::scheduler::Shared;

thread_local! {
    static CURRENT_CATEGORY: Cell<Option<WorkerCategory>> = const { Cell::new(None) };
}

/// Work category of the calling thread.
///
/// Worker threads report the category they were spawned for; any other
/// thread (the frame loop, loaders, tests) reports
/// [`WorkerCategory::MainThread`].
pub fn current_thread_category() -> WorkerCategory {
    CURRENT_CATEGORY
        .get()
        .unwrap_or(WorkerCategory::MainThread)
}

/// Bucket range the calling thread may help with during cooperative waits.
pub(crate) fn current_help_range() -> (TaskPriority, TaskPriority) {
    current_thread_category().priority_range()
}

/// Park/wake signal of one worker thread.
pub(crate) struct WorkerSignal {
    pub condvar: Condvar,
    pub idle: AtomicBool,
}

impl WorkerSignal {
    fn new() -> Self {
        Self {
            condvar: Condvar::new(),
            idle: AtomicBool::new(false),
        }
    }
}

/// Wake bookkeeping for one category's pool.
pub(crate) struct WorkerPool {
    category: WorkerCategory,
    signals: Vec<Arc<WorkerSignal>>,
    next_wake: AtomicUsize,
}

impl WorkerPool {
    pub fn new(category: WorkerCategory, size: usize) -> Self {
        Self {
            category,
            signals: (0..size).map(|_| Arc::new(WorkerSignal::new())).collect(),
            next_wake: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn category(&self) -> WorkerCategory {
        self.category
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.signals.len()
    }

    pub(crate) fn signal(&self, index: usize) -> Arc<WorkerSignal> {
        self.signals[index].clone()
    }

    /// Wake up to `count` idle workers, starting at the round-robin cursor.
    ///
    /// Claiming the idle flag before notifying means two concurrent pushes
    /// never pick the same sleeping worker twice.
    pub fn wake(&self, count: usize) {
        let size = self.signals.len();
        if size == 0 || count == 0 {
            return;
        }
        let start = self.next_wake.fetch_add(1, Ordering::SeqCst);
        let mut woken = 0;
        for offset in 0..size {
            let signal = &self.signals[(start + offset) % size];
            if signal.idle.swap(false, Ordering::SeqCst) {
                signal.condvar.notify_one();
                woken += 1;
                if woken >= count {
                    break;
                }
            }
        }
    }

    /// Wake every worker of the pool, idle or not. Used at shutdown.
    pub fn wake_all(&self) {
        for signal in &self.signals {
            signal.idle.store(false, Ordering::SeqCst);
            signal.condvar.notify_one();
        }
    }
}

/// Spawn the worker threads for every pooled category.
pub(crate) fn spawn_workers(
    shared: &Arc<Shared>,
    config: &SchedulerConfig,
) -> Vec<thread::JoinHandle<()>> {
    let mut handles = Vec::with_capacity(config.total_threads());
    for pool in &shared.pools {
        let category = pool.category();
        for index in 0..pool.size() {
            let shared = shared.clone();
            let handle = thread::Builder::new()
                .name(format!("ff-{}-{}", category.short_name(), index))
                .spawn(move || worker_loop(&shared, category, index))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }
    }
    handles
}

/// Main loop of one worker thread.
fn worker_loop(shared: &Arc<Shared>, category: WorkerCategory, index: usize) {
    CURRENT_CATEGORY.set(Some(category));
    let (first, last) = category.priority_range();
    let pool_index = category
        .pool_index()
        .expect("worker threads belong to pooled categories");
    let signal = shared.pools[pool_index].signal(index);
    debug!(%category, index, "worker started");

    loop {
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }
        let mut state = shared.state.lock();
        if let Some(data) = state.ready.pop_next(first, last, false, None) {
            drop(state);
            shared.run_task(&data);
            continue;
        }
        // nothing runnable in our range: park until new work is pushed.
        // `running` is re-checked under the lock, and shutdown passes through
        // the same lock before notifying, so the wakeup cannot be lost.
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }
        signal.idle.store(true, Ordering::SeqCst);
        signal.condvar.wait(&mut state);
        signal.idle.store(false, Ordering::SeqCst);
    }

    debug!(%category, index, "worker stopped");
}
