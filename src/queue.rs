//! Ready queues.
//!
//! One FIFO list per priority bucket, holding the invocations of tasks whose
//! groups have been started and whose dependencies are satisfied. All access
//! happens under the scheduler lock.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::group::TaskGroupId;
use crate::priority::{TaskPriority, ALL_PRIORITIES, PRIORITY_COUNT};
use crate::task::{NestingMode, Task};

/// One ready invocation of a task.
#[derive(Clone)]
pub(crate) struct TaskData {
    pub task: Arc<Task>,
    pub group: TaskGroupId,
    pub invocation: u32,
}

/// Per-priority FIFO ready lists.
pub(crate) struct ReadyQueues {
    queues: [VecDeque<TaskData>; PRIORITY_COUNT],
}

impl ReadyQueues {
    pub fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| VecDeque::new()),
        }
    }

    /// Append an invocation to the back of its bucket.
    pub fn push(&mut self, priority: TaskPriority, data: TaskData) {
        self.queues[priority.index()].push_back(data);
    }

    /// Number of ready invocations in one bucket.
    #[inline]
    pub fn len(&self, priority: TaskPriority) -> usize {
        self.queues[priority.index()].len()
    }

    /// Select and remove the next runnable invocation.
    ///
    /// Buckets are scanned from `first` to `last`, FIFO within a bucket. An
    /// entry qualifies if the caller accepts waiting tasks, or the task never
    /// waits, or the task belongs to the group the caller is waiting for.
    /// The last clause is the exemption that lets a waiter drain the very
    /// group it is blocked on instead of deadlocking.
    pub fn pop_next(
        &mut self,
        first: TaskPriority,
        last: TaskPriority,
        only_non_waiting: bool,
        waiting_for: Option<TaskGroupId>,
    ) -> Option<TaskData> {
        for priority in TaskPriority::span(first, last) {
            let queue = &mut self.queues[priority.index()];
            let position = queue.iter().position(|data| {
                !only_non_waiting
                    || data.task.nesting() == NestingMode::NeverWaits
                    || waiting_for == Some(data.group)
            });
            if let Some(position) = position {
                return queue.remove(position);
            }
        }
        None
    }

    /// Remove every queued invocation of the given task.
    ///
    /// Returns how many invocations were removed.
    pub fn remove_task(&mut self, task: &Arc<Task>) -> u32 {
        let mut removed = 0;
        for queue in &mut self.queues {
            let before = queue.len();
            queue.retain(|data| !Arc::ptr_eq(&data.task, task));
            removed += (before - queue.len()) as u32;
        }
        removed
    }

    /// Apply the frame-boundary decay to all frame-relative buckets.
    ///
    /// Buckets are visited in dispatch order, so each target bucket has
    /// already been emptied (or is `EarlyThisFrame`, where leftover late work
    /// belongs at the front of the line) by the time entries move into it.
    /// Buckets that are empty stay empty; nothing is dropped.
    pub fn decay_frame_buckets(&mut self) {
        for priority in ALL_PRIORITIES {
            let Some(target) = priority.decay_target() else {
                continue;
            };
            if self.queues[priority.index()].is_empty() {
                continue;
            }
            let mut moved = std::mem::take(&mut self.queues[priority.index()]);
            self.queues[target.index()].append(&mut moved);
        }
    }
}
