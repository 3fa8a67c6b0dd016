//! Scheduler error types.

use thiserror::Error;

use crate::group::TaskGroupId;

/// Errors surfaced synchronously by scheduler operations.
///
/// Misuse of the group lifecycle (double start, modifying a started group) is
/// reported as a typed error rather than aborting; stale handles are rejected
/// without ever being dereferenced. A running task that cannot be removed
/// from the queues anymore is not a failure of the scheduler, so it gets its
/// own variant, [`SchedulerError::MustWait`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The handle's generation no longer matches the live slot.
    #[error("stale group handle {0}: the group has finished and its slot may have been reused")]
    StaleHandle(TaskGroupId),

    /// `start_group` was called twice for the same group.
    #[error("group {0} was already started")]
    GroupAlreadyStarted(TaskGroupId),

    /// Tasks and dependencies can only be added before the group starts.
    #[error("group {0} cannot be modified after it was started")]
    GroupSealed(TaskGroupId),

    /// A task can belong to at most one group per lifetime.
    #[error("task \"{name}\" already belongs to a group")]
    TaskAlreadyOwned {
        /// Name of the offending task.
        name: String,
    },

    /// The requested dependency edge would close a cycle.
    #[error("dependency of {group} on {depends_on} would create a cycle")]
    DependencyCycle {
        /// Group the dependency was being added to.
        group: TaskGroupId,
        /// The group it would depend on.
        depends_on: TaskGroupId,
    },

    /// The task is already executing, so cancellation could not prevent it.
    ///
    /// Returned by non-blocking cancellation only; the cancel flag is still
    /// set, and a cooperative task may notice it and terminate early.
    #[error("task \"{name}\" is already running and must be waited for")]
    MustWait {
        /// Name of the running task.
        name: String,
    },
}
