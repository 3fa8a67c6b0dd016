//! frameflow: frame-aware task scheduling
//!
//! A dependency-aware, priority-bucketed task scheduler for frame-driven
//! applications. Work is grouped into task groups with completion
//! dependencies, assigned to priority buckets (including frame-relative
//! buckets that decay at every frame boundary) and dispatched onto fixed
//! worker pools per work category. Waiting is cooperative: a blocked thread
//! executes ready work instead of sleeping, which is what keeps a
//! single-threaded category from deadlocking against itself.
//!
//! # Example
//!
//! ```
//! use frameflow::{FrameScheduler, Task, TaskPriority};
//!
//! let scheduler = FrameScheduler::new();
//!
//! let prepare = scheduler.create_group(TaskPriority::EarlyThisFrame);
//! scheduler
//!     .add_task(prepare, Task::from_fn("prepare", |_| { /* ... */ }))
//!     .unwrap();
//!
//! let render = scheduler.create_group_with_callback(TaskPriority::ThisFrame, |group| {
//!     tracing::debug!(%group, "render work done");
//! });
//! scheduler
//!     .add_task(render, Task::from_fn("render", |_| { /* ... */ }))
//!     .unwrap();
//! scheduler.add_dependency(render, prepare).unwrap();
//!
//! scheduler.start_group(render).unwrap();
//! scheduler.start_group(prepare).unwrap();
//! scheduler.wait_for_group(render);
//! assert!(scheduler.is_group_finished(prepare));
//! ```

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod group;
pub mod logger;
pub mod priority;
pub mod scheduler;
pub mod task;

mod queue;
mod worker;

// Re-exports
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use group::TaskGroupId;
pub use priority::{TaskPriority, WorkerCategory};
pub use scheduler::{CancelOutcome, FrameScheduler, SchedulerStats, WaitPolicy};
pub use task::{NestingMode, Task, TaskBuilder, TaskContext, TaskState, Workload};
pub use worker::current_thread_category;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
