//! Frame-boundary behavior through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use frameflow::{FrameScheduler, SchedulerConfig, Task, TaskPriority};

fn counting_task(name: &str, counter: &Arc<AtomicUsize>) -> Arc<Task> {
    let counter = counter.clone();
    Task::from_fn(name.to_string(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_main_thread_tasks_wait_for_the_frame_boundary() {
    let scheduler = FrameScheduler::new();
    let executed = Arc::new(AtomicUsize::new(0));
    scheduler.start_single_task(
        counting_task("ui-update", &executed),
        TaskPriority::ThisFrameMainThread,
    );

    // worker threads must never touch main-thread-only buckets
    thread::sleep(Duration::from_millis(10));
    assert_eq!(executed.load(Ordering::SeqCst), 0);

    scheduler.run_frame_boundary();
    assert_eq!(executed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_paced_background_tasks_make_progress_frame_by_frame() {
    let scheduler = FrameScheduler::with_config(
        SchedulerConfig::without_workers()
            .with_frame_task_budget(1)
            .with_target_frame_time(Duration::from_secs(10)),
    );
    let executed = Arc::new(AtomicUsize::new(0));
    for index in 0..5 {
        scheduler.start_single_task(
            counting_task(&format!("upload-{index}"), &executed),
            TaskPriority::SomeFrameMainThread,
        );
    }

    for frame in 1..=5 {
        scheduler.run_frame_boundary();
        assert_eq!(executed.load(Ordering::SeqCst), frame);
    }
}

#[test]
fn test_frame_budget_bounds_background_work_per_frame() {
    let scheduler = FrameScheduler::with_config(
        SchedulerConfig::without_workers()
            .with_frame_task_budget(2)
            .with_target_frame_time(Duration::from_secs(10)),
    );
    let executed = Arc::new(AtomicUsize::new(0));
    for index in 0..6 {
        scheduler.start_single_task(
            counting_task(&format!("upload-{index}"), &executed),
            TaskPriority::SomeFrameMainThread,
        );
    }

    scheduler.run_frame_boundary();
    assert_eq!(executed.load(Ordering::SeqCst), 2);
    scheduler.run_frame_boundary();
    assert_eq!(executed.load(Ordering::SeqCst), 4);
}

#[test]
fn test_future_frame_work_eventually_runs_without_workers_touching_it_early() {
    // a task scheduled "in 3 frames" runs once enough boundaries have passed,
    // even though only the frame loop drives execution here
    let scheduler = FrameScheduler::with_config(SchedulerConfig::without_workers());
    let executed = Arc::new(AtomicUsize::new(0));
    scheduler.start_single_task(counting_task("later", &executed), TaskPriority::In3Frames);

    for _ in 0..4 {
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        scheduler.run_frame_boundary();
    }
    // by now the task has decayed into the this-frame range; donate one slot
    assert!(scheduler.help_execute_one());
    assert_eq!(executed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_frame_boundary_with_empty_queues_is_harmless() {
    let scheduler = FrameScheduler::with_config(SchedulerConfig::without_workers());
    for _ in 0..8 {
        scheduler.run_frame_boundary();
    }
    assert!(!scheduler.help_execute_one());
}
