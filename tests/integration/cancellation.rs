//! Cancellation behavior through the public API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use frameflow::{
    CancelOutcome, FrameScheduler, SchedulerConfig, SchedulerError, Task, TaskPriority, WaitPolicy,
};

/// A single short worker makes queueing behavior predictable: while the
/// blocker runs, everything behind it stays in the ready queue.
fn single_worker_scheduler() -> FrameScheduler {
    FrameScheduler::with_config(SchedulerConfig::without_workers().with_short_threads(1))
}

struct Blocker {
    entered: Arc<AtomicBool>,
    release: Arc<AtomicBool>,
    task: Arc<Task>,
}

fn blocker(name: &str) -> Blocker {
    let entered = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));
    let task = {
        let entered = entered.clone();
        let release = release.clone();
        Task::from_fn(name.to_string(), move |_| {
            entered.store(true, Ordering::SeqCst);
            while !release.load(Ordering::SeqCst) {
                thread::yield_now();
            }
        })
    };
    Blocker {
        entered,
        release,
        task,
    }
}

#[test]
fn test_canceled_queued_task_never_executes() {
    let scheduler = single_worker_scheduler();
    let doomed_runs = Arc::new(AtomicUsize::new(0));
    let callbacks = Arc::new(AtomicUsize::new(0));

    let gate = blocker("gate");
    let group = {
        let callbacks = callbacks.clone();
        scheduler.create_group_with_callback(TaskPriority::ThisFrame, move |_| {
            callbacks.fetch_add(1, Ordering::SeqCst);
        })
    };
    scheduler.add_task(group, gate.task.clone()).unwrap();
    let doomed = {
        let doomed_runs = doomed_runs.clone();
        Task::from_fn("doomed", move |_| {
            doomed_runs.fetch_add(1, Ordering::SeqCst);
        })
    };
    scheduler.add_task(group, doomed.clone()).unwrap();
    scheduler.start_group(group).unwrap();

    // the worker is stuck in the gate; "doomed" is queued behind it
    while !gate.entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }
    assert_eq!(
        scheduler
            .cancel_task(&doomed, WaitPolicy::ReturnImmediately)
            .unwrap(),
        CancelOutcome::Prevented
    );

    gate.release.store(true, Ordering::SeqCst);
    scheduler.wait_for_group(group);

    assert_eq!(doomed_runs.load(Ordering::SeqCst), 0);
    assert_eq!(callbacks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancel_running_task_blocks_until_it_finishes() {
    let scheduler = single_worker_scheduler();
    let running = blocker("running");
    scheduler.start_single_task(running.task.clone(), TaskPriority::ThisFrame);
    while !running.entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    // non-blocking: report, do not wait
    assert!(matches!(
        scheduler.cancel_task(&running.task, WaitPolicy::ReturnImmediately),
        Err(SchedulerError::MustWait { .. })
    ));

    // blocking: release the task from another thread, then the wait resolves
    let release = running.release.clone();
    let releaser = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(5));
        release.store(true, Ordering::SeqCst);
    });
    assert_eq!(
        scheduler
            .cancel_task(&running.task, WaitPolicy::Block)
            .unwrap(),
        CancelOutcome::WaitedUntilFinished
    );
    assert!(running.task.is_finished());
    releaser.join().unwrap();
}

#[test]
fn test_cancel_group_with_a_running_member() {
    let scheduler = single_worker_scheduler();
    let queued_runs = Arc::new(AtomicUsize::new(0));

    let group = scheduler.create_group(TaskPriority::ThisFrame);
    let gate = blocker("gate");
    scheduler.add_task(group, gate.task.clone()).unwrap();
    let queued = {
        let queued_runs = queued_runs.clone();
        Task::from_fn("queued", move |_| {
            queued_runs.fetch_add(1, Ordering::SeqCst);
        })
    };
    scheduler.add_task(group, queued).unwrap();
    scheduler.start_group(group).unwrap();
    while !gate.entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    // the gate is running: a non-blocking group cancel reports it
    assert!(matches!(
        scheduler.cancel_group(group, WaitPolicy::ReturnImmediately),
        Err(SchedulerError::MustWait { .. })
    ));

    // cancellation is cooperative: the gate polls nothing, so release it,
    // then the blocking variant resolves the whole group
    gate.release.store(true, Ordering::SeqCst);
    assert!(scheduler.cancel_group(group, WaitPolicy::Block).is_ok());
    scheduler.wait_for_group(group);
    assert!(scheduler.is_group_finished(group));
    // the queued member was removed before it could run
    assert_eq!(queued_runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cooperative_task_observes_the_cancel_flag() {
    let scheduler = single_worker_scheduler();
    let entered = Arc::new(AtomicBool::new(false));
    let bailed_out = Arc::new(AtomicBool::new(false));
    let task = {
        let entered = entered.clone();
        let bailed_out = bailed_out.clone();
        Task::from_fn("polite", move |ctx| {
            entered.store(true, Ordering::SeqCst);
            while !ctx.is_cancel_requested() {
                thread::yield_now();
            }
            bailed_out.store(true, Ordering::SeqCst);
        })
    };
    scheduler.start_single_task(task.clone(), TaskPriority::ThisFrame);
    while !entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    assert_eq!(
        scheduler.cancel_task(&task, WaitPolicy::Block).unwrap(),
        CancelOutcome::WaitedUntilFinished
    );
    assert!(bailed_out.load(Ordering::SeqCst));
}
