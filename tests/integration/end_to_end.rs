//! End-to-end scheduling scenarios with real worker threads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
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
fn test_group_of_three_tasks_fires_callback_exactly_once() {
    let scheduler = FrameScheduler::new();
    let executed = Arc::new(AtomicUsize::new(0));
    let callbacks = Arc::new(AtomicUsize::new(0));

    let group = {
        let callbacks = callbacks.clone();
        scheduler.create_group_with_callback(TaskPriority::ThisFrame, move |_| {
            callbacks.fetch_add(1, Ordering::SeqCst);
        })
    };
    for index in 0..3 {
        scheduler
            .add_task(group, counting_task(&format!("work-{index}"), &executed))
            .unwrap();
    }
    scheduler.start_group(group).unwrap();
    scheduler.wait_for_group(group);

    assert_eq!(executed.load(Ordering::SeqCst), 3);
    assert_eq!(callbacks.load(Ordering::SeqCst), 1);
    assert!(scheduler.is_group_finished(group));
}

#[test]
fn test_dependent_group_runs_strictly_after_its_dependency() {
    let scheduler = FrameScheduler::new();
    let dependency_callback_fired = Arc::new(AtomicBool::new(false));
    let violations = Arc::new(AtomicUsize::new(0));

    let group_a = {
        let flag = dependency_callback_fired.clone();
        scheduler.create_group_with_callback(TaskPriority::ThisFrame, move |_| {
            flag.store(true, Ordering::SeqCst);
        })
    };
    for index in 0..4 {
        scheduler
            .add_task(
                group_a,
                Task::from_fn(format!("slow-{index}"), |_| {
                    thread::sleep(Duration::from_millis(2));
                }),
            )
            .unwrap();
    }

    let group_b = scheduler.create_group(TaskPriority::ThisFrame);
    for index in 0..4 {
        let flag = dependency_callback_fired.clone();
        let violations = violations.clone();
        scheduler
            .add_task(
                group_b,
                Task::from_fn(format!("after-{index}"), move |_| {
                    if !flag.load(Ordering::SeqCst) {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();
    }
    scheduler.add_dependency(group_b, group_a).unwrap();

    // the dependent may be started first; none of its tasks run early
    scheduler.start_group(group_b).unwrap();
    scheduler.start_group(group_a).unwrap();
    scheduler.wait_for_group(group_b);

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(scheduler.is_group_finished(group_a));
}

#[test]
fn test_start_single_task_after_chains_work() {
    let scheduler = FrameScheduler::new();
    let order = Arc::new(AtomicUsize::new(0));

    let first = {
        let order = order.clone();
        Task::from_fn("first", move |_| {
            order
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .unwrap();
        })
    };
    let second = {
        let order = order.clone();
        Task::from_fn("second", move |_| {
            order
                .compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst)
                .unwrap();
        })
    };

    let first_group = scheduler.start_single_task(first, TaskPriority::ThisFrame);
    let second_group =
        scheduler.start_single_task_after(second, TaskPriority::ThisFrame, first_group);
    scheduler.wait_for_group(second_group);

    assert_eq!(order.load(Ordering::SeqCst), 2);
}

#[test]
fn test_many_single_tasks_all_run() {
    let scheduler = FrameScheduler::new();
    let executed = Arc::new(AtomicUsize::new(0));
    let groups: Vec<_> = (0..64)
        .map(|index| {
            scheduler.start_single_task(
                counting_task(&format!("burst-{index}"), &executed),
                TaskPriority::ThisFrame,
            )
        })
        .collect();
    for group in groups {
        scheduler.wait_for_group(group);
    }
    assert_eq!(executed.load(Ordering::SeqCst), 64);
}

#[test]
fn test_multiple_threads_can_wait_on_one_group() {
    let scheduler = Arc::new(FrameScheduler::new());
    let group = scheduler.create_group(TaskPriority::ThisFrame);
    scheduler
        .add_task(
            group,
            Task::from_fn("slow", |_| thread::sleep(Duration::from_millis(5))),
        )
        .unwrap();
    scheduler.start_group(group).unwrap();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            thread::spawn(move || {
                scheduler.wait_for_group(group);
                assert!(scheduler.is_group_finished(group));
            })
        })
        .collect();
    for waiter in waiters {
        waiter.join().unwrap();
    }
}

#[test]
fn test_help_execute_one_donates_caller_time() {
    let scheduler = FrameScheduler::with_config(SchedulerConfig::without_workers());
    let executed = Arc::new(AtomicUsize::new(0));
    scheduler.start_single_task(counting_task("donated", &executed), TaskPriority::ThisFrame);

    assert!(scheduler.help_execute_one());
    assert_eq!(executed.load(Ordering::SeqCst), 1);
    assert!(!scheduler.help_execute_one());
}
