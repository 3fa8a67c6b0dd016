//! Property tests over the priority lattice and group completion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use frameflow::priority::{ALL_PRIORITIES, PRIORITY_COUNT};
use frameflow::{FrameScheduler, SchedulerConfig, TaskBuilder, TaskContext, TaskPriority};

proptest! {
    #[test]
    fn decay_always_terminates_at_the_present(index in 0usize..PRIORITY_COUNT) {
        let priority = TaskPriority::from_index(index).unwrap();
        let mut current = priority;
        let mut steps = 0;
        while let Some(next) = current.decay_target() {
            // each step moves strictly toward the front of the line
            prop_assert!(next < current);
            current = next;
            steps += 1;
            prop_assert!(steps <= PRIORITY_COUNT);
        }
        if index <= TaskPriority::In9Frames.index() {
            prop_assert_eq!(current, TaskPriority::EarlyThisFrame);
        }
    }

    #[test]
    fn decay_targets_stay_frame_relative(index in 0usize..PRIORITY_COUNT) {
        let priority = ALL_PRIORITIES[index];
        if let Some(target) = priority.decay_target() {
            prop_assert!(target.index() <= TaskPriority::In9Frames.index());
            prop_assert!(!target.is_main_thread_only());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn groups_complete_for_any_shape(
        task_count in 1usize..6,
        multiplicity in 1u32..5,
    ) {
        let scheduler = FrameScheduler::with_config(
            SchedulerConfig::without_workers().with_short_threads(2),
        );
        let executed = Arc::new(AtomicUsize::new(0));
        let callbacks = Arc::new(AtomicUsize::new(0));

        let group = {
            let callbacks = callbacks.clone();
            scheduler.create_group_with_callback(TaskPriority::ThisFrame, move |_| {
                callbacks.fetch_add(1, Ordering::SeqCst);
            })
        };
        for index in 0..task_count {
            let executed = executed.clone();
            let task = TaskBuilder::new()
                .name(format!("t{index}"))
                .multiplicity(multiplicity)
                .build(move |_: &TaskContext<'_>| {
                    executed.fetch_add(1, Ordering::SeqCst);
                });
            scheduler.add_task(group, task).unwrap();
        }
        scheduler.start_group(group).unwrap();
        scheduler.wait_for_group(group);

        prop_assert_eq!(
            executed.load(Ordering::SeqCst),
            task_count * multiplicity as usize
        );
        prop_assert_eq!(callbacks.load(Ordering::SeqCst), 1);
    }
}
