//! Task groups and group handles.
//!
//! Groups live in a reusable slot pool. A slot is identified by its index and
//! a generation counter; the [`TaskGroupId`] handle snapshots both at creation
//! time and is only valid while the live slot still carries the exact same
//! generation. When a group finishes, the slot's generation advances by 2, so
//! every outstanding handle to it turns stale at that instant and is rejected
//! (never dereferenced) from then on.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Condvar;
use smallvec::SmallVec;

use crate::priority::TaskPriority;
use crate::task::Task;

/// Generation step applied when a group finishes.
///
/// Generations of live slots are always even; the low bit is reserved so an
/// odd generation can never name a live group. [`TaskGroupId::invalid`] uses
/// that to produce a handle that is stale by construction.
pub(crate) const GENERATION_STEP: u32 = 2;

const FIRST_GENERATION: u32 = 2;
const INVALID_GENERATION: u32 = 1;

/// Callback invoked exactly once when a group finishes.
pub type OnGroupFinished = Box<dyn FnOnce(TaskGroupId) + Send>;

/// Handle to a task group.
///
/// Handles stay meaningful forever: querying a finished (and possibly reused)
/// group through an old handle correctly reports it as finished, because the
/// slot's generation no longer matches the snapshot in the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskGroupId {
    slot: u32,
    generation: u32,
}

impl TaskGroupId {
    #[inline]
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// A handle that never refers to any group and always reads as finished.
    #[inline]
    pub fn invalid() -> Self {
        Self {
            slot: 0,
            generation: INVALID_GENERATION,
        }
    }

    /// Slot index of this handle.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.slot as usize
    }

    /// Generation snapshot of this handle.
    #[inline]
    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for TaskGroupId {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for TaskGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({}.{})", self.slot, self.generation)
    }
}

/// One slot of the group pool. All fields are guarded by the scheduler lock.
pub(crate) struct GroupSlot {
    /// Current generation. Even while the slot can be referenced.
    pub generation: u32,
    /// Slot is allocated. Only cleared after the finish callback has run.
    pub in_use: bool,
    /// `start_group` has been called.
    pub started: bool,
    /// The group's tasks have been pushed into the ready queues.
    pub tasks_scheduled: bool,
    /// Priority all tasks of this group run at.
    pub priority: TaskPriority,
    /// Tasks owned by this group, in insertion order.
    pub tasks: Vec<Arc<Task>>,
    /// Tasks not yet finished. The group finishes when this reaches zero.
    pub remaining_tasks: AtomicU32,
    /// Dependencies that have not finished yet.
    pub unfinished_dependencies: u32,
    /// Groups that depend on this one.
    pub dependents: SmallVec<[TaskGroupId; 4]>,
    /// Invoked once when the group finishes.
    pub on_finished: Option<OnGroupFinished>,
    /// Wakes threads blocked on this group. Waiters always pair this with the
    /// scheduler lock, which also guards the generation bump.
    pub condvar: Arc<Condvar>,
}

impl GroupSlot {
    fn new() -> Self {
        Self {
            generation: FIRST_GENERATION,
            in_use: false,
            started: false,
            tasks_scheduled: false,
            priority: TaskPriority::default(),
            tasks: Vec::new(),
            remaining_tasks: AtomicU32::new(0),
            unfinished_dependencies: 0,
            dependents: SmallVec::new(),
            on_finished: None,
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Handle naming the current incarnation of this slot.
    #[inline]
    pub fn id(&self, slot_index: usize) -> TaskGroupId {
        TaskGroupId::new(slot_index as u32, self.generation)
    }
}

/// The slot pool. Grows on demand and recycles finished slots.
pub(crate) struct GroupPool {
    slots: Vec<GroupSlot>,
    free: Vec<usize>,
}

impl GroupPool {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a slot for a new group. Never fails; the pool grows as needed.
    pub fn alloc(
        &mut self,
        priority: TaskPriority,
        on_finished: Option<OnGroupFinished>,
    ) -> TaskGroupId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(GroupSlot::new());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        debug_assert!(!slot.in_use);
        slot.in_use = true;
        slot.started = false;
        slot.tasks_scheduled = false;
        slot.priority = priority;
        slot.tasks.clear();
        slot.remaining_tasks.store(0, Ordering::SeqCst);
        slot.unfinished_dependencies = 0;
        slot.dependents.clear();
        slot.on_finished = on_finished;
        slot.id(index)
    }

    /// Return a slot to the free list. Legal only after its finish callback
    /// has completed.
    pub fn release(&mut self, slot_index: usize) {
        let slot = &mut self.slots[slot_index];
        debug_assert!(slot.in_use);
        slot.in_use = false;
        self.free.push(slot_index);
    }

    /// Access the live slot behind a handle, if the handle is still valid.
    pub fn get(&self, id: TaskGroupId) -> Option<&GroupSlot> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.in_use && slot.generation == id.generation())
    }

    /// Mutable variant of [`GroupPool::get`].
    pub fn get_mut(&mut self, id: TaskGroupId) -> Option<&mut GroupSlot> {
        self.slots
            .get_mut(id.slot())
            .filter(|slot| slot.in_use && slot.generation == id.generation())
    }

    /// Access a slot by index, regardless of handle validity.
    pub fn slot_mut(&mut self, slot_index: usize) -> &mut GroupSlot {
        &mut self.slots[slot_index]
    }

    /// Whether the group behind the handle has finished.
    ///
    /// A stale handle (generation mismatch, out-of-range slot or the invalid
    /// handle) always reports finished; the group it once named is gone.
    pub fn is_finished(&self, id: TaskGroupId) -> bool {
        self.get(id).is_none()
    }

    /// Number of slots ever allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
