//! # Priority table
//!
//! One slot per [`Priority`] level. The task in the highest precedence occupied slot is the
//! active task.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use motion_if::{MotionTask, Priority};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PriorityTable {
    slots: [Option<MotionTask>; Priority::COUNT],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `task` in its slot, replacing whatever was there.
    ///
    /// Returns `true` if `task` is now the active task.
    pub fn insert(&mut self, task: MotionTask) -> bool {
        self.slots[task.priority().index()] = Some(task);

        self.active() == Some(task)
    }

    /// Clear the slot of `task`, but only if it still holds that exact task.
    ///
    /// Returns `true` if the slot was cleared.
    pub fn remove(&mut self, task: &MotionTask) -> bool {
        let slot = &mut self.slots[task.priority().index()];

        if slot.as_ref() == Some(task) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// The task occupying the highest precedence slot.
    pub fn active(&self) -> Option<MotionTask> {
        self.slots.iter().flatten().next().copied()
    }

    /// The task occupying the given slot.
    #[cfg(test)]
    pub fn get(&self, priority: Priority) -> Option<MotionTask> {
        self.slots[priority.index()]
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_highest_precedence_wins() {
        let mut table = PriorityTable::new();
        assert!(table.is_empty());
        assert_eq!(table.active(), None);

        let idle = MotionTask::stop(Priority::Third);
        let nav = MotionTask::new(Priority::Second, 1.0, 0.1);
        let estop = MotionTask::stop(Priority::First);

        assert!(table.insert(idle));
        assert!(table.insert(nav));
        assert_eq!(table.active(), Some(nav));

        assert!(table.insert(estop));
        assert_eq!(table.active(), Some(estop));

        // A lower priority task only occupies its own slot
        let nav_2 = MotionTask::new(Priority::Second, 2.0, 0.0);
        assert!(!table.insert(nav_2));
        assert_eq!(table.active(), Some(estop));
        assert_eq!(table.get(Priority::Second), Some(nav_2));

        assert!(table.remove(&estop));
        assert_eq!(table.active(), Some(nav_2));
    }

    #[test]
    fn test_stale_remove_is_ignored() {
        let mut table = PriorityTable::new();

        let a = MotionTask::new(Priority::Second, 1.0, 0.0);
        let b = MotionTask::new(Priority::Second, 1.0, 0.0);

        table.insert(a);
        table.insert(b);

        assert!(!table.remove(&a));
        assert_eq!(table.get(Priority::Second), Some(b));

        assert!(table.remove(&b));
        assert!(table.is_empty());
    }
}
