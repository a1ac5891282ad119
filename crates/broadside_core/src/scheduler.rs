//! Cooperative per-unit task scheduler.
//!
//! Every materialized unit runs one logical task at a time: sailing, fighting
//! or sinking. A task is a queue entry that wakes at a given tick; the match
//! tick pulls due tasks phase by phase, runs them, and re-arms them
//! explicitly. Nothing re-arms implicitly, so a task whose unit left the
//! matching state simply ends.
//!
//! Cancellation is explicit through [`TaskHandle`]s. Cancelled entries stay
//! in the queue and are discarded when they come due.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Tick, UnitId};

/// What a unit task does when it wakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Advance one step along the lane.
    Motion,
    /// Run one damage exchange against `opponent`.
    Fight {
        /// The unit being fought.
        opponent: UnitId,
    },
    /// Close the sinking window and remove the unit.
    Sink,
}

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Unit that owns the task.
    pub unit: UnitId,
    seq: u64,
}

/// A task whose wake tick has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    /// Handle of the task that fired.
    pub handle: TaskHandle,
    /// What to do.
    pub kind: TaskKind,
}

/// Tick-ordered queue of unit tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheduler {
    /// Ordered by wake tick, then unit id, then scheduling order.
    queue: BTreeMap<(Tick, UnitId, u64), TaskKind>,
    /// The one live task of each unit.
    live: BTreeMap<UnitId, TaskHandle>,
    next_seq: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for `unit` that wakes at `wake_at`.
    ///
    /// # Panics
    ///
    /// Panics if the unit already has a live task; callers cancel first.
    pub fn schedule(&mut self, unit: UnitId, kind: TaskKind, wake_at: Tick) -> TaskHandle {
        assert!(
            !self.live.contains_key(&unit),
            "{unit} already has a live task"
        );
        let handle = TaskHandle {
            unit,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert((wake_at, unit, handle.seq), kind);
        self.live.insert(unit, handle);
        handle
    }

    /// Cancel a task. Returns false if it had already fired or been cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if self.live.get(&handle.unit) == Some(&handle) {
            self.live.remove(&handle.unit);
            true
        } else {
            false
        }
    }

    /// Cancel whatever task `unit` has live.
    pub fn cancel_unit(&mut self, unit: UnitId) -> Option<TaskHandle> {
        self.live.remove(&unit)
    }

    /// The live task of a unit.
    #[must_use]
    pub fn live_task(&self, unit: UnitId) -> Option<TaskHandle> {
        self.live.get(&unit).copied()
    }

    /// Kind of the live task of a unit.
    #[must_use]
    pub fn live_kind(&self, unit: UnitId) -> Option<TaskKind> {
        let handle = self.live.get(&unit)?;
        self.queue
            .iter()
            .find(|((_, owner, seq), _)| *owner == unit && *seq == handle.seq)
            .map(|(_, kind)| *kind)
    }

    /// Remove and return every live task due by `now` whose kind matches,
    /// in wake order then unit id order. Stale entries are dropped.
    ///
    /// A returned task is no longer live; the caller re-arms it if needed.
    pub fn take_due(&mut self, now: Tick, wanted: impl Fn(&TaskKind) -> bool) -> Vec<DueTask> {
        let keys: Vec<_> = self
            .queue
            .range(..=(now, UnitId(u64::MAX), u64::MAX))
            .map(|(key, kind)| (*key, *kind))
            .collect();

        let mut due = Vec::new();
        for ((wake_at, unit, seq), kind) in keys {
            let handle = TaskHandle { unit, seq };
            if self.live.get(&unit) != Some(&handle) {
                self.queue.remove(&(wake_at, unit, seq));
                continue;
            }
            if !wanted(&kind) {
                continue;
            }
            self.queue.remove(&(wake_at, unit, seq));
            self.live.remove(&unit);
            due.push(DueTask { handle, kind });
        }
        due
    }

    /// Number of live tasks.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Drop every task.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_motion(kind: &TaskKind) -> bool {
        matches!(kind, TaskKind::Motion)
    }

    #[test]
    fn test_due_tasks_in_unit_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(UnitId(3), TaskKind::Motion, 1);
        scheduler.schedule(UnitId(1), TaskKind::Motion, 1);
        scheduler.schedule(UnitId(2), TaskKind::Motion, 2);

        let due = scheduler.take_due(1, is_motion);
        let units: Vec<_> = due.iter().map(|task| task.handle.unit).collect();
        assert_eq!(units, vec![UnitId(1), UnitId(3)]);

        // Fired tasks are no longer live
        assert!(scheduler.live_task(UnitId(1)).is_none());
        assert_eq!(scheduler.live_count(), 1);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(UnitId(1), TaskKind::Motion, 1);
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));

        assert!(scheduler.take_due(5, |_| true).is_empty());
    }

    #[test]
    fn test_rescheduled_unit_only_fires_new_task() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(UnitId(1), TaskKind::Motion, 1);
        scheduler.cancel_unit(UnitId(1));
        scheduler.schedule(UnitId(1), TaskKind::Sink, 1);

        let due = scheduler.take_due(1, |_| true);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, TaskKind::Sink);
    }

    #[test]
    fn test_filter_leaves_other_kinds_queued() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(UnitId(1), TaskKind::Sink, 1);
        scheduler.schedule(UnitId(2), TaskKind::Motion, 1);

        assert_eq!(scheduler.take_due(1, is_motion).len(), 1);
        assert_eq!(scheduler.live_kind(UnitId(1)), Some(TaskKind::Sink));
        assert_eq!(scheduler.take_due(1, |_| true).len(), 1);
    }

    #[test]
    #[should_panic(expected = "already has a live task")]
    fn test_double_schedule_panics() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(UnitId(1), TaskKind::Motion, 1);
        scheduler.schedule(UnitId(1), TaskKind::Motion, 2);
    }
}
