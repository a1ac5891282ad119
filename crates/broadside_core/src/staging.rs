//! Per-lane staging buffers and the commit protocol.
//!
//! Crew cards are not deployed one by one: each (lane, side) owns a
//! [`LaneBuffer`] that accumulates contributions until the side launches it
//! as a single ship. Opening a new buffer is gated by the lane's
//! [`CooldownTracker`]; topping up an open buffer never is.

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, PerSide, Side, Tick};
use crate::cooldown::CooldownTracker;
use crate::data::{CardId, UnitDefinition, VisualRef};

/// Summed contributions of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferAggregate {
    /// Total attack.
    pub attack: i32,
    /// Total defense; becomes the launched unit's health.
    pub defense: i32,
    /// Number of cards committed.
    pub contributors: u32,
}

/// Ship type fixed by the first contribution to a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedKind {
    /// Card that opened the buffer.
    pub card: CardId,
    /// Visual of the ship that will be launched.
    pub visual: Option<VisualRef>,
}

/// Pending, not yet launched aggregate for one lane and side.
///
/// Invariant: the buffer is empty exactly when `contributors == 0`, and a
/// non-empty buffer always has a [`MaterializedKind`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaneBuffer {
    aggregate: BufferAggregate,
    kind: Option<MaterializedKind>,
}

impl LaneBuffer {
    /// Whether nothing has been committed since the last launch.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.aggregate.contributors == 0
    }

    /// Current sums.
    #[must_use]
    pub const fn aggregate(&self) -> BufferAggregate {
        self.aggregate
    }

    /// Number of committed cards.
    #[must_use]
    pub const fn contributors(&self) -> u32 {
        self.aggregate.contributors
    }

    /// Ship type of a non-empty buffer.
    #[must_use]
    pub fn kind(&self) -> Option<&MaterializedKind> {
        self.kind.as_ref()
    }

    fn contribute(&mut self, def: &UnitDefinition) {
        if self.kind.is_none() {
            self.kind = Some(MaterializedKind {
                card: def.id.clone(),
                visual: def.visual.clone(),
            });
        }
        self.aggregate.attack = self.aggregate.attack.saturating_add(def.attack);
        self.aggregate.defense = self.aggregate.defense.saturating_add(def.defense);
        self.aggregate.contributors = self.aggregate.contributors.saturating_add(1);
    }

    fn take(&mut self) -> Option<(BufferAggregate, MaterializedKind)> {
        if self.is_empty() {
            return None;
        }
        let taken = std::mem::take(self);
        match taken.kind {
            Some(kind) => Some((taken.aggregate, kind)),
            None => panic!(
                "buffer with {} contributors has no ship kind",
                taken.aggregate.contributors
            ),
        }
    }
}

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitResult {
    /// Whether the contribution was accepted.
    pub ok: bool,
    /// Whether it opened a new buffer.
    pub newly_started: bool,
}

/// Every buffer of a match plus the cooldown gate in front of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneStaging {
    buffers: Vec<PerSide<LaneBuffer>>,
    cooldowns: CooldownTracker,
}

impl LaneStaging {
    /// Create empty buffers for every lane.
    #[must_use]
    pub fn new(lane_count: usize, cooldown_ticks: Tick) -> Self {
        Self {
            buffers: vec![PerSide::default(); lane_count],
            cooldowns: CooldownTracker::new(lane_count, cooldown_ticks),
        }
    }

    /// Buffer for a lane and side, or `None` for an unknown lane.
    #[must_use]
    pub fn buffer(&self, lane: LaneIndex, side: Side) -> Option<&LaneBuffer> {
        self.buffers.get(lane).map(|slot| &slot[side])
    }

    /// The cooldown gate.
    #[must_use]
    pub const fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Add a card to a lane buffer.
    ///
    /// An empty buffer only opens when the lane is not cooling down; an open
    /// buffer accepts any contribution.
    pub fn commit(
        &mut self,
        lane: LaneIndex,
        side: Side,
        def: &UnitDefinition,
        now: Tick,
    ) -> CommitResult {
        let newly_started = self.buffers[lane][side].is_empty();
        if newly_started && self.cooldowns.is_cooling_down(lane, side, now) {
            return CommitResult::default();
        }

        self.buffers[lane][side].contribute(def);
        CommitResult {
            ok: true,
            newly_started,
        }
    }

    /// Empty a buffer for launch and start the lane cooldown.
    ///
    /// Returns `None`, touching nothing, when the buffer is empty.
    pub fn take_for_launch(
        &mut self,
        lane: LaneIndex,
        side: Side,
        now: Tick,
    ) -> Option<(BufferAggregate, MaterializedKind)> {
        let taken = self.buffers[lane][side].take()?;
        self.cooldowns.record_launch(lane, side, now);
        Some(taken)
    }

    /// Empty every buffer and forget every cooldown.
    pub fn reset(&mut self) {
        self.buffers.fill(PerSide::default());
        self.cooldowns.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitKind;

    fn crew(id: &str, attack: i32, defense: i32) -> UnitDefinition {
        UnitDefinition::new(id, id, UnitKind::Crew, 3)
            .with_stats(attack, defense)
            .with_visual(format!("{id}_ship"))
    }

    #[test]
    fn test_first_commit_opens_buffer_and_fixes_kind() {
        let mut staging = LaneStaging::new(3, 100);

        let result = staging.commit(0, Side::A, &crew("boatswain", 2, 4), 0);
        assert_eq!(
            result,
            CommitResult {
                ok: true,
                newly_started: true
            }
        );

        let result = staging.commit(0, Side::A, &crew("gunner", 4, 2), 0);
        assert!(result.ok);
        assert!(!result.newly_started);

        let buffer = staging.buffer(0, Side::A).unwrap();
        assert_eq!(
            buffer.aggregate(),
            BufferAggregate {
                attack: 6,
                defense: 6,
                contributors: 2
            }
        );
        assert_eq!(buffer.kind().unwrap().card, CardId::new("boatswain"));
        assert!(staging.buffer(0, Side::B).unwrap().is_empty());
    }

    #[test]
    fn test_launch_empties_buffer_and_starts_cooldown() {
        let mut staging = LaneStaging::new(3, 100);
        staging.commit(1, Side::B, &crew("deckhand", 1, 3), 5);

        let (aggregate, kind) = staging.take_for_launch(1, Side::B, 10).unwrap();
        assert_eq!(aggregate.contributors, 1);
        assert_eq!(kind.visual, Some(VisualRef::new("deckhand_ship")));
        assert!(staging.buffer(1, Side::B).unwrap().is_empty());
        assert!(staging.cooldowns().is_cooling_down(1, Side::B, 10));
    }

    #[test]
    fn test_huge_contributions_saturate() {
        let mut staging = LaneStaging::new(1, 100);
        let titan = crew("titan", i32::MAX, i32::MAX);
        assert!(staging.commit(0, Side::A, &titan, 0).ok);
        assert!(staging.commit(0, Side::A, &titan, 0).ok);

        let aggregate = staging.buffer(0, Side::A).unwrap().aggregate();
        assert_eq!(aggregate.attack, i32::MAX);
        assert_eq!(aggregate.defense, i32::MAX);
        assert_eq!(aggregate.contributors, 2);
    }

    #[test]
    fn test_empty_launch_changes_nothing() {
        let mut staging = LaneStaging::new(2, 100);
        let before = staging.clone();
        assert!(staging.take_for_launch(0, Side::A, 0).is_none());
        assert_eq!(staging, before);
    }

    #[test]
    fn test_cooldown_blocks_new_buffer_only() {
        let mut staging = LaneStaging::new(1, 100);
        staging.commit(0, Side::A, &crew("deckhand", 1, 3), 0);
        staging.take_for_launch(0, Side::A, 0);

        // New buffer during cooldown is refused
        let blocked = staging.commit(0, Side::A, &crew("deckhand", 1, 3), 50);
        assert!(!blocked.ok);
        assert!(staging.buffer(0, Side::A).unwrap().is_empty());

        // After the window it opens
        assert!(staging.commit(0, Side::A, &crew("deckhand", 1, 3), 100).ok);
        staging.take_for_launch(0, Side::A, 100);

        // Buffer opened before a launch keeps accepting during cooldown
        let mut staging = LaneStaging::new(1, 100);
        staging.commit(0, Side::A, &crew("deckhand", 1, 3), 0);
        staging.take_for_launch(0, Side::A, 0);
        staging.cooldowns.record_launch(0, Side::A, 0);
        staging.buffers[0][Side::A].contribute(&crew("gunner", 4, 2));
        assert!(staging.commit(0, Side::A, &crew("deckhand", 1, 3), 1).ok);
        assert_eq!(staging.buffer(0, Side::A).unwrap().contributors(), 2);
    }
}
