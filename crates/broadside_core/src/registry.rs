//! Lane registry: which units occupy which lane and side.
//!
//! Storage is ordered by [`UnitId`], so every iteration is deterministic.
//! Sinking units stay registered until their sink window closes but no
//! longer count as occupying their lane.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, PerSide, Side, Tick, UnitId};
use crate::math::Fixed;
use crate::staging::{BufferAggregate, MaterializedKind};
use crate::unit::CombatUnit;

/// Owner of every materialized unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRegistry {
    units: BTreeMap<UnitId, CombatUnit>,
    lanes: Vec<PerSide<BTreeSet<UnitId>>>,
    /// Next id to assign. Never reset, so ids are unique for the lifetime
    /// of the registry.
    next_id: u64,
}

impl LaneRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(lane_count: usize) -> Self {
        Self {
            units: BTreeMap::new(),
            lanes: vec![PerSide::default(); lane_count],
            next_id: 1,
        }
    }

    /// Number of lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Register a new unit built from a launched buffer.
    pub(crate) fn materialize(
        &mut self,
        side: Side,
        lane: LaneIndex,
        aggregate: BufferAggregate,
        kind: MaterializedKind,
        position: Fixed,
        now: Tick,
    ) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;

        let unit = CombatUnit::materialize(id, side, lane, aggregate, kind, position, now);
        self.lanes[lane][side].insert(id);
        self.units.insert(id, unit);
        id
    }

    /// Remove a unit from the registry.
    pub(crate) fn remove(&mut self, id: UnitId) -> Option<CombatUnit> {
        let unit = self.units.remove(&id)?;
        self.lanes[unit.lane()][unit.side()].remove(&id);
        Some(unit)
    }

    /// Move a unit to another lane, keeping its position along the lane.
    pub(crate) fn relocate(&mut self, id: UnitId, to: LaneIndex) -> Option<LaneIndex> {
        let unit = self.units.get_mut(&id)?;
        let from = unit.lane();
        self.lanes[from][unit.side()].remove(&id);
        self.lanes[to][unit.side()].insert(id);
        unit.set_lane(to);
        Some(from)
    }

    /// Look up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&CombatUnit> {
        self.units.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut CombatUnit> {
        self.units.get_mut(&id)
    }

    /// Run `f` with mutable access to two distinct units at once.
    pub(crate) fn with_pair<R>(
        &mut self,
        a: UnitId,
        b: UnitId,
        f: impl FnOnce(&mut CombatUnit, &mut CombatUnit) -> R,
    ) -> Option<R> {
        assert_ne!(a, b, "with_pair needs two distinct units");
        let mut first = self.units.remove(&a)?;
        let result = self.units.get_mut(&b).map(|second| f(&mut first, second));
        self.units.insert(a, first);
        result
    }

    /// Whether a unit is registered.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// All registered units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.values()
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Units of one side in one lane, in id order. Includes sinking units.
    pub fn units_in(&self, lane: LaneIndex, side: Side) -> impl Iterator<Item = &CombatUnit> {
        self.lanes
            .get(lane)
            .into_iter()
            .flat_map(move |slot| slot[side].iter())
            .filter_map(move |id| self.units.get(id))
    }

    /// Units of one side across all lanes, in id order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &CombatUnit> {
        self.units.values().filter(move |unit| unit.side() == side)
    }

    /// Number of units of `side` actively occupying `lane`.
    #[must_use]
    pub fn occupancy(&self, lane: LaneIndex, side: Side) -> usize {
        self.units_in(lane, side)
            .filter(|unit| unit.is_active())
            .count()
    }

    /// Whether `lane` has no active unit of `side`.
    #[must_use]
    pub fn is_lane_clear(&self, lane: LaneIndex, side: Side) -> bool {
        self.occupancy(lane, side) == 0
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Remove every unit. The id counter keeps running.
    pub(crate) fn clear(&mut self) {
        self.units.clear();
        for slot in &mut self.lanes {
            slot.a.clear();
            slot.b.clear();
        }
    }
}
