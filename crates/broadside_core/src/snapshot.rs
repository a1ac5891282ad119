//! Read-only match snapshots for presentation, reports and the async host.

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, MatchState, MotionState, PerSide, Side, Tick, UnitId};
use crate::context::MatchContext;
use crate::staging::BufferAggregate;
use crate::unit::CombatUnit;

/// One unit as seen from outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Attack.
    pub attack: i32,
    /// Health, clamped at zero.
    pub health: u32,
    /// Maximum health.
    pub max_health: i32,
    /// Crew aboard.
    pub crew: u32,
    /// Position along the lane.
    pub position: f32,
    /// Lifecycle state.
    pub state: MotionState,
}

impl From<&CombatUnit> for UnitSnapshot {
    fn from(unit: &CombatUnit) -> Self {
        Self {
            id: unit.id(),
            side: unit.side(),
            attack: unit.attack(),
            health: unit.display_health(),
            max_health: unit.max_health(),
            crew: unit.crew(),
            position: unit.position().to_num(),
            state: unit.state(),
        }
    }
}

/// One lane: both buffers, both cooldowns and every unit in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    /// Lane index.
    pub index: LaneIndex,
    /// Buffer sums per side.
    pub buffers: PerSide<BufferAggregate>,
    /// Ticks until each side may open a new buffer.
    pub cooldown_remaining: PerSide<Tick>,
    /// Units of both sides, in id order.
    pub units: Vec<UnitSnapshot>,
}

/// The whole match at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Ticks processed.
    pub now: Tick,
    /// Match state.
    pub state: MatchState,
    /// Winner of an ended match.
    pub winner: Option<Side>,
    /// Energy per side.
    pub energy: PerSide<u32>,
    /// Boardings per side.
    pub boardings: PerSide<u32>,
    /// Every lane.
    pub lanes: Vec<LaneSnapshot>,
}

impl MatchContext {
    /// Capture the current state.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        let lanes = (0..self.lane_count())
            .map(|index| {
                let mut units: Vec<UnitSnapshot> = Side::ALL
                    .into_iter()
                    .flat_map(move |side| self.units_in(index, side))
                    .map(UnitSnapshot::from)
                    .collect();
                units.sort_by_key(|unit| unit.id);

                LaneSnapshot {
                    index,
                    buffers: PerSide::from_fn(|side| {
                        self.buffer(index, side)
                            .map(|buffer| buffer.aggregate())
                            .unwrap_or_default()
                    }),
                    cooldown_remaining: PerSide::from_fn(|side| {
                        self.cooldown_remaining(index, side)
                    }),
                    units,
                }
            })
            .collect();

        MatchSnapshot {
            now: self.now,
            state: self.state,
            winner: self.winner,
            energy: PerSide::from_fn(|side| self.energy(side)),
            boardings: PerSide::from_fn(|side| self.boardings(side)),
            lanes,
        }
    }
}
