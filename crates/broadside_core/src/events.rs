//! Match events and presentation hooks.
//!
//! The core never calls into rendering or audio. Every observable change is
//! queued as a [`MatchEvent`] on the context; a presentation layer drains the
//! queue and either matches on the events or forwards them to a
//! [`PresentationHooks`] implementation with [`MatchEvent::dispatch`].

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, MatchState, Side, UnitId};
use crate::staging::{BufferAggregate, MaterializedKind};
use crate::unit::CombatUnit;

/// Why a unit left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationCause {
    /// Reached the opposing terminus and scored.
    Boarded,
    /// Destroyed and finished sinking.
    Sunk,
}

/// Something observable that happened in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Match state machine transition.
    StateChanged {
        /// Previous state.
        from: MatchState,
        /// New state.
        to: MatchState,
    },
    /// A lane buffer changed (commit or launch).
    BufferUpdated {
        /// Lane of the buffer.
        lane: LaneIndex,
        /// Owning side.
        side: Side,
        /// New sums; zero contributors means the buffer is empty.
        aggregate: BufferAggregate,
        /// Ship type of a non-empty buffer.
        kind: Option<MaterializedKind>,
    },
    /// A buffer launched as a new unit.
    UnitMaterialized {
        /// The unit as it entered the lane.
        unit: CombatUnit,
    },
    /// Two units paired up.
    EngagementStarted {
        /// Lower-id unit that owns the fight.
        initiator: UnitId,
        /// The other unit.
        opponent: UnitId,
        /// Lane of the fight.
        lane: LaneIndex,
    },
    /// One simultaneous damage exchange.
    CombatExchange {
        /// Initiating unit.
        initiator: UnitId,
        /// Its opponent.
        opponent: UnitId,
        /// Signed initiator health afterwards.
        initiator_health: i32,
        /// Signed opponent health afterwards.
        opponent_health: i32,
    },
    /// A unit's stats changed from a card played onto it.
    UnitReinforced {
        /// The unit.
        unit: UnitId,
        /// New attack.
        attack: i32,
        /// New signed health.
        health: i32,
        /// New crew count.
        crew: u32,
    },
    /// A maneuver damaged a unit.
    UnitDamaged {
        /// The unit.
        unit: UnitId,
        /// Damage dealt.
        amount: i32,
        /// Signed health afterwards.
        health: i32,
    },
    /// A maneuver moved a unit to another lane.
    UnitRepositioned {
        /// The unit.
        unit: UnitId,
        /// Lane it left.
        from: LaneIndex,
        /// Lane it entered.
        to: LaneIndex,
    },
    /// A destroyed unit started sinking.
    UnitSinking {
        /// The unit.
        unit: UnitId,
    },
    /// A unit left the lane for good.
    UnitTerminated {
        /// The unit.
        unit: UnitId,
        /// Its side.
        side: Side,
        /// Its last lane.
        lane: LaneIndex,
        /// Why it left.
        cause: TerminationCause,
    },
    /// A side's energy changed.
    EnergyChanged {
        /// The side.
        side: Side,
        /// New energy level.
        value: u32,
    },
    /// A side scored a boarding.
    BoardingRegistered {
        /// The scoring side.
        side: Side,
        /// Boardings so far.
        count: u32,
    },
    /// A side reached the boarding threshold.
    MatchEnded {
        /// The winning side.
        winner: Side,
    },
}

/// Notify-style consumer of match events.
///
/// Every method has an empty default, so implementors only override what
/// they render.
pub trait PresentationHooks {
    /// A lane buffer preview changed.
    fn on_buffer_updated(&mut self, _lane: LaneIndex, _side: Side, _aggregate: &BufferAggregate) {}

    /// A unit was launched; instantiate its visual.
    fn on_unit_materialized(&mut self, _unit: &CombatUnit) {}

    /// A unit left the lane; destroy its visual.
    fn on_unit_terminated(&mut self, _unit: UnitId) {}

    /// A side's energy changed.
    fn on_energy_changed(&mut self, _side: Side, _value: u32) {}

    /// A side scored a boarding.
    fn on_boarding_registered(&mut self, _side: Side, _count: u32) {}

    /// The match is over.
    fn on_match_ended(&mut self, _winner: Side) {}
}

impl MatchEvent {
    /// Forward this event to the matching hook, if it has one.
    pub fn dispatch(&self, hooks: &mut dyn PresentationHooks) {
        match self {
            Self::BufferUpdated {
                lane,
                side,
                aggregate,
                ..
            } => hooks.on_buffer_updated(*lane, *side, aggregate),
            Self::UnitMaterialized { unit } => hooks.on_unit_materialized(unit),
            Self::UnitTerminated { unit, .. } => hooks.on_unit_terminated(*unit),
            Self::EnergyChanged { side, value } => hooks.on_energy_changed(*side, *value),
            Self::BoardingRegistered { side, count } => hooks.on_boarding_registered(*side, *count),
            Self::MatchEnded { winner } => hooks.on_match_ended(*winner),
            Self::StateChanged { .. }
            | Self::EngagementStarted { .. }
            | Self::CombatExchange { .. }
            | Self::UnitReinforced { .. }
            | Self::UnitDamaged { .. }
            | Self::UnitRepositioned { .. }
            | Self::UnitSinking { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PresentationHooks for Recorder {
        fn on_energy_changed(&mut self, side: Side, value: u32) {
            self.calls.push(format!("energy {side} {value}"));
        }

        fn on_match_ended(&mut self, winner: Side) {
            self.calls.push(format!("ended {winner}"));
        }
    }

    #[test]
    fn test_dispatch_reaches_overridden_hooks_only() {
        let mut recorder = Recorder::default();
        let events = [
            MatchEvent::EnergyChanged {
                side: Side::B,
                value: 4,
            },
            MatchEvent::BoardingRegistered {
                side: Side::A,
                count: 1,
            },
            MatchEvent::UnitSinking { unit: UnitId(3) },
            MatchEvent::MatchEnded { winner: Side::A },
        ];

        for event in &events {
            event.dispatch(&mut recorder);
        }

        assert_eq!(recorder.calls, vec!["energy B 4", "ended A"]);
    }
}
