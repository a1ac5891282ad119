//! Unit lifecycle phases of the match tick.
//!
//! ```text
//! Advancing ──contact──► Fighting ──opponent sinks──► Advancing
//!     │                     │
//!     │ terminus            │ health <= 0
//!     ▼                     ▼
//! Terminated ◄──sink window── Sinking
//! ```
//!
//! Every transition of a unit's motion state happens here. Each phase pulls
//! its due tasks from the scheduler in ascending unit id order.

use crate::combat::{self, ContactDecision};
use crate::components::{MotionState, UnitId};
use crate::context::MatchContext;
use crate::events::{MatchEvent, TerminationCause};
use crate::math::lane_distance;
use crate::scheduler::TaskKind;
use crate::unit::CombatUnit;

impl MatchContext {
    /// Motion phase: every due unit takes one step.
    ///
    /// New positions are computed from the pre-phase snapshot and written
    /// afterwards, so no unit observes a half-updated lane.
    pub(crate) fn run_motion_phase(&mut self) {
        let due = self
            .scheduler
            .take_due(self.now, |kind| matches!(kind, TaskKind::Motion));
        let step = self.config.unit_step();
        let lane_end = self.config.lane_end();

        let moves: Vec<_> = due
            .iter()
            .filter_map(|task| self.registry.get(task.handle.unit))
            .filter(|unit| unit.state() == MotionState::Advancing)
            .map(|unit| (unit.id(), unit.next_position(step, lane_end)))
            .collect();

        for (id, position) in moves {
            if let Some(unit) = self.registry.get_mut(id) {
                unit.set_position(position);
            }
            self.scheduler.schedule(id, TaskKind::Motion, self.now + 1);
        }
    }

    /// Boarding phase: sailing units on the opposing terminus score.
    ///
    /// Scores are registered in ascending id order and the win condition is
    /// checked after each one, so at most one side wins per tick.
    pub(crate) fn run_boarding_phase(&mut self) {
        let lane_end = self.config.lane_end();
        let arrived: Vec<_> = self
            .registry
            .iter()
            .filter(|unit| unit.state() == MotionState::Advancing)
            .filter(|unit| unit.at_opposing_terminus(lane_end))
            .map(|unit| unit.id())
            .collect();

        for id in arrived {
            if !self.is_playing() {
                break;
            }
            self.board(id);
        }
    }

    /// Pairing phase: run every sailing unit's collision check.
    pub(crate) fn run_pairing_phase(&mut self) {
        let contact = self.config.contact_distance();
        for id in self.registry.sorted_ids() {
            let Some(me) = self.registry.get(id) else {
                continue;
            };
            if me.state() != MotionState::Advancing {
                continue;
            }

            let mut candidates: Vec<_> = self
                .registry
                .units_in(me.lane(), me.side().opponent())
                .filter(|other| other.state() == MotionState::Advancing)
                .map(|other| (lane_distance(me.position(), other.position()), other.id()))
                .filter(|(distance, _)| *distance <= contact)
                .collect();
            candidates.sort_unstable();

            for (_, other) in candidates {
                if self.check_contact(id, other) {
                    break;
                }
            }
        }
    }

    /// Run `me`'s collision check against `other`.
    ///
    /// Returns true if this call created the engagement. The lower id
    /// initiates, so calling this for both units in either order pairs them
    /// exactly once.
    pub fn check_contact(&mut self, me: UnitId, other: UnitId) -> bool {
        let (Some(a), Some(b)) = (self.registry.get(me), self.registry.get(other)) else {
            return false;
        };
        match combat::on_contact(a, b, self.config.contact_distance()) {
            ContactDecision::Initiate => {
                self.engage(me, other);
                true
            }
            ContactDecision::Defer | ContactDecision::Ignore => false,
        }
    }

    /// Combat phase: due fights run one exchange.
    pub(crate) fn run_combat_phase(&mut self) {
        let due = self
            .scheduler
            .take_due(self.now, |kind| matches!(kind, TaskKind::Fight { .. }));

        for task in due {
            let TaskKind::Fight { opponent } = task.kind else {
                continue;
            };
            let initiator = task.handle.unit;
            if !self.still_fighting(initiator, opponent) {
                continue;
            }

            let Some(outcome) = self
                .registry
                .with_pair(initiator, opponent, combat::exchange)
            else {
                continue;
            };
            tracing::trace!(
                %initiator,
                %opponent,
                initiator_health = outcome.initiator_health,
                opponent_health = outcome.opponent_health,
                "Combat exchange"
            );
            self.emit(MatchEvent::CombatExchange {
                initiator,
                opponent,
                initiator_health: outcome.initiator_health,
                opponent_health: outcome.opponent_health,
            });

            if outcome.continues() {
                let wake_at = self.now + self.config.combat_interval_ticks;
                self.scheduler
                    .schedule(initiator, TaskKind::Fight { opponent }, wake_at);
                continue;
            }
            if outcome.initiator_destroyed() {
                self.sink_unit(initiator);
            }
            if outcome.opponent_destroyed() {
                self.sink_unit(opponent);
            }
        }
    }

    /// Sinking phase: units whose sink window closed leave the lane.
    pub(crate) fn run_sinking_phase(&mut self) {
        let due = self
            .scheduler
            .take_due(self.now, |kind| matches!(kind, TaskKind::Sink));

        for task in due {
            let id = task.handle.unit;
            if let Some(unit) = self.terminate(id) {
                self.stats[unit.side()].sunk += 1;
                self.emit(MatchEvent::UnitTerminated {
                    unit: id,
                    side: unit.side(),
                    lane: unit.lane(),
                    cause: TerminationCause::Sunk,
                });
                tracing::debug!(unit = %id, side = ?unit.side(), lane = unit.lane(), "Ship sunk");
            }
        }
    }

    /// Advancing -> Fighting for both units. The initiator owns the fight
    /// task and runs the first exchange this tick.
    fn engage(&mut self, initiator: UnitId, opponent: UnitId) {
        self.scheduler.cancel_unit(initiator);
        self.scheduler.cancel_unit(opponent);

        let lane = match self.registry.with_pair(initiator, opponent, |a, b| {
            a.engage(b.id());
            b.engage(a.id());
            a.lane()
        }) {
            Some(lane) => lane,
            None => panic!("engaging unregistered units {initiator} and {opponent}"),
        };
        self.scheduler
            .schedule(initiator, TaskKind::Fight { opponent }, self.now);

        for id in [initiator, opponent] {
            if let Some(unit) = self.registry.get(id) {
                self.stats[unit.side()].engagements += 1;
            }
        }
        self.emit(MatchEvent::EngagementStarted {
            initiator,
            opponent,
            lane,
        });
        tracing::debug!(%initiator, %opponent, lane, "Engagement started");
    }

    /// Put a destroyed unit into its sinking window. A fighting partner that
    /// is still afloat resumes sailing.
    pub(crate) fn sink_unit(&mut self, id: UnitId) {
        self.scheduler.cancel_unit(id);
        let Some(unit) = self.registry.get_mut(id) else {
            return;
        };
        let partner = unit.opponent();
        unit.begin_sinking();
        self.scheduler
            .schedule(id, TaskKind::Sink, self.now + self.config.sink_ticks);
        self.emit(MatchEvent::UnitSinking { unit: id });

        if let Some(partner) = partner {
            let afloat = self
                .registry
                .get(partner)
                .is_some_and(|p| p.state() == MotionState::Fighting && p.is_alive());
            if afloat {
                self.resume(partner);
            }
        }
    }

    /// Fighting -> Advancing from the current position.
    fn resume(&mut self, id: UnitId) {
        self.scheduler.cancel_unit(id);
        if let Some(unit) = self.registry.get_mut(id) {
            unit.disengage();
            self.scheduler
                .schedule(id, TaskKind::Motion, self.now + 1);
            tracing::debug!(unit = %id, health = unit.current_health(), "Ship resumes sailing");
        }
    }

    /// Score a boarding for a unit standing on the opposing terminus.
    fn board(&mut self, id: UnitId) {
        let Some(unit) = self.terminate(id) else {
            return;
        };
        let side = unit.side();
        self.emit(MatchEvent::UnitTerminated {
            unit: id,
            side,
            lane: unit.lane(),
            cause: TerminationCause::Boarded,
        });
        tracing::info!(unit = %id, side = ?side, lane = unit.lane(), "Ship boarded");
        self.register_boarding(side);
    }

    fn terminate(&mut self, id: UnitId) -> Option<CombatUnit> {
        self.scheduler.cancel_unit(id);
        let mut unit = self.registry.remove(id)?;
        unit.terminate();
        Some(unit)
    }

    fn still_fighting(&self, a: UnitId, b: UnitId) -> bool {
        let paired = |x: UnitId, y: UnitId| {
            self.registry
                .get(x)
                .is_some_and(|u| u.state() == MotionState::Fighting && u.opponent() == Some(y))
        };
        paired(a, b) && paired(b, a)
    }
}
