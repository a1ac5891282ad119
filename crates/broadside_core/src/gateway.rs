//! Action gateway: the single entry point for player actions.
//!
//! Humans and automated policies play cards and launch buffers through the
//! same two operations. Every check runs before any state changes, and
//! energy is debited last, so a rejected action never leaves a trace. The
//! one exception is the lane commit, which debits speculatively and refunds
//! when the cooldown refuses a new buffer.

use thiserror::Error;

use crate::combat;
use crate::components::{LaneIndex, MatchState, MotionState, Side, UnitId};
use crate::context::MatchContext;
use crate::data::{CardId, UnitDefinition, UnitKind};
use crate::effects::EffectMutation;
use crate::events::MatchEvent;
use crate::math::Fixed;
use crate::scheduler::TaskKind;
use crate::staging::{BufferAggregate, CommitResult};

/// Broad class of a rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed request: bad lane, unknown card or unit, wrong match state.
    InvalidInput,
    /// Well-formed but refused by the rules: energy, cooldown, occupancy.
    Policy,
}

/// Why the gateway refused an action. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Actions are only accepted while playing.
    #[error("match is {0:?}, not Playing")]
    NotPlaying(MatchState),

    /// No card definition was supplied.
    #[error("no card definition supplied")]
    MissingCard,

    /// The card id is not in the catalog.
    #[error("unknown card '{0}'")]
    UnknownCard(CardId),

    /// Lane index out of range.
    #[error("lane {lane} does not exist ({lane_count} lanes)")]
    InvalidLane {
        /// Requested lane.
        lane: LaneIndex,
        /// Lanes in the match.
        lane_count: usize,
    },

    /// Target unit is not registered.
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    /// Target unit belongs to the wrong side for this card.
    #[error("unit {unit} does not belong to side {side}")]
    WrongSide {
        /// The target.
        unit: UnitId,
        /// Side the card requires.
        side: Side,
    },

    /// Target unit is in a state the card cannot act on.
    #[error("unit {unit} is {state:?}")]
    UnitUnavailable {
        /// The target.
        unit: UnitId,
        /// Its current state.
        state: MotionState,
    },

    /// The card must be played onto a unit.
    #[error("card '{0}' needs a target unit")]
    TargetRequired(CardId),

    /// The card has no playable form.
    #[error("card '{0}' cannot be played")]
    NotPlayable(CardId),

    /// Not enough energy.
    #[error("insufficient energy: need {needed}, have {available}")]
    InsufficientEnergy {
        /// Card cost.
        needed: u32,
        /// Side's current energy.
        available: u32,
    },

    /// The lane buffer is empty and the lane is still cooling down.
    #[error("lane {lane} is cooling down for {remaining} more ticks")]
    CoolingDown {
        /// The lane.
        lane: LaneIndex,
        /// Ticks left.
        remaining: u64,
    },

    /// Nothing to launch.
    #[error("lane {0} has an empty buffer")]
    EmptyBuffer(LaneIndex),

    /// The destination lane already holds a ship of that side.
    #[error("lane {lane} is occupied by side {side}")]
    LaneOccupied {
        /// Destination lane.
        lane: LaneIndex,
        /// Occupying side.
        side: Side,
    },

    /// No valid target for an untargeted effect.
    #[error("no target in lane {0}")]
    NoTarget(LaneIndex),
}

impl ActionError {
    /// Classify the rejection.
    #[must_use]
    pub const fn kind(&self) -> Rejection {
        match self {
            Self::NotPlaying(_)
            | Self::MissingCard
            | Self::UnknownCard(_)
            | Self::InvalidLane { .. }
            | Self::UnknownUnit(_)
            | Self::TargetRequired(_)
            | Self::NotPlayable(_) => Rejection::InvalidInput,
            Self::WrongSide { .. }
            | Self::UnitUnavailable { .. }
            | Self::InsufficientEnergy { .. }
            | Self::CoolingDown { .. }
            | Self::EmptyBuffer(_)
            | Self::LaneOccupied { .. }
            | Self::NoTarget(_) => Rejection::Policy,
        }
    }
}

/// What a successful card play did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The card went into a lane buffer.
    Committed(CommitResult),
    /// The card was fitted to an existing unit.
    Reinforced(UnitId),
    /// A maneuver effect was applied.
    EffectApplied(EffectMutation),
}

impl MatchContext {
    /// Play a card for `side`.
    ///
    /// With a target, crew and equipment are fitted onto that own unit.
    /// Without one, crew is committed to the lane buffer. Maneuvers resolve
    /// their effect against the target or lane.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] that refused the play; no state changed.
    pub fn play_card(
        &mut self,
        def: &UnitDefinition,
        lane: LaneIndex,
        target: Option<UnitId>,
        side: Side,
    ) -> Result<PlayOutcome, ActionError> {
        self.ensure_playing()?;
        self.ensure_lane(lane)?;

        let available = self.pools[side].current();
        if available < def.energy_cost {
            return Err(ActionError::InsufficientEnergy {
                needed: def.energy_cost,
                available,
            });
        }

        let outcome = match (def.kind, target) {
            (UnitKind::Crew | UnitKind::Equipment, Some(unit)) => {
                self.reinforce_unit(def, unit, side)?
            }
            (UnitKind::Crew, None) => self.commit_to_lane(def, lane, side)?,
            (UnitKind::Maneuver, _) => {
                let effect = def
                    .effect
                    .ok_or_else(|| ActionError::NotPlayable(def.id.clone()))?;
                let mutation = effect.resolve(self, target, lane, side)?;
                self.debit(side, def.energy_cost);
                self.apply_mutation(mutation);
                PlayOutcome::EffectApplied(mutation)
            }
            (UnitKind::Equipment, None) => {
                return Err(ActionError::TargetRequired(def.id.clone()));
            }
            (UnitKind::Other, _) => return Err(ActionError::NotPlayable(def.id.clone())),
        };

        self.stats[side].cards_played += 1;
        self.emit_energy(side);
        tracing::debug!(side = ?side, card = %def.id, lane, ?outcome, "Card played");
        Ok(outcome)
    }

    /// Look a card up in the catalog and play it.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownCard`] for an id not in the catalog, otherwise
    /// as [`Self::play_card`].
    pub fn play_card_by_id(
        &mut self,
        card: &CardId,
        lane: LaneIndex,
        target: Option<UnitId>,
        side: Side,
    ) -> Result<PlayOutcome, ActionError> {
        self.ensure_playing()?;
        let def = self
            .catalog
            .get(card)
            .cloned()
            .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
        self.play_card(&def, lane, target, side)
    }

    /// Boolean form of [`Self::play_card`]; an absent definition fails.
    ///
    /// The rejection reason is logged at debug level.
    pub fn try_play_card(
        &mut self,
        def: Option<&UnitDefinition>,
        lane: LaneIndex,
        target: Option<UnitId>,
        side: Side,
    ) -> bool {
        let result = match def {
            Some(def) => self.play_card(def, lane, target, side).map(|_| ()),
            None => Err(ActionError::MissingCard),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(side = ?side, lane, reason = %err, kind = ?err.kind(), "Card rejected");
                false
            }
        }
    }

    /// Launch a lane buffer as a new unit.
    ///
    /// This is the only way a unit enters the simulation. The unit starts at
    /// the side's own terminus and sails on the next tick; the lane cooldown
    /// starts now.
    ///
    /// # Errors
    ///
    /// [`ActionError::EmptyBuffer`] if nothing is committed, or the state
    /// and lane errors of [`Self::play_card`].
    pub fn launch(&mut self, lane: LaneIndex, side: Side) -> Result<UnitId, ActionError> {
        self.ensure_playing()?;
        self.ensure_lane(lane)?;

        let (aggregate, kind) = self
            .staging
            .take_for_launch(lane, side, self.now)
            .ok_or(ActionError::EmptyBuffer(lane))?;

        let spawn = match side {
            Side::A => Fixed::ZERO,
            Side::B => self.config.lane_end(),
        };
        let id = self
            .registry
            .materialize(side, lane, aggregate, kind, spawn, self.now);
        self.scheduler.schedule(id, TaskKind::Motion, self.now + 1);
        self.stats[side].launched += 1;

        self.emit(MatchEvent::BufferUpdated {
            lane,
            side,
            aggregate: BufferAggregate::default(),
            kind: None,
        });
        if let Some(unit) = self.registry.get(id) {
            self.emit(MatchEvent::UnitMaterialized { unit: unit.clone() });
        }
        tracing::info!(
            side = ?side,
            lane,
            unit = %id,
            attack = aggregate.attack,
            health = aggregate.defense,
            crew = aggregate.contributors,
            "Ship launched"
        );
        Ok(id)
    }

    /// Boolean form of [`Self::launch`].
    pub fn launch_from_lane(&mut self, lane: LaneIndex, side: Side) -> bool {
        match self.launch(lane, side) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(side = ?side, lane, reason = %err, kind = ?err.kind(), "Launch rejected");
                false
            }
        }
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        if self.state == MatchState::Playing {
            Ok(())
        } else {
            Err(ActionError::NotPlaying(self.state))
        }
    }

    fn ensure_lane(&self, lane: LaneIndex) -> Result<(), ActionError> {
        if lane < self.config.lane_count {
            Ok(())
        } else {
            Err(ActionError::InvalidLane {
                lane,
                lane_count: self.config.lane_count,
            })
        }
    }

    /// Debit energy that validation already proved available.
    fn debit(&mut self, side: Side, amount: u32) {
        let debited = self.pools[side].try_debit(amount);
        assert!(debited, "energy debit of {amount} failed after validation");
    }

    fn commit_to_lane(
        &mut self,
        def: &UnitDefinition,
        lane: LaneIndex,
        side: Side,
    ) -> Result<PlayOutcome, ActionError> {
        self.debit(side, def.energy_cost);
        let result = self.staging.commit(lane, side, def, self.now);
        if !result.ok {
            self.pools[side].refund(def.energy_cost);
            return Err(ActionError::CoolingDown {
                lane,
                remaining: self.cooldown_remaining(lane, side),
            });
        }

        if let Some(buffer) = self.staging.buffer(lane, side) {
            let event = MatchEvent::BufferUpdated {
                lane,
                side,
                aggregate: buffer.aggregate(),
                kind: buffer.kind().cloned(),
            };
            self.emit(event);
        }
        Ok(PlayOutcome::Committed(result))
    }

    fn reinforce_unit(
        &mut self,
        def: &UnitDefinition,
        target: UnitId,
        side: Side,
    ) -> Result<PlayOutcome, ActionError> {
        let unit = self
            .registry
            .get(target)
            .ok_or(ActionError::UnknownUnit(target))?;
        if unit.side() != side {
            return Err(ActionError::WrongSide { unit: target, side });
        }
        if !unit.is_active() {
            return Err(ActionError::UnitUnavailable {
                unit: target,
                state: unit.state(),
            });
        }

        self.debit(side, def.energy_cost);
        let Some(unit) = self.registry.get_mut(target) else {
            unreachable!("{target} vanished during validation");
        };
        combat::reinforce(unit, def);
        let event = MatchEvent::UnitReinforced {
            unit: target,
            attack: unit.attack(),
            health: unit.current_health(),
            crew: unit.crew(),
        };
        self.emit(event);
        Ok(PlayOutcome::Reinforced(target))
    }

    fn apply_mutation(&mut self, mutation: EffectMutation) {
        match mutation {
            EffectMutation::Damage { target, amount } => {
                let Some(unit) = self.registry.get_mut(target) else {
                    unreachable!("{target} vanished during effect resolution");
                };
                let destroyed = combat::apply_damage(unit, amount);
                let health = unit.current_health();
                self.emit(MatchEvent::UnitDamaged {
                    unit: target,
                    amount,
                    health,
                });
                if destroyed {
                    self.sink_unit(target);
                }
            }
            EffectMutation::Reposition { target, from, to } => {
                self.registry.relocate(target, to);
                self.emit(MatchEvent::UnitRepositioned {
                    unit: target,
                    from,
                    to,
                });
            }
        }
    }
}
