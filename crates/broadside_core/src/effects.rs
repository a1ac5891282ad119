//! Maneuver effects.
//!
//! Effects form a closed set. Resolving one is pure: it reads the context
//! and returns the [`EffectMutation`] to apply, or the reason it cannot
//! apply. The gateway debits energy and applies the mutation only after a
//! successful resolve.

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, MotionState, Side, UnitId};
use crate::context::MatchContext;
use crate::gateway::ActionError;
use crate::unit::CombatUnit;

/// A one-shot maneuver effect.
///
/// # Example RON
///
/// ```ron
/// Damage(amount: 5)
/// Reposition(lane_offset: -1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Damage an enemy ship.
    Damage {
        /// Health removed.
        amount: i32,
    },
    /// Steer an own sailing ship into a neighboring lane.
    Reposition {
        /// Lanes to move; negative moves towards lane zero.
        lane_offset: i32,
    },
}

/// A resolved effect, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMutation {
    /// Remove health from a unit.
    Damage {
        /// The unit hit.
        target: UnitId,
        /// Health removed.
        amount: i32,
    },
    /// Move a unit between lanes.
    Reposition {
        /// The unit moved.
        target: UnitId,
        /// Lane it leaves.
        from: LaneIndex,
        /// Lane it enters.
        to: LaneIndex,
    },
}

impl EffectKind {
    /// Resolve the effect for `side` against `target`, or against `lane`
    /// when no target is given.
    ///
    /// Damage hits an enemy ship that is sailing or fighting; without a
    /// target it hits the enemy ship in `lane` closest to the acting side's
    /// terminus. Reposition needs an own sailing ship and a destination lane
    /// holding no other ship of that side.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] explaining why the effect cannot apply.
    pub fn resolve(
        self,
        ctx: &MatchContext,
        target: Option<UnitId>,
        lane: LaneIndex,
        side: Side,
    ) -> Result<EffectMutation, ActionError> {
        match self {
            Self::Damage { amount } => {
                let unit = match target {
                    Some(id) => lookup(ctx, id)?,
                    None => lead_enemy(ctx, lane, side).ok_or(ActionError::NoTarget(lane))?,
                };
                if unit.side() == side {
                    return Err(ActionError::WrongSide {
                        unit: unit.id(),
                        side: side.opponent(),
                    });
                }
                if !unit.is_active() {
                    return Err(ActionError::UnitUnavailable {
                        unit: unit.id(),
                        state: unit.state(),
                    });
                }
                Ok(EffectMutation::Damage {
                    target: unit.id(),
                    amount,
                })
            }
            Self::Reposition { lane_offset } => {
                let id = target.ok_or(ActionError::NoTarget(lane))?;
                let unit = lookup(ctx, id)?;
                if unit.side() != side {
                    return Err(ActionError::WrongSide { unit: id, side });
                }
                if unit.state() != MotionState::Advancing {
                    return Err(ActionError::UnitUnavailable {
                        unit: id,
                        state: unit.state(),
                    });
                }

                let lane_count = ctx.lane_count();
                let to = unit
                    .lane()
                    .checked_add_signed(lane_offset as isize)
                    .filter(|to| *to < lane_count)
                    .ok_or(ActionError::InvalidLane {
                        lane: unit.lane().saturating_add_signed(lane_offset as isize),
                        lane_count,
                    })?;
                if !ctx.registry().is_lane_clear(to, side) {
                    return Err(ActionError::LaneOccupied { lane: to, side });
                }
                Ok(EffectMutation::Reposition {
                    target: id,
                    from: unit.lane(),
                    to,
                })
            }
        }
    }
}

fn lookup(ctx: &MatchContext, id: UnitId) -> Result<&CombatUnit, ActionError> {
    ctx.unit(id).ok_or(ActionError::UnknownUnit(id))
}

/// The active enemy ship in `lane` nearest to `side`'s own terminus.
fn lead_enemy(ctx: &MatchContext, lane: LaneIndex, side: Side) -> Option<&CombatUnit> {
    let enemies = ctx
        .units_in(lane, side.opponent())
        .filter(|unit| unit.is_active());
    match side {
        Side::A => enemies.min_by_key(|unit| (unit.position(), unit.id())),
        Side::B => enemies.max_by_key(|unit| (unit.position(), std::cmp::Reverse(unit.id()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::data::{CardCatalog, CardId};

    fn with_ships() -> (MatchContext, UnitId, UnitId) {
        let config = MatchConfig {
            starting_energy: 10,
            ..Default::default()
        };
        let mut ctx = MatchContext::new(config, CardCatalog::standard()).unwrap();
        ctx.start_match().unwrap();
        let deckhand = CardId::new("deckhand");
        ctx.play_card_by_id(&deckhand, 1, None, Side::A).unwrap();
        ctx.play_card_by_id(&deckhand, 1, None, Side::B).unwrap();
        let a = ctx.launch(1, Side::A).unwrap();
        let b = ctx.launch(1, Side::B).unwrap();
        (ctx, a, b)
    }

    #[test]
    fn test_damage_requires_enemy_target() {
        let (ctx, a, b) = with_ships();
        let volley = EffectKind::Damage { amount: 5 };

        assert_eq!(
            volley.resolve(&ctx, Some(b), 1, Side::A),
            Ok(EffectMutation::Damage {
                target: b,
                amount: 5
            })
        );
        assert!(matches!(
            volley.resolve(&ctx, Some(a), 1, Side::A),
            Err(ActionError::WrongSide { .. })
        ));
        assert_eq!(
            volley.resolve(&ctx, Some(UnitId(99)), 1, Side::A),
            Err(ActionError::UnknownUnit(UnitId(99)))
        );
    }

    #[test]
    fn test_untargeted_damage_hits_lead_enemy() {
        let (ctx, a, b) = with_ships();
        let volley = EffectKind::Damage { amount: 5 };

        assert_eq!(
            volley.resolve(&ctx, None, 1, Side::A),
            Ok(EffectMutation::Damage {
                target: b,
                amount: 5
            })
        );
        assert_eq!(
            volley.resolve(&ctx, None, 1, Side::B),
            Ok(EffectMutation::Damage {
                target: a,
                amount: 5
            })
        );
        assert_eq!(
            volley.resolve(&ctx, None, 0, Side::A),
            Err(ActionError::NoTarget(0))
        );
    }

    #[test]
    fn test_reposition_checks_destination() {
        let (ctx, a, _) = with_ships();

        assert_eq!(
            EffectKind::Reposition { lane_offset: 1 }.resolve(&ctx, Some(a), 1, Side::A),
            Ok(EffectMutation::Reposition {
                target: a,
                from: 1,
                to: 2
            })
        );
        assert!(matches!(
            EffectKind::Reposition { lane_offset: 2 }.resolve(&ctx, Some(a), 1, Side::A),
            Err(ActionError::InvalidLane { lane: 3, .. })
        ));
        assert!(matches!(
            EffectKind::Reposition { lane_offset: -2 }.resolve(&ctx, Some(a), 1, Side::A),
            Err(ActionError::InvalidLane { .. })
        ));
    }

    #[test]
    fn test_reposition_into_occupied_lane_rejected() {
        let (mut ctx, a, _) = with_ships();
        ctx.play_card_by_id(&CardId::new("deckhand"), 0, None, Side::A)
            .unwrap();
        ctx.launch(0, Side::A).unwrap();

        assert_eq!(
            EffectKind::Reposition { lane_offset: -1 }.resolve(&ctx, Some(a), 1, Side::A),
            Err(ActionError::LaneOccupied {
                lane: 0,
                side: Side::A
            })
        );
    }
}
