//! Pairwise combat resolution.
//!
//! Two units that meet in a lane fight in discrete exchanges. Each exchange
//! is simultaneous: both damage values are computed from the attacks before
//! either health changes, and destruction is checked only afterwards, so a
//! mutual kill destroys both ships.
//!
//! This module is the only writer of unit health.

use serde::{Deserialize, Serialize};

use crate::components::MotionState;
use crate::data::{UnitDefinition, UnitKind};
use crate::math::{lane_distance, Fixed};
use crate::unit::CombatUnit;

/// Health of both units after one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    /// Signed health of the initiating unit.
    pub initiator_health: i32,
    /// Signed health of its opponent.
    pub opponent_health: i32,
}

impl ExchangeOutcome {
    /// The initiator was destroyed.
    #[must_use]
    pub const fn initiator_destroyed(&self) -> bool {
        self.initiator_health <= 0
    }

    /// The opponent was destroyed.
    #[must_use]
    pub const fn opponent_destroyed(&self) -> bool {
        self.opponent_health <= 0
    }

    /// Neither unit survived.
    #[must_use]
    pub const fn mutual_destruction(&self) -> bool {
        self.initiator_destroyed() && self.opponent_destroyed()
    }

    /// Both units survived and keep fighting.
    #[must_use]
    pub const fn continues(&self) -> bool {
        !self.initiator_destroyed() && !self.opponent_destroyed()
    }
}

/// Run one simultaneous exchange.
pub(crate) fn exchange(initiator: &mut CombatUnit, opponent: &mut CombatUnit) -> ExchangeOutcome {
    let to_initiator = opponent.attack();
    let to_opponent = initiator.attack();
    initiator.adjust_health(to_initiator.saturating_neg());
    opponent.adjust_health(to_opponent.saturating_neg());

    ExchangeOutcome {
        initiator_health: initiator.current_health(),
        opponent_health: opponent.current_health(),
    }
}

/// Apply effect damage. Returns true if the unit is destroyed.
///
/// Negative amounts deal nothing; they never heal.
pub(crate) fn apply_damage(unit: &mut CombatUnit, amount: i32) -> bool {
    unit.adjust_health(amount.max(0).saturating_neg());
    !unit.is_alive()
}

/// Fit a card directly onto a unit.
///
/// Crew adds its attack and defense plus one crew member; equipment only its
/// attack and defense.
pub(crate) fn reinforce(unit: &mut CombatUnit, def: &UnitDefinition) {
    let crew = u32::from(def.kind == UnitKind::Crew);
    unit.add_stats(def.attack, def.defense, crew);
}

/// What a unit's collision check does about another unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactDecision {
    /// Start the engagement; this unit owns the fight task.
    Initiate,
    /// The other unit has the lower id and creates the engagement.
    Defer,
    /// No engagement: not in contact, not opposing, or not free to fight.
    Ignore,
}

/// Decide what `me` does on touching `other`.
///
/// Only opposing units in the same lane, both `Advancing` and within
/// `contact` distance, can pair. The lower id initiates, so running both
/// units' checks in either order creates the pairing exactly once.
#[must_use]
pub fn on_contact(me: &CombatUnit, other: &CombatUnit, contact: Fixed) -> ContactDecision {
    let free = |unit: &CombatUnit| unit.state() == MotionState::Advancing;
    if me.side() == other.side()
        || me.lane() != other.lane()
        || !free(me)
        || !free(other)
        || lane_distance(me.position(), other.position()) > contact
    {
        return ContactDecision::Ignore;
    }

    if me.id() < other.id() {
        ContactDecision::Initiate
    } else {
        ContactDecision::Defer
    }
}
