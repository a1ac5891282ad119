//! Side-scoped interface shared by human adapters and automated policies.
//!
//! Both kinds of actor see the match through [`SideFacade`]:
//!
//! - **Same actions:** every play and launch goes through the gateway
//! - **Same information:** own buffers and cooldowns, every ship on the lanes
//! - **No backdoors:** the facade cannot touch pools, buffers or units directly

use crate::components::{LaneIndex, MotionState, Side, Tick, UnitId};
use crate::context::MatchContext;
use crate::data::{CardCatalog, CardId, UnitDefinition};
use crate::gateway::{ActionError, PlayOutcome};
use crate::math::Fixed;
use crate::staging::LaneBuffer;
use crate::unit::CombatUnit;

/// What a side can see of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Lane.
    pub lane: LaneIndex,
    /// Attack.
    pub attack: i32,
    /// Health, clamped at zero.
    pub health: u32,
    /// Crew aboard.
    pub crew: u32,
    /// Position along the lane.
    pub position: Fixed,
    /// Lifecycle state.
    pub state: MotionState,
}

impl From<&CombatUnit> for UnitView {
    fn from(unit: &CombatUnit) -> Self {
        Self {
            id: unit.id(),
            side: unit.side(),
            lane: unit.lane(),
            attack: unit.attack(),
            health: unit.display_health(),
            crew: unit.crew(),
            position: unit.position(),
            state: unit.state(),
        }
    }
}

/// Actions and queries available to one side.
///
/// # Command Flow
///
/// All mutation flows through [`play_card`](Self::play_card) and
/// [`launch`](Self::launch), which forward to the action gateway.
pub trait SideFacade {
    /// The side this facade acts for.
    fn side(&self) -> Side;

    /// Current simulation tick.
    fn now(&self) -> Tick;

    /// Number of lanes.
    fn lane_count(&self) -> usize;

    /// Card catalog.
    fn catalog(&self) -> &CardCatalog;

    /// Current energy.
    fn energy(&self) -> u32;

    /// Own buffer on a lane.
    fn buffer(&self, lane: LaneIndex) -> Option<&LaneBuffer>;

    /// Whether an empty buffer on this lane is blocked by the cooldown.
    fn cooling_down(&self, lane: LaneIndex) -> bool;

    /// Own ships that are sailing or fighting.
    fn own_units(&self) -> Vec<UnitView>;

    /// Enemy ships that are sailing or fighting.
    fn enemy_units(&self) -> Vec<UnitView>;

    /// Play a catalog card.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`ActionError`].
    fn play_card(
        &mut self,
        card: &CardId,
        lane: LaneIndex,
        target: Option<UnitId>,
    ) -> Result<PlayOutcome, ActionError>;

    /// Launch an own lane buffer.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`ActionError`].
    fn launch(&mut self, lane: LaneIndex) -> Result<UnitId, ActionError>;

    /// Whether the side can pay for a card right now.
    fn can_afford(&self, def: &UnitDefinition) -> bool {
        self.energy() >= def.energy_cost
    }

    /// Whether a new buffer could be opened or an open one topped up.
    fn can_commit(&self, lane: LaneIndex) -> bool {
        self.buffer(lane)
            .is_some_and(|buffer| !buffer.is_empty() || !self.cooling_down(lane))
    }

    /// Own active ships in a lane.
    fn own_units_in(&self, lane: LaneIndex) -> Vec<UnitView> {
        self.own_units()
            .into_iter()
            .filter(|unit| unit.lane == lane)
            .collect()
    }
}

/// [`SideFacade`] over a borrowed match context.
#[derive(Debug)]
pub struct SidePort<'a> {
    ctx: &'a mut MatchContext,
    side: Side,
}

impl<'a> SidePort<'a> {
    /// Act for `side` on `ctx`.
    pub fn new(ctx: &'a mut MatchContext, side: Side) -> Self {
        Self { ctx, side }
    }

    fn units(&self, side: Side) -> Vec<UnitView> {
        self.ctx
            .registry()
            .units_of(side)
            .filter(|unit| unit.is_active())
            .map(UnitView::from)
            .collect()
    }
}

impl SideFacade for SidePort<'_> {
    fn side(&self) -> Side {
        self.side
    }

    fn now(&self) -> Tick {
        self.ctx.now()
    }

    fn lane_count(&self) -> usize {
        self.ctx.lane_count()
    }

    fn catalog(&self) -> &CardCatalog {
        self.ctx.catalog()
    }

    fn energy(&self) -> u32 {
        self.ctx.energy(self.side)
    }

    fn buffer(&self, lane: LaneIndex) -> Option<&LaneBuffer> {
        self.ctx.buffer(lane, self.side)
    }

    fn cooling_down(&self, lane: LaneIndex) -> bool {
        self.ctx.is_cooling_down(lane, self.side)
    }

    fn own_units(&self) -> Vec<UnitView> {
        self.units(self.side)
    }

    fn enemy_units(&self) -> Vec<UnitView> {
        self.units(self.side.opponent())
    }

    fn play_card(
        &mut self,
        card: &CardId,
        lane: LaneIndex,
        target: Option<UnitId>,
    ) -> Result<PlayOutcome, ActionError> {
        self.ctx.play_card_by_id(card, lane, target, self.side)
    }

    fn launch(&mut self, lane: LaneIndex) -> Result<UnitId, ActionError> {
        self.ctx.launch(lane, self.side)
    }
}

impl MatchContext {
    /// Borrow a facade acting for `side`.
    pub fn port(&mut self, side: Side) -> SidePort<'_> {
        SidePort::new(self, side)
    }
}
