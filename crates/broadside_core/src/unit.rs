//! Materialized combat units.
//!
//! A [`CombatUnit`] only ever enters the simulation through a lane launch.
//! Its health is written exclusively by [`crate::combat`] and its motion
//! state exclusively by the lifecycle phases of the match tick; the mutators
//! below are crate-private to keep it that way.

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, MotionState, Side, Tick, UnitId};
use crate::data::{CardId, VisualRef};
use crate::math::{fixed_serde, Fixed};
use crate::staging::{BufferAggregate, MaterializedKind};

/// A ship sailing down a lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    id: UnitId,
    side: Side,
    lane: LaneIndex,
    attack: i32,
    max_health: i32,
    current_health: i32,
    crew: u32,
    #[serde(with = "fixed_serde")]
    position: Fixed,
    state: MotionState,
    opponent: Option<UnitId>,
    card: CardId,
    visual: Option<VisualRef>,
    launched_at: Tick,
}

impl CombatUnit {
    /// Materialize a unit from a launched buffer aggregate.
    ///
    /// Health equals the aggregate defense, floored at 1 so a fresh unit is
    /// always alive.
    pub(crate) fn materialize(
        id: UnitId,
        side: Side,
        lane: LaneIndex,
        aggregate: BufferAggregate,
        kind: MaterializedKind,
        position: Fixed,
        launched_at: Tick,
    ) -> Self {
        assert!(
            aggregate.contributors > 0,
            "materializing {id} from an empty buffer"
        );
        let health = aggregate.defense.max(1);
        Self {
            id,
            side,
            lane,
            attack: aggregate.attack,
            max_health: health,
            current_health: health,
            crew: aggregate.contributors,
            position,
            state: MotionState::Advancing,
            opponent: None,
            card: kind.card,
            visual: kind.visual,
            launched_at,
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Lane the unit sails in.
    #[must_use]
    pub const fn lane(&self) -> LaneIndex {
        self.lane
    }

    /// Damage dealt per exchange.
    #[must_use]
    pub const fn attack(&self) -> i32 {
        self.attack
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Signed current health. Zero or below means destroyed.
    #[must_use]
    pub const fn current_health(&self) -> i32 {
        self.current_health
    }

    /// Health clamped at zero, for display.
    #[must_use]
    pub fn display_health(&self) -> u32 {
        u32::try_from(self.current_health.max(0)).unwrap_or(0)
    }

    /// Crew aboard.
    #[must_use]
    pub const fn crew(&self) -> u32 {
        self.crew
    }

    /// Position along the lane, zero at side A's terminus.
    #[must_use]
    pub const fn position(&self) -> Fixed {
        self.position
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MotionState {
        self.state
    }

    /// Opponent while fighting.
    #[must_use]
    pub const fn opponent(&self) -> Option<UnitId> {
        self.opponent
    }

    /// Card whose buffer this unit was launched from.
    #[must_use]
    pub fn card(&self) -> &CardId {
        &self.card
    }

    /// Visual the presentation layer should instantiate.
    #[must_use]
    pub fn visual(&self) -> Option<&VisualRef> {
        self.visual.as_ref()
    }

    /// Tick of the launch.
    #[must_use]
    pub const fn launched_at(&self) -> Tick {
        self.launched_at
    }

    /// Whether health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Whether the unit still takes part in the match (not sinking or gone).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, MotionState::Advancing | MotionState::Fighting)
    }

    /// Direction of travel along the lane.
    #[must_use]
    pub fn heading(&self) -> Fixed {
        match self.side {
            Side::A => Fixed::ONE,
            Side::B => -Fixed::ONE,
        }
    }

    /// Position after one step, clamped to the opposing terminus.
    #[must_use]
    pub fn next_position(&self, step: Fixed, lane_end: Fixed) -> Fixed {
        (self.position + step * self.heading()).clamp(Fixed::ZERO, lane_end)
    }

    /// Whether the unit stands on the opposing terminus.
    #[must_use]
    pub fn at_opposing_terminus(&self, lane_end: Fixed) -> bool {
        match self.side {
            Side::A => self.position >= lane_end,
            Side::B => self.position <= Fixed::ZERO,
        }
    }

    pub(crate) fn set_position(&mut self, position: Fixed) {
        self.position = position;
    }

    pub(crate) fn set_lane(&mut self, lane: LaneIndex) {
        self.lane = lane;
    }

    pub(crate) fn adjust_health(&mut self, delta: i32) {
        self.current_health = self.current_health.saturating_add(delta);
    }

    pub(crate) fn add_stats(&mut self, attack: i32, defense: i32, crew: u32) {
        self.attack = self.attack.saturating_add(attack);
        self.max_health = self.max_health.saturating_add(defense);
        self.current_health = self.current_health.saturating_add(defense);
        self.crew += crew;
    }

    /// Advancing -> Fighting.
    pub(crate) fn engage(&mut self, opponent: UnitId) {
        assert_eq!(
            self.state,
            MotionState::Advancing,
            "{} paired with {opponent} while {:?}",
            self.id,
            self.state
        );
        self.state = MotionState::Fighting;
        self.opponent = Some(opponent);
    }

    /// Fighting -> Advancing, keeping the current position.
    pub(crate) fn disengage(&mut self) {
        assert_eq!(
            self.state,
            MotionState::Fighting,
            "{} resumed while {:?}",
            self.id,
            self.state
        );
        self.state = MotionState::Advancing;
        self.opponent = None;
    }

    /// Advancing or Fighting -> Sinking.
    pub(crate) fn begin_sinking(&mut self) {
        assert!(self.is_active(), "{} sank while {:?}", self.id, self.state);
        self.state = MotionState::Sinking;
        self.opponent = None;
    }

    /// Any live state -> Terminated.
    pub(crate) fn terminate(&mut self) {
        assert_ne!(
            self.state,
            MotionState::Terminated,
            "{} terminated twice",
            self.id
        );
        self.state = MotionState::Terminated;
        self.opponent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(side: Side, position: i32) -> CombatUnit {
        CombatUnit::materialize(
            UnitId(1),
            side,
            0,
            BufferAggregate {
                attack: 2,
                defense: 5,
                contributors: 2,
            },
            MaterializedKind {
                card: CardId::new("deckhand"),
                visual: None,
            },
            Fixed::from_num(position),
            0,
        )
    }

    #[test]
    fn test_materialize_from_aggregate() {
        let unit = sample(Side::A, 0);
        assert_eq!(unit.attack(), 2);
        assert_eq!(unit.max_health(), 5);
        assert_eq!(unit.current_health(), 5);
        assert_eq!(unit.crew(), 2);
        assert_eq!(unit.state(), MotionState::Advancing);
    }

    #[test]
    fn test_heading_depends_on_side() {
        let end = Fixed::from_num(10);
        let step = Fixed::from_num(3);

        let a = sample(Side::A, 9);
        assert_eq!(a.next_position(step, end), end);

        let b = sample(Side::B, 10);
        assert_eq!(b.next_position(step, end), Fixed::from_num(7));
    }

    #[test]
    fn test_terminus_detection() {
        let end = Fixed::from_num(10);
        assert!(sample(Side::A, 10).at_opposing_terminus(end));
        assert!(!sample(Side::A, 0).at_opposing_terminus(end));
        assert!(sample(Side::B, 0).at_opposing_terminus(end));
    }

    #[test]
    fn test_display_health_clamps() {
        let mut unit = sample(Side::A, 0);
        unit.adjust_health(-8);
        assert_eq!(unit.current_health(), -3);
        assert_eq!(unit.display_health(), 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut unit = sample(Side::A, 0);
        unit.engage(UnitId(2));
        assert_eq!(unit.opponent(), Some(UnitId(2)));
        unit.disengage();
        assert_eq!(unit.state(), MotionState::Advancing);
        unit.begin_sinking();
        assert!(!unit.is_active());
        unit.terminate();
        assert_eq!(unit.state(), MotionState::Terminated);
    }

    #[test]
    #[should_panic(expected = "paired")]
    fn test_engaging_a_fighting_unit_panics() {
        let mut unit = sample(Side::A, 0);
        unit.engage(UnitId(2));
        unit.engage(UnitId(3));
    }
}
