//! Per-match state container.
//!
//! A [`MatchContext`] owns everything one match mutates: both energy pools,
//! the lane buffers and cooldowns, the lane registry, the unit scheduler and
//! the boarding counters. There is no global state; several contexts can run
//! side by side.
//!
//! Behavior is split across modules as `impl MatchContext` blocks:
//! [`crate::match_controller`] (state machine and tick), [`crate::gateway`]
//! (player actions) and the private lifecycle phases.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, MatchState, PerSide, Side, Tick, UnitId};
use crate::config::MatchConfig;
use crate::data::CardCatalog;
use crate::economy::ResourcePool;
use crate::error::Result;
use crate::events::MatchEvent;
use crate::registry::LaneRegistry;
use crate::scheduler::Scheduler;
use crate::staging::{LaneBuffer, LaneStaging};
use crate::unit::CombatUnit;

/// Per-side counters for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideStats {
    /// Cards successfully played.
    pub cards_played: u32,
    /// Units launched.
    pub launched: u32,
    /// Units of this side that sank.
    pub sunk: u32,
    /// Engagements this side's units took part in.
    pub engagements: u32,
}

/// All state of one match.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub(crate) config: MatchConfig,
    pub(crate) catalog: CardCatalog,
    pub(crate) state: MatchState,
    /// Ticks processed since the match started.
    pub(crate) now: Tick,
    pub(crate) pools: PerSide<ResourcePool>,
    pub(crate) staging: LaneStaging,
    pub(crate) registry: LaneRegistry,
    pub(crate) scheduler: Scheduler,
    pub(crate) boardings: PerSide<u32>,
    pub(crate) stats: PerSide<SideStats>,
    pub(crate) winner: Option<Side>,
    pub(crate) events: Vec<MatchEvent>,
}

impl MatchContext {
    /// Create a context in [`MatchState::Menu`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GameError::InvalidConfig`] if the
    /// configuration fails validation.
    pub fn new(config: MatchConfig, catalog: CardCatalog) -> Result<Self> {
        config.validate()?;

        let pool = ResourcePool::new(
            config.starting_energy,
            config.max_energy,
            config.regen_per_tick,
        );
        Ok(Self {
            pools: PerSide::splat(pool),
            staging: LaneStaging::new(config.lane_count, config.cooldown_ticks),
            registry: LaneRegistry::new(config.lane_count),
            scheduler: Scheduler::new(),
            boardings: PerSide::default(),
            stats: PerSide::default(),
            winner: None,
            events: Vec::new(),
            state: MatchState::Menu,
            now: 0,
            config,
            catalog,
        })
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Card catalog.
    #[must_use]
    pub const fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Current match state.
    #[must_use]
    pub const fn state(&self) -> MatchState {
        self.state
    }

    /// Whether the match accepts actions and ticks.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == MatchState::Playing
    }

    /// Ticks processed since the match started.
    #[must_use]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Number of lanes.
    #[must_use]
    pub const fn lane_count(&self) -> usize {
        self.config.lane_count
    }

    /// Energy pool of a side.
    #[must_use]
    pub fn pool(&self, side: Side) -> &ResourcePool {
        &self.pools[side]
    }

    /// Current energy of a side.
    #[must_use]
    pub fn energy(&self, side: Side) -> u32 {
        self.pools[side].current()
    }

    /// Lane buffer of a side, or `None` for an unknown lane.
    #[must_use]
    pub fn buffer(&self, lane: LaneIndex, side: Side) -> Option<&LaneBuffer> {
        self.staging.buffer(lane, side)
    }

    /// Whether an empty buffer on this lane is blocked by the cooldown.
    #[must_use]
    pub fn is_cooling_down(&self, lane: LaneIndex, side: Side) -> bool {
        self.staging
            .cooldowns()
            .is_cooling_down(lane, side, self.now)
    }

    /// Ticks until the lane accepts a new buffer.
    #[must_use]
    pub fn cooldown_remaining(&self, lane: LaneIndex, side: Side) -> Tick {
        self.staging.cooldowns().remaining(lane, side, self.now)
    }

    /// The lane registry.
    #[must_use]
    pub const fn registry(&self) -> &LaneRegistry {
        &self.registry
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&CombatUnit> {
        self.registry.get(id)
    }

    /// Units of one side in one lane.
    pub fn units_in(&self, lane: LaneIndex, side: Side) -> impl Iterator<Item = &CombatUnit> {
        self.registry.units_in(lane, side)
    }

    /// The unit scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Boardings scored by a side.
    #[must_use]
    pub fn boardings(&self, side: Side) -> u32 {
        self.boardings[side]
    }

    /// Report counters of a side.
    #[must_use]
    pub fn stats(&self, side: Side) -> SideStats {
        self.stats[side]
    }

    /// Winner of an ended match.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Events queued since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[MatchEvent] {
        &self.events
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    pub(crate) fn emit_energy(&mut self, side: Side) {
        let value = self.pools[side].current();
        self.emit(MatchEvent::EnergyChanged { side, value });
    }

    /// Hash of the simulation state.
    ///
    /// Two contexts fed the same actions produce the same hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.now.hash(&mut hasher);
        self.state.hash(&mut hasher);
        for (_, pool) in self.pools.iter() {
            pool.current().hash(&mut hasher);
        }
        for (_, count) in self.boardings.iter() {
            count.hash(&mut hasher);
        }

        for lane in 0..self.lane_count() {
            for side in Side::ALL {
                if let Some(buffer) = self.buffer(lane, side) {
                    let aggregate = buffer.aggregate();
                    aggregate.attack.hash(&mut hasher);
                    aggregate.defense.hash(&mut hasher);
                    aggregate.contributors.hash(&mut hasher);
                }
            }
        }

        self.registry.len().hash(&mut hasher);
        for unit in self.registry.iter() {
            unit.id().hash(&mut hasher);
            unit.lane().hash(&mut hasher);
            unit.position().to_bits().hash(&mut hasher);
            unit.current_health().hash(&mut hasher);
            unit.attack().hash(&mut hasher);
            unit.state().hash(&mut hasher);
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    #[test]
    fn test_new_context_is_in_menu() {
        let ctx = MatchContext::new(MatchConfig::default(), CardCatalog::standard()).unwrap();
        assert_eq!(ctx.state(), MatchState::Menu);
        assert_eq!(ctx.now(), 0);
        assert_eq!(ctx.lane_count(), 3);
        assert_eq!(ctx.energy(Side::A), 0);
        assert!(ctx.buffer(2, Side::B).unwrap().is_empty());
        assert!(ctx.buffer(3, Side::B).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatchConfig {
            boarding_threshold: 0,
            ..Default::default()
        };
        let result = MatchContext::new(config, CardCatalog::standard());
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_state_hash_is_stable() {
        let a = MatchContext::new(MatchConfig::default(), CardCatalog::standard()).unwrap();
        let b = a.clone();
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
