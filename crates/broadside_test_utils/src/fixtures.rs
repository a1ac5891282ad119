//! Test fixtures and helpers.
//!
//! Pre-built configurations and match states for consistent testing.

use broadside_core::prelude::*;
use fixed::types::I32F32;

/// A short, fast configuration in RON, the way data files spell it.
pub const FAST_CONFIG_RON: &str = r"(
    lane_count: 3,
    max_energy: 10,
    starting_energy: 10,
    energy_interval_ticks: 1,
    cooldown_ticks: 10,
    combat_interval_ticks: 2,
    sink_ticks: 2,
    lane_length: 10,
    unit_speed_tenths: 100,
    engagement_range: 1,
    boarding_threshold: 3,
)";

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// The stock deck.
#[must_use]
pub fn standard_catalog() -> CardCatalog {
    CardCatalog::standard()
}

/// Default tuning with a full energy pool at match start.
#[must_use]
pub fn full_energy_config() -> MatchConfig {
    MatchConfig {
        starting_energy: 10,
        ..MatchConfig::default()
    }
}

/// Short lanes, fast ships, quick energy: matches resolve in a few dozen
/// ticks. Ships cross a lane in 20 ticks.
///
/// # Panics
///
/// Panics if [`FAST_CONFIG_RON`] stops parsing.
#[must_use]
pub fn fast_config() -> MatchConfig {
    match MatchConfig::from_ron_str(FAST_CONFIG_RON) {
        Ok(config) => config,
        Err(err) => panic!("fast test config is invalid: {err}"),
    }
}

/// A match in [`MatchState::Playing`] with its start events drained.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn playing_match(config: MatchConfig) -> MatchContext {
    let mut ctx = match MatchContext::new(config, standard_catalog()) {
        Ok(ctx) => ctx,
        Err(err) => panic!("fixture config rejected: {err}"),
    };
    if let Err(err) = ctx.start_match() {
        panic!("fixture match failed to start: {err}");
    }
    ctx.drain_events();
    ctx
}

/// Commit `cards` to a lane buffer and launch it.
///
/// # Panics
///
/// Panics if any play or the launch is rejected.
pub fn launch_ship(ctx: &mut MatchContext, side: Side, lane: LaneIndex, cards: &[&str]) -> UnitId {
    for card in cards {
        if let Err(err) = ctx.play_card_by_id(&CardId::new(*card), lane, None, side) {
            panic!("playing {card} for side {side} on lane {lane} failed: {err}");
        }
    }
    match ctx.launch(lane, side) {
        Ok(id) => id,
        Err(err) => panic!("launching lane {lane} for side {side} failed: {err}"),
    }
}

/// Tick until `done` holds or `limit` ticks ran. Returns the ticks run.
pub fn tick_until(
    ctx: &mut MatchContext,
    limit: Tick,
    mut done: impl FnMut(&MatchContext) -> bool,
) -> Tick {
    let mut ran = 0;
    while ran < limit && !done(ctx) {
        if ctx.tick().is_none() {
            break;
        }
        ran += 1;
    }
    ran
}
