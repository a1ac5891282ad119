//! # Broadside Core
//!
//! Deterministic match core for Broadside, a two-sided lane-combat game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No wall-clock time (everything is measured in simulation ticks)
//!
//! Two sides spend a regenerating energy pool to commit crew cards into
//! per-lane staging buffers, launch those buffers as ships that sail down
//! their lane, fight the first opposing ship they meet, and score a boarding
//! when they reach the far terminus. The first side to reach the boarding
//! threshold wins.
//!
//! ## Crate Structure
//!
//! - [`economy`] - Regenerating energy pool
//! - [`staging`] / [`cooldown`] - Per-lane buffers and the launch cooldown gate
//! - [`registry`] / [`unit`] - Materialized ships and their lifecycle states
//! - [`scheduler`] - Cooperative per-unit task scheduler
//! - [`combat`] - Pairwise damage exchange
//! - [`effects`] - Closed set of maneuver effects
//! - [`gateway`] - The single entry point for every player action
//! - [`match_controller`] - Match state machine, tick loop, win condition
//! - [`facade`] - Side-scoped view used by humans and automated policies alike

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod data;
pub mod economy;
pub mod effects;
pub mod error;
pub mod events;
pub mod facade;
pub mod gateway;
mod lifecycle;
pub mod match_controller;
pub mod math;
pub mod registry;
pub mod scheduler;
pub mod snapshot;
pub mod staging;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::{LaneIndex, MatchState, MotionState, PerSide, Side, Tick, UnitId};
    pub use crate::config::{MatchConfig, TICK_DURATION_MS, TICK_RATE};
    pub use crate::context::MatchContext;
    pub use crate::data::{CardCatalog, CardId, UnitDefinition, UnitKind, VisualRef};
    pub use crate::economy::ResourcePool;
    pub use crate::effects::{EffectKind, EffectMutation};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{MatchEvent, PresentationHooks, TerminationCause};
    pub use crate::facade::{SideFacade, SidePort};
    pub use crate::gateway::{ActionError, PlayOutcome, Rejection};
    pub use crate::snapshot::MatchSnapshot;
    pub use crate::staging::{BufferAggregate, CommitResult, LaneBuffer};
    pub use crate::unit::CombatUnit;
}
