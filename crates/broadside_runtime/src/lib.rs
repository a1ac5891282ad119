//! # Broadside Runtime
//!
//! Async host for a single match.
//!
//! The host task owns its [`MatchContext`](broadside_core::context::MatchContext)
//! outright. Every mutation arrives as a command on one queue and is applied
//! between ticks, so actions never interleave with a tick in progress. Events
//! drained after each step are fanned out on a broadcast channel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::time::Duration;

use broadside_core::config::TICK_DURATION_MS;
use broadside_core::error::GameError;
use broadside_core::gateway::ActionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod host;

pub use host::{MatchHandle, MatchHost, MIN_TICK_PERIOD};

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Wall-clock period of one simulation tick. Periods under 1 ms run at 1 ms.
    pub tick_period: Duration,
    /// Commands that may queue before senders wait.
    pub command_capacity: usize,
    /// Events a slow subscriber may lag behind before it misses some.
    pub event_capacity: usize,
    /// Start the match as soon as the host is spawned.
    pub auto_start: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(u64::from(TICK_DURATION_MS)),
            command_capacity: 64,
            event_capacity: 1024,
            auto_start: false,
        }
    }
}

/// Errors surfaced by [`MatchHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The host task has stopped.
    #[error("match host is closed")]
    HostClosed,

    /// The match rejected a lifecycle request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The action gateway rejected a play or launch.
    #[error(transparent)]
    Rejected(#[from] ActionError),
}

/// Result type for host requests.
pub type Result<T> = std::result::Result<T, RuntimeError>;
