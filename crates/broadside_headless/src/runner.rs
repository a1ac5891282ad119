//! Synchronous match runner.
//!
//! Drives one [`MatchContext`] tick by tick with a policy per side and
//! condenses the result into a [`MatchReport`].

use broadside_core::context::SideStats;
use broadside_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::loader::MatchData;
use crate::policy::{Policy, PolicyKind};

/// Default tick limit: ten minutes of simulation time.
pub const DEFAULT_MAX_TICKS: Tick = 10 * 60 * TICK_RATE as Tick;

/// A notable moment of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Tick the event happened on.
    pub tick: Tick,
    /// The event.
    pub event: MatchEvent,
}

/// Per-side outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideReport {
    /// Policy that played the side.
    pub policy: String,
    /// Boardings scored.
    pub boardings: u32,
    /// Energy left at the end.
    pub energy: u32,
    /// Counters collected by the core.
    pub stats: SideStats,
}

/// Outcome of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Seed the policies were built from.
    pub seed: u64,
    /// Winning side; `None` if the tick limit hit first.
    pub winner: Option<Side>,
    /// Ticks processed.
    pub ticks: Tick,
    /// Per-side results.
    pub sides: PerSide<SideReport>,
    /// Engagements, boardings and the match end, in order.
    pub timeline: Vec<TimedEvent>,
    /// Final state hash, for determinism checks.
    pub final_state_hash: u64,
}

impl MatchReport {
    /// Whether the match reached the boarding threshold.
    pub fn decided(&self) -> bool {
        self.winner.is_some()
    }
}

/// Runs a match to completion.
pub struct MatchRunner {
    ctx: MatchContext,
    policies: PerSide<Box<dyn Policy>>,
    seed: u64,
    max_ticks: Tick,
    timeline: Vec<TimedEvent>,
}

impl MatchRunner {
    /// Create a runner with a started match.
    ///
    /// # Errors
    ///
    /// Returns the core's error for an invalid configuration.
    pub fn new(
        data: &MatchData,
        policies: PerSide<Box<dyn Policy>>,
        seed: u64,
        max_ticks: Tick,
    ) -> broadside_core::error::Result<Self> {
        let mut ctx = MatchContext::new(data.config.clone(), data.catalog.clone())?;
        ctx.start_match()?;
        ctx.drain_events();
        Ok(Self {
            ctx,
            policies,
            seed,
            max_ticks,
            timeline: Vec::new(),
        })
    }

    /// Runner with built-in policies, each seeded from `seed`.
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn with_kinds(
        data: &MatchData,
        kinds: PerSide<PolicyKind>,
        seed: u64,
        max_ticks: Tick,
    ) -> broadside_core::error::Result<Self> {
        let policies = PerSide::from_fn(|side| {
            let side_seed = seed.wrapping_mul(2).wrapping_add(side.index() as u64);
            kinds[side].build(&data.catalog, side_seed)
        });
        Self::new(data, policies, seed, max_ticks)
    }

    /// The match being run.
    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    /// Let both policies act, then advance one tick.
    ///
    /// Returns false once the match stopped playing or hit the tick limit.
    pub fn step(&mut self) -> bool {
        if !self.ctx.is_playing() || self.ctx.now() >= self.max_ticks {
            return false;
        }
        for side in Side::ALL {
            let mut port = self.ctx.port(side);
            self.policies[side].act(&mut port);
        }
        let advanced = self.ctx.tick().is_some();
        self.record_events();
        advanced
    }

    /// Run until the match ends or the tick limit is reached.
    pub fn run(mut self) -> MatchReport {
        while self.step() {}

        let report = self.report();
        tracing::info!(
            seed = self.seed,
            winner = ?report.winner,
            ticks = report.ticks,
            boardings_a = report.sides.a.boardings,
            boardings_b = report.sides.b.boardings,
            "Match finished"
        );
        report
    }

    /// Report on the match as it stands.
    pub fn report(&self) -> MatchReport {
        MatchReport {
            seed: self.seed,
            winner: self.ctx.winner(),
            ticks: self.ctx.now(),
            sides: PerSide::from_fn(|side| SideReport {
                policy: self.policies[side].name().to_string(),
                boardings: self.ctx.boardings(side),
                energy: self.ctx.energy(side),
                stats: self.ctx.stats(side),
            }),
            timeline: self.timeline.clone(),
            final_state_hash: self.ctx.state_hash(),
        }
    }

    fn record_events(&mut self) {
        let tick = self.ctx.now();
        for event in self.ctx.drain_events() {
            if matches!(
                event,
                MatchEvent::EngagementStarted { .. }
                    | MatchEvent::BoardingRegistered { .. }
                    | MatchEvent::MatchEnded { .. }
            ) {
                self.timeline.push(TimedEvent { tick, event });
            }
        }
    }
}
