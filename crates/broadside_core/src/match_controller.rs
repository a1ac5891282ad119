//! Match state machine and the fixed-cadence tick.
//!
//! ```text
//! Menu ──start──► Playing ◄──resume── Paused
//!                  │   └────pause────►
//!                  │ boarding threshold
//!                  ▼
//!                Ended ──start──► Playing
//! ```
//!
//! # Tick order
//!
//! Each call to [`MatchContext::tick`] while playing runs, in order:
//! 1. **Energy** - credit both pools every `energy_interval_ticks`
//! 2. **Motion** - due units take one step
//! 3. **Boarding** - units on the opposing terminus score; may end the match
//! 4. **Pairing** - collision checks over the new positions
//! 5. **Combat** - due fights exchange damage
//! 6. **Sinking** - closed sink windows remove their units
//!
//! Once the match ends, the remaining phases of that tick are skipped.

use crate::components::{MatchState, PerSide, Side, Tick};
use crate::context::MatchContext;
use crate::error::{GameError, Result};
use crate::events::MatchEvent;

impl MatchContext {
    /// Start a fresh match from the menu or after a finished match.
    ///
    /// Resets energy, buffers, cooldowns, boarding counters and clears every
    /// unit. Unit ids keep counting from where they were.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidTransition`] while a match is playing or paused.
    pub fn start_match(&mut self) -> Result<()> {
        if !matches!(self.state, MatchState::Menu | MatchState::Ended) {
            return Err(GameError::InvalidTransition {
                from: self.state,
                action: "start match",
            });
        }

        let starting = self.config.starting_energy;
        for side in Side::ALL {
            self.pools[side].reset(starting);
        }
        self.staging.reset();
        self.registry.clear();
        self.scheduler.clear();
        self.boardings = PerSide::default();
        self.stats = PerSide::default();
        self.winner = None;
        self.now = 0;

        self.transition(MatchState::Playing);
        for side in Side::ALL {
            self.emit_energy(side);
        }
        tracing::info!(
            lanes = self.config.lane_count,
            threshold = self.config.boarding_threshold,
            "Match started"
        );
        Ok(())
    }

    /// Suspend the match. Energy, motion, combat and sinking all stop.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidTransition`] unless playing.
    pub fn pause_match(&mut self) -> Result<()> {
        if self.state != MatchState::Playing {
            return Err(GameError::InvalidTransition {
                from: self.state,
                action: "pause match",
            });
        }
        self.transition(MatchState::Paused);
        tracing::info!(tick = self.now, "Match paused");
        Ok(())
    }

    /// Resume a paused match exactly where it stopped.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidTransition`] unless paused.
    pub fn resume_match(&mut self) -> Result<()> {
        if self.state != MatchState::Paused {
            return Err(GameError::InvalidTransition {
                from: self.state,
                action: "resume match",
            });
        }
        self.transition(MatchState::Playing);
        tracing::info!(tick = self.now, "Match resumed");
        Ok(())
    }

    /// Advance the match by one tick.
    ///
    /// Returns the tick just processed, or `None` without doing anything
    /// when the match is not playing.
    pub fn tick(&mut self) -> Option<Tick> {
        if !self.is_playing() {
            return None;
        }
        self.now += 1;

        self.run_energy_phase();
        self.run_motion_phase();
        self.run_boarding_phase();
        if self.is_playing() {
            self.run_pairing_phase();
            self.run_combat_phase();
            self.run_sinking_phase();
        }

        Some(self.now)
    }

    /// Tick until the match leaves `Playing` or `max_ticks` ticks ran.
    ///
    /// Returns the number of ticks processed.
    pub fn run_for(&mut self, max_ticks: Tick) -> Tick {
        let mut ran = 0;
        while ran < max_ticks && self.tick().is_some() {
            ran += 1;
        }
        ran
    }

    fn run_energy_phase(&mut self) {
        if self.now % self.config.energy_interval_ticks != 0 {
            return;
        }
        for side in Side::ALL {
            if self.pools[side].tick() {
                self.emit_energy(side);
            }
        }
    }

    /// Count a boarding and end the match if it reaches the threshold.
    pub(crate) fn register_boarding(&mut self, side: Side) {
        self.boardings[side] += 1;
        let count = self.boardings[side];
        self.emit(MatchEvent::BoardingRegistered { side, count });

        if count >= self.config.boarding_threshold {
            self.end_match(side);
        }
    }

    fn end_match(&mut self, winner: Side) {
        self.winner = Some(winner);
        self.scheduler.clear();
        self.transition(MatchState::Ended);
        self.emit(MatchEvent::MatchEnded { winner });
        tracing::info!(
            winner = ?winner,
            tick = self.now,
            boardings_a = self.boardings[Side::A],
            boardings_b = self.boardings[Side::B],
            "Match ended"
        );
    }

    fn transition(&mut self, to: MatchState) {
        let from = self.state;
        self.state = to;
        self.emit(MatchEvent::StateChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::data::CardCatalog;

    fn context(config: MatchConfig) -> MatchContext {
        MatchContext::new(config, CardCatalog::standard()).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut ctx = context(MatchConfig::default());
        assert!(ctx.pause_match().is_err());
        assert!(ctx.resume_match().is_err());

        ctx.start_match().unwrap();
        assert_eq!(ctx.state(), MatchState::Playing);
        assert!(matches!(
            ctx.start_match(),
            Err(GameError::InvalidTransition {
                from: MatchState::Playing,
                ..
            })
        ));

        ctx.pause_match().unwrap();
        assert_eq!(ctx.state(), MatchState::Paused);
        assert!(ctx.start_match().is_err());
        ctx.resume_match().unwrap();
        assert_eq!(ctx.state(), MatchState::Playing);
    }

    #[test]
    fn test_tick_is_noop_unless_playing() {
        let mut ctx = context(MatchConfig::default());
        assert_eq!(ctx.tick(), None);
        assert_eq!(ctx.now(), 0);

        ctx.start_match().unwrap();
        assert_eq!(ctx.tick(), Some(1));

        ctx.pause_match().unwrap();
        assert_eq!(ctx.tick(), None);
        assert_eq!(ctx.now(), 1);
    }

    #[test]
    fn test_energy_credits_on_interval() {
        let mut ctx = context(MatchConfig {
            energy_interval_ticks: 4,
            ..Default::default()
        });
        ctx.start_match().unwrap();
        ctx.drain_events();

        ctx.run_for(3);
        assert_eq!(ctx.energy(Side::A), 0);
        ctx.tick();
        assert_eq!(ctx.energy(Side::A), 1);
        assert_eq!(ctx.energy(Side::B), 1);

        let events = ctx.drain_events();
        assert!(events.contains(&MatchEvent::EnergyChanged {
            side: Side::B,
            value: 1
        }));
    }

    #[test]
    fn test_energy_stops_at_cap() {
        let mut ctx = context(MatchConfig {
            energy_interval_ticks: 1,
            max_energy: 3,
            ..Default::default()
        });
        ctx.start_match().unwrap();
        ctx.run_for(10);
        assert_eq!(ctx.energy(Side::A), 3);
    }

    #[test]
    fn test_pause_freezes_energy() {
        let mut ctx = context(MatchConfig {
            energy_interval_ticks: 2,
            ..Default::default()
        });
        ctx.start_match().unwrap();
        ctx.tick();
        ctx.pause_match().unwrap();
        for _ in 0..10 {
            ctx.tick();
        }
        ctx.resume_match().unwrap();
        ctx.tick();
        assert_eq!(ctx.now(), 2);
        assert_eq!(ctx.energy(Side::A), 1);
    }

    #[test]
    fn test_boarding_threshold_ends_match() {
        let mut ctx = context(MatchConfig {
            boarding_threshold: 2,
            ..Default::default()
        });
        ctx.start_match().unwrap();

        ctx.register_boarding(Side::B);
        assert!(ctx.is_playing());
        ctx.register_boarding(Side::B);

        assert_eq!(ctx.state(), MatchState::Ended);
        assert_eq!(ctx.winner(), Some(Side::B));
        assert_eq!(ctx.tick(), None);

        // A new match resets the counters
        ctx.start_match().unwrap();
        assert_eq!(ctx.boardings(Side::B), 0);
        assert_eq!(ctx.winner(), None);
    }
}
