//! Match configuration.
//!
//! Every duration is expressed in simulation ticks. Defaults reproduce the
//! tuning of the shipped game: 2.2 s energy ticks, a 5 s lane cooldown and a
//! 1 s combat exchange at [`TICK_RATE`] ticks per second.

use serde::{Deserialize, Serialize};

use crate::components::Tick;
use crate::error::{GameError, Result};
use crate::math::{step_per_tick, Fixed};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Tunable parameters for one match.
///
/// # Example RON
///
/// ```ron
/// MatchConfig(
///     lane_count: 3,
///     max_energy: 10,
///     cooldown_ticks: 60,
///     boarding_threshold: 3,
/// )
/// ```
///
/// Omitted fields take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of parallel lanes.
    pub lane_count: usize,
    /// Energy cap per side.
    pub max_energy: u32,
    /// Energy credited on each energy tick.
    pub regen_per_tick: u32,
    /// Energy each side starts the match with.
    pub starting_energy: u32,
    /// Simulation ticks between energy credits.
    pub energy_interval_ticks: Tick,
    /// Ticks after a launch before the lane accepts a new buffer.
    pub cooldown_ticks: Tick,
    /// Ticks between damage exchanges of an engagement.
    pub combat_interval_ticks: Tick,
    /// Length of the cosmetic sinking window.
    pub sink_ticks: Tick,
    /// Distance between the two termini of a lane, in world units.
    pub lane_length: u32,
    /// Advance speed in tenths of a world unit per second.
    pub unit_speed_tenths: u32,
    /// Opposing units closer than this (world units) are in contact.
    pub engagement_range: u32,
    /// Boardings needed to win.
    pub boarding_threshold: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            max_energy: 10,
            regen_per_tick: 1,
            starting_energy: 0,
            energy_interval_ticks: 44,
            cooldown_ticks: 100,
            combat_interval_ticks: 20,
            sink_ticks: 20,
            lane_length: 40,
            unit_speed_tenths: 17,
            engagement_range: 2,
            boarding_threshold: 5,
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from RON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParse`] for malformed RON and
    /// [`GameError::InvalidConfig`] for out-of-range values.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParse {
            path: "<match config>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter is within its legal range.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> Result<()> {
        let positive: [(&str, u64); 8] = [
            ("lane_count", self.lane_count as u64),
            ("max_energy", u64::from(self.max_energy)),
            ("regen_per_tick", u64::from(self.regen_per_tick)),
            ("energy_interval_ticks", self.energy_interval_ticks),
            ("combat_interval_ticks", self.combat_interval_ticks),
            ("lane_length", u64::from(self.lane_length)),
            ("unit_speed_tenths", u64::from(self.unit_speed_tenths)),
            ("boarding_threshold", u64::from(self.boarding_threshold)),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(GameError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if self.starting_energy > self.max_energy {
            return Err(GameError::InvalidConfig(format!(
                "starting_energy {} exceeds max_energy {}",
                self.starting_energy, self.max_energy
            )));
        }
        if self.engagement_range >= self.lane_length {
            return Err(GameError::InvalidConfig(format!(
                "engagement_range {} must be shorter than lane_length {}",
                self.engagement_range, self.lane_length
            )));
        }
        Ok(())
    }

    /// Distance a unit advances per tick.
    #[must_use]
    pub fn unit_step(&self) -> Fixed {
        step_per_tick(self.unit_speed_tenths, TICK_RATE)
    }

    /// Lane position of the far terminus (side A's goal, side B's spawn).
    #[must_use]
    pub fn lane_end(&self) -> Fixed {
        Fixed::from_num(self.lane_length)
    }

    /// Contact distance as a fixed-point value.
    #[must_use]
    pub fn contact_distance(&self) -> Fixed {
        Fixed::from_num(self.engagement_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_lanes_rejected() {
        let config = MatchConfig {
            lane_count: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lane_count"));
    }

    #[test]
    fn test_starting_energy_above_cap_rejected() {
        let config = MatchConfig {
            starting_energy: 11,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_ron_fills_defaults() {
        let config =
            MatchConfig::from_ron_str("(lane_count: 2, boarding_threshold: 3)").unwrap();
        assert_eq!(config.lane_count, 2);
        assert_eq!(config.boarding_threshold, 3);
        assert_eq!(config.max_energy, 10);
        assert_eq!(config.cooldown_ticks, 100);
    }

    #[test]
    fn test_from_ron_rejects_garbage() {
        assert!(matches!(
            MatchConfig::from_ron_str("(lane_count: \"three\")"),
            Err(GameError::DataParse { .. })
        ));
    }

    #[test]
    fn test_unit_step_scales_with_speed() {
        let slow = MatchConfig::default();
        let fast = MatchConfig {
            unit_speed_tenths: 34,
            ..Default::default()
        };
        assert!(fast.unit_step() > slow.unit_step());
    }
}
