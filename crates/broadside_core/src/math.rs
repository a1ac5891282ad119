//! Fixed-point math utilities for deterministic simulation.
//!
//! Lane positions use fixed-point arithmetic so that two runs fed the same
//! actions produce bit-identical positions on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Absolute distance between two points on a lane.
#[must_use]
pub fn lane_distance(a: Fixed, b: Fixed) -> Fixed {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Per-tick step for a speed given in tenths of a unit per second.
#[must_use]
pub fn step_per_tick(tenths_per_second: u32, tick_rate: u32) -> Fixed {
    Fixed::from_num(tenths_per_second) / Fixed::from_num(10 * tick_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_distance_is_symmetric() {
        let a = Fixed::from_num(3);
        let b = Fixed::from_num(10);
        assert_eq!(lane_distance(a, b), Fixed::from_num(7));
        assert_eq!(lane_distance(b, a), Fixed::from_num(7));
        assert_eq!(lane_distance(a, a), Fixed::ZERO);
    }

    #[test]
    fn test_step_per_tick() {
        // 100 tenths per second at 20 ticks per second = 0.5 per tick
        let step = step_per_tick(100, 20);
        assert_eq!(step, Fixed::from_num(0.5));
        assert!(step_per_tick(17, 20) > Fixed::ZERO);
    }
}
