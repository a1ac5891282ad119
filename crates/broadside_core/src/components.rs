//! Shared identifiers and small value types used across the match core.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Simulation time, counted in ticks since the match started.
pub type Tick = u64;

/// Zero-based lane index.
pub type LaneIndex = usize;

/// One of the two competing sides.
///
/// `A` is the human-equivalent side and sails from lane position zero
/// towards the far terminus; `B` is the automated side and sails the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Human-equivalent side.
    A,
    /// Automated side.
    B,
}

impl Side {
    /// Both sides, in index order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Stable index for per-side storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Monotonic identifier assigned to a unit when it is materialized.
///
/// Ids are never reused within a [`crate::context::MatchContext`], even
/// across match restarts, and double as the combat tie-break: the lower id
/// initiates a pairing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a combat unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Sailing towards the opposing terminus.
    #[default]
    Advancing,
    /// Paired with an opposing unit and exchanging damage.
    Fighting,
    /// Destroyed; waiting out the sinking window before removal.
    Sinking,
    /// Removed from the lane.
    Terminated,
}

/// Match-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchState {
    /// Waiting for a match to start.
    #[default]
    Menu,
    /// Match in progress; actions and ticks are accepted.
    Playing,
    /// Match suspended; nothing advances.
    Paused,
    /// A side reached the boarding threshold.
    Ended,
}

/// A value stored once per side. Per-side state is never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    /// Value for side A.
    pub a: T,
    /// Value for side B.
    pub b: T,
}

impl<T> PerSide<T> {
    /// Create from explicit per-side values.
    pub const fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Build both values from a function of the side.
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            a: f(Side::A),
            b: f(Side::B),
        }
    }

    /// Iterate `(side, value)` pairs in side order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::A, &self.a), (Side::B, &self.b)].into_iter()
    }
}

impl<T: Clone> PerSide<T> {
    /// Same value for both sides.
    pub fn splat(value: T) -> Self {
        Self {
            a: value.clone(),
            b: value,
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
        assert_eq!(Side::A.opponent().opponent(), Side::A);
    }

    #[test]
    fn test_per_side_indexing() {
        let mut counts = PerSide::splat(0u32);
        counts[Side::B] += 3;
        assert_eq!(counts[Side::A], 0);
        assert_eq!(counts[Side::B], 3);

        let labels = PerSide::from_fn(|side| side.to_string());
        let collected: Vec<_> = labels.iter().map(|(s, l)| (s, l.clone())).collect();
        assert_eq!(
            collected,
            vec![(Side::A, "A".to_string()), (Side::B, "B".to_string())]
        );
    }

    #[test]
    fn test_unit_id_ordering() {
        assert!(UnitId(1) < UnitId(2));
        assert_eq!(UnitId(7).to_string(), "#7");
    }
}
