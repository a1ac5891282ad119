//! Per-lane launch cooldown.

use serde::{Deserialize, Serialize};

use crate::components::{LaneIndex, PerSide, Side, Tick};

/// Remembers when each lane last launched, per side.
///
/// A lane whose buffer is empty may only open a new buffer once
/// `now >= last_launch + duration`. Contributions to an already open buffer
/// never consult the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownTracker {
    duration: Tick,
    last_launch: Vec<PerSide<Option<Tick>>>,
}

impl CooldownTracker {
    /// Create a tracker with no launches recorded.
    #[must_use]
    pub fn new(lane_count: usize, duration: Tick) -> Self {
        Self {
            duration,
            last_launch: vec![PerSide::default(); lane_count],
        }
    }

    /// Cooldown length in ticks.
    #[must_use]
    pub const fn duration(&self) -> Tick {
        self.duration
    }

    /// Tick of the last launch from this lane, if any.
    #[must_use]
    pub fn last_launch(&self, lane: LaneIndex, side: Side) -> Option<Tick> {
        self.last_launch.get(lane).and_then(|slot| slot[side])
    }

    /// Whether a new buffer on this lane is still blocked at `now`.
    #[must_use]
    pub fn is_cooling_down(&self, lane: LaneIndex, side: Side, now: Tick) -> bool {
        self.remaining(lane, side, now) > 0
    }

    /// Ticks left before the lane accepts a new buffer.
    #[must_use]
    pub fn remaining(&self, lane: LaneIndex, side: Side, now: Tick) -> Tick {
        self.last_launch(lane, side)
            .map_or(0, |at| (at + self.duration).saturating_sub(now))
    }

    /// Start the cooldown for a lane.
    pub fn record_launch(&mut self, lane: LaneIndex, side: Side, now: Tick) {
        self.last_launch[lane][side] = Some(now);
    }

    /// Forget every launch.
    pub fn reset(&mut self) {
        self.last_launch.fill(PerSide::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_lane_is_ready() {
        let tracker = CooldownTracker::new(3, 100);
        assert!(!tracker.is_cooling_down(0, Side::A, 0));
        assert_eq!(tracker.remaining(2, Side::B, 0), 0);
    }

    #[test]
    fn test_cooldown_window() {
        let mut tracker = CooldownTracker::new(3, 100);
        tracker.record_launch(1, Side::A, 50);

        assert!(tracker.is_cooling_down(1, Side::A, 50));
        assert!(tracker.is_cooling_down(1, Side::A, 149));
        assert_eq!(tracker.remaining(1, Side::A, 120), 30);
        assert!(!tracker.is_cooling_down(1, Side::A, 150));

        // Other side and other lanes are unaffected
        assert!(!tracker.is_cooling_down(1, Side::B, 60));
        assert!(!tracker.is_cooling_down(0, Side::A, 60));
    }

    #[test]
    fn test_reset_clears_launches() {
        let mut tracker = CooldownTracker::new(2, 100);
        tracker.record_launch(0, Side::B, 10);
        tracker.reset();
        assert_eq!(tracker.last_launch(0, Side::B), None);
    }
}
