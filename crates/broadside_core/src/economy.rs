//! Energy economy.
//!
//! Each side owns one regenerating [`ResourcePool`]. The pool is credited by
//! the match controller's energy tick and debited only by the action gateway,
//! which always validates every other precondition first.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

/// Regenerating energy counter with a hard cap.
///
/// Invariant: `0 <= current <= max` at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    current: u32,
    max: u32,
    regen_per_tick: u32,
}

impl ResourcePool {
    /// Create a pool. `current` is clamped to `max`.
    #[must_use]
    pub fn new(current: u32, max: u32, regen_per_tick: u32) -> Self {
        Self {
            current: current.min(max),
            max,
            regen_per_tick,
        }
    }

    /// Current energy.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Energy cap.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Energy credited per tick.
    #[must_use]
    pub const fn regen_per_tick(&self) -> u32 {
        self.regen_per_tick
    }

    /// Whether the pool is at its cap.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Credit one tick of regeneration.
    ///
    /// Returns true if the value changed, so the caller can notify observers.
    pub fn tick(&mut self) -> bool {
        if self.current >= self.max {
            return false;
        }
        self.current = self.current.saturating_add(self.regen_per_tick).min(self.max);
        true
    }

    /// Check if the pool can cover a cost.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Spend energy if available.
    ///
    /// Returns true if the debit happened; on false nothing changed.
    pub fn try_debit(&mut self, amount: u32) -> bool {
        if self.current >= amount {
            self.current -= amount;
            true
        } else {
            false
        }
    }

    /// Return energy taken by a speculative debit that has to be rolled back.
    pub(crate) fn refund(&mut self, amount: u32) {
        debug_assert!(
            self.current + amount <= self.max,
            "refund of {amount} would overflow a pool at {}/{}",
            self.current,
            self.max
        );
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Reset to a starting value for a new match.
    pub fn reset(&mut self, current: u32) {
        self.current = current.min(self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_regenerates_until_cap() {
        let mut pool = ResourcePool::new(8, 10, 1);

        assert!(pool.tick());
        assert_eq!(pool.current(), 9);
        assert!(pool.tick());
        assert_eq!(pool.current(), 10);

        // At cap: no change, no notification
        assert!(!pool.tick());
        assert_eq!(pool.current(), 10);
        assert!(pool.is_full());
    }

    #[test]
    fn test_tick_clamps_large_regen() {
        let mut pool = ResourcePool::new(9, 10, 3);
        assert!(pool.tick());
        assert_eq!(pool.current(), 10);
    }

    #[test]
    fn test_debit() {
        let mut pool = ResourcePool::new(5, 10, 1);

        assert!(pool.can_afford(3));
        assert!(pool.try_debit(3));
        assert_eq!(pool.current(), 2);

        assert!(!pool.can_afford(3));
        assert!(!pool.try_debit(3));
        assert_eq!(pool.current(), 2); // Unchanged
    }

    #[test]
    fn test_refund_restores_debit() {
        let mut pool = ResourcePool::new(10, 10, 1);
        assert!(pool.try_debit(4));
        pool.refund(4);
        assert_eq!(pool.current(), 10);
    }

    #[test]
    fn test_new_clamps_to_max() {
        let pool = ResourcePool::new(50, 10, 1);
        assert_eq!(pool.current(), 10);
    }
}
