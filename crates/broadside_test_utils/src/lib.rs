//! # Broadside Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Match fixtures (standard deck, fast test configs, matches already playing)
//! - Determinism harness over scripted action sequences
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
