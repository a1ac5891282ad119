//! Headless match runner for automated play and CI verification.
//!
//! Runs Broadside matches without any presentation layer:
//!
//! - **Single matches**: two policies play one seeded match to completion
//! - **Batches**: many seeds in parallel for balance numbers
//! - **Live play**: a match on the async host, advancing on the wall clock
//!
//! Reports go to stdout as JSON; logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # One match, default policies
//! cargo run -p broadside_headless -- run --seed 7
//!
//! # Balance batch
//! cargo run -p broadside_headless -- batch --count 500 --policy-a aggressive
//!
//! # Check data files
//! cargo run -p broadside_headless -- validate --config my_match.ron
//! ```

pub mod batch;
pub mod live;
pub mod loader;
pub mod policy;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use live::{run_live, LiveConfig};
pub use loader::{LoadError, MatchData};
pub use policy::{IdlePolicy, Policy, PolicyConfig, PolicyKind, PriorityPolicy};
pub use runner::{MatchReport, MatchRunner};
