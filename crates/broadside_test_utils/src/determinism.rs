//! Determinism testing utilities.
//!
//! The match core promises that two contexts fed the same actions in the
//! same ticks end in the same state. These helpers replay an action script
//! several times and compare [`MatchContext::state_hash`] values.

use broadside_core::prelude::*;
use serde::{Deserialize, Serialize};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptedAction {
    /// Play a catalog card, optionally onto the `target_index`-th active unit
    /// in id order (wrapped around).
    Play {
        /// Acting side.
        side: Side,
        /// Card id.
        card: String,
        /// Lane.
        lane: LaneIndex,
        /// Which registered unit to target, if any.
        target_index: Option<usize>,
    },
    /// Launch a lane buffer.
    Launch {
        /// Acting side.
        side: Side,
        /// Lane.
        lane: LaneIndex,
    },
    /// Advance the match.
    Tick(u32),
}

impl ScriptedAction {
    /// Apply the step; rejected actions are ignored.
    pub fn apply(&self, ctx: &mut MatchContext) {
        match self {
            Self::Play {
                side,
                card,
                lane,
                target_index,
            } => {
                let target = target_index.and_then(|index| {
                    let ids: Vec<UnitId> = ctx.registry().iter().map(CombatUnit::id).collect();
                    if ids.is_empty() {
                        None
                    } else {
                        Some(ids[index % ids.len()])
                    }
                });
                let def = ctx.catalog().get(&CardId::new(card.as_str())).cloned();
                ctx.try_play_card(def.as_ref(), *lane, target, *side);
            }
            Self::Launch { side, lane } => {
                ctx.launch_from_lane(*lane, *side);
            }
            Self::Tick(count) => {
                for _ in 0..*count {
                    ctx.tick();
                }
            }
        }
    }
}

/// Apply every step of a script in order.
pub fn apply_script(ctx: &mut MatchContext, script: &[ScriptedAction]) {
    for action in script {
        action.apply(ctx);
    }
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Assert that every run ended in the same state.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let mut unique = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Replay `script` on `runs` fresh matches built by `setup`.
pub fn verify_determinism<Setup>(
    runs: usize,
    setup: Setup,
    script: &[ScriptedAction],
) -> DeterminismResult
where
    Setup: Fn() -> MatchContext,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut ctx = setup();
            apply_script(&mut ctx, script);
            ctx.state_hash()
        })
        .collect();

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(?hashes, "Replayed matches diverged");
    }
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Proptest strategies for match testing.
pub mod strategies {
    use super::ScriptedAction;
    use broadside_core::prelude::*;
    use proptest::prelude::*;

    /// Card ids of the standard deck.
    pub const STANDARD_CARDS: [&str; 7] = [
        "deckhand",
        "boatswain",
        "gunner",
        "cannon",
        "hull_plating",
        "broadside_volley",
        "change_course",
    ];

    /// Either side.
    pub fn arb_side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::A), Just(Side::B)]
    }

    /// A lane index, sometimes out of range for a three-lane match.
    pub fn arb_lane() -> impl Strategy<Value = LaneIndex> {
        0usize..4
    }

    /// A standard card id.
    pub fn arb_card() -> impl Strategy<Value = String> {
        proptest::sample::select(STANDARD_CARDS.to_vec()).prop_map(str::to_string)
    }

    /// Any single scripted step.
    pub fn arb_action() -> impl Strategy<Value = ScriptedAction> {
        prop_oneof![
            3 => (arb_side(), arb_card(), arb_lane(), proptest::option::of(0usize..8)).prop_map(
                |(side, card, lane, target_index)| ScriptedAction::Play {
                    side,
                    card,
                    lane,
                    target_index,
                }
            ),
            1 => (arb_side(), arb_lane()).prop_map(|(side, lane)| ScriptedAction::Launch { side, lane }),
            2 => (1u32..30).prop_map(ScriptedAction::Tick),
        ]
    }

    /// A script of up to `max_len` steps.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ScriptedAction>> {
        proptest::collection::vec(arb_action(), 0..max_len)
    }

    /// Energy pool parameters `(current, max, regen)` with `current <= max`.
    pub fn arb_pool() -> impl Strategy<Value = (u32, u32, u32)> {
        (1u32..20, 1u32..4).prop_flat_map(|(max, regen)| (0..=max, Just(max), Just(regen)))
    }
}
