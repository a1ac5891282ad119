//! Automated side policies.
//!
//! A policy sees the match only through [`SideFacade`], exactly like a human
//! input adapter, and acts by playing cards and launching buffers.

use broadside_core::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision loop for one side.
pub trait Policy: Send {
    /// Short name for reports.
    fn name(&self) -> &str;

    /// Called once before every tick. The policy decides whether to act now.
    fn act(&mut self, facade: &mut dyn SideFacade);
}

/// Never acts. Useful as a punching bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn name(&self) -> &str {
        "idle"
    }

    fn act(&mut self, _facade: &mut dyn SideFacade) {}
}

/// Tuning for [`PriorityPolicy`].
///
/// # Example RON
///
/// ```ron
/// PolicyConfig(
///     name: "patient",
///     launch_crew: 3,
///     think_min_ticks: 60,
///     think_max_ticks: 120,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Name used in reports.
    pub name: String,
    /// Wait before the first decision.
    pub initial_delay_ticks: Tick,
    /// Shortest pause between decisions.
    pub think_min_ticks: Tick,
    /// Longest pause between decisions.
    pub think_max_ticks: Tick,
    /// Crew aboard a buffer before it is launched.
    pub launch_crew: u32,
    /// Copies of each playable card in the deck.
    pub deck_copies: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            name: "priority".to_string(),
            initial_delay_ticks: 2 * Tick::from(TICK_RATE),
            think_min_ticks: 2 * Tick::from(TICK_RATE),
            think_max_ticks: 5 * Tick::from(TICK_RATE),
            launch_crew: 2,
            deck_copies: 2,
        }
    }
}

impl PolicyConfig {
    /// Quick decisions, single-crew launches.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            initial_delay_ticks: Tick::from(TICK_RATE),
            think_min_ticks: Tick::from(TICK_RATE),
            think_max_ticks: 2 * Tick::from(TICK_RATE),
            launch_crew: 1,
            ..Self::default()
        }
    }
}

/// Something a policy wants to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Launch an own buffer.
    Launch {
        /// Lane to launch.
        lane: LaneIndex,
    },
    /// Play a card.
    Play {
        /// Card to play.
        card: CardId,
        /// Lane it is played on.
        lane: LaneIndex,
        /// Unit it is played onto, if any.
        target: Option<UnitId>,
    },
}

/// Deck-driven priority policy.
///
/// Holds a shuffled deck of card ids with a discard pile that is reshuffled
/// into the deck once it runs dry. Cards go to the discard pile when played,
/// when the play is rejected, and when they are affordable but the policy
/// finds nothing to do with them. On each decision, in order:
/// 1. launch a buffer with enough crew aboard
/// 2. commit crew to an open buffer, or open one on a lane that is not cooling down
/// 3. fit equipment to a random own ship
/// 4. fire a maneuver at a valid target
/// 5. launch whatever is staged when nothing else is affordable
#[derive(Debug, Clone)]
pub struct PriorityPolicy {
    config: PolicyConfig,
    rng: ChaCha8Rng,
    deck: Vec<CardId>,
    discard: Vec<CardId>,
    next_think: Option<Tick>,
}

impl PriorityPolicy {
    /// Build a policy with a deck drawn from `catalog`.
    #[must_use]
    pub fn new(config: PolicyConfig, catalog: &CardCatalog, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut deck: Vec<CardId> = catalog
            .iter()
            .filter(|def| def.kind != UnitKind::Other)
            .flat_map(|def| std::iter::repeat(def.id.clone()).take(config.deck_copies))
            .collect();
        deck.shuffle(&mut rng);

        Self {
            config,
            rng,
            deck,
            discard: Vec::new(),
            next_think: None,
        }
    }

    /// Cards left before a reshuffle.
    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// Pick the next action without performing it.
    pub fn decide(&mut self, facade: &dyn SideFacade) -> Option<Decision> {
        let lanes = facade.lane_count();

        let ready = (0..lanes).find(|&lane| {
            facade
                .buffer(lane)
                .is_some_and(|buffer| buffer.contributors() >= self.config.launch_crew)
        });
        if let Some(lane) = ready {
            return Some(Decision::Launch { lane });
        }

        let affordable: Vec<UnitDefinition> = self
            .deck
            .iter()
            .filter_map(|id| facade.catalog().get(id))
            .filter(|def| facade.can_afford(def))
            .cloned()
            .collect();

        if let Some(def) = affordable.iter().find(|def| def.kind == UnitKind::Crew) {
            let open = (0..lanes).find(|&lane| facade.buffer(lane).is_some_and(|b| !b.is_empty()));
            let lane = open.or_else(|| (0..lanes).find(|&lane| facade.can_commit(lane)));
            if let Some(lane) = lane {
                return Some(Decision::Play {
                    card: def.id.clone(),
                    lane,
                    target: None,
                });
            }
        }

        let own = facade.own_units();
        if let Some(def) = affordable.iter().find(|def| def.kind == UnitKind::Equipment) {
            if let Some(unit) = own.choose(&mut self.rng) {
                return Some(Decision::Play {
                    card: def.id.clone(),
                    lane: unit.lane,
                    target: Some(unit.id),
                });
            }
        }

        for def in affordable.iter().filter(|def| def.kind == UnitKind::Maneuver) {
            match def.effect {
                Some(EffectKind::Damage { .. }) => {
                    if let Some(enemy) = facade.enemy_units().first() {
                        return Some(Decision::Play {
                            card: def.id.clone(),
                            lane: enemy.lane,
                            target: None,
                        });
                    }
                }
                Some(EffectKind::Reposition { lane_offset }) => {
                    let movable = own.iter().find(|unit| {
                        unit.state == MotionState::Advancing
                            && shifted_lane(unit.lane, lane_offset, lanes)
                                .is_some_and(|to| facade.own_units_in(to).is_empty())
                    });
                    if let Some(unit) = movable {
                        return Some(Decision::Play {
                            card: def.id.clone(),
                            lane: unit.lane,
                            target: Some(unit.id),
                        });
                    }
                }
                None => {}
            }
        }

        (0..lanes)
            .find(|&lane| facade.buffer(lane).is_some_and(|b| !b.is_empty()))
            .map(|lane| Decision::Launch { lane })
    }

    fn recycle(&mut self) {
        if self.deck.is_empty() && !self.discard.is_empty() {
            self.deck.append(&mut self.discard);
            self.deck.shuffle(&mut self.rng);
        }
    }

    /// Move every affordable card with no use right now to the discard pile,
    /// so the deck cannot jam on cards that never find a target.
    fn discard_affordable(&mut self, facade: &dyn SideFacade) -> usize {
        let before = self.discard.len();
        let (stuck, keep): (Vec<CardId>, Vec<CardId>) =
            std::mem::take(&mut self.deck).into_iter().partition(|id| {
                facade
                    .catalog()
                    .get(id)
                    .is_some_and(|def| facade.can_afford(def))
            });
        self.deck = keep;
        self.discard.extend(stuck);
        self.discard.len() - before
    }

    fn discard_card(&mut self, card: &CardId) {
        if let Some(index) = self.deck.iter().position(|id| id == card) {
            let played = self.deck.swap_remove(index);
            self.discard.push(played);
        }
    }
}

impl Policy for PriorityPolicy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn act(&mut self, facade: &mut dyn SideFacade) {
        let now = facade.now();
        let due = *self
            .next_think
            .get_or_insert(now + self.config.initial_delay_ticks);
        if now < due {
            return;
        }
        let min = self.config.think_min_ticks;
        let pause = self.rng.gen_range(min..=self.config.think_max_ticks.max(min));
        self.next_think = Some(now + pause);

        self.recycle();
        let side = facade.side();
        let Some(decision) = self.decide(&*facade) else {
            let dropped = self.discard_affordable(&*facade);
            tracing::trace!(side = ?side, tick = now, dropped, "Policy has nothing to do");
            return;
        };
        if let Decision::Play { card, .. } = &decision {
            self.discard_card(card);
        }

        let result = match &decision {
            Decision::Launch { lane } => facade.launch(*lane).map(|_| ()),
            Decision::Play { card, lane, target } => {
                facade.play_card(card, *lane, *target).map(|_| ())
            }
        };
        match result {
            Ok(()) => {
                tracing::debug!(side = ?side, tick = now, ?decision, "Policy acted");
            }
            Err(err) => {
                tracing::debug!(side = ?side, tick = now, ?decision, reason = %err, "Policy action rejected");
            }
        }
    }
}

fn shifted_lane(lane: LaneIndex, offset: i32, lane_count: usize) -> Option<LaneIndex> {
    let to = i64::try_from(lane).ok()? + i64::from(offset);
    usize::try_from(to).ok().filter(|&to| to < lane_count && to != lane)
}

/// Policies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum PolicyKind {
    /// [`PriorityPolicy`] with default tuning.
    Priority,
    /// [`PriorityPolicy`] with [`PolicyConfig::aggressive`].
    Aggressive,
    /// [`IdlePolicy`].
    Idle,
}

impl PolicyKind {
    /// Instantiate the policy.
    #[must_use]
    pub fn build(self, catalog: &CardCatalog, seed: u64) -> Box<dyn Policy> {
        match self {
            Self::Priority => Box::new(PriorityPolicy::new(PolicyConfig::default(), catalog, seed)),
            Self::Aggressive => {
                Box::new(PriorityPolicy::new(PolicyConfig::aggressive(), catalog, seed))
            }
            Self::Idle => Box::new(IdlePolicy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_test_utils::fixtures::{fast_config, launch_ship, playing_match};

    fn policy(config: PolicyConfig) -> PriorityPolicy {
        PriorityPolicy::new(config, &CardCatalog::standard(), 7)
    }

    #[test]
    fn test_deck_holds_copies_of_every_card() {
        let policy = policy(PolicyConfig::default());
        assert_eq!(policy.deck_len(), 14);
    }

    #[test]
    fn test_waits_for_initial_delay() {
        let mut ctx = playing_match(fast_config());
        let mut policy = policy(PolicyConfig::default());

        policy.act(&mut ctx.port(Side::A));
        assert_eq!(ctx.stats(Side::A).cards_played, 0);

        ctx.run_for(40);
        policy.act(&mut ctx.port(Side::A));
        assert_eq!(ctx.stats(Side::A).cards_played, 1);
    }

    #[test]
    fn test_commits_crew_first() {
        let mut ctx = playing_match(fast_config());
        let mut policy = policy(PolicyConfig::default());

        let decision = policy.decide(&ctx.port(Side::B));
        assert!(matches!(decision, Some(Decision::Play { target: None, .. })));
        if let Some(Decision::Play { card, .. }) = decision {
            let def = ctx.catalog().get(&card).unwrap();
            assert_eq!(def.kind, UnitKind::Crew);
        }
    }

    #[test]
    fn test_launches_full_buffer() {
        let mut ctx = playing_match(fast_config());
        for _ in 0..2 {
            ctx.play_card_by_id(&CardId::new("deckhand"), 1, None, Side::A)
                .unwrap();
        }
        let mut policy = policy(PolicyConfig::default());
        assert_eq!(
            policy.decide(&ctx.port(Side::A)),
            Some(Decision::Launch { lane: 1 })
        );
    }

    #[test]
    fn test_launches_staged_crew_when_broke() {
        let config = MatchConfig {
            max_energy: 2,
            starting_energy: 2,
            ..fast_config()
        };
        let mut ctx = playing_match(config);
        ctx.play_card_by_id(&CardId::new("deckhand"), 2, None, Side::A)
            .unwrap();
        assert_eq!(ctx.energy(Side::A), 0);

        let mut policy = policy(PolicyConfig::default());
        assert_eq!(
            policy.decide(&ctx.port(Side::A)),
            Some(Decision::Launch { lane: 2 })
        );
    }

    #[test]
    fn test_volley_aims_at_enemy_lane() {
        let mut ctx = playing_match(fast_config());
        launch_ship(&mut ctx, Side::B, 2, &["deckhand"]);
        ctx.run_for(4);

        let volley = CardCatalog::standard()
            .get(&CardId::new("broadside_volley"))
            .cloned()
            .unwrap();
        let catalog = CardCatalog::from_definitions([volley]).unwrap();
        let mut policy = PriorityPolicy::new(PolicyConfig::default(), &catalog, 1);
        assert!(matches!(
            policy.decide(&ctx.port(Side::A)),
            Some(Decision::Play {
                lane: 2,
                target: None,
                ..
            })
        ));
    }

    fn quick_config() -> PolicyConfig {
        PolicyConfig {
            initial_delay_ticks: 0,
            think_min_ticks: 5,
            think_max_ticks: 5,
            launch_crew: 1,
            deck_copies: 1,
            ..PolicyConfig::default()
        }
    }

    #[test]
    fn test_untargetable_cards_do_not_jam_the_deck() {
        let standard = CardCatalog::standard();
        let cards = ["deckhand", "change_course"]
            .map(|id| standard.get(&CardId::new(id)).cloned().unwrap());
        let catalog = CardCatalog::from_definitions(cards).unwrap();
        let config = MatchConfig {
            lane_count: 1,
            ..fast_config()
        };
        let mut ctx = MatchContext::new(config, catalog.clone()).unwrap();
        ctx.start_match().unwrap();
        let mut policy = PriorityPolicy::new(quick_config(), &catalog, 3);

        for _ in 0..400 {
            policy.act(&mut ctx.port(Side::A));
            ctx.tick();
        }
        // One lane, so change_course never has a target.
        assert!(ctx.stats(Side::A).launched >= 3);
        assert_eq!(ctx.boardings(Side::A), 3);
    }

    #[test]
    fn test_rejected_card_is_discarded() {
        let mut ctx = playing_match(fast_config());
        let mut policy = policy(quick_config());
        policy.deck = vec![CardId::new("deckhand")];
        ctx.pause_match().unwrap();

        policy.act(&mut ctx.port(Side::A));
        assert_eq!(ctx.stats(Side::A).cards_played, 0);
        assert_eq!(policy.deck_len(), 0);
        assert_eq!(policy.discard, vec![CardId::new("deckhand")]);
    }

    #[test]
    fn test_shifted_lane_bounds() {
        assert_eq!(shifted_lane(0, 1, 3), Some(1));
        assert_eq!(shifted_lane(2, 1, 3), None);
        assert_eq!(shifted_lane(0, -1, 3), None);
        assert_eq!(shifted_lane(1, 0, 3), None);
    }

    #[test]
    fn test_idle_never_plays() {
        let mut ctx = playing_match(fast_config());
        let mut idle = PolicyKind::Idle.build(ctx.catalog(), 0);
        for _ in 0..200 {
            idle.act(&mut ctx.port(Side::A));
            ctx.tick();
        }
        assert_eq!(ctx.stats(Side::A).cards_played, 0);
        assert_eq!(idle.name(), "idle");
    }
}
