//! Property tests over random action scripts.

use broadside_core::math::Fixed;
use broadside_core::prelude::*;
use broadside_test_utils::determinism::strategies::{
    arb_card, arb_lane, arb_pool, arb_script, arb_side,
};
use broadside_test_utils::determinism::{apply_script, verify_determinism, ScriptedAction};
use broadside_test_utils::fixtures::{fast_config, playing_match};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pool_stays_within_bounds((current, max, regen) in arb_pool(), spends in prop::collection::vec(0u32..8, 0..40)) {
        let mut pool = ResourcePool::new(current, max, regen);
        for spend in spends {
            let _ = pool.tick();
            let _ = pool.try_debit(spend);
            prop_assert!(pool.current() <= pool.max());
        }
    }

    #[test]
    fn energy_never_exceeds_cap(script in arb_script(40)) {
        let mut ctx = playing_match(fast_config());
        for action in &script {
            action.apply(&mut ctx);
            for side in Side::ALL {
                prop_assert!(ctx.energy(side) <= ctx.pool(side).max());
            }
        }
    }

    #[test]
    fn rejected_plays_leave_no_trace(
        script in arb_script(30),
        side in arb_side(),
        card in arb_card(),
        lane in arb_lane(),
        target_index in proptest::option::of(0usize..8),
    ) {
        let mut ctx = playing_match(fast_config());
        apply_script(&mut ctx, &script);
        ctx.drain_events();

        let before = ctx.state_hash();
        let energy_before = ctx.energy(side);
        let target = target_index.and_then(|index| {
            let ids = ctx.registry().sorted_ids();
            (!ids.is_empty()).then(|| ids[index % ids.len()])
        });
        let def = ctx.catalog().get(&CardId::new(card.as_str())).cloned();

        if !ctx.try_play_card(def.as_ref(), lane, target, side) {
            prop_assert_eq!(ctx.state_hash(), before);
            prop_assert_eq!(ctx.energy(side), energy_before);
            prop_assert!(ctx.pending_events().is_empty());
        }
    }

    #[test]
    fn rejected_launches_leave_no_trace(script in arb_script(30), side in arb_side(), lane in arb_lane()) {
        let mut ctx = playing_match(fast_config());
        apply_script(&mut ctx, &script);
        ctx.drain_events();

        let before = ctx.state_hash();
        let units_before = ctx.registry().len();
        if !ctx.launch_from_lane(lane, side) {
            prop_assert_eq!(ctx.state_hash(), before);
            prop_assert_eq!(ctx.registry().len(), units_before);
            prop_assert!(ctx.pending_events().is_empty());
        }
    }

    #[test]
    fn launched_ship_sums_its_buffer(cards in prop::collection::vec(0usize..3, 1..4), side in arb_side()) {
        let crew = ["deckhand", "boatswain", "gunner"];
        let mut ctx = playing_match(MatchConfig {
            max_energy: 20,
            starting_energy: 20,
            ..fast_config()
        });

        let mut attack = 0;
        let mut defense = 0;
        for index in &cards {
            let id = CardId::new(crew[*index]);
            let def = ctx.catalog().get(&id).cloned().unwrap();
            ctx.play_card(&def, 0, None, side).unwrap();
            attack += def.attack;
            defense += def.defense;
        }

        let id = ctx.launch(0, side).unwrap();
        let unit = ctx.unit(id).unwrap();
        prop_assert_eq!(unit.attack(), attack);
        prop_assert_eq!(unit.max_health(), defense.max(1));
        prop_assert_eq!(unit.crew() as usize, cards.len());
        prop_assert_eq!(ctx.buffer(0, side).unwrap().contributors(), 0);
    }

    #[test]
    fn units_never_leave_their_lane_bounds(script in arb_script(40)) {
        let config = fast_config();
        let mut ctx = playing_match(config.clone());
        apply_script(&mut ctx, &script);
        for unit in ctx.registry().iter() {
            prop_assert!(unit.position() >= Fixed::ZERO);
            prop_assert!(unit.position() <= config.lane_end());
            prop_assert!(unit.lane() < config.lane_count);
        }
    }

    #[test]
    fn scripts_replay_deterministically(script in arb_script(30)) {
        let result = verify_determinism(2, || playing_match(fast_config()), &script);
        prop_assert!(result.is_deterministic, "hashes diverged: {:?}", result.hashes);
    }
}

#[test]
fn long_scripted_match_is_deterministic() {
    let mut script = Vec::new();
    for round in 0..12 {
        let lane = round % 3;
        script.push(ScriptedAction::Play {
            side: Side::A,
            card: "boatswain".to_string(),
            lane,
            target_index: None,
        });
        script.push(ScriptedAction::Play {
            side: Side::B,
            card: if round % 2 == 0 { "gunner" } else { "deckhand" }.to_string(),
            lane,
            target_index: None,
        });
        script.push(ScriptedAction::Launch { side: Side::A, lane });
        script.push(ScriptedAction::Launch { side: Side::B, lane });
        script.push(ScriptedAction::Play {
            side: Side::B,
            card: "broadside_volley".to_string(),
            lane,
            target_index: None,
        });
        script.push(ScriptedAction::Tick(7));
    }

    verify_determinism(4, || playing_match(fast_config()), &script).assert_deterministic();
}
