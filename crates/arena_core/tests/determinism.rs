//! Replaying a battle must reproduce it exactly.

use arena_core::battle::{BattleMode, Session};
use arena_core::config::BattleConfig;
use arena_core::grid::Team;
use arena_test_utils::determinism::{
    compute_hash, find_first_divergence, verify_battle_determinism, verify_determinism,
    verify_snapshot_determinism,
};
use arena_test_utils::fixtures::{army, capped_config, skirmish};

#[test]
fn skirmish_rounds_hash_identically() {
    verify_determinism(
        4,
        25,
        || skirmish(capped_config(80)),
        |battle| {
            battle.play_round();
        },
        |battle| battle.state_hash(),
    )
    .assert_deterministic();
}

#[test]
fn full_skirmish_replays_to_same_end() {
    assert!(verify_battle_determinism(|| skirmish(capped_config(150))));
    assert_eq!(find_first_divergence(|| skirmish(capped_config(150)), 150), None);
}

#[test]
fn second_team_first_is_also_deterministic() {
    let config = BattleConfig {
        first_team: Team::Two,
        ..capped_config(150)
    };
    assert!(verify_battle_determinism(|| skirmish(config)));
}

#[test]
fn ai_session_matches_itself() {
    let play = || {
        let mut session = Session::new(
            capped_config(-1),
            BattleMode::AiVsAi,
            army("red", &["Spear", "Bow", "Ice Staff"]),
            army("blue", &["Axe", "Crossbow"]),
        );
        let mut turns = 0;
        while !session.is_over() && turns < 300 {
            session.advance_ai();
            turns += 1;
        }
        (session.battlefield().state_hash(), compute_hash(&session.save_data().active_team))
    };

    assert_eq!(play(), play());
}

#[test]
fn mid_battle_snapshot_restores_exactly() {
    let mut battle = skirmish(capped_config(150));
    for _ in 0..6 {
        battle.play_round();
    }
    assert!(verify_snapshot_determinism(battle.battlefield()));
}
