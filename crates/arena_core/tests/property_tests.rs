//! Property tests for grid, combat, AI rules and the save format.

use arena_core::ai::{AiController, AiDecision};
use arena_core::army::Army;
use arena_core::battle::Battle;
use arena_core::battlefield::Battlefield;
use arena_core::grid::{Position, Team};
use arena_core::rules;
use arena_core::save::{self, SaveData};
use arena_test_utils::determinism::strategies::{
    arb_any_position, arb_army_units, arb_grid_position, arb_unit, arb_unit_specs,
};
use arena_test_utils::fixtures::{capped_config, unit};
use proptest::prelude::*;

proptest! {
    #[test]
    fn save_data_survives_encode_and_decode(
        one in arb_army_units(),
        two in arb_army_units(),
        second_active in any::<bool>(),
    ) {
        let data = SaveData {
            armies: [one, two],
            active_team: if second_active { Team::Two } else { Team::One },
        };
        let units = data.armies[0].len() + data.armies[1].len();
        let bytes = save::encode(&data).unwrap();
        prop_assert_eq!(bytes.len(), save::HEADER_LEN + save::RECORD_LEN * units);
        prop_assert_eq!(save::decode(&bytes).unwrap(), data);
    }

    #[test]
    fn valid_position_matches_bounds(w in 1i32..=10, h in 1i32..=10, pos in arb_any_position()) {
        let bf = Battlefield::new(w, h);
        let inside = pos.x >= 0 && pos.x < w && pos.y >= 0 && pos.y < h;
        prop_assert_eq!(bf.is_valid_position(pos), inside);
    }

    #[test]
    fn damage_is_at_least_one(attacker in arb_unit(), defender in arb_unit()) {
        let damage = rules::calculate_damage(&attacker, &defender);
        prop_assert!(damage >= rules::MIN_DAMAGE);
        prop_assert!(damage >= attacker.attack_power() - defender.defense());
    }

    #[test]
    fn area_includes_edge_and_excludes_beyond(center in arb_grid_position(), radius in 0i32..=3) {
        let bf = Battlefield::default();
        let cells = rules::area_cells(&bf, center, radius);

        for y in 0..10 {
            for x in 0..10 {
                let pos = Position::new(x, y);
                let covered = cells.contains(&pos);
                prop_assert_eq!(covered, center.chebyshev(pos) <= radius, "cell {}", pos);
            }
        }
    }

    #[test]
    fn ai_step_closes_in_on_free_cells(
        from in arb_grid_position(),
        enemy in arb_grid_position(),
        blocker in arb_grid_position(),
    ) {
        prop_assume!(from != enemy && from != blocker && enemy != blocker);

        let mut bf = Battlefield::default();
        bf.place(unit("mover", "Sword", None), Team::One, from).unwrap();
        bf.place(unit("enemy", "Sword", None), Team::Two, enemy).unwrap();
        bf.place(unit("blocker", "Shield", None), Team::One, blocker).unwrap();

        match AiController::new(Team::One).decide(&bf, from) {
            AiDecision::Step(to) => {
                prop_assert!(bf.is_empty_cell(to));
                prop_assert_eq!(from.manhattan(to), 1);
                prop_assert!(to.manhattan(enemy) < from.manhattan(enemy));
            }
            AiDecision::Attack(target) => {
                prop_assert_eq!(target, enemy);
                prop_assert_eq!(from.manhattan(enemy), 1);
            }
            AiDecision::Hold => {}
        }
    }

    #[test]
    fn removal_keeps_roster_order(remove_mask in proptest::collection::vec(any::<bool>(), 5)) {
        let mut bf = Battlefield::default();
        let placed: Vec<Position> = (0..5).map(|i| Position::new(i * 2, 3)).collect();
        for (i, &pos) in placed.iter().enumerate() {
            bf.place(unit(&format!("u{i}"), "Sword", None), Team::One, pos).unwrap();
        }

        for (&pos, &remove) in placed.iter().zip(&remove_mask) {
            if remove {
                bf.remove(pos);
            }
        }

        let expected: Vec<Position> = placed
            .iter()
            .zip(&remove_mask)
            .filter(|(_, &removed)| !removed)
            .map(|(&pos, _)| pos)
            .collect();
        prop_assert_eq!(bf.positions(Team::One).as_slice(), expected.as_slice());
        prop_assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn capped_battles_always_finish(one in arb_unit_specs(), two in arb_unit_specs()) {
        let army_one = Army::from_specs(&one).unwrap();
        let army_two = Army::from_specs(&two).unwrap();
        let mut battle = Battle::new(capped_config(40), army_one, army_two);

        battle.run();

        prop_assert!(battle.is_finished());
        prop_assert!(battle.rounds_played() <= 40);
        prop_assert!(battle.battlefield().check_invariants().is_ok());
        for team in Team::ALL {
            for (_, _, unit) in battle.battlefield().units_of(team) {
                prop_assert!(unit.health > 0);
            }
        }
    }
}
