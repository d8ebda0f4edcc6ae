//! Integration tests for bracket construction: seed groups, promotion rounds, grouping preview.

use std::collections::HashSet;

use group_bracket::{
    grouping_preview, plan_bracket, seed_group_count, BracketConfig, BracketPlan, GroupKind,
    GroupingOption, MemoryStore, Placement, Slot, Store, TournamentError, ValidationError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

fn config(group_size: u32) -> BracketConfig {
    BracketConfig {
        group_size,
        best_of: 3,
        finals_best_of: 5,
    }
}

fn plan(n: usize, group_size: u32, seed: u64) -> BracketPlan {
    plan_bracket(&names(n), &config(group_size), &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn placeholders(plan: &BracketPlan) -> Vec<Slot> {
    plan.groups
        .iter()
        .flat_map(|g| g.matches.iter())
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .filter(|s| !s.is_resolved())
        .collect()
}

#[test]
fn seed_group_count_reduces_to_power_of_two() {
    assert_eq!(seed_group_count(21, 4), 4); // 5 -> 4
    assert_eq!(seed_group_count(16, 4), 4);
    assert_eq!(seed_group_count(24, 4), 4); // 6 -> 4
    assert_eq!(seed_group_count(12, 2), 4); // 6 -> 4
    assert_eq!(seed_group_count(7, 2), 2); // 3 -> 2
    assert_eq!(seed_group_count(5, 4), 1);
    assert_eq!(seed_group_count(3, 4), 0);
}

#[test]
fn seed_groups_cover_every_participant() {
    for (n, g) in [(21, 4), (23, 4), (20, 3), (9, 2), (40, 6), (4, 4)] {
        let plan = plan(n, g, 7);
        let seeds: Vec<_> = plan.seed_groups().collect();
        assert!(seeds.len().is_power_of_two());
        assert!(seeds.len() <= n / g as usize);
        assert_eq!(seeds.iter().map(|s| s.members.len()).sum::<usize>(), n);

        let all: HashSet<&String> = seeds.iter().flat_map(|s| s.members.iter()).collect();
        assert_eq!(all.len(), n, "every participant is seeded exactly once");
    }
}

#[test]
fn seed_group_plays_full_round_robin() {
    let plan = plan(21, 4, 1);
    for group in plan.seed_groups() {
        let k = group.members.len();
        assert_eq!(group.matches.len(), k * (k - 1) / 2);
        assert_eq!(group.best_of, 3);
        let pairs: HashSet<(String, String)> = group
            .matches
            .iter()
            .map(|(a, b)| {
                let (a, b) = (a.name().unwrap().to_string(), b.name().unwrap().to_string());
                if a < b { (a, b) } else { (b, a) }
            })
            .collect();
        assert_eq!(pairs.len(), group.matches.len(), "no pairing is repeated");
    }
}

#[test]
fn excess_players_are_dealt_into_retained_groups() {
    // 23 / 4 = 5 groups, reduced to 4: the fifth group's players join the others
    let plan = plan(23, 4, 3);
    let mut sizes: Vec<usize> = plan.seed_groups().map(|g| g.members.len()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![5, 6, 6, 6]);

    // 20 / 3 = 6 groups, reduced to 4 groups of 5
    let plan = plan_bracket(&names(20), &config(3), &mut StdRng::seed_from_u64(3)).unwrap();
    assert!(plan.seed_groups().all(|g| g.members.len() == 5));
}

#[test]
fn large_groups_promote_winner_and_second() {
    let plan = plan(21, 4, 11);
    assert_eq!(plan.seed_groups().count(), 4);
    // 4 crossed groups, then 2, then the final
    assert_eq!(plan.promotion_groups().count(), 7);

    let first_round: Vec<_> = plan.promotion_groups().take(4).collect();
    assert_eq!(first_round[0].matches, vec![(Slot::WinnerOf(1), Slot::SecondOf(2))]);
    assert_eq!(first_round[1].matches, vec![(Slot::SecondOf(1), Slot::WinnerOf(2))]);
    assert_eq!(first_round[2].matches, vec![(Slot::WinnerOf(3), Slot::SecondOf(4))]);
    assert_eq!(first_round[3].matches, vec![(Slot::SecondOf(3), Slot::WinnerOf(4))]);

    let final_group = plan.groups.last().unwrap();
    assert_eq!(final_group.matches, vec![(Slot::WinnerOf(9), Slot::WinnerOf(10))]);
    for group in plan.promotion_groups() {
        assert_eq!(group.matches.len(), 1);
        assert_eq!(group.best_of, 5);
        assert!(group.members.is_empty());
    }
}

#[test]
fn small_groups_promote_only_the_winner() {
    let plan = plan(12, 3, 5);
    assert_eq!(plan.seed_groups().count(), 4);
    assert_eq!(plan.promotion_groups().count(), 3);
    assert!(placeholders(&plan)
        .iter()
        .all(|s| matches!(s, Slot::WinnerOf(_))));
    assert_eq!(plan.groups[4].name, "Group E: winners A/B");
}

#[test]
fn every_placeholder_is_referenced_once() {
    for (n, g) in [(21, 4), (12, 3), (64, 4), (9, 2)] {
        let plan = plan(n, g, 2);
        let slots = placeholders(&plan);
        let unique: HashSet<&Slot> = slots.iter().collect();
        assert_eq!(unique.len(), slots.len());

        // every group but the final sends its winner somewhere
        let winners = slots.iter().filter(|s| matches!(s, Slot::WinnerOf(_))).count();
        assert_eq!(winners, plan.groups.len() - 1);
    }
}

#[test]
fn single_group_has_no_promotion_rounds() {
    let plan = plan(5, 4, 9);
    assert_eq!(plan.groups.len(), 1);
    assert_eq!(plan.groups[0].kind, GroupKind::Seed);
    assert_eq!(plan.groups[0].members.len(), 5);
    assert!(placeholders(&plan).is_empty());
}

#[test]
fn same_seed_same_bracket() {
    assert_eq!(plan(21, 4, 42), plan(21, 4, 42));
}

#[test]
fn rejects_invalid_configuration() {
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        plan_bracket(&names(10), &config(7), &mut rng),
        Err(TournamentError::Validation(ValidationError::GroupSize(7)))
    );
    let even = BracketConfig {
        best_of: 2,
        ..config(3)
    };
    assert_eq!(
        plan_bracket(&names(10), &even, &mut rng),
        Err(TournamentError::Validation(ValidationError::BestOf(2)))
    );
    assert_eq!(
        plan_bracket(&names(3), &config(4), &mut rng),
        Err(TournamentError::Validation(
            ValidationError::NotEnoughParticipants {
                required: 4,
                registered: 3
            }
        ))
    );
}

#[test]
fn grouping_preview_lists_balanced_sizes() {
    assert_eq!(
        grouping_preview(21),
        vec![
            GroupingOption {
                group_size: 2,
                groups: 8,
                extra: 5
            },
            GroupingOption {
                group_size: 5,
                groups: 4,
                extra: 1
            },
        ]
    );
    assert!(grouping_preview(3).is_empty());
}

#[test]
fn install_writes_groups_matches_and_placements() {
    let players = names(21);
    let mut store = MemoryStore::new();
    store.reset_tournament("Cup").unwrap();
    for p in &players {
        store.register_participant(&format!("id-{p}"), p).unwrap();
    }
    let plan = plan_bracket(&players, &config(4), &mut StdRng::seed_from_u64(8)).unwrap();
    let ids = plan.install(&mut store).unwrap();

    assert_eq!(ids, (1..=11).collect::<Vec<_>>());
    assert_eq!(store.groups().len(), 11);
    for (group, id) in plan.seed_groups().zip(&ids) {
        let placed: Vec<String> = store
            .list_participants(Some(*id))
            .into_iter()
            .map(|p| p.name)
            .collect();
        let mut expected = group.members.clone();
        expected.sort();
        let mut placed_sorted = placed.clone();
        placed_sorted.sort();
        assert_eq!(placed_sorted, expected);
    }
    assert!(store
        .list_participants(None)
        .iter()
        .all(|p| matches!(p.placement, Placement::Group(id) if id <= 4)));
    assert_eq!(
        store.matches(11)[0].slot_1,
        Slot::WinnerOf(9),
        "placeholders point at store ids"
    );
}
