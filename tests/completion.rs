//! Integration tests for group completion: promotion, cascades, draws, and bracket defects.

use std::collections::HashSet;

use group_bracket::{
    close_group, is_ready, BracketConfig, GameMatch, GroupKind, MemoryStore, NotFound, Place,
    Placement, ServiceConfig, Slot, Store, Submission, TournamentError, TournamentService,
    TournamentStatus, ValidationError,
};

fn started(n: usize, group_size: u32, best_of: u32, finals_best_of: u32) -> TournamentService<MemoryStore> {
    let mut service = TournamentService::new(
        MemoryStore::new(),
        ServiceConfig {
            shuffle_seed: Some(2024),
        },
    );
    service.reset("Spring Cup").unwrap();
    for i in 0..n {
        service.register(&format!("user{i}"), &format!("ign{i}")).unwrap();
    }
    service
        .start(BracketConfig {
            group_size,
            best_of,
            finals_best_of,
        })
        .unwrap();
    service
}

/// Unplayed matches whose players are both known.
fn pending(service: &TournamentService<MemoryStore>) -> Vec<GameMatch> {
    service
        .games()
        .unwrap()
        .into_iter()
        .flat_map(|g| g.matches)
        .filter(|m| !m.is_played())
        .collect()
}

/// The first slot always wins by the narrowest margin its best-of allows.
fn play(service: &mut TournamentService<MemoryStore>, m: &GameMatch) -> Submission {
    let (win, lose) = ((m.best_of + 1) / 2, m.best_of / 2);
    service
        .submit_result(m.slot_1.name().unwrap(), win, m.slot_2.name().unwrap(), lose)
        .unwrap()
}

fn seed_group_members(service: &TournamentService<MemoryStore>, group: u32) -> Vec<String> {
    service
        .store()
        .list_participants(Some(group))
        .into_iter()
        .map(|p| p.name)
        .collect()
}

#[test]
fn twenty_one_players_reach_one_champion() {
    let mut service = started(21, 4, 3, 5);
    let seed_groups: Vec<_> = service
        .store()
        .groups()
        .into_iter()
        .filter(|g| g.kind == GroupKind::Seed)
        .collect();
    assert_eq!(seed_groups.len(), 4);
    assert!(!is_ready(service.store(), 1));

    let mut submissions = Vec::new();
    // seed groups first, so the crossed promotion groups can be checked before they play
    for m in pending(&service) {
        submissions.push(play(&mut service, &m));
    }
    let promoted_from_seeds: usize = submissions
        .iter()
        .map(|s| match s {
            Submission::Promoted { advances, .. } => advances.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(promoted_from_seeds, 8, "winner and second of each seed group");
    for group in 5..=8 {
        assert_eq!(seed_group_members(&service, group).len(), 2);
    }

    while service.store().options().unwrap().status == TournamentStatus::Started {
        let round = pending(&service);
        assert!(!round.is_empty(), "an open tournament always has a playable match");
        for m in round {
            submissions.push(play(&mut service, &m));
        }
    }

    let champions: Vec<&String> = submissions
        .iter()
        .filter_map(|s| match s {
            Submission::Champion { player, .. } => Some(player),
            _ => None,
        })
        .collect();
    assert_eq!(champions.len(), 1);
    assert!(matches!(submissions.last(), Some(Submission::Champion { .. })));

    let options = service.store().options().unwrap();
    assert_eq!(options.status, TournamentStatus::Finished);
    assert_eq!(options.champion.as_ref(), Some(champions[0]));
    assert!(options.finished_at.is_some());

    let store = service.store();
    assert!(store.groups().iter().all(|g| g.closed));
    for p in store.list_participants(None) {
        if &p.name == champions[0] {
            assert_eq!(p.placement, Placement::Champion);
        } else {
            let group = p.placement.group().expect("eliminated players keep their group");
            assert!(store.group(group).unwrap().closed);
        }
    }
    let unresolved = store
        .groups()
        .iter()
        .flat_map(|g| store.matches(g.id))
        .filter(|m| !m.is_resolved())
        .count();
    assert_eq!(unresolved, 0, "every placeholder was resolved");

    // 10 winners and 4 seconds feed the 7 promotion groups, each placed once
    let mut placed = HashSet::new();
    for s in &submissions {
        if let Submission::Promoted {
            group_id, advances, ..
        } = s
        {
            for a in advances {
                assert!(placed.insert((*group_id, a.place)), "{} placed twice", a.player);
            }
        }
    }
    assert_eq!(placed.len(), 14);
}

#[test]
fn sole_group_winner_is_champion() {
    let mut service = started(5, 4, 3, 5);
    assert_eq!(service.store().groups().len(), 1);

    let mut last = None;
    for m in pending(&service) {
        last = Some(play(&mut service, &m));
    }
    match last {
        Some(Submission::Champion { player, .. }) => {
            assert_eq!(service.store().options().unwrap().champion, Some(player))
        }
        other => panic!("expected a champion, got {other:?}"),
    }
}

#[test]
fn draw_blocks_closure_until_a_result_breaks_it() {
    // 6 players in groups of 3: two seed groups, winners meet in the final
    let mut service = started(6, 3, 3, 3);
    let members = seed_group_members(&service, 1);
    let (a, b, c) = (&members[0], &members[1], &members[2]);

    service.submit_result(a, 2, b, 1).unwrap();
    service.submit_result(b, 2, c, 1).unwrap();
    let err = service.submit_result(c, 2, a, 1).unwrap_err();
    assert_eq!(err, TournamentError::Draw(Place::First));

    let store = service.store();
    assert!(is_ready(store, 1));
    assert!(!store.group(1).unwrap().closed);
    assert_eq!(store.matches(3)[0].slot_1, Slot::WinnerOf(1));
    assert_eq!(seed_group_members(&service, 1).len(), 3);

    // a wins the rematch 3-0: wins tie, a's differential now leads
    match service.submit_result(a, 3, b, 0).unwrap() {
        Submission::Promoted { advances, .. } => {
            assert_eq!(advances.len(), 1);
            assert_eq!(&advances[0].player, a);
            assert_eq!(advances[0].place, Place::First);
            assert_eq!(advances[0].group_id, 3);
        }
        other => panic!("expected a promotion, got {other:?}"),
    }
    assert!(service.store().group(1).unwrap().closed);
    assert_eq!(service.store().matches(3)[0].slot_1, Slot::resolved(a.as_str()));
}

#[test]
fn unknown_pairing_and_wrong_total_are_rejected() {
    let mut service = started(8, 4, 5, 5);
    let members = seed_group_members(&service, 1);

    assert_eq!(
        service.submit_result("ign0", 3, "nobody", 2),
        Err(TournamentError::NotFound(NotFound::Match(
            "ign0".to_string(),
            "nobody".to_string()
        )))
    );
    assert_eq!(
        service.submit_result(&members[0], 2, &members[1], 1),
        Err(TournamentError::Validation(ValidationError::ScoreTotal {
            best_of: 5,
            total: 3
        }))
    );
    assert_eq!(
        service.submit_result(&members[0], 3, &members[0], 2),
        Err(TournamentError::Validation(ValidationError::SamePlayer))
    );
    assert!(matches!(
        service.submit_result(&members[0], u32::MAX, &members[1], 6),
        Err(TournamentError::Validation(ValidationError::ScoreAboveBestOf { .. }))
    ));
    assert!(service.store().matches(1).iter().all(|m| !m.is_played()));
    assert!(!service.store().group(1).unwrap().closed);
}

#[test]
fn reversed_submission_is_stored_from_the_match_point_of_view() {
    let mut service = started(8, 4, 3, 3);
    let m = pending(&service)[0].clone();
    let (first, second) = (m.slot_1.name().unwrap(), m.slot_2.name().unwrap());
    service.submit_result(second, 2, first, 1).unwrap();

    let stored = service
        .store()
        .matches(m.group_id)
        .into_iter()
        .find(|x| x.id == m.id)
        .unwrap();
    assert_eq!((stored.score_1, stored.score_2), (1, 2));
}

#[test]
fn closing_twice_is_a_no_op() {
    let mut service = started(6, 3, 3, 3);
    let matches: Vec<_> = pending(&service).into_iter().filter(|m| m.group_id == 1).collect();
    for m in &matches {
        play(&mut service, m);
    }
    let mut store = MemoryStore::from_state(service.store().state().clone());
    assert!(store.group(1).unwrap().closed);
    assert_eq!(close_group(&mut store, 1), Ok(None));
    assert_eq!(store.state(), service.store().state());
}

#[test]
fn missing_second_place_group_aborts_without_changes() {
    let mut store = MemoryStore::new();
    store.reset_tournament("Broken").unwrap();
    let mut options = store.options().unwrap();
    options.status = TournamentStatus::Started;
    options.group_size = 4;
    store.set_options(options).unwrap();

    let players = ["Ann", "Bob", "Cid", "Dan"];
    for p in players {
        store.register_participant(p, p).unwrap();
    }
    let seed = store.create_group("Group A", GroupKind::Seed);
    let next = store.create_group("Group B: winners A/?", GroupKind::Promotion);
    for p in players {
        store.reassign_participant_group(p, Placement::Group(seed)).unwrap();
    }
    for (i, a) in players.iter().enumerate() {
        for b in &players[i + 1..] {
            store.create_match(seed, 3, Slot::resolved(*a), Slot::resolved(*b)).unwrap();
            store.record_score(a, b, 2, 1).unwrap();
        }
    }
    store
        .create_match(next, 3, Slot::WinnerOf(seed), Slot::resolved("Eve"))
        .unwrap();
    let before = store.state().clone();

    let result = close_group(&mut store, seed);
    assert!(matches!(result, Err(TournamentError::Consistency(_))));
    assert!(result.unwrap_err().is_internal());
    assert_eq!(store.state(), &before);
    assert!(!store.in_transaction());
}

#[test]
fn placeholder_held_twice_aborts_without_changes() {
    let mut store = MemoryStore::new();
    store.reset_tournament("Broken").unwrap();
    let mut options = store.options().unwrap();
    options.status = TournamentStatus::Started;
    options.group_size = 2;
    store.set_options(options).unwrap();

    store.register_participant("1", "Ann").unwrap();
    store.register_participant("2", "Bob").unwrap();
    let seed = store.create_group("Group A", GroupKind::Seed);
    let next = store.create_group("Group B: winners A/A", GroupKind::Promotion);
    for p in ["Ann", "Bob"] {
        store.reassign_participant_group(p, Placement::Group(seed)).unwrap();
    }
    store
        .create_match(seed, 3, Slot::resolved("Ann"), Slot::resolved("Bob"))
        .unwrap();
    store.record_score("Ann", "Bob", 2, 1).unwrap();
    store
        .create_match(next, 3, Slot::WinnerOf(seed), Slot::WinnerOf(seed))
        .unwrap();
    let before = store.state().clone();

    assert!(matches!(
        close_group(&mut store, seed),
        Err(TournamentError::Consistency(_))
    ));
    assert_eq!(store.state(), &before);
    assert_eq!(store.matches(next)[0].slot_1, Slot::WinnerOf(seed));
}
