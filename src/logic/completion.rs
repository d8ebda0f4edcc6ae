//! Group completion: close a fully scored group, promote its finishers, cascade downstream.

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::logic::standings::{StandingRecord, Standings};
use crate::models::{GroupId, Place, Placement, Slot, TournamentError};
use crate::store::{atomically, Store};

/// A participant moving into a promotion group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Advance {
    pub player: String,
    pub place: Place,
    pub group_id: GroupId,
    pub group_name: String,
}

/// What closing one group did.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupClosure {
    pub group_id: GroupId,
    pub group_name: String,
    pub standings: Vec<StandingRecord>,
    pub advances: Vec<Advance>,
    /// Set when this was the final group.
    pub champion: Option<String>,
    /// Downstream groups closed as a consequence.
    pub cascaded: Vec<GroupClosure>,
}

impl GroupClosure {
    /// The closure (this one or one it cascaded into) that declared the champion.
    pub fn champion_closure(&self) -> Option<&GroupClosure> {
        if self.champion.is_some() {
            return Some(self);
        }
        self.cascaded.iter().find_map(|c| c.champion_closure())
    }
}

/// A group is ready once it has matches and none of them is unplayed.
pub fn is_ready<S: Store + ?Sized>(store: &S, group: GroupId) -> bool {
    let matches = store.matches(group);
    !matches.is_empty() && matches.iter().all(|m| m.is_played())
}

/// Close `group` if it is ready and not closed yet, as a single transaction.
///
/// Returns `Ok(None)` when there is nothing to do. On any error (draw, missing bracket
/// structure) the store is left exactly as it was.
pub fn close_group<S: Store + ?Sized>(
    store: &mut S,
    group: GroupId,
) -> Result<Option<GroupClosure>, TournamentError> {
    let result = atomically(store, |s| close_group_in(s, group));
    match &result {
        Err(TournamentError::Draw(place)) => {
            warn!("Group #{} cannot close yet: {} place is a draw", group, place)
        }
        Err(e) if e.is_internal() => error!("Closing group #{} failed: {}", group, e),
        _ => {}
    }
    result
}

fn close_group_in<S: Store + ?Sized>(
    store: &mut S,
    group_id: GroupId,
) -> Result<Option<GroupClosure>, TournamentError> {
    let group = store.group(group_id)?;
    if group.closed || !is_ready(store, group_id) {
        return Ok(None);
    }
    let options = store.options()?;

    let winner_slot = Slot::WinnerOf(group_id);
    let second_slot = Slot::SecondOf(group_id);
    let next_winner = store.group_referencing(&winner_slot);
    let next_second = store.group_referencing(&second_slot);

    let standings = Standings::from_matches(&store.matches(group_id));
    let placing = standings.decide()?;

    let members = store.list_participants(Some(group_id)).len();
    if next_winner.is_some() && options.group_size > 3 && members > 3 && next_second.is_none() {
        return Err(TournamentError::Consistency(format!(
            "{} has {} players but no group receives its second place",
            group.name, members
        )));
    }

    store.mark_group_closed(group_id)?;
    let mut closure = GroupClosure {
        group_id,
        group_name: group.name.clone(),
        standings: standings.into_rows(),
        advances: Vec::new(),
        champion: None,
        cascaded: Vec::new(),
    };

    let Some(winner_group) = next_winner else {
        store.reassign_participant_group(&placing.first, Placement::Champion)?;
        store.close_tournament(&placing.first)?;
        info!("{} won {} and is the tournament champion", placing.first, group.name);
        closure.champion = Some(placing.first);
        return Ok(Some(closure));
    };

    let mut promotions = vec![(Place::First, placing.first.clone(), winner_slot, winner_group)];
    if let Some(second_group) = next_second {
        let second = placing.second.clone().ok_or_else(|| {
            TournamentError::Consistency(format!(
                "{} promotes a second place but has fewer than three players",
                group.name
            ))
        })?;
        promotions.push((Place::Second, second, second_slot, second_group));
    }

    for (place, player, slot, target) in promotions {
        let target_group = store.group(target)?;
        store.reassign_participant_group(&player, Placement::Group(target))?;
        let rewritten = store.rewrite_match_slot(target, &slot, &Slot::resolved(player.as_str()))?;
        if rewritten != 1 {
            return Err(TournamentError::Consistency(format!(
                "{} holds {} slots for the {}, expected exactly one",
                target_group.name, rewritten, slot
            )));
        }
        debug!("Resolved {} to {} in {}", slot, player, target_group.name);
        info!(
            "{} finished {} in {} and advances to {}",
            player, place, group.name, target_group.name
        );
        closure.advances.push(Advance {
            player,
            place,
            group_id: target,
            group_name: target_group.name,
        });
    }

    let mut targets: Vec<GroupId> = closure.advances.iter().map(|a| a.group_id).collect();
    targets.dedup();
    for target in targets {
        let fully_resolved = store.matches(target).iter().all(|m| m.is_resolved());
        if fully_resolved {
            if let Some(cascaded) = close_group_in(store, target)? {
                closure.cascaded.push(cascaded);
            }
        }
    }

    Ok(Some(closure))
}
