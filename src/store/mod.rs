//! Persistence boundary: every read and write the engine performs goes through `Store`.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::{MemoryStore, StoreState};

use crate::models::{
    GameMatch, Group, GroupId, GroupKind, MatchId, Participant, Placement, Slot,
    TournamentError, TournamentOptions,
};

/// Transactional store for one active tournament.
///
/// Mutations between `begin` and `commit` become visible to other readers only as a whole;
/// `rollback` restores the state as of `begin`.
pub trait Store {
    fn begin(&mut self);
    fn commit(&mut self) -> Result<(), TournamentError>;
    fn rollback(&mut self);

    /// Drop all participants, groups, matches and options; start an open tournament.
    fn reset_tournament(&mut self, name: &str) -> Result<(), TournamentError>;
    fn options(&self) -> Result<TournamentOptions, TournamentError>;
    fn set_options(&mut self, options: TournamentOptions) -> Result<(), TournamentError>;

    /// Register, or rename if `external_id` is already registered.
    fn register_participant(
        &mut self,
        external_id: &str,
        display_name: &str,
    ) -> Result<(), TournamentError>;
    /// Participants of one group, or all of them, in registration order.
    fn list_participants(&self, group: Option<GroupId>) -> Vec<Participant>;
    fn reassign_participant_group(
        &mut self,
        display_name: &str,
        placement: Placement,
    ) -> Result<(), TournamentError>;

    fn groups(&self) -> Vec<Group>;
    fn group(&self, id: GroupId) -> Result<Group, TournamentError>;
    fn create_group(&mut self, name: &str, kind: GroupKind) -> GroupId;
    fn mark_group_closed(&mut self, id: GroupId) -> Result<(), TournamentError>;
    /// The group containing a match that has `slot` on either side.
    fn group_referencing(&self, slot: &Slot) -> Option<GroupId>;

    fn matches(&self, group: GroupId) -> Vec<GameMatch>;
    fn create_match(
        &mut self,
        group: GroupId,
        best_of: u32,
        slot_1: Slot,
        slot_2: Slot,
    ) -> Result<MatchId, TournamentError>;
    /// The match between two names (either order) in a group that is not closed.
    fn find_open_match(&self, player_1: &str, player_2: &str) -> Option<GameMatch>;
    /// Store a result; returns the group of the match.
    fn record_score(
        &mut self,
        player_1: &str,
        player_2: &str,
        score_1: u32,
        score_2: u32,
    ) -> Result<GroupId, TournamentError>;
    /// Replace `old` with `new` in the group's matches; returns how many slots changed.
    fn rewrite_match_slot(
        &mut self,
        group: GroupId,
        old: &Slot,
        new: &Slot,
    ) -> Result<usize, TournamentError>;

    /// Mark the tournament finished with `winner` as champion.
    fn close_tournament(&mut self, winner: &str) -> Result<(), TournamentError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn begin(&mut self) {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), TournamentError> {
        (**self).commit()
    }

    fn rollback(&mut self) {
        (**self).rollback()
    }

    fn reset_tournament(&mut self, name: &str) -> Result<(), TournamentError> {
        (**self).reset_tournament(name)
    }

    fn options(&self) -> Result<TournamentOptions, TournamentError> {
        (**self).options()
    }

    fn set_options(&mut self, options: TournamentOptions) -> Result<(), TournamentError> {
        (**self).set_options(options)
    }

    fn register_participant(
        &mut self,
        external_id: &str,
        display_name: &str,
    ) -> Result<(), TournamentError> {
        (**self).register_participant(external_id, display_name)
    }

    fn list_participants(&self, group: Option<GroupId>) -> Vec<Participant> {
        (**self).list_participants(group)
    }

    fn reassign_participant_group(
        &mut self,
        display_name: &str,
        placement: Placement,
    ) -> Result<(), TournamentError> {
        (**self).reassign_participant_group(display_name, placement)
    }

    fn groups(&self) -> Vec<Group> {
        (**self).groups()
    }

    fn group(&self, id: GroupId) -> Result<Group, TournamentError> {
        (**self).group(id)
    }

    fn create_group(&mut self, name: &str, kind: GroupKind) -> GroupId {
        (**self).create_group(name, kind)
    }

    fn mark_group_closed(&mut self, id: GroupId) -> Result<(), TournamentError> {
        (**self).mark_group_closed(id)
    }

    fn group_referencing(&self, slot: &Slot) -> Option<GroupId> {
        (**self).group_referencing(slot)
    }

    fn matches(&self, group: GroupId) -> Vec<GameMatch> {
        (**self).matches(group)
    }

    fn create_match(
        &mut self,
        group: GroupId,
        best_of: u32,
        slot_1: Slot,
        slot_2: Slot,
    ) -> Result<MatchId, TournamentError> {
        (**self).create_match(group, best_of, slot_1, slot_2)
    }

    fn find_open_match(&self, player_1: &str, player_2: &str) -> Option<GameMatch> {
        (**self).find_open_match(player_1, player_2)
    }

    fn record_score(
        &mut self,
        player_1: &str,
        player_2: &str,
        score_1: u32,
        score_2: u32,
    ) -> Result<GroupId, TournamentError> {
        (**self).record_score(player_1, player_2, score_1, score_2)
    }

    fn rewrite_match_slot(
        &mut self,
        group: GroupId,
        old: &Slot,
        new: &Slot,
    ) -> Result<usize, TournamentError> {
        (**self).rewrite_match_slot(group, old, new)
    }

    fn close_tournament(&mut self, winner: &str) -> Result<(), TournamentError> {
        (**self).close_tournament(winner)
    }
}

/// Run `f` inside a store transaction: commit on success, roll back on any error.
pub fn atomically<S, T, F>(store: &mut S, f: F) -> Result<T, TournamentError>
where
    S: Store + ?Sized,
    F: FnOnce(&mut S) -> Result<T, TournamentError>,
{
    store.begin();
    match f(store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(e) => {
            store.rollback();
            Err(e)
        }
    }
}
