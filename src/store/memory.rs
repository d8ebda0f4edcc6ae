//! In-memory store. Transactions snapshot the whole state and restore it on rollback.

use serde::{Deserialize, Serialize};

use crate::models::{
    GameMatch, Group, GroupId, GroupKind, MatchId, NotFound, Participant, Placement, Slot,
    TournamentError, TournamentOptions, TournamentStatus, ValidationError,
};
use crate::store::Store;

/// Everything the store holds; this is also the on-disk format of `JsonFileStore`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub options: Option<TournamentOptions>,
    pub participants: Vec<Participant>,
    pub groups: Vec<Group>,
    pub matches: Vec<GameMatch>,
    next_group_id: GroupId,
    next_match_id: MatchId,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: StoreState,
    /// State as of `begin`, present while a transaction is open.
    snapshot: Option<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state,
            snapshot: None,
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn options_mut(&mut self) -> Result<&mut TournamentOptions, TournamentError> {
        self.state
            .options
            .as_mut()
            .ok_or(TournamentError::NotFound(NotFound::Tournament))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, TournamentError> {
        self.state
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(TournamentError::NotFound(NotFound::Group(id)))
    }

    fn is_open_group(&self, id: GroupId) -> bool {
        self.state.groups.iter().any(|g| g.id == id && !g.closed)
    }
}

impl Store for MemoryStore {
    fn begin(&mut self) {
        if self.snapshot.is_none() {
            self.snapshot = Some(self.state.clone());
        }
    }

    fn commit(&mut self) -> Result<(), TournamentError> {
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
    }

    fn reset_tournament(&mut self, name: &str) -> Result<(), TournamentError> {
        self.state = StoreState {
            options: Some(TournamentOptions::new(name)),
            next_group_id: 1,
            next_match_id: 1,
            ..StoreState::default()
        };
        Ok(())
    }

    fn options(&self) -> Result<TournamentOptions, TournamentError> {
        self.state
            .options
            .clone()
            .ok_or(TournamentError::NotFound(NotFound::Tournament))
    }

    fn set_options(&mut self, options: TournamentOptions) -> Result<(), TournamentError> {
        *self.options_mut()? = options;
        Ok(())
    }

    fn register_participant(
        &mut self,
        external_id: &str,
        display_name: &str,
    ) -> Result<(), TournamentError> {
        self.options_mut()?;
        let taken = self
            .state
            .participants
            .iter()
            .any(|p| p.external_id != external_id && p.name.eq_ignore_ascii_case(display_name));
        if taken {
            return Err(ValidationError::DuplicateName(display_name.to_string()).into());
        }
        let participant = Participant::new(external_id, display_name);
        match self
            .state
            .participants
            .iter_mut()
            .find(|p| p.external_id == external_id)
        {
            Some(existing) => *existing = participant,
            None => self.state.participants.push(participant),
        }
        Ok(())
    }

    fn list_participants(&self, group: Option<GroupId>) -> Vec<Participant> {
        self.state
            .participants
            .iter()
            .filter(|p| group.map_or(true, |g| p.placement == Placement::Group(g)))
            .cloned()
            .collect()
    }

    fn reassign_participant_group(
        &mut self,
        display_name: &str,
        placement: Placement,
    ) -> Result<(), TournamentError> {
        let participant = self
            .state
            .participants
            .iter_mut()
            .find(|p| p.name == display_name)
            .ok_or_else(|| NotFound::Participant(display_name.to_string()))?;
        participant.placement = placement;
        Ok(())
    }

    fn groups(&self) -> Vec<Group> {
        self.state.groups.clone()
    }

    fn group(&self, id: GroupId) -> Result<Group, TournamentError> {
        self.state
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or(TournamentError::NotFound(NotFound::Group(id)))
    }

    fn create_group(&mut self, name: &str, kind: GroupKind) -> GroupId {
        let id = self.state.next_group_id.max(1);
        self.state.next_group_id = id + 1;
        self.state.groups.push(Group::new(id, name, kind));
        id
    }

    fn mark_group_closed(&mut self, id: GroupId) -> Result<(), TournamentError> {
        self.group_mut(id)?.closed = true;
        Ok(())
    }

    fn group_referencing(&self, slot: &Slot) -> Option<GroupId> {
        self.state
            .matches
            .iter()
            .find(|m| &m.slot_1 == slot || &m.slot_2 == slot)
            .map(|m| m.group_id)
    }

    fn matches(&self, group: GroupId) -> Vec<GameMatch> {
        self.state
            .matches
            .iter()
            .filter(|m| m.group_id == group)
            .cloned()
            .collect()
    }

    fn create_match(
        &mut self,
        group: GroupId,
        best_of: u32,
        slot_1: Slot,
        slot_2: Slot,
    ) -> Result<MatchId, TournamentError> {
        self.group(group)?;
        let id = self.state.next_match_id.max(1);
        self.state.next_match_id = id + 1;
        self.state
            .matches
            .push(GameMatch::new(id, group, best_of, slot_1, slot_2));
        Ok(id)
    }

    fn find_open_match(&self, player_1: &str, player_2: &str) -> Option<GameMatch> {
        self.state
            .matches
            .iter()
            .find(|m| m.is_between(player_1, player_2) && self.is_open_group(m.group_id))
            .cloned()
    }

    fn record_score(
        &mut self,
        player_1: &str,
        player_2: &str,
        score_1: u32,
        score_2: u32,
    ) -> Result<GroupId, TournamentError> {
        let found = self
            .find_open_match(player_1, player_2)
            .ok_or_else(|| NotFound::Match(player_1.to_string(), player_2.to_string()))?;
        if score_1 > found.best_of || score_2 > found.best_of {
            return Err(ValidationError::ScoreAboveBestOf {
                best_of: found.best_of,
                score: score_1.max(score_2),
            }
            .into());
        }
        let total = score_1.checked_add(score_2);
        if total != Some(found.best_of) {
            return Err(ValidationError::ScoreTotal {
                best_of: found.best_of,
                total: total.unwrap_or(u32::MAX),
            }
            .into());
        }
        let m = self
            .state
            .matches
            .iter_mut()
            .find(|m| m.id == found.id)
            .ok_or_else(|| NotFound::Match(player_1.to_string(), player_2.to_string()))?;
        m.set_score_for(player_1, score_1, score_2);
        Ok(m.group_id)
    }

    fn rewrite_match_slot(
        &mut self,
        group: GroupId,
        old: &Slot,
        new: &Slot,
    ) -> Result<usize, TournamentError> {
        self.group(group)?;
        let mut rewritten = 0;
        for m in self.state.matches.iter_mut().filter(|m| m.group_id == group) {
            for slot in [&mut m.slot_1, &mut m.slot_2] {
                if *slot == *old {
                    *slot = new.clone();
                    rewritten += 1;
                }
            }
        }
        Ok(rewritten)
    }

    fn close_tournament(&mut self, winner: &str) -> Result<(), TournamentError> {
        let options = self.options_mut()?;
        options.status = TournamentStatus::Finished;
        options.champion = Some(winner.to_string());
        options.finished_at = Some(chrono::Utc::now());
        Ok(())
    }
}
