//! File-backed store: a `MemoryStore` whose committed state is written to a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::models::{
    GameMatch, Group, GroupId, GroupKind, MatchId, Participant, Placement, Slot,
    TournamentError, TournamentOptions,
};
use crate::store::{MemoryStore, Store, StoreState};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the state file at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TournamentError> {
        let path = path.into();
        let state = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| TournamentError::Storage(format!("failed to read {path:?}: {e}")))?;
            let state: StoreState = serde_json::from_str(&contents)
                .map_err(|e| TournamentError::Storage(format!("failed to parse {path:?}: {e}")))?;
            info!(
                "Loaded tournament state from {:?} ({} participants, {} groups)",
                path,
                state.participants.len(),
                state.groups.len()
            );
            state
        } else {
            StoreState::default()
        };
        Ok(Self {
            path,
            inner: MemoryStore::from_state(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), TournamentError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| TournamentError::Storage(format!("failed to create {parent:?}: {e}")))?;
            }
        }
        let json = serde_json::to_string_pretty(self.inner.state())
            .map_err(|e| TournamentError::Storage(format!("failed to serialize state: {e}")))?;
        // Written beside the target, then renamed over it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| TournamentError::Storage(format!("failed to write {tmp:?}: {e}")))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| TournamentError::Storage(format!("failed to replace {:?}: {e}", self.path)))?;
        debug!("Saved tournament state to {:?}", self.path);
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn begin(&mut self) {
        self.inner.begin();
    }

    fn commit(&mut self) -> Result<(), TournamentError> {
        if let Err(e) = self.save() {
            self.inner.rollback();
            return Err(e);
        }
        self.inner.commit()
    }

    fn rollback(&mut self) {
        self.inner.rollback();
    }

    fn reset_tournament(&mut self, name: &str) -> Result<(), TournamentError> {
        self.inner.reset_tournament(name)
    }

    fn options(&self) -> Result<TournamentOptions, TournamentError> {
        self.inner.options()
    }

    fn set_options(&mut self, options: TournamentOptions) -> Result<(), TournamentError> {
        self.inner.set_options(options)
    }

    fn register_participant(
        &mut self,
        external_id: &str,
        display_name: &str,
    ) -> Result<(), TournamentError> {
        self.inner.register_participant(external_id, display_name)
    }

    fn list_participants(&self, group: Option<GroupId>) -> Vec<Participant> {
        self.inner.list_participants(group)
    }

    fn reassign_participant_group(
        &mut self,
        display_name: &str,
        placement: Placement,
    ) -> Result<(), TournamentError> {
        self.inner.reassign_participant_group(display_name, placement)
    }

    fn groups(&self) -> Vec<Group> {
        self.inner.groups()
    }

    fn group(&self, id: GroupId) -> Result<Group, TournamentError> {
        self.inner.group(id)
    }

    fn create_group(&mut self, name: &str, kind: GroupKind) -> GroupId {
        self.inner.create_group(name, kind)
    }

    fn mark_group_closed(&mut self, id: GroupId) -> Result<(), TournamentError> {
        self.inner.mark_group_closed(id)
    }

    fn group_referencing(&self, slot: &Slot) -> Option<GroupId> {
        self.inner.group_referencing(slot)
    }

    fn matches(&self, group: GroupId) -> Vec<GameMatch> {
        self.inner.matches(group)
    }

    fn create_match(
        &mut self,
        group: GroupId,
        best_of: u32,
        slot_1: Slot,
        slot_2: Slot,
    ) -> Result<MatchId, TournamentError> {
        self.inner.create_match(group, best_of, slot_1, slot_2)
    }

    fn find_open_match(&self, player_1: &str, player_2: &str) -> Option<GameMatch> {
        self.inner.find_open_match(player_1, player_2)
    }

    fn record_score(
        &mut self,
        player_1: &str,
        player_2: &str,
        score_1: u32,
        score_2: u32,
    ) -> Result<GroupId, TournamentError> {
        self.inner.record_score(player_1, player_2, score_1, score_2)
    }

    fn rewrite_match_slot(
        &mut self,
        group: GroupId,
        old: &Slot,
        new: &Slot,
    ) -> Result<usize, TournamentError> {
        self.inner.rewrite_match_slot(group, old, new)
    }

    fn close_tournament(&mut self, winner: &str) -> Result<(), TournamentError> {
        self.inner.close_tournament(winner)
    }
}
