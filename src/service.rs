//! Tournament service: the one entry point front ends talk to.
//!
//! Holds the store and its configuration explicitly; every operation is a method here and
//! every front-end command is a `Request` variant handled by `dispatch`.

use std::collections::HashSet;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::logic::{
    close_group, grouping_preview, plan_bracket, Advance, BracketConfig, GroupingOption,
};
use crate::models::{
    GameMatch, GroupId, GroupKind, TournamentError, TournamentOptions, TournamentStatus,
    ValidationError, RESERVED_MARKER,
};
use crate::store::{atomically, Store};

/// Commands a front end can issue.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Reset {
        name: String,
    },
    Register {
        external_id: String,
        name: String,
    },
    /// CSV with header `external_id,name`.
    Import {
        csv: String,
    },
    Start {
        group_size: u32,
        best_of: u32,
        finals_best_of: u32,
    },
    SubmitResult {
        player_1: String,
        score_1: u32,
        player_2: String,
        score_2: u32,
    },
    Status,
    Games,
}

/// Answer to a `Request`, one variant per command.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Response {
    Reset(TournamentOptions),
    Registered { name: String },
    Imported { count: usize },
    Started(StartReport),
    Result(Submission),
    Status(StatusReport),
    Games { groups: Vec<GroupGames> },
}

/// Outcome of submitting a match result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Submission {
    /// Score stored; the group still has matches to play.
    Recorded { group_id: GroupId, group_name: String },
    /// The group closed and one or two players advance.
    Promoted {
        group_id: GroupId,
        group_name: String,
        advances: Vec<Advance>,
    },
    /// The final group closed.
    Champion { group_name: String, player: String },
}

/// A group with its current members and the matches played so far.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupStatus {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<String>,
    pub results: Vec<GameMatch>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StartReport {
    pub seed_groups: Vec<GroupStatus>,
    pub promotion_groups: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub status: TournamentStatus,
    pub participants: usize,
    /// Names of registered participants, while registration is open.
    pub registered: Vec<String>,
    /// Possible group sizes, while registration is open.
    pub grouping: Vec<GroupingOption>,
    /// Open groups that have players, while the tournament runs.
    pub groups: Vec<GroupStatus>,
    pub champion: Option<String>,
}

/// Playable matches of an open group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupGames {
    pub id: GroupId,
    pub name: String,
    pub matches: Vec<GameMatch>,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    external_id: String,
    name: String,
}

/// Trimmed display name, or why it cannot be used.
pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.starts_with(RESERVED_MARKER) {
        return Err(ValidationError::ReservedName(RESERVED_MARKER));
    }
    Ok(name)
}

pub struct TournamentService<S: Store> {
    store: S,
    config: ServiceConfig,
    rng: StdRng,
}

impl<S: Store> TournamentService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { store, config, rng }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Roll back a transaction left open by an operation that did not finish.
    pub fn recover(&mut self) {
        warn!("Rolling back any unfinished transaction");
        self.store.rollback();
    }

    /// Handle one front-end command.
    pub fn dispatch(&mut self, request: Request) -> Result<Response, TournamentError> {
        debug!("Dispatching {:?}", request);
        match request {
            Request::Reset { name } => self.reset(&name).map(Response::Reset),
            Request::Register { external_id, name } => self
                .register(&external_id, &name)
                .map(|name| Response::Registered { name }),
            Request::Import { csv } => self
                .import_participants(&csv)
                .map(|count| Response::Imported { count }),
            Request::Start {
                group_size,
                best_of,
                finals_best_of,
            } => self
                .start(BracketConfig {
                    group_size,
                    best_of,
                    finals_best_of,
                })
                .map(Response::Started),
            Request::SubmitResult {
                player_1,
                score_1,
                player_2,
                score_2,
            } => self
                .submit_result(&player_1, score_1, &player_2, score_2)
                .map(Response::Result),
            Request::Status => self.status().map(Response::Status),
            Request::Games => self.games().map(|groups| Response::Games { groups }),
        }
    }

    /// Discard the current tournament and open registration for a new one.
    pub fn reset(&mut self, name: &str) -> Result<TournamentOptions, TournamentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let options = atomically(&mut self.store, |s| {
            s.reset_tournament(name)?;
            s.options()
        })?;
        info!("New tournament '{}' ({})", options.name, options.id);
        Ok(options)
    }

    /// Register (or rename) a participant while registration is open.
    pub fn register(&mut self, external_id: &str, name: &str) -> Result<String, TournamentError> {
        self.store.options()?.require(TournamentStatus::Open)?;
        let name = validate_name(name)?;
        atomically(&mut self.store, |s| s.register_participant(external_id, name))?;
        info!("Registered {} ({})", name, external_id);
        Ok(name.to_string())
    }

    /// Register every row of a CSV list; either all rows are registered or none.
    pub fn import_participants(&mut self, csv_data: &str) -> Result<usize, TournamentError> {
        self.store.options()?.require(TournamentStatus::Open)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for row in reader.deserialize::<ImportRow>() {
            let row = row.map_err(|e| ValidationError::Import(e.to_string()))?;
            validate_name(&row.name)?;
            if row.external_id.is_empty() {
                return Err(ValidationError::Import(format!("{} has no external id", row.name)).into());
            }
            if !seen.insert(row.external_id.clone()) {
                return Err(ValidationError::Import(format!(
                    "external id {} appears more than once",
                    row.external_id
                ))
                .into());
            }
            rows.push(row);
        }
        let count = atomically(&mut self.store, |s| {
            for row in &rows {
                s.register_participant(&row.external_id, &row.name)?;
            }
            Ok(rows.len())
        })?;
        info!("Imported {} participants", count);
        Ok(count)
    }

    /// Close registration, build the whole bracket and place every participant.
    pub fn start(&mut self, bracket: BracketConfig) -> Result<StartReport, TournamentError> {
        let mut options = self.store.options()?;
        options.require(TournamentStatus::Open)?;
        let names: Vec<String> = self
            .store
            .list_participants(None)
            .into_iter()
            .map(|p| p.name)
            .collect();
        let plan = plan_bracket(&names, &bracket, &mut self.rng)?;

        options.status = TournamentStatus::Started;
        options.group_size = bracket.group_size;
        options.best_of = bracket.best_of;
        options.finals_best_of = bracket.finals_best_of;
        options.started_at = Some(chrono::Utc::now());

        let ids = atomically(&mut self.store, |s| {
            let ids = plan.install(s)?;
            s.set_options(options)?;
            Ok(ids)
        })?;
        info!(
            "Tournament started with group size {}: {} seed groups, {} promotion groups",
            bracket.group_size,
            plan.seed_groups().count(),
            plan.promotion_groups().count()
        );

        let seed_groups = plan
            .groups
            .iter()
            .zip(ids)
            .filter(|(g, _)| g.kind == GroupKind::Seed)
            .map(|(g, id)| GroupStatus {
                id,
                name: g.name.clone(),
                members: g.members.clone(),
                results: Vec::new(),
            })
            .collect();
        Ok(StartReport {
            seed_groups,
            promotion_groups: plan.promotion_groups().count(),
        })
    }

    /// Store a match result and complete its group if this was the last open match.
    ///
    /// A `TournamentError::Draw` from here means the score was stored but the group's standings
    /// are tied; submitting a corrected result for one of its matches retries the completion.
    pub fn submit_result(
        &mut self,
        player_1: &str,
        score_1: u32,
        player_2: &str,
        score_2: u32,
    ) -> Result<Submission, TournamentError> {
        self.store.options()?.require(TournamentStatus::Started)?;
        let (player_1, player_2) = (player_1.trim(), player_2.trim());
        if player_1 == player_2 {
            return Err(ValidationError::SamePlayer.into());
        }

        let group_id = atomically(&mut self.store, |s| {
            s.record_score(player_1, player_2, score_1, score_2)
        })?;
        let group = self.store.group(group_id)?;
        info!(
            "Result in {}: {} vs {} {}-{}",
            group.name, player_1, player_2, score_1, score_2
        );

        let submission = match close_group(&mut self.store, group_id)? {
            None => Submission::Recorded {
                group_id,
                group_name: group.name,
            },
            Some(closure) => match closure.champion_closure() {
                Some(last) => Submission::Champion {
                    group_name: last.group_name.clone(),
                    player: last.champion.clone().unwrap_or_default(),
                },
                None => Submission::Promoted {
                    group_id,
                    group_name: group.name,
                    advances: closure.advances,
                },
            },
        };
        Ok(submission)
    }

    pub fn status(&self) -> Result<StatusReport, TournamentError> {
        let options = self.store.options()?;
        let participants = self.store.list_participants(None);
        let mut report = StatusReport {
            name: options.name,
            status: options.status,
            participants: participants.len(),
            registered: Vec::new(),
            grouping: Vec::new(),
            groups: Vec::new(),
            champion: options.champion,
        };
        match options.status {
            TournamentStatus::Open => {
                report.registered = participants.into_iter().map(|p| p.name).collect();
                report.grouping = grouping_preview(report.participants);
            }
            TournamentStatus::Started => {
                for group in self.store.groups().into_iter().filter(|g| !g.closed) {
                    let mut members: Vec<String> = self
                        .store
                        .list_participants(Some(group.id))
                        .into_iter()
                        .map(|p| p.name)
                        .collect();
                    if members.is_empty() {
                        continue;
                    }
                    members.sort();
                    let results = self
                        .store
                        .matches(group.id)
                        .into_iter()
                        .filter(|m| m.is_played())
                        .collect();
                    report.groups.push(GroupStatus {
                        id: group.id,
                        name: group.name,
                        members,
                        results,
                    });
                }
            }
            TournamentStatus::Finished => {}
        }
        Ok(report)
    }

    /// Matches of every open group whose players are both known.
    pub fn games(&self) -> Result<Vec<GroupGames>, TournamentError> {
        self.store.options()?.require(TournamentStatus::Started)?;
        Ok(self
            .store
            .groups()
            .into_iter()
            .filter(|g| !g.closed)
            .filter_map(|g| {
                let matches: Vec<GameMatch> = self
                    .store
                    .matches(g.id)
                    .into_iter()
                    .filter(|m| m.is_resolved())
                    .collect();
                (!matches.is_empty()).then_some(GroupGames {
                    id: g.id,
                    name: g.name,
                    matches,
                })
            })
            .collect())
    }
}
