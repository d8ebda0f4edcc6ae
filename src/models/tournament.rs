//! Tournament options, status, and the error type shared by all operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::group::GroupId;

/// Unique identifier for a tournament (fresh on every reset).
pub type TournamentId = Uuid;

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Registration open; no groups yet.
    #[default]
    Open,
    /// Bracket built, results being recorded.
    Started,
    /// Champion declared.
    Finished,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Open => write!(f, "registration open"),
            TournamentStatus::Started => write!(f, "started"),
            TournamentStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Tournament-wide settings and state (the "options" of the store).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentOptions {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    /// Declared group size, set at start.
    pub group_size: u32,
    /// Best-of for seed group matches.
    pub best_of: u32,
    /// Best-of for promotion group matches.
    pub finals_best_of: u32,
    /// Set only once the tournament is finished.
    pub champion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TournamentOptions {
    /// A freshly reset tournament: open for registration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: TournamentStatus::Open,
            group_size: 0,
            best_of: 0,
            finals_best_of: 0,
            champion: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Fails with `TournamentError::State` unless the tournament is in `expected`.
    pub fn require(&self, expected: TournamentStatus) -> Result<(), TournamentError> {
        if self.status != expected {
            return Err(TournamentError::State {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }
}

/// Which standing could not be decided.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    First,
    Second,
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::First => write!(f, "first"),
            Place::Second => write!(f, "second"),
        }
    }
}

/// Malformed input.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("a player cannot play against themselves")]
    SamePlayer,
    #[error("scores must add up to {best_of} (best of {best_of}), got {total}")]
    ScoreTotal { best_of: u32, total: u32 },
    #[error("a score of {score} is not possible in a best of {best_of}")]
    ScoreAboveBestOf { best_of: u32, score: u32 },
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must not start with '{0}'")]
    ReservedName(char),
    #[error("the name {0} is already taken")]
    DuplicateName(String),
    #[error("group size must be between 2 and 6, got {0}")]
    GroupSize(u32),
    #[error("best of must be an odd number of at least 1, got {0}")]
    BestOf(u32),
    #[error("need at least {required} participants, {registered} registered")]
    NotEnoughParticipants { required: usize, registered: usize },
    #[error("invalid participant list: {0}")]
    Import(String),
}

/// Something that was looked up does not exist.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum NotFound {
    #[error("no open match between {0} and {1}")]
    Match(String, String),
    #[error("no group #{0}")]
    Group(GroupId),
    #[error("no participant named {0}")]
    Participant(String),
    #[error("no tournament has been created")]
    Tournament,
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The tournament is not in a status that allows this action.
    #[error("the tournament is {actual}, this needs it to be {expected}")]
    State {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },
    /// Standings are tied; the result is stored but the group cannot close yet.
    #[error("the group cannot be completed: {0} place is a perfect draw, update one result to break the tie")]
    Draw(Place),
    /// The bracket does not have the structure it was built with.
    #[error("bracket inconsistency: {0}")]
    Consistency(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl TournamentError {
    /// Internal defects, as opposed to mistakes a user can correct.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TournamentError::Consistency(_) | TournamentError::Storage(_)
        )
    }
}
