//! Match (game) and the player Slot it is played between.

use crate::models::group::GroupId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a match, sequential per tournament.
pub type MatchId = u32;

/// One side of a match: a known participant or a placeholder for a group's finisher.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Slot {
    /// Display name of a registered participant.
    Resolved(String),
    /// Winner of the given group, not yet decided.
    WinnerOf(GroupId),
    /// Second place of the given group, not yet decided.
    SecondOf(GroupId),
}

impl Slot {
    pub fn resolved(name: impl Into<String>) -> Self {
        Slot::Resolved(name.into())
    }

    /// Participant name if this slot is resolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            Slot::Resolved(name) => Some(name),
            Slot::WinnerOf(_) | Slot::SecondOf(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Resolved(_))
    }

    /// Rewrite the group a placeholder points at. Resolved slots are returned unchanged.
    pub fn map_group(&self, f: impl Fn(GroupId) -> GroupId) -> Self {
        match self {
            Slot::Resolved(name) => Slot::Resolved(name.clone()),
            Slot::WinnerOf(g) => Slot::WinnerOf(f(*g)),
            Slot::SecondOf(g) => Slot::SecondOf(f(*g)),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Resolved(name) => write!(f, "{name}"),
            Slot::WinnerOf(g) => write!(f, "winner of group #{g}"),
            Slot::SecondOf(g) => write!(f, "second of group #{g}"),
        }
    }
}

/// A single match inside a group. Scores of 0/0 mean the match is not played yet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub group_id: GroupId,
    pub best_of: u32,
    pub slot_1: Slot,
    pub slot_2: Slot,
    pub score_1: u32,
    pub score_2: u32,
}

impl GameMatch {
    pub fn new(id: MatchId, group_id: GroupId, best_of: u32, slot_1: Slot, slot_2: Slot) -> Self {
        Self {
            id,
            group_id,
            best_of,
            slot_1,
            slot_2,
            score_1: 0,
            score_2: 0,
        }
    }

    /// True once a score has been recorded (any side above zero).
    pub fn is_played(&self) -> bool {
        self.score_1 > 0 || self.score_2 > 0
    }

    /// True when both slots name participants.
    pub fn is_resolved(&self) -> bool {
        self.slot_1.is_resolved() && self.slot_2.is_resolved()
    }

    /// Whether this match is between the two names, in either order.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        match (self.slot_1.name(), self.slot_2.name()) {
            (Some(x), Some(y)) => (x == a && y == b) || (x == b && y == a),
            _ => false,
        }
    }

    /// Store a result given from `first`'s point of view, swapping if the match is listed reversed.
    pub fn set_score_for(&mut self, first: &str, score_first: u32, score_other: u32) {
        if self.slot_1.name() == Some(first) {
            self.score_1 = score_first;
            self.score_2 = score_other;
        } else {
            self.score_1 = score_other;
            self.score_2 = score_first;
        }
    }
}
