//! Participant and where they currently stand in the bracket.

use crate::models::group::GroupId;
use serde::{Deserialize, Serialize};

/// Marker reserved for internal references; display names may not start with it.
pub const RESERVED_MARKER: char = '!';

/// Current-group reference of a participant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "group")]
pub enum Placement {
    /// Registered, tournament not started yet.
    #[default]
    Unassigned,
    /// Playing (or eliminated) in this group.
    Group(GroupId),
    /// Won the final group.
    Champion,
}

impl Placement {
    pub fn group(&self) -> Option<GroupId> {
        match self {
            Placement::Group(id) => Some(*id),
            Placement::Unassigned | Placement::Champion => None,
        }
    }
}

/// A registered participant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Identity in the front end that registered them (chat user id, account id, ...).
    pub external_id: String,
    /// Unique display name, used in match slots.
    pub name: String,
    pub placement: Placement,
}

impl Participant {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            placement: Placement::Unassigned,
        }
    }
}
