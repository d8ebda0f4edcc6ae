//! Group: a round-robin pool of matches, seeded from participants or filled by promotion.

use serde::{Deserialize, Serialize};

/// Identifier for a group, sequential per tournament starting at 1.
pub type GroupId = u32;

/// How a group gets its players.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Built from registered participants at start.
    Seed,
    /// Built ahead of time to receive winners/seconds of earlier groups.
    Promotion,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub kind: GroupKind,
    /// Set once, when the group's standings have been applied.
    pub closed: bool,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            closed: false,
        }
    }
}

/// Spreadsheet-style letter for the zero-based group position: A..Z, AA, AB, ...
pub fn group_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}
