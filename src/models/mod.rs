//! Data structures for the tournament: participants, groups, matches, options.

mod game;
mod group;
mod participant;
mod tournament;

pub use game::{GameMatch, MatchId, Slot};
pub use group::{group_letter, Group, GroupId, GroupKind};
pub use participant::{Participant, Placement, RESERVED_MARKER};
pub use tournament::{
    NotFound, Place, TournamentError, TournamentId, TournamentOptions, TournamentStatus,
    ValidationError,
};
