//! Group bracket tournaments: round-robin seed groups whose top finishers are promoted
//! through a bracket of pre-built promotion groups until one champion remains.

pub mod config;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use config::{Config, ServiceConfig};
pub use logic::{
    close_group, grouping_preview, is_ready, plan_bracket, seed_group_count, Advance,
    BracketConfig, BracketPlan, GroupClosure, GroupPlan, GroupingOption, Placing, StandingRecord,
    Standings,
};
pub use models::{
    group_letter, GameMatch, Group, GroupId, GroupKind, MatchId, NotFound, Participant, Place,
    Placement, Slot, TournamentError, TournamentId, TournamentOptions, TournamentStatus,
    ValidationError,
};
pub use service::{
    GroupGames, GroupStatus, Request, Response, StartReport, StatusReport, Submission,
    TournamentService,
};
pub use store::{atomically, JsonFileStore, MemoryStore, Store, StoreState};
