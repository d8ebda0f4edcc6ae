//! Tournament business logic: bracket construction, standings, group completion.

mod bracket;
mod completion;
mod standings;

pub use bracket::{
    grouping_preview, plan_bracket, seed_group_count, BracketConfig, BracketPlan, GroupPlan,
    GroupingOption, MAX_GROUP_SIZE, MIN_GROUP_SIZE,
};
pub use completion::{close_group, is_ready, Advance, GroupClosure};
pub use standings::{Placing, StandingRecord, Standings};
