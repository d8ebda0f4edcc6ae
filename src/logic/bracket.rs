//! Bracket construction: seed groups from participants, then every promotion group up front.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{
    group_letter, GroupId, GroupKind, Placement, Slot, TournamentError, ValidationError,
};
use crate::store::Store;

/// Smallest and largest declared group size.
pub const MIN_GROUP_SIZE: u32 = 2;
pub const MAX_GROUP_SIZE: u32 = 6;

/// Settings chosen when the tournament is started.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketConfig {
    /// Declared group size (actual seed groups may be larger).
    pub group_size: u32,
    /// Best-of for matches in seed groups.
    pub best_of: u32,
    /// Best-of for matches in promotion groups.
    pub finals_best_of: u32,
}

impl BracketConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&self.group_size) {
            return Err(ValidationError::GroupSize(self.group_size));
        }
        for best_of in [self.best_of, self.finals_best_of] {
            if best_of == 0 || best_of % 2 == 0 {
                return Err(ValidationError::BestOf(best_of));
            }
        }
        Ok(())
    }

    /// Whether winner and second of a group with `members` players both advance.
    pub fn promotes_second(&self, members: usize) -> bool {
        self.group_size > 3 && members > 2
    }
}

/// Number of seed groups: floor(participants / group_size), reduced to a power of two.
pub fn seed_group_count(participants: usize, group_size: usize) -> usize {
    let raw = participants / group_size.max(1);
    if raw == 0 {
        0
    } else {
        1 << raw.ilog2()
    }
}

/// One row of the grouping preview shown while registration is open.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct GroupingOption {
    pub group_size: u32,
    pub groups: usize,
    /// Participants dealt into groups beyond the declared size.
    pub extra: usize,
}

/// Group sizes that split `participants` into more than one group with at most one extra
/// player per group.
pub fn grouping_preview(participants: usize) -> Vec<GroupingOption> {
    (MIN_GROUP_SIZE..=MAX_GROUP_SIZE)
        .filter_map(|size| {
            let groups = seed_group_count(participants, size as usize);
            let extra = participants - groups * size as usize;
            (groups > 1 && extra < groups).then_some(GroupingOption {
                group_size: size,
                groups,
                extra,
            })
        })
        .collect()
}

/// A group as it will be created; placeholder slots refer to positions in `BracketPlan::groups`
/// (position 0 is group 1).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupPlan {
    pub name: String,
    pub kind: GroupKind,
    pub best_of: u32,
    /// Participants seeded into this group (empty for promotion groups).
    pub members: Vec<String>,
    pub matches: Vec<(Slot, Slot)>,
}

/// Every group and match of a tournament, before it is written to a store.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BracketPlan {
    pub groups: Vec<GroupPlan>,
}

impl BracketPlan {
    pub fn seed_groups(&self) -> impl Iterator<Item = &GroupPlan> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Seed)
    }

    pub fn promotion_groups(&self) -> impl Iterator<Item = &GroupPlan> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Promotion)
    }

    /// Create all groups and matches and place every seeded participant in their group.
    /// Returns the store ids in plan order.
    pub fn install<S: Store + ?Sized>(&self, store: &mut S) -> Result<Vec<GroupId>, TournamentError> {
        let ids: Vec<GroupId> = self
            .groups
            .iter()
            .map(|g| store.create_group(&g.name, g.kind))
            .collect();
        let to_store_id = |plan_id: GroupId| ids[plan_id as usize - 1];

        for (group, &id) in self.groups.iter().zip(&ids) {
            for (slot_1, slot_2) in &group.matches {
                store.create_match(
                    id,
                    group.best_of,
                    slot_1.map_group(to_store_id),
                    slot_2.map_group(to_store_id),
                )?;
            }
            for member in &group.members {
                store.reassign_participant_group(member, Placement::Group(id))?;
            }
        }
        Ok(ids)
    }
}

fn plan_id(position: usize) -> GroupId {
    position as GroupId + 1
}

/// Build the whole bracket for `participants`.
///
/// 1. Seed group count is floor(n / group_size) reduced to a power of two.
/// 2. Shuffle, then deal round-robin into the seed groups.
/// 3. Each seed group plays every pairing once.
/// 4. Adjacent groups are paired round by round until one group is left. When the declared
///    size is above 3 and the left group has more than 2 players, winner and second both
///    advance (crossed into two groups); otherwise only the winners meet.
pub fn plan_bracket<R: Rng + ?Sized>(
    participants: &[String],
    config: &BracketConfig,
    rng: &mut R,
) -> Result<BracketPlan, TournamentError> {
    config.validate()?;
    let count = seed_group_count(participants.len(), config.group_size as usize);
    if count == 0 {
        return Err(ValidationError::NotEnoughParticipants {
            required: config.group_size as usize,
            registered: participants.len(),
        }
        .into());
    }

    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); count];
    for (i, name) in shuffled.into_iter().enumerate() {
        buckets[i % count].push(name);
    }

    let mut plan = BracketPlan::default();
    for (i, members) in buckets.into_iter().enumerate() {
        let matches = members
            .iter()
            .enumerate()
            .flat_map(|(j, a)| {
                members[j + 1..]
                    .iter()
                    .map(move |b| (Slot::resolved(a.as_str()), Slot::resolved(b.as_str())))
            })
            .collect();
        debug!("Seed group {} with {} players", group_letter(i), members.len());
        plan.groups.push(GroupPlan {
            name: format!("Group {}", group_letter(i)),
            kind: GroupKind::Seed,
            best_of: config.best_of,
            members,
            matches,
        });
    }

    // (position, number of players) of each group in the current round
    let mut round: Vec<(usize, usize)> = plan
        .groups
        .iter()
        .enumerate()
        .map(|(i, g)| (i, g.members.len()))
        .collect();

    while round.len() > 1 {
        let mut next = Vec::with_capacity(round.len());
        for pair in round.chunks_exact(2) {
            let ((left, left_size), (right, _)) = (pair[0], pair[1]);
            let (l, r) = (plan_id(left), plan_id(right));
            let (ll, rl) = (group_letter(left), group_letter(right));

            let promotions = if config.promotes_second(left_size) {
                vec![
                    (format!("winner {ll}, second {rl}"), Slot::WinnerOf(l), Slot::SecondOf(r)),
                    (format!("second {ll}, winner {rl}"), Slot::SecondOf(l), Slot::WinnerOf(r)),
                ]
            } else {
                vec![(format!("winners {ll}/{rl}"), Slot::WinnerOf(l), Slot::WinnerOf(r))]
            };

            for (label, slot_1, slot_2) in promotions {
                let position = plan.groups.len();
                plan.groups.push(GroupPlan {
                    name: format!("Group {}: {}", group_letter(position), label),
                    kind: GroupKind::Promotion,
                    best_of: config.finals_best_of,
                    members: Vec::new(),
                    matches: vec![(slot_1, slot_2)],
                });
                next.push((position, 2));
            }
        }
        round = next;
    }

    info!(
        "Planned bracket for {} participants: {} seed groups, {} promotion groups",
        participants.len(),
        count,
        plan.groups.len() - count
    );
    Ok(plan)
}
