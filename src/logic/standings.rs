//! Group standings: wins first, score differential second.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{GameMatch, Place, TournamentError};

/// Accumulated results of one participant within a group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StandingRecord {
    pub player: String,
    pub wins: u32,
    /// Total points scored. Recorded for display, never used to break ties.
    pub points: u32,
    /// Points scored minus points conceded.
    pub differential: i64,
}

impl StandingRecord {
    fn rank_key(&self) -> (u32, i64) {
        (self.wins, self.differential)
    }
}

/// Ranked table of a group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Standings {
    rows: Vec<StandingRecord>,
}

/// Decided places of a group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Placing {
    pub first: String,
    /// Only decided for groups of three or more.
    pub second: Option<String>,
}

impl Standings {
    /// Accumulate every match whose two slots are resolved. Unplayed matches count as 0:0,
    /// so their players appear with no wins.
    pub fn from_matches(matches: &[GameMatch]) -> Self {
        let mut records: BTreeMap<&str, StandingRecord> = BTreeMap::new();
        for m in matches {
            let (Some(p1), Some(p2)) = (m.slot_1.name(), m.slot_2.name()) else {
                continue;
            };
            let (s1, s2) = (m.score_1, m.score_2);
            for (player, own, other) in [(p1, s1, s2), (p2, s2, s1)] {
                let record = records.entry(player).or_insert_with(|| StandingRecord {
                    player: player.to_string(),
                    ..StandingRecord::default()
                });
                if own > other {
                    record.wins += 1;
                }
                record.points += own;
                record.differential += i64::from(own) - i64::from(other);
            }
        }

        let mut rows: Vec<StandingRecord> = records.into_values().collect();
        // stable sort over name-ordered rows: equal keys stay alphabetical
        rows.sort_by(|a, b| b.rank_key().cmp(&a.rank_key()));
        Self { rows }
    }

    /// All rows, best first.
    pub fn rows(&self) -> &[StandingRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<StandingRecord> {
        self.rows
    }

    /// Top row, unless it is tied with the next one.
    pub fn first(&self) -> Result<&StandingRecord, TournamentError> {
        let top = self
            .rows
            .first()
            .ok_or_else(|| TournamentError::Consistency("group has no players".to_string()))?;
        match self.rows.get(1) {
            Some(next) if next.rank_key() == top.rank_key() => Err(TournamentError::Draw(Place::First)),
            _ => Ok(top),
        }
    }

    /// Best row after first place; `None` for groups of fewer than three.
    pub fn second(&self) -> Result<Option<&StandingRecord>, TournamentError> {
        if self.rows.len() < 3 {
            return Ok(None);
        }
        let (runner_up, next) = (&self.rows[1], &self.rows[2]);
        if runner_up.rank_key() == next.rank_key() {
            return Err(TournamentError::Draw(Place::Second));
        }
        Ok(Some(runner_up))
    }

    /// First and (where applicable) second place, or the draw that prevents it.
    pub fn decide(&self) -> Result<Placing, TournamentError> {
        let first = self.first()?.player.clone();
        let second = self.second()?.map(|r| r.player.clone());
        Ok(Placing { first, second })
    }
}
