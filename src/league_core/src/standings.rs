use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::match_record::{MatchRecord, Outcome};

/// League table line for one team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub points: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub matches_played: u32,
}

impl StandingsRow {
    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }

    pub fn table_key<'a>(&self, team: &'a str) -> TableKey<'a> {
        TableKey {
            team,
            points: self.points,
            goals_for: self.goals_for,
            goals_against: self.goals_against,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32, points: u32) {
        self.matches_played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.points += points;
        match scored.cmp(&conceded) {
            Ordering::Greater => self.wins += 1,
            Ordering::Less => self.losses += 1,
            Ordering::Equal => self.draws += 1,
        }
    }
}

/// Sort key for a table position.
#[derive(Clone, Copy, Debug)]
pub struct TableKey<'a> {
    pub team: &'a str,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl TableKey<'_> {
    /// Points, then goal difference, then goals scored, all descending.
    /// Team name ascending settles anything left.
    pub fn cmp_position(&self, other: &TableKey<'_>) -> Ordering {
        let gd_self = self.goals_for as i64 - self.goals_against as i64;
        let gd_other = other.goals_for as i64 - other.goals_against as i64;

        other
            .points
            .cmp(&self.points)
            .then(gd_other.cmp(&gd_self))
            .then(other.goals_for.cmp(&self.goals_for))
            .then_with(|| self.team.cmp(other.team))
    }
}

/// Team name to table line, in name order.
pub type Standings = BTreeMap<String, StandingsRow>;

/// Fold a match sequence into a league table. Only teams that have played
/// appear.
pub fn calculate_standings(history: &[MatchRecord]) -> Standings {
    let mut standings = Standings::new();

    for record in history {
        let (points_a, points_b) = Outcome::from_goals(record.goals_a, record.goals_b).points();

        standings
            .entry(record.team_a.clone())
            .or_default()
            .record(record.goals_a, record.goals_b, points_a);
        standings
            .entry(record.team_b.clone())
            .or_default()
            .record(record.goals_b, record.goals_a, points_b);
    }

    standings
}

/// Table rows sorted into finishing order.
pub fn rank_standings(standings: &Standings) -> Vec<(String, StandingsRow)> {
    let mut rows: Vec<(String, StandingsRow)> = standings
        .iter()
        .map(|(team, row)| (team.clone(), *row))
        .collect();

    rows.sort_by(|(name_a, a), (name_b, b)| {
        a.table_key(name_a).cmp_position(&b.table_key(name_b))
    });
    rows
}
