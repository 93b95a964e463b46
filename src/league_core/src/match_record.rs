use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{POINTS_DRAW, POINTS_LOSS, POINTS_WIN};

/// Where a match was played, from team A's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// Team A at home
    HomeA,
    /// Team B at home
    HomeB,
    Neutral,
}

impl Venue {
    /// Build from the host's optional home flag: `Some(true)` means team A
    /// hosted, `Some(false)` team B, `None` a neutral ground.
    pub fn from_home_flag(is_home_a: Option<bool>) -> Self {
        match is_home_a {
            Some(true) => Venue::HomeA,
            Some(false) => Venue::HomeB,
            None => Venue::Neutral,
        }
    }

    pub fn home_flag(self) -> Option<bool> {
        match self {
            Venue::HomeA => Some(true),
            Venue::HomeB => Some(false),
            Venue::Neutral => None,
        }
    }

    /// Signed rating bonus applied to team A.
    pub fn home_advantage(self, advantage: f64) -> f64 {
        match self {
            Venue::HomeA => advantage,
            Venue::HomeB => -advantage,
            Venue::Neutral => 0.0,
        }
    }
}

/// Result of a match from team A's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    WinA,
    Draw,
    WinB,
}

impl Outcome {
    pub fn from_goals(goals_a: u32, goals_b: u32) -> Self {
        if goals_a > goals_b {
            Outcome::WinA
        } else if goals_b > goals_a {
            Outcome::WinB
        } else {
            Outcome::Draw
        }
    }

    /// Elo actual scores (team A, team B)
    pub fn scores(self) -> (f64, f64) {
        match self {
            Outcome::WinA => (1.0, 0.0),
            Outcome::Draw => (0.5, 0.5),
            Outcome::WinB => (0.0, 1.0),
        }
    }

    /// League points (team A, team B)
    pub fn points(self) -> (u32, u32) {
        match self {
            Outcome::WinA => (POINTS_WIN, POINTS_LOSS),
            Outcome::Draw => (POINTS_DRAW, POINTS_DRAW),
            Outcome::WinB => (POINTS_LOSS, POINTS_WIN),
        }
    }
}

/// One played match.
///
/// Team names, goals and venue are the facts. The rating snapshot fields
/// are derived and get rewritten every time the history is replayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u32,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub team_a: String,
    pub team_b: String,
    pub goals_a: u32,
    pub goals_b: u32,
    pub venue: Venue,

    pub rating_a_before: f64,
    pub rating_b_before: f64,
    pub rating_a_after: f64,
    pub rating_b_after: f64,
    pub change_a: f64,
    pub change_b: f64,
}

impl MatchRecord {
    /// Create a record with an empty rating snapshot.
    pub fn new(
        match_id: u32,
        timestamp: NaiveDateTime,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
        goals_a: u32,
        goals_b: u32,
        venue: Venue,
    ) -> Self {
        MatchRecord {
            match_id,
            timestamp,
            team_a: team_a.into(),
            team_b: team_b.into(),
            goals_a,
            goals_b,
            venue,
            rating_a_before: 0.0,
            rating_b_before: 0.0,
            rating_a_after: 0.0,
            rating_b_after: 0.0,
            change_a: 0.0,
            change_b: 0.0,
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.goals_a, self.goals_b)
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team_a == team || self.team_b == team
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
