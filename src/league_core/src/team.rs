use serde::{Deserialize, Serialize};

use crate::recalc::{MatchCounts, Ratings};

/// Whether a team's rating has settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingStatus {
    /// Fewer matches than the early-matches threshold; the K-factor is
    /// still elevated
    Provisional,
    Established,
}

impl RatingStatus {
    pub fn for_matches(matches: u32, early_matches_threshold: u32) -> Self {
        if matches < early_matches_threshold {
            RatingStatus::Provisional
        } else {
            RatingStatus::Established
        }
    }
}

/// One line of the Elo rankings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamRanking {
    pub rank: usize,
    pub name: String,
    pub rating: f64,
    pub matches: u32,
    pub status: RatingStatus,
}

/// Teams ordered by rating, highest first. Equal ratings fall back to
/// name order.
pub fn rank_teams(
    ratings: &Ratings,
    match_counts: &MatchCounts,
    early_matches_threshold: u32,
) -> Vec<TeamRanking> {
    let mut teams: Vec<(&String, f64)> = ratings.iter().map(|(name, &r)| (name, r)).collect();
    teams.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    teams
        .into_iter()
        .enumerate()
        .map(|(i, (name, rating))| {
            let matches = match_counts.get(name).copied().unwrap_or(0);
            TeamRanking {
                rank: i + 1,
                name: name.clone(),
                rating,
                matches,
                status: RatingStatus::for_matches(matches, early_matches_threshold),
            }
        })
        .collect()
}
