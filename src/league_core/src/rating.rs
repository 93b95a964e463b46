use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::LeagueConfig;
use crate::constants::ELO_SCALE;
use crate::error::{LeagueError, Result};
use crate::match_record::{Outcome, Venue};

/// Rating movement produced by a single match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub change_a: f64,
    pub change_b: f64,
    pub expected_a: f64,
    pub expected_b: f64,
    /// K-factor after goal-difference scaling
    pub k_adjusted: f64,
    pub k_base: f64,
    pub gd_multiplier: f64,
    /// Expectation fell back to 0.5 because a rating was not finite
    pub degraded: bool,
}

/// Elo update rule with home advantage, experience-based K-factor and
/// goal-difference scaling.
#[derive(Clone, Debug)]
pub struct RatingEngine {
    config: LeagueConfig,
}

impl RatingEngine {
    pub fn new(config: LeagueConfig) -> Self {
        RatingEngine { config }
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    /// Expected score for team A, or `InvalidRatingInput` if either
    /// rating is not a finite number.
    pub fn try_expected_score(rating_a: f64, rating_b: f64, home_advantage: f64) -> Result<f64> {
        let adjusted_a = rating_a + home_advantage;
        if !adjusted_a.is_finite() || !rating_b.is_finite() {
            return Err(LeagueError::InvalidRatingInput { rating_a, rating_b });
        }
        Ok(1.0 / (1.0 + 10f64.powf((rating_b - adjusted_a) / ELO_SCALE)))
    }

    /// Expected score for team A. Non-finite ratings degrade to 0.5.
    pub fn expected_score(rating_a: f64, rating_b: f64, home_advantage: f64) -> f64 {
        Self::try_expected_score(rating_a, rating_b, home_advantage).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to neutral expectation");
            0.5
        })
    }

    /// K-factor for a pairing, sliding from `k_early` to `k_base` while the
    /// average experience is below the threshold.
    pub fn k_factor(&self, matches_a: u32, matches_b: u32) -> f64 {
        let avg_matches = (matches_a as f64 + matches_b as f64) / 2.0;
        let threshold = self.config.early_matches_threshold as f64;

        if avg_matches < threshold {
            let progress = avg_matches / threshold;
            self.config.k_early - (self.config.k_early - self.config.k_base) * progress
        } else {
            self.config.k_base
        }
    }

    pub fn goal_diff_multiplier(&self, goal_diff: u32) -> f64 {
        let table = &self.config.goal_diff_multipliers;
        match goal_diff {
            0 => 1.0,
            d => table
                .get(d as usize - 1)
                .or_else(|| table.last())
                .copied()
                .unwrap_or(1.0),
        }
    }

    /// Rating changes for a match between teams with the given pre-match
    /// state. `change_b` is always the exact negation of `change_a`.
    ///
    /// # Arguments
    /// * `rating_a`, `rating_b` - Ratings before the match
    /// * `matches_a`, `matches_b` - Matches each side had played before this one
    /// * `goals_a`, `goals_b` - Final score
    /// * `venue` - Which side, if any, hosted the match
    ///
    /// # Returns
    /// The changes for both sides along with the expectation and K-factor
    /// that produced them
    #[allow(clippy::too_many_arguments)]
    pub fn rating_delta(
        &self,
        rating_a: f64,
        rating_b: f64,
        matches_a: u32,
        matches_b: u32,
        goals_a: u32,
        goals_b: u32,
        venue: Venue,
    ) -> RatingChange {
        let home_adv = venue.home_advantage(self.config.home_advantage);
        let outcome = Outcome::from_goals(goals_a, goals_b);
        let (score_a, _) = outcome.scores();

        let (expected_a, degraded) = match Self::try_expected_score(rating_a, rating_b, home_adv) {
            Ok(p) => (p, false),
            Err(e) => {
                warn!(error = %e, "falling back to neutral expectation");
                (0.5, true)
            }
        };
        let expected_b = 1.0 - expected_a;

        let k_base = self.k_factor(matches_a, matches_b);
        let gd_multiplier = match outcome {
            Outcome::Draw => 1.0,
            _ => self.goal_diff_multiplier(goals_a.abs_diff(goals_b)),
        };
        let k_adjusted = k_base * gd_multiplier;

        let change_a = k_adjusted * (score_a - expected_a);

        RatingChange {
            change_a,
            change_b: -change_a,
            expected_a,
            expected_b,
            k_adjusted,
            k_base,
            gd_multiplier,
            degraded,
        }
    }
}
