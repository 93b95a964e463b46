use serde::{Deserialize, Serialize};

use crate::match_record::Venue;
use crate::rating::RatingEngine;

/// Floor for the draw probability in lopsided matchups
pub const MIN_DRAW_PROB: f64 = 0.08;

/// Win/draw/loss probabilities for a matchup, from team A's side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub win_a: f64,
    pub draw: f64,
    pub win_b: f64,
}

impl OutcomeProbabilities {
    pub fn total(&self) -> f64 {
        self.win_a + self.draw + self.win_b
    }
}

/// Draw probability for a home-adjusted rating gap.
///
/// Piecewise linear in the absolute gap: 27% for an even matchup, falling
/// through 25% at 100 points, 20% at 200 and 15% at 300, then flattening
/// out at `MIN_DRAW_PROB`.
pub fn draw_probability(rating_gap: f64) -> f64 {
    let d = rating_gap.abs();

    if d <= 100.0 {
        0.27 - (d / 100.0) * 0.02
    } else if d <= 200.0 {
        0.25 - ((d - 100.0) / 100.0) * 0.05
    } else if d <= 300.0 {
        0.20 - ((d - 200.0) / 100.0) * 0.05
    } else {
        // NaN gaps land here as well; max() picks the floor
        (0.15 - ((d - 300.0) / 200.0) * 0.05).max(MIN_DRAW_PROB)
    }
}

/// Three-outcome probabilities for team A against team B.
///
/// The two-outcome Elo expectation is rescaled onto whatever mass the
/// draw leaves over.
///
/// # Arguments
/// * `rating_a` - Team A's current rating
/// * `rating_b` - Team B's current rating
/// * `venue` - Which side, if any, is at home
/// * `home_advantage` - Rating points credited to the home side
///
/// # Returns
/// Win, draw and loss probabilities from team A's side, summing to 1
pub fn calculate_outcome_probs(
    rating_a: f64,
    rating_b: f64,
    venue: Venue,
    home_advantage: f64,
) -> OutcomeProbabilities {
    let home_adv = venue.home_advantage(home_advantage);
    let rating_gap = (rating_a + home_adv) - rating_b;

    let draw = draw_probability(rating_gap);
    let expected_a = RatingEngine::expected_score(rating_a, rating_b, home_adv);
    let expected_b = 1.0 - expected_a;

    let remaining = 1.0 - draw;
    OutcomeProbabilities {
        win_a: expected_a * remaining,
        draw,
        win_b: expected_b * remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_matchup() {
        let probs = calculate_outcome_probs(1500.0, 1500.0, Venue::Neutral, 60.0);
        assert!((probs.draw - 0.27).abs() < 1e-12);
        assert!((probs.win_a - probs.win_b).abs() < 1e-12);
        assert!((probs.win_a - 0.365).abs() < 1e-12);
    }

    #[test]
    fn test_draw_curve_breakpoints() {
        assert!((draw_probability(0.0) - 0.27).abs() < 1e-12);
        assert!((draw_probability(100.0) - 0.25).abs() < 1e-12);
        assert!((draw_probability(-150.0) - 0.225).abs() < 1e-12);
        assert!((draw_probability(200.0) - 0.20).abs() < 1e-12);
        assert!((draw_probability(300.0) - 0.15).abs() < 1e-12);
        assert!((draw_probability(500.0) - 0.10).abs() < 1e-12);
        assert_eq!(draw_probability(5000.0), MIN_DRAW_PROB);
    }

    #[test]
    fn test_home_side_favoured() {
        let home = calculate_outcome_probs(1500.0, 1500.0, Venue::HomeA, 60.0);
        let away = calculate_outcome_probs(1500.0, 1500.0, Venue::HomeB, 60.0);
        assert!(home.win_a > home.win_b);
        assert!(away.win_b > away.win_a);
        assert!((home.win_a - away.win_b).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_rating_stays_normalised() {
        let probs = calculate_outcome_probs(f64::NAN, 1500.0, Venue::Neutral, 60.0);
        assert!((probs.total() - 1.0).abs() < 1e-9);
        assert_eq!(probs.draw, MIN_DRAW_PROB);
    }

    proptest! {
        #[test]
        fn prop_probabilities_sum_to_one(
            rating_a in -5000.0f64..5000.0,
            rating_b in -5000.0f64..5000.0,
            venue_idx in 0usize..3,
        ) {
            let venue = [Venue::HomeA, Venue::HomeB, Venue::Neutral][venue_idx];
            let probs = calculate_outcome_probs(rating_a, rating_b, venue, 60.0);
            prop_assert!((probs.total() - 1.0).abs() < 1e-9);
            prop_assert!(probs.draw >= MIN_DRAW_PROB);
            prop_assert!(probs.win_a >= 0.0 && probs.win_b >= 0.0);
        }
    }
}
