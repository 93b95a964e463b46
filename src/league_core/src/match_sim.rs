use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::ScorelineWeights;
use crate::error::{LeagueError, Result};
use crate::match_record::Outcome;
use crate::win_prob::OutcomeProbabilities;

/// Categorical distribution over a fixed support.
///
/// Weights are turned into a cumulative table once, so repeated draws
/// cost a binary search.
#[derive(Clone, Debug)]
pub struct WeightedChoice<T> {
    support: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> WeightedChoice<T> {
    pub fn new(support: &[T], weights: &[u32]) -> Result<Self> {
        if support.len() != weights.len() {
            return Err(LeagueError::InvalidWeights(format!(
                "{} values but {} weights",
                support.len(),
                weights.len()
            )));
        }
        let index =
            WeightedIndex::new(weights).map_err(|e| LeagueError::InvalidWeights(e.to_string()))?;

        Ok(WeightedChoice {
            support: support.to_vec(),
            index,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.support[self.index.sample(rng)]
    }
}

/// One-off weighted draw from `support`.
pub fn weighted_choice<T: Copy, R: Rng + ?Sized>(
    support: &[T],
    weights: &[u32],
    rng: &mut R,
) -> Result<T> {
    Ok(WeightedChoice::new(support, weights)?.sample(rng))
}

/// Final score of a simulated match along with the league points earned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedScore {
    pub goals_a: u32,
    pub goals_b: u32,
    pub points_a: u32,
    pub points_b: u32,
}

/// Turns outcome probabilities into concrete scorelines.
#[derive(Clone, Debug)]
pub struct ScorelineSampler {
    winner_goals: WeightedChoice<u32>,
    loser_goals: WeightedChoice<u32>,
    draw_goals: WeightedChoice<u32>,
}

impl ScorelineSampler {
    pub fn new(weights: &ScorelineWeights) -> Result<Self> {
        weights.validate()?;
        Ok(ScorelineSampler {
            winner_goals: WeightedChoice::new(&weights.winner_goals, &weights.winner_weights)?,
            loser_goals: WeightedChoice::new(&weights.loser_goals, &weights.loser_weights)?,
            draw_goals: WeightedChoice::new(&weights.draw_goals, &weights.draw_weights)?,
        })
    }

    /// Pick the result category from a single uniform draw in [0, 1).
    pub fn outcome_for(probs: &OutcomeProbabilities, u: f64) -> Outcome {
        if u < probs.win_a {
            Outcome::WinA
        } else if u < probs.win_a + probs.draw {
            Outcome::Draw
        } else {
            Outcome::WinB
        }
    }

    /// Goals (winner, loser) for a decisive result.
    fn decisive_goals<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, u32) {
        let winner = self.winner_goals.sample(rng);
        let loser = self.loser_goals.sample(rng);
        if winner <= loser {
            (loser + 1, loser)
        } else {
            (winner, loser)
        }
    }

    pub fn sample_score<R: Rng + ?Sized>(&self, outcome: Outcome, rng: &mut R) -> SimulatedScore {
        let (goals_a, goals_b) = match outcome {
            Outcome::WinA => self.decisive_goals(rng),
            Outcome::WinB => {
                let (winner, loser) = self.decisive_goals(rng);
                (loser, winner)
            }
            Outcome::Draw => {
                let goals = self.draw_goals.sample(rng);
                (goals, goals)
            }
        };
        let (points_a, points_b) = outcome.points();

        SimulatedScore {
            goals_a,
            goals_b,
            points_a,
            points_b,
        }
    }

    /// Simulate one match: draw the result category, then a scoreline for it.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        probs: &OutcomeProbabilities,
        rng: &mut R,
    ) -> SimulatedScore {
        let outcome = Self::outcome_for(probs, rng.gen::<f64>());
        self.sample_score(outcome, rng)
    }
}
