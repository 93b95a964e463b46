use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TRIALS, DRAW_GOALS, DRAW_GOAL_WEIGHTS, EARLY_MATCHES_THRESHOLD, GOAL_DIFF_MULTIPLIERS,
    HOME_ADVANTAGE, INITIAL_RATING, K_FACTOR_BASE, K_FACTOR_EARLY, LOSER_GOALS,
    LOSER_GOAL_WEIGHTS, TOP_POSITIONS, WINNER_GOALS, WINNER_GOAL_WEIGHTS,
};
use crate::error::{LeagueError, Result};

/// Tuning for one league.
///
/// Every component takes its own copy at construction, so two leagues
/// with different settings can live in the same process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub initial_rating: f64,
    pub k_base: f64,
    pub k_early: f64,
    pub early_matches_threshold: u32,
    pub home_advantage: f64,
    /// Indexed by goal difference minus one; larger differences use the last entry
    pub goal_diff_multipliers: Vec<f64>,
    pub scorelines: ScorelineWeights,
    pub simulation: SimulationConfig,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            initial_rating: INITIAL_RATING,
            k_base: K_FACTOR_BASE,
            k_early: K_FACTOR_EARLY,
            early_matches_threshold: EARLY_MATCHES_THRESHOLD,
            home_advantage: HOME_ADVANTAGE,
            goal_diff_multipliers: GOAL_DIFF_MULTIPLIERS.to_vec(),
            scorelines: ScorelineWeights::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Goal tables used when sampling simulated scorelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorelineWeights {
    pub winner_goals: Vec<u32>,
    pub winner_weights: Vec<u32>,
    pub loser_goals: Vec<u32>,
    pub loser_weights: Vec<u32>,
    pub draw_goals: Vec<u32>,
    pub draw_weights: Vec<u32>,
}

impl Default for ScorelineWeights {
    fn default() -> Self {
        Self {
            winner_goals: WINNER_GOALS.to_vec(),
            winner_weights: WINNER_GOAL_WEIGHTS.to_vec(),
            loser_goals: LOSER_GOALS.to_vec(),
            loser_weights: LOSER_GOAL_WEIGHTS.to_vec(),
            draw_goals: DRAW_GOALS.to_vec(),
            draw_weights: DRAW_GOAL_WEIGHTS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trials run when the caller does not ask for a specific count
    pub trials: usize,
    /// Finishing positions counted by `top_probability`
    pub top_positions: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            top_positions: TOP_POSITIONS,
        }
    }
}

impl LeagueConfig {
    /// Parse a TOML document. Missing keys fall back to the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: LeagueConfig =
            toml::from_str(contents).map_err(|e| LeagueError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("initial_rating", self.initial_rating),
            ("k_base", self.k_base),
            ("k_early", self.k_early),
            ("home_advantage", self.home_advantage),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(LeagueError::InvalidConfig(format!("{} must be finite", name)));
            }
        }

        if self.k_base < 0.0 || self.k_early < 0.0 {
            return Err(LeagueError::InvalidConfig(
                "K-factors must not be negative".to_string(),
            ));
        }

        if self.goal_diff_multipliers.is_empty() {
            return Err(LeagueError::InvalidConfig(
                "goal_diff_multipliers must not be empty".to_string(),
            ));
        }
        if self
            .goal_diff_multipliers
            .iter()
            .any(|m| !m.is_finite() || *m <= 0.0)
        {
            return Err(LeagueError::InvalidConfig(
                "goal_diff_multipliers must be positive".to_string(),
            ));
        }

        if self.simulation.top_positions == 0 {
            return Err(LeagueError::InvalidConfig(
                "top_positions must be positive".to_string(),
            ));
        }

        self.scorelines.validate()
    }
}

impl ScorelineWeights {
    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("winner", &self.winner_goals, &self.winner_weights),
            ("loser", &self.loser_goals, &self.loser_weights),
            ("draw", &self.draw_goals, &self.draw_weights),
        ];
        for (name, goals, weights) in tables {
            if goals.is_empty() || goals.len() != weights.len() {
                return Err(LeagueError::InvalidWeights(format!(
                    "{} table has {} goal values and {} weights",
                    name,
                    goals.len(),
                    weights.len()
                )));
            }
            if weights.iter().all(|&w| w == 0) {
                return Err(LeagueError::InvalidWeights(format!(
                    "{} weights are all zero",
                    name
                )));
            }
        }

        if self.winner_goals.contains(&0) {
            return Err(LeagueError::InvalidWeights(
                "winner goals must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LeagueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_rating, 1500.0);
        assert_eq!(config.home_advantage, 60.0);
        assert_eq!(config.goal_diff_multipliers, vec![1.0, 1.3, 1.5, 1.65, 1.75]);
        assert_eq!(config.simulation.trials, 100_000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LeagueConfig::from_toml_str(
            r#"
            home_advantage = 80.0

            [simulation]
            trials = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.home_advantage, 80.0);
        assert_eq!(config.simulation.trials, 2000);
        assert_eq!(config.simulation.top_positions, 5);
        assert_eq!(config.k_early, 50.0);
        assert_eq!(config.scorelines, ScorelineWeights::default());
    }

    #[test]
    fn test_rejects_empty_multipliers() {
        let err = LeagueConfig::from_toml_str("goal_diff_multipliers = []").unwrap_err();
        assert!(matches!(err, LeagueError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_mismatched_weights() {
        let mut config = LeagueConfig::default();
        config.scorelines.draw_weights.pop();
        assert!(matches!(
            config.validate(),
            Err(LeagueError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = LeagueConfig::from_toml_str("initial_rating = \"high\"").unwrap_err();
        assert!(matches!(err, LeagueError::InvalidConfig(_)));
    }
}
