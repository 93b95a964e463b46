//! League Core - Elo ratings and Monte Carlo season projection for
//! round-robin leagues.
//!
//! The host program owns persistence and user interaction; this library
//! works purely on in-memory ratings, match counts and match history.
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod config;
pub mod constants;
pub mod error;
pub mod league;
pub mod match_record;
pub mod match_sim;
pub mod rating;
pub mod recalc;
pub mod season;
pub mod standings;
pub mod team;
pub mod win_prob;

#[cfg(feature = "python")]
mod python;

pub use config::{LeagueConfig, ScorelineWeights, SimulationConfig};
pub use constants::{EARLY_MATCHES_THRESHOLD, HOME_ADVANTAGE, INITIAL_RATING};
pub use error::{LeagueError, Result};
pub use league::{League, MatchPrediction, MatchReport, SeasonProgress};
pub use match_record::{MatchRecord, Outcome, Venue};
pub use match_sim::{weighted_choice, ScorelineSampler, SimulatedScore, WeightedChoice};
pub use rating::{RatingChange, RatingEngine};
pub use recalc::{apply_match, recalculate_all_ratings, MatchCounts, Ratings};
pub use season::{
    generate_remaining_fixtures, CancelToken, Fixture, SeasonProjection, SeasonSimulator,
    SimulationOptions, SimulationResult, TeamProjection,
};
pub use standings::{calculate_standings, rank_standings, Standings, StandingsRow};
pub use team::{rank_teams, RatingStatus, TeamRanking};
pub use win_prob::{calculate_outcome_probs, draw_probability, OutcomeProbabilities};
