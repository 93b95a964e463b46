use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LeagueConfig;
use crate::error::{LeagueError, Result};
use crate::match_record::{MatchRecord, Venue};
use crate::rating::RatingEngine;
use crate::recalc::{apply_match, recalculate_all_ratings, MatchCounts, Ratings};
use crate::season::{
    generate_remaining_fixtures, CancelToken, SeasonProjection, SeasonSimulator,
    SimulationOptions,
};
use crate::standings::{calculate_standings, rank_standings, Standings, StandingsRow};
use crate::team::{rank_teams, RatingStatus, TeamRanking};
use crate::win_prob::{calculate_outcome_probs, OutcomeProbabilities};

/// What the host gets back after recording a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub record: MatchRecord,
    /// Pre-match probabilities
    pub probabilities: OutcomeProbabilities,
}

/// Forecast for a match that has not been played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub team_a: String,
    pub team_b: String,
    pub rating_a: f64,
    pub rating_b: f64,
    pub matches_a: u32,
    pub matches_b: u32,
    pub venue: Venue,
    /// Team A's rating plus home advantage, minus team B's rating
    pub rating_gap: f64,
    pub probabilities: OutcomeProbabilities,
    /// At least one side still has a provisional rating
    pub provisional: bool,
}

/// How far through a double round-robin the league is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonProgress {
    pub teams: usize,
    pub matches_per_team: u32,
    /// Matches played by the current leader
    pub matches_played: u32,
    pub remaining_fixtures: usize,
    pub complete: bool,
}

/// Ratings, match counts and match history for one league.
///
/// Every mutation that touches history (undo, delete, edit) rebuilds
/// the ratings from scratch.
#[derive(Clone, Debug)]
pub struct League {
    engine: RatingEngine,
    ratings: Ratings,
    match_counts: MatchCounts,
    history: Vec<MatchRecord>,
}

impl Default for League {
    fn default() -> Self {
        League::with_engine(RatingEngine::new(LeagueConfig::default()))
    }
}

fn clean_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LeagueError::InvalidTeamName(
            "team name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn clean_pair(team_a: &str, team_b: &str) -> Result<(String, String)> {
    let team_a = clean_name(team_a)?;
    let team_b = clean_name(team_b)?;
    if team_a == team_b {
        return Err(LeagueError::SameTeam(team_a));
    }
    Ok((team_a, team_b))
}

impl League {
    /// Empty league with the given configuration.
    ///
    /// Fails with `InvalidConfig` or `InvalidWeights` if the configuration
    /// does not pass `LeagueConfig::validate`.
    pub fn new(config: LeagueConfig) -> Result<Self> {
        config.validate()?;
        Ok(League::with_engine(RatingEngine::new(config)))
    }

    fn with_engine(engine: RatingEngine) -> Self {
        League {
            engine,
            ratings: Ratings::new(),
            match_counts: MatchCounts::new(),
            history: Vec::new(),
        }
    }

    /// Rebuild a league from a stored history. Ratings are always
    /// recomputed, so stale snapshots in the records are harmless.
    pub fn from_history(config: LeagueConfig, history: Vec<MatchRecord>) -> Result<Self> {
        let mut league = League::new(config)?;
        league.history = history;
        league.recalculate();
        Ok(league)
    }

    pub fn config(&self) -> &LeagueConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    pub fn ratings(&self) -> &Ratings {
        &self.ratings
    }

    pub fn match_counts(&self) -> &MatchCounts {
        &self.match_counts
    }

    pub fn history(&self) -> &[MatchRecord] {
        &self.history
    }

    pub fn rating(&self, team: &str) -> Option<f64> {
        self.ratings.get(team).copied()
    }

    fn rating_or_initial(&self, team: &str) -> f64 {
        self.rating(team).unwrap_or_else(|| {
            debug!(team, "team not rated yet, using initial rating");
            self.config().initial_rating
        })
    }

    fn matches_of(&self, team: &str) -> u32 {
        self.match_counts.get(team).copied().unwrap_or(0)
    }

    pub fn record_match(
        &mut self,
        team_a: &str,
        team_b: &str,
        goals_a: u32,
        goals_b: u32,
        venue: Venue,
    ) -> Result<MatchReport> {
        self.record_match_at(
            team_a,
            team_b,
            goals_a,
            goals_b,
            venue,
            Local::now().naive_local(),
        )
    }

    /// Record a result and update both teams' ratings. Teams seen for the
    /// first time enter at the initial rating.
    pub fn record_match_at(
        &mut self,
        team_a: &str,
        team_b: &str,
        goals_a: u32,
        goals_b: u32,
        venue: Venue,
        timestamp: NaiveDateTime,
    ) -> Result<MatchReport> {
        let (team_a, team_b) = clean_pair(team_a, team_b)?;

        let probabilities = calculate_outcome_probs(
            self.rating_or_initial(&team_a),
            self.rating_or_initial(&team_b),
            venue,
            self.config().home_advantage,
        );

        let match_id = self.history.len() as u32 + 1;
        let mut record =
            MatchRecord::new(match_id, timestamp, team_a, team_b, goals_a, goals_b, venue);
        apply_match(
            &self.engine,
            &mut self.ratings,
            &mut self.match_counts,
            &mut record,
        );

        info!(
            match_id,
            team_a = %record.team_a,
            team_b = %record.team_b,
            goals_a,
            goals_b,
            change_a = record.change_a,
            "match recorded"
        );

        self.history.push(record.clone());
        Ok(MatchReport {
            record,
            probabilities,
        })
    }

    /// Win/draw/loss forecast from current ratings.
    pub fn predict_match(
        &self,
        team_a: &str,
        team_b: &str,
        venue: Venue,
    ) -> Result<MatchPrediction> {
        if self.ratings.len() < 2 {
            return Err(LeagueError::InsufficientTeams {
                found: self.ratings.len(),
            });
        }
        let (team_a, team_b) = clean_pair(team_a, team_b)?;

        let rating_a = self.rating_or_initial(&team_a);
        let rating_b = self.rating_or_initial(&team_b);
        let matches_a = self.matches_of(&team_a);
        let matches_b = self.matches_of(&team_b);
        let config = self.config();

        let threshold = config.early_matches_threshold;
        let provisional = RatingStatus::for_matches(matches_a, threshold)
            == RatingStatus::Provisional
            || RatingStatus::for_matches(matches_b, threshold) == RatingStatus::Provisional;

        Ok(MatchPrediction {
            rating_gap: rating_a + venue.home_advantage(config.home_advantage) - rating_b,
            probabilities: calculate_outcome_probs(
                rating_a,
                rating_b,
                venue,
                config.home_advantage,
            ),
            team_a,
            team_b,
            rating_a,
            rating_b,
            matches_a,
            matches_b,
            venue,
            provisional,
        })
    }

    /// Replay the whole history from the initial rating.
    pub fn recalculate(&mut self) {
        let (ratings, match_counts) = recalculate_all_ratings(&self.engine, &mut self.history);
        self.ratings = ratings;
        self.match_counts = match_counts;
    }

    pub fn undo_last_match(&mut self) -> Result<MatchRecord> {
        let removed = self.history.pop().ok_or(LeagueError::EmptyHistory)?;
        self.recalculate();
        info!(match_id = removed.match_id, "last match undone");
        Ok(removed)
    }

    fn position_of(&self, match_id: u32) -> Result<usize> {
        self.history
            .iter()
            .position(|m| m.match_id == match_id)
            .ok_or(LeagueError::MatchNotFound(match_id))
    }

    /// Remove a match, renumber the rest 1..N and replay.
    pub fn delete_match(&mut self, match_id: u32) -> Result<MatchRecord> {
        let idx = self.position_of(match_id)?;
        let removed = self.history.remove(idx);

        for (i, record) in self.history.iter_mut().enumerate() {
            record.match_id = i as u32 + 1;
        }
        self.recalculate();

        info!(match_id, "match deleted");
        Ok(removed)
    }

    /// Change the score of a match and replay. `None` keeps the current
    /// value.
    pub fn edit_match(
        &mut self,
        match_id: u32,
        goals_a: Option<u32>,
        goals_b: Option<u32>,
    ) -> Result<&MatchRecord> {
        let idx = self.position_of(match_id)?;
        {
            let record = &mut self.history[idx];
            if let Some(g) = goals_a {
                record.goals_a = g;
            }
            if let Some(g) = goals_b {
                record.goals_b = g;
            }
        }
        self.recalculate();

        info!(match_id, "match edited");
        Ok(&self.history[idx])
    }

    /// Rename a team everywhere, keeping its rating and match count.
    /// Returns how many history records mention the team.
    pub fn rename_team(&mut self, old_name: &str, new_name: &str) -> Result<usize> {
        let old_name = clean_name(old_name)?;
        let new_name = clean_name(new_name)?;

        if new_name == old_name {
            return Err(LeagueError::InvalidTeamName(
                "new name must be different".to_string(),
            ));
        }
        if self.ratings.contains_key(&new_name) {
            return Err(LeagueError::TeamExists(new_name));
        }
        let rating = self
            .ratings
            .remove(&old_name)
            .ok_or_else(|| LeagueError::UnknownTeam(old_name.clone()))?;
        let matches = self.match_counts.remove(&old_name).unwrap_or(0);

        self.ratings.insert(new_name.clone(), rating);
        self.match_counts.insert(new_name.clone(), matches);

        let mut touched = 0;
        for record in &mut self.history {
            if !record.involves(&old_name) {
                continue;
            }
            if record.team_a == old_name {
                record.team_a = new_name.clone();
            }
            if record.team_b == old_name {
                record.team_b = new_name.clone();
            }
            touched += 1;
        }

        info!(old = %old_name, new = %new_name, records = touched, "team renamed");
        Ok(touched)
    }

    /// Drop every team and match.
    pub fn reset(&mut self) {
        self.ratings.clear();
        self.match_counts.clear();
        self.history.clear();
        info!("league reset");
    }

    pub fn rankings(&self) -> Vec<TeamRanking> {
        rank_teams(
            &self.ratings,
            &self.match_counts,
            self.config().early_matches_threshold,
        )
    }

    /// Up to `limit` matches, most recent first.
    pub fn recent_matches(&self, limit: usize) -> Vec<&MatchRecord> {
        self.history.iter().rev().take(limit).collect()
    }

    pub fn standings(&self) -> Standings {
        calculate_standings(&self.history)
    }

    pub fn ranked_standings(&self) -> Vec<(String, StandingsRow)> {
        rank_standings(&self.standings())
    }

    pub fn season_progress(&self) -> SeasonProgress {
        let standings = self.standings();
        let teams: Vec<String> = standings.keys().cloned().collect();
        let matches_per_team = teams.len().saturating_sub(1) as u32 * 2;
        let matches_played = rank_standings(&standings)
            .first()
            .map(|(_, row)| row.matches_played)
            .unwrap_or(0);
        let remaining_fixtures = generate_remaining_fixtures(&self.history, &teams).len();

        SeasonProgress {
            teams: teams.len(),
            matches_per_team,
            matches_played,
            remaining_fixtures,
            complete: teams.len() >= 2 && remaining_fixtures == 0,
        }
    }

    /// Monte Carlo projection of the final table from the current
    /// standings and ratings.
    pub fn project_season(
        &self,
        options: &SimulationOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<SeasonProjection> {
        if self.history.is_empty() {
            return Err(LeagueError::EmptyHistory);
        }

        let standings = self.standings();
        let teams: Vec<String> = standings.keys().cloned().collect();
        let fixtures = generate_remaining_fixtures(&self.history, &teams);

        let simulator = SeasonSimulator::new(self.config(), &standings, &self.ratings, &fixtures)?;
        simulator.simulate(options, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_match_league() -> League {
        let mut league = League::default();
        let games = [
            ("Lions", "Tigers", 2, 0),
            ("Bears", "Wolves", 1, 1),
            ("Tigers", "Bears", 3, 1),
            ("Bears", "Tigers", 0, 1),
            ("Lions", "Bears", 1, 2),
        ];
        for (a, b, ga, gb) in games {
            league.record_match(a, b, ga, gb, Venue::HomeA).unwrap();
        }
        league
    }

    #[test]
    fn test_record_first_match() {
        let mut league = League::default();
        let report = league
            .record_match("Lions", "Tigers", 2, 0, Venue::HomeA)
            .unwrap();

        assert_eq!(report.record.match_id, 1);
        assert_eq!(report.record.rating_a_before, 1500.0);
        assert!((report.record.change_a - 26.94).abs() < 0.05);
        assert_eq!(report.record.change_b, -report.record.change_a);
        assert!((report.probabilities.total() - 1.0).abs() < 1e-9);
        assert!(report.probabilities.win_a > report.probabilities.win_b);

        assert_eq!(league.match_counts()["Lions"], 1);
        assert!(league.rating("Lions").unwrap() > 1500.0);
        assert!(league.rating("Tigers").unwrap() < 1500.0);
    }

    #[test]
    fn test_live_state_matches_replay() {
        let league = five_match_league();
        let replayed = League::from_history(LeagueConfig::default(), league.history().to_vec()).unwrap();

        assert_eq!(league.ratings(), replayed.ratings());
        assert_eq!(league.match_counts(), replayed.match_counts());
        assert_eq!(league.history(), replayed.history());
    }

    #[test]
    fn test_names_validated() {
        let mut league = League::default();
        assert!(matches!(
            league.record_match("  ", "Tigers", 1, 0, Venue::HomeA),
            Err(LeagueError::InvalidTeamName(_))
        ));
        assert_eq!(
            league
                .record_match("Lions", " Lions ", 1, 0, Venue::HomeA)
                .unwrap_err(),
            LeagueError::SameTeam("Lions".to_string())
        );
        assert!(league.history().is_empty());

        league.record_match(" Lions ", "Tigers", 1, 0, Venue::HomeA).unwrap();
        assert!(league.rating("Lions").is_some());
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut league = five_match_league();
        let before: League = {
            let mut l = League::default();
            for m in &league.history()[..4] {
                l.record_match_at(
                    &m.team_a, &m.team_b, m.goals_a, m.goals_b, m.venue, m.timestamp,
                )
                .unwrap();
            }
            l
        };

        let removed = league.undo_last_match().unwrap();
        assert_eq!(removed.match_id, 5);
        assert_eq!(league.ratings(), before.ratings());
        assert_eq!(league.match_counts(), before.match_counts());
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut league = League::default();
        assert_eq!(league.undo_last_match().unwrap_err(), LeagueError::EmptyHistory);
    }

    #[test]
    fn test_delete_middle_match_replays_everything_after() {
        let mut league = five_match_league();
        let before = league.history().to_vec();

        let removed = league.delete_match(3).unwrap();
        assert_eq!((removed.team_a.as_str(), removed.team_b.as_str()), ("Tigers", "Bears"));

        let after = league.history();
        assert_eq!(after.len(), 4);
        let ids: Vec<u32> = after.iter().map(|m| m.match_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        // Matches before the deletion are untouched
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);

        // Later matches were re-rated, not patched
        for (new, old) in after[2..].iter().zip(&before[3..]) {
            assert_eq!(new.team_a, old.team_a);
            assert_eq!(new.team_b, old.team_b);
            assert_ne!(new.rating_a_after, old.rating_a_after);
            assert_ne!(new.rating_b_after, old.rating_b_after);
        }

        assert_eq!(league.match_counts()["Tigers"], 2);
        assert_eq!(league.match_counts()["Bears"], 3);
    }

    #[test]
    fn test_delete_unknown_match() {
        let mut league = five_match_league();
        assert_eq!(league.delete_match(42).unwrap_err(), LeagueError::MatchNotFound(42));
        assert_eq!(league.history().len(), 5);
    }

    #[test]
    fn test_edit_match_replays() {
        let mut league = five_match_league();
        let lions_before = league.rating("Lions").unwrap();

        let edited = league.edit_match(1, None, Some(3)).unwrap();
        assert_eq!((edited.goals_a, edited.goals_b), (2, 3));
        assert!(edited.change_a < 0.0);

        assert!(league.rating("Lions").unwrap() < lions_before);
        let fresh = League::from_history(LeagueConfig::default(), league.history().to_vec()).unwrap();
        assert_eq!(fresh.ratings(), league.ratings());
    }

    #[test]
    fn test_rename_team() {
        let mut league = five_match_league();
        let rating = league.rating("Lions").unwrap();

        let touched = league.rename_team("Lions", "Kings").unwrap();
        assert_eq!(touched, 2);
        assert_eq!(league.rating("Kings"), Some(rating));
        assert_eq!(league.rating("Lions"), None);
        assert_eq!(league.match_counts()["Kings"], 2);
        assert!(league.history().iter().all(|m| !m.involves("Lions")));

        // Replay after the rename lands on the same state
        let ratings = league.ratings().clone();
        league.recalculate();
        assert_eq!(league.ratings(), &ratings);
    }

    #[test]
    fn test_rename_errors() {
        let mut league = five_match_league();
        assert_eq!(
            league.rename_team("Eagles", "Hawks").unwrap_err(),
            LeagueError::UnknownTeam("Eagles".to_string())
        );
        assert_eq!(
            league.rename_team("Lions", "Bears").unwrap_err(),
            LeagueError::TeamExists("Bears".to_string())
        );
        assert!(matches!(
            league.rename_team("Lions", "Lions"),
            Err(LeagueError::InvalidTeamName(_))
        ));
        assert!(matches!(
            league.rename_team("Lions", ""),
            Err(LeagueError::InvalidTeamName(_))
        ));
    }

    #[test]
    fn test_predict_match() {
        let league = five_match_league();
        let prediction = league.predict_match("Lions", "Wolves", Venue::HomeA).unwrap();

        assert!(prediction.provisional);
        assert_eq!(prediction.rating_a, league.rating("Lions").unwrap());
        assert_eq!(prediction.matches_b, 1);
        assert!(
            (prediction.rating_gap - (prediction.rating_a + 60.0 - prediction.rating_b)).abs()
                < 1e-9
        );
        assert!((prediction.probabilities.total() - 1.0).abs() < 1e-9);

        let neutral = league.predict_match("Lions", "Wolves", Venue::Neutral).unwrap();
        assert!((prediction.rating_gap - neutral.rating_gap - 60.0).abs() < 1e-9);
        assert!(prediction.probabilities.win_a > neutral.probabilities.win_a);
    }

    #[test]
    fn test_predict_needs_two_teams() {
        let league = League::default();
        assert_eq!(
            league.predict_match("A", "B", Venue::Neutral).unwrap_err(),
            LeagueError::InsufficientTeams { found: 0 }
        );
    }

    #[test]
    fn test_predict_unknown_team_uses_initial_rating() {
        let league = five_match_league();
        let prediction = league.predict_match("Eagles", "Lions", Venue::Neutral).unwrap();
        assert_eq!(prediction.rating_a, 1500.0);
        assert_eq!(prediction.matches_a, 0);
    }

    #[test]
    fn test_rankings_and_reset() {
        let mut league = five_match_league();
        let rankings = league.rankings();
        assert_eq!(rankings.len(), 4);
        assert!(rankings.windows(2).all(|w| w[0].rating >= w[1].rating));
        assert!(rankings.iter().all(|r| r.status == RatingStatus::Provisional));

        league.reset();
        assert!(league.rankings().is_empty());
        assert!(league.history().is_empty());
        assert!(league.match_counts().is_empty());
    }

    #[test]
    fn test_recent_matches() {
        let league = five_match_league();
        let recent = league.recent_matches(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].match_id, 5);
        assert_eq!(recent[1].match_id, 4);
        assert_eq!(league.recent_matches(50).len(), 5);
    }

    #[test]
    fn test_season_progress() {
        let league = five_match_league();
        let progress = league.season_progress();
        assert_eq!(progress.teams, 4);
        assert_eq!(progress.matches_per_team, 6);
        assert_eq!(progress.remaining_fixtures, 7);
        assert!(!progress.complete);
    }

    #[test]
    fn test_season_progress_waits_for_every_fixture() {
        let mut league = League::default();
        for (a, b) in [("A", "B"), ("B", "A"), ("A", "C"), ("C", "A")] {
            let (ga, gb) = if a == "A" { (2, 0) } else { (0, 1) };
            league.record_match(a, b, ga, gb, Venue::HomeA).unwrap();
        }

        // A has finished its legs, B and C have not met yet
        let progress = league.season_progress();
        assert_eq!(progress.teams, 3);
        assert_eq!(progress.matches_per_team, 4);
        assert_eq!(progress.matches_played, 4);
        assert_eq!(progress.remaining_fixtures, 2);
        assert!(!progress.complete);

        league.record_match("B", "C", 1, 1, Venue::HomeA).unwrap();
        league.record_match("C", "B", 0, 0, Venue::HomeA).unwrap();
        let progress = league.season_progress();
        assert_eq!(progress.remaining_fixtures, 0);
        assert!(progress.complete);
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = LeagueConfig::default();
        config.k_base = f64::NAN;
        assert!(matches!(
            League::new(config),
            Err(LeagueError::InvalidConfig(_))
        ));

        let mut config = LeagueConfig::default();
        config.goal_diff_multipliers.clear();
        assert!(matches!(
            League::from_history(config, Vec::new()),
            Err(LeagueError::InvalidConfig(_))
        ));

        assert!(League::new(LeagueConfig::default()).is_ok());
    }

    #[test]
    fn test_project_season() {
        let league = five_match_league();
        let projection = league
            .project_season(&SimulationOptions::new(1000).with_seed(8), None)
            .unwrap();

        assert_eq!(projection.completed_trials, 1000);
        assert_eq!(projection.remaining_fixtures, 7);
        assert_eq!(projection.teams.len(), 4);
        let title: f64 = projection.teams.iter().map(|t| t.championship_probability).sum();
        assert!((title - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_season_needs_history() {
        let league = League::default();
        assert_eq!(
            league
                .project_season(&SimulationOptions::new(10), None)
                .unwrap_err(),
            LeagueError::EmptyHistory
        );
    }
}
