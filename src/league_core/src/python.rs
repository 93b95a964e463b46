use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::LeagueConfig;
use crate::constants::{EARLY_MATCHES_THRESHOLD, HOME_ADVANTAGE, INITIAL_RATING};
use crate::error::LeagueError;
use crate::league::{League, SeasonProgress};
use crate::match_record::{MatchRecord, Venue};
use crate::rating::RatingEngine;
use crate::season::{SeasonProjection, SimulationOptions};
use crate::team::RatingStatus;
use crate::win_prob::calculate_outcome_probs;

impl From<LeagueError> for PyErr {
    fn from(err: LeagueError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// One recorded match with its rating snapshots.
#[pyclass(name = "MatchRecord")]
#[derive(Clone)]
pub struct PyMatchRecord {
    #[pyo3(get)]
    pub match_id: u32,
    #[pyo3(get)]
    pub timestamp: String,
    #[pyo3(get)]
    pub team_a: String,
    #[pyo3(get)]
    pub team_b: String,
    #[pyo3(get)]
    pub goals_a: u32,
    #[pyo3(get)]
    pub goals_b: u32,
    /// True if team A hosted, False if team B did, None for neutral
    #[pyo3(get)]
    pub is_home_a: Option<bool>,
    #[pyo3(get)]
    pub rating_a_before: f64,
    #[pyo3(get)]
    pub rating_b_before: f64,
    #[pyo3(get)]
    pub rating_a_after: f64,
    #[pyo3(get)]
    pub rating_b_after: f64,
    #[pyo3(get)]
    pub change_a: f64,
    #[pyo3(get)]
    pub change_b: f64,
}

impl From<&MatchRecord> for PyMatchRecord {
    fn from(m: &MatchRecord) -> Self {
        PyMatchRecord {
            match_id: m.match_id,
            timestamp: m.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            team_a: m.team_a.clone(),
            team_b: m.team_b.clone(),
            goals_a: m.goals_a,
            goals_b: m.goals_b,
            is_home_a: m.venue.home_flag(),
            rating_a_before: m.rating_a_before,
            rating_b_before: m.rating_b_before,
            rating_a_after: m.rating_a_after,
            rating_b_after: m.rating_b_after,
            change_a: m.change_a,
            change_b: m.change_b,
        }
    }
}

#[pyclass(name = "SeasonProgress")]
#[derive(Clone)]
pub struct PySeasonProgress {
    #[pyo3(get)]
    pub teams: usize,
    #[pyo3(get)]
    pub matches_per_team: u32,
    #[pyo3(get)]
    pub matches_played: u32,
    #[pyo3(get)]
    pub remaining_fixtures: usize,
    #[pyo3(get)]
    pub complete: bool,
}

impl From<SeasonProgress> for PySeasonProgress {
    fn from(p: SeasonProgress) -> Self {
        PySeasonProgress {
            teams: p.teams,
            matches_per_team: p.matches_per_team,
            matches_played: p.matches_played,
            remaining_fixtures: p.remaining_fixtures,
            complete: p.complete,
        }
    }
}

/// Season projection. `teams` maps team -> statistic name -> value.
#[pyclass(name = "SeasonProjection")]
#[derive(Clone)]
pub struct PySeasonProjection {
    #[pyo3(get)]
    pub requested_trials: usize,
    #[pyo3(get)]
    pub completed_trials: usize,
    #[pyo3(get)]
    pub interrupted: bool,
    #[pyo3(get)]
    pub remaining_fixtures: usize,
    #[pyo3(get)]
    pub teams: HashMap<String, HashMap<String, f64>>,
}

impl From<SeasonProjection> for PySeasonProjection {
    fn from(projection: SeasonProjection) -> Self {
        let teams = projection
            .teams
            .into_iter()
            .map(|t| {
                let stats: HashMap<String, f64> = t
                    .stats()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                (t.team, stats)
            })
            .collect();

        PySeasonProjection {
            requested_trials: projection.requested_trials,
            completed_trials: projection.completed_trials,
            interrupted: projection.interrupted,
            remaining_fixtures: projection.remaining_fixtures,
            teams,
        }
    }
}

/// League state handle for the Python host.
///
/// Venues follow the host's convention: `is_home_a=True` means team A
/// hosted, `False` team B, `None` a neutral ground.
#[pyclass(name = "League")]
pub struct PyLeague {
    inner: League,
}

#[pymethods]
impl PyLeague {
    #[new]
    #[pyo3(signature = (config_toml = None))]
    pub fn new(config_toml: Option<&str>) -> PyResult<Self> {
        let config = match config_toml {
            Some(text) => LeagueConfig::from_toml_str(text)?,
            None => LeagueConfig::default(),
        };
        Ok(PyLeague {
            inner: League::new(config)?,
        })
    }

    /// Record a result. Returns (match_id, change_a, change_b, win_a, draw, win_b).
    #[pyo3(signature = (team_a, team_b, goals_a, goals_b, is_home_a = Some(true), timestamp = None))]
    pub fn record_match(
        &mut self,
        team_a: &str,
        team_b: &str,
        goals_a: u32,
        goals_b: u32,
        is_home_a: Option<bool>,
        timestamp: Option<&str>,
    ) -> PyResult<(u32, f64, f64, f64, f64, f64)> {
        let venue = Venue::from_home_flag(is_home_a);
        let report = match timestamp {
            Some(ts) => {
                let ts = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
                    .map_err(|e| PyValueError::new_err(format!("Invalid timestamp: {}", e)))?;
                self.inner
                    .record_match_at(team_a, team_b, goals_a, goals_b, venue, ts)?
            }
            None => self.inner.record_match(team_a, team_b, goals_a, goals_b, venue)?,
        };

        let p = report.probabilities;
        Ok((
            report.record.match_id,
            report.record.change_a,
            report.record.change_b,
            p.win_a,
            p.draw,
            p.win_b,
        ))
    }

    /// Returns (win_a, draw, win_b, provisional).
    #[pyo3(signature = (team_a, team_b, is_home_a = Some(true)))]
    pub fn predict_match(
        &self,
        team_a: &str,
        team_b: &str,
        is_home_a: Option<bool>,
    ) -> PyResult<(f64, f64, f64, bool)> {
        let prediction =
            self.inner
                .predict_match(team_a, team_b, Venue::from_home_flag(is_home_a))?;
        let p = prediction.probabilities;
        Ok((p.win_a, p.draw, p.win_b, prediction.provisional))
    }

    pub fn undo_last_match(&mut self) -> PyResult<u32> {
        Ok(self.inner.undo_last_match()?.match_id)
    }

    pub fn delete_match(&mut self, match_id: u32) -> PyResult<()> {
        self.inner.delete_match(match_id)?;
        Ok(())
    }

    #[pyo3(signature = (match_id, goals_a = None, goals_b = None))]
    pub fn edit_match(
        &mut self,
        match_id: u32,
        goals_a: Option<u32>,
        goals_b: Option<u32>,
    ) -> PyResult<()> {
        self.inner.edit_match(match_id, goals_a, goals_b)?;
        Ok(())
    }

    pub fn rename_team(&mut self, old_name: &str, new_name: &str) -> PyResult<usize> {
        Ok(self.inner.rename_team(old_name, new_name)?)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    pub fn ratings(&self) -> HashMap<String, f64> {
        self.inner.ratings().clone()
    }

    #[getter]
    pub fn match_counts(&self) -> HashMap<String, u32> {
        self.inner.match_counts().clone()
    }

    pub fn history(&self) -> Vec<PyMatchRecord> {
        self.inner.history().iter().map(PyMatchRecord::from).collect()
    }

    /// Up to `limit` matches, most recent first.
    #[pyo3(signature = (limit = 10))]
    pub fn recent_matches(&self, limit: usize) -> Vec<PyMatchRecord> {
        self.inner
            .recent_matches(limit)
            .into_iter()
            .map(PyMatchRecord::from)
            .collect()
    }

    pub fn season_progress(&self) -> PySeasonProgress {
        self.inner.season_progress().into()
    }

    /// (team, rating, matches, provisional), best first.
    pub fn rankings(&self) -> Vec<(String, f64, u32, bool)> {
        self.inner
            .rankings()
            .into_iter()
            .map(|r| {
                let provisional = r.status == RatingStatus::Provisional;
                (r.name, r.rating, r.matches, provisional)
            })
            .collect()
    }

    /// (team, played, wins, draws, losses, goals_for, goals_against, points)
    #[allow(clippy::type_complexity)]
    pub fn standings(&self) -> Vec<(String, u32, u32, u32, u32, u32, u32, u32)> {
        self.inner
            .ranked_standings()
            .into_iter()
            .map(|(team, r)| {
                (
                    team,
                    r.matches_played,
                    r.wins,
                    r.draws,
                    r.losses,
                    r.goals_for,
                    r.goals_against,
                    r.points,
                )
            })
            .collect()
    }

    /// Monte Carlo projection. With `time_limit_ms` set, trials stop
    /// starting once the limit passes and the result is marked interrupted.
    #[pyo3(signature = (trials = None, seed = None, parallel = true, time_limit_ms = None))]
    pub fn project_season(
        &self,
        py: Python<'_>,
        trials: Option<usize>,
        seed: Option<u64>,
        parallel: bool,
        time_limit_ms: Option<u64>,
    ) -> PyResult<PySeasonProjection> {
        let mut options =
            SimulationOptions::new(trials.unwrap_or(self.inner.config().simulation.trials))
                .parallel(parallel);
        options.seed = seed;
        options.time_limit = time_limit_ms.map(Duration::from_millis);

        let league = &self.inner;
        let projection = py.allow_threads(|| league.project_season(&options, None))?;
        Ok(projection.into())
    }

    fn __repr__(&self) -> String {
        format!(
            "League({} teams, {} matches)",
            self.inner.ratings().len(),
            self.inner.history().len()
        )
    }
}

/// Expected score for team A.
#[pyfunction]
#[pyo3(signature = (rating_a, rating_b, home_advantage = 0.0))]
fn expected_score(rating_a: f64, rating_b: f64, home_advantage: f64) -> f64 {
    RatingEngine::expected_score(rating_a, rating_b, home_advantage)
}

/// Win/draw/loss probabilities with the default home advantage.
#[pyfunction]
#[pyo3(signature = (rating_a, rating_b, is_home_a = Some(true)))]
fn outcome_probabilities(rating_a: f64, rating_b: f64, is_home_a: Option<bool>) -> (f64, f64, f64) {
    let p = calculate_outcome_probs(
        rating_a,
        rating_b,
        Venue::from_home_flag(is_home_a),
        HOME_ADVANTAGE,
    );
    (p.win_a, p.draw, p.win_b)
}

#[pymodule]
fn league_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLeague>()?;
    m.add_class::<PyMatchRecord>()?;
    m.add_class::<PySeasonProgress>()?;
    m.add_class::<PySeasonProjection>()?;

    m.add_function(wrap_pyfunction!(expected_score, m)?)?;
    m.add_function(wrap_pyfunction!(outcome_probabilities, m)?)?;

    m.add("INITIAL_RATING", INITIAL_RATING)?;
    m.add("HOME_ADVANTAGE", HOME_ADVANTAGE)?;
    m.add("EARLY_MATCHES_THRESHOLD", EARLY_MATCHES_THRESHOLD)?;

    Ok(())
}
