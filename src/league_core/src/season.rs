use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::LeagueConfig;
use crate::error::{LeagueError, Result};
use crate::match_record::{MatchRecord, Venue};
use crate::match_sim::ScorelineSampler;
use crate::recalc::Ratings;
use crate::standings::{rank_standings, Standings, TableKey};
use crate::win_prob::{calculate_outcome_probs, OutcomeProbabilities};

/// An unplayed match, with `team_a` as the nominal home side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    pub team_a: String,
    pub team_b: String,
}

/// Every ordered pairing of distinct teams that has not yet been played in
/// exactly that order. In a double round-robin each team hosts every other
/// team once, so `(A, B)` and `(B, A)` are separate fixtures.
pub fn generate_remaining_fixtures(history: &[MatchRecord], teams: &[String]) -> Vec<Fixture> {
    let played: HashSet<(&str, &str)> = history
        .iter()
        .map(|m| (m.team_a.as_str(), m.team_b.as_str()))
        .collect();

    let mut fixtures = Vec::new();
    for team_a in teams {
        for team_b in teams {
            if team_a != team_b && !played.contains(&(team_a.as_str(), team_b.as_str())) {
                fixtures.push(Fixture {
                    team_a: team_a.clone(),
                    team_b: team_b.clone(),
                });
            }
        }
    }
    fixtures
}

/// Shared flag for stopping a running simulation between trials.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationOptions {
    pub trials: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Stop starting new trials once this much time has passed
    pub time_limit: Option<Duration>,
    /// Run trials on the rayon pool
    pub parallel: bool,
}

impl SimulationOptions {
    pub fn new(trials: usize) -> Self {
        SimulationOptions {
            trials,
            seed: None,
            time_limit: None,
            parallel: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Raw per-team tallies across all completed trials.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// `position_counts[p - 1]` is how often the team finished p-th
    pub position_counts: Vec<u64>,
    /// Final points, one entry per trial
    pub points: Vec<u32>,
}

impl SimulationResult {
    fn new(num_teams: usize) -> Self {
        SimulationResult {
            position_counts: vec![0; num_teams],
            points: Vec::new(),
        }
    }

    /// How often the team finished in `position` (1-based).
    pub fn count_at(&self, position: usize) -> u64 {
        position
            .checked_sub(1)
            .and_then(|i| self.position_counts.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub fn trials(&self) -> u64 {
        self.position_counts.iter().sum()
    }
}

/// Summary statistics for one team's projected finish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamProjection {
    pub team: String,
    pub current_position: usize,
    pub current_points: u32,
    pub expected_position: f64,
    pub most_likely_position: usize,
    pub championship_probability: f64,
    /// Probability of finishing within the configured top positions
    pub top_probability: f64,
    pub expected_points: f64,
    pub points_std_dev: f64,
    pub points_p10: f64,
    pub points_p90: f64,
    pub points_range: (u32, u32),
}

impl TeamProjection {
    /// Every numeric statistic as a (name, value) pair, for hosts that
    /// want a flat mapping.
    pub fn stats(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("current_position", self.current_position as f64),
            ("current_points", self.current_points as f64),
            ("expected_position", self.expected_position),
            ("most_likely_position", self.most_likely_position as f64),
            ("championship_probability", self.championship_probability),
            ("top_probability", self.top_probability),
            ("expected_points", self.expected_points),
            ("points_std_dev", self.points_std_dev),
            ("points_p10", self.points_p10),
            ("points_p90", self.points_p90),
            ("points_min", self.points_range.0 as f64),
            ("points_max", self.points_range.1 as f64),
        ]
    }
}

/// Outcome of a Monte Carlo season run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonProjection {
    pub requested_trials: usize,
    pub completed_trials: usize,
    /// Stopped early by cancellation or the time limit
    pub interrupted: bool,
    pub remaining_fixtures: usize,
    pub results: BTreeMap<String, SimulationResult>,
    /// Sorted by expected position; empty when no trial completed
    pub teams: Vec<TeamProjection>,
}

impl SeasonProjection {
    pub fn team(&self, name: &str) -> Option<&TeamProjection> {
        self.teams.iter().find(|t| t.team == name)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct TrialRow {
    points: u32,
    goals_for: u32,
    goals_against: u32,
}

struct TrialOutcome {
    /// Team indices in finishing order
    order: Vec<usize>,
    /// Final points by team index
    points: Vec<u32>,
}

struct SimFixture {
    home: usize,
    away: usize,
    probs: OutcomeProbabilities,
}

/// Monte Carlo projection of the rest of a season.
///
/// Ratings stay frozen for the whole run, so each fixture's outcome
/// probabilities are computed once up front.
pub struct SeasonSimulator {
    teams: Vec<String>,
    base: Vec<TrialRow>,
    current_positions: Vec<usize>,
    fixtures: Vec<SimFixture>,
    sampler: ScorelineSampler,
    top_positions: usize,
}

impl SeasonSimulator {
    pub fn new(
        config: &LeagueConfig,
        standings: &Standings,
        ratings: &Ratings,
        fixtures: &[Fixture],
    ) -> Result<Self> {
        if standings.len() < 2 {
            return Err(LeagueError::InsufficientTeams {
                found: standings.len(),
            });
        }

        let teams: Vec<String> = standings.keys().cloned().collect();
        let index: HashMap<&str, usize> = teams
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let base = standings
            .values()
            .map(|row| TrialRow {
                points: row.points,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
            })
            .collect();

        let mut current_positions = vec![0; teams.len()];
        for (pos, (team, _)) in rank_standings(standings).iter().enumerate() {
            current_positions[index[team.as_str()]] = pos + 1;
        }

        let rating_of = |team: &str| {
            ratings.get(team).copied().unwrap_or_else(|| {
                debug!(team, "no rating on file, using initial rating");
                config.initial_rating
            })
        };

        let mut sim_fixtures = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            let home = *index
                .get(fixture.team_a.as_str())
                .ok_or_else(|| LeagueError::UnknownTeam(fixture.team_a.clone()))?;
            let away = *index
                .get(fixture.team_b.as_str())
                .ok_or_else(|| LeagueError::UnknownTeam(fixture.team_b.clone()))?;

            let probs = calculate_outcome_probs(
                rating_of(&fixture.team_a),
                rating_of(&fixture.team_b),
                Venue::HomeA,
                config.home_advantage,
            );
            sim_fixtures.push(SimFixture { home, away, probs });
        }

        Ok(SeasonSimulator {
            teams,
            base,
            current_positions,
            fixtures: sim_fixtures,
            sampler: ScorelineSampler::new(&config.scorelines)?,
            top_positions: config.simulation.top_positions,
        })
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn remaining_fixtures(&self) -> usize {
        self.fixtures.len()
    }

    fn play_out<R: Rng + ?Sized>(&self, rng: &mut R) -> TrialOutcome {
        let mut table = self.base.clone();

        for fixture in &self.fixtures {
            let score = self.sampler.simulate(&fixture.probs, rng);

            let home = &mut table[fixture.home];
            home.points += score.points_a;
            home.goals_for += score.goals_a;
            home.goals_against += score.goals_b;

            let away = &mut table[fixture.away];
            away.points += score.points_b;
            away.goals_for += score.goals_b;
            away.goals_against += score.goals_a;
        }

        let key = |i: usize| TableKey {
            team: &self.teams[i],
            points: table[i].points,
            goals_for: table[i].goals_for,
            goals_against: table[i].goals_against,
        };
        let mut order: Vec<usize> = (0..self.teams.len()).collect();
        order.sort_by(|&a, &b| key(a).cmp_position(&key(b)));

        TrialOutcome {
            order,
            points: table.iter().map(|row| row.points).collect(),
        }
    }

    fn play_seeded(&self, seed: u64) -> TrialOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.play_out(&mut rng)
    }

    /// Play the rest of the season once.
    ///
    /// Returns the final table as (team, points) in finishing order.
    pub fn simulate_once(&self, seed: Option<u64>) -> Vec<(String, u32)> {
        let mut rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let outcome = self.play_out(&mut rng);

        outcome
            .order
            .iter()
            .map(|&i| (self.teams[i].clone(), outcome.points[i]))
            .collect()
    }

    /// Run `options.trials` independent season completions and aggregate
    /// finishing positions and points.
    ///
    /// Each trial gets its own generator seeded from a master stream, so the
    /// sequential and parallel modes agree for the same master seed.
    /// Cancellation and the time limit are checked before each trial; an
    /// interrupted run returns whatever trials finished.
    ///
    /// # Arguments
    /// * `options` - Trial count, master seed, time limit and execution mode
    /// * `cancel` - Optional token the host can trip to stop early
    ///
    /// # Returns
    /// Per-team position and points tallies plus summaries, or
    /// `InvalidTrialCount` when no trials were requested
    pub fn simulate(
        &self,
        options: &SimulationOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<SeasonProjection> {
        if options.trials == 0 {
            return Err(LeagueError::InvalidTrialCount);
        }

        let mut master = match options.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..options.trials).map(|_| master.gen::<u64>()).collect();

        let deadline = options.time_limit.map(|limit| Instant::now() + limit);
        let should_stop = || {
            cancel.map_or(false, |c| c.is_cancelled())
                || deadline.map_or(false, |d| Instant::now() >= d)
        };

        info!(
            trials = options.trials,
            fixtures = self.fixtures.len(),
            teams = self.teams.len(),
            parallel = options.parallel,
            "starting season simulation"
        );
        let started = Instant::now();

        let mut results: Vec<SimulationResult> = (0..self.teams.len())
            .map(|_| SimulationResult::new(self.teams.len()))
            .collect();
        let mut completed = 0;

        let mut record = |outcome: TrialOutcome| {
            for (pos, &team) in outcome.order.iter().enumerate() {
                results[team].position_counts[pos] += 1;
            }
            for (team, &points) in outcome.points.iter().enumerate() {
                results[team].points.push(points);
            }
            completed += 1;
        };

        if options.parallel {
            let outcomes: Vec<Option<TrialOutcome>> = seeds
                .par_iter()
                .map(|&seed| {
                    if should_stop() {
                        None
                    } else {
                        Some(self.play_seeded(seed))
                    }
                })
                .collect();
            outcomes.into_iter().flatten().for_each(&mut record);
        } else {
            for &seed in &seeds {
                if should_stop() {
                    break;
                }
                record(self.play_seeded(seed));
            }
        }

        let interrupted = completed < options.trials;
        if interrupted {
            warn!(
                completed,
                requested = options.trials,
                "season simulation interrupted"
            );
        } else {
            info!(
                trials = completed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "season simulation finished"
            );
        }

        let mut teams: Vec<TeamProjection> = if completed > 0 {
            (0..self.teams.len())
                .map(|i| self.summarize(i, &results[i], completed))
                .collect()
        } else {
            Vec::new()
        };
        teams.sort_by(|a, b| {
            a.expected_position
                .total_cmp(&b.expected_position)
                .then_with(|| a.team.cmp(&b.team))
        });

        Ok(SeasonProjection {
            requested_trials: options.trials,
            completed_trials: completed,
            interrupted,
            remaining_fixtures: self.fixtures.len(),
            results: self.teams.iter().cloned().zip(results).collect(),
            teams,
        })
    }

    fn summarize(&self, team: usize, result: &SimulationResult, trials: usize) -> TeamProjection {
        let n = trials as f64;

        let expected_position = result
            .position_counts
            .iter()
            .enumerate()
            .map(|(i, &count)| (i + 1) as f64 * count as f64)
            .sum::<f64>()
            / n;

        let mut most_likely_position = 1;
        let mut best = 0;
        for (i, &count) in result.position_counts.iter().enumerate() {
            if count > best {
                best = count;
                most_likely_position = i + 1;
            }
        }

        let top: u64 = result
            .position_counts
            .iter()
            .take(self.top_positions)
            .sum();

        let stats = PointsSummary::from_points(&result.points);

        TeamProjection {
            team: self.teams[team].clone(),
            current_position: self.current_positions[team],
            current_points: self.base[team].points,
            expected_position,
            most_likely_position,
            championship_probability: result.count_at(1) as f64 / n,
            top_probability: top as f64 / n,
            expected_points: stats.mean,
            points_std_dev: stats.std_dev,
            points_p10: stats.p10,
            points_p90: stats.p90,
            points_range: stats.range,
        }
    }
}

struct PointsSummary {
    mean: f64,
    std_dev: f64,
    p10: f64,
    p90: f64,
    range: (u32, u32),
}

impl PointsSummary {
    fn from_points(points: &[u32]) -> Self {
        use statrs::statistics::{Data, OrderStatistics, Statistics};

        let min = points.iter().copied().fold(u32::MAX, u32::min);
        let max = points.iter().copied().fold(0, u32::max);
        let values: Vec<f64> = points.iter().map(|&p| p as f64).collect();

        let mean = values.iter().mean();
        let std_dev = if values.len() > 1 {
            values.iter().std_dev()
        } else {
            0.0
        };

        let mut data = Data::new(values);
        PointsSummary {
            mean,
            std_dev,
            p10: data.percentile(10),
            p90: data.percentile(90),
            range: (min, max),
        }
    }
}
