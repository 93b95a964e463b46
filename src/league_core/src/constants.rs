/// Rating assigned to a team on its first appearance
pub const INITIAL_RATING: f64 = 1500.0;

/// K-factor once both teams are established
pub const K_FACTOR_BASE: f64 = 40.0;

/// K-factor for two brand new teams
pub const K_FACTOR_EARLY: f64 = 50.0;

/// Average match count at which the K-factor settles at the base value
pub const EARLY_MATCHES_THRESHOLD: u32 = 5;

/// Rating bonus for the home side
pub const HOME_ADVANTAGE: f64 = 60.0;

/// K-factor multipliers indexed by goal difference minus one.
/// Larger differences use the last entry.
pub const GOAL_DIFF_MULTIPLIERS: [f64; 5] = [1.0, 1.3, 1.5, 1.65, 1.75];

/// Elo logistic scale (rating points per factor of ten in odds)
pub const ELO_SCALE: f64 = 400.0;

/// League points for a win, draw and loss
pub const POINTS_WIN: u32 = 3;
pub const POINTS_DRAW: u32 = 1;
pub const POINTS_LOSS: u32 = 0;

/// Goals scored by the winning side of a simulated match
pub const WINNER_GOALS: [u32; 5] = [1, 2, 3, 4, 5];
pub const WINNER_GOAL_WEIGHTS: [u32; 5] = [30, 35, 20, 10, 5];

/// Goals scored by the losing side of a simulated match
pub const LOSER_GOALS: [u32; 3] = [0, 1, 2];
pub const LOSER_GOAL_WEIGHTS: [u32; 3] = [50, 35, 15];

/// Goals per side in a simulated draw
pub const DRAW_GOALS: [u32; 4] = [0, 1, 2, 3];
pub const DRAW_GOAL_WEIGHTS: [u32; 4] = [20, 40, 30, 10];

/// Monte Carlo trials per season projection
pub const DEFAULT_TRIALS: usize = 100_000;

/// Cut-off for the "top N" finishing probability
pub const TOP_POSITIONS: usize = 5;
