use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeagueError {
    #[error("Invalid rating input: {rating_a}, {rating_b}")]
    InvalidRatingInput { rating_a: f64, rating_b: f64 },

    #[error("Team '{0}' not found")]
    UnknownTeam(String),

    #[error("Team '{0}' already exists")]
    TeamExists(String),

    #[error("Invalid team name: {0}")]
    InvalidTeamName(String),

    #[error("Teams must be different: '{0}'")]
    SameTeam(String),

    #[error("No matches recorded")]
    EmptyHistory,

    #[error("Need at least 2 teams, found {found}")]
    InsufficientTeams { found: usize },

    #[error("Match #{0} not found")]
    MatchNotFound(u32),

    #[error("Trial count must be positive")]
    InvalidTrialCount,

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LeagueError {
    /// Errors the caller can log and carry on from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LeagueError::InvalidRatingInput { .. } | LeagueError::UnknownTeam(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LeagueError>;
