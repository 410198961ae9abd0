//! Collaborator contracts consumed by the runner
//!
//! High-score storage and score reporting are best-effort: the runner logs
//! every failure and carries on with its in-memory values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of an external collaborator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Score rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parse(err.to_string())
    }
}

/// Result type alias for collaborator calls
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Local key-value high-score storage
pub trait HighScoreStore {
    /// Stored best for `key`; `None` if nothing was stored yet
    fn load_high_score(&self, key: &str) -> Result<Option<u64>>;

    fn persist_high_score(&mut self, key: &str, value: u64) -> Result<()>;
}

/// Answer of the score backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub success: bool,
    /// Cumulative user score after the report
    pub new_score: u64,
    /// Indices of every game now unlocked
    pub unlocked_games: Vec<u32>,
}

/// Backend that accumulates a user's score across games
pub trait ScoreReporter {
    fn report_score(&mut self, game_index: u32, delta: i64) -> Result<ScoreReport>;
}
