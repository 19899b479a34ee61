/// Error taxonomy shared by the catalog, the progress store and the router.

use thiserror::Error;

use crate::domain::puzzle::PuzzleError;

#[derive(Error, Debug)]
pub enum GameError {
    /// Catalog or word-list source missing or malformed. Recoverable:
    /// the router shows a degraded screen.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// No usable answer for the requested level.
    #[error("Invalid level data: {0}")]
    InvalidLevelData(String),

    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },

    #[error("Access denied: {pack} level {}", level + 1)]
    AccessDenied { pack: String, level: usize },

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GameResult<T> = Result<T, GameError>;
