/// Events emitted while dispatching a command.
/// The presentation layer consumes these for sound and feedback.

use crate::sim::progression::WinReport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    LetterPlaced { slot: usize },
    LetterRemoved { slot: usize },
    /// Every slot filled, word wrong.
    WrongAttempt,
    HintApplied { slot: usize },
    LevelWon { pack: String, level: usize, report: WinReport },
    LevelSkipped { pack: String, level: usize, report: WinReport },
    PackComplete { pack: String },
    InsufficientFunds { needed: u32, available: u32 },
    AccessDenied { pack: String, level: Option<usize> },
    InvalidLevel { pack: String, level: usize },
    /// Progress could not be written; the action did not happen.
    SaveFailed,
}
