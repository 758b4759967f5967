//! Error types for the learning engine

use std::path::PathBuf;

use thiserror::Error;

use crate::board::Board;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Both sides hold three in a row. Only a bug elsewhere can produce this.
    #[error("invalid board {board}: wins for both X and O")]
    InvalidBoard { board: Board },

    #[error("no legal moves from board {board}")]
    NoLegalMoves { board: Board },

    #[error("missing table entry for board {board} (move {position:?})")]
    MissingTableEntry {
        board: Board,
        position: Option<usize>,
    },

    #[error("illegal move: position {position} is not playable on board {board}")]
    IllegalMove { board: Board, position: usize },

    #[error("invalid cell value {value} at position {position} (expected -1, 0 or 1)")]
    InvalidCell { position: usize, value: i8 },

    #[error("trajectory has no boards")]
    EmptyTrajectory,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("external input agents need a move source")]
    MissingMoveSource,

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A move source could not talk to its input or output.
    #[error("move input failed: {0}")]
    Input(#[from] std::io::Error),

    /// The move source has no more moves to give, e.g. end of file on stdin.
    #[error("move input closed")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
