use thiserror::Error;

use crate::messages::Symbol;

/// Errors produced by the noughts protocol and game layers.
#[derive(Debug, Error)]
pub enum NoughtsError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session already has two players: {0}")]
    SessionFull(String),

    #[error("connection already plays in session: {0}")]
    DuplicatePlayer(String),

    #[error("session id already registered: {0}")]
    DuplicateSessionId(String),

    #[error("max sessions ({0}) reached")]
    TooManySessions(usize),

    #[error("action not found or not allowed: {0}")]
    InvalidAction(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("cell {0} is already occupied")]
    CellOccupied(usize),

    #[error("cell {0} is outside the board")]
    InvalidCell(usize),

    #[error("game is not active: {0}")]
    GameNotActive(String),

    #[error("not the turn of player {0}")]
    NotYourTurn(Symbol),

    #[error("connection is not a player in session: {0}")]
    NotAPlayer(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for NoughtsError {
    fn from(e: serde_json::Error) -> Self {
        NoughtsError::Codec(e.to_string())
    }
}

pub type NoughtsResult<T> = Result<T, NoughtsError>;
