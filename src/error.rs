//! Error types for redlite

use thiserror::Error;
use std::io;

/// Result type alias for redlite operations
pub type Result<T> = std::result::Result<T, RedliteError>;

/// Custom error types for redlite
#[derive(Error, Debug)]
pub enum RedliteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Too few arguments; the payload is the usage line sent back to the client.
    #[error("Usage {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Protocol parse error: {0}")]
    Protocol(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("WAL error: {0}")]
    Wal(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for RedliteError {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        RedliteError::Protocol(format!("Parse error: {:?}", err))
    }
}
