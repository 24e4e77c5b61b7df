/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Engine error types.

use fixstate_core::error::FixError;
use thiserror::Error;

/// Errors raised while wiring a session to a connection.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Connecting or accepting failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection attempt did not complete in time.
    #[error("connect timed out")]
    Timeout,

    /// The session refused the request.
    #[error(transparent)]
    Fix(#[from] FixError),

    /// The session actor has already stopped.
    #[error("session actor stopped")]
    Closed,

    /// The session actor panicked.
    #[error("session actor failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}
