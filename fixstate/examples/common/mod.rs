/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Shared pieces for the fixstate examples.

use fixstate::prelude::*;
use tracing::info;

pub const DEFAULT_PORT: u16 = 9876;

/// Reads the port from `FIX_PORT`.
pub fn port() -> u16 {
    std::env::var("FIX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Initializes logging.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Application that logs every callback.
pub struct LoggingApplication;

impl Application for LoggingApplication {
    fn on_create(&self, session_id: &SessionId) {
        info!(session = %session_id, "created");
    }

    fn on_logon(&self, session_id: &SessionId) {
        info!(session = %session_id, "logon");
    }

    fn on_logout(&self, session_id: &SessionId) {
        info!(session = %session_id, "logout");
    }

    fn from_app(&self, msg: &Message, session_id: &SessionId) -> Result<(), SessionReject> {
        info!(session = %session_id, %msg, "application message");
        Ok(())
    }
}
