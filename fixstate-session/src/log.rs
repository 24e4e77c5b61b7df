/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session event log.
//!
//! Every abnormal path in the state machine reports through an [`EventLog`]
//! before transitioning. [`TracingLog`] forwards to `tracing` with the session
//! identity attached; [`NullLog`] discards everything.

use fixstate_core::types::SessionId;
use std::fmt;
use tracing::{debug, error, info};

/// Sink for session traffic and events.
pub trait EventLog: Send + Sync {
    /// Records an inbound frame.
    fn on_incoming(&self, frame: &[u8]);

    /// Records an outbound frame.
    fn on_outgoing(&self, frame: &[u8]);

    /// Records a session event.
    fn on_event(&self, text: &str);

    /// Records a formatted session event.
    fn on_eventf(&self, args: fmt::Arguments<'_>) {
        self.on_event(&args.to_string());
    }

    /// Records an error that was handled locally.
    fn on_error(&self, err: &dyn std::error::Error);
}

/// Renders a frame with SOH shown as `|`.
fn printable(frame: &[u8]) -> String {
    String::from_utf8_lossy(frame).replace('\x01', "|")
}

/// Event log backed by `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLog {
    session: String,
}

impl TracingLog {
    /// Creates a log tagging every event with the session identity.
    #[must_use]
    pub fn new(session_id: &SessionId) -> Self {
        Self {
            session: session_id.to_string(),
        }
    }
}

impl EventLog for TracingLog {
    fn on_incoming(&self, frame: &[u8]) {
        debug!(session = %self.session, direction = "in", msg = %printable(frame));
    }

    fn on_outgoing(&self, frame: &[u8]) {
        debug!(session = %self.session, direction = "out", msg = %printable(frame));
    }

    fn on_event(&self, text: &str) {
        info!(session = %self.session, "{text}");
    }

    fn on_eventf(&self, args: fmt::Arguments<'_>) {
        info!(session = %self.session, "{args}");
    }

    fn on_error(&self, err: &dyn std::error::Error) {
        error!(session = %self.session, error = %err, "session error");
    }
}

/// Event log that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl EventLog for NullLog {
    fn on_incoming(&self, _frame: &[u8]) {}

    fn on_outgoing(&self, _frame: &[u8]) {}

    fn on_event(&self, _text: &str) {}

    fn on_eventf(&self, _args: fmt::Arguments<'_>) {}

    fn on_error(&self, _err: &dyn std::error::Error) {}
}
