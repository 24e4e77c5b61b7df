/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session states.
//!
//! The session is always in exactly one [`SessionState`]. Each variant wraps a
//! handler implementing [`StateHandler`]; every operation consumes the handler
//! and returns the state the session moves to, which may be the same one.
//!
//! ```text
//!              connect
//!   Latent ─────────────> Logon ──accepted──> InSession <──> Resend
//!     ^                     │                   │   │
//!     │   timeout/reject    │                   │   └──> PendingTimeout
//!     └─────────────────────┘                   v
//!     ^                                       Logout
//!     └───────────── response/timeout ──────────┘
//! ```
//!
//! `NotSessionTime` is entered from any state when the schedule closes.

mod in_session;
mod latent;
mod logon;
mod logout;
mod not_session_time;
mod pending_timeout;
mod resend;

pub use in_session::InSessionState;
pub use latent::LatentState;
pub use logon::LogonState;
pub use logout::LogoutState;
pub use not_session_time::NotSessionTimeState;
pub use pending_timeout::PendingTimeoutState;
pub use resend::ResendState;

use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::Message;
use std::fmt;

/// Behavior of one session state.
pub trait StateHandler: Sized {
    /// Handles an inbound message.
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState;

    /// Handles a timer event.
    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState;

    /// Handles a request to stop the session.
    fn on_stop(self, session: &mut Session) -> SessionState;

    /// Returns the state's display name.
    fn name(&self) -> &'static str;

    /// Returns true if application messages may be sent.
    fn is_logged_on(&self) -> bool {
        false
    }

    /// Returns true if a connection is attached.
    fn is_connected(&self) -> bool {
        true
    }

    /// Returns true unless the schedule is closed.
    fn is_session_time(&self) -> bool {
        true
    }
}

/// The current state of a session.
#[derive(Debug)]
pub enum SessionState {
    /// No connection.
    Latent(LatentState),
    /// Connected, waiting for the logon handshake to complete.
    Logon(LogonState),
    /// Logged on.
    InSession(InSessionState),
    /// Logged on, recovering a gap in inbound sequence numbers.
    Resend(ResendState),
    /// Waiting for the counterparty to answer our Logout.
    Logout(LogoutState),
    /// Waiting for a Heartbeat after sending a TestRequest.
    PendingTimeout(PendingTimeoutState),
    /// Outside the configured schedule.
    NotSessionTime(NotSessionTimeState),
}

macro_rules! dispatch {
    ($state:expr, $inner:ident => $body:expr) => {
        match $state {
            SessionState::Latent($inner) => $body,
            SessionState::Logon($inner) => $body,
            SessionState::InSession($inner) => $body,
            SessionState::Resend($inner) => $body,
            SessionState::Logout($inner) => $body,
            SessionState::PendingTimeout($inner) => $body,
            SessionState::NotSessionTime($inner) => $body,
        }
    };
}

impl SessionState {
    /// Returns the latent state.
    #[must_use]
    pub const fn latent() -> Self {
        Self::Latent(LatentState)
    }
}

impl StateHandler for SessionState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        dispatch!(self, s => s.handle(session, msg))
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        dispatch!(self, s => s.on_timeout(session, event))
    }

    fn on_stop(self, session: &mut Session) -> SessionState {
        dispatch!(self, s => s.on_stop(session))
    }

    fn name(&self) -> &'static str {
        dispatch!(self, s => s.name())
    }

    fn is_logged_on(&self) -> bool {
        dispatch!(self, s => s.is_logged_on())
    }

    fn is_connected(&self) -> bool {
        dispatch!(self, s => s.is_connected())
    }

    fn is_session_time(&self) -> bool {
        dispatch!(self, s => s.is_session_time())
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
