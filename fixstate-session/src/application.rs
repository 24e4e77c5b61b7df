/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Application callback trait.
//!
//! The session notifies the business application of lifecycle changes and
//! hands it every verified inbound message.

use crate::validation::SessionReject;
use fixstate_core::message::Message;
use fixstate_core::types::SessionId;

/// Business callbacks for one or more sessions.
///
/// Callbacks run on the session's actor; long work should be handed off.
pub trait Application: Send + Sync {
    /// Called once when a session is created.
    fn on_create(&self, _session_id: &SessionId) {}

    /// Called when the session becomes ready for normal traffic.
    fn on_logon(&self, session_id: &SessionId);

    /// Called when a logged-on session stops being logged on.
    fn on_logout(&self, session_id: &SessionId);

    /// Called before an administrative message is sent, e.g. to add credentials to a Logon.
    fn to_admin(&self, _msg: &mut Message, _session_id: &SessionId) {}

    /// Called for each verified inbound administrative message.
    ///
    /// # Errors
    /// Returning a `SessionReject` rejects the message; for a Logon it refuses the logon.
    fn from_admin(&self, _msg: &Message, _session_id: &SessionId) -> Result<(), SessionReject> {
        Ok(())
    }

    /// Called for each verified inbound application message.
    ///
    /// # Errors
    /// Returning a `SessionReject` sends a session-level Reject for the message.
    fn from_app(&self, _msg: &Message, _session_id: &SessionId) -> Result<(), SessionReject> {
        Ok(())
    }
}

/// Application that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpApplication;

impl Application for NoOpApplication {
    fn on_logon(&self, _session_id: &SessionId) {}

    fn on_logout(&self, _session_id: &SessionId) {}
}
