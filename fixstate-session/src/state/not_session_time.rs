/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

use super::{SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::Message;

/// The schedule is closed; connections are refused until it reopens.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotSessionTimeState;

impl StateHandler for NotSessionTimeState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        session.log.on_eventf(format_args!(
            "Invalid Session State: Unexpected Msg {msg} while in NotSessionTime state"
        ));
        SessionState::NotSessionTime(self)
    }

    fn on_timeout(self, _session: &mut Session, _event: SessionEvent) -> SessionState {
        SessionState::NotSessionTime(self)
    }

    fn on_stop(self, _session: &mut Session) -> SessionState {
        SessionState::NotSessionTime(self)
    }

    fn name(&self) -> &'static str {
        "Not Session Time"
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn is_session_time(&self) -> bool {
        false
    }
}
