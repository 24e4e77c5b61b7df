/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

use super::in_session::{Processed, process};
use super::{SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::Message;

/// Our Logout was sent; waiting for the counterparty's.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogoutState;

impl StateHandler for LogoutState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        match process(session, msg, true) {
            Processed::Transition(next) if !next.is_connected() => next,
            Processed::Handled | Processed::TooHigh(_) | Processed::Transition(_) => {
                SessionState::Logout(self)
            }
        }
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        if event == SessionEvent::LogoutTimeout {
            session.log.on_event("Timed out waiting for logout response");
            return SessionState::latent();
        }
        SessionState::Logout(self)
    }

    fn on_stop(self, _session: &mut Session) -> SessionState {
        SessionState::Logout(self)
    }

    fn name(&self) -> &'static str {
        "Logout State"
    }
}
