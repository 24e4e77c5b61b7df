/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

use super::{SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::Message;

/// No connection is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatentState;

impl StateHandler for LatentState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        session.log.on_eventf(format_args!(
            "Invalid Session State: Unexpected Msg {msg} while in Latent state"
        ));
        SessionState::Latent(self)
    }

    fn on_timeout(self, _session: &mut Session, _event: SessionEvent) -> SessionState {
        SessionState::Latent(self)
    }

    fn on_stop(self, _session: &mut Session) -> SessionState {
        SessionState::Latent(self)
    }

    fn name(&self) -> &'static str {
        "Latent State"
    }

    fn is_connected(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, inbound};
    use fixstate_store::SequenceStore;
    use fixstate_core::message::MsgType;

    #[test]
    fn test_latent_ignores_messages() {
        let mut h = Harness::initiator();
        h.session.dispatch_message(&inbound(MsgType::Heartbeat, 1));

        assert_eq!(h.session.state().name(), "Latent State");
        assert!(h.outbound.messages().is_empty());
        assert!(h.log.contains("Unexpected Msg"));
        assert_eq!(h.store.next_target_msg_seq_num(), 1);
    }

    #[test]
    fn test_latent_flags() {
        let state = LatentState;
        assert!(!state.is_connected());
        assert!(!state.is_logged_on());
        assert!(state.is_session_time());
    }
}
