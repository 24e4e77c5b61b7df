/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

use super::{SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::Message;

/// A TestRequest is outstanding; any inbound traffic clears it.
#[derive(Debug)]
pub struct PendingTimeoutState {
    inner: Box<SessionState>,
}

impl PendingTimeoutState {
    /// Wraps the logged-on state that sent the TestRequest.
    #[must_use]
    pub fn new(inner: SessionState) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Returns the state that resumes once the counterparty answers.
    #[must_use]
    pub fn inner(&self) -> &SessionState {
        &self.inner
    }
}

impl StateHandler for PendingTimeoutState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        self.inner.handle(session, msg)
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::PeerTimeout => {
                session.log.on_event("Session Timeout");
                SessionState::latent()
            }
            SessionEvent::NeedHeartbeat => {
                if let Err(e) = session.send(Session::build_heartbeat(None)) {
                    return session.handle_state_error(&e);
                }
                SessionState::PendingTimeout(self)
            }
            SessionEvent::LogonTimeout | SessionEvent::LogoutTimeout => {
                SessionState::PendingTimeout(self)
            }
        }
    }

    fn on_stop(self, session: &mut Session) -> SessionState {
        self.inner.on_stop(session)
    }

    fn name(&self) -> &'static str {
        "Pending Timeout"
    }

    fn is_logged_on(&self) -> bool {
        self.inner.is_logged_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, inbound};
    use fixstate_store::SequenceStore;
    use fixstate_core::message::MsgType;

    fn pending() -> Harness {
        let mut h = Harness::initiator();
        h.logon();
        h.session.dispatch_timeout(SessionEvent::PeerTimeout);
        assert_eq!(h.session.state().name(), "Pending Timeout");
        h.outbound.clear();
        h
    }

    #[test]
    fn test_traffic_clears_pending() {
        let mut h = pending();
        h.session.dispatch_message(&inbound(MsgType::Heartbeat, 2));

        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 3);
    }

    #[test]
    fn test_second_peer_timeout_disconnects() {
        let mut h = pending();
        h.session.dispatch_timeout(SessionEvent::PeerTimeout);

        assert_eq!(h.session.state().name(), "Latent State");
        assert!(h.log.contains("Session Timeout"));
        assert_eq!(h.app.logouts(), 1);
    }

    #[test]
    fn test_heartbeat_keeps_pending() {
        let mut h = pending();
        h.session.dispatch_timeout(SessionEvent::NeedHeartbeat);

        assert_eq!(h.session.state().name(), "Pending Timeout");
        assert!(h.outbound.last().unwrap().is_msg_type(&MsgType::Heartbeat));
    }

    #[test]
    fn test_stop_delegates() {
        let mut h = pending();
        h.session.stop();

        assert_eq!(h.session.state().name(), "Logout State");
        assert!(h.outbound.last().unwrap().is_msg_type(&MsgType::Logout));
    }
}
