/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Gap recovery.
//!
//! After a ResendRequest the session keeps processing traffic normally. Messages
//! still ahead of the expected sequence number are stashed; once the requested
//! range is filled they are replayed in order.

use super::in_session::{Processed, logged_on_stop, logged_on_timeout, process};
use super::{InSessionState, SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use fixstate_core::message::{Message, MsgType};
use fixstate_store::SequenceStore;
use std::collections::BTreeMap;

/// Logged on, waiting for the counterparty to fill a gap.
#[derive(Debug, Clone, Default)]
pub struct ResendState {
    stash: BTreeMap<u64, Message>,
    current_range_end: u64,
    range_end: u64,
}

impl ResendState {
    /// Creates a resend state for a request ending at `current_range_end`
    /// within a gap ending at `range_end`.
    #[must_use]
    pub fn new(current_range_end: u64, range_end: u64) -> Self {
        Self {
            stash: BTreeMap::new(),
            current_range_end,
            range_end,
        }
    }

    /// Returns the end of the outstanding request.
    #[must_use]
    pub const fn current_range_end(&self) -> u64 {
        self.current_range_end
    }

    /// Returns the end of the whole gap.
    #[must_use]
    pub const fn range_end(&self) -> u64 {
        self.range_end
    }

    /// Returns the number of messages waiting for replay.
    #[must_use]
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }

    /// Adds a message to the replay stash.
    #[must_use]
    pub(crate) fn with_stashed(mut self, msg: Message) -> Self {
        if let Ok(seq) = msg.seq_num() {
            self.stash.insert(seq, msg);
        }
        self
    }

    fn stash_message(&mut self, session: &Session, msg: &Message) {
        let Ok(seq) = msg.seq_num() else {
            return;
        };
        if self.stash.len() >= session.config.max_stashed_messages
            && !self.stash.contains_key(&seq)
        {
            session
                .log
                .on_eventf(format_args!("Queue full, dropping message: {seq}"));
            return;
        }
        self.stash.insert(seq, msg.clone());
    }

    fn advance(mut self, session: &mut Session) -> SessionState {
        let next = session.store.next_target_msg_seq_num();

        if self.current_range_end < self.range_end && next > self.current_range_end {
            return match session.send_resend_request(next, self.range_end) {
                Ok(chunk) => {
                    self.current_range_end = chunk.current_range_end;
                    SessionState::Resend(self)
                }
                Err(e) => session.handle_state_error(&e),
            };
        }
        if self.range_end >= next {
            return SessionState::Resend(self);
        }
        self.replay(session)
    }

    fn replay(mut self, session: &mut Session) -> SessionState {
        while let Some((seq, msg)) = self.stash.pop_first() {
            let next = session.store.next_target_msg_seq_num();
            if seq < next {
                continue;
            }
            session
                .log
                .on_eventf(format_args!("Processing queued message: {seq}"));

            if msg.is_msg_type(&MsgType::Logon) {
                if let Err(e) = session.store.incr_next_target_msg_seq_num() {
                    return session.handle_state_error(&e.into());
                }
                continue;
            }

            match InSessionState.handle(session, &msg) {
                SessionState::InSession(_) => {}
                SessionState::Resend(mut resend) => {
                    resend.stash.append(&mut self.stash);
                    return SessionState::Resend(resend);
                }
                other => {
                    if !self.stash.is_empty() {
                        session.log.on_eventf(format_args!(
                            "Discarding {} queued messages",
                            self.stash.len()
                        ));
                    }
                    return other;
                }
            }
        }
        SessionState::InSession(InSessionState)
    }
}

impl StateHandler for ResendState {
    fn handle(mut self, session: &mut Session, msg: &Message) -> SessionState {
        match process(session, msg, false) {
            Processed::Handled => self.advance(session),
            Processed::TooHigh(_) => {
                self.stash_message(session, msg);
                SessionState::Resend(self)
            }
            Processed::Transition(next) => next,
        }
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        logged_on_timeout(session, event, SessionState::Resend(self))
    }

    fn on_stop(self, session: &mut Session) -> SessionState {
        logged_on_stop(session)
    }

    fn name(&self) -> &'static str {
        "Resend"
    }

    fn is_logged_on(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, TestApplication, inbound};
    use fixstate_core::field::tags;

    fn app(seq: u64) -> Message {
        inbound(MsgType::App("D".to_string()), seq)
    }

    fn gap_fill(seq: u64, new_seq_no: u64) -> Message {
        let mut msg = inbound(MsgType::SequenceReset, seq);
        msg.header.set_bool(tags::POSS_DUP_FLAG, true);
        msg.header
            .set_str(tags::ORIG_SENDING_TIME, "20200101-00:00:00.000");
        msg.body.set_bool(tags::GAP_FILL_FLAG, true);
        msg.body.set_uint(tags::NEW_SEQ_NO, new_seq_no);
        msg
    }

    fn in_resend(h: &mut Harness, trigger: u64) {
        h.logon();
        h.session.dispatch_message(&app(trigger));
        assert_eq!(h.session.state().name(), "Resend");
        h.outbound.clear();
    }

    #[test]
    fn test_stash_replayed_after_gap_filled() {
        let mut h = Harness::initiator();
        in_resend(&mut h, 5);

        h.session.dispatch_message(&app(6));
        h.session.dispatch_message(&app(2));
        h.session.dispatch_message(&app(3));
        assert_eq!(h.session.state().name(), "Resend");

        h.session.dispatch_message(&app(4));

        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 7);
        assert_eq!(h.app.app_messages(), 5);
        assert!(h.log.contains("Processing queued message: 5"));
        assert!(h.log.contains("Processing queued message: 6"));
    }

    #[test]
    fn test_gap_fill_completes_recovery() {
        let mut h = Harness::initiator();
        in_resend(&mut h, 5);

        h.session.dispatch_message(&gap_fill(2, 5));

        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 6);
        assert_eq!(h.app.app_messages(), 1);
    }

    #[test]
    fn test_chunked_requests() {
        let config = crate::testing::initiator_config().with_resend_request_chunk_size(2);
        let mut h = Harness::with_config(config);
        in_resend(&mut h, 7);

        match h.session.state() {
            SessionState::Resend(r) => {
                assert_eq!(r.current_range_end(), 3);
                assert_eq!(r.range_end(), 6);
                assert_eq!(r.stashed(), 1);
            }
            other => panic!("unexpected {other}"),
        }

        h.session.dispatch_message(&app(2));
        assert!(h.outbound.messages().is_empty());
        h.session.dispatch_message(&app(3));

        let request = h.outbound.last().unwrap();
        assert!(request.is_msg_type(&MsgType::ResendRequest));
        assert_eq!(request.body.get_uint(tags::BEGIN_SEQ_NO).unwrap(), 4);
        assert_eq!(request.body.get_uint(tags::END_SEQ_NO).unwrap(), 5);
        assert_eq!(h.session.state().name(), "Resend");

        h.session.dispatch_message(&app(4));
        h.session.dispatch_message(&app(5));
        let request = h.outbound.last().unwrap();
        assert_eq!(request.body.get_uint(tags::BEGIN_SEQ_NO).unwrap(), 6);
        assert_eq!(request.body.get_uint(tags::END_SEQ_NO).unwrap(), 6);

        h.session.dispatch_message(&app(6));
        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 8);
    }

    #[test]
    fn test_second_gap_in_stash() {
        let mut h = Harness::initiator();
        in_resend(&mut h, 3);
        h.session.dispatch_message(&app(5));

        h.session.dispatch_message(&app(2));

        assert_eq!(h.session.state().name(), "Resend");
        assert_eq!(h.store.next_target_msg_seq_num(), 4);
        let request = h.outbound.last().unwrap();
        assert_eq!(request.body.get_uint(tags::BEGIN_SEQ_NO).unwrap(), 4);
        assert_eq!(request.body.get_uint(tags::END_SEQ_NO).unwrap(), 4);

        h.session.dispatch_message(&app(4));
        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 6);
    }

    #[test]
    fn test_stashed_logon_only_consumes() {
        let mut h = Harness::initiator();
        h.connect();
        h.session.dispatch_message(&inbound(MsgType::Logon, 3));
        assert_eq!(h.session.state().name(), "Resend");
        assert_eq!(h.app.logons(), 1);

        h.session.dispatch_message(&app(1));
        h.session.dispatch_message(&app(2));

        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 4);
        assert_eq!(h.app.logons(), 1);
    }

    #[test]
    fn test_stash_is_bounded() {
        let config = crate::testing::initiator_config().with_max_stashed_messages(2);
        let mut h = Harness::with_config(config);
        in_resend(&mut h, 5);

        h.session.dispatch_message(&app(6));
        h.session.dispatch_message(&app(1_000_000));
        match h.session.state() {
            SessionState::Resend(r) => assert_eq!(r.stashed(), 2),
            other => panic!("unexpected {other}"),
        }
        assert!(h.log.contains("Queue full, dropping message: 1000000"));

        h.session.dispatch_message(&app(2));
        h.session.dispatch_message(&app(3));
        h.session.dispatch_message(&app(4));
        assert_eq!(h.session.state().name(), "In Session");
        assert_eq!(h.store.next_target_msg_seq_num(), 7);
    }

    #[test]
    fn test_replay_logout_discards_rest_of_stash() {
        let app_handler = TestApplication::rejecting_fatally("X");
        let mut h = Harness::with_application(crate::testing::initiator_config(), app_handler);
        in_resend(&mut h, 3);
        h.session
            .dispatch_message(&inbound(MsgType::App("X".to_string()), 4));
        h.session.dispatch_message(&app(5));

        h.session.dispatch_message(&app(2));

        assert_eq!(h.session.state().name(), "Logout State");
        assert!(h.log.contains("Processing queued message: 4"));
        assert!(h.log.contains("Discarding 1 queued messages"));
        assert_eq!(h.store.next_target_msg_seq_num(), 5);
        assert!(h.outbound.last().unwrap().is_msg_type(&MsgType::Logout));
    }

    #[test]
    fn test_peer_timeout_wraps_resend() {
        let mut h = Harness::initiator();
        in_resend(&mut h, 5);

        h.session.dispatch_timeout(SessionEvent::PeerTimeout);
        assert_eq!(h.session.state().name(), "Pending Timeout");

        h.session.dispatch_message(&app(2));
        assert_eq!(h.session.state().name(), "Resend");
    }

    #[test]
    fn test_logout_during_resend() {
        let mut h = Harness::initiator();
        in_resend(&mut h, 5);

        h.session.dispatch_message(&inbound(MsgType::Logout, 2));

        assert_eq!(h.session.state().name(), "Latent State");
        assert_eq!(h.app.logouts(), 1);
    }
}
