/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Logged-on state and the message processing shared by every logged-on state.

use super::{LogoutState, PendingTimeoutState, SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use crate::timer::generate_test_req_id;
use crate::validation::{LogonOutcome, MessageFault, SeqMismatch, SessionReject};
use fixstate_core::error::FixError;
use fixstate_core::field::tags;
use fixstate_core::message::{Message, MsgType};
use fixstate_core::types::Timestamp;
use fixstate_store::{MessageStore, SequenceStore};

/// Logged on and exchanging normal traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct InSessionState;

impl StateHandler for InSessionState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        match process(session, msg, false) {
            Processed::Handled => SessionState::InSession(self),
            Processed::TooHigh(mismatch) => match session.handle_target_too_high(&mismatch) {
                Ok(resend) => SessionState::Resend(resend.with_stashed(msg.clone())),
                Err(e) => session.handle_state_error(&e),
            },
            Processed::Transition(next) => next,
        }
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        logged_on_timeout(session, event, SessionState::InSession(self))
    }

    fn on_stop(self, session: &mut Session) -> SessionState {
        logged_on_stop(session)
    }

    fn name(&self) -> &'static str {
        "In Session"
    }

    fn is_logged_on(&self) -> bool {
        true
    }
}

/// Result of processing one message in a logged-on state.
#[derive(Debug)]
pub(crate) enum Processed {
    /// The message was dealt with; the caller keeps its state.
    Handled,
    /// The message is ahead of the expected sequence number.
    TooHigh(SeqMismatch),
    /// The session must move to this state.
    Transition(SessionState),
}

/// Processes one message for a logged-on state.
///
/// `logout_sent` is true while waiting for the answer to our own Logout, in
/// which case an inbound Logout is that answer and is not replied to.
pub(crate) fn process(session: &mut Session, msg: &Message, logout_sent: bool) -> Processed {
    let msg_type = match msg.msg_type() {
        Ok(t) => t,
        Err(e) => return process_fault(session, msg, SessionReject::from(e).into()),
    };

    match msg_type {
        MsgType::Logon => handle_logon(session, msg),
        MsgType::Logout => handle_logout(session, msg, logout_sent),
        MsgType::ResendRequest => handle_resend_request(session, msg),
        MsgType::SequenceReset => handle_sequence_reset(session, msg),
        MsgType::TestRequest => handle_test_request(session, msg),
        _ => match session.verify(msg, true, true) {
            Ok(()) => consume(session),
            Err(fault) => process_fault(session, msg, fault),
        },
    }
}

fn handle_logon(session: &mut Session, msg: &Message) -> Processed {
    match session.validate_logon(msg) {
        Ok(LogonOutcome::Accepted) => Processed::Handled,
        Ok(LogonOutcome::TargetTooHigh(mismatch)) => Processed::TooHigh(mismatch),
        Ok(LogonOutcome::Rejected(reason)) => logout(session, &reason, Some(msg)),
        Ok(LogonOutcome::TargetTooLow(mismatch)) => {
            logout(session, &mismatch.to_string(), Some(msg))
        }
        Err(e) => Processed::Transition(session.handle_state_error(&e)),
    }
}

fn handle_logout(session: &mut Session, msg: &Message, logout_sent: bool) -> Processed {
    if let Err(fault) = session.verify(msg, false, false) {
        return process_fault(session, msg, fault);
    }

    if logout_sent {
        session.log.on_event("Received logout response");
    } else {
        session.log.on_event("Received logout request");
        session.log.on_event("Sending logout response");
        if let Err(e) = session.send_in_reply_to(Session::build_logout(""), Some(msg)) {
            session.log.on_error(&e);
        }
    }

    if let Err(e) = session.store.incr_next_target_msg_seq_num() {
        session.log.on_error(&e);
    }
    if session.config.reset_on_logout
        && let Err(e) = session.store.reset()
    {
        session.log.on_error(&e);
    }
    Processed::Transition(SessionState::latent())
}

fn handle_resend_request(session: &mut Session, msg: &Message) -> Processed {
    if let Err(fault) = session.verify(msg, false, false) {
        return process_fault(session, msg, fault);
    }

    let begin = match msg.body.get_uint(tags::BEGIN_SEQ_NO) {
        Ok(v) => v,
        Err(e) => return process_fault(session, msg, SessionReject::from(e).into()),
    };
    let requested_end = match msg.body.get_uint(tags::END_SEQ_NO) {
        Ok(v) => v,
        Err(e) => return process_fault(session, msg, SessionReject::from(e).into()),
    };
    session.log.on_eventf(format_args!(
        "Received ResendRequest FROM: {begin} TO: {requested_end}"
    ));

    let last_sent = session.store.next_sender_msg_seq_num().saturating_sub(1);
    let end = if requested_end == 0 || requested_end > last_sent {
        last_sent
    } else {
        requested_end
    };
    if let Err(e) = session.resend_messages(begin, end, msg) {
        return Processed::Transition(session.handle_state_error(&e));
    }

    let received = match msg.seq_num() {
        Ok(seq) => seq,
        Err(e) => return Processed::Transition(session.handle_state_error(&e.into())),
    };
    let expected = session.store.next_target_msg_seq_num();
    if received > expected {
        return Processed::TooHigh(SeqMismatch::new(expected, received));
    }
    if received == expected {
        return consume(session);
    }
    Processed::Handled
}

fn handle_sequence_reset(session: &mut Session, msg: &Message) -> Processed {
    let gap_fill = matches!(msg.body.get_bool(tags::GAP_FILL_FLAG), Ok(true));
    if let Err(fault) = session.verify(msg, gap_fill, gap_fill) {
        return process_fault(session, msg, fault);
    }

    let new_seq_no = match msg.body.get_uint(tags::NEW_SEQ_NO) {
        Ok(v) => v,
        Err(e) => return process_fault(session, msg, SessionReject::from(e).into()),
    };
    let expected = session.store.next_target_msg_seq_num();
    session.log.on_eventf(format_args!(
        "Received SequenceReset FROM: {expected} TO: {new_seq_no}"
    ));

    if new_seq_no > expected {
        if let Err(e) = session.store.set_next_target_msg_seq_num(new_seq_no) {
            return Processed::Transition(session.handle_state_error(&e.into()));
        }
    } else if new_seq_no < expected {
        let reject = SessionReject::value_is_incorrect(Some(tags::NEW_SEQ_NO));
        if let Err(e) = session.send_reject(msg, &reject) {
            return Processed::Transition(session.handle_state_error(&e));
        }
    }
    Processed::Handled
}

fn handle_test_request(session: &mut Session, msg: &Message) -> Processed {
    if let Err(fault) = session.verify(msg, true, true) {
        return process_fault(session, msg, fault);
    }

    match msg.body.get_str(tags::TEST_REQ_ID) {
        Ok(id) => {
            let heartbeat = Session::build_heartbeat(Some(id));
            if let Err(e) = session.send_in_reply_to(heartbeat, Some(msg)) {
                return Processed::Transition(session.handle_state_error(&e));
            }
        }
        Err(_) => session.log.on_event("Test Request with no testRequestID"),
    }
    consume(session)
}

fn process_fault(session: &mut Session, msg: &Message, fault: MessageFault) -> Processed {
    match fault {
        MessageFault::TargetTooHigh(mismatch) => Processed::TooHigh(mismatch),
        MessageFault::TargetTooLow(mismatch) => handle_too_low(session, msg, &mismatch),
        MessageFault::IncorrectBeginString => logout(session, "Incorrect BeginString", None),
        MessageFault::Reject(reject) => {
            if let Err(e) = session.send_reject(msg, &reject) {
                return Processed::Transition(session.handle_state_error(&e));
            }
            if let Err(e) = session.store.incr_next_target_msg_seq_num() {
                return Processed::Transition(session.handle_state_error(&e.into()));
            }
            if reject.reason.is_fatal() {
                return logout(session, &reject.text, None);
            }
            Processed::Handled
        }
    }
}

/// A message below the expected sequence number is only acceptable as a
/// possible duplicate with a consistent OrigSendingTime; it is never consumed.
fn handle_too_low(session: &mut Session, msg: &Message, mismatch: &SeqMismatch) -> Processed {
    let poss_dup = matches!(msg.header.get_bool(tags::POSS_DUP_FLAG), Ok(true));
    if !poss_dup {
        return logout(session, &mismatch.to_string(), None);
    }

    let orig = match msg.header.get_str(tags::ORIG_SENDING_TIME) {
        Ok(v) => Timestamp::parse_fix(v, tags::ORIG_SENDING_TIME),
        Err(e) => Err(e),
    };
    let sent = msg
        .header
        .get_str(tags::SENDING_TIME)
        .and_then(|v| Timestamp::parse_fix(v, tags::SENDING_TIME));

    let result = match (orig, sent) {
        (Err(e), _) | (_, Err(e)) => session.send_reject(msg, &SessionReject::from(e)),
        (Ok(orig), Ok(sent)) if sent < orig => {
            let reject = SessionReject::sending_time_accuracy_problem();
            match session.send_reject(msg, &reject) {
                Ok(()) => return logout(session, &reject.text, None),
                Err(e) => Err(e),
            }
        }
        _ => Ok(()),
    };
    match result {
        Ok(()) => Processed::Handled,
        Err(e) => Processed::Transition(session.handle_state_error(&e)),
    }
}

fn logout(session: &mut Session, reason: &str, in_reply_to: Option<&Message>) -> Processed {
    match session.initiate_logout(reason, in_reply_to) {
        Ok(()) => Processed::Transition(SessionState::Logout(LogoutState)),
        Err(e) => Processed::Transition(session.handle_state_error(&e)),
    }
}

fn consume(session: &mut Session) -> Processed {
    match session.store.incr_next_target_msg_seq_num() {
        Ok(()) => Processed::Handled,
        Err(e) => Processed::Transition(session.handle_state_error(&FixError::from(e))),
    }
}

/// Timer handling shared by the logged-on states.
pub(crate) fn logged_on_timeout(
    session: &mut Session,
    event: SessionEvent,
    current: SessionState,
) -> SessionState {
    match event {
        SessionEvent::NeedHeartbeat => {
            if let Err(e) = session.send(Session::build_heartbeat(None)) {
                return session.handle_state_error(&e);
            }
            current
        }
        SessionEvent::PeerTimeout => {
            let test_req_id = generate_test_req_id();
            if let Err(e) = session.send(Session::build_test_request(&test_req_id)) {
                return session.handle_state_error(&e);
            }
            session.log.on_event("Sent test request TEST");
            SessionState::PendingTimeout(PendingTimeoutState::new(current))
        }
        SessionEvent::LogonTimeout | SessionEvent::LogoutTimeout => current,
    }
}

/// Stop handling shared by the logged-on states.
pub(crate) fn logged_on_stop(session: &mut Session) -> SessionState {
    match session.initiate_logout("", None) {
        Ok(()) => SessionState::Logout(LogoutState),
        Err(e) => session.handle_state_error(&e),
    }
}
