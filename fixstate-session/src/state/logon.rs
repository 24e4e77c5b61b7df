/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Logon-pending state.
//!
//! Supervises the interval between sending (or expecting) a Logon and
//! receiving a valid one. A Logout carrying the standard sequence-too-low text
//! is how a counterparty reports that our outbound sequence number is behind;
//! when configured, the session adopts the number the counterparty expects.

use super::{InSessionState, SessionState, StateHandler};
use crate::event::SessionEvent;
use crate::session::Session;
use crate::validation::LogonOutcome;
use fixstate_core::error::DecodeError;
use fixstate_core::field::tags;
use fixstate_core::message::{Message, MsgType};
use regex::Regex;
use std::sync::LazyLock;

static SEQ_TOO_LOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"MsgSeqNum too low, expecting (\d+) but received \d+")
        .expect("sequence mismatch regex is valid")
});

/// Connected, waiting for the logon handshake to complete.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogonState;

impl StateHandler for LogonState {
    fn handle(self, session: &mut Session, msg: &Message) -> SessionState {
        let msg_type = match msg.msg_type() {
            Ok(t) => t,
            Err(e) => return session.handle_state_error(&e.into()),
        };

        match msg_type {
            MsgType::Logout => handle_logout(session, msg),
            MsgType::Logon => handle_logon(session, msg),
            _ => {
                session.log.on_eventf(format_args!(
                    "Invalid Session State: Received Msg {msg} while waiting for Logon"
                ));
                SessionState::latent()
            }
        }
    }

    fn on_timeout(self, session: &mut Session, event: SessionEvent) -> SessionState {
        if event == SessionEvent::LogonTimeout {
            session.log.on_event("Timed out waiting for logon response");
            return SessionState::latent();
        }
        SessionState::Logon(self)
    }

    fn on_stop(self, _session: &mut Session) -> SessionState {
        SessionState::latent()
    }

    fn name(&self) -> &'static str {
        "Logon State"
    }
}

fn handle_logout(session: &mut Session, msg: &Message) -> SessionState {
    session.log.on_eventf(format_args!(
        "Invalid Session State: Received Logout {msg} while waiting for Logon"
    ));

    let text = match msg.body.get_str(tags::TEXT) {
        Ok(text) => text,
        Err(e) => return session.handle_state_error(&e.into()),
    };
    let Some(captures) = SEQ_TOO_LOW.captures(text) else {
        return SessionState::latent();
    };
    if !session.config.logon_force_sender_msg_seq_num {
        return SessionState::latent();
    }

    let expected = &captures[1];
    let seq = match expected.parse::<u64>() {
        Ok(seq) => seq,
        Err(_) => {
            let err = DecodeError::InvalidFieldValue {
                tag: tags::TEXT,
                reason: format!("sequence number {expected} out of range"),
            };
            return session.handle_state_error(&err.into());
        }
    };

    session.log.on_eventf(format_args!(
        "MsgSeqNum too low, forcing NextSenderMsgSeqNum to {seq}"
    ));
    if let Err(e) = session.force_next_sender_msg_seq_num(seq) {
        return session.handle_state_error(&e.into());
    }
    SessionState::latent()
}

fn handle_logon(session: &mut Session, msg: &Message) -> SessionState {
    let outcome = match session.validate_logon(msg) {
        Ok(outcome) => outcome,
        Err(e) => return session.handle_state_error(&e),
    };

    match outcome {
        LogonOutcome::Accepted => {
            session.notify_logon();
            SessionState::InSession(InSessionState)
        }
        LogonOutcome::Rejected(reason) => session.shutdown_with_reason(msg, false, &reason),
        LogonOutcome::TargetTooLow(mismatch) => {
            session.shutdown_with_reason(msg, true, &mismatch.to_string())
        }
        LogonOutcome::TargetTooHigh(mismatch) => {
            session.notify_logon();
            match session.handle_target_too_high(&mismatch) {
                Ok(resend) => SessionState::Resend(resend.with_stashed(msg.clone())),
                Err(e) => {
                    let reason = e.to_string();
                    session.shutdown_with_reason(msg, false, &reason)
                }
            }
        }
    }
}
