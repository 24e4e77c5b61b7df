/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session context.
//!
//! A [`Session`] owns everything one counterparty connection needs: the
//! configuration, the store, the event log, the application callbacks, the
//! outbound sink, the timers, and the current [`SessionState`]. Events are
//! dispatched one at a time; each swaps the current state out, runs the
//! state's operation, and installs the state it returns.

use crate::application::Application;
use crate::config::SessionConfig;
use crate::event::SessionEvent;
use crate::log::EventLog;
use crate::outbound::Outbound;
use crate::state::{LogonState, NotSessionTimeState, ResendState, SessionState, StateHandler};
use crate::timer::SessionTimers;
use crate::validation::{LogonOutcome, MessageFault, SeqMismatch, SessionReject};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fixstate_core::error::{FixError, SessionError, StoreError};
use fixstate_core::field::tags;
use fixstate_core::message::{Message, MsgType};
use fixstate_core::types::{SessionId, Timestamp};
use fixstate_store::{MessageStore, SequenceStore};
use fixstate_tagvalue::{decode, encode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Largest HeartBtInt (108) accepted from a counterparty, in seconds. Zero is
/// valid and turns heartbeats off.
const MAX_HEART_BT_INT: u64 = 86_400;

/// The actor context for one counterparty connection.
pub struct Session {
    id: SessionId,
    pub(crate) config: SessionConfig,
    pub(crate) store: Arc<dyn MessageStore>,
    pub(crate) log: Arc<dyn EventLog>,
    pub(crate) application: Arc<dyn Application>,
    outbound: Option<Arc<dyn Outbound>>,
    pub(crate) timers: SessionTimers,
    state: SessionState,
    /// We sent ResetSeqNumFlag=Y in our Logon and already reset the store.
    sent_reset: bool,
    /// `on_logon` was delivered and `on_logout` is still owed.
    logon_notified: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state.name())
            .field("connected", &self.outbound.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a latent session and notifies the application.
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn MessageStore>,
        log: Arc<dyn EventLog>,
        application: Arc<dyn Application>,
    ) -> Self {
        let id = config.session_id();
        let timers = SessionTimers::new(config.heartbeat_interval, Instant::now());
        application.on_create(&id);
        Self {
            id,
            config,
            store,
            log,
            application,
            outbound: None,
            timers,
            state: SessionState::latent(),
            sent_reset: false,
            logon_notified: false,
        }
    }

    /// Returns the session identity.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the sequence and message store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Returns the heartbeat interval currently in effect.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.timers.interval()
    }

    /// Returns true if the session is ready for application traffic.
    #[must_use]
    pub fn is_logged_on(&self) -> bool {
        self.state.is_logged_on()
    }

    /// Returns true if the session has a live connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Returns true unless the session is outside its schedule.
    #[must_use]
    pub fn is_session_time(&self) -> bool {
        self.state.is_session_time()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Attaches a new connection and starts the logon handshake.
    ///
    /// An initiator sends its Logon; an acceptor waits for one. Both arm the
    /// logon timer and move to the logon-pending state.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the session is already connected
    /// or outside its schedule, or the error from sending the Logon.
    pub fn on_connect(&mut self, outbound: Arc<dyn Outbound>) -> Result<(), FixError> {
        if !self.state.is_session_time() {
            return Err(SessionError::Connection("outside of session time".to_string()).into());
        }
        if self.state.is_connected() {
            return Err(SessionError::Connection("session already connected".to_string()).into());
        }

        let now = Instant::now();
        self.outbound = Some(outbound);
        self.timers.reset(now);
        self.sent_reset = false;
        if let Err(e) = self.store.refresh() {
            self.log.on_error(&e);
        }

        if self.config.initiate_logon {
            if self.config.reset_on_logon {
                self.store.reset()?;
                self.sent_reset = true;
            }
            self.log.on_event("Sending logon request");
            let logon = self.build_logon(self.sent_reset);
            self.send(logon)?;
        }
        self.timers
            .arm_after(SessionEvent::LogonTimeout, now, self.config.logon_timeout);
        self.step(|_, _| SessionState::Logon(LogonState));
        Ok(())
    }

    /// Detaches the connection and falls back to the latent state.
    pub fn on_disconnect(&mut self) {
        if !self.state.is_connected() {
            return;
        }
        self.log.on_event("Disconnected");
        self.step(|_, _| SessionState::latent());
    }

    /// Delivers one inbound message to the current state.
    pub fn dispatch_message(&mut self, msg: &Message) {
        match msg.raw() {
            Some(raw) => self.log.on_incoming(raw),
            None => self.log.on_incoming(msg.to_string().as_bytes()),
        }
        self.timers.on_received(Instant::now());
        self.step(|state, session| state.handle(session, msg));
    }

    /// Delivers one timer event to the current state.
    pub fn dispatch_timeout(&mut self, event: SessionEvent) {
        self.step(|state, session| state.on_timeout(session, event));
    }

    /// Asks the current state to wind the session down.
    pub fn stop(&mut self) {
        self.step(|state, session| state.on_stop(session));
    }

    /// Returns the timer events due at `now`.
    pub fn poll_timers(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.timers.poll(now)
    }

    /// Runs periodic work: schedule checks, then every due timer event.
    pub fn on_tick(&mut self, now: Instant, wall_clock: DateTime<Utc>) {
        self.check_session_time(wall_clock);
        for event in self.poll_timers(now) {
            self.dispatch_timeout(event);
        }
    }

    /// Moves the session in or out of its schedule.
    ///
    /// Leaving the window logs out a logged-on session and parks every state
    /// in `NotSessionTime`. While disconnected inside the window, a store
    /// created in an earlier period is reset.
    pub fn check_session_time(&mut self, now: DateTime<Utc>) {
        let Some(schedule) = self.config.schedule else {
            return;
        };

        if !schedule.contains(now) {
            if matches!(self.state, SessionState::NotSessionTime(_)) {
                return;
            }
            self.log.on_event("Not in session");
            if self.state.is_logged_on() {
                let logout = Self::build_logout("");
                if let Err(e) = self.send(logout) {
                    self.log.on_error(&e);
                }
            }
            self.step(|_, _| SessionState::NotSessionTime(NotSessionTimeState));
            return;
        }

        if !self.state.is_connected() {
            let created = DateTime::<Utc>::from(self.store.creation_time());
            if !schedule.is_same_period(created, now) {
                self.log.on_event("Session reset");
                if let Err(e) = self.store.reset() {
                    self.log.on_error(&e);
                }
            }
        }
        if matches!(self.state, SessionState::NotSessionTime(_)) {
            self.log.on_event("In session");
            self.step(|_, _| SessionState::latent());
        }
    }

    /// Sends an application message.
    ///
    /// # Errors
    /// Returns `SessionError::NotLoggedOn` outside the logged-on states, or
    /// any encode, store, or connection error.
    pub fn send_app(&mut self, msg: Message) -> Result<(), FixError> {
        if !self.state.is_logged_on() {
            return Err(SessionError::NotLoggedOn.into());
        }
        self.send(msg)
    }

    fn step(&mut self, run: impl FnOnce(SessionState, &mut Self) -> SessionState) {
        let was_connected = self.state.is_connected();
        let from = self.state.name();
        let current = std::mem::replace(&mut self.state, SessionState::latent());
        let next = run(current, self);
        if from != next.name() {
            debug!(session = %self.id, from, to = next.name(), "state transition");
        }
        let connected = next.is_connected();
        self.state = next;
        if was_connected && !connected {
            self.leave_connected();
        }
    }

    fn leave_connected(&mut self) {
        if self.logon_notified {
            self.logon_notified = false;
            self.application.on_logout(&self.id);
        }
        self.outbound = None;
        self.timers.disarm();
        if self.config.reset_on_disconnect
            && let Err(e) = self.store.reset()
        {
            self.log.on_error(&e);
        }
    }

    /// Tells the application the session is ready for normal traffic.
    pub(crate) fn notify_logon(&mut self) {
        self.logon_notified = true;
        self.application.on_logon(&self.id);
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Sends a message with the next sender sequence number and records it for resend.
    pub(crate) fn send(&mut self, msg: Message) -> Result<(), FixError> {
        self.send_in_reply_to(msg, None)
    }

    /// Like [`Session::send`], addressing the message as a reply to `in_reply_to`.
    pub(crate) fn send_in_reply_to(
        &mut self,
        mut msg: Message,
        in_reply_to: Option<&Message>,
    ) -> Result<(), FixError> {
        let outbound = self.connection()?;
        let seq_num = self.store.next_sender_msg_seq_num();
        self.fill_header(&mut msg, seq_num);
        if let Some(inbound) = in_reply_to {
            address_reply(&mut msg, inbound);
        }
        if msg.msg_type()?.is_admin() {
            self.application.to_admin(&mut msg, &self.id);
        }
        let frame = encode(&msg)?.freeze();
        self.store.save_message_and_incr_next_sender(seq_num, &frame)?;
        self.transmit(&outbound, frame)
    }

    fn connection(&self) -> Result<Arc<dyn Outbound>, SessionError> {
        self.outbound
            .clone()
            .ok_or_else(|| SessionError::Connection("no active connection".to_string()))
    }

    fn transmit(&mut self, outbound: &Arc<dyn Outbound>, frame: Bytes) -> Result<(), FixError> {
        self.log.on_outgoing(&frame);
        outbound.send(frame)?;
        self.timers.on_sent(Instant::now());
        Ok(())
    }

    fn fill_header(&self, msg: &mut Message, seq_num: u64) {
        let header = &mut msg.header;
        header.set_str(tags::BEGIN_STRING, &self.config.begin_string);
        header.set_str(tags::SENDER_COMP_ID, self.config.sender_comp_id.as_str());
        header.set_str(tags::TARGET_COMP_ID, self.config.target_comp_id.as_str());
        if let Some(v) = &self.config.sender_sub_id {
            header.set_str(tags::SENDER_SUB_ID, v);
        }
        if let Some(v) = &self.config.target_sub_id {
            header.set_str(tags::TARGET_SUB_ID, v);
        }
        if let Some(v) = &self.config.sender_location_id {
            header.set_str(tags::SENDER_LOCATION_ID, v);
        }
        if let Some(v) = &self.config.target_location_id {
            header.set_str(tags::TARGET_LOCATION_ID, v);
        }
        header.set_uint(tags::MSG_SEQ_NUM, seq_num);
        header.set_str(tags::SENDING_TIME, Timestamp::now().format_millis().as_str());
    }

    pub(crate) fn build_logon(&self, reset_seq_num: bool) -> Message {
        let mut msg = Message::new(&MsgType::Logon);
        msg.body.set_uint(tags::ENCRYPT_METHOD, 0);
        msg.body
            .set_uint(tags::HEART_BT_INT, self.timers.interval().as_secs());
        if reset_seq_num {
            msg.body.set_bool(tags::RESET_SEQ_NUM_FLAG, true);
        }
        msg
    }

    pub(crate) fn build_logout(reason: &str) -> Message {
        let mut msg = Message::new(&MsgType::Logout);
        if !reason.is_empty() {
            msg.body.set_str(tags::TEXT, reason);
        }
        msg
    }

    pub(crate) fn build_heartbeat(test_req_id: Option<&str>) -> Message {
        let mut msg = Message::new(&MsgType::Heartbeat);
        if let Some(id) = test_req_id {
            msg.body.set_str(tags::TEST_REQ_ID, id);
        }
        msg
    }

    pub(crate) fn build_test_request(test_req_id: &str) -> Message {
        let mut msg = Message::new(&MsgType::TestRequest);
        msg.body.set_str(tags::TEST_REQ_ID, test_req_id);
        msg
    }

    /// Sends a Logout and arms the logout timer.
    pub(crate) fn initiate_logout(
        &mut self,
        reason: &str,
        in_reply_to: Option<&Message>,
    ) -> Result<(), FixError> {
        self.send_in_reply_to(Self::build_logout(reason), in_reply_to)?;
        self.log.on_event("Initiated logout request");
        self.timers.arm_after(
            SessionEvent::LogoutTimeout,
            Instant::now(),
            self.config.logout_timeout,
        );
        Ok(())
    }

    /// Sends a session-level Reject (35=3) for `msg`.
    pub(crate) fn send_reject(
        &mut self,
        msg: &Message,
        reject: &SessionReject,
    ) -> Result<(), FixError> {
        let mut reply = Message::new(&MsgType::Reject);
        if let Ok(seq) = msg.seq_num() {
            reply.body.set_uint(tags::REF_SEQ_NUM, seq);
        }
        if let Some(tag) = reject.ref_tag {
            reply.body.set_uint(tags::REF_TAG_ID, u64::from(tag));
        }
        if let Ok(msg_type) = msg.header.get_str(tags::MSG_TYPE)
            && !msg_type.is_empty()
        {
            reply.body.set_str(tags::REF_MSG_TYPE, msg_type);
        }
        reply
            .body
            .set_uint(tags::SESSION_REJECT_REASON, reject.reason.code());
        reply.body.set_str(tags::TEXT, &reject.text);
        self.log
            .on_eventf(format_args!("Message Rejected: {}", reject.text));
        self.send_in_reply_to(reply, Some(msg))
    }

    // ------------------------------------------------------------------
    // Failure paths
    // ------------------------------------------------------------------

    /// Logs a local failure and falls back to the latent state.
    pub(crate) fn handle_state_error(&self, err: &FixError) -> SessionState {
        self.log.on_error(err);
        SessionState::latent()
    }

    /// Logs `reason`, sends a Logout in reply to `msg`, optionally consumes the
    /// target sequence number, and yields the latent state.
    ///
    /// Send and store failures are logged; they never change the outcome.
    pub(crate) fn shutdown_with_reason(
        &mut self,
        msg: &Message,
        incr_target: bool,
        reason: &str,
    ) -> SessionState {
        self.log.on_event(reason);
        let logout = Self::build_logout(reason);
        if let Err(e) = self.send_in_reply_to(logout, Some(msg)) {
            self.log.on_error(&e);
        }
        if incr_target && let Err(e) = self.store.incr_next_target_msg_seq_num() {
            self.log.on_error(&e);
        }
        SessionState::latent()
    }

    /// Overwrites our next sender sequence number with the value the
    /// counterparty reports expecting.
    pub(crate) fn force_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        self.store.force_next_sender_msg_seq_num(seq)
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Classifies an inbound Logon, replying to it when acting as acceptor.
    ///
    /// Only an `Accepted` outcome consumes the Logon's sequence number.
    ///
    /// # Errors
    /// Returns `FixError` for local failures: a missing MsgSeqNum, a store
    /// error, or a failure to send the Logon reply.
    pub(crate) fn validate_logon(&mut self, msg: &Message) -> Result<LogonOutcome, FixError> {
        let initiator = self.config.initiate_logon;
        self.log.on_event(if initiator {
            "Received logon response"
        } else {
            "Received logon request"
        });
        let received = msg.seq_num()?;

        let reset_requested = matches!(msg.body.get_bool(tags::RESET_SEQ_NUM_FLAG), Ok(true));
        let reset = reset_requested || (!initiator && self.config.reset_on_logon);
        if reset && !self.sent_reset {
            self.log
                .on_event("Logon contains ResetSeqNumFlag=Y, resetting sequence numbers to 1");
            self.store.reset()?;
        }

        match self.verify(msg, false, true) {
            Ok(()) => {}
            Err(MessageFault::TargetTooLow(m)) => return Ok(LogonOutcome::TargetTooLow(m)),
            Err(MessageFault::TargetTooHigh(m)) => return Ok(LogonOutcome::TargetTooHigh(m)),
            Err(fault) => return Ok(LogonOutcome::Rejected(fault.to_string())),
        }

        if !initiator {
            if !self.config.heartbeat_override {
                match msg.body.get_uint(tags::HEART_BT_INT) {
                    Ok(secs) if secs <= MAX_HEART_BT_INT => self
                        .timers
                        .set_interval(Duration::from_secs(secs), Instant::now()),
                    Ok(_) => {
                        let reject = SessionReject::value_is_incorrect(Some(tags::HEART_BT_INT));
                        return Ok(LogonOutcome::Rejected(reject.to_string()));
                    }
                    Err(e) => return Ok(LogonOutcome::Rejected(SessionReject::from(e).to_string())),
                }
            }
            self.log.on_event("Responding to logon request");
            let reply = self.build_logon(reset);
            self.send_in_reply_to(reply, Some(msg))?;
        }
        self.sent_reset = false;
        self.timers.disarm();

        let expected = self.store.next_target_msg_seq_num();
        if received > expected {
            return Ok(LogonOutcome::TargetTooHigh(SeqMismatch::new(expected, received)));
        }
        self.store.incr_next_target_msg_seq_num()?;
        Ok(LogonOutcome::Accepted)
    }

    /// Checks an inbound message against the session.
    ///
    /// BeginString, CompIDs and SendingTime are always checked; the sequence
    /// number only in the directions requested. The application callback runs
    /// last, so it only sees messages that passed everything else.
    pub(crate) fn verify(
        &self,
        msg: &Message,
        check_too_high: bool,
        check_too_low: bool,
    ) -> Result<(), MessageFault> {
        match msg.header.get_str(tags::BEGIN_STRING) {
            Ok(begin_string) if begin_string == self.config.begin_string => {}
            _ => return Err(MessageFault::IncorrectBeginString),
        }

        let sender = msg
            .header
            .get_str(tags::SENDER_COMP_ID)
            .map_err(SessionReject::from)?;
        let target = msg
            .header
            .get_str(tags::TARGET_COMP_ID)
            .map_err(SessionReject::from)?;
        if sender != self.config.target_comp_id.as_str()
            || target != self.config.sender_comp_id.as_str()
        {
            return Err(SessionReject::comp_id_problem().into());
        }

        let sending_time = msg
            .header
            .get_str(tags::SENDING_TIME)
            .map_err(SessionReject::from)?;
        if self.config.check_latency {
            let sent =
                Timestamp::parse_fix(sending_time, tags::SENDING_TIME).map_err(SessionReject::from)?;
            if Timestamp::now().abs_diff(sent) > self.config.max_latency {
                return Err(SessionReject::sending_time_accuracy_problem().into());
            }
        }

        let received = msg.seq_num().map_err(SessionReject::from)?;
        let expected = self.store.next_target_msg_seq_num();
        if check_too_low && received < expected {
            return Err(MessageFault::TargetTooLow(SeqMismatch::new(expected, received)));
        }
        if check_too_high && received > expected {
            return Err(MessageFault::TargetTooHigh(SeqMismatch::new(expected, received)));
        }

        let msg_type = msg.msg_type().map_err(SessionReject::from)?;
        let callback = if msg_type.is_admin() {
            self.application.from_admin(msg, &self.id)
        } else {
            self.application.from_app(msg, &self.id)
        };
        callback.map_err(MessageFault::Reject)
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Starts recovering the gap in front of a message that arrived too early.
    pub(crate) fn handle_target_too_high(
        &mut self,
        mismatch: &SeqMismatch,
    ) -> Result<ResendState, FixError> {
        self.log.on_event(&mismatch.to_string());
        self.send_resend_request(mismatch.expected, mismatch.received - 1)
    }

    /// Requests `begin..=end`, or its first chunk when chunking is configured.
    pub(crate) fn send_resend_request(
        &mut self,
        begin: u64,
        end: u64,
    ) -> Result<ResendState, FixError> {
        let chunk = self.config.resend_request_chunk_size;
        let request_end = if chunk > 0 && end - begin + 1 > chunk {
            begin + chunk - 1
        } else {
            end
        };

        let mut msg = Message::new(&MsgType::ResendRequest);
        msg.body.set_uint(tags::BEGIN_SEQ_NO, begin);
        msg.body.set_uint(tags::END_SEQ_NO, request_end);
        self.send(msg)?;
        self.log.on_eventf(format_args!(
            "Sent ResendRequest FROM: {begin} TO: {request_end}"
        ));
        Ok(ResendState::new(request_end, end))
    }

    /// Answers a ResendRequest for `begin..=end`.
    ///
    /// Stored application messages are sent again with PossDupFlag=Y and
    /// OrigSendingTime. Administrative messages and holes in the history are
    /// covered by SequenceReset-GapFill.
    pub(crate) fn resend_messages(
        &mut self,
        begin: u64,
        end: u64,
        in_reply_to: &Message,
    ) -> Result<(), FixError> {
        if begin > end {
            return Ok(());
        }
        let outbound = self.connection()?;
        let mut seq = begin;

        for (stored_seq, frame) in self.store.get_messages(begin, end)? {
            let mut msg = decode(&frame)?;
            if msg.msg_type()?.is_admin() {
                continue;
            }
            if seq < stored_seq {
                self.send_gap_fill(&outbound, seq, stored_seq, in_reply_to)?;
            }

            msg.clear_raw();
            if let Ok(orig) = msg.header.get_bytes(tags::SENDING_TIME) {
                let orig = Bytes::copy_from_slice(orig);
                msg.header.set_bytes(tags::ORIG_SENDING_TIME, orig);
            }
            msg.header.set_bool(tags::POSS_DUP_FLAG, true);
            msg.header
                .set_str(tags::SENDING_TIME, Timestamp::now().format_millis().as_str());

            self.log
                .on_eventf(format_args!("Resending Message: {stored_seq}"));
            self.transmit(&outbound, encode(&msg)?.freeze())?;
            seq = stored_seq + 1;
        }

        if seq <= end {
            self.send_gap_fill(&outbound, seq, end + 1, in_reply_to)?;
        }
        Ok(())
    }

    fn send_gap_fill(
        &mut self,
        outbound: &Arc<dyn Outbound>,
        seq_num: u64,
        new_seq_no: u64,
        in_reply_to: &Message,
    ) -> Result<(), FixError> {
        let mut msg = Message::new(&MsgType::SequenceReset);
        self.fill_header(&mut msg, seq_num);
        address_reply(&mut msg, in_reply_to);
        let sending_time = Timestamp::now().format_millis();
        msg.header.set_bool(tags::POSS_DUP_FLAG, true);
        msg.header
            .set_str(tags::ORIG_SENDING_TIME, sending_time.as_str());
        msg.body.set_bool(tags::GAP_FILL_FLAG, true);
        msg.body.set_uint(tags::NEW_SEQ_NO, new_seq_no);

        self.transmit(outbound, encode(&msg)?.freeze())?;
        self.log
            .on_eventf(format_args!("Sent SequenceReset TO: {new_seq_no}"));
        Ok(())
    }
}

/// Routes a reply back through any intermediary named on the inbound message.
fn address_reply(msg: &mut Message, inbound: &Message) {
    if let Ok(on_behalf_of) = inbound.header.get_bytes(tags::ON_BEHALF_OF_COMP_ID) {
        msg.header.set_bytes(
            tags::DELIVER_TO_COMP_ID,
            Bytes::copy_from_slice(on_behalf_of),
        );
    }
    if let Ok(deliver_to) = inbound.header.get_bytes(tags::DELIVER_TO_COMP_ID) {
        msg.header.set_bytes(
            tags::ON_BEHALF_OF_COMP_ID,
            Bytes::copy_from_slice(deliver_to),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SessionSchedule;
    use crate::testing::{Harness, TestApplication, inbound};
    use crate::validation::SessionRejectReason;
    use chrono::{NaiveTime, TimeZone};

    #[test]
    fn test_initiator_connect_sends_logon() {
        let mut h = Harness::initiator();
        h.connect();

        assert_eq!(h.session.state().name(), "Logon State");
        let sent = h.outbound.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_msg_type(&MsgType::Logon));
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert_eq!(sent[0].body.get_uint(tags::HEART_BT_INT).unwrap(), 30);
        assert_eq!(h.store.next_sender_msg_seq_num(), 2);
        assert_eq!(h.session.timers.armed(), Some(SessionEvent::LogonTimeout));
    }

    #[test]
    fn test_acceptor_connect_waits() {
        let mut h = Harness::acceptor();
        h.connect();

        assert_eq!(h.session.state().name(), "Logon State");
        assert!(h.outbound.messages().is_empty());
    }

    #[test]
    fn test_connect_twice_fails() {
        let mut h = Harness::initiator();
        h.connect();
        let second = h.session.on_connect(h.outbound.clone());
        assert!(matches!(
            second,
            Err(FixError::Session(SessionError::Connection(_)))
        ));
    }

    #[test]
    fn test_acceptor_logon_reply_and_heartbeat_adoption() {
        let mut h = Harness::acceptor();
        h.connect();

        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, 45);
        h.session.dispatch_message(&logon);

        assert!(h.session.is_logged_on());
        assert_eq!(h.session.heartbeat_interval(), Duration::from_secs(45));
        let sent = h.outbound.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_msg_type(&MsgType::Logon));
        assert_eq!(sent[0].body.get_uint(tags::HEART_BT_INT).unwrap(), 45);
        assert_eq!(h.store.next_target_msg_seq_num(), 2);
    }

    #[test]
    fn test_acceptor_rejects_huge_heartbeat_interval() {
        let mut h = Harness::acceptor();
        h.connect();

        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, u64::MAX);
        h.session.dispatch_message(&logon);

        assert_eq!(h.session.state().name(), "Latent State");
        assert_eq!(h.session.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(h.store.next_target_msg_seq_num(), 1);
        assert_eq!(h.app.logons(), 0);
        let logout = h.outbound.last().unwrap();
        assert!(logout.is_msg_type(&MsgType::Logout));
        assert_eq!(
            logout.body.get_str(tags::TEXT).unwrap(),
            "Value is incorrect (out of range) for this tag"
        );
    }

    #[test]
    fn test_acceptor_heartbeat_interval_bounds() {
        let mut h = Harness::acceptor();
        h.connect();
        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, MAX_HEART_BT_INT);
        h.session.dispatch_message(&logon);
        assert!(h.session.is_logged_on());
        assert_eq!(
            h.session.heartbeat_interval(),
            Duration::from_secs(MAX_HEART_BT_INT)
        );

        let mut h = Harness::acceptor();
        h.connect();
        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, 0);
        h.session.dispatch_message(&logon);
        assert!(h.session.is_logged_on());
        assert!(h.session.heartbeat_interval().is_zero());
        let later = Instant::now() + Duration::from_secs(3600);
        assert!(h.session.poll_timers(later).is_empty());
    }

    #[test]
    fn test_acceptor_reset_seq_num_flag() {
        let mut h = Harness::acceptor();
        h.store.set_next_target_msg_seq_num(50).unwrap();
        h.store.set_next_sender_msg_seq_num(80).unwrap();
        h.connect();

        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, 30);
        logon.body.set_bool(tags::RESET_SEQ_NUM_FLAG, true);
        h.session.dispatch_message(&logon);

        assert!(h.session.is_logged_on());
        let reply = h.outbound.last().unwrap();
        assert_eq!(reply.seq_num().unwrap(), 1);
        assert!(reply.body.get_bool(tags::RESET_SEQ_NUM_FLAG).unwrap());
        assert_eq!(h.store.next_target_msg_seq_num(), 2);
        assert_eq!(h.store.next_sender_msg_seq_num(), 2);
    }

    #[test]
    fn test_disconnect_notifies_logout_once() {
        let mut h = Harness::initiator();
        h.logon();
        assert_eq!(h.app.logons(), 1);

        h.session.on_disconnect();
        h.session.on_disconnect();

        assert_eq!(h.app.logouts(), 1);
        assert_eq!(h.session.state().name(), "Latent State");
    }

    #[test]
    fn test_send_app_requires_logon() {
        let mut h = Harness::initiator();
        let order = Message::new(&MsgType::App("D".to_string()));
        assert!(matches!(
            h.session.send_app(order.clone()),
            Err(FixError::Session(SessionError::NotLoggedOn))
        ));

        h.logon();
        h.session.send_app(order).unwrap();
        let sent = h.outbound.last().unwrap();
        assert!(sent.is_msg_type(&MsgType::App("D".to_string())));
        assert_eq!(sent.header.get_str(tags::SENDER_COMP_ID).unwrap(), "SENDER");
        assert_eq!(sent.header.get_str(tags::TARGET_COMP_ID).unwrap(), "TARGET");
    }

    #[test]
    fn test_verify_comp_id_problem() {
        let h = Harness::initiator();
        let mut msg = inbound(MsgType::Heartbeat, 1);
        msg.header.set_str(tags::SENDER_COMP_ID, "INTRUDER");

        match h.session.verify(&msg, true, true) {
            Err(MessageFault::Reject(r)) => assert_eq!(r.reason, SessionRejectReason::CompIdProblem),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_verify_sending_time_accuracy() {
        let h = Harness::initiator();
        let mut msg = inbound(MsgType::Heartbeat, 1);
        msg.header.set_str(tags::SENDING_TIME, "20000101-00:00:00.000");

        match h.session.verify(&msg, true, true) {
            Err(MessageFault::Reject(r)) => {
                assert_eq!(r.reason, SessionRejectReason::SendingTimeAccuracyProblem);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_verify_begin_string() {
        let h = Harness::initiator();
        let mut msg = inbound(MsgType::Heartbeat, 1);
        msg.header.set_str(tags::BEGIN_STRING, "FIX.4.2");
        assert_eq!(
            h.session.verify(&msg, true, true),
            Err(MessageFault::IncorrectBeginString)
        );
    }

    #[test]
    fn test_verify_sequence_directions() {
        let h = Harness::initiator();
        h.store.set_next_target_msg_seq_num(5).unwrap();

        assert_eq!(
            h.session.verify(&inbound(MsgType::Heartbeat, 3), true, true),
            Err(MessageFault::TargetTooLow(SeqMismatch::new(5, 3)))
        );
        assert_eq!(
            h.session.verify(&inbound(MsgType::Heartbeat, 9), true, true),
            Err(MessageFault::TargetTooHigh(SeqMismatch::new(5, 9)))
        );
        assert!(h.session.verify(&inbound(MsgType::Heartbeat, 9), false, true).is_ok());
        assert!(h.session.verify(&inbound(MsgType::Heartbeat, 5), true, true).is_ok());
    }

    #[test]
    fn test_verify_application_reject() {
        let app = TestApplication::rejecting_app();
        let h = Harness::with_application(crate::testing::initiator_config(), app);
        let msg = inbound(MsgType::App("D".to_string()), 1);

        assert!(matches!(
            h.session.verify(&msg, true, true),
            Err(MessageFault::Reject(_))
        ));
    }

    #[test]
    fn test_send_reject_fields() {
        let mut h = Harness::initiator();
        h.logon();
        let msg = inbound(MsgType::App("D".to_string()), 2);

        h.session
            .send_reject(&msg, &SessionReject::required_tag_missing(55))
            .unwrap();

        let reject = h.outbound.last().unwrap();
        assert!(reject.is_msg_type(&MsgType::Reject));
        assert_eq!(reject.body.get_uint(tags::REF_SEQ_NUM).unwrap(), 2);
        assert_eq!(reject.body.get_uint(tags::REF_TAG_ID).unwrap(), 55);
        assert_eq!(reject.body.get_str(tags::REF_MSG_TYPE).unwrap(), "D");
        assert_eq!(reject.body.get_uint(tags::SESSION_REJECT_REASON).unwrap(), 1);
        assert_eq!(reject.body.get_str(tags::TEXT).unwrap(), "Required tag missing");
    }

    #[test]
    fn test_reply_addressing() {
        let mut h = Harness::initiator();
        h.logon();
        let mut msg = inbound(MsgType::TestRequest, 2);
        msg.header.set_str(tags::ON_BEHALF_OF_COMP_ID, "DESK");
        msg.body.set_str(tags::TEST_REQ_ID, "PING");

        h.session.dispatch_message(&msg);

        let reply = h.outbound.last().unwrap();
        assert!(reply.is_msg_type(&MsgType::Heartbeat));
        assert_eq!(reply.header.get_str(tags::DELIVER_TO_COMP_ID).unwrap(), "DESK");
    }

    #[test]
    fn test_resend_messages_gap_fills_admin() {
        let mut h = Harness::initiator();
        h.logon(); // seq 1 is our Logon
        h.session
            .send_app(Message::new(&MsgType::App("D".to_string())))
            .unwrap(); // 2
        h.session.dispatch_timeout(SessionEvent::NeedHeartbeat); // 3
        h.session
            .send_app(Message::new(&MsgType::App("8".to_string())))
            .unwrap(); // 4
        h.outbound.clear();

        let request = inbound(MsgType::ResendRequest, 2);
        h.session.resend_messages(1, 4, &request).unwrap();

        let sent = h.outbound.messages();
        assert_eq!(sent.len(), 4);

        assert!(sent[0].is_msg_type(&MsgType::SequenceReset));
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert_eq!(sent[0].body.get_uint(tags::NEW_SEQ_NO).unwrap(), 2);
        assert!(sent[0].body.get_bool(tags::GAP_FILL_FLAG).unwrap());

        assert!(sent[1].is_msg_type(&MsgType::App("D".to_string())));
        assert_eq!(sent[1].seq_num().unwrap(), 2);
        assert!(sent[1].header.get_bool(tags::POSS_DUP_FLAG).unwrap());
        assert!(sent[1].header.has(tags::ORIG_SENDING_TIME));

        assert!(sent[2].is_msg_type(&MsgType::SequenceReset));
        assert_eq!(sent[2].seq_num().unwrap(), 3);
        assert_eq!(sent[2].body.get_uint(tags::NEW_SEQ_NO).unwrap(), 4);

        assert_eq!(sent[3].seq_num().unwrap(), 4);
        assert_eq!(h.store.next_sender_msg_seq_num(), 5);
    }

    #[test]
    fn test_resend_messages_trailing_admin() {
        let mut h = Harness::initiator();
        h.logon();
        h.session.dispatch_timeout(SessionEvent::NeedHeartbeat); // 2
        h.outbound.clear();

        let request = inbound(MsgType::ResendRequest, 2);
        h.session.resend_messages(1, 2, &request).unwrap();

        let sent = h.outbound.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert_eq!(sent[0].body.get_uint(tags::NEW_SEQ_NO).unwrap(), 3);
    }

    #[test]
    fn test_chunked_resend_request() {
        let config = crate::testing::initiator_config().with_resend_request_chunk_size(10);
        let mut h = Harness::with_config(config);
        h.logon();

        let resend = h
            .session
            .handle_target_too_high(&SeqMismatch::new(2, 50))
            .unwrap();
        assert_eq!(resend.current_range_end(), 11);
        assert_eq!(resend.range_end(), 49);

        let request = h.outbound.last().unwrap();
        assert_eq!(request.body.get_uint(tags::BEGIN_SEQ_NO).unwrap(), 2);
        assert_eq!(request.body.get_uint(tags::END_SEQ_NO).unwrap(), 11);
    }

    #[test]
    fn test_schedule_moves_out_and_back() {
        let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let config =
            crate::testing::initiator_config().with_schedule(SessionSchedule::new(start, end));
        let mut h = Harness::with_config(config);
        h.logon();

        let evening = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        h.session.check_session_time(evening);

        assert_eq!(h.session.state().name(), "Not Session Time");
        assert!(h.outbound.last().unwrap().is_msg_type(&MsgType::Logout));
        assert_eq!(h.app.logouts(), 1);
        assert!(h.session.on_connect(h.outbound.clone()).is_err());

        let morning = Utc.with_ymd_and_hms(2026, 3, 11, 9, 0, 0).unwrap();
        h.session.check_session_time(morning);
        assert_eq!(h.session.state().name(), "Latent State");
        assert_eq!(h.store.next_sender_msg_seq_num(), 1);
    }
}
