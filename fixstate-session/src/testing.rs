/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Test doubles shared by the session tests.

use crate::application::Application;
use crate::config::SessionConfig;
use crate::log::EventLog;
use crate::outbound::Outbound;
use crate::session::Session;
use crate::validation::SessionReject;
use bytes::Bytes;
use fixstate_core::error::{SessionError, StoreError};
use fixstate_core::field::tags;
use fixstate_core::message::{Message, MsgType};
use fixstate_core::types::{CompId, SessionId, Timestamp};
use fixstate_store::{MemoryStore, MessageStore, SequenceStore};
use fixstate_tagvalue::decode;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::SystemTime;

pub(crate) fn initiator_config() -> SessionConfig {
    SessionConfig::new(
        CompId::new("SENDER").unwrap(),
        CompId::new("TARGET").unwrap(),
        "FIX.4.4",
    )
}

pub(crate) fn acceptor_config() -> SessionConfig {
    initiator_config().with_initiate_logon(false)
}

/// Builds a message as the counterparty would send it to us.
pub(crate) fn inbound(msg_type: MsgType, seq: u64) -> Message {
    let mut msg = Message::new(&msg_type);
    msg.header.set_str(tags::BEGIN_STRING, "FIX.4.4");
    msg.header.set_str(tags::SENDER_COMP_ID, "TARGET");
    msg.header.set_str(tags::TARGET_COMP_ID, "SENDER");
    msg.header.set_uint(tags::MSG_SEQ_NUM, seq);
    msg.header
        .set_str(tags::SENDING_TIME, Timestamp::now().format_millis().as_str());
    msg
}

#[derive(Default)]
pub(crate) struct RecordingLog {
    events: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|e| e.contains(needle))
    }

    pub(crate) fn errors(&self) -> usize {
        self.errors.lock().len()
    }
}

impl EventLog for RecordingLog {
    fn on_incoming(&self, _frame: &[u8]) {}

    fn on_outgoing(&self, _frame: &[u8]) {}

    fn on_event(&self, text: &str) {
        self.events.lock().push(text.to_string());
    }

    fn on_error(&self, err: &dyn std::error::Error) {
        self.errors.lock().push(err.to_string());
    }
}

#[derive(Default)]
pub(crate) struct TestApplication {
    logons: AtomicUsize,
    logouts: AtomicUsize,
    app_messages: AtomicUsize,
    reject_logon: Option<SessionReject>,
    reject_app: bool,
    fatal_msg_type: Option<String>,
}

impl TestApplication {
    pub(crate) fn rejecting_logon(reject: SessionReject) -> Self {
        Self {
            reject_logon: Some(reject),
            ..Self::default()
        }
    }

    pub(crate) fn rejecting_app() -> Self {
        Self {
            reject_app: true,
            ..Self::default()
        }
    }

    /// Rejects application messages of `msg_type` with a reason that ends the session.
    pub(crate) fn rejecting_fatally(msg_type: &str) -> Self {
        Self {
            fatal_msg_type: Some(msg_type.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn logons(&self) -> usize {
        self.logons.load(Ordering::SeqCst)
    }

    pub(crate) fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub(crate) fn app_messages(&self) -> usize {
        self.app_messages.load(Ordering::SeqCst)
    }
}

impl Application for TestApplication {
    fn on_logon(&self, _session_id: &SessionId) {
        self.logons.fetch_add(1, Ordering::SeqCst);
    }

    fn on_logout(&self, _session_id: &SessionId) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }

    fn from_admin(&self, msg: &Message, _session_id: &SessionId) -> Result<(), SessionReject> {
        match &self.reject_logon {
            Some(reject) if msg.is_msg_type(&MsgType::Logon) => Err(reject.clone()),
            _ => Ok(()),
        }
    }

    fn from_app(&self, msg: &Message, _session_id: &SessionId) -> Result<(), SessionReject> {
        if let Some(fatal) = &self.fatal_msg_type
            && msg.is_msg_type(&MsgType::App(fatal.clone()))
        {
            return Err(SessionReject::comp_id_problem());
        }
        if self.reject_app {
            return Err(SessionReject::required_tag_missing(55));
        }
        self.app_messages.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingOutbound {
    frames: Mutex<Vec<Bytes>>,
    remaining: Mutex<Option<usize>>,
}

impl RecordingOutbound {
    pub(crate) fn messages(&self) -> Vec<Message> {
        self.frames
            .lock()
            .iter()
            .map(|f| decode(f).unwrap())
            .collect()
    }

    pub(crate) fn last(&self) -> Option<Message> {
        self.frames.lock().last().map(|f| decode(f).unwrap())
    }

    pub(crate) fn clear(&self) {
        self.frames.lock().clear();
    }

    /// Lets `n` more frames through, then fails every send.
    pub(crate) fn fail_after(&self, n: usize) {
        *self.remaining.lock() = Some(n);
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, frame: Bytes) -> Result<(), SessionError> {
        let mut remaining = self.remaining.lock();
        match remaining.as_mut() {
            Some(0) => return Err(SessionError::Connection("connection closed".to_string())),
            Some(n) => *n -= 1,
            None => {}
        }
        self.frames.lock().push(frame);
        Ok(())
    }
}

/// Memory store whose writes can be made to fail.
#[derive(Default)]
pub(crate) struct TestStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl TestStore {
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("disk full".to_string()));
        }
        Ok(())
    }
}

impl SequenceStore for TestStore {
    fn next_sender_msg_seq_num(&self) -> u64 {
        self.inner.next_sender_msg_seq_num()
    }

    fn next_target_msg_seq_num(&self) -> u64 {
        self.inner.next_target_msg_seq_num()
    }

    fn incr_next_sender_msg_seq_num(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.incr_next_sender_msg_seq_num()
    }

    fn incr_next_target_msg_seq_num(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.incr_next_target_msg_seq_num()
    }

    fn set_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_next_sender_msg_seq_num(seq)
    }

    fn set_next_target_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_next_target_msg_seq_num(seq)
    }

    fn force_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.force_next_sender_msg_seq_num(seq)
    }
}

impl MessageStore for TestStore {
    fn save_message(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        self.check()?;
        self.inner.save_message(seq_num, message)
    }

    fn get_messages(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError> {
        self.inner.get_messages(begin, end)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.reset()
    }

    fn creation_time(&self) -> SystemTime {
        self.inner.creation_time()
    }
}

/// A session wired to recording doubles.
pub(crate) struct Harness {
    pub(crate) session: Session,
    pub(crate) store: Arc<TestStore>,
    pub(crate) log: Arc<RecordingLog>,
    pub(crate) app: Arc<TestApplication>,
    pub(crate) outbound: Arc<RecordingOutbound>,
}

impl Harness {
    pub(crate) fn initiator() -> Self {
        Self::with_config(initiator_config())
    }

    pub(crate) fn acceptor() -> Self {
        Self::with_config(acceptor_config())
    }

    pub(crate) fn with_config(config: SessionConfig) -> Self {
        Self::with_application(config, TestApplication::default())
    }

    pub(crate) fn with_application(config: SessionConfig, app: TestApplication) -> Self {
        let store = Arc::new(TestStore::default());
        let log = Arc::new(RecordingLog::default());
        let app = Arc::new(app);
        let session = Session::new(config, store.clone(), log.clone(), app.clone());
        Self {
            session,
            store,
            log,
            app,
            outbound: Arc::new(RecordingOutbound::default()),
        }
    }

    pub(crate) fn connect(&mut self) {
        self.session.on_connect(self.outbound.clone()).unwrap();
    }

    /// Connects and completes the handshake with the counterparty's Logon at seq 1.
    pub(crate) fn logon(&mut self) {
        self.connect();
        let mut logon = inbound(MsgType::Logon, 1);
        logon.body.set_uint(tags::HEART_BT_INT, 30);
        self.session.dispatch_message(&logon);
        assert!(self.session.is_logged_on());
    }
}
