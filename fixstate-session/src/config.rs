/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.
//!
//! This module provides configuration options for FIX sessions.

use crate::schedule::SessionSchedule;
use fixstate_core::error::SessionError;
use fixstate_core::types::{CompId, SessionId};
use std::time::Duration;

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// FIX version BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Optional qualifier distinguishing sessions with identical CompIDs.
    pub qualifier: Option<String>,
    /// Heartbeat interval sent in our Logon.
    pub heartbeat_interval: Duration,
    /// Whether this side sends the first Logon (initiator) or waits for one (acceptor).
    pub initiate_logon: bool,
    /// Whether a "MsgSeqNum too low" Logout received while awaiting logon
    /// forces our next sender sequence number to the value the counterparty expects.
    pub logon_force_sender_msg_seq_num: bool,
    /// Whether to reset sequence numbers on logon.
    pub reset_on_logon: bool,
    /// Whether to reset sequence numbers on logout.
    pub reset_on_logout: bool,
    /// Whether to reset sequence numbers on disconnect.
    pub reset_on_disconnect: bool,
    /// Acceptor keeps its own heartbeat interval instead of adopting the counterparty's.
    pub heartbeat_override: bool,
    /// Maximum number of messages per ResendRequest; 0 requests the whole gap at once.
    pub resend_request_chunk_size: u64,
    /// Most messages held for replay while a gap is being filled; later ones
    /// are dropped and requested again once the gap closes.
    pub max_stashed_messages: usize,
    /// Whether to reject messages whose SendingTime is too far from local time.
    pub check_latency: bool,
    /// Maximum tolerated SendingTime skew when `check_latency` is on.
    pub max_latency: Duration,
    /// Maximum message size in bytes.
    pub max_message_size: usize,
    /// Logon timeout duration.
    pub logon_timeout: Duration,
    /// Logout timeout duration.
    pub logout_timeout: Duration,
    /// Whether to validate incoming message checksums.
    pub validate_checksum: bool,
    /// Daily session window; `None` means always in session.
    pub schedule: Option<SessionSchedule>,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional target location ID (tag 143).
    pub target_location_id: Option<String>,
}

impl SessionConfig {
    /// Creates a new initiator configuration with required fields.
    ///
    /// # Arguments
    /// * `sender_comp_id` - The sender CompID
    /// * `target_comp_id` - The target CompID
    /// * `begin_string` - The FIX version string
    #[must_use]
    pub fn new(
        sender_comp_id: CompId,
        target_comp_id: CompId,
        begin_string: impl Into<String>,
    ) -> Self {
        Self {
            sender_comp_id,
            target_comp_id,
            begin_string: begin_string.into(),
            qualifier: None,
            heartbeat_interval: Duration::from_secs(30),
            initiate_logon: true,
            logon_force_sender_msg_seq_num: false,
            reset_on_logon: false,
            reset_on_logout: false,
            reset_on_disconnect: false,
            heartbeat_override: false,
            resend_request_chunk_size: 0,
            max_stashed_messages: 10_000,
            check_latency: true,
            max_latency: Duration::from_secs(120),
            max_message_size: 1024 * 1024, // 1MB
            logon_timeout: Duration::from_secs(10),
            logout_timeout: Duration::from_secs(2),
            validate_checksum: true,
            schedule: None,
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Returns the identity of the session this configuration describes.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        let id = SessionId::new(
            self.begin_string.clone(),
            self.sender_comp_id.clone(),
            self.target_comp_id.clone(),
        );
        match &self.qualifier {
            Some(q) => id.with_qualifier(q.clone()),
            None => id,
        }
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets whether this side initiates the logon.
    #[must_use]
    pub const fn with_initiate_logon(mut self, initiate: bool) -> Self {
        self.initiate_logon = initiate;
        self
    }

    /// Sets whether a sequence-too-low Logout forces our sender sequence number.
    #[must_use]
    pub const fn with_logon_force_sender_msg_seq_num(mut self, force: bool) -> Self {
        self.logon_force_sender_msg_seq_num = force;
        self
    }

    /// Sets whether to reset sequence numbers on logon.
    #[must_use]
    pub const fn with_reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets whether to reset sequence numbers on logout.
    #[must_use]
    pub const fn with_reset_on_logout(mut self, reset: bool) -> Self {
        self.reset_on_logout = reset;
        self
    }

    /// Sets whether to reset sequence numbers on disconnect.
    #[must_use]
    pub const fn with_reset_on_disconnect(mut self, reset: bool) -> Self {
        self.reset_on_disconnect = reset;
        self
    }

    /// Sets whether an acceptor keeps its own heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_override(mut self, heartbeat_override: bool) -> Self {
        self.heartbeat_override = heartbeat_override;
        self
    }

    /// Sets the ResendRequest chunk size.
    #[must_use]
    pub const fn with_resend_request_chunk_size(mut self, size: u64) -> Self {
        self.resend_request_chunk_size = size;
        self
    }

    /// Sets how many out-of-order messages are held during gap recovery.
    #[must_use]
    pub const fn with_max_stashed_messages(mut self, max: usize) -> Self {
        self.max_stashed_messages = max;
        self
    }

    /// Sets SendingTime latency checking and its tolerance.
    #[must_use]
    pub const fn with_latency_check(mut self, enabled: bool, max_latency: Duration) -> Self {
        self.check_latency = enabled;
        self.max_latency = max_latency;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the logout timeout.
    #[must_use]
    pub fn with_logout_timeout(mut self, timeout: Duration) -> Self {
        self.logout_timeout = timeout;
        self
    }

    /// Sets the daily session window.
    #[must_use]
    pub fn with_schedule(mut self, schedule: SessionSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Sets the session qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    sender_comp_id: Option<String>,
    target_comp_id: Option<String>,
    begin_string: Option<String>,
    heartbeat_interval: Option<Duration>,
    acceptor: bool,
    logon_force_sender_msg_seq_num: bool,
    reset_on_logon: bool,
    reset_on_logout: bool,
    reset_on_disconnect: bool,
    resend_request_chunk_size: u64,
    schedule: Option<SessionSchedule>,
    max_message_size: Option<usize>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: impl Into<String>) -> Self {
        self.sender_comp_id = Some(id.into());
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: impl Into<String>) -> Self {
        self.target_comp_id = Some(id.into());
        self
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn begin_string(mut self, version: impl Into<String>) -> Self {
        self.begin_string = Some(version.into());
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Makes the session wait for the counterparty's Logon.
    #[must_use]
    pub const fn acceptor(mut self) -> Self {
        self.acceptor = true;
        self
    }

    /// Sets whether a sequence-too-low Logout forces our sender sequence number.
    #[must_use]
    pub const fn logon_force_sender_msg_seq_num(mut self, force: bool) -> Self {
        self.logon_force_sender_msg_seq_num = force;
        self
    }

    /// Sets whether to reset on logon.
    #[must_use]
    pub const fn reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets whether to reset on logout.
    #[must_use]
    pub const fn reset_on_logout(mut self, reset: bool) -> Self {
        self.reset_on_logout = reset;
        self
    }

    /// Sets whether to reset on disconnect.
    #[must_use]
    pub const fn reset_on_disconnect(mut self, reset: bool) -> Self {
        self.reset_on_disconnect = reset;
        self
    }

    /// Sets the ResendRequest chunk size.
    #[must_use]
    pub const fn resend_request_chunk_size(mut self, size: u64) -> Self {
        self.resend_request_chunk_size = size;
        self
    }

    /// Sets the daily session window.
    #[must_use]
    pub fn schedule(mut self, schedule: SessionSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if a CompID is missing or longer
    /// than 32 bytes.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        let sender = comp_id("sender_comp_id", self.sender_comp_id)?;
        let target = comp_id("target_comp_id", self.target_comp_id)?;
        let begin_string = self.begin_string.unwrap_or_else(|| "FIX.4.4".to_string());

        let mut config = SessionConfig::new(sender, target, begin_string);

        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval;
        }
        config.initiate_logon = !self.acceptor;
        config.logon_force_sender_msg_seq_num = self.logon_force_sender_msg_seq_num;
        config.reset_on_logon = self.reset_on_logon;
        config.reset_on_logout = self.reset_on_logout;
        config.reset_on_disconnect = self.reset_on_disconnect;
        config.resend_request_chunk_size = self.resend_request_chunk_size;
        config.schedule = self.schedule;
        if let Some(size) = self.max_message_size {
            config.max_message_size = size;
        }

        Ok(config)
    }
}

fn comp_id(name: &str, value: Option<String>) -> Result<CompId, SessionError> {
    let value = value.ok_or_else(|| SessionError::Configuration(format!("{name} is required")))?;
    CompId::new(&value).ok_or_else(|| {
        SessionError::Configuration(format!("{name} '{value}' exceeds 32 bytes"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_new() {
        let sender = CompId::new("SENDER").unwrap();
        let target = CompId::new("TARGET").unwrap();
        let config = SessionConfig::new(sender, target, "FIX.4.4");

        assert_eq!(config.sender_comp_id.as_str(), "SENDER");
        assert_eq!(config.target_comp_id.as_str(), "TARGET");
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert!(config.initiate_logon);
        assert!(!config.logon_force_sender_msg_seq_num);
        assert_eq!(config.session_id().to_string(), "FIX.4.4:SENDER->TARGET");
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfigBuilder::new()
            .sender_comp_id("SENDER")
            .target_comp_id("TARGET")
            .begin_string("FIX.4.2")
            .heartbeat_interval(Duration::from_secs(60))
            .acceptor()
            .logon_force_sender_msg_seq_num(true)
            .reset_on_logon(true)
            .resend_request_chunk_size(500)
            .build()
            .unwrap();

        assert_eq!(config.begin_string, "FIX.4.2");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert!(!config.initiate_logon);
        assert!(config.logon_force_sender_msg_seq_num);
        assert!(config.reset_on_logon);
        assert_eq!(config.resend_request_chunk_size, 500);
    }

    #[test]
    fn test_session_config_builder_missing_comp_id() {
        let err = SessionConfigBuilder::new()
            .sender_comp_id("SENDER")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Configuration("target_comp_id is required".to_string())
        );
    }

    #[test]
    fn test_session_config_with_qualifier() {
        let config = SessionConfig::new(
            CompId::new("A").unwrap(),
            CompId::new("B").unwrap(),
            "FIX.4.4",
        )
        .with_qualifier("EU");
        assert_eq!(config.session_id().qualifier.as_deref(), Some("EU"));
    }
}
