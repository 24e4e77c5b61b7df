/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Outcomes of validating inbound messages.
//!
//! This module provides:
//! - [`LogonOutcome`]: classification of an inbound Logon
//! - [`SeqMismatch`]: an inbound MsgSeqNum that differs from the expected one
//! - [`MessageFault`]: why an inbound message cannot be processed normally
//! - [`SessionReject`]: a session-level Reject (35=3) to send back

use fixstate_core::error::DecodeError;
use fixstate_core::field::tags;
use std::fmt;
use thiserror::Error;

/// Classification of an inbound Logon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogonOutcome {
    /// Logon is valid and its sequence number consumed.
    Accepted,
    /// Logon is malformed or unauthorized.
    Rejected(String),
    /// Counterparty's MsgSeqNum is behind what we expect.
    TargetTooLow(SeqMismatch),
    /// Counterparty's MsgSeqNum is ahead of what we expect.
    TargetTooHigh(SeqMismatch),
}

/// An inbound MsgSeqNum that differs from the next expected target sequence number.
///
/// The `Display` form is the text FIX engines put in a Logout when a
/// counterparty's sequence number is too low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqMismatch {
    /// Sequence number we expected.
    pub expected: u64,
    /// Sequence number we received.
    pub received: u64,
}

impl SeqMismatch {
    /// Creates a mismatch record.
    #[must_use]
    pub const fn new(expected: u64, received: u64) -> Self {
        Self { expected, received }
    }

    /// Returns true if the counterparty is behind.
    #[must_use]
    pub const fn is_too_low(&self) -> bool {
        self.received < self.expected
    }
}

impl fmt::Display for SeqMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_too_low() { "low" } else { "high" };
        write!(
            f,
            "MsgSeqNum too {}, expecting {} but received {}",
            direction, self.expected, self.received
        )
    }
}

impl std::error::Error for SeqMismatch {}

/// SessionRejectReason (tag 373) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRejectReason {
    /// Invalid tag number (0).
    InvalidTagNumber,
    /// Required tag missing (1).
    RequiredTagMissing,
    /// Tag not defined for this message type (2).
    TagNotDefinedForMsgType,
    /// Undefined tag (3).
    UndefinedTag,
    /// Tag specified without a value (4).
    TagSpecifiedWithoutValue,
    /// Value is incorrect (out of range) for this tag (5).
    ValueIsIncorrect,
    /// Incorrect data format for value (6).
    IncorrectDataFormat,
    /// CompID problem (9).
    CompIdProblem,
    /// SendingTime accuracy problem (10).
    SendingTimeAccuracyProblem,
    /// Invalid MsgType (11).
    InvalidMsgType,
    /// Other (99).
    Other,
}

impl SessionRejectReason {
    /// Returns the tag 373 code.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::InvalidTagNumber => 0,
            Self::RequiredTagMissing => 1,
            Self::TagNotDefinedForMsgType => 2,
            Self::UndefinedTag => 3,
            Self::TagSpecifiedWithoutValue => 4,
            Self::ValueIsIncorrect => 5,
            Self::IncorrectDataFormat => 6,
            Self::CompIdProblem => 9,
            Self::SendingTimeAccuracyProblem => 10,
            Self::InvalidMsgType => 11,
            Self::Other => 99,
        }
    }

    /// Returns true if this reason ends the session after the Reject is sent.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::CompIdProblem | Self::SendingTimeAccuracyProblem)
    }
}

impl fmt::Display for SessionRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidTagNumber => "Invalid tag number",
            Self::RequiredTagMissing => "Required tag missing",
            Self::TagNotDefinedForMsgType => "Tag not defined for this message type",
            Self::UndefinedTag => "Undefined tag",
            Self::TagSpecifiedWithoutValue => "Tag specified without a value",
            Self::ValueIsIncorrect => "Value is incorrect (out of range) for this tag",
            Self::IncorrectDataFormat => "Incorrect data format for value",
            Self::CompIdProblem => "CompID problem",
            Self::SendingTimeAccuracyProblem => "SendingTime accuracy problem",
            Self::InvalidMsgType => "Invalid MsgType",
            Self::Other => "Other",
        };
        f.write_str(text)
    }
}

/// A session-level rejection of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{text}")]
pub struct SessionReject {
    /// SessionRejectReason (373).
    pub reason: SessionRejectReason,
    /// RefTagID (371), if the problem is with one field.
    pub ref_tag: Option<u32>,
    /// Text (58).
    pub text: String,
}

impl SessionReject {
    /// Creates a rejection with the reason's standard text.
    #[must_use]
    pub fn new(reason: SessionRejectReason, ref_tag: Option<u32>) -> Self {
        Self {
            reason,
            ref_tag,
            text: reason.to_string(),
        }
    }

    /// Replaces the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Required tag missing.
    #[must_use]
    pub fn required_tag_missing(tag: u32) -> Self {
        Self::new(SessionRejectReason::RequiredTagMissing, Some(tag))
    }

    /// Value out of range for tag.
    #[must_use]
    pub fn value_is_incorrect(tag: Option<u32>) -> Self {
        Self::new(SessionRejectReason::ValueIsIncorrect, tag)
    }

    /// Value cannot be parsed for tag.
    #[must_use]
    pub fn incorrect_data_format(tag: u32) -> Self {
        Self::new(SessionRejectReason::IncorrectDataFormat, Some(tag))
    }

    /// SenderCompID/TargetCompID do not match the session.
    #[must_use]
    pub fn comp_id_problem() -> Self {
        Self::new(SessionRejectReason::CompIdProblem, None)
    }

    /// SendingTime is missing its counterpart or too far from local time.
    #[must_use]
    pub fn sending_time_accuracy_problem() -> Self {
        Self::new(SessionRejectReason::SendingTimeAccuracyProblem, None)
    }
}

impl From<DecodeError> for SessionReject {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::MissingRequiredField { tag } => Self::required_tag_missing(tag),
            DecodeError::InvalidFieldValue { tag, .. } => Self::incorrect_data_format(tag),
            DecodeError::MissingMsgType => Self::required_tag_missing(tags::MSG_TYPE),
            other => Self::new(SessionRejectReason::Other, other.tag()).with_text(other.to_string()),
        }
    }
}

/// Why an inbound message cannot be processed normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageFault {
    /// MsgSeqNum is ahead of the expected value; a gap must be recovered.
    #[error("{0}")]
    TargetTooHigh(SeqMismatch),
    /// MsgSeqNum is behind the expected value.
    #[error("{0}")]
    TargetTooLow(SeqMismatch),
    /// BeginString does not match the session.
    #[error("Incorrect BeginString")]
    IncorrectBeginString,
    /// The message must be answered with a session-level Reject.
    #[error("{0}")]
    Reject(SessionReject),
}

impl From<SessionReject> for MessageFault {
    fn from(reject: SessionReject) -> Self {
        Self::Reject(reject)
    }
}
