/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message types for the FIX session layer.
//!
//! This module provides:
//! - [`MsgType`]: The session-level message types, with everything else carried as `App`
//! - [`Message`]: A parsed message with header, body, and trailer sections

use crate::error::DecodeError;
use crate::field::{FieldMap, tags};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// FIX message type (tag 35).
///
/// The administrative types are named; application types are kept opaque
/// since the session layer never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Heartbeat (0).
    Heartbeat,
    /// Test Request (1).
    TestRequest,
    /// Resend Request (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// Sequence Reset (4).
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
    /// Any application-level message type.
    App(String),
}

impl std::str::FromStr for MsgType {
    type Err = DecodeError;

    /// Parses the tag 35 value.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingMsgType` for an empty value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" => return Err(DecodeError::MissingMsgType),
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            other => Self::App(other.to_string()),
        })
    }
}

impl MsgType {
    /// Returns the wire representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::App(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        !matches!(self, Self::App(_))
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A FIX message split into header, body, and trailer sections.
///
/// Messages produced by the decoder keep the raw bytes they were parsed from,
/// which is what [`fmt::Display`] prints (with SOH shown as `|`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Standard header fields.
    pub header: FieldMap,
    /// Body fields.
    pub body: FieldMap,
    /// Trailer fields.
    pub trailer: FieldMap,
    raw: Option<Bytes>,
}

impl Message {
    /// Creates an empty message with only the MsgType set.
    #[must_use]
    pub fn new(msg_type: &MsgType) -> Self {
        let mut msg = Self::default();
        msg.header.set_str(tags::MSG_TYPE, msg_type.as_str());
        msg
    }

    /// Creates a message from its sections and the bytes it was decoded from.
    #[must_use]
    pub fn from_parts(header: FieldMap, body: FieldMap, trailer: FieldMap, raw: Bytes) -> Self {
        Self {
            header,
            body,
            trailer,
            raw: Some(raw),
        }
    }

    /// Returns the message type from the header.
    ///
    /// # Errors
    /// Returns `DecodeError` if tag 35 is missing, empty, or not UTF-8.
    pub fn msg_type(&self) -> Result<MsgType, DecodeError> {
        self.header.get_str(tags::MSG_TYPE)?.parse()
    }

    /// Returns true if the header carries the given message type.
    #[must_use]
    pub fn is_msg_type(&self, msg_type: &MsgType) -> bool {
        self.header
            .get_bytes(tags::MSG_TYPE)
            .is_ok_and(|v| v == msg_type.as_str().as_bytes())
    }

    /// Returns the MsgSeqNum from the header.
    ///
    /// # Errors
    /// Returns `DecodeError` if tag 34 is missing or not an integer.
    pub fn seq_num(&self) -> Result<u64, DecodeError> {
        self.header.get_uint(tags::MSG_SEQ_NUM)
    }

    /// Returns the bytes this message was decoded from, if any.
    #[must_use]
    pub fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }

    /// Drops the cached raw bytes, typically before the message is modified and re-encoded.
    pub fn clear_raw(&mut self) {
        self.raw = None;
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            for &b in raw.iter() {
                let c = if b == 0x01 { '|' } else { b as char };
                write!(f, "{c}")?;
            }
            return Ok(());
        }
        for section in [&self.header, &self.body, &self.trailer] {
            for (tag, value) in section.iter() {
                write!(f, "{}={}|", tag, String::from_utf8_lossy(value))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_from_str() {
        assert_eq!("0".parse::<MsgType>().unwrap(), MsgType::Heartbeat);
        assert_eq!("A".parse::<MsgType>().unwrap(), MsgType::Logon);
        assert_eq!("5".parse::<MsgType>().unwrap(), MsgType::Logout);
        assert_eq!(
            "D".parse::<MsgType>().unwrap(),
            MsgType::App("D".to_string())
        );
        assert!("".parse::<MsgType>().is_err());
    }

    #[test]
    fn test_msg_type_is_admin() {
        assert!(MsgType::Heartbeat.is_admin());
        assert!(MsgType::Logon.is_admin());
        assert!(!MsgType::App("8".into()).is_admin());
    }

    #[test]
    fn test_message_msg_type() {
        let msg = Message::new(&MsgType::Logout);
        assert_eq!(msg.msg_type().unwrap(), MsgType::Logout);
        assert!(msg.is_msg_type(&MsgType::Logout));
        assert!(!msg.is_msg_type(&MsgType::Logon));
    }

    #[test]
    fn test_message_missing_msg_type() {
        let msg = Message::default();
        assert_eq!(
            msg.msg_type(),
            Err(DecodeError::MissingRequiredField { tag: 35 })
        );
    }

    #[test]
    fn test_message_display_without_raw() {
        let mut msg = Message::new(&MsgType::Logout);
        msg.body.set_str(tags::TEXT, "bye");
        assert_eq!(msg.to_string(), "35=5|58=bye|");
    }

    #[test]
    fn test_message_display_with_raw() {
        let msg = Message::from_parts(
            FieldMap::new(),
            FieldMap::new(),
            FieldMap::new(),
            Bytes::from_static(b"8=FIX.4.4\x0135=0\x01"),
        );
        assert_eq!(msg.to_string(), "8=FIX.4.4|35=0|");
    }
}
