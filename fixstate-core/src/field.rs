/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field storage and typed lookups for FIX messages.
//!
//! This module provides:
//! - [`FieldMap`]: Ordered tag to raw value mapping with typed getters
//! - [`tags`]: Tag numbers the session layer reads or writes

use crate::error::DecodeError;
use bytes::Bytes;
use std::str::FromStr;

/// Well-known FIX tag numbers used by the session layer.
pub mod tags {
    /// BeginSeqNo (7).
    pub const BEGIN_SEQ_NO: u32 = 7;
    /// BeginString (8).
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength (9).
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum (10).
    pub const CHECK_SUM: u32 = 10;
    /// EndSeqNo (16).
    pub const END_SEQ_NO: u32 = 16;
    /// MsgSeqNum (34).
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType (35).
    pub const MSG_TYPE: u32 = 35;
    /// NewSeqNo (36).
    pub const NEW_SEQ_NO: u32 = 36;
    /// PossDupFlag (43).
    pub const POSS_DUP_FLAG: u32 = 43;
    /// RefSeqNum (45).
    pub const REF_SEQ_NUM: u32 = 45;
    /// SenderCompID (49).
    pub const SENDER_COMP_ID: u32 = 49;
    /// SenderSubID (50).
    pub const SENDER_SUB_ID: u32 = 50;
    /// SendingTime (52).
    pub const SENDING_TIME: u32 = 52;
    /// TargetCompID (56).
    pub const TARGET_COMP_ID: u32 = 56;
    /// TargetSubID (57).
    pub const TARGET_SUB_ID: u32 = 57;
    /// Text (58).
    pub const TEXT: u32 = 58;
    /// PossResend (97).
    pub const POSS_RESEND: u32 = 97;
    /// EncryptMethod (98).
    pub const ENCRYPT_METHOD: u32 = 98;
    /// HeartBtInt (108).
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID (112).
    pub const TEST_REQ_ID: u32 = 112;
    /// OnBehalfOfCompID (115).
    pub const ON_BEHALF_OF_COMP_ID: u32 = 115;
    /// OrigSendingTime (122).
    pub const ORIG_SENDING_TIME: u32 = 122;
    /// GapFillFlag (123).
    pub const GAP_FILL_FLAG: u32 = 123;
    /// DeliverToCompID (128).
    pub const DELIVER_TO_COMP_ID: u32 = 128;
    /// ResetSeqNumFlag (141).
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    /// SenderLocationID (142).
    pub const SENDER_LOCATION_ID: u32 = 142;
    /// TargetLocationID (143).
    pub const TARGET_LOCATION_ID: u32 = 143;
    /// RefTagID (371).
    pub const REF_TAG_ID: u32 = 371;
    /// RefMsgType (372).
    pub const REF_MSG_TYPE: u32 = 372;
    /// SessionRejectReason (373).
    pub const SESSION_REJECT_REASON: u32 = 373;

    /// Returns true if the tag belongs to the standard message header.
    #[must_use]
    pub const fn is_header(tag: u32) -> bool {
        matches!(
            tag,
            BEGIN_STRING
                | BODY_LENGTH
                | MSG_TYPE
                | SENDER_COMP_ID
                | TARGET_COMP_ID
                | ON_BEHALF_OF_COMP_ID
                | DELIVER_TO_COMP_ID
                | MSG_SEQ_NUM
                | SENDER_SUB_ID
                | SENDER_LOCATION_ID
                | TARGET_SUB_ID
                | TARGET_LOCATION_ID
                | POSS_DUP_FLAG
                | POSS_RESEND
                | SENDING_TIME
                | ORIG_SENDING_TIME
        )
    }

    /// Returns true if the tag belongs to the standard message trailer.
    #[must_use]
    pub const fn is_trailer(tag: u32) -> bool {
        tag == CHECK_SUM
    }
}

/// Ordered mapping from field tag to raw value.
///
/// Insertion order is preserved so that encoding reproduces the order in which
/// fields were set. Setting an existing tag replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(u32, Bytes)>,
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field to raw bytes, replacing any previous value.
    pub fn set_bytes(&mut self, tag: u32, value: impl Into<Bytes>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((tag, value)),
        }
    }

    /// Sets a string field.
    pub fn set_str(&mut self, tag: u32, value: &str) {
        self.set_bytes(tag, Bytes::copy_from_slice(value.as_bytes()));
    }

    /// Sets an unsigned integer field.
    pub fn set_uint(&mut self, tag: u32, value: u64) {
        self.set_bytes(tag, Bytes::from(value.to_string()));
    }

    /// Sets a boolean field (`Y`/`N`).
    pub fn set_bool(&mut self, tag: u32, value: bool) {
        self.set_bytes(tag, Bytes::from_static(if value { b"Y" } else { b"N" }));
    }

    /// Returns true if the tag is present.
    #[must_use]
    pub fn has(&self, tag: u32) -> bool {
        self.fields.iter().any(|(t, _)| *t == tag)
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, tag: u32) -> Option<Bytes> {
        let pos = self.fields.iter().position(|(t, _)| *t == tag)?;
        Some(self.fields.remove(pos).1)
    }

    /// Gets the raw bytes of a field.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingRequiredField` if the tag is absent.
    pub fn get_bytes(&self, tag: u32) -> Result<&[u8], DecodeError> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_ref())
            .ok_or(DecodeError::MissingRequiredField { tag })
    }

    /// Gets a field as a string slice.
    ///
    /// # Errors
    /// Returns `DecodeError` if the tag is absent or not valid UTF-8.
    pub fn get_str(&self, tag: u32) -> Result<&str, DecodeError> {
        Ok(std::str::from_utf8(self.get_bytes(tag)?)?)
    }

    /// Gets a field as an owned string.
    ///
    /// # Errors
    /// Returns `DecodeError` if the tag is absent or not valid UTF-8.
    pub fn get_string(&self, tag: u32) -> Result<String, DecodeError> {
        self.get_str(tag).map(String::from)
    }

    /// Gets a field parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value cannot be parsed.
    pub fn get_as<T: FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        let s = self.get_str(tag)?;
        s.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag,
            reason: format!("failed to parse '{}' as {}", s, std::any::type_name::<T>()),
        })
    }

    /// Gets a field as an unsigned integer.
    ///
    /// # Errors
    /// Returns `DecodeError` if the tag is absent or not a valid integer.
    pub fn get_uint(&self, tag: u32) -> Result<u64, DecodeError> {
        self.get_as(tag)
    }

    /// Gets a `Y`/`N` boolean field.
    ///
    /// # Errors
    /// Returns `DecodeError` if the tag is absent or not `Y`/`N`.
    pub fn get_bool(&self, tag: u32) -> Result<bool, DecodeError> {
        match self.get_bytes(tag)? {
            b"Y" => Ok(true),
            b"N" => Ok(false),
            other => Err(DecodeError::InvalidFieldValue {
                tag,
                reason: format!("expected Y or N, got '{}'", String::from_utf8_lossy(other)),
            }),
        }
    }

    /// Returns an iterator over `(tag, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.fields.iter().map(|(t, v)| (*t, v.as_ref()))
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = FieldMap::new();
        map.set_str(49, "A");
        map.set_str(56, "B");
        map.set_str(49, "C");

        let tags: Vec<u32> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec![49, 56]);
        assert_eq!(map.get_str(49).unwrap(), "C");
    }

    #[test]
    fn test_missing_field() {
        let map = FieldMap::new();
        assert_eq!(
            map.get_str(58),
            Err(DecodeError::MissingRequiredField { tag: 58 })
        );
    }

    #[test]
    fn test_get_uint() {
        let mut map = FieldMap::new();
        map.set_uint(34, 42);
        map.set_str(36, "abc");

        assert_eq!(map.get_uint(34).unwrap(), 42);
        assert!(matches!(
            map.get_uint(36),
            Err(DecodeError::InvalidFieldValue { tag: 36, .. })
        ));
    }

    #[test]
    fn test_get_bool() {
        let mut map = FieldMap::new();
        map.set_bool(43, true);
        map.set_str(141, "X");

        assert!(map.get_bool(43).unwrap());
        assert!(map.get_bool(141).is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut map = FieldMap::new();
        map.set_bytes(58, Bytes::from_static(&[0xff, 0xfe]));
        assert!(matches!(map.get_str(58), Err(DecodeError::InvalidUtf8(_))));
    }

    #[test]
    fn test_remove() {
        let mut map = FieldMap::new();
        map.set_str(58, "bye");
        assert_eq!(map.remove(58).as_deref(), Some(&b"bye"[..]));
        assert!(!map.has(58));
        assert!(map.is_empty());
    }

    #[test]
    fn test_header_tags() {
        assert!(tags::is_header(tags::MSG_SEQ_NUM));
        assert!(tags::is_header(tags::ORIG_SENDING_TIME));
        assert!(!tags::is_header(tags::TEXT));
        assert!(tags::is_trailer(tags::CHECK_SUM));
    }
}
