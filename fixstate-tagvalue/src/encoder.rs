/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! [`Encoder`] appends tag=value fields and finishes the frame with
//! BeginString, BodyLength, and CheckSum. [`encode`] writes a whole [`Message`].

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, BytesMut};
use fixstate_core::error::EncodeError;
use fixstate_core::field::tags;
use fixstate_core::message::Message;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Encodes a message, computing BodyLength (9) and CheckSum (10).
///
/// MsgType is written first, followed by the remaining header fields, the body,
/// and any trailer fields other than the checksum. Values already present for
/// tags 9 and 10 are ignored.
///
/// # Errors
/// Returns `EncodeError::MissingRequiredField` if BeginString (8) or MsgType (35)
/// is missing from the header.
pub fn encode(msg: &Message) -> Result<BytesMut, EncodeError> {
    let begin_string = msg
        .header
        .get_str(tags::BEGIN_STRING)
        .map_err(|_| EncodeError::MissingRequiredField {
            tag: tags::BEGIN_STRING,
        })?;
    let msg_type = msg
        .header
        .get_bytes(tags::MSG_TYPE)
        .map_err(|_| EncodeError::MissingRequiredField {
            tag: tags::MSG_TYPE,
        })?;

    let mut encoder = Encoder::new(begin_string);
    encoder.put_raw(tags::MSG_TYPE, msg_type);
    for (tag, value) in msg.header.iter() {
        if !matches!(tag, tags::BEGIN_STRING | tags::BODY_LENGTH | tags::MSG_TYPE) {
            encoder.put_raw(tag, value);
        }
    }
    for (tag, value) in msg.body.iter() {
        encoder.put_raw(tag, value);
    }
    for (tag, value) in msg.trailer.iter() {
        if tag != tags::CHECK_SUM {
            encoder.put_raw(tag, value);
        }
    }
    Ok(encoder.finish())
}

/// FIX message encoder.
///
/// Fields are appended to the body buffer in call order; [`Encoder::finish`]
/// prepends BeginString and BodyLength and appends the checksum.
#[derive(Debug)]
pub struct Encoder {
    /// Buffer for the message body (between BodyLength and Checksum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
}

impl Encoder {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            body: BytesMut::with_capacity(256),
            begin_string: begin_string.into(),
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Finalizes the message and returns the complete encoded frame.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(self.body.len());

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + self.body.len() + 16);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&message));
        message.put_slice(b"10=");
        message.put_slice(&checksum);
        message.put_u8(SOH);

        message
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
