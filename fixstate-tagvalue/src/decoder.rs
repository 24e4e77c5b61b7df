/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message decoder.
//!
//! Splits a complete tag=value frame into a [`Message`], routing each field to
//! the header, body, or trailer section by tag. The frame bytes are kept on the
//! message for logging.

use crate::checksum::verify_frame;
use bytes::Bytes;
use fixstate_core::error::DecodeError;
use fixstate_core::field::{FieldMap, tags};
use fixstate_core::message::Message;
use memchr::memchr;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Decodes a complete frame with checksum validation enabled.
///
/// # Errors
/// Returns `DecodeError` if the frame is malformed.
pub fn decode(input: &[u8]) -> Result<Message, DecodeError> {
    Decoder::new(input).decode()
}

/// FIX message decoder over one frame.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given frame.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes the frame into a sectioned message.
    ///
    /// The frame must start with BeginString (8), BodyLength (9), and MsgType (35)
    /// in that order and end with CheckSum (10).
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is malformed or incomplete.
    pub fn decode(&mut self) -> Result<Message, DecodeError> {
        let mut header = FieldMap::new();
        let mut body = FieldMap::new();
        let mut trailer = FieldMap::new();

        let (tag, value) = self.next_field()?.ok_or(DecodeError::Incomplete)?;
        if tag != tags::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }
        header.set_bytes(tag, Bytes::copy_from_slice(value));

        let (tag, value) = self.next_field()?.ok_or(DecodeError::MissingBodyLength)?;
        if tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        let body_length: usize = std::str::from_utf8(value)?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        header.set_bytes(tag, Bytes::copy_from_slice(value));
        let body_start = self.offset;

        let (tag, value) = self.next_field()?.ok_or(DecodeError::MissingMsgType)?;
        if tag != tags::MSG_TYPE || value.is_empty() {
            return Err(DecodeError::MissingMsgType);
        }
        header.set_bytes(tag, Bytes::copy_from_slice(value));

        let mut checksum_start = None;
        loop {
            let field_start = self.offset;
            let Some((tag, value)) = self.next_field()? else {
                break;
            };
            let value = Bytes::copy_from_slice(value);
            if tags::is_trailer(tag) {
                checksum_start = Some(field_start);
                trailer.set_bytes(tag, value);
                break;
            }
            if tags::is_header(tag) {
                header.set_bytes(tag, value);
            } else {
                body.set_bytes(tag, value);
            }
        }

        let checksum_start = checksum_start.ok_or(DecodeError::Incomplete)?;
        if checksum_start - body_start != body_length {
            return Err(DecodeError::InvalidBodyLength);
        }

        let frame = &self.input[..self.offset];
        if self.validate_checksum {
            verify_frame(frame)?;
        }

        Ok(Message::from_parts(
            header,
            body,
            trailer,
            Bytes::copy_from_slice(frame),
        ))
    }

    /// Parses the next `tag=value<SOH>` field.
    ///
    /// # Returns
    /// `Ok(None)` once the buffer is exhausted or ends mid-field.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidTag` if the tag is not a positive integer.
    pub fn next_field(&mut self) -> Result<Option<(u32, &'a [u8])>, DecodeError> {
        let input = self.input;
        let remaining = &input[self.offset..];
        let Some(eq_pos) = memchr(EQUALS, remaining) else {
            return Ok(None);
        };
        let tag_bytes = &remaining[..eq_pos];
        let tag = parse_tag(tag_bytes).ok_or_else(|| {
            DecodeError::InvalidTag(String::from_utf8_lossy(tag_bytes).into_owned())
        })?;

        let value_start = eq_pos + 1;
        let Some(soh_pos) = memchr(SOH, &remaining[value_start..]) else {
            return Ok(None);
        };
        let value = &remaining[value_start..value_start + soh_pos];
        self.offset += value_start + soh_pos + 1;

        Ok(Some((tag, value)))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    (result > 0).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{calculate_checksum, format_checksum};

    fn frame(body: &str) -> Vec<u8> {
        let mut out = format!("8=FIX.4.4\x019={}\x01{}", body.len(), body).into_bytes();
        let checksum = format_checksum(calculate_checksum(&out));
        out.extend_from_slice(b"10=");
        out.extend_from_slice(&checksum);
        out.push(SOH);
        out
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"12345"), Some(12345));
        assert_eq!(parse_tag(b"0"), None);
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_decode_splits_sections() {
        let input = frame("35=5\x0149=TARGET\x0156=SENDER\x0134=7\x0158=bye\x01");
        let msg = decode(&input).unwrap();

        assert_eq!(msg.header.get_str(tags::BEGIN_STRING).unwrap(), "FIX.4.4");
        assert_eq!(msg.header.get_str(tags::SENDER_COMP_ID).unwrap(), "TARGET");
        assert_eq!(msg.seq_num().unwrap(), 7);
        assert_eq!(msg.body.get_str(tags::TEXT).unwrap(), "bye");
        assert!(!msg.body.has(tags::MSG_SEQ_NUM));
        assert!(msg.trailer.has(tags::CHECK_SUM));
        assert_eq!(msg.raw().map(|r| r.len()), Some(input.len()));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut input = frame("35=0\x01");
        let n = input.len();
        let wrong = calculate_checksum(&input[..n - 7]).wrapping_add(1);
        input[n - 4..n - 1].copy_from_slice(&format_checksum(wrong));

        assert!(matches!(
            decode(&input),
            Err(DecodeError::ChecksumMismatch { .. })
        ));

        let relaxed = Decoder::new(&input).with_checksum_validation(false).decode();
        assert!(relaxed.is_ok());
    }

    #[test]
    fn test_decode_bad_body_length() {
        let mut input = b"8=FIX.4.4\x019=99\x0135=0\x01".to_vec();
        let checksum = format_checksum(calculate_checksum(&input));
        input.extend_from_slice(b"10=");
        input.extend_from_slice(&checksum);
        input.push(SOH);

        assert_eq!(decode(&input), Err(DecodeError::InvalidBodyLength));
    }

    #[test]
    fn test_decode_missing_msg_type() {
        let input = frame("49=TARGET\x01");
        assert_eq!(decode(&input), Err(DecodeError::MissingMsgType));
    }

    #[test]
    fn test_decode_invalid_begin_string() {
        assert_eq!(
            decode(b"9=5\x0135=0\x0110=000\x01"),
            Err(DecodeError::InvalidBeginString)
        );
    }

    #[test]
    fn test_decode_incomplete() {
        assert_eq!(decode(b"8=FIX.4.4"), Err(DecodeError::Incomplete));
    }
}
