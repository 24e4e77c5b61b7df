/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX checksum calculation and verification.
//!
//! The checksum is the sum of every byte before the `10=` field modulo 256,
//! written as three zero-padded digits.

use fixstate_core::error::DecodeError;

/// Length of the trailing `10=NNN<SOH>` field.
pub const CHECKSUM_FIELD_LEN: usize = 7;

/// Calculates the FIX checksum for the given data.
///
/// # Example
/// ```
/// use fixstate_tagvalue::calculate_checksum;
///
/// assert_eq!(calculate_checksum(b"ABC"), 198);
/// ```
#[inline]
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Formats a checksum value as three ASCII digits.
#[inline]
#[must_use]
pub fn format_checksum(checksum: u8) -> [u8; 3] {
    [
        b'0' + checksum / 100,
        b'0' + (checksum / 10) % 10,
        b'0' + checksum % 10,
    ]
}

/// Parses a three-digit checksum value.
///
/// Returns `None` unless `bytes` is exactly three ASCII digits with a value below 256.
#[inline]
#[must_use]
pub fn parse_checksum(bytes: &[u8]) -> Option<u8> {
    let [a, b, c] = bytes else {
        return None;
    };
    if !(a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit()) {
        return None;
    }
    let value = u32::from(a - b'0') * 100 + u32::from(b - b'0') * 10 + u32::from(c - b'0');
    u8::try_from(value).ok()
}

/// Verifies the checksum of a complete frame ending in `10=NNN<SOH>`.
///
/// # Errors
/// Returns `DecodeError::Incomplete` if the frame is too short,
/// `DecodeError::InvalidFieldValue` for a malformed checksum field, and
/// `DecodeError::ChecksumMismatch` when the values differ.
pub fn verify_frame(frame: &[u8]) -> Result<(), DecodeError> {
    let split = frame
        .len()
        .checked_sub(CHECKSUM_FIELD_LEN)
        .ok_or(DecodeError::Incomplete)?;
    let (payload, trailer) = frame.split_at(split);
    if !trailer.starts_with(b"10=") {
        return Err(DecodeError::InvalidFieldValue {
            tag: 10,
            reason: "frame does not end with a checksum field".to_string(),
        });
    }
    let declared = parse_checksum(&trailer[3..6]).ok_or_else(|| DecodeError::InvalidFieldValue {
        tag: 10,
        reason: "invalid checksum format".to_string(),
    })?;
    let calculated = calculate_checksum(payload);
    if calculated != declared {
        return Err(DecodeError::ChecksumMismatch {
            calculated,
            declared,
        });
    }
    Ok(())
}
