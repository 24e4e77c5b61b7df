/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Store trait definitions.
//!
//! The session layer needs two things from persistence: the pair of next
//! expected sequence numbers, and the history of sent messages to answer
//! resend requests. Every method is an independent atomic operation; callers
//! never rely on two calls being applied together.

use bytes::Bytes;
use fixstate_core::error::StoreError;
use std::time::SystemTime;

/// Persistent counters for the next sender and target sequence numbers.
///
/// Both counters are strictly positive. Plain sets only move a counter forward;
/// [`SequenceStore::force_next_sender_msg_seq_num`] and [`MessageStore::reset`]
/// are the only operations allowed to move one backwards.
pub trait SequenceStore: Send + Sync {
    /// Returns the next sequence number to use for an outgoing message.
    fn next_sender_msg_seq_num(&self) -> u64;

    /// Returns the sequence number expected on the next incoming message.
    fn next_target_msg_seq_num(&self) -> u64;

    /// Increments the next sender sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the new value cannot be persisted.
    fn incr_next_sender_msg_seq_num(&self) -> Result<(), StoreError>;

    /// Increments the next target sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the new value cannot be persisted.
    fn incr_next_target_msg_seq_num(&self) -> Result<(), StoreError>;

    /// Moves the next sender sequence number forward.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidSeqNum` for zero, `StoreError::SeqNumRegression`
    /// if `seq` is below the current value, or an I/O error.
    fn set_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError>;

    /// Moves the next target sequence number forward.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidSeqNum` for zero, `StoreError::SeqNumRegression`
    /// if `seq` is below the current value, or an I/O error.
    fn set_next_target_msg_seq_num(&self, seq: u64) -> Result<(), StoreError>;

    /// Overwrites the next sender sequence number, in either direction.
    ///
    /// Used when the counterparty reports it expects a different sequence
    /// number than the one we hold, meaning our local state was lost.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidSeqNum` for zero, or an I/O error.
    fn force_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError>;
}

/// Sequence counters plus the history of sent messages.
pub trait MessageStore: SequenceStore {
    /// Records an outgoing message for potential resend.
    ///
    /// # Errors
    /// Returns `StoreError` if the message cannot be stored.
    fn save_message(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError>;

    /// Records an outgoing message and increments the next sender sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if either step fails.
    fn save_message_and_incr_next_sender(
        &self,
        seq_num: u64,
        message: &[u8],
    ) -> Result<(), StoreError> {
        self.save_message(seq_num, message)?;
        self.incr_next_sender_msg_seq_num()
    }

    /// Returns the stored messages with sequence numbers in `begin..=end`, in order.
    ///
    /// Gaps in the history are skipped rather than reported.
    ///
    /// # Errors
    /// Returns `StoreError` if messages cannot be read.
    fn get_messages(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError>;

    /// Clears the history and resets both counters to 1.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset cannot be persisted.
    fn reset(&self) -> Result<(), StoreError>;

    /// Reloads state from the backing storage.
    ///
    /// # Errors
    /// Returns `StoreError` if the refresh fails.
    fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Returns the time the store's current session period began.
    fn creation_time(&self) -> SystemTime;
}

/// Checks a requested plain set against the current counter value.
pub(crate) fn check_forward(current: u64, requested: u64) -> Result<(), StoreError> {
    if requested == 0 {
        return Err(StoreError::InvalidSeqNum { value: requested });
    }
    if requested < current {
        return Err(StoreError::SeqNumRegression { current, requested });
    }
    Ok(())
}
