/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! In-memory store implementation.
//!
//! This module provides a simple in-memory store suitable for testing and
//! sessions that don't require persistence across restarts.

use crate::traits::{MessageStore, SequenceStore, check_forward};
use bytes::Bytes;
use fixstate_core::error::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// In-memory store.
///
/// Sent messages live in a `BTreeMap` for efficient range queries.
/// All data is lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore {
    /// Sent messages indexed by sequence number.
    messages: RwLock<BTreeMap<u64, Bytes>>,
    /// Next sender sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected target sequence number.
    next_target_seq: AtomicU64,
    /// Start of the current session period.
    creation_time: RwLock<SystemTime>,
}

impl MemoryStore {
    /// Creates a new empty memory store with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_seqs(1, 1)
    }

    /// Creates a new memory store with initial sequence numbers.
    ///
    /// # Arguments
    /// * `sender_seq` - Initial sender sequence number
    /// * `target_seq` - Initial target sequence number
    #[must_use]
    pub fn with_initial_seqs(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            messages: RwLock::new(BTreeMap::new()),
            next_sender_seq: AtomicU64::new(sender_seq.max(1)),
            next_target_seq: AtomicU64::new(target_seq.max(1)),
            creation_time: RwLock::new(SystemTime::now()),
        }
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    /// Checks if a message with the given sequence number exists.
    #[must_use]
    pub fn contains(&self, seq_num: u64) -> bool {
        self.messages.read().contains_key(&seq_num)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn advance(counter: &AtomicU64, seq: u64) -> Result<(), StoreError> {
    check_forward(1, seq)?;
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            (seq >= current).then_some(seq)
        })
        .map(|_| ())
        .map_err(|current| StoreError::SeqNumRegression {
            current,
            requested: seq,
        })
}

impl SequenceStore for MemoryStore {
    fn next_sender_msg_seq_num(&self) -> u64 {
        self.next_sender_seq.load(Ordering::SeqCst)
    }

    fn next_target_msg_seq_num(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    fn incr_next_sender_msg_seq_num(&self) -> Result<(), StoreError> {
        self.next_sender_seq.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn incr_next_target_msg_seq_num(&self) -> Result<(), StoreError> {
        self.next_target_seq.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        advance(&self.next_sender_seq, seq)
    }

    fn set_next_target_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        advance(&self.next_target_seq, seq)
    }

    fn force_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        if seq == 0 {
            return Err(StoreError::InvalidSeqNum { value: seq });
        }
        self.next_sender_seq.store(seq, Ordering::SeqCst);
        Ok(())
    }
}

impl MessageStore for MemoryStore {
    fn save_message(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        self.messages
            .write()
            .insert(seq_num, Bytes::copy_from_slice(message));
        Ok(())
    }

    fn get_messages(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError> {
        if begin > end {
            return Ok(Vec::new());
        }
        Ok(self
            .messages
            .read()
            .range(begin..=end)
            .map(|(seq, bytes)| (*seq, bytes.clone()))
            .collect())
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.messages.write().clear();
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
        *self.creation_time.write() = SystemTime::now();
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        *self.creation_time.read()
    }
}
