/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Store
//!
//! Sequence number and sent-message persistence for the fixstate session engine.
//!
//! This crate provides:
//! - **SequenceStore trait**: The next sender/target counters and their mutations
//! - **MessageStore trait**: Sent-message history for resend requests
//! - **MemoryStore**: In-memory store for testing and non-persistent sessions
//! - **FileStore**: File-backed store whose counters survive restarts

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{MessageStore, SequenceStore};
