/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Core
//!
//! Core types, messages, and error definitions for the fixstate FIX session engine.
//!
//! This crate provides the building blocks shared by every fixstate crate:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Fields**: [`FieldMap`] with typed lookups and the well-known [`tags`]
//! - **Messages**: [`Message`] split into header, body, and trailer sections
//! - **Core types**: `Timestamp`, `CompId`, `SessionId`

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, Result, SessionError, StoreError};
pub use field::{FieldMap, tags};
pub use message::{Message, MsgType};
pub use types::{CompId, SessionId, Timestamp};
