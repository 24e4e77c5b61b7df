/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Transport
//!
//! Byte-stream framing for the fixstate session engine.
//!
//! This crate provides:
//! - **Codec**: Tokio codec that splits a stream into decoded [`Message`]s and
//!   writes encoded frames

pub mod codec;

pub use codec::{CodecError, FixCodec};
pub use fixstate_core::message::Message;
