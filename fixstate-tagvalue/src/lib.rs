/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Tag-Value
//!
//! FIX tag=value encoding and decoding for the fixstate session engine.
//!
//! Decoding turns a complete frame into a [`Message`] with its header, body,
//! and trailer sections separated; encoding writes a [`Message`] back out with
//! BodyLength (9) and CheckSum (10) computed.

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::calculate_checksum;
pub use decoder::{Decoder, decode};
pub use encoder::{Encoder, encode};
pub use fixstate_core::message::Message;
