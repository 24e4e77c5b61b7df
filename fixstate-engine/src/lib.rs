/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Engine
//!
//! Async runtime for fixstate sessions.
//!
//! This crate provides:
//! - **Actor**: One tokio task per connection driving a [`Session`]
//! - **Initiator**: [`connect`] to a counterparty
//! - **Acceptor**: [`accept`] one inbound connection
//! - **Builder API**: Fluent wiring of a session and its collaborators

pub mod actor;
pub mod builder;
pub mod error;
pub mod net;

pub use actor::{ChannelOutbound, SessionHandle, spawn};
pub use builder::SessionBuilder;
pub use error::EngineError;
pub use fixstate_session::Session;
pub use net::{accept, connect};
