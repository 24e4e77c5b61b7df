/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate Session
//!
//! FIX session state machine for the fixstate engine.
//!
//! This crate provides:
//! - **Session**: The per-connection actor context that dispatches events to states
//! - **State machine**: A closed set of session states sharing one contract
//! - **Validation**: Logon classification, message verification, session rejects
//! - **Recovery**: ResendRequest, gap fill, and forced sequence resynchronization
//! - **Timers**: Heartbeat, peer timeout, and logon/logout deadlines
//! - **Configuration**: Session configuration and daily schedule

pub mod application;
pub mod config;
pub mod event;
pub mod log;
pub mod outbound;
pub mod schedule;
pub mod session;
pub mod state;
pub mod timer;
pub mod validation;

#[cfg(test)]
mod testing;

pub use application::{Application, NoOpApplication};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use event::SessionEvent;
pub use log::{EventLog, NullLog, TracingLog};
pub use outbound::Outbound;
pub use schedule::SessionSchedule;
pub use session::Session;
pub use state::{SessionState, StateHandler};
pub use timer::SessionTimers;
pub use validation::{LogonOutcome, MessageFault, SeqMismatch, SessionReject, SessionRejectReason};
