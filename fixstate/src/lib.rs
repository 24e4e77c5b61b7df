/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixstate
//!
//! The FIX session layer as an explicit state machine.
//!
//! A session moves through a closed set of states (latent, logon, in session,
//! resend, logout, pending timeout, not session time). Each state decides how
//! to treat inbound messages, timer events, and stop requests. Sequence
//! numbers are persisted through a [`store::MessageStore`], and gaps are
//! recovered with ResendRequest and SequenceReset-GapFill.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixstate::prelude::*;
//!
//! let config = SessionConfig::new(
//!     CompId::new("CLIENT").unwrap(),
//!     CompId::new("SERVER").unwrap(),
//!     "FIX.4.4",
//! );
//! let session = SessionBuilder::new(config).build();
//! let handle = connect("127.0.0.1:9876", session, Duration::from_secs(10)).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Messages, field maps, identifiers, and error definitions
//! - [`tagvalue`]: Tag=value encoding and decoding
//! - [`session`]: Session state machine
//! - [`store`]: Sequence number and message persistence
//! - [`transport`]: Framing codec
//! - [`engine`]: Tokio runtime

pub mod core {
    //! Messages, field maps, identifiers, and error definitions.
    pub use fixstate_core::*;
}

pub mod tagvalue {
    //! Tag=value encoding and decoding.
    pub use fixstate_tagvalue::*;
}

pub mod session {
    //! Session state machine.
    pub use fixstate_session::*;
}

pub mod store {
    //! Sequence number and message persistence.
    pub use fixstate_store::*;
}

pub mod transport {
    //! Framing codec.
    pub use fixstate_transport::*;
}

pub mod engine {
    //! Tokio runtime.
    pub use fixstate_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixstate_core::{
        CompId, DecodeError, EncodeError, FieldMap, FixError, Message, MsgType, SessionError,
        SessionId, StoreError, Timestamp, tags,
    };

    // Session
    pub use fixstate_session::{
        Application, EventLog, SessionConfig, SessionConfigBuilder, SessionReject,
        SessionRejectReason, SessionSchedule, SessionState, StateHandler,
    };

    // Store
    pub use fixstate_store::{FileStore, MemoryStore, MessageStore, SequenceStore};

    // Engine
    pub use fixstate_engine::{EngineError, Session, SessionBuilder, SessionHandle, accept, connect};

    pub use std::time::Duration;
}
