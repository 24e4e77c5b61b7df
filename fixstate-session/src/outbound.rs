/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Outbound frame sink.

use bytes::Bytes;
use fixstate_core::error::SessionError;

/// Where encoded frames go once the session has decided to send them.
///
/// Implementations must not block for long; the engine implements this over a
/// channel drained by the connection writer.
pub trait Outbound: Send + Sync {
    /// Queues one complete frame for transmission.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection is gone.
    fn send(&self, frame: Bytes) -> Result<(), SessionError>;
}
