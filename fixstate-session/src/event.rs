/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Timer events delivered to session states.

use std::fmt;

/// A discrete timer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Nothing was sent for one heartbeat interval.
    NeedHeartbeat,
    /// Nothing was received for the peer timeout.
    PeerTimeout,
    /// The counterparty did not answer our Logon, or never sent one.
    LogonTimeout,
    /// The counterparty did not answer our Logout.
    LogoutTimeout,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NeedHeartbeat => "NeedHeartbeat",
            Self::PeerTimeout => "PeerTimeout",
            Self::LogonTimeout => "LogonTimeout",
            Self::LogoutTimeout => "LogoutTimeout",
        };
        f.write_str(name)
    }
}
