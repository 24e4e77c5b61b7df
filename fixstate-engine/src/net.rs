/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! TCP entry points.

use crate::actor::{SessionHandle, spawn};
use crate::error::EngineError;
use fixstate_session::Session;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::info;

/// Connects to a counterparty and starts the session as initiator.
///
/// # Errors
/// Returns `EngineError::Timeout` or `EngineError::Io` if the connection
/// cannot be made, or the session's error if it refuses to start.
pub async fn connect(
    addr: impl ToSocketAddrs,
    session: Session,
    timeout: Duration,
) -> Result<SessionHandle, EngineError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| EngineError::Timeout)??;
    stream.set_nodelay(true)?;
    info!(session = %session.id(), peer = ?stream.peer_addr().ok(), "connected");
    spawn(session, stream)
}

/// Waits for one inbound connection and starts the session as acceptor.
///
/// # Errors
/// Returns `EngineError::Io` if accepting fails, or the session's error if it
/// refuses to start.
pub async fn accept(listener: &TcpListener, session: Session) -> Result<SessionHandle, EngineError> {
    let (stream, peer) = listener.accept().await?;
    stream.set_nodelay(true)?;
    info!(session = %session.id(), %peer, "accepted connection");
    spawn(session, stream)
}
