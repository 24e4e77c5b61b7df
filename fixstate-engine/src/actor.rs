/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session actor.
//!
//! One task owns one [`Session`] and one connection. Inbound frames, timer
//! ticks, and commands are handled strictly one at a time; frames the session
//! emits go through an unbounded channel drained by the same task, so a send
//! never blocks the state machine.

use crate::error::EngineError;
use bytes::Bytes;
use chrono::Utc;
use fixstate_core::error::{FixError, SessionError};
use fixstate_core::message::Message;
use fixstate_session::{Outbound, Session};
use fixstate_transport::FixCodec;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// How often timers and the schedule are checked.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Depth of the command queue.
const COMMAND_QUEUE: usize = 64;

/// [`Outbound`] that queues frames for the actor's writer.
#[derive(Debug, Clone)]
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelOutbound {
    /// Creates an outbound sink feeding `tx`.
    #[must_use]
    pub const fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        Self { tx }
    }
}

impl Outbound for ChannelOutbound {
    fn send(&self, frame: Bytes) -> Result<(), SessionError> {
        self.tx
            .send(frame)
            .map_err(|_| SessionError::Connection("writer closed".to_string()))
    }
}

#[derive(Debug)]
enum Command {
    Send(Message, oneshot::Sender<Result<(), FixError>>),
    Stop,
}

/// Handle to a running session actor.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<Session>,
}

impl SessionHandle {
    /// Sends an application message.
    ///
    /// # Errors
    /// Returns `EngineError::Closed` if the actor has exited, or the session's
    /// error if it is not logged on or the send fails.
    pub async fn send(&self, msg: Message) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Send(msg, reply_tx))
            .await
            .map_err(|_| EngineError::Closed)?;
        reply_rx.await.map_err(|_| EngineError::Closed)??;
        Ok(())
    }

    /// Asks the session to log out.
    ///
    /// # Errors
    /// Returns `EngineError::Closed` if the actor has exited.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.commands
            .send(Command::Stop)
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Returns true once the actor has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the connection to end and returns the session for reuse.
    ///
    /// # Errors
    /// Returns `EngineError::Join` if the actor panicked.
    pub async fn join(self) -> Result<Session, EngineError> {
        drop(self.commands);
        Ok(self.task.await?)
    }
}

/// Spawns an actor running `session` over `stream`.
///
/// # Errors
/// Returns the session's error if it cannot start on a new connection, e.g.
/// because it is outside its schedule.
pub fn spawn<S>(mut session: Session, stream: S) -> Result<SessionHandle, EngineError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    session.on_connect(Arc::new(ChannelOutbound::new(frames_tx)))?;

    let codec = FixCodec::new()
        .with_max_message_size(session.config().max_message_size)
        .with_checksum_validation(session.config().validate_checksum);
    let framed = Framed::new(stream, codec);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);

    let task = tokio::spawn(run(session, framed, frames_rx, commands_rx));
    Ok(SessionHandle {
        commands: commands_tx,
        task,
    })
}

async fn run<S>(
    mut session: Session,
    mut framed: Framed<S, FixCodec>,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
    mut commands: mpsc::Receiver<Command>,
) -> Session
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut commands_open = true;
    info!(session = %session.id(), "session actor started");

    loop {
        tokio::select! {
            biased;

            Some(frame) = frames.recv() => {
                if let Err(e) = framed.send(frame).await {
                    warn!(session = %session.id(), error = %e, "write failed");
                    session.on_disconnect();
                }
            }
            inbound = framed.next() => match inbound {
                Some(Ok(msg)) => session.dispatch_message(&msg),
                Some(Err(e)) => {
                    warn!(session = %session.id(), error = %e, "read failed");
                    session.on_disconnect();
                }
                None => {
                    debug!(session = %session.id(), "peer closed connection");
                    session.on_disconnect();
                }
            },
            command = commands.recv(), if commands_open => match command {
                Some(Command::Send(msg, reply)) => {
                    let _ = reply.send(session.send_app(msg));
                }
                Some(Command::Stop) => session.stop(),
                None => {
                    commands_open = false;
                    session.stop();
                }
            },
            _ = tick.tick() => session.on_tick(Instant::now().into_std(), Utc::now()),
        }

        if !session.is_connected() {
            break;
        }
    }

    while let Ok(frame) = frames.try_recv() {
        if framed.send(frame).await.is_err() {
            break;
        }
    }
    info!(session = %session.id(), state = %session.state(), "session actor stopped");
    session
}
