/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX 4.4 initiator.
//!
//! Logs on to the acceptor example, sends a few orders, and logs out.

use fixstate::prelude::*;
use std::sync::Arc;
use tracing::info;

mod common;
use common::{LoggingApplication, init_logging, port};

fn order(id: usize) -> Message {
    let mut msg = Message::new(&MsgType::App("D".to_string()));
    msg.body.set_str(11, &format!("ORD{id}"));
    msg.body.set_str(55, "EURUSD");
    msg.body.set_str(54, "1");
    msg.body.set_uint(38, 100);
    msg.body.set_str(40, "1");
    msg
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = SessionConfig::new(
        CompId::new("CLIENT").ok_or("invalid CompId")?,
        CompId::new("SERVER").ok_or("invalid CompId")?,
        "FIX.4.4",
    )
    .with_heartbeat_interval(Duration::from_secs(10));
    let builder = SessionBuilder::new(config)
        .with_application(Arc::new(LoggingApplication))
        .with_connect_timeout(Duration::from_secs(5));
    let timeout = builder.connect_timeout();

    let handle = connect(("127.0.0.1", port()), builder.build(), timeout).await?;

    let mut sent = 0;
    while sent < 3 {
        match handle.send(order(sent)).await {
            Ok(()) => sent += 1,
            Err(EngineError::Closed) => break,
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    info!("Sent {} orders", sent);

    handle.stop().await?;
    let session = handle.join().await?;
    info!(
        "Logged out, next sender seq {}",
        session.store().next_sender_msg_seq_num()
    );
    Ok(())
}
