/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX 4.4 acceptor.
//!
//! Accepts one connection at a time from `CLIENT` and persists sequence
//! numbers under `./fixstate-store`, so a restarted client resumes where it
//! left off.

use fixstate::prelude::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

mod common;
use common::{LoggingApplication, init_logging, port};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let addr = format!("127.0.0.1:{}", port());
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let application: Arc<dyn Application> = Arc::new(LoggingApplication);
    loop {
        let config = SessionConfig::new(
            CompId::new("SERVER").ok_or("invalid CompId")?,
            CompId::new("CLIENT").ok_or("invalid CompId")?,
            "FIX.4.4",
        )
        .with_initiate_logon(false);
        let session = SessionBuilder::new(config)
            .with_application(application.clone())
            .with_file_store("fixstate-store")?
            .build();

        let handle = match accept(&listener, session).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Accept failed: {}", e);
                continue;
            }
        };
        match handle.join().await {
            Ok(session) => info!("Session ended in {}", session.state()),
            Err(e) => error!("Session failed: {}", e),
        }
    }
}
