/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session builder for fluent configuration.
//!
//! Pairs a [`SessionConfig`] with its collaborators. Anything left unset gets a
//! default: an in-memory store, a `tracing` event log, and an application that
//! ignores every callback.

use fixstate_core::error::StoreError;
use fixstate_session::{
    Application, EventLog, NoOpApplication, Session, SessionConfig, TracingLog,
};
use fixstate_store::{FileStore, MemoryStore, MessageStore};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Builder for a [`Session`] and its connection settings.
pub struct SessionBuilder {
    config: SessionConfig,
    application: Arc<dyn Application>,
    store: Option<Arc<dyn MessageStore>>,
    log: Option<Arc<dyn EventLog>>,
    connect_timeout: Duration,
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("session", &self.config.session_id())
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    /// Creates a builder for the given configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            application: Arc::new(NoOpApplication),
            store: None,
            log: None,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the application callback handler.
    #[must_use]
    pub fn with_application(mut self, application: Arc<dyn Application>) -> Self {
        self.application = application;
        self
    }

    /// Sets the sequence and message store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses a file store under `dir`, keyed by the session identity.
    ///
    /// # Errors
    /// Returns `StoreError` if the store files cannot be opened or are corrupted.
    pub fn with_file_store(self, dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = FileStore::open(dir, &self.config.session_id())?;
        Ok(self.with_store(Arc::new(store)))
    }

    /// Sets the event log.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Sets the connection timeout used by [`crate::connect`].
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Builds the session.
    #[must_use]
    pub fn build(self) -> Session {
        let id = self.config.session_id();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let log = self
            .log
            .unwrap_or_else(|| Arc::new(TracingLog::new(&id)));
        Session::new(self.config, store, log, self.application)
    }
}
