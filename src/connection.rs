use std::sync::Arc;

use ledgerdb_core::{Connector, Session};
use ledgerdb_memory::{MemoryConnector, MemoryStore};
use ledgerdb_postgres::PostgresConnector;
use ledgerdb_sqlite::SqliteConnector;

use crate::{
    config::{Backend, DatabaseConfig},
    error::LedgerError,
};

/// Builds the connector for the configured backend.
pub fn connector_for(config: &DatabaseConfig) -> Arc<dyn Connector> {
    match config.backend {
        Backend::Postgres => Arc::new(
            PostgresConnector::new(
                &config.host,
                config.port,
                &config.name,
                config.user.as_deref(),
                config.password.as_deref(),
            )
            .bootstrap_schema(config.bootstrap_schema),
        ),
        Backend::Sqlite => Arc::new(
            SqliteConnector::new(config.sqlite_path.clone()).bootstrap_schema(config.bootstrap_schema),
        ),
        Backend::Memory => Arc::new(MemoryConnector::new(Arc::new(MemoryStore::new()))),
    }
}

/// Owns at most one session and hands it out to callers.
///
/// The session is opened on first use and reopened whenever the held one
/// reports closed. Dropping the provider releases the session.
pub struct ConnectionProvider {
    connector: Arc<dyn Connector>,
    session: Option<Box<dyn Session>>,
}

impl ConnectionProvider {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    pub fn target(&self) -> &str {
        self.connector.target()
    }

    /// True while a session is held and reports itself open.
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Returns the live session, connecting first if needed.
    pub fn acquire(&mut self) -> Result<&mut dyn Session, LedgerError> {
        let session = match self.session.take() {
            Some(session) if !session.is_closed() => session,
            stale => {
                if let Some(stale) = stale {
                    tracing::warn!(target_db = %self.target(), "Held session is closed, reconnecting");
                    self.close(stale);
                }
                self.connect()?
            }
        };
        Ok(&mut **self.session.insert(session))
    }

    /// Closes the held session, if any. Failures are logged, never returned.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            self.close(session);
        }
    }

    fn close(&self, mut session: Box<dyn Session>) {
        match session.close() {
            Ok(()) => tracing::info!(target_db = %self.target(), "Database session closed"),
            Err(e) => tracing::error!(target_db = %self.target(), error = %e, "Failed to close database session"),
        }
    }

    fn connect(&self) -> Result<Box<dyn Session>, LedgerError> {
        match self.connector.connect() {
            Ok(session) => {
                tracing::info!(target_db = %self.target(), "Successfully connected to the database");
                Ok(session)
            }
            Err(source) => {
                tracing::error!(target_db = %self.target(), error = %source, "Failed to connect to database");
                Err(LedgerError::Connection {
                    target: self.target().to_string(),
                    source,
                })
            }
        }
    }
}

impl Drop for ConnectionProvider {
    fn drop(&mut self) {
        self.release();
    }
}
