use ledgerdb_core::StorageError;
use thiserror::Error;

/// Failure of a ledger operation, wrapping the storage error that caused it.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No session could be established. Not retried.
    #[error("unable to connect to {target}")]
    Connection {
        target: String,
        #[source]
        source: StorageError,
    },
    /// A write failed; nothing was written.
    #[error("{operation} failed")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
    /// A read failed; no partial result is returned.
    #[error("{operation} query failed")]
    Query {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

impl LedgerError {
    pub fn storage_error(&self) -> &StorageError {
        match self {
            LedgerError::Connection { source, .. }
            | LedgerError::Persistence { source, .. }
            | LedgerError::Query { source, .. } => source,
        }
    }

    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| {
            tracing::error!(operation, error = %source, "Write failed");
            LedgerError::Persistence { operation, source }
        }
    }

    pub(crate) fn query(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| {
            tracing::error!(operation, error = %source, "Query failed");
            LedgerError::Query { operation, source }
        }
    }
}
