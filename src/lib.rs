//! LedgerDB: accounts, transactions and three ledger reports over a
//! relational store.
//!
//! Callers own a [`ConnectionProvider`] and pass the session it hands out to
//! each operation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerdb::{connection::ConnectionProvider, reports};
//! use ledgerdb_sqlite::SqliteConnector;
//!
//! let mut provider = ConnectionProvider::new(Arc::new(SqliteConnector::new("ledger.db")));
//! let balances = reports::account_balances(provider.acquire()?)?;
//! # Ok::<(), ledgerdb::LedgerError>(())
//! ```

pub mod accounts;
pub mod config;
pub mod connection;
pub mod error;
pub mod render;
pub mod reports;
pub mod transactions;

pub use connection::ConnectionProvider;
pub use error::LedgerError;
pub use ledgerdb_core::{
    Account, AccountTransactionPair, AccountType, NewAccount, NewTransaction, Session, StorageError, Transaction,
    TransactionType,
};
