//! Core types and traits for LedgerDB storage backends.
//!
//! This crate provides the `Session` and `Connector` traits and the ledger
//! models they read and write, so each backend can live in its own crate.

pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{Account, AccountTransactionPair, AccountType, Transaction, TransactionType, UnknownVariant};
pub use models::write::{NewAccount, NewTransaction};
pub use models::timestamp;
pub use storage::{Connector, Session, StorageError};
