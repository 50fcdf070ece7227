use crate::models::{
    write::{NewAccount, NewTransaction},
    Account, AccountTransactionPair, Transaction, UnknownVariant,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("session is closed")]
    SessionClosed,
    #[error("store is unavailable")]
    Unavailable,
    #[error("invalid stored value: {0}")]
    InvalidData(String),
    #[error("{0}")]
    Other(String),
}

impl From<UnknownVariant> for StorageError {
    fn from(e: UnknownVariant) -> Self {
        StorageError::InvalidData(e.to_string())
    }
}

/// A live handle to a store through which statements execute.
///
/// Every method runs a single statement. Row sets are fully read before the
/// method returns, so nothing borrowed from the session outlives the call.
pub trait Session: Send {
    fn is_closed(&self) -> bool;

    fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StorageError>;
    fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction, StorageError>;

    fn account_by_number(&mut self, account_number: &str) -> Result<Option<Account>, StorageError>;
    /// Most recent first.
    fn transactions_by_account(&mut self, account_number: &str) -> Result<Vec<Transaction>, StorageError>;

    /// Inner join of accounts and transactions on the account number.
    fn account_transactions(&mut self) -> Result<Vec<AccountTransactionPair>, StorageError>;
    fn transactions(&mut self) -> Result<Vec<Transaction>, StorageError>;

    /// Closes the session. Closing an already closed session is a no-op.
    fn close(&mut self) -> Result<(), StorageError>;
}

/// Opens sessions against one configured store.
pub trait Connector: Send + Sync {
    /// Human readable address of the store, free of credentials.
    fn target(&self) -> &str;
    fn connect(&self) -> Result<Box<dyn Session>, StorageError>;
}
