//! In-memory storage backend for LedgerDB.
//!
//! A [`MemoryStore`] plays the part of the database server: it outlives the
//! sessions opened against it, so data survives a reconnect. The store can be
//! taken offline or made to drop its sessions, which is how the connection
//! handling above it is exercised without a real server.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use ledgerdb_core::{
    Account, AccountTransactionPair, Connector, NewAccount, NewTransaction, Session, StorageError,
    Transaction,
};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    transactions: BTreeMap<i64, Transaction>,
    next_account_id: i64,
    next_transaction_id: i64,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    generation: AtomicU64,
    online: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            generation: AtomicU64::new(1),
            online: AtomicBool::new(true),
        }
    }

    /// Closes every session currently open against the store.
    pub fn disconnect_all(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "Memory store dropped its sessions");
    }

    /// While offline, connects and statements fail with `Unavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Other("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Other("memory store lock poisoned".to_string()))
    }
}

pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl Connector for MemoryConnector {
    fn target(&self) -> &str {
        "memory"
    }

    fn connect(&self) -> Result<Box<dyn Session>, StorageError> {
        if !self.store.is_online() {
            return Err(StorageError::Connection("memory store is offline".to_string()));
        }
        Ok(Box::new(MemorySession {
            store: self.store.clone(),
            generation: self.store.current_generation(),
            closed: false,
        }))
    }
}

pub struct MemorySession {
    store: Arc<MemoryStore>,
    generation: u64,
    closed: bool,
}

impl MemorySession {
    fn store(&self) -> Result<&MemoryStore, StorageError> {
        if self.is_closed() {
            return Err(StorageError::SessionClosed);
        }
        if !self.store.is_online() {
            return Err(StorageError::Unavailable);
        }
        Ok(&self.store)
    }
}

fn newest_first(t: &Transaction) -> (Reverse<time::PrimitiveDateTime>, i64) {
    (Reverse(t.timestamp), t.id)
}

impl Session for MemorySession {
    fn is_closed(&self) -> bool {
        self.closed || self.generation != self.store.current_generation()
    }

    fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StorageError> {
        let mut tables = self.store()?.write()?;
        if tables.accounts.values().any(|a| a.account_number == account.account_number) {
            return Err(StorageError::DuplicateKey(account.account_number.clone()));
        }
        tables.next_account_id += 1;
        let row = Account {
            id: tables.next_account_id,
            account_number: account.account_number.clone(),
            balance: account.balance,
            owner_name: account.owner_name.clone(),
            created_at: account.created_at_or_now(),
            account_type: account.account_type,
        };
        tables.accounts.insert(row.id, row.clone());
        tracing::debug!(id = row.id, account_number = %row.account_number, "Account inserted");
        Ok(row)
    }

    fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction, StorageError> {
        let mut tables = self.store()?.write()?;
        tables.next_transaction_id += 1;
        let row = Transaction {
            id: tables.next_transaction_id,
            account_number: transaction.account_number.clone(),
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            timestamp: transaction.timestamp_or_now(),
            description: transaction.description.clone(),
        };
        tables.transactions.insert(row.id, row.clone());
        tracing::debug!(id = row.id, account_number = %row.account_number, "Transaction inserted");
        Ok(row)
    }

    fn account_by_number(&mut self, account_number: &str) -> Result<Option<Account>, StorageError> {
        let tables = self.store()?.read()?;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    fn transactions_by_account(&mut self, account_number: &str) -> Result<Vec<Transaction>, StorageError> {
        let tables = self.store()?.read()?;
        let mut rows: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| t.account_number == account_number)
            .cloned()
            .collect();
        rows.sort_by_key(|t| (Reverse(t.timestamp), Reverse(t.id)));
        Ok(rows)
    }

    fn account_transactions(&mut self) -> Result<Vec<AccountTransactionPair>, StorageError> {
        let tables = self.store()?.read()?;
        let mut by_account: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for t in tables.transactions.values() {
            by_account.entry(t.account_number.as_str()).or_default().push(t);
        }

        let mut rows = Vec::new();
        for account in tables.accounts.values() {
            let Some(transactions) = by_account.get_mut(account.account_number.as_str()) else {
                continue;
            };
            transactions.sort_by_key(|t| newest_first(t));
            for t in transactions.iter() {
                rows.push(AccountTransactionPair {
                    account: account.clone(),
                    transaction: (*t).clone(),
                });
            }
        }
        Ok(rows)
    }

    fn transactions(&mut self) -> Result<Vec<Transaction>, StorageError> {
        let tables = self.store()?.read()?;
        Ok(tables.transactions.values().cloned().collect())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_core::{AccountType, TransactionType};
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn connect(store: &Arc<MemoryStore>) -> Box<dyn Session> {
        MemoryConnector::new(store.clone()).connect().unwrap()
    }

    #[test]
    fn test_memory_basic_operations() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);

        let account = session
            .insert_account(&NewAccount::new("100", dec!(10.00), "Ann", AccountType::Checking))
            .unwrap();
        assert_eq!(account.id, 1);

        session
            .insert_transaction(
                &NewTransaction::new("100", dec!(5), TransactionType::Deposit, "a")
                    .at(datetime!(2024-01-01 10:00)),
            )
            .unwrap();
        session
            .insert_transaction(
                &NewTransaction::new("100", dec!(7), TransactionType::Deposit, "b")
                    .at(datetime!(2024-01-02 10:00)),
            )
            .unwrap();

        let found = session.account_by_number("100").unwrap().unwrap();
        assert_eq!(found, account);
        assert!(session.account_by_number("999").unwrap().is_none());

        let history = session.transactions_by_account("100").unwrap();
        let descriptions: Vec<_> = history.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["b", "a"]);
    }

    #[test]
    fn test_memory_rejects_duplicate_account_number() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);
        let new = NewAccount::new("100", dec!(0), "Ann", AccountType::Savings);
        session.insert_account(&new).unwrap();

        let err = session.insert_account(&new).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(n) if n == "100"));
    }

    #[test]
    fn test_memory_join_skips_orphans_and_empty_accounts() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);
        session
            .insert_account(&NewAccount::new("100", dec!(0), "Ann", AccountType::Savings))
            .unwrap();
        session
            .insert_account(&NewAccount::new("200", dec!(0), "Bob", AccountType::Savings))
            .unwrap();
        session
            .insert_transaction(&NewTransaction::new("100", dec!(1), TransactionType::Deposit, "x"))
            .unwrap();
        session
            .insert_transaction(&NewTransaction::new("300", dec!(1), TransactionType::Deposit, "orphan"))
            .unwrap();

        let rows = session.account_transactions().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account.account_number, "100");
        assert_eq!(session.transactions().unwrap().len(), 2);
    }

    #[test]
    fn test_memory_sessions_observe_disconnects() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);
        assert!(!session.is_closed());

        store.disconnect_all();
        assert!(session.is_closed());
        assert!(matches!(session.transactions(), Err(StorageError::SessionClosed)));

        let mut fresh = connect(&store);
        assert!(fresh.transactions().unwrap().is_empty());
    }

    #[test]
    fn test_memory_offline_store() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);

        store.set_online(false);
        assert!(matches!(session.transactions(), Err(StorageError::Unavailable)));
        assert!(MemoryConnector::new(store.clone()).connect().is_err());

        store.set_online(true);
        assert!(session.transactions().is_ok());
    }

    #[test]
    fn test_memory_close_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut session = connect(&store);
        session.close().unwrap();
        session.close().unwrap();
        assert!(session.is_closed());
    }
}
