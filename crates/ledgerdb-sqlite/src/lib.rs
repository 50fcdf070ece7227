//! SQLite storage backend for LedgerDB.

use std::str::FromStr;

use ledgerdb_core::{
    timestamp, Account, AccountTransactionPair, Connector, NewAccount, NewTransaction, Session,
    StorageError, Transaction,
};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_number TEXT NOT NULL UNIQUE,
        balance TEXT NOT NULL,
        owner_name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        type TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_number TEXT NOT NULL,
        amount TEXT NOT NULL,
        type TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        description TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_transactions_account_time
        ON transactions(account_number, timestamp);
";

const ACCOUNT_COLUMNS: &str = "a.id, a.account_number, a.balance, a.owner_name, a.created_at, a.type";
const TRANSACTION_COLUMNS: &str = "t.id, t.account_number, t.amount, t.type, t.timestamp, t.description";

pub struct SqliteConnector {
    path: String,
    bootstrap_schema: bool,
}

impl SqliteConnector {
    /// `path` may be `:memory:`, in which case every session sees a fresh database.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bootstrap_schema: true,
        }
    }

    pub fn bootstrap_schema(mut self, enabled: bool) -> Self {
        self.bootstrap_schema = enabled;
        self
    }
}

impl Connector for SqliteConnector {
    fn target(&self) -> &str {
        &self.path
    }

    fn connect(&self) -> Result<Box<dyn Session>, StorageError> {
        let conn = if self.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if self.path != ":memory:" {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }
        if self.bootstrap_schema {
            conn.execute_batch(SCHEMA).map_err(map_err)?;
        }

        tracing::debug!(path = %self.path, "SQLite session opened");
        Ok(Box::new(SqliteSession { conn: Some(conn) }))
    }
}

pub struct SqliteSession {
    conn: Option<Connection>,
}

impl SqliteSession {
    fn conn(&self) -> Result<&Connection, StorageError> {
        self.conn.as_ref().ok_or(StorageError::SessionClosed)
    }
}

fn map_err(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StorageError::DuplicateKey(e.to_string())
        }
        _ => StorageError::Other(e.to_string()),
    }
}

fn ts_to_str(ts: time::PrimitiveDateTime) -> Result<String, StorageError> {
    timestamp::format(ts).map_err(|e| StorageError::InvalidData(e.to_string()))
}

fn str_to_ts(s: &str) -> Result<time::PrimitiveDateTime, StorageError> {
    timestamp::parse(s).map_err(|e| StorageError::InvalidData(format!("timestamp `{}`: {}", s, e)))
}

fn str_to_decimal(s: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(s).map_err(|e| StorageError::InvalidData(format!("decimal `{}`: {}", s, e)))
}

/// Column values as SQLite hands them back, before domain parsing.
struct RawAccount {
    id: i64,
    account_number: String,
    balance: String,
    owner_name: String,
    created_at: String,
    account_type: String,
}

impl RawAccount {
    fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(at)?,
            account_number: row.get(at + 1)?,
            balance: row.get(at + 2)?,
            owner_name: row.get(at + 3)?,
            created_at: row.get(at + 4)?,
            account_type: row.get(at + 5)?,
        })
    }

    fn into_account(self) -> Result<Account, StorageError> {
        Ok(Account {
            id: self.id,
            account_number: self.account_number,
            balance: str_to_decimal(&self.balance)?,
            owner_name: self.owner_name,
            created_at: str_to_ts(&self.created_at)?,
            account_type: self.account_type.parse()?,
        })
    }
}

struct RawTransaction {
    id: i64,
    account_number: String,
    amount: String,
    transaction_type: String,
    timestamp: String,
    description: String,
}

impl RawTransaction {
    fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(at)?,
            account_number: row.get(at + 1)?,
            amount: row.get(at + 2)?,
            transaction_type: row.get(at + 3)?,
            timestamp: row.get(at + 4)?,
            description: row.get(at + 5)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction, StorageError> {
        Ok(Transaction {
            id: self.id,
            account_number: self.account_number,
            amount: str_to_decimal(&self.amount)?,
            transaction_type: self.transaction_type.parse()?,
            timestamp: str_to_ts(&self.timestamp)?,
            description: self.description,
        })
    }
}

impl SqliteSession {
    fn query_transactions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(map_err)?;
        let raw = stmt
            .query_map(params, |row| RawTransaction::read(row, 0))
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        raw.into_iter().map(RawTransaction::into_transaction).collect()
    }
}

impl Session for SqliteSession {
    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StorageError> {
        let conn = self.conn()?;
        let created_at = account.created_at_or_now();
        conn.execute(
            "INSERT INTO accounts (account_number, balance, owner_name, created_at, type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.account_number,
                account.balance.to_string(),
                account.owner_name,
                ts_to_str(created_at)?,
                account.account_type.as_str(),
            ],
        )
        .map_err(map_err)?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            account_number: account.account_number.clone(),
            balance: account.balance,
            owner_name: account.owner_name.clone(),
            created_at,
            account_type: account.account_type,
        })
    }

    fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction, StorageError> {
        let conn = self.conn()?;
        let ts = transaction.timestamp_or_now();
        conn.execute(
            "INSERT INTO transactions (account_number, amount, type, timestamp, description)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transaction.account_number,
                transaction.amount.to_string(),
                transaction.transaction_type.as_str(),
                ts_to_str(ts)?,
                transaction.description,
            ],
        )
        .map_err(map_err)?;

        Ok(Transaction {
            id: conn.last_insert_rowid(),
            account_number: transaction.account_number.clone(),
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            timestamp: ts,
            description: transaction.description.clone(),
        })
    }

    fn account_by_number(&mut self, account_number: &str) -> Result<Option<Account>, StorageError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM accounts a WHERE a.account_number = ?1", ACCOUNT_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(map_err)?;
        let mut rows = stmt
            .query_map(params![account_number], |row| RawAccount::read(row, 0))
            .map_err(map_err)?;
        let raw = match rows.next() {
            Some(raw) => raw.map_err(map_err)?,
            None => return Ok(None),
        };
        raw.into_account().map(Some)
    }

    fn transactions_by_account(&mut self, account_number: &str) -> Result<Vec<Transaction>, StorageError> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.account_number = ?1
             ORDER BY t.timestamp DESC, t.id DESC",
            TRANSACTION_COLUMNS
        );
        self.query_transactions(&sql, params![account_number])
    }

    fn account_transactions(&mut self) -> Result<Vec<AccountTransactionPair>, StorageError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {}, {} FROM accounts a
             INNER JOIN transactions t ON a.account_number = t.account_number
             ORDER BY a.id, t.timestamp DESC, t.id",
            ACCOUNT_COLUMNS, TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(map_err)?;
        let raw = stmt
            .query_map([], |row| Ok((RawAccount::read(row, 0)?, RawTransaction::read(row, 6)?)))
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;

        raw.into_iter()
            .map(|(a, t)| {
                Ok(AccountTransactionPair {
                    account: a.into_account()?,
                    transaction: t.into_transaction()?,
                })
            })
            .collect()
    }

    fn transactions(&mut self) -> Result<Vec<Transaction>, StorageError> {
        let sql = format!("SELECT {} FROM transactions t ORDER BY t.id", TRANSACTION_COLUMNS);
        self.query_transactions(&sql, [])
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StorageError::Other(e.to_string()))?;
            tracing::debug!("SQLite session closed");
        }
        Ok(())
    }
}
