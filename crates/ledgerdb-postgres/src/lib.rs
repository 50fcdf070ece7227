//! PostgreSQL storage backend for LedgerDB.

use ledgerdb_core::{
    Account, AccountTransactionPair, Connector, NewAccount, NewTransaction, Session, StorageError,
    Transaction,
};
use postgres::{error::SqlState, Client, NoTls, Row};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id BIGSERIAL PRIMARY KEY,
        account_number TEXT NOT NULL UNIQUE,
        balance NUMERIC NOT NULL,
        owner_name TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL,
        type TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id BIGSERIAL PRIMARY KEY,
        account_number TEXT NOT NULL,
        amount NUMERIC NOT NULL,
        type TEXT NOT NULL,
        timestamp TIMESTAMP NOT NULL,
        description TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_pg_transactions_account_time
        ON transactions(account_number, timestamp);
";

// Ids are cast so that SERIAL and BIGSERIAL keys both read as i64.
const ACCOUNT_COLUMNS: &str =
    "a.id::BIGINT, a.account_number, a.balance, a.owner_name, a.created_at, a.type";
const TRANSACTION_COLUMNS: &str =
    "t.id::BIGINT, t.account_number, t.amount, t.type, t.timestamp, t.description";

pub struct PostgresConnector {
    config: postgres::Config,
    target: String,
    bootstrap_schema: bool,
}

impl PostgresConnector {
    /// Without a user the connection authenticates as the OS login name; without
    /// a password none is sent and the server's default auth applies.
    pub fn new(
        host: &str,
        port: u16,
        dbname: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        let mut config = postgres::Config::new();
        config
            .host(host)
            .port(port)
            .dbname(dbname)
            .user(&resolve_user(user, |key| std::env::var(key).ok()))
            .application_name("ledgerdb");
        if let Some(password) = password {
            config.password(password);
        }

        Self {
            config,
            target: format!("postgresql://{}:{}/{}", host, port, dbname),
            bootstrap_schema: true,
        }
    }

    pub fn bootstrap_schema(mut self, enabled: bool) -> Self {
        self.bootstrap_schema = enabled;
        self
    }
}

impl Connector for PostgresConnector {
    fn target(&self) -> &str {
        &self.target
    }

    fn connect(&self) -> Result<Box<dyn Session>, StorageError> {
        let mut client = self
            .config
            .connect(NoTls)
            .map_err(|e| StorageError::Connection(format!("PostgreSQL connection failed: {}", e)))?;

        if self.bootstrap_schema {
            client.batch_execute(SCHEMA).map_err(map_err)?;
        }

        tracing::debug!(target_db = %self.target, "PostgreSQL session opened");
        Ok(Box::new(PostgresSession { client: Some(client) }))
    }
}

/// The explicit user, else the OS login name (`USER`, then `USERNAME`), else
/// `postgres`. The driver refuses to connect without a user.
fn resolve_user(user: Option<&str>, var: impl Fn(&str) -> Option<String>) -> String {
    user.map(str::to_string)
        .or_else(|| var("USER"))
        .or_else(|| var("USERNAME"))
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "postgres".to_string())
}

pub struct PostgresSession {
    client: Option<Client>,
}

impl PostgresSession {
    fn client(&mut self) -> Result<&mut Client, StorageError> {
        match self.client.as_mut() {
            Some(client) if !client.is_closed() => Ok(client),
            _ => Err(StorageError::SessionClosed),
        }
    }
}

fn map_err(e: postgres::Error) -> StorageError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        StorageError::DuplicateKey(e.to_string())
    } else if e.is_closed() {
        StorageError::SessionClosed
    } else {
        StorageError::Other(e.to_string())
    }
}

fn read_account(row: &Row, at: usize) -> Result<Account, StorageError> {
    let account_type: String = row.try_get(at + 5).map_err(map_err)?;
    Ok(Account {
        id: row.try_get(at).map_err(map_err)?,
        account_number: row.try_get(at + 1).map_err(map_err)?,
        balance: row.try_get(at + 2).map_err(map_err)?,
        owner_name: row.try_get(at + 3).map_err(map_err)?,
        created_at: row.try_get(at + 4).map_err(map_err)?,
        account_type: account_type.parse()?,
    })
}

fn read_transaction(row: &Row, at: usize) -> Result<Transaction, StorageError> {
    let transaction_type: String = row.try_get(at + 3).map_err(map_err)?;
    Ok(Transaction {
        id: row.try_get(at).map_err(map_err)?,
        account_number: row.try_get(at + 1).map_err(map_err)?,
        amount: row.try_get(at + 2).map_err(map_err)?,
        transaction_type: transaction_type.parse()?,
        timestamp: row.try_get(at + 4).map_err(map_err)?,
        description: row.try_get(at + 5).map_err(map_err)?,
    })
}

impl Session for PostgresSession {
    fn is_closed(&self) -> bool {
        self.client.as_ref().map_or(true, |c| c.is_closed())
    }

    fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StorageError> {
        let created_at = account.created_at_or_now();
        let row = self
            .client()?
            .query_one(
                "INSERT INTO accounts (account_number, balance, owner_name, created_at, type)
                 VALUES ($1, $2, $3, $4, $5) RETURNING id::BIGINT",
                &[
                    &account.account_number,
                    &account.balance,
                    &account.owner_name,
                    &created_at,
                    &account.account_type.as_str(),
                ],
            )
            .map_err(map_err)?;

        Ok(Account {
            id: row.try_get(0).map_err(map_err)?,
            account_number: account.account_number.clone(),
            balance: account.balance,
            owner_name: account.owner_name.clone(),
            created_at,
            account_type: account.account_type,
        })
    }

    fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction, StorageError> {
        let ts = transaction.timestamp_or_now();
        let row = self
            .client()?
            .query_one(
                "INSERT INTO transactions (account_number, amount, type, timestamp, description)
                 VALUES ($1, $2, $3, $4, $5) RETURNING id::BIGINT",
                &[
                    &transaction.account_number,
                    &transaction.amount,
                    &transaction.transaction_type.as_str(),
                    &ts,
                    &transaction.description,
                ],
            )
            .map_err(map_err)?;

        Ok(Transaction {
            id: row.try_get(0).map_err(map_err)?,
            account_number: transaction.account_number.clone(),
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            timestamp: ts,
            description: transaction.description.clone(),
        })
    }

    fn account_by_number(&mut self, account_number: &str) -> Result<Option<Account>, StorageError> {
        let sql = format!("SELECT {} FROM accounts a WHERE a.account_number = $1", ACCOUNT_COLUMNS);
        let row = self
            .client()?
            .query_opt(sql.as_str(), &[&account_number])
            .map_err(map_err)?;
        row.map(|r| read_account(&r, 0)).transpose()
    }

    fn transactions_by_account(&mut self, account_number: &str) -> Result<Vec<Transaction>, StorageError> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.account_number = $1
             ORDER BY t.timestamp DESC, t.id DESC",
            TRANSACTION_COLUMNS
        );
        let rows = self
            .client()?
            .query(sql.as_str(), &[&account_number])
            .map_err(map_err)?;
        rows.iter().map(|r| read_transaction(r, 0)).collect()
    }

    fn account_transactions(&mut self) -> Result<Vec<AccountTransactionPair>, StorageError> {
        let sql = format!(
            "SELECT {}, {} FROM accounts a
             INNER JOIN transactions t ON a.account_number = t.account_number
             ORDER BY a.id, t.timestamp DESC, t.id",
            ACCOUNT_COLUMNS, TRANSACTION_COLUMNS
        );
        let rows = self.client()?.query(sql.as_str(), &[]).map_err(map_err)?;
        rows.iter()
            .map(|r| {
                Ok(AccountTransactionPair {
                    account: read_account(r, 0)?,
                    transaction: read_transaction(r, 6)?,
                })
            })
            .collect()
    }

    fn transactions(&mut self) -> Result<Vec<Transaction>, StorageError> {
        let sql = format!("SELECT {} FROM transactions t ORDER BY t.id", TRANSACTION_COLUMNS);
        let rows = self.client()?.query(sql.as_str(), &[]).map_err(map_err)?;
        rows.iter().map(|r| read_transaction(r, 0)).collect()
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .map_err(|e| StorageError::Other(e.to_string()))?;
            tracing::debug!("PostgreSQL session closed");
        }
        Ok(())
    }
}
