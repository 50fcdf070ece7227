//! Tests against a live PostgreSQL server. Run with
//! `LEDGERDB_TEST_PG=1 cargo test -- --ignored`; connection settings come
//! from the usual `DB_*` variables.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ledgerdb::accounts::{account_by_number, create_account};
use ledgerdb::config::{Backend, Config};
use ledgerdb::connection::{connector_for, ConnectionProvider};
use ledgerdb::reports::{account_balances, account_transactions, latest_transactions};
use ledgerdb::transactions::{create_transaction, transactions_by_account};
use ledgerdb::{AccountType, LedgerError, NewAccount, NewTransaction, StorageError, TransactionType};
use ledgerdb_postgres::PostgresConnector;
use rust_decimal_macros::dec;
use time::macros::datetime;

fn setup() -> Option<ConnectionProvider> {
    std::env::var("LEDGERDB_TEST_PG").ok()?;
    let mut config = Config::default();
    config.apply_env(|key| std::env::var(key).ok());
    config.database.backend = Backend::Postgres;
    Some(ConnectionProvider::new(connector_for(&config.database)))
}

/// Account numbers are unique per run so repeated runs share one database.
fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", prefix, nanos)
}

#[test]
#[ignore]
fn test_pg_sample_scenario() {
    let Some(mut provider) = setup() else { return };
    let number = unique("pg-sample");
    let session = provider.acquire().unwrap();

    create_account(session, &NewAccount::new(number.as_str(), dec!(1000.00), "Test User", AccountType::Savings))
        .unwrap();
    create_transaction(
        session,
        &NewTransaction::new(number.as_str(), dec!(500.00), TransactionType::Deposit, "Initial deposit")
            .at(datetime!(2024-03-01 09:00)),
    )
    .unwrap();
    create_transaction(
        session,
        &NewTransaction::new(number.as_str(), dec!(250.00), TransactionType::Withdrawal, "Groceries")
            .at(datetime!(2024-03-01 09:00:01)),
    )
    .unwrap();

    let rows: Vec<_> = account_transactions(session)
        .unwrap()
        .into_iter()
        .filter(|r| r.account.account_number == number)
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].transaction.description, "Groceries");

    assert_eq!(latest_transactions(session).unwrap()[&number].description, "Groceries");
    assert_eq!(account_balances(session).unwrap()[&number], dec!(750.00));
    assert_eq!(transactions_by_account(session, &number).unwrap().len(), 2);
}

#[test]
#[ignore]
fn test_pg_account_round_trip_and_duplicate() {
    let Some(mut provider) = setup() else { return };
    let number = unique("pg-account");
    let session = provider.acquire().unwrap();

    let account = NewAccount::new(number.as_str(), dec!(12.34), "Ada", AccountType::Credit)
        .created_at(datetime!(2024-05-06 07:08:09.123456));
    let created = create_account(session, &account).unwrap();
    assert_eq!(account_by_number(session, &number).unwrap(), Some(created));

    let err = create_account(session, &account).unwrap_err();
    assert!(matches!(err, LedgerError::Persistence { source: StorageError::DuplicateKey(_), .. }));
}

#[test]
#[ignore]
fn test_pg_unreachable_server() {
    if std::env::var("LEDGERDB_TEST_PG").is_err() {
        return;
    }
    let connector = PostgresConnector::new("127.0.0.1", 1, "financial_db", None, None);
    let mut provider = ConnectionProvider::new(Arc::new(connector));

    let err = provider.acquire().err().unwrap();
    assert!(matches!(err, LedgerError::Connection { source: StorageError::Connection(_), .. }));
    assert!(!provider.is_connected());
}
