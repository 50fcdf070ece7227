use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledgerdb::accounts::create_account;
use ledgerdb::connection::ConnectionProvider;
use ledgerdb::reports::{account_balances, account_transactions, latest_transactions};
use ledgerdb::transactions::create_transaction;
use ledgerdb::{AccountType, NewAccount, NewTransaction, TransactionType};
use ledgerdb_memory::{MemoryConnector, MemoryStore};
use rust_decimal::Decimal;
use time::{macros::datetime, Duration};

fn setup() -> ConnectionProvider {
    ConnectionProvider::new(Arc::new(MemoryConnector::new(Arc::new(MemoryStore::new()))))
}

// 100 accounts with 20 transactions each
fn seed_data(provider: &mut ConnectionProvider) {
    let session = provider.acquire().unwrap();
    let start = datetime!(2023-01-01 00:00);
    for a in 0..100 {
        let number = format!("ACC{:05}", a);
        create_account(
            session,
            &NewAccount::new(number.as_str(), Decimal::new(100_000, 2), format!("Owner {}", a), AccountType::Checking),
        )
        .unwrap();
        for t in 0..20i64 {
            create_transaction(
                session,
                &NewTransaction::new(number.as_str(), Decimal::new(t * 125, 2), TransactionType::Deposit, "Bench")
                    .at(start + Duration::minutes(t)),
            )
            .unwrap();
        }
    }
}

fn bench_account_transactions(c: &mut Criterion) {
    let mut provider = setup();
    seed_data(&mut provider);

    c.bench_function("account_transactions", |b| {
        b.iter(|| black_box(account_transactions(provider.acquire().unwrap()).unwrap()))
    });
}

fn bench_latest_transactions(c: &mut Criterion) {
    let mut provider = setup();
    seed_data(&mut provider);

    c.bench_function("latest_transactions", |b| {
        b.iter(|| black_box(latest_transactions(provider.acquire().unwrap()).unwrap()))
    });
}

fn bench_account_balances(c: &mut Criterion) {
    let mut provider = setup();
    seed_data(&mut provider);

    c.bench_function("account_balances", |b| {
        b.iter(|| black_box(account_balances(provider.acquire().unwrap()).unwrap()))
    });
}

fn bench_transaction_creation(c: &mut Criterion) {
    let mut provider = setup();
    let session = provider.acquire().unwrap();
    create_account(
        session,
        &NewAccount::new("ACC00000", Decimal::ZERO, "Bench", AccountType::Savings),
    )
    .unwrap();

    let transaction = NewTransaction::new("ACC00000", Decimal::ONE, TransactionType::Deposit, "Bench");
    c.bench_function("transaction_creation", |b| {
        b.iter(|| create_transaction(session, black_box(&transaction)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_account_transactions,
    bench_latest_transactions,
    bench_account_balances,
    bench_transaction_creation
);
criterion_main!(benches);
