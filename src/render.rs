//! Table and JSON rendering for the CLI.

use std::collections::BTreeMap;

use ledgerdb_core::{timestamp, Account, AccountTransactionPair, Transaction};
use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use time::PrimitiveDateTime;

fn ts(value: PrimitiveDateTime) -> String {
    timestamp::format(value).unwrap_or_else(|_| value.to_string())
}

pub fn json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub fn account(account: &Account) -> String {
    let mut table = Table::new();
    table.add_row(row!["Id", "Account", "Owner", "Type", "Balance", "Created"]);
    table.add_empty_row();
    table.add_row(row![
        account.id,
        account.account_number,
        account.owner_name,
        account.account_type,
        account.balance,
        ts(account.created_at)
    ]);
    format!("\n{}\n", table)
}

pub fn transactions(transactions: &[Transaction]) -> String {
    let mut table = Table::new();
    table.add_row(row!["Id", "Account", "Type", "Amount", "Timestamp", "Description"]);
    table.add_empty_row();
    for t in transactions {
        table.add_row(row![
            t.id,
            t.account_number,
            t.transaction_type,
            t.amount,
            ts(t.timestamp),
            t.description
        ]);
    }
    format!("\n{}\n", table)
}

pub fn account_transactions(rows: &[AccountTransactionPair]) -> String {
    let mut table = Table::new();
    table.add_row(row!["Account", "Owner", "Balance", "Transaction", "Type", "Amount", "Timestamp", "Description"]);
    table.add_empty_row();
    for r in rows {
        table.add_row(row![
            r.account.account_number,
            r.account.owner_name,
            r.account.balance,
            r.transaction.id,
            r.transaction.transaction_type,
            r.transaction.amount,
            ts(r.transaction.timestamp),
            r.transaction.description
        ]);
    }
    format!("\n{}\n", table)
}

pub fn latest_transactions(latest: &BTreeMap<String, Transaction>) -> String {
    let mut table = Table::new();
    table.add_row(row!["Account", "Latest Transaction", "Amount", "Timestamp"]);
    table.add_empty_row();
    for (account_number, t) in latest {
        table.add_row(row![account_number, t.description, t.amount, ts(t.timestamp)]);
    }
    format!("\n{}\n", table)
}

pub fn account_balances(balances: &BTreeMap<String, Decimal>) -> String {
    let mut table = Table::new();
    table.add_row(row!["Account", "Balance"]);
    table.add_empty_row();
    for (account_number, balance) in balances {
        table.add_row(row![account_number, balance]);
    }
    format!("\n{}\n", table)
}
