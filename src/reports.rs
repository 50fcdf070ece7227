//! The three ledger reports.
//!
//! Each report runs one query on the session it is given and materialises
//! the whole result in memory. Ordering, grouping and tie-breaking happen
//! here rather than in SQL, so every backend produces the same output.

use std::{cmp::Ordering, collections::BTreeMap};

use ledgerdb_core::{AccountTransactionPair, Session, StorageError, Transaction};
use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Every (account, transaction) pair sharing an account number.
///
/// Accounts without transactions do not appear. Rows are ordered by account
/// id, then newest transaction first, then by transaction id.
pub fn account_transactions(session: &mut dyn Session) -> Result<Vec<AccountTransactionPair>, LedgerError> {
    let mut rows = session
        .account_transactions()
        .map_err(LedgerError::query("account transactions"))?;
    order_join_rows(&mut rows);
    tracing::debug!(rows = rows.len(), "Account transactions report");
    Ok(rows)
}

/// The single most recent transaction of every account that has one.
///
/// When several transactions share the latest timestamp the one with the
/// lowest id is reported. Transactions whose account number matches no
/// account are ignored.
pub fn latest_transactions(session: &mut dyn Session) -> Result<BTreeMap<String, Transaction>, LedgerError> {
    let rows = session
        .account_transactions()
        .map_err(LedgerError::query("latest transactions"))?;
    let latest = latest_per_account(rows.into_iter().map(|row| row.transaction));
    tracing::debug!(accounts = latest.len(), "Latest transactions report");
    Ok(latest)
}

/// Exact sum of transaction amounts per account number.
///
/// This is not the balance stored on the account; the two are never
/// reconciled.
pub fn account_balances(session: &mut dyn Session) -> Result<BTreeMap<String, Decimal>, LedgerError> {
    let operation = "account balances";
    let transactions = session.transactions().map_err(LedgerError::query(operation))?;
    let sums = sum_per_account(&transactions).map_err(LedgerError::query(operation))?;
    tracing::debug!(accounts = sums.len(), "Account balances report");
    Ok(sums)
}

fn order_join_rows(rows: &mut [AccountTransactionPair]) {
    rows.sort_by(|a, b| {
        a.account
            .id
            .cmp(&b.account.id)
            .then_with(|| b.transaction.timestamp.cmp(&a.transaction.timestamp))
            .then_with(|| a.transaction.id.cmp(&b.transaction.id))
    });
}

/// Orders by recency: a later timestamp is greater, and on equal timestamps
/// the lower id is greater.
fn recency(a: &Transaction, b: &Transaction) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then_with(|| b.id.cmp(&a.id))
}

fn latest_per_account(transactions: impl IntoIterator<Item = Transaction>) -> BTreeMap<String, Transaction> {
    let mut groups: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();
    for t in transactions {
        groups.entry(t.account_number.clone()).or_default().push(t);
    }

    groups
        .into_iter()
        .filter_map(|(account_number, group)| {
            group
                .into_iter()
                .max_by(recency)
                .map(|latest| (account_number, latest))
        })
        .collect()
}

fn sum_per_account(transactions: &[Transaction]) -> Result<BTreeMap<String, Decimal>, StorageError> {
    let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in transactions {
        let sum = sums.entry(t.account_number.clone()).or_insert(Decimal::ZERO);
        *sum = sum.checked_add(t.amount).ok_or_else(|| {
            StorageError::InvalidData(format!("amount total for account {} overflows", t.account_number))
        })?;
    }
    Ok(sums)
}
