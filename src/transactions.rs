//! Transaction store: insert and per-account history.

use ledgerdb_core::{NewTransaction, Session, Transaction};

use crate::error::LedgerError;

/// Inserts one transaction. The account number is not checked against the
/// accounts table.
pub fn create_transaction(
    session: &mut dyn Session,
    transaction: &NewTransaction,
) -> Result<Transaction, LedgerError> {
    let created = session
        .insert_transaction(transaction)
        .map_err(LedgerError::persistence("create transaction"))?;
    tracing::info!(
        id = created.id,
        account_number = %created.account_number,
        transaction_type = %created.transaction_type,
        amount = %created.amount,
        "Transaction created"
    );
    Ok(created)
}

/// Most recent first; ties on timestamp list the later insert first.
pub fn transactions_by_account(
    session: &mut dyn Session,
    account_number: &str,
) -> Result<Vec<Transaction>, LedgerError> {
    session
        .transactions_by_account(account_number)
        .map_err(LedgerError::query("transactions by account"))
}
