//! Account store: insert and lookup by account number.

use ledgerdb_core::{Account, NewAccount, Session};

use crate::error::LedgerError;

/// Inserts one account and returns it with its store-assigned id.
///
/// A second account with the same number fails with
/// [`LedgerError::Persistence`].
pub fn create_account(session: &mut dyn Session, account: &NewAccount) -> Result<Account, LedgerError> {
    let created = session
        .insert_account(account)
        .map_err(LedgerError::persistence("create account"))?;
    tracing::info!(id = created.id, account_number = %created.account_number, "Account created");
    Ok(created)
}

pub fn account_by_number(session: &mut dyn Session, account_number: &str) -> Result<Option<Account>, LedgerError> {
    session
        .account_by_number(account_number)
        .map_err(LedgerError::query("account by number"))
}
