use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use time::PrimitiveDateTime;

pub mod timestamp;
pub mod write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Checking,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "SAVINGS",
            AccountType::Checking => "CHECKING",
            AccountType::Credit => "CREDIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

/// A stored enum name that matches none of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for AccountType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [AccountType::Savings, AccountType::Checking, AccountType::Credit]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "account type",
                value: s.to_string(),
            })
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [TransactionType::Deposit, TransactionType::Withdrawal, TransactionType::Transfer]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "transaction type",
                value: s.to_string(),
            })
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `accounts` table.
///
/// `balance` is the snapshot stored with the account. It is never derived
/// from, or reconciled with, the account's transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub balance: Decimal,
    pub owner_name: String,
    pub created_at: PrimitiveDateTime,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

/// A row of the `transactions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub account_number: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub timestamp: PrimitiveDateTime,
    pub description: String,
}

/// One row of the account/transaction inner join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountTransactionPair {
    pub account: Account,
    pub transaction: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_names_round_trip() {
        for t in [AccountType::Savings, AccountType::Checking, AccountType::Credit] {
            assert_eq!(t.as_str().parse::<AccountType>().unwrap(), t);
        }
        for t in [TransactionType::Deposit, TransactionType::Withdrawal, TransactionType::Transfer] {
            assert_eq!(t.to_string().parse::<TransactionType>().unwrap(), t);
        }
    }

    #[test]
    fn test_enum_parse_ignores_case() {
        assert_eq!("checking".parse::<AccountType>().unwrap(), AccountType::Checking);
        assert_eq!("Withdrawal".parse::<TransactionType>().unwrap(), TransactionType::Withdrawal);
    }

    #[test]
    fn test_unknown_variant_is_an_error() {
        let err = "BROKERAGE".parse::<AccountType>().unwrap_err();
        assert_eq!(err.kind, "account type");
        assert_eq!(err.to_string(), "unknown account type `BROKERAGE`");
    }
}
