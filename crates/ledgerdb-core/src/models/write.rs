use rust_decimal::Decimal;
use time::PrimitiveDateTime;

use super::{timestamp, AccountType, TransactionType};

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub account_number: String,
    pub balance: Decimal,
    pub owner_name: String,
    pub account_type: AccountType,
    /// Defaults to the time of insertion.
    pub created_at: Option<PrimitiveDateTime>,
}

impl NewAccount {
    pub fn new(
        account_number: impl Into<String>,
        balance: Decimal,
        owner_name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            balance,
            owner_name: owner_name.into(),
            account_type,
            created_at: None,
        }
    }

    pub fn created_at(mut self, created_at: PrimitiveDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// The timestamp a backend should store, at storage precision.
    pub fn created_at_or_now(&self) -> PrimitiveDateTime {
        self.created_at
            .map(timestamp::truncate_to_micros)
            .unwrap_or_else(timestamp::now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_number: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    /// Defaults to the time of insertion.
    pub timestamp: Option<PrimitiveDateTime>,
}

impl NewTransaction {
    pub fn new(
        account_number: impl Into<String>,
        amount: Decimal,
        transaction_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            amount,
            transaction_type,
            description: description.into(),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: PrimitiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn timestamp_or_now(&self) -> PrimitiveDateTime {
        self.timestamp
            .map(timestamp::truncate_to_micros)
            .unwrap_or_else(timestamp::now)
    }
}
