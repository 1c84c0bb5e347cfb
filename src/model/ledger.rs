//! Ledger accounts and their immutable entries.

use crate::model::{CustomerId, DriverId, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    DriverEarnings,
    UserWallet,
}

/// Identifies one balance: the owner id within an account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub account_type: AccountType,
    pub account_id: u32,
}

impl AccountKey {
    pub fn new(account_type: AccountType, account_id: u32) -> Self {
        Self {
            account_type,
            account_id,
        }
    }

    pub fn driver_earnings(driver_id: DriverId) -> Self {
        Self::new(AccountType::DriverEarnings, driver_id.0)
    }

    pub fn user_wallet(customer_id: CustomerId) -> Self {
        Self::new(AccountType::UserWallet, customer_id.0)
    }
}

impl Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.account_type {
            AccountType::DriverEarnings => write!(f, "earnings_{}", self.account_id),
            AccountType::UserWallet => write!(f, "wallet_{}", self.account_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Credit,
    Debit,
    Withdrawal,
    Topup,
}

impl EntryKind {
    /// Kinds that take money out of the account.
    pub fn is_outflow(self) -> bool {
        matches!(self, EntryKind::Debit | EntryKind::Withdrawal)
    }

    /// Applies this kind's sign to a positive magnitude.
    pub fn signed(self, magnitude: Decimal) -> Decimal {
        if self.is_outflow() {
            -magnitude
        } else {
            magnitude
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry_{}", self.0)
    }
}

/// An entry before the store has given it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub account: AccountKey,
    pub order_id: Option<OrderId>,
    /// Signed: positive for credit/topup, negative for debit/withdrawal.
    pub amount: Decimal,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account: AccountKey,
    pub order_id: Option<OrderId>,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn from_new(id: EntryId, entry: NewLedgerEntry) -> Self {
        Self {
            id,
            account: entry.account,
            order_id: entry.order_id,
            amount: entry.amount,
            kind: entry.kind,
            created_at: entry.created_at,
        }
    }
}

/// Balance projection of one account, cached by the ledger actor.
///
/// # Actor Framework
/// Implements [`ActorEntity`](actor_framework::ActorEntity) in [`crate::ledger`].
/// `balance` always equals the sum of the account's stored entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub key: AccountKey,
    pub balance: Decimal,
    /// Entries already posted for an order, by kind.
    pub order_postings: HashMap<(OrderId, EntryKind), LedgerEntry>,
}

impl Account {
    pub fn empty(key: AccountKey) -> Self {
        Self {
            key,
            balance: Decimal::ZERO,
            order_postings: HashMap::new(),
        }
    }

    /// Rebuilds the projection from the account's entry log.
    pub fn from_entries(key: AccountKey, balance: Decimal, entries: Vec<LedgerEntry>) -> Self {
        let order_postings = entries
            .into_iter()
            .filter_map(|e| e.order_id.map(|order_id| ((order_id, e.kind), e)))
            .collect();
        Self {
            key,
            balance,
            order_postings,
        }
    }
}
