//! # Storage Collaborators
//!
//! The engine reads and writes durable records only through these traits. Actors hold
//! them as `Arc<dyn ...>` in their context, so a database-backed implementation can
//! replace [`MemoryStorage`] without touching the actors.
//!
//! - [`OrderRepository`]: orders, saved with an optimistic version check
//! - [`DriverStore`]: driver accounts (active / deactivated)
//! - [`LedgerStore`]: the append-only entry log

pub mod memory;

pub use memory::MemoryStorage;

use crate::error::ErrorClass;
use crate::model::{AccountKey, Driver, DriverId, LedgerEntry, NewLedgerEntry, Order, OrderId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// The stored version moved since the caller loaded the record.
    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    /// The append would drive the account below zero.
    #[error("Insufficient balance on {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        account: AccountKey,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StorageError::NotFound(_)
            | StorageError::AlreadyExists(_)
            | StorageError::InsufficientBalance { .. } => ErrorClass::BusinessRule,
            StorageError::VersionConflict { .. } => ErrorClass::Concurrency,
            StorageError::Unavailable(_) => ErrorClass::Infrastructure,
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order; `AlreadyExists` if the id is taken.
    async fn insert_order(&self, order: &Order) -> Result<(), StorageError>;

    async fn load_order(&self, id: OrderId) -> Result<Order, StorageError>;

    /// Replaces the stored order if its version still equals `expected_version`.
    async fn save_order(&self, order: &Order, expected_version: u64) -> Result<(), StorageError>;
}

#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn load_driver(&self, id: DriverId) -> Result<Driver, StorageError>;

    async fn upsert_driver(&self, driver: &Driver) -> Result<(), StorageError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends one immutable entry and assigns its id.
    ///
    /// Outflows are re-checked against the stored sum: an append that would leave the
    /// account negative fails with `InsufficientBalance` and writes nothing.
    async fn append_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StorageError>;

    async fn sum_entries_for_account(&self, account: AccountKey) -> Result<Decimal, StorageError>;

    /// The account's entries, oldest first.
    async fn entries_for_account(&self, account: AccountKey) -> Result<Vec<LedgerEntry>, StorageError>;
}
