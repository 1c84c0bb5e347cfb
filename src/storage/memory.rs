//! In-memory storage for tests and local runs.

use super::{DriverStore, LedgerStore, OrderRepository, StorageError};
use crate::model::{
    AccountKey, Driver, DriverId, EntryId, LedgerEntry, NewLedgerEntry, Order, OrderId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct LedgerLog {
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

impl LedgerLog {
    fn sum(&self, account: AccountKey) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.account == account)
            .map(|e| e.amount)
            .sum()
    }
}

/// Implements every storage trait over process-local maps.
///
/// Each trait method takes one lock for its whole body, so a ledger append's balance
/// re-check and write are atomic with respect to other appends.
#[derive(Default)]
pub struct MemoryStorage {
    orders: Mutex<HashMap<OrderId, Order>>,
    drivers: Mutex<HashMap<DriverId, Driver>>,
    ledger: Mutex<LedgerLog>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryStorage {
    async fn insert_order(&self, order: &Order) -> Result<(), StorageError> {
        let mut orders = lock(&self.orders)?;
        if orders.contains_key(&order.id) {
            return Err(StorageError::AlreadyExists(order.id.to_string()));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn load_order(&self, id: OrderId) -> Result<Order, StorageError> {
        lock(&self.orders)?
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn save_order(&self, order: &Order, expected_version: u64) -> Result<(), StorageError> {
        let mut orders = lock(&self.orders)?;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| StorageError::NotFound(order.id.to_string()))?;
        if stored.version != expected_version {
            return Err(StorageError::VersionConflict {
                id: order.id.to_string(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = order.clone();
        debug!(order_id = %order.id, version = order.version, "Order saved");
        Ok(())
    }
}

#[async_trait]
impl DriverStore for MemoryStorage {
    async fn load_driver(&self, id: DriverId) -> Result<Driver, StorageError> {
        lock(&self.drivers)?
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn upsert_driver(&self, driver: &Driver) -> Result<(), StorageError> {
        lock(&self.drivers)?.insert(driver.id, driver.clone());
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStorage {
    async fn append_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StorageError> {
        let mut log = lock(&self.ledger)?;
        if entry.kind.is_outflow() {
            let balance = log.sum(entry.account);
            if balance + entry.amount < Decimal::ZERO {
                return Err(StorageError::InsufficientBalance {
                    account: entry.account,
                    balance,
                    requested: -entry.amount,
                });
            }
        }

        log.next_id += 1;
        let stored = LedgerEntry::from_new(EntryId(log.next_id), entry);
        log.entries.push(stored.clone());
        debug!(entry_id = %stored.id, account = %stored.account, amount = %stored.amount, "Entry appended");
        Ok(stored)
    }

    async fn sum_entries_for_account(&self, account: AccountKey) -> Result<Decimal, StorageError> {
        Ok(lock(&self.ledger)?.sum(account))
    }

    async fn entries_for_account(&self, account: AccountKey) -> Result<Vec<LedgerEntry>, StorageError> {
        Ok(lock(&self.ledger)?
            .entries
            .iter()
            .filter(|e| e.account == account)
            .cloned()
            .collect())
    }
}
