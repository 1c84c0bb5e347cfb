//! Error types for the Order actor.

use crate::error::ErrorClass;
use crate::geo_registry::GeoError;
use crate::ledger::LedgerError;
use crate::model::{Caller, DriverId, OrderId, OrderStatus, Trigger};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The transition table has no edge for `(from, trigger)`.
    #[error("Invalid transition: {trigger} from {from}")]
    InvalidTransition { from: OrderStatus, trigger: Trigger },

    #[error("Forbidden: {caller} may not {trigger}")]
    Forbidden { caller: Caller, trigger: Trigger },

    /// The trigger needs data the payload does not carry.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// Unknown, deactivated, offline, stale, or busy with another order.
    #[error("Driver unavailable: {0}")]
    DriverUnavailable(DriverId),

    /// Another writer saved the order after it was loaded.
    #[error("Concurrent modification of {0}")]
    ConcurrentModification(OrderId),

    /// The deadline passed. The order may or may not have moved.
    #[error("Request timed out for {0}")]
    Timeout(OrderId),

    #[error("GeoRegistry error: {0}")]
    Geo(GeoError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Order storage error: {0}")]
    Storage(StorageError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            OrderError::InvalidPayload(_) | OrderError::InvalidOrder(_) => ErrorClass::Validation,
            OrderError::InvalidTransition { .. }
            | OrderError::Forbidden { .. }
            | OrderError::NotFound(_)
            | OrderError::AlreadyExists(_)
            | OrderError::DriverUnavailable(_) => ErrorClass::BusinessRule,
            OrderError::ConcurrentModification(_) => ErrorClass::Concurrency,
            OrderError::Timeout(_) | OrderError::ActorCommunicationError(_) => {
                ErrorClass::Infrastructure
            }
            OrderError::Geo(e) => e.class(),
            OrderError::Ledger(e) => e.class(),
            OrderError::Storage(e) => e.class(),
        }
    }

    /// Maps a storage failure on `order_id` into the order's own vocabulary.
    pub fn from_storage(order_id: OrderId, error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => OrderError::NotFound(order_id),
            StorageError::AlreadyExists(_) => OrderError::AlreadyExists(order_id),
            StorageError::VersionConflict { .. } => OrderError::ConcurrentModification(order_id),
            other => OrderError::Storage(other),
        }
    }
}

impl From<GeoError> for OrderError {
    fn from(error: GeoError) -> Self {
        match error {
            GeoError::DriverUnavailable(driver_id) => OrderError::DriverUnavailable(driver_id),
            other => OrderError::Geo(other),
        }
    }
}
