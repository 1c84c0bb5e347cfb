//! Error types for the MatchingService.

use crate::error::ErrorClass;
use crate::geo_registry::GeoError;
use crate::model::{OrderId, OrderStatus};
use crate::order_actor::OrderError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchingError {
    /// Only `confirmed` and `ready` orders can be dispatched.
    #[error("Order {order_id} is not eligible for dispatch in status {status}")]
    OrderNotEligible { order_id: OrderId, status: OrderStatus },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("GeoRegistry error: {0}")]
    Geo(#[from] GeoError),
}

impl MatchingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MatchingError::OrderNotEligible { .. } => ErrorClass::BusinessRule,
            MatchingError::Order(e) => e.class(),
            MatchingError::Geo(e) => e.class(),
        }
    }
}
