//! Error types for the GeoRegistry actor.

use crate::error::ErrorClass;
use crate::model::DriverId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeoError {
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or not finite.
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Offline, stale, unknown, or already holding another order.
    #[error("Driver unavailable: {0}")]
    DriverUnavailable(DriverId),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl GeoError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GeoError::InvalidCoordinate { .. } => ErrorClass::Validation,
            GeoError::DriverUnavailable(_) => ErrorClass::BusinessRule,
            GeoError::ActorCommunicationError(_) => ErrorClass::Infrastructure,
        }
    }
}
