//! A driver's last-known presence: where they are, whether they take work, and
//! which order (if any) they are currently holding.
//!
//! # Actor Framework
//! [`DriverLocation`] implements the [`ActorEntity`](actor_framework::ActorEntity) trait in
//! [`crate::geo_registry`]; one record per driver, created by the first location report.

use crate::model::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Type-safe identifier for Drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub u32);

impl From<u32> for DriverId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "driver_{}", self.0)
    }
}

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite, `lat` within [-90, 90] and `lng` within [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance using the haversine formula.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        // Clamp guards asin against rounding just above 1.0 for antipodal points.
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocation {
    pub driver_id: DriverId,
    pub position: GeoPoint,
    pub online: bool,
    pub updated_at: DateTime<Utc>,
    pub active_order: Option<OrderId>,
}

impl DriverLocation {
    pub fn new(driver_id: DriverId, position: GeoPoint, updated_at: DateTime<Utc>) -> Self {
        Self {
            driver_id,
            position,
            online: true,
            updated_at,
            active_order: None,
        }
    }

    /// Reported at or after `fresh_after`.
    pub fn is_fresh(&self, fresh_after: DateTime<Utc>) -> bool {
        self.updated_at >= fresh_after
    }

    /// Online, fresh, and not holding an order.
    pub fn is_available(&self, fresh_after: DateTime<Utc>) -> bool {
        self.online && self.is_fresh(fresh_after) && self.active_order.is_none()
    }
}

/// The driver account as known to the driver store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub active: bool,
}

impl Driver {
    pub fn new(id: DriverId) -> Self {
        Self { id, active: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.0001, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_haversine_distance() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(origin.distance_km(&origin), 0.0);

        // One degree of longitude along the equator
        let east = GeoPoint::new(0.0, 1.0);
        assert!((origin.distance_km(&east) - 111.195).abs() < 0.01);

        // Symmetric
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let d = paris.distance_km(&london);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
        assert_eq!(d, london.distance_km(&paris));
    }

    #[test]
    fn test_availability() {
        let now = Utc::now();
        let mut loc = DriverLocation::new(DriverId(1), GeoPoint::new(0.0, 0.0), now);
        assert!(loc.is_available(now - chrono::Duration::seconds(1)));
        assert!(!loc.is_available(now + chrono::Duration::seconds(1)));

        loc.active_order = Some(OrderId(4));
        assert!(!loc.is_available(now));

        loc.active_order = None;
        loc.online = false;
        assert!(!loc.is_available(now));
    }
}
