//! # Geo Client
//!
//! Provides a high‑level API for the GeoRegistry actors.
//! It wraps a `ResourceClient<DriverLocation>` and adds proximity search across shards.
use crate::config::cutoff_before;
use crate::geo_registry::{GeoAction, GeoActionResult, GeoError};
use crate::model::{DriverId, DriverLocation, GeoPoint, OrderId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for the GeoRegistry.
#[derive(Clone)]
pub struct GeoClient {
    inner: ResourceClient<DriverLocation>,
    staleness_cutoff: Duration,
}

impl GeoClient {
    pub fn new(inner: ResourceClient<DriverLocation>, staleness_cutoff: Duration) -> Self {
        Self {
            inner,
            staleness_cutoff,
        }
    }

    fn fresh_after(&self) -> DateTime<Utc> {
        cutoff_before(Utc::now(), self.staleness_cutoff)
    }

    fn checked_point(lat: f64, lng: f64) -> Result<GeoPoint, GeoError> {
        let point = GeoPoint::new(lat, lng);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(GeoError::InvalidCoordinate { lat, lng })
        }
    }

    /// Records a report stamped now, marking the driver online.
    #[instrument(skip(self))]
    pub async fn update_location(&self, driver_id: DriverId, lat: f64, lng: f64) -> Result<(), GeoError> {
        self.update_location_at(driver_id, lat, lng, Utc::now())
            .await
            .map(|_| ())
    }

    /// Records a report with the device's timestamp.
    ///
    /// Returns `false` when an equal-or-newer report was already stored and this one
    /// was dropped.
    #[instrument(skip(self))]
    pub async fn update_location_at(
        &self,
        driver_id: DriverId,
        lat: f64,
        lng: f64,
        reported_at: DateTime<Utc>,
    ) -> Result<bool, GeoError> {
        let position = Self::checked_point(lat, lng)?;
        debug!("Sending request");
        match self
            .inner
            .perform_action(
                driver_id,
                GeoAction::ReportLocation {
                    position,
                    reported_at,
                },
            )
            .await
        {
            Ok(GeoActionResult::ReportLocation(applied)) => Ok(applied),
            Ok(_) => unreachable!("ReportLocation action must return ReportLocation result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Marks a known driver eligible or ineligible. Unknown drivers are ignored.
    #[instrument(skip(self))]
    pub async fn set_online(&self, driver_id: DriverId, online: bool) -> Result<(), GeoError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(driver_id, GeoAction::SetOnline(online))
            .await
        {
            Ok(_) | Err(FrameworkError::NotFound(_)) => Ok(()),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Available drivers within `radius_km` of the point, nearest first.
    ///
    /// Equal distances are ordered by driver id.
    #[instrument(skip(self))]
    pub async fn nearest_available(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<DriverId>, GeoError> {
        let center = Self::checked_point(lat, lng)?;
        let fresh_after = self.fresh_after();
        debug!(%fresh_after, "Sending request");

        let candidates = self
            .inner
            .select(move |loc: &DriverLocation| {
                loc.is_available(fresh_after) && loc.position.distance_km(&center) <= radius_km
            })
            .await
            .map_err(Self::map_error)?;

        let mut ranked: Vec<(f64, DriverId)> = candidates
            .iter()
            .map(|loc| (loc.position.distance_km(&center), loc.driver_id))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(limit);
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }

    /// Records `order_id` as the driver's active order if they are online, fresh and free.
    #[instrument(skip(self))]
    pub async fn claim(&self, driver_id: DriverId, order_id: OrderId) -> Result<(), GeoError> {
        debug!("Sending request");
        let action = GeoAction::Claim {
            order_id,
            fresh_after: self.fresh_after(),
        };
        match self.inner.perform_action(driver_id, action).await {
            Ok(GeoActionResult::Claim(())) => Ok(()),
            Ok(_) => unreachable!("Claim action must return Claim result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Clears the driver's active order if it is `order_id`.
    #[instrument(skip(self))]
    pub async fn release(&self, driver_id: DriverId, order_id: OrderId) -> Result<bool, GeoError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(driver_id, GeoAction::Release(order_id))
            .await
        {
            Ok(GeoActionResult::Release(released)) => Ok(released),
            Ok(_) => unreachable!("Release action must return Release result"),
            Err(FrameworkError::NotFound(_)) => Ok(false),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

#[async_trait]
impl ActorClient<DriverLocation> for GeoClient {
    type Error = GeoError;

    fn inner(&self) -> &ResourceClient<DriverLocation> {
        &self.inner
    }

    fn map_error(e: FrameworkError<GeoError>) -> Self::Error {
        match e {
            FrameworkError::Entity(e) => e,
            other => GeoError::ActorCommunicationError(other.to_string()),
        }
    }
}
