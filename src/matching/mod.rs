//! # MatchingService
//!
//! Picks a driver for a dispatchable order and assigns them through the order
//! state machine.
//!
//! The service holds no state of its own. Every decision it takes is re-validated by the
//! order actor (`assign_driver`) and the driver's GeoRegistry record (claim), so two
//! concurrent dispatches of the same order, or of two orders competing for the same
//! driver, can never both win.

pub mod error;

pub use error::*;

use crate::clients::{GeoClient, OrderClient};
use crate::config::DispatchConfig;
use crate::model::{Caller, DriverId, OrderId, OrderStatus, Trigger, TransitionPayload};
use crate::order_actor::OrderError;
use serde::Serialize;
use std::fmt::{self, Display};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Assigned(DriverId),
    /// The order already had a driver, possibly from a concurrent dispatch.
    AlreadyAssigned(DriverId),
    /// No candidate could be claimed. The order stays eligible.
    NoDriverFound,
}

impl Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Assigned(id) => write!(f, "assigned {id}"),
            DispatchOutcome::AlreadyAssigned(id) => write!(f, "already assigned {id}"),
            DispatchOutcome::NoDriverFound => f.write_str("no driver found"),
        }
    }
}

#[derive(Clone)]
pub struct MatchingService {
    orders: OrderClient,
    geo: GeoClient,
    config: DispatchConfig,
}

impl MatchingService {
    pub fn new(orders: OrderClient, geo: GeoClient, config: DispatchConfig) -> Self {
        Self {
            orders,
            geo,
            config,
        }
    }

    /// Dispatches with the configured radius and candidate limit.
    pub async fn dispatch(&self, order_id: OrderId) -> Result<DispatchOutcome, MatchingError> {
        self.dispatch_with(order_id, self.config.default_radius_km, self.config.candidate_limit)
            .await
    }

    #[instrument(skip(self))]
    pub async fn dispatch_with(
        &self,
        order_id: OrderId,
        radius_km: f64,
        limit: usize,
    ) -> Result<DispatchOutcome, MatchingError> {
        let order = self.orders.get_order(order_id).await?;
        if let Some(outcome) = Self::settled(order.status, order.driver_id) {
            return Ok(outcome);
        }
        if !order.status.is_dispatchable() {
            return Err(MatchingError::OrderNotEligible {
                order_id,
                status: order.status,
            });
        }

        let candidates = self
            .geo
            .nearest_available(order.pickup.lat, order.pickup.lng, radius_km, limit)
            .await?;
        debug!(candidates = candidates.len(), "Ranked candidates");

        for driver_id in candidates {
            let result = self
                .orders
                .transition(
                    order_id,
                    Trigger::AssignDriver,
                    Caller::dispatcher(),
                    TransitionPayload::driver(driver_id),
                    self.config.deadline(),
                )
                .await;
            match result {
                Ok(order) => {
                    return Ok(match order.driver_id {
                        Some(assigned) if assigned != driver_id => {
                            DispatchOutcome::AlreadyAssigned(assigned)
                        }
                        _ => {
                            info!(%order_id, %driver_id, "Driver assigned");
                            DispatchOutcome::Assigned(driver_id)
                        }
                    });
                }
                Err(OrderError::DriverUnavailable(_)) => {
                    debug!(%driver_id, "Candidate unavailable, trying next");
                }
                Err(OrderError::InvalidTransition { .. }) => {
                    let current = self.orders.get_order(order_id).await?;
                    if let Some(outcome) = Self::settled(current.status, current.driver_id) {
                        return Ok(outcome);
                    }
                    debug!(%driver_id, status = %current.status, "Order moved, trying next");
                }
                Err(e) => return Err(e.into()),
            }
        }

        // A concurrent dispatch may have taken the last candidate for this very order
        let current = self.orders.get_order(order_id).await?;
        if let Some(outcome) = Self::settled(current.status, current.driver_id) {
            return Ok(outcome);
        }
        warn!(%order_id, "No driver found");
        Ok(DispatchOutcome::NoDriverFound)
    }

    /// Dispatches each order in turn and reports every outcome.
    ///
    /// One order failing does not stop the sweep.
    #[instrument(skip(self, order_ids))]
    pub async fn sweep(
        &self,
        order_ids: impl IntoIterator<Item = OrderId>,
    ) -> Vec<(OrderId, Result<DispatchOutcome, MatchingError>)> {
        let mut outcomes = Vec::new();
        for order_id in order_ids {
            let outcome = self.dispatch(order_id).await;
            if let Err(e) = &outcome {
                warn!(%order_id, error = %e, "Sweep dispatch failed");
            }
            outcomes.push((order_id, outcome));
        }
        outcomes
    }

    fn settled(status: OrderStatus, driver_id: Option<DriverId>) -> Option<DispatchOutcome> {
        match (status, driver_id) {
            (OrderStatus::PickupAssigned, Some(driver_id)) => {
                Some(DispatchOutcome::AlreadyAssigned(driver_id))
            }
            _ => None,
        }
    }
}
