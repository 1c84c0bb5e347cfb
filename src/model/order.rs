//! Orders and their lifecycle vocabulary.
//!
//! # Actor Framework
//! [`Order`] implements the [`ActorEntity`](actor_framework::ActorEntity) trait in
//! [`crate::order_actor`]. See there for:
//! - Creation parameters ([`NewOrder`])
//! - Actions ([`OrderAction`](crate::order_actor::OrderAction))

use crate::model::{Caller, DriverId, GeoPoint};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u32);

impl From<u32> for OrderId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub u32);

impl Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "restaurant_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub u32);

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "customer_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    PickupAssigned,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses in which the order carries a driver.
    pub fn has_driver(self) -> bool {
        matches!(
            self,
            OrderStatus::PickupAssigned | OrderStatus::Delivering | OrderStatus::Delivered
        )
    }

    /// Statuses from which a dispatch may assign a driver.
    pub fn is_dispatchable(self) -> bool {
        Trigger::AssignDriver.allowed_from(self)
    }

    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickupAssigned,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::PickupAssigned => "pickup_assigned",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// An event that moves an order along its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Confirm,
    StartPreparing,
    MarkReady,
    AssignDriver,
    StartDelivery,
    Complete,
    Cancel,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::Confirm,
        Trigger::StartPreparing,
        Trigger::MarkReady,
        Trigger::AssignDriver,
        Trigger::StartDelivery,
        Trigger::Complete,
        Trigger::Cancel,
    ];

    /// The status an order holds after this trigger applies.
    pub fn target(self) -> OrderStatus {
        match self {
            Trigger::Confirm => OrderStatus::Confirmed,
            Trigger::StartPreparing => OrderStatus::Preparing,
            Trigger::MarkReady => OrderStatus::Ready,
            Trigger::AssignDriver => OrderStatus::PickupAssigned,
            Trigger::StartDelivery => OrderStatus::Delivering,
            Trigger::Complete => OrderStatus::Delivered,
            Trigger::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Whether the transition table has an edge `(from, self)`.
    pub fn allowed_from(self, from: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Trigger::Confirm => from == Pending,
            Trigger::StartPreparing => from == Confirmed,
            Trigger::MarkReady => from == Preparing,
            Trigger::AssignDriver => matches!(from, Ready | Confirmed),
            Trigger::StartDelivery => from == PickupAssigned,
            Trigger::Complete => from == Delivering,
            Trigger::Cancel => !from.is_terminal(),
        }
    }
}

impl Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Trigger::Confirm => "confirm",
            Trigger::StartPreparing => "start_preparing",
            Trigger::MarkReady => "mark_ready",
            Trigger::AssignDriver => "assign_driver",
            Trigger::StartDelivery => "start_delivery",
            Trigger::Complete => "complete",
            Trigger::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trigger: {0}")]
pub struct UnknownTrigger(pub String);

impl FromStr for Trigger {
    type Err = UnknownTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| UnknownTrigger(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub restaurant_id: RestaurantId,
    pub customer_id: CustomerId,
    pub driver_id: Option<DriverId>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub pickup: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub version: u64,
    pub cancel_reason: Option<String>,
    /// Who fired `cancel`. Their retry is answered even once cancelling has
    /// unassigned them.
    pub cancelled_by: Option<Caller>,
}

impl Order {
    /// A `pending` order at version 0.
    pub fn new(id: OrderId, params: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            restaurant_id: params.restaurant_id,
            customer_id: params.customer_id,
            driver_id: None,
            status: OrderStatus::Pending,
            total_amount: params.total_amount,
            delivery_fee: params.delivery_fee,
            pickup: params.pickup,
            created_at: now,
            status_updated_at: now,
            version: 0,
            cancel_reason: None,
            cancelled_by: None,
        }
    }
}

/// Payload for placing a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub restaurant_id: RestaurantId,
    pub customer_id: CustomerId,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub pickup: GeoPoint,
}

/// Optional data carried by a transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Required by `assign_driver`.
    pub driver_id: Option<DriverId>,
    /// Recorded by `cancel`.
    pub reason: Option<String>,
}

impl TransitionPayload {
    pub fn driver(driver_id: DriverId) -> Self {
        Self {
            driver_id: Some(driver_id),
            reason: None,
        }
    }

    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            driver_id: None,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        let edges: Vec<(OrderStatus, Trigger)> = OrderStatus::ALL
            .into_iter()
            .flat_map(|from| Trigger::ALL.into_iter().map(move |t| (from, t)))
            .filter(|(from, t)| t.allowed_from(*from))
            .collect();

        let mut expected = vec![
            (Pending, Trigger::Confirm),
            (Confirmed, Trigger::StartPreparing),
            (Preparing, Trigger::MarkReady),
            (Ready, Trigger::AssignDriver),
            (Confirmed, Trigger::AssignDriver),
            (PickupAssigned, Trigger::StartDelivery),
            (Delivering, Trigger::Complete),
        ];
        for from in [Pending, Confirmed, Preparing, Ready, PickupAssigned, Delivering] {
            expected.push((from, Trigger::Cancel));
        }

        assert_eq!(edges.len(), expected.len());
        for edge in expected {
            assert!(edges.contains(&edge), "missing edge {edge:?}");
        }
    }

    #[test]
    fn test_trigger_names_round_trip() {
        for trigger in Trigger::ALL {
            assert_eq!(trigger.to_string().parse::<Trigger>(), Ok(trigger));
        }
        assert_eq!(
            "teleport".parse::<Trigger>(),
            Err(UnknownTrigger("teleport".to_string()))
        );
    }
}
