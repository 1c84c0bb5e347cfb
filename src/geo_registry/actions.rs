use crate::model::{GeoPoint, OrderId};
use chrono::{DateTime, Utc};

/// Operations on one driver's location record.
#[derive(Debug, Clone)]
pub enum GeoAction {
    /// Seeds the record on first report. Reports older than the stored one are dropped.
    ReportLocation {
        position: GeoPoint,
        reported_at: DateTime<Utc>,
    },
    SetOnline(bool),
    /// Makes `order_id` the driver's active order if the driver is available.
    Claim {
        order_id: OrderId,
        fresh_after: DateTime<Utc>,
    },
    Release(OrderId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoActionResult {
    /// `false` when the report was older than the stored position.
    ReportLocation(bool),
    SetOnline(()),
    Claim(()),
    /// `false` when the driver was not holding that order.
    Release(bool),
}
