//! Entity trait implementation for [`DriverLocation`].
//!
//! Records are never created through `Create` by the engine: the first
//! [`GeoAction::ReportLocation`] for an unknown driver seeds one in `on_missing`.

use super::{GeoAction, GeoActionResult, GeoError};
use crate::model::{DriverId, DriverLocation, GeoPoint};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

fn check_coordinate(position: &GeoPoint) -> Result<(), GeoError> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(GeoError::InvalidCoordinate {
            lat: position.lat,
            lng: position.lng,
        })
    }
}

#[async_trait]
impl ActorEntity for DriverLocation {
    type Id = DriverId;
    type Create = GeoPoint;
    type Action = GeoAction;
    type ActionResult = GeoActionResult;
    type Context = ();
    type Error = GeoError;

    fn from_create_params(id: DriverId, position: GeoPoint) -> Result<Self, Self::Error> {
        check_coordinate(&position)?;
        Ok(DriverLocation::new(id, position, Utc::now()))
    }

    async fn on_missing(
        id: &DriverId,
        action: &GeoAction,
        _ctx: &(),
    ) -> Result<Option<Self>, Self::Error> {
        match action {
            GeoAction::ReportLocation {
                position,
                reported_at,
            } => Ok(Some(DriverLocation::new(*id, *position, *reported_at))),
            GeoAction::Claim { .. } => Err(GeoError::DriverUnavailable(*id)),
            // Nothing to mark or release for a driver that never reported.
            GeoAction::SetOnline(_) | GeoAction::Release(_) => Ok(None),
        }
    }

    async fn handle_action(
        &mut self,
        action: GeoAction,
        _ctx: &(),
    ) -> Result<GeoActionResult, Self::Error> {
        match action {
            GeoAction::ReportLocation {
                position,
                reported_at,
            } => {
                check_coordinate(&position)?;
                if reported_at < self.updated_at {
                    debug!(driver_id = %self.driver_id, %reported_at, "Out-of-order report dropped");
                    return Ok(GeoActionResult::ReportLocation(false));
                }
                self.position = position;
                self.updated_at = reported_at;
                self.online = true;
                Ok(GeoActionResult::ReportLocation(true))
            }
            GeoAction::SetOnline(online) => {
                self.online = online;
                Ok(GeoActionResult::SetOnline(()))
            }
            GeoAction::Claim {
                order_id,
                fresh_after,
            } => {
                if self.active_order == Some(order_id) {
                    return Ok(GeoActionResult::Claim(()));
                }
                if !self.is_available(fresh_after) {
                    return Err(GeoError::DriverUnavailable(self.driver_id));
                }
                self.active_order = Some(order_id);
                Ok(GeoActionResult::Claim(()))
            }
            GeoAction::Release(order_id) => {
                if self.active_order != Some(order_id) {
                    return Ok(GeoActionResult::Release(false));
                }
                self.active_order = None;
                Ok(GeoActionResult::Release(true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderId;
    use chrono::TimeDelta;

    fn at_origin() -> DriverLocation {
        DriverLocation::new(DriverId(1), GeoPoint::new(0.0, 0.0), Utc::now())
    }

    #[tokio::test]
    async fn test_report_is_last_write_wins_on_timestamp() {
        let mut loc = at_origin();
        let earlier = loc.updated_at - TimeDelta::seconds(10);

        let result = loc
            .handle_action(
                GeoAction::ReportLocation {
                    position: GeoPoint::new(1.0, 1.0),
                    reported_at: earlier,
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(result, GeoActionResult::ReportLocation(false));
        assert_eq!(loc.position, GeoPoint::new(0.0, 0.0));

        loc.online = false;
        let later = loc.updated_at + TimeDelta::seconds(10);
        let result = loc
            .handle_action(
                GeoAction::ReportLocation {
                    position: GeoPoint::new(1.0, 1.0),
                    reported_at: later,
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(result, GeoActionResult::ReportLocation(true));
        assert_eq!(loc.position, GeoPoint::new(1.0, 1.0));
        assert!(loc.online);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_and_idempotent() {
        let mut loc = at_origin();
        let fresh_after = loc.updated_at - TimeDelta::seconds(1);

        let claim = |order| GeoAction::Claim {
            order_id: OrderId(order),
            fresh_after,
        };
        loc.handle_action(claim(7), &()).await.unwrap();
        loc.handle_action(claim(7), &()).await.unwrap();
        assert_eq!(
            loc.handle_action(claim(8), &()).await,
            Err(GeoError::DriverUnavailable(DriverId(1)))
        );

        let released = loc
            .handle_action(GeoAction::Release(OrderId(8)), &())
            .await
            .unwrap();
        assert_eq!(released, GeoActionResult::Release(false));
        let released = loc
            .handle_action(GeoAction::Release(OrderId(7)), &())
            .await
            .unwrap();
        assert_eq!(released, GeoActionResult::Release(true));
        loc.handle_action(claim(8), &()).await.unwrap();
    }

    #[tokio::test]
    async fn test_claim_rejects_stale_or_offline() {
        let mut loc = at_origin();
        let future_cutoff = loc.updated_at + TimeDelta::seconds(1);
        let result = loc
            .handle_action(
                GeoAction::Claim {
                    order_id: OrderId(1),
                    fresh_after: future_cutoff,
                },
                &(),
            )
            .await;
        assert_eq!(result, Err(GeoError::DriverUnavailable(DriverId(1))));

        loc.handle_action(GeoAction::SetOnline(false), &())
            .await
            .unwrap();
        let result = loc
            .handle_action(
                GeoAction::Claim {
                    order_id: OrderId(1),
                    fresh_after: loc.updated_at,
                },
                &(),
            )
            .await;
        assert_eq!(result, Err(GeoError::DriverUnavailable(DriverId(1))));
    }

    #[test]
    fn test_create_validates_coordinates() {
        assert!(DriverLocation::from_create_params(DriverId(2), GeoPoint::new(10.0, 10.0)).is_ok());
        assert_eq!(
            DriverLocation::from_create_params(DriverId(2), GeoPoint::new(95.0, 10.0)),
            Err(GeoError::InvalidCoordinate {
                lat: 95.0,
                lng: 10.0
            })
        );
    }
}
