//! Entity trait implementation for the [`Order`] lifecycle.
//!
//! The shard owning an order id runs one transition at a time for it. Each transition
//! reloads the order from the repository, authorizes the caller, applies side effects
//! (driver claim, earnings post) and saves with the loaded version as the expected one,
//! so a writer outside this process can never be silently overwritten.
//!
//! A side effect whose outcome is unknown after a timeout is settled before the next
//! decision depends on it: a claim that timed out is released, and a `delivering` order
//! whose earnings reached the ledger can no longer be cancelled.

use super::permissions::authorize;
use super::{OrderAction, OrderContext, OrderError};
use crate::model::{
    AccountKey, Caller, DriverId, EntryKind, NewOrder, Order, OrderId, OrderStatus, Trigger,
    TransitionPayload,
};
use crate::storage::StorageError;
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::future::Future;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Runs `fut` until `deadline`, reporting a timeout against `order_id`.
async fn within<T>(
    order_id: OrderId,
    deadline: Instant,
    fut: impl Future<Output = T>,
) -> Result<T, OrderError> {
    timeout_at(deadline, fut)
        .await
        .map_err(|_| OrderError::Timeout(order_id))
}

impl Order {
    async fn load_fresh(&self, ctx: &OrderContext, deadline: Instant) -> Result<Order, OrderError> {
        within(self.id, deadline, ctx.repository.load_order(self.id))
            .await?
            .map_err(|e| OrderError::from_storage(self.id, e))
    }

    async fn save(
        &self,
        ctx: &OrderContext,
        expected_version: u64,
        deadline: Instant,
    ) -> Result<(), OrderError> {
        if Instant::now() >= deadline {
            return Err(OrderError::Timeout(self.id));
        }
        within(self.id, deadline, ctx.repository.save_order(self, expected_version))
            .await?
            .map_err(|e| OrderError::from_storage(self.id, e))
    }

    async fn ensure_driver_active(
        &self,
        ctx: &OrderContext,
        driver_id: DriverId,
        deadline: Instant,
    ) -> Result<(), OrderError> {
        match within(self.id, deadline, ctx.drivers.load_driver(driver_id)).await? {
            Ok(driver) if driver.active => Ok(()),
            Ok(_) | Err(StorageError::NotFound(_)) => Err(OrderError::DriverUnavailable(driver_id)),
            Err(e) => Err(OrderError::Storage(e)),
        }
    }

    /// A completion that timed out may still have paid the driver. Such an order can
    /// only be completed, never cancelled.
    async fn ensure_unpaid(
        &self,
        ctx: &OrderContext,
        driver_id: DriverId,
        deadline: Instant,
    ) -> Result<(), OrderError> {
        let earnings = AccountKey::driver_earnings(driver_id);
        let posted = within(
            self.id,
            deadline,
            ctx.ledger.posting(earnings, self.id, EntryKind::Credit),
        )
        .await??;
        match posted {
            Some(entry) => {
                warn!(order_id = %self.id, entry_id = %entry.id, "Earnings already posted, cancel refused");
                Err(OrderError::InvalidTransition {
                    from: self.status,
                    trigger: Trigger::Cancel,
                })
            }
            None => Ok(()),
        }
    }

    /// Best effort: the order is already settled, a stuck claim only hides the driver
    /// from matching until their record is released again.
    async fn release_driver(&self, ctx: &OrderContext, driver_id: DriverId) {
        if let Err(e) = ctx.geo.release(driver_id, self.id).await {
            warn!(order_id = %self.id, %driver_id, error = %e, "Driver release failed");
        }
    }

    async fn transition(
        &mut self,
        trigger: Trigger,
        caller: Caller,
        payload: TransitionPayload,
        deadline: Instant,
        ctx: &OrderContext,
    ) -> Result<Order, OrderError> {
        *self = self.load_fresh(ctx, deadline).await?;
        if trigger == Trigger::Cancel
            && self.status == OrderStatus::Cancelled
            && self.cancelled_by == Some(caller)
        {
            debug!(order_id = %self.id, %trigger, "Already applied");
            return Ok(self.clone());
        }
        authorize(&caller, trigger, self)?;

        let requested_driver = match trigger {
            Trigger::AssignDriver => Some(payload.driver_id.ok_or_else(|| {
                OrderError::InvalidPayload("assign_driver requires a driver_id".into())
            })?),
            _ => None,
        };

        if self.status == trigger.target()
            && (trigger != Trigger::AssignDriver || self.driver_id == requested_driver)
        {
            debug!(order_id = %self.id, %trigger, "Already applied");
            return Ok(self.clone());
        }

        let from = self.status;
        if !trigger.allowed_from(from) {
            return Err(OrderError::InvalidTransition { from, trigger });
        }

        let expected_version = self.version;
        let mut claimed = None;
        let mut release_after = None;

        match trigger {
            Trigger::AssignDriver => {
                if let Some(driver_id) = requested_driver {
                    self.ensure_driver_active(ctx, driver_id, deadline).await?;
                    match timeout_at(deadline, ctx.geo.claim(driver_id, self.id)).await {
                        Ok(claim) => claim?,
                        Err(_) => {
                            // The claim may still land after the deadline
                            self.release_driver(ctx, driver_id).await;
                            return Err(OrderError::Timeout(self.id));
                        }
                    }
                    claimed = Some(driver_id);
                    self.driver_id = Some(driver_id);
                }
            }
            Trigger::Complete => {
                let driver_id = self
                    .driver_id
                    .ok_or(OrderError::InvalidTransition { from, trigger })?;
                let entry = within(
                    self.id,
                    deadline,
                    ctx.ledger.post(
                        AccountKey::driver_earnings(driver_id),
                        self.delivery_fee,
                        EntryKind::Credit,
                        Some(self.id),
                        deadline,
                    ),
                )
                .await??;
                debug!(order_id = %self.id, entry_id = %entry.id, "Earnings posted");
                release_after = Some(driver_id);
            }
            Trigger::Cancel => {
                if let (OrderStatus::Delivering, Some(driver_id)) = (from, self.driver_id) {
                    self.ensure_unpaid(ctx, driver_id, deadline).await?;
                }
                release_after = self.driver_id.take();
                self.cancel_reason = payload.reason;
                self.cancelled_by = Some(caller);
            }
            Trigger::Confirm
            | Trigger::StartPreparing
            | Trigger::MarkReady
            | Trigger::StartDelivery => {}
        }

        self.status = trigger.target();
        self.status_updated_at = Utc::now();
        self.version = expected_version + 1;

        if let Err(e) = self.save(ctx, expected_version, deadline).await {
            if let Some(driver_id) = claimed {
                self.release_driver(ctx, driver_id).await;
            }
            return Err(e);
        }

        info!(order_id = %self.id, %from, to = %self.status, version = self.version, "Transitioned");
        if let Some(driver_id) = release_after {
            self.release_driver(ctx, driver_id).await;
        }
        Ok(self.clone())
    }
}

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = NewOrder;
    type Action = OrderAction;
    type ActionResult = Order;
    type Context = OrderContext;
    type Error = OrderError;

    fn from_create_params(id: OrderId, params: NewOrder) -> Result<Self, Self::Error> {
        if params.total_amount <= Decimal::ZERO {
            return Err(OrderError::InvalidOrder(format!(
                "total_amount must be positive, got {}",
                params.total_amount
            )));
        }
        if params.delivery_fee <= Decimal::ZERO {
            return Err(OrderError::InvalidOrder(format!(
                "delivery_fee must be positive, got {}",
                params.delivery_fee
            )));
        }
        if !params.pickup.is_valid() {
            return Err(OrderError::InvalidOrder(format!(
                "invalid pickup location {}",
                params.pickup
            )));
        }
        Ok(Order::new(id, params, Utc::now()))
    }

    async fn on_create(&mut self, ctx: &OrderContext) -> Result<(), Self::Error> {
        ctx.repository
            .insert_order(self)
            .await
            .map_err(|e| OrderError::from_storage(self.id, e))
    }

    async fn on_missing(
        id: &OrderId,
        action: &OrderAction,
        ctx: &OrderContext,
    ) -> Result<Option<Self>, Self::Error> {
        let OrderAction::Transition { deadline, .. } = action;
        match within(*id, *deadline, ctx.repository.load_order(*id)).await? {
            Ok(order) => Ok(Some(order)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(OrderError::from_storage(*id, e)),
        }
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        ctx: &OrderContext,
    ) -> Result<Order, Self::Error> {
        match action {
            OrderAction::Transition {
                trigger,
                caller,
                payload,
                deadline,
            } => {
                self.transition(trigger, caller, payload, deadline, ctx)
                    .await
            }
        }
    }

    fn invalidates_state(error: &OrderError) -> bool {
        error.class().is_retryable() || matches!(error, OrderError::NotFound(_))
    }
}
