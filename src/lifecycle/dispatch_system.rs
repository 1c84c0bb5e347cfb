use crate::clients::{GeoClient, LedgerClient, OrderClient};
use crate::config::{ConfigError, DispatchConfig};
use crate::geo_registry::GeoError;
use crate::ledger::{LedgerContext, LedgerError};
use crate::matching::{DispatchOutcome, MatchingError, MatchingService};
use crate::model::{
    AccountKey, AccountType, Caller, Driver, DriverId, DriverLocation, EntryKind, LedgerEntry,
    NewOrder, Order, OrderId, Trigger, TransitionPayload,
};
use crate::order_actor::{OrderContext, OrderError};
use crate::storage::{DriverStore, LedgerStore, MemoryStorage, OrderRepository, StorageError};
use actor_framework::ActorClient;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Owns every actor pool, the storage collaborators and the dispatch trigger loop.
///
/// # Example
///
/// ```rust
/// use dispatch_engine::config::DispatchConfig;
/// use dispatch_engine::lifecycle::DispatchSystem;
/// use dispatch_engine::model::{Driver, DriverId};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let system = DispatchSystem::new(DispatchConfig::default())?;
///     system.register_driver(Driver::new(DriverId(1))).await?;
///     system.report_driver_location(DriverId(1), 52.52, 13.40).await?;
///
///     system.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct DispatchSystem {
    pub orders: OrderClient,
    pub geo: GeoClient,
    pub ledger: LedgerClient,
    pub matching: MatchingService,
    drivers: Arc<dyn DriverStore>,
    config: DispatchConfig,
    dispatch_queue: Option<mpsc::Sender<OrderId>>,
    dispatch_loop: Option<JoinHandle<()>>,
    /// Task handles for every actor shard (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl DispatchSystem {
    /// Starts the system over a fresh [`MemoryStorage`].
    pub fn new(config: DispatchConfig) -> Result<Self, ConfigError> {
        let storage = Arc::new(MemoryStorage::new());
        Self::with_storage(config, storage.clone(), storage.clone(), storage)
    }

    /// Starts every actor shard against the given storage collaborators.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_storage(
        config: DispatchConfig,
        repository: Arc<dyn OrderRepository>,
        drivers: Arc<dyn DriverStore>,
        ledger_store: Arc<dyn LedgerStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        // 1. Create the shards of each component (no dependencies yet)
        let (geo_actors, geo_inner) = crate::geo_registry::new(config.shards, config.mailbox_size);
        let (ledger_actors, ledger_inner) = crate::ledger::new(config.shards, config.mailbox_size);
        let (order_actors, order_inner) = crate::order_actor::new(config.shards, config.mailbox_size);

        let geo = GeoClient::new(geo_inner, config.staleness_cutoff);
        let ledger = LedgerClient::new(ledger_inner);
        let orders = OrderClient::new(order_inner, repository.clone());

        // 2. Start the shards with their context injected
        let mut handles = Vec::new();
        for actor in geo_actors {
            handles.push(tokio::spawn(actor.run(())));
        }
        let ledger_context = LedgerContext::new(ledger_store, config.request_timeout);
        for actor in ledger_actors {
            handles.push(tokio::spawn(actor.run(ledger_context.clone())));
        }
        let order_context = OrderContext::new(repository, drivers.clone(), geo.clone(), ledger.clone());
        for actor in order_actors {
            handles.push(tokio::spawn(actor.run(order_context.clone())));
        }

        let matching = MatchingService::new(orders.clone(), geo.clone(), config.clone());

        // 3. Dispatch trigger loop
        let (dispatch_queue, dispatch_loop) = if config.auto_dispatch {
            let (sender, receiver) = mpsc::channel(config.mailbox_size);
            let handle = tokio::spawn(run_dispatch_loop(matching.clone(), receiver));
            (Some(sender), Some(handle))
        } else {
            (None, None)
        };

        info!(
            shards = config.shards,
            auto_dispatch = config.auto_dispatch,
            "Dispatch system started"
        );
        Ok(Self {
            orders,
            geo,
            ledger,
            matching,
            drivers,
            config,
            dispatch_queue,
            dispatch_loop,
            handles,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub async fn report_driver_location(
        &self,
        driver_id: DriverId,
        lat: f64,
        lng: f64,
    ) -> Result<(), GeoError> {
        self.geo.update_location(driver_id, lat, lng).await
    }

    /// Records a report with the device's timestamp. `false` when it was older than the
    /// stored one.
    pub async fn report_driver_location_at(
        &self,
        driver_id: DriverId,
        lat: f64,
        lng: f64,
        reported_at: DateTime<Utc>,
    ) -> Result<bool, GeoError> {
        self.geo
            .update_location_at(driver_id, lat, lng, reported_at)
            .await
    }

    pub async fn set_driver_online(&self, driver_id: DriverId, online: bool) -> Result<(), GeoError> {
        self.geo.set_online(driver_id, online).await
    }

    pub async fn get_driver_location(
        &self,
        driver_id: DriverId,
    ) -> Result<Option<DriverLocation>, GeoError> {
        self.geo.get(driver_id).await
    }

    pub async fn nearest_available_drivers(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<DriverId>, GeoError> {
        self.geo.nearest_available(lat, lng, radius_km, limit).await
    }

    /// Creates or updates a driver account. Use `active: false` to deactivate.
    pub async fn register_driver(&self, driver: Driver) -> Result<(), StorageError> {
        self.drivers.upsert_driver(&driver).await?;
        info!(driver_id = %driver.id, active = driver.active, "Driver registered");
        Ok(())
    }

    pub async fn place_order(&self, order_id: OrderId, params: NewOrder) -> Result<Order, OrderError> {
        self.orders.place_order(order_id, params).await
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders.get_order(order_id).await
    }

    /// Fires `trigger` with the configured request timeout.
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        trigger: Trigger,
        caller: Caller,
        payload: TransitionPayload,
    ) -> Result<Order, OrderError> {
        self.transition_order_by(order_id, trigger, caller, payload, self.config.deadline())
            .await
    }

    /// Fires `trigger` with a caller-supplied deadline.
    ///
    /// With auto-dispatch on, a successful `confirm` or `mark_ready` queues the order
    /// for matching.
    pub async fn transition_order_by(
        &self,
        order_id: OrderId,
        trigger: Trigger,
        caller: Caller,
        payload: TransitionPayload,
        deadline: Instant,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders
            .transition(order_id, trigger, caller, payload, deadline)
            .await?;

        if matches!(trigger, Trigger::Confirm | Trigger::MarkReady) && order.status.is_dispatchable() {
            self.enqueue_dispatch(order_id);
        }
        Ok(order)
    }

    fn enqueue_dispatch(&self, order_id: OrderId) {
        let Some(queue) = &self.dispatch_queue else {
            return;
        };
        match queue.try_send(order_id) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%order_id, "Dispatch queue full, order left for explicit dispatch");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%order_id, "Dispatch loop stopped, order left for explicit dispatch");
            }
        }
    }

    pub async fn dispatch_order(&self, order_id: OrderId) -> Result<DispatchOutcome, MatchingError> {
        self.matching.dispatch(order_id).await
    }

    pub async fn sweep(
        &self,
        order_ids: impl IntoIterator<Item = OrderId>,
    ) -> Vec<(OrderId, Result<DispatchOutcome, MatchingError>)> {
        self.matching.sweep(order_ids).await
    }

    pub async fn get_account_balance(
        &self,
        account_type: AccountType,
        account_id: u32,
    ) -> Result<Decimal, LedgerError> {
        self.ledger.balance_of(account_type, account_id).await
    }

    /// Posts a manual entry (wallet top-up, debit, withdrawal) with the configured
    /// request timeout.
    pub async fn post_ledger_entry(
        &self,
        account: AccountKey,
        amount: Decimal,
        kind: EntryKind,
        order_id: Option<OrderId>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.ledger
            .post(account, amount, kind, order_id, self.config.deadline())
            .await
    }

    pub async fn ledger_entries(&self, account: AccountKey) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.ledger.entries(account).await
    }

    /// Stops the dispatch loop, then every actor shard.
    ///
    /// Shards exit once every client clone is dropped, so clones held outside the
    /// system must be dropped before calling this.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down dispatch system...");

        // Closing the queue lets the loop drain what is already queued and exit
        drop(self.dispatch_queue);
        if let Some(handle) = self.dispatch_loop {
            if let Err(e) = handle.await {
                error!("Dispatch loop failed: {:?}", e);
                return Err(format!("Dispatch loop failed: {:?}", e));
            }
        }

        drop(self.matching);
        drop(self.orders);
        drop(self.ledger);
        drop(self.geo);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Dispatch system shutdown complete.");
        Ok(())
    }
}

async fn run_dispatch_loop(matching: MatchingService, mut queue: mpsc::Receiver<OrderId>) {
    info!("Dispatch loop started");
    while let Some(order_id) = queue.recv().await {
        match matching.dispatch(order_id).await {
            Ok(outcome) => info!(%order_id, %outcome, "Auto-dispatch finished"),
            Err(e) => warn!(%order_id, error = %e, class = ?e.class(), "Auto-dispatch failed"),
        }
    }
    info!("Dispatch loop stopped");
}
