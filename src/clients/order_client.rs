//! # Order Client
//!
//! Provides a high‑level API for the Order state machine actors.
use crate::model::{Caller, NewOrder, Order, OrderId, Trigger, TransitionPayload};
use crate::order_actor::{OrderAction, OrderError};
use crate::storage::OrderRepository;
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Client for the Order state machine.
///
/// Writes go through the actor that owns the order id; reads go straight to the
/// repository, which always holds the last committed version.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    repository: Arc<dyn OrderRepository>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, repository: Arc<dyn OrderRepository>) -> Self {
        Self { inner, repository }
    }

    /// Stores a new `pending` order under `order_id`.
    #[instrument(skip(self, params))]
    pub async fn place_order(&self, order_id: OrderId, params: NewOrder) -> Result<Order, OrderError> {
        debug!(restaurant_id = %params.restaurant_id, "Sending request");
        self.inner
            .create(order_id, params)
            .await
            .map_err(|e| match e {
                FrameworkError::AlreadyExists(_) => OrderError::AlreadyExists(order_id),
                other => Self::map_error(other),
            })
    }

    /// Fires `trigger` on the order on behalf of `caller`.
    ///
    /// Returns the order as committed, or unchanged when the trigger had already
    /// been applied.
    #[instrument(skip(self, payload))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        trigger: Trigger,
        caller: Caller,
        payload: TransitionPayload,
        deadline: Instant,
    ) -> Result<Order, OrderError> {
        debug!("Sending request");
        let action = OrderAction::Transition {
            trigger,
            caller,
            payload,
            deadline,
        };
        self.inner
            .perform_action(order_id, action)
            .await
            .map_err(|e| match e {
                FrameworkError::NotFound(_) => OrderError::NotFound(order_id),
                other => Self::map_error(other),
            })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.repository
            .load_order(order_id)
            .await
            .map_err(|e| OrderError::from_storage(order_id, e))
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError<OrderError>) -> Self::Error {
        match e {
            FrameworkError::Entity(e) => e,
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerId, DriverId, GeoPoint, RestaurantId};
    use crate::storage::MemoryStorage;
    use actor_framework::mock::{create_mock_client, expect_action, expect_create, MockClient};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn new_order() -> NewOrder {
        NewOrder {
            restaurant_id: RestaurantId(1),
            customer_id: CustomerId(2),
            total_amount: dec!(42.00),
            delivery_fee: dec!(3.50),
            pickup: GeoPoint::new(48.85, 2.35),
        }
    }

    #[tokio::test]
    async fn test_place_order_maps_duplicate_id() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner, Arc::new(MemoryStorage::new()));

        let place_task = tokio::spawn(async move { client.place_order(OrderId(7), new_order()).await });

        let (id, params, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(id, OrderId(7));
        assert_eq!(params.delivery_fee, dec!(3.50));
        responder
            .send(Err(FrameworkError::AlreadyExists(id.to_string())))
            .unwrap();

        let result = place_task.await.unwrap();
        assert_eq!(result, Err(OrderError::AlreadyExists(OrderId(7))));
    }

    #[tokio::test]
    async fn test_transition_forwards_trigger_and_payload() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner, Arc::new(MemoryStorage::new()));
        let deadline = Instant::now() + Duration::from_secs(1);

        let task = tokio::spawn(async move {
            client
                .transition(
                    OrderId(3),
                    Trigger::AssignDriver,
                    Caller::dispatcher(),
                    TransitionPayload::driver(DriverId(9)),
                    deadline,
                )
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, OrderId(3));
        let OrderAction::Transition {
            trigger, payload, ..
        } = action;
        assert_eq!(trigger, Trigger::AssignDriver);
        assert_eq!(payload.driver_id, Some(DriverId(9)));
        responder
            .send(Err(FrameworkError::NotFound(id.to_string())))
            .unwrap();

        assert_eq!(task.await.unwrap(), Err(OrderError::NotFound(OrderId(3))));
    }

    #[tokio::test]
    async fn test_entity_errors_pass_through() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId(4))
            .return_err(FrameworkError::Entity(OrderError::ConcurrentModification(OrderId(4))));
        let client = OrderClient::new(mock.client(), Arc::new(MemoryStorage::new()));

        let result = client
            .transition(
                OrderId(4),
                Trigger::Confirm,
                Caller::admin(1),
                TransitionPayload::default(),
                Instant::now() + Duration::from_secs(1),
            )
            .await;
        let err = result.unwrap_err();
        assert_eq!(err, OrderError::ConcurrentModification(OrderId(4)));
        assert!(err.class().is_retryable());
        mock.verify();
    }

    #[tokio::test]
    async fn test_get_order_reads_the_repository() {
        let storage = Arc::new(MemoryStorage::new());
        let order = Order::new(OrderId(5), new_order(), chrono::Utc::now());
        storage.insert_order(&order).await.unwrap();

        let mock = MockClient::<Order>::new();
        let client = OrderClient::new(mock.client(), storage);

        assert_eq!(client.get_order(OrderId(5)).await.unwrap(), order);
        assert_eq!(
            client.get_order(OrderId(6)).await,
            Err(OrderError::NotFound(OrderId(6)))
        );
        mock.verify();
    }
}
