use actor_framework::mock::{create_mock_client, expect_action, MockClient};
use actor_framework::FrameworkError;
use chrono::Utc;
use dispatch_engine::clients::{GeoClient, LedgerClient, OrderClient};
use dispatch_engine::geo_registry::{GeoAction, GeoActionResult, GeoError};
use dispatch_engine::ledger::{LedgerAction, LedgerActionResult};
use dispatch_engine::model::{
    Account, AccountKey, Caller, CustomerId, Driver, DriverId, DriverLocation, EntryId, EntryKind,
    GeoPoint, LedgerEntry, NewLedgerEntry, NewOrder, Order, OrderId, OrderStatus, RestaurantId,
    Trigger, TransitionPayload,
};
use dispatch_engine::order_actor::{OrderContext, OrderError};
use dispatch_engine::storage::{DriverStore, MemoryStorage, OrderRepository};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const RESTAURANT: RestaurantId = RestaurantId(10);
const DRIVER: DriverId = DriverId(7);

fn new_order() -> NewOrder {
    NewOrder {
        restaurant_id: RESTAURANT,
        customer_id: CustomerId(20),
        total_amount: dec!(25.00),
        delivery_fee: dec!(4.00),
        pickup: GeoPoint::new(0.0, 0.001),
    }
}

fn soon() -> Instant {
    Instant::now() + Duration::from_secs(2)
}

/// Real order actor over `MemoryStorage`, GeoRegistry and Ledger played by the given clients.
fn start_orders(
    storage: Arc<MemoryStorage>,
    geo: GeoClient,
    ledger: LedgerClient,
) -> (OrderClient, tokio::task::JoinHandle<()>) {
    let (mut actors, inner) = dispatch_engine::order_actor::new(1, 16);
    let context = OrderContext::new(storage.clone(), storage.clone(), geo, ledger);
    let handle = tokio::spawn(actors.remove(0).run(context));
    (OrderClient::new(inner, storage), handle)
}

async fn advance(orders: &OrderClient, order_id: OrderId, steps: &[(Trigger, Caller)]) -> Order {
    let mut order = None;
    for (trigger, caller) in steps {
        let payload = match trigger {
            Trigger::AssignDriver => TransitionPayload::driver(DRIVER),
            _ => TransitionPayload::default(),
        };
        order = Some(
            orders
                .transition(order_id, *trigger, *caller, payload, soon())
                .await
                .unwrap_or_else(|e| panic!("{trigger} failed: {e}")),
        );
    }
    order.expect("at least one step")
}

/// Pattern 2: Actor + Mocks
/// - Real Order actor (transition table, permissions, persistence)
/// - Mocked GeoRegistry and Ledger clients (claim, earnings, release)
#[tokio::test]
async fn test_order_lifecycle_with_mocked_dependencies() {
    let storage = Arc::new(MemoryStorage::new());
    storage.upsert_driver(&Driver::new(DRIVER)).await.unwrap();

    let mut geo_mock = MockClient::<DriverLocation>::new();
    let mut ledger_mock = MockClient::<Account>::new();

    // assign_driver claims the driver, complete pays and then releases them
    geo_mock
        .expect_action(DRIVER)
        .return_ok(GeoActionResult::Claim(()));
    let earnings = AccountKey::driver_earnings(DRIVER);
    ledger_mock
        .expect_action(earnings)
        .return_ok(LedgerActionResult::Post(LedgerEntry::from_new(
            EntryId(1),
            NewLedgerEntry {
                account: earnings,
                order_id: Some(OrderId(1)),
                amount: dec!(4.00),
                kind: EntryKind::Credit,
                created_at: Utc::now(),
            },
        )));
    geo_mock
        .expect_action(DRIVER)
        .return_ok(GeoActionResult::Release(true));

    let geo = GeoClient::new(geo_mock.client(), Duration::from_secs(300));
    let ledger = LedgerClient::new(ledger_mock.client());
    let (orders, _handle) = start_orders(storage.clone(), geo, ledger);

    let placed = orders.place_order(OrderId(1), new_order()).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Pending);
    assert_eq!(placed.version, 0);

    let order = advance(
        &orders,
        OrderId(1),
        &[
            (Trigger::Confirm, Caller::restaurant(RESTAURANT)),
            (Trigger::AssignDriver, Caller::dispatcher()),
            (Trigger::StartDelivery, Caller::driver(DRIVER)),
            (Trigger::Complete, Caller::driver(DRIVER)),
        ],
    )
    .await;

    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.driver_id, Some(DRIVER));
    assert_eq!(order.version, 4);
    assert_eq!(storage.load_order(OrderId(1)).await.unwrap(), order);

    geo_mock.verify();
    ledger_mock.verify();
}

#[tokio::test]
async fn test_failed_claim_leaves_order_unassigned() {
    let storage = Arc::new(MemoryStorage::new());
    storage.upsert_driver(&Driver::new(DRIVER)).await.unwrap();

    let mut geo_mock = MockClient::<DriverLocation>::new();
    geo_mock
        .expect_action(DRIVER)
        .return_err(FrameworkError::Entity(GeoError::DriverUnavailable(DRIVER)));
    let ledger_mock = MockClient::<Account>::new();

    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_mock.client(), Duration::from_secs(300)),
        LedgerClient::new(ledger_mock.client()),
    );
    orders.place_order(OrderId(2), new_order()).await.unwrap();
    advance(&orders, OrderId(2), &[(Trigger::Confirm, Caller::admin(1))]).await;

    let result = orders
        .transition(
            OrderId(2),
            Trigger::AssignDriver,
            Caller::dispatcher(),
            TransitionPayload::driver(DRIVER),
            soon(),
        )
        .await;
    assert_eq!(result, Err(OrderError::DriverUnavailable(DRIVER)));

    let stored = storage.load_order(OrderId(2)).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Confirmed);
    assert_eq!(stored.driver_id, None);
    assert_eq!(stored.version, 1);
    geo_mock.verify();
}

#[tokio::test]
async fn test_claim_answered_after_deadline_is_released() {
    let storage = Arc::new(MemoryStorage::new());
    storage.upsert_driver(&Driver::new(DRIVER)).await.unwrap();

    // GeoRegistry is played by hand so it can apply the claim after the order gave up
    let (geo_inner, mut geo_requests) = create_mock_client::<DriverLocation>(10);
    let ledger_mock = MockClient::<Account>::new();
    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_inner, Duration::from_secs(300)),
        LedgerClient::new(ledger_mock.client()),
    );
    orders.place_order(OrderId(8), new_order()).await.unwrap();
    advance(&orders, OrderId(8), &[(Trigger::Confirm, Caller::admin(1))]).await;

    let assign = orders.transition(
        OrderId(8),
        Trigger::AssignDriver,
        Caller::dispatcher(),
        TransitionPayload::driver(DRIVER),
        Instant::now() + Duration::from_millis(100),
    );
    let congested_geo = async {
        let (driver_id, action, responder) = expect_action(&mut geo_requests)
            .await
            .expect("Expected Claim request");
        assert_eq!(driver_id, DRIVER);
        assert!(matches!(action, GeoAction::Claim { order_id: OrderId(8), .. }));
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = responder.send(Ok(GeoActionResult::Claim(())));

        let (driver_id, action, responder) = expect_action(&mut geo_requests)
            .await
            .expect("Expected Release request");
        assert_eq!(driver_id, DRIVER);
        assert!(matches!(action, GeoAction::Release(OrderId(8))));
        responder.send(Ok(GeoActionResult::Release(true))).unwrap();
    };
    let (result, ()) = tokio::join!(assign, congested_geo);

    assert_eq!(result, Err(OrderError::Timeout(OrderId(8))));
    let stored = storage.load_order(OrderId(8)).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Confirmed);
    assert_eq!(stored.driver_id, None);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_deactivated_driver_is_never_claimed() {
    let storage = Arc::new(MemoryStorage::new());
    let mut driver = Driver::new(DRIVER);
    driver.active = false;
    storage.upsert_driver(&driver).await.unwrap();

    // No geo expectations: a claim request would fail the mock
    let geo_mock = MockClient::<DriverLocation>::new();
    let ledger_mock = MockClient::<Account>::new();
    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_mock.client(), Duration::from_secs(300)),
        LedgerClient::new(ledger_mock.client()),
    );
    orders.place_order(OrderId(3), new_order()).await.unwrap();
    advance(&orders, OrderId(3), &[(Trigger::Confirm, Caller::admin(1))]).await;

    for driver_id in [DRIVER, DriverId(99)] {
        let result = orders
            .transition(
                OrderId(3),
                Trigger::AssignDriver,
                Caller::dispatcher(),
                TransitionPayload::driver(driver_id),
                soon(),
            )
            .await;
        assert_eq!(result, Err(OrderError::DriverUnavailable(driver_id)));
    }
    geo_mock.verify();
}

#[tokio::test]
async fn test_ledger_timeout_keeps_order_delivering() {
    let storage = Arc::new(MemoryStorage::new());
    storage.upsert_driver(&Driver::new(DRIVER)).await.unwrap();

    let mut geo_mock = MockClient::<DriverLocation>::new();
    geo_mock
        .expect_action(DRIVER)
        .return_ok(GeoActionResult::Claim(()));

    // The ledger is played by hand so it can stay silent past the deadline
    let (ledger_inner, mut ledger_requests) = create_mock_client::<Account>(10);
    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_mock.client(), Duration::from_secs(300)),
        LedgerClient::new(ledger_inner),
    );
    orders.place_order(OrderId(4), new_order()).await.unwrap();
    advance(
        &orders,
        OrderId(4),
        &[
            (Trigger::Confirm, Caller::admin(1)),
            (Trigger::AssignDriver, Caller::dispatcher()),
            (Trigger::StartDelivery, Caller::driver(DRIVER)),
        ],
    )
    .await;

    let complete = orders.transition(
        OrderId(4),
        Trigger::Complete,
        Caller::driver(DRIVER),
        TransitionPayload::default(),
        Instant::now() + Duration::from_millis(100),
    );
    let (result, request) = tokio::join!(complete, expect_action(&mut ledger_requests));

    let (account, action, _responder) = request.expect("Expected Post request");
    assert_eq!(account, AccountKey::driver_earnings(DRIVER));
    assert!(matches!(
        action,
        LedgerAction::Post {
            kind: EntryKind::Credit,
            order_id: Some(OrderId(4)),
            ..
        }
    ));

    let err = result.unwrap_err();
    assert_eq!(err, OrderError::Timeout(OrderId(4)));
    assert!(err.class().is_retryable());
    let stored = storage.load_order(OrderId(4)).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Delivering);
    assert_eq!(stored.version, 3);
}

#[tokio::test]
async fn test_transition_sees_external_writes() {
    let storage = Arc::new(MemoryStorage::new());
    let geo_mock = MockClient::<DriverLocation>::new();
    let ledger_mock = MockClient::<Account>::new();
    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_mock.client(), Duration::from_secs(300)),
        LedgerClient::new(ledger_mock.client()),
    );

    orders.place_order(OrderId(5), new_order()).await.unwrap();
    advance(&orders, OrderId(5), &[(Trigger::Confirm, Caller::admin(1))]).await;

    // Another process cancels the order behind the actor's back
    let mut external = storage.load_order(OrderId(5)).await.unwrap();
    external.status = OrderStatus::Cancelled;
    external.version += 1;
    storage.save_order(&external, 1).await.unwrap();

    let result = orders
        .transition(
            OrderId(5),
            Trigger::StartPreparing,
            Caller::restaurant(RESTAURANT),
            TransitionPayload::default(),
            soon(),
        )
        .await;
    assert_eq!(
        result,
        Err(OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            trigger: Trigger::StartPreparing
        })
    );
}

#[tokio::test]
async fn test_invalid_orders_are_rejected_on_create() {
    let storage = Arc::new(MemoryStorage::new());
    let geo_mock = MockClient::<DriverLocation>::new();
    let ledger_mock = MockClient::<Account>::new();
    let (orders, _handle) = start_orders(
        storage.clone(),
        GeoClient::new(geo_mock.client(), Duration::from_secs(300)),
        LedgerClient::new(ledger_mock.client()),
    );

    let mut free_delivery = new_order();
    free_delivery.delivery_fee = dec!(0);
    let mut off_map = new_order();
    off_map.pickup = GeoPoint::new(95.0, 0.0);

    for params in [free_delivery, off_map] {
        let result = orders.place_order(OrderId(6), params).await;
        assert!(matches!(result, Err(OrderError::InvalidOrder(_))));
    }
    assert!(storage.load_order(OrderId(6)).await.is_err());

    orders.place_order(OrderId(6), new_order()).await.unwrap();
    assert_eq!(
        orders.place_order(OrderId(6), new_order()).await,
        Err(OrderError::AlreadyExists(OrderId(6)))
    );
}
