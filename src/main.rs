//! Demo: one driver, one order, from placement to paid delivery.

use dispatch_engine::config::DispatchConfig;
use dispatch_engine::lifecycle::{setup_tracing, DispatchSystem};
use dispatch_engine::matching::DispatchOutcome;
use dispatch_engine::model::{
    AccountType, Caller, CustomerId, Driver, DriverId, GeoPoint, NewOrder, OrderId, RestaurantId,
    Trigger, TransitionPayload,
};
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = DispatchConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting dispatch engine");
    let system = DispatchSystem::new(config).map_err(|e| e.to_string())?;

    let driver_id = DriverId(1);
    let restaurant = RestaurantId(10);
    let order_id = OrderId(100);

    let span = tracing::info_span!("driver_onboarding");
    async {
        system
            .register_driver(Driver::new(driver_id))
            .await
            .map_err(|e| e.to_string())?;
        system
            .report_driver_location(driver_id, 52.5200, 13.4050)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("order_placement");
    let order = async {
        let params = NewOrder {
            restaurant_id: restaurant,
            customer_id: CustomerId(20),
            total_amount: Decimal::new(2450, 2),
            delivery_fee: Decimal::new(399, 2),
            pickup: GeoPoint::new(52.5210, 13.4090),
        };
        system.place_order(order_id, params).await?;
        system
            .transition_order(
                order_id,
                Trigger::Confirm,
                Caller::restaurant(restaurant),
                TransitionPayload::default(),
            )
            .await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;
    info!(order_id = %order.id, status = %order.status, "Order confirmed");

    // The dispatch loop may already have assigned the driver
    let span = tracing::info_span!("dispatch");
    let assigned = match system.dispatch_order(order_id).instrument(span).await {
        Ok(DispatchOutcome::Assigned(id) | DispatchOutcome::AlreadyAssigned(id)) => id,
        Ok(DispatchOutcome::NoDriverFound) => {
            error!(%order_id, "No driver nearby");
            return system.shutdown().await;
        }
        Err(e) => {
            error!(error = %e, "Dispatch failed");
            return Err(e.to_string());
        }
    };
    info!(%order_id, driver_id = %assigned, "Driver on the way");

    let span = tracing::info_span!("delivery");
    async {
        for trigger in [Trigger::StartDelivery, Trigger::Complete] {
            system
                .transition_order(
                    order_id,
                    trigger,
                    Caller::driver(assigned),
                    TransitionPayload::default(),
                )
                .await?;
        }
        Ok::<_, dispatch_engine::order_actor::OrderError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let earnings = system
        .get_account_balance(AccountType::DriverEarnings, assigned.0)
        .await
        .map_err(|e| e.to_string())?;
    info!(driver_id = %assigned, %earnings, "Delivery paid");

    system.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}
