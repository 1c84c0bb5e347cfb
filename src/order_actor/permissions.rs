//! Who may fire which trigger.
//!
//! The whole capability model lives in [`CAPABILITIES`]: a `(role, trigger)` pair that is
//! not listed is forbidden, and a listed pair may further require the caller to own the
//! order.

use super::OrderError;
use crate::model::{Caller, DriverId, Order, Role, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any order.
    Any,
    /// The order's restaurant.
    OwningRestaurant,
    /// The customer who placed the order.
    OwningCustomer,
    /// The driver currently assigned to the order.
    AssignedDriver,
}

pub const CAPABILITIES: &[(Role, Trigger, Scope)] = &[
    (Role::Restaurant, Trigger::Confirm, Scope::OwningRestaurant),
    (Role::Restaurant, Trigger::StartPreparing, Scope::OwningRestaurant),
    (Role::Restaurant, Trigger::MarkReady, Scope::OwningRestaurant),
    (Role::Restaurant, Trigger::Cancel, Scope::OwningRestaurant),
    (Role::Dispatcher, Trigger::AssignDriver, Scope::Any),
    (Role::Dispatcher, Trigger::Cancel, Scope::Any),
    (Role::Driver, Trigger::StartDelivery, Scope::AssignedDriver),
    (Role::Driver, Trigger::Complete, Scope::AssignedDriver),
    (Role::Driver, Trigger::Cancel, Scope::AssignedDriver),
    (Role::Customer, Trigger::Cancel, Scope::OwningCustomer),
    (Role::Admin, Trigger::Confirm, Scope::Any),
    (Role::Admin, Trigger::StartPreparing, Scope::Any),
    (Role::Admin, Trigger::MarkReady, Scope::Any),
    (Role::Admin, Trigger::AssignDriver, Scope::Any),
    (Role::Admin, Trigger::StartDelivery, Scope::Any),
    (Role::Admin, Trigger::Complete, Scope::Any),
    (Role::Admin, Trigger::Cancel, Scope::Any),
];

pub fn scope_for(role: Role, trigger: Trigger) -> Option<Scope> {
    CAPABILITIES
        .iter()
        .find(|(r, t, _)| *r == role && *t == trigger)
        .map(|(_, _, scope)| *scope)
}

pub fn authorize(caller: &Caller, trigger: Trigger, order: &Order) -> Result<(), OrderError> {
    let allowed = match scope_for(caller.role, trigger) {
        None => false,
        Some(Scope::Any) => true,
        Some(Scope::OwningRestaurant) => order.restaurant_id.0 == caller.id,
        Some(Scope::OwningCustomer) => order.customer_id.0 == caller.id,
        Some(Scope::AssignedDriver) => order.driver_id == Some(DriverId(caller.id)),
    };
    if allowed {
        Ok(())
    } else {
        Err(OrderError::Forbidden {
            caller: *caller,
            trigger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerId, GeoPoint, NewOrder, OrderId, RestaurantId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        let mut order = Order::new(
            OrderId(1),
            NewOrder {
                restaurant_id: RestaurantId(10),
                customer_id: CustomerId(20),
                total_amount: dec!(30),
                delivery_fee: dec!(5),
                pickup: GeoPoint::new(0.0, 0.0),
            },
            Utc::now(),
        );
        order.driver_id = Some(DriverId(30));
        order
    }

    #[test]
    fn test_admin_may_fire_everything() {
        for trigger in Trigger::ALL {
            assert!(authorize(&Caller::admin(1), trigger, &order()).is_ok());
        }
    }

    #[test]
    fn test_ownership_is_enforced() {
        let order = order();
        assert!(authorize(&Caller::restaurant(RestaurantId(10)), Trigger::Confirm, &order).is_ok());
        assert_eq!(
            authorize(&Caller::restaurant(RestaurantId(11)), Trigger::Confirm, &order),
            Err(OrderError::Forbidden {
                caller: Caller::restaurant(RestaurantId(11)),
                trigger: Trigger::Confirm
            })
        );

        assert!(authorize(&Caller::customer(CustomerId(20)), Trigger::Cancel, &order).is_ok());
        assert!(authorize(&Caller::customer(CustomerId(21)), Trigger::Cancel, &order).is_err());

        assert!(authorize(&Caller::driver(DriverId(30)), Trigger::Complete, &order).is_ok());
        assert!(authorize(&Caller::driver(DriverId(31)), Trigger::Complete, &order).is_err());
    }

    #[test]
    fn test_roles_outside_the_table_are_forbidden() {
        let order = order();
        let denied = [
            (Caller::customer(CustomerId(20)), Trigger::Confirm),
            (Caller::customer(CustomerId(20)), Trigger::Complete),
            (Caller::restaurant(RestaurantId(10)), Trigger::AssignDriver),
            (Caller::restaurant(RestaurantId(10)), Trigger::Complete),
            (Caller::driver(DriverId(30)), Trigger::AssignDriver),
            (Caller::driver(DriverId(30)), Trigger::MarkReady),
            (Caller::dispatcher(), Trigger::Complete),
            (Caller::dispatcher(), Trigger::Confirm),
        ];
        for (caller, trigger) in denied {
            assert!(
                authorize(&caller, trigger, &order).is_err(),
                "{caller} should not {trigger}"
            );
        }
    }
}
