//! # Order State Machine
//!
//! Order lifecycle actors. Each transition is checked against the transition table
//! ([`Trigger::allowed_from`](crate::model::Trigger::allowed_from)) and the capability
//! table ([`permissions::CAPABILITIES`]) before anything is written.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Order`]
//! - [`error`] - [`OrderError`]
//! - [`actions`] - [`OrderAction`]
//! - [`permissions`] - Role and ownership checks
//! - [`new()`] - Factory function that creates the shards and their client
//!
//! ## Side effects
//!
//! | Trigger         | Effect                                                     |
//! |-----------------|------------------------------------------------------------|
//! | `assign_driver` | Driver must be active; claimed in the GeoRegistry          |
//! | `complete`      | Delivery fee credited to the driver's earnings account     |
//! | `cancel`        | Refused once earnings are posted; reason and caller        |
//! |                 | recorded; assigned driver released                         |
//!
//! A repeated trigger whose target status is already current returns the order unchanged
//! and repeats none of these effects. The caller recorded on a cancel may repeat it even
//! though cancelling unassigned them.

pub mod actions;
pub mod entity;
pub mod error;
pub mod permissions;

pub use actions::*;
pub use error::*;

use crate::clients::{GeoClient, LedgerClient};
use crate::model::Order;
use crate::storage::{DriverStore, OrderRepository};
use actor_framework::{ResourceActor, ResourceClient};
use std::sync::Arc;

/// Collaborators every order actor works against.
#[derive(Clone)]
pub struct OrderContext {
    pub repository: Arc<dyn OrderRepository>,
    pub drivers: Arc<dyn DriverStore>,
    pub geo: GeoClient,
    pub ledger: LedgerClient,
}

impl OrderContext {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        drivers: Arc<dyn DriverStore>,
        geo: GeoClient,
        ledger: LedgerClient,
    ) -> Self {
        Self {
            repository,
            drivers,
            geo,
            ledger,
        }
    }
}

/// Creates the Order shards and their routing client.
pub fn new(shards: usize, mailbox_size: usize) -> (Vec<ResourceActor<Order>>, ResourceClient<Order>) {
    ResourceActor::sharded(shards, mailbox_size)
}
