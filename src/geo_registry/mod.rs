//! # GeoRegistry
//!
//! Last-known location and online status per driver, held in memory by sharded
//! [`DriverLocation`](crate::model::DriverLocation) actors.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for `DriverLocation`
//! - [`error`] - [`GeoError`]
//! - [`actions`] - [`GeoAction`] and [`GeoActionResult`]
//! - [`new()`] - Factory function that creates the shards and their client
//!
//! ## Ordering
//!
//! Every report for a driver lands on the same shard, so reports are applied one at a time.
//! A report carrying an older timestamp than the stored record is dropped, which keeps
//! `updated_at` monotonic even when device uploads arrive out of order.
//!
//! ## Claims
//!
//! An order that assigns a driver claims them here ([`GeoAction::Claim`]); a claimed
//! driver drops out of proximity search until the order releases them. Claim checks
//! availability and records the order in one actor turn, so two orders can never hold
//! the same driver.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_engine::clients::GeoClient;
//! use dispatch_engine::geo_registry;
//! use dispatch_engine::model::DriverId;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actors, inner) = geo_registry::new(2, 16);
//!     for actor in actors {
//!         tokio::spawn(actor.run(()));
//!     }
//!     let geo = GeoClient::new(inner, Duration::from_secs(300));
//!
//!     geo.update_location(DriverId(1), 0.0, 0.0).await?;
//!     let nearby = geo.nearest_available(0.0, 0.001, 5.0, 5).await?;
//!     assert_eq!(nearby, vec![DriverId(1)]);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::DriverLocation;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates the GeoRegistry shards and their routing client.
pub fn new(
    shards: usize,
    mailbox_size: usize,
) -> (Vec<ResourceActor<DriverLocation>>, ResourceClient<DriverLocation>) {
    ResourceActor::sharded(shards, mailbox_size)
}
