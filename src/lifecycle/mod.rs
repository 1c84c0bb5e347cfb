//! # System Lifecycle
//!
//! Starting, wiring and stopping the engine.
//!
//! Actors are created without dependencies and receive them in `run(context)`. The
//! wiring is one-directional: order actors hold GeoRegistry and Ledger clients, nothing
//! holds an order client except the [`MatchingService`](crate::matching::MatchingService)
//! and the dispatch loop. No actor can therefore wait on an actor that waits on it.
//!
//! ```text
//! MatchingService ─┬─> order shards ─┬─> geo shards
//!                  │                 └─> ledger shards
//!                  └─> geo shards
//! ```
//!
//! [`DispatchSystem::shutdown`] closes the dispatch queue, waits for the loop, then drops
//! its clients so each shard sees its channel close and exits.

pub mod dispatch_system;
pub mod telemetry;

pub use dispatch_system::*;
pub use telemetry::*;
