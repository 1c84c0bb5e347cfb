//! # Dispatch Engine
//!
//! > **Order dispatch and driver matching on sharded resource actors.**
//!
//! Drivers report their position, restaurants and customers move orders through their
//! lifecycle, and a matching service assigns the nearest available driver to every
//! order that becomes dispatchable. Completing a delivery credits the driver's
//! earnings in an append-only ledger.
//!
//! ## 🏗️ Components
//!
//! | Component | Entity | Module |
//! |---|---|---|
//! | GeoRegistry | [`DriverLocation`](model::DriverLocation) per driver | [`geo_registry`] |
//! | Ledger | [`Account`](model::Account) per account | [`ledger`] |
//! | OrderStateMachine | [`Order`](model::Order) per order | [`order_actor`] |
//! | MatchingService | stateless | [`matching`] |
//!
//! Each stateful component is a pool of
//! [`ResourceActor`](actor_framework::ResourceActor) shards. Every request for one key
//! lands on the same shard and is handled one at a time, which is all the locking the
//! engine needs: two dispatches of one order, two posts to one account, or two reports
//! from one driver never interleave.
//!
//! ## 🗺️ Module Tour
//!
//! - [`model`] - Plain data: ids, orders, locations, ledger entries, callers
//! - [`clients`] - Typed wrappers over `ResourceClient` for each component
//! - [`storage`] - Repository traits the actors persist through, plus [`MemoryStorage`](storage::MemoryStorage)
//! - [`config`] - [`DispatchConfig`](config::DispatchConfig), loaded from the environment
//! - [`error`] - [`ErrorClass`](error::ErrorClass), shared by every component error
//! - [`lifecycle`] - [`DispatchSystem`](lifecycle::DispatchSystem): wiring, dispatch loop, shutdown
//!
//! ## Errors
//!
//! Each component has its own `thiserror` enum (`GeoError`, `LedgerError`, `OrderError`,
//! `MatchingError`). All of them expose `class()`:
//!
//! - **Validation** and **BusinessRule** errors change nothing and should not be retried.
//! - **Concurrency** errors are safe to retry against fresh state.
//! - **Infrastructure** errors leave the outcome unknown. Transitions and order-tagged
//!   ledger posts are idempotent, so re-invoking them is the recovery path.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod geo_registry;
pub mod ledger;
pub mod lifecycle;
pub mod matching;
pub mod model;
pub mod order_actor;
pub mod storage;
