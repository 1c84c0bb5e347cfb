//! # Actor Framework
//!
//! This crate provides the foundational building blocks for creating type-safe, concurrent
//! actor systems in Rust. It implements a **Resource-Oriented Architecture (ROA)** pattern
//! on top of the **Actor Model**, providing a clean abstraction for managing keyed, stateful
//! entities.
//!
//! ## Why ROA + Actor Model?
//!
//! ### Resource-Oriented Architecture (ROA)
//!
//! - A small, uniform set of operations (Create, Get, Action, Select) on well-defined resources
//! - Predictable lifecycle management
//! - Clean, uniform API surface across all resource types
//!
//! ### Actor Model
//!
//! - Isolated state (no shared memory, no locks)
//! - Message-passing concurrency
//! - Sequential processing per key eliminates lost updates
//!
//! ### The Synergy
//!
//! - **Separation**: Each resource type (driver location, ledger account, order) gets its own
//!   actors with completely isolated state
//! - **Coordination**: When resources need to interact (e.g., an order claiming a driver),
//!   they communicate via **Action messages** instead of direct coupling
//! - **Scalability**: Each resource is split into shards keyed by ID, so unrelated keys never
//!   wait on each other
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model) - Foundational concurrency pattern by Carl Hewitt
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your business logic and domain models
//! 2. **Runtime Layer** ([`ResourceActor`]) - Message processing and concurrency
//! 3. **Interface Layer** ([`ResourceClient`]) - Type-safe communication and key routing
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via the `run()` method, not at construction time.
//! This "late binding" lets an actor receive the clients of actors created alongside it:
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor, ResourceClient};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Wallet { id: u32, balance: i64 }
//! #[derive(Debug)] struct WalletCreate;
//! #[derive(Debug)] enum WalletAction { Credit(i64) }
//! #[derive(Debug, thiserror::Error)] #[error("wallet error")] struct WalletError;
//!
//! #[async_trait]
//! impl ActorEntity for Wallet {
//!     type Id = u32; type Create = WalletCreate; type Action = WalletAction;
//!     type ActionResult = i64; type Context = (); type Error = WalletError;
//!     fn from_create_params(id: u32, _: WalletCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, balance: 0 })
//!     }
//!     async fn handle_action(&mut self, action: WalletAction, _: &()) -> Result<i64, Self::Error> {
//!         let WalletAction::Credit(amount) = action;
//!         self.balance += amount;
//!         Ok(self.balance)
//!     }
//! }
//!
//! #[derive(Clone, Debug)] struct Payout { id: u32 }
//! #[derive(Debug)] struct PayoutCreate { wallet: u32, amount: i64 }
//! #[derive(Debug)] enum PayoutAction {}
//! #[derive(Debug, thiserror::Error)] #[error("payout failed")] struct PayoutError;
//!
//! #[async_trait]
//! impl ActorEntity for Payout {
//!     type Id = u32; type Create = PayoutCreate; type Action = PayoutAction;
//!     type ActionResult = (); type Context = ResourceClient<Wallet>; type Error = PayoutError;
//!     fn from_create_params(id: u32, _: PayoutCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn handle_action(&mut self, _: PayoutAction, _: &Self::Context) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Create all actors (no dependencies yet)
//!     let (wallet_actors, wallet_client) = ResourceActor::<Wallet>::sharded(2, 10);
//!     let (payout_actor, payout_client) = ResourceActor::<Payout>::new(10);
//!
//!     // 2. Wire dependencies when starting actors
//!     for actor in wallet_actors {
//!         tokio::spawn(actor.run(()));
//!     }
//!     tokio::spawn(payout_actor.run(wallet_client.clone()));
//!
//!     // 3. Use the actors
//!     wallet_client.create(1, WalletCreate).await.unwrap();
//!     let balance = wallet_client.perform_action(1, WalletAction::Credit(5)).await.unwrap();
//!     assert_eq!(balance, 5);
//!     let _ = payout_client.create(9, PayoutCreate { wallet: 1, amount: 5 }).await;
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each shard runs in its own Tokio task and spawns one task per running turn
//! - Creates and actions for one key are processed **sequentially**, in arrival order
//! - Different keys run in **parallel**, on the same shard or not
//! - No shared mutable state (message passing only)
//!
//! ## Testing
//!
//! The [`mock`] module provides a scripted [`mock::MockClient`] and channel helpers for
//! playing a dependency by hand inside actor tests.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{Predicate, ResourceRequest, Response};
