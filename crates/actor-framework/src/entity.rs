//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract that every keyed resource (a driver's
//! location, a ledger account, an order) implements to be managed by the generic
//! `ResourceActor`. It specifies associated types for IDs, creation DTOs, actions,
//! context, and errors, and provides lifecycle hooks (`on_create`, `on_missing`,
//! `handle_action`).
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_missing`]
//! - [`ActorEntity::invalidates_state`]
//!
//! You do **not** need to implement these unless you want to customize behavior.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by ResourceActor.
///
/// # Async & Context
/// This trait is `#[async_trait]` to allow asynchronous operations in hooks (storage
/// calls, calls to other actors). It also defines a `Context` type, which is injected
/// into every hook. This allows "Late Binding" of dependencies (passing clients to
/// `run()` instead of `new()`).
///
/// # Keys
/// IDs are supplied by the caller. The entity's identity comes from the surrounding
/// system (an order number, a driver account), never from the actor.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity. Also the routing key for sharding.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The data required to create a new instance (DTO - Data Transfer Object).
    type Create: Send + Sync + Debug + 'static;

    /// Enum representing resource-specific operations (e.g., `Claim`, `Post`).
    type Action: Send + Sync + Debug + 'static;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// The error type for this entity.
    ///
    /// One enum per actor rather than one per action: clients match on a single
    /// error type for every operation of the resource.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full Entity from the ID and Payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called immediately after the entity is created and before it is stored.
    /// An error here aborts the creation.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an action targets an ID this shard does not hold.
    ///
    /// Return `Some` to hydrate the entity (from storage, or seeded from the action
    /// itself) and let the action proceed against it, or `None` to answer `NotFound`.
    async fn on_missing(
        _id: &Self::Id,
        _action: &Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Option<Self>, Self::Error> {
        Ok(None)
    }

    // --- Action Handler (Async) ---

    /// Handle a resource-specific action.
    ///
    /// The actor runs this against a working copy, in a task of its own. The stored
    /// entity is replaced only when the handler returns `Ok`, so an early `?` never
    /// leaves partial state behind. Awaiting here holds up later requests for this ID
    /// only.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Whether `error` means the cached copy may no longer match storage.
    ///
    /// When `true` the actor evicts the entity, and the next action re-runs `on_missing`.
    fn invalidates_state(_error: &Self::Error) -> bool {
        false
    }
}
