//! # Ledger
//!
//! Append-only money movements plus a cached balance projection per account.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Account`]
//! - [`error`] - [`LedgerError`]
//! - [`actions`] - [`LedgerAction`] and [`LedgerActionResult`]
//! - [`new()`] - Factory function that creates the shards and their client
//!
//! ## Atomicity
//!
//! A post is checked and written in one turn of the shard that owns the account: the
//! balance check, the append and the projection update cannot interleave with another
//! post to the same account. The storage collaborator re-checks outflows on append, so a
//! second writer outside this process still cannot overdraw.
//!
//! ## Retries
//!
//! A post carrying an `order_id` is idempotent per `(order_id, kind)`: re-posting returns
//! the stored entry. An order completion that timed out can therefore be retried
//! without paying the driver twice.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::Account;
use crate::storage::LedgerStore;
use actor_framework::{ResourceActor, ResourceClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Dependencies injected into every account actor.
#[derive(Clone)]
pub struct LedgerContext {
    pub store: Arc<dyn LedgerStore>,
    /// Deadline for reads that do not carry one.
    pub request_timeout: Duration,
}

impl LedgerContext {
    pub fn new(store: Arc<dyn LedgerStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.request_timeout
    }
}

/// Creates the Ledger shards and their routing client.
pub fn new(shards: usize, mailbox_size: usize) -> (Vec<ResourceActor<Account>>, ResourceClient<Account>) {
    ResourceActor::sharded(shards, mailbox_size)
}
