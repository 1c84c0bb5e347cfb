//! # Generic Client
//!
//! This module defines the generic client for communicating with actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{Predicate, ResourceRequest};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// ## ResourceClient
///
/// The `ResourceClient<T>` provides a type‑safe, async API for interacting with the
/// shards of a `ResourceActor<T>`. It forwards Create, Get, Action and Select requests
/// over Tokio mpsc channels and returns results via oneshot channels.
///
/// * **Cloneable** – holds only senders, so cloning is inexpensive.
/// * **Key routing** – every request for an ID goes to the same shard.
/// * **Generic** – works with any entity that implements `ActorEntity`.
pub struct ResourceClient<T: ActorEntity> {
    senders: Arc<[mpsc::Sender<ResourceRequest<T>>]>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            senders: Arc::clone(&self.senders),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    /// A client talking to a single shard.
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self {
            senders: Arc::from(vec![sender]),
        }
    }

    /// A client routing over several shards. `senders` must not be empty.
    pub fn sharded(senders: Vec<mpsc::Sender<ResourceRequest<T>>>) -> Self {
        debug_assert!(!senders.is_empty(), "a sharded client needs at least one shard");
        Self {
            senders: Arc::from(senders),
        }
    }

    /// Number of shards behind this client.
    pub fn shards(&self) -> usize {
        self.senders.len()
    }

    fn route(&self, id: &T::Id) -> &mpsc::Sender<ResourceRequest<T>> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let shard = (hasher.finish() % self.senders.len() as u64) as usize;
        &self.senders[shard]
    }

    pub async fn create(&self, id: T::Id, params: T::Create) -> Result<T, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.route(&id)
            .send(ResourceRequest::Create {
                id,
                params,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.route(&id)
            .send(ResourceRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.route(&id)
            .send(ResourceRequest::Action {
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Collects the entities matching `predicate` from every shard.
    ///
    /// Each shard answers from its own consistent view; the union is not a
    /// point-in-time snapshot across shards.
    pub async fn select(
        &self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError<T::Error>> {
        let predicate: Predicate<T> = Arc::new(predicate);
        let mut pending = Vec::with_capacity(self.senders.len());
        for sender in self.senders.iter() {
            let (respond_to, response) = oneshot::channel();
            sender
                .send(ResourceRequest::Select {
                    predicate: Arc::clone(&predicate),
                    respond_to,
                })
                .await
                .map_err(|_| FrameworkError::ActorClosed)?;
            pending.push(response);
        }

        let mut matches = Vec::new();
        for response in pending {
            matches.extend(response.await.map_err(|_| FrameworkError::ActorDropped)??);
        }
        Ok(matches)
    }
}
