//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns a shard of entities.
//! It implements the "Server" side of the Actor Model, processing the requests for each
//! ID sequentially and ensuring exclusive access to its part of the entity store.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use crate::message::Response;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages one shard of a keyed collection of entities.
///
/// # Architecture Note
/// This struct is the "Server" half of the actor. It owns the state (`store`) and
/// the receiver end of the channel.
///
/// **Concurrency Model**:
/// Creates and actions for one ID run one at a time, in arrival order, so everything
/// that happens to that ID (load, validate, commit) is atomic with respect to every
/// other request for it. Each turn runs in its own task: while one ID waits on storage
/// or another actor, the shard keeps serving every other ID it owns. Contention is
/// scoped to the ID, never to the shard or the whole collection.
///
/// `Get` and `Select` are answered from the last committed state and never wait for a
/// running turn.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `ResourceActor::sharded()` (or `new()` for a single shard) to
///     get the actors (servers) and the client (interface).
/// 2.  **Wire**: Pass dependencies (other clients, storage) into `actor.run(context)`.
/// 3.  **Run**: Spawn each actor's run loop in a background task.
///
/// ```rust
/// use actor_framework::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Counter { id: u32, hits: u32 }
/// #[derive(Debug)] struct CounterCreate;
/// #[derive(Debug)] enum CounterAction { Hit }
/// #[derive(Debug, thiserror::Error)] #[error("counter error")] struct CounterError;
///
/// #[async_trait]
/// impl ActorEntity for Counter {
///     type Id = u32;
///     type Create = CounterCreate;
///     type Action = CounterAction;
///     type ActionResult = u32;
///     type Context = ();
///     type Error = CounterError;
///
///     fn from_create_params(id: u32, _: CounterCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, hits: 0 })
///     }
///     async fn handle_action(&mut self, _: CounterAction, _: &()) -> Result<u32, Self::Error> {
///         self.hits += 1;
///         Ok(self.hits)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actors, client) = ResourceActor::<Counter>::sharded(4, 10);
///     for actor in actors {
///         tokio::spawn(actor.run(()));
///     }
///
///     client.create(7, CounterCreate).await.unwrap();
///     let hits = client.perform_action(7, CounterAction::Hit).await.unwrap();
///     assert_eq!(hits, 1);
/// }
/// ```
///
/// # Operations
///
/// * **Create**: rejects a duplicate ID, builds the entity with
///   `T::from_create_params`, runs `on_create`, then stores it.
/// * **Get**: returns a clone of the stored entity, or `None`.
/// * **Action**: finds the entity (or asks `T::on_missing` to hydrate it), runs
///   `handle_action` on a working copy and stores the copy only on success. Errors
///   for which `T::invalidates_state` is true evict the cached entity. Later requests
///   for the same ID wait until the commit.
/// * **Select**: returns clones of every stored entity matching the predicate.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    /// IDs with a running turn, and the requests parked behind it.
    in_flight: HashMap<T::Id, VecDeque<Turn<T>>>,
    shard: usize,
}

/// A create or action waiting for its ID's turn.
enum Turn<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T, T::Error>,
    },
    Action {
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
}

enum Commit<T> {
    Store(T),
    Evict,
    Keep,
}

type Reply = Box<dyn FnOnce() + Send>;

/// A finished turn, handed back to the shard loop to commit before replying.
struct Finished<T: ActorEntity> {
    id: T::Id,
    commit: Commit<T>,
    reply: Reply,
}

/// Reports a turn back to its shard when dropped, so a panicking entity hook still
/// frees its ID.
struct TurnGuard<T: ActorEntity> {
    id: T::Id,
    done: mpsc::UnboundedSender<Finished<T>>,
    outcome: Option<(Commit<T>, Reply)>,
}

impl<T: ActorEntity> TurnGuard<T> {
    fn finish(mut self, commit: Commit<T>, reply: Reply) {
        self.outcome = Some((commit, reply));
    }
}

impl<T: ActorEntity> Drop for TurnGuard<T> {
    fn drop(&mut self) {
        let (commit, reply) = match self.outcome.take() {
            Some(outcome) => outcome,
            None => (Commit::Keep, Box::new(|| ()) as Reply),
        };
        let _ = self.done.send(Finished {
            id: self.id.clone(),
            commit,
            reply,
        });
    }
}

/// What every turn task needs from its shard.
struct Shared<T: ActorEntity> {
    context: Arc<T::Context>,
    done: mpsc::UnboundedSender<Finished<T>>,
    entity_type: &'static str,
    shard: usize,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a single `ResourceActor` and its associated `ResourceClient`.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - The capacity of the MPSC channel. If the channel is full,
    ///   calls to the client will wait until there is space.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self::with_receiver(receiver, 0);
        (actor, ResourceClient::new(sender))
    }

    /// Creates `shards` actors behind one client that routes each ID to a fixed shard.
    ///
    /// A `shards` of zero is treated as one.
    pub fn sharded(shards: usize, buffer_size: usize) -> (Vec<Self>, ResourceClient<T>) {
        let shards = shards.max(1);
        let mut actors = Vec::with_capacity(shards);
        let mut senders = Vec::with_capacity(shards);
        for shard in 0..shards {
            let (sender, receiver) = mpsc::channel(buffer_size);
            actors.push(Self::with_receiver(receiver, shard));
            senders.push(sender);
        }
        (actors, ResourceClient::sharded(senders))
    }

    fn with_receiver(receiver: mpsc::Receiver<ResourceRequest<T>>, shard: usize) -> Self {
        Self {
            receiver,
            store: HashMap::new(),
            in_flight: HashMap::new(),
            shard,
        }
    }

    /// Runs the actor's event loop, processing messages until the channel closes and
    /// every running turn has committed.
    ///
    /// # Context Injection
    /// The `context` argument is injected into every entity hook. This allows entities
    /// to access external dependencies (like other clients) that were created *after*
    /// the actor was instantiated but *before* the loop started.
    pub async fn run(mut self, context: T::Context) {
        // Just the type name (e.g., "Order" instead of "dispatch_engine::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let (done, mut finished) = mpsc::unbounded_channel();
        let shared = Shared {
            context: Arc::new(context),
            done,
            entity_type,
            shard: self.shard,
        };
        let shard = self.shard;
        info!(entity_type, shard, "Actor started");

        let mut open = true;
        while open || !self.in_flight.is_empty() {
            tokio::select! {
                msg = self.receiver.recv(), if open => match msg {
                    Some(msg) => self.accept(msg, &shared),
                    None => open = false,
                },
                Some(turn) = finished.recv() => self.commit(turn, &shared),
            }
        }

        info!(entity_type, shard, size = self.store.len(), "Shutdown");
    }

    fn accept(&mut self, msg: ResourceRequest<T>, shared: &Shared<T>) {
        let (entity_type, shard) = (shared.entity_type, shared.shard);
        match msg {
            ResourceRequest::Create {
                id,
                params,
                respond_to,
            } => {
                debug!(entity_type, shard, %id, ?params, "Create");
                self.enqueue(id, Turn::Create { params, respond_to }, shared);
            }
            ResourceRequest::Get { id, respond_to } => {
                let item = self.store.get(&id).cloned();
                let found = item.is_some();
                debug!(entity_type, shard, %id, found, "Get");
                let _ = respond_to.send(Ok(item));
            }
            ResourceRequest::Action {
                id,
                action,
                respond_to,
            } => {
                debug!(entity_type, shard, %id, ?action, "Action");
                self.enqueue(id, Turn::Action { action, respond_to }, shared);
            }
            ResourceRequest::Select {
                predicate,
                respond_to,
            } => {
                let matches: Vec<T> = self
                    .store
                    .values()
                    .filter(|item| predicate(item))
                    .cloned()
                    .collect();
                debug!(entity_type, shard, matched = matches.len(), "Select");
                let _ = respond_to.send(Ok(matches));
            }
        }
    }

    fn enqueue(&mut self, id: T::Id, turn: Turn<T>, shared: &Shared<T>) {
        let busy = self.in_flight.contains_key(&id);
        let queue = self.in_flight.entry(id.clone()).or_default();
        queue.push_back(turn);
        if busy {
            let (entity_type, shard, parked) = (shared.entity_type, shared.shard, queue.len());
            debug!(entity_type, shard, %id, parked, "Waiting for turn");
        } else {
            self.advance(id, shared);
        }
    }

    fn commit(&mut self, turn: Finished<T>, shared: &Shared<T>) {
        let Finished { id, commit, reply } = turn;
        match commit {
            Commit::Store(item) => {
                self.store.insert(id.clone(), item);
            }
            Commit::Evict => {
                if self.store.remove(&id).is_some() {
                    let (entity_type, shard) = (shared.entity_type, shared.shard);
                    debug!(entity_type, shard, %id, "Evicted");
                }
            }
            Commit::Keep => {}
        }
        reply();
        self.advance(id, shared);
    }

    /// Starts the next parked turn for `id`, or frees the ID when none is left.
    fn advance(&mut self, id: T::Id, shared: &Shared<T>) {
        loop {
            let Some(queue) = self.in_flight.get_mut(&id) else {
                return;
            };
            let Some(turn) = queue.pop_front() else {
                self.in_flight.remove(&id);
                return;
            };
            if self.start(id.clone(), turn, shared) {
                return;
            }
        }
    }

    /// Spawns `turn` and returns `true`, or answers it on the spot and returns `false`.
    fn start(&mut self, id: T::Id, turn: Turn<T>, shared: &Shared<T>) -> bool {
        let (entity_type, shard) = (shared.entity_type, shared.shard);
        if matches!(turn, Turn::Create { .. }) && self.store.contains_key(&id) {
            warn!(entity_type, shard, %id, "Already exists");
            if let Turn::Create { respond_to, .. } = turn {
                let _ = respond_to.send(Err(FrameworkError::AlreadyExists(id.to_string())));
            }
            return false;
        }

        let guard = TurnGuard {
            id: id.clone(),
            done: shared.done.clone(),
            outcome: None,
        };
        let context = shared.context.clone();

        match turn {
            Turn::Create { params, respond_to } => {
                tokio::spawn(async move {
                    let created = match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => match item.on_create(&context).await {
                            Ok(()) => Ok(item),
                            Err(e) => {
                                warn!(entity_type, shard, %id, error = %e, "on_create failed");
                                Err(e)
                            }
                        },
                        Err(e) => {
                            warn!(entity_type, shard, %id, error = %e, "Create failed");
                            Err(e)
                        }
                    };
                    match created {
                        Ok(item) => {
                            info!(entity_type, shard, %id, "Created");
                            let reply = item.clone();
                            guard.finish(
                                Commit::Store(item),
                                Box::new(move || {
                                    let _ = respond_to.send(Ok(reply));
                                }),
                            );
                        }
                        Err(e) => guard.finish(
                            Commit::Keep,
                            Box::new(move || {
                                let _ = respond_to.send(Err(FrameworkError::Entity(e)));
                            }),
                        ),
                    }
                });
            }
            Turn::Action { action, respond_to } => {
                let cached = self.store.get(&id).cloned();
                tokio::spawn(async move {
                    let current = match cached {
                        Some(item) => Some(item),
                        None => match T::on_missing(&id, &action, &context).await {
                            Ok(hydrated) => hydrated,
                            Err(e) => {
                                warn!(entity_type, shard, %id, error = %e, "on_missing failed");
                                guard.finish(
                                    Commit::Keep,
                                    Box::new(move || {
                                        let _ = respond_to.send(Err(FrameworkError::Entity(e)));
                                    }),
                                );
                                return;
                            }
                        },
                    };

                    let Some(mut working) = current else {
                        warn!(entity_type, shard, %id, "Not found");
                        let missing = id.to_string();
                        guard.finish(
                            Commit::Keep,
                            Box::new(move || {
                                let _ = respond_to.send(Err(FrameworkError::NotFound(missing)));
                            }),
                        );
                        return;
                    };

                    match working.handle_action(action, &context).await {
                        Ok(result) => {
                            info!(entity_type, shard, %id, "Action ok");
                            guard.finish(
                                Commit::Store(working),
                                Box::new(move || {
                                    let _ = respond_to.send(Ok(result));
                                }),
                            );
                        }
                        Err(e) => {
                            warn!(entity_type, shard, %id, error = %e, "Action failed");
                            let commit = if T::invalidates_state(&e) {
                                Commit::Evict
                            } else {
                                Commit::Keep
                            };
                            guard.finish(
                                commit,
                                Box::new(move || {
                                    let _ = respond_to.send(Err(FrameworkError::Entity(e)));
                                }),
                            );
                        }
                    }
                });
            }
        }
        true
    }
}
