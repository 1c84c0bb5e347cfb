//! # Generic Messages
//!
//! This module defines the generic message types used for communication between
//! the `ResourceClient` and `ResourceActor`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

/// Read-only predicate evaluated inside each shard by [`ResourceRequest::Select`].
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Internal message type sent to the actor to request operations.
///
/// # Resource-Oriented Architecture
/// Each actor manages one type of keyed resource (the [`ActorEntity`]). Requests are
/// standardized around a small set of operations:
///
/// - **Create**: Lifecycle start. Uses [`ActorEntity::Create`] with a caller-chosen ID.
/// - **Get (Read)**: Fetches the current state of the resource by ID.
/// - **Action**: Executes a resource-specific [`ActorEntity::Action`] against one ID.
/// - **Select**: Collects every resource on the shard matching a predicate.
///
/// Resources are never deleted through the actor; they are marked (offline, cancelled)
/// by their own actions.
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        id: T::Id,
        params: T::Create,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Select {
        predicate: Predicate<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
}

impl<T: ActorEntity> std::fmt::Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceRequest::Create { id, params, .. } => f
                .debug_struct("Create")
                .field("id", id)
                .field("params", params)
                .finish(),
            ResourceRequest::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            ResourceRequest::Action { id, action, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("action", action)
                .finish(),
            ResourceRequest::Select { .. } => f.debug_struct("Select").finish(),
        }
    }
}
