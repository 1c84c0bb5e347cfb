//! # Framework Errors
//!
//! This module defines the common error type used throughout the actor framework.
//! Entity errors travel unboxed inside [`FrameworkError::Entity`], so clients can
//! match on the resource's own error enum.

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameworkError<E: std::error::Error + Send + Sync + 'static> {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("Entity error: {0}")]
    Entity(#[source] E),
}

impl<E: std::error::Error + Send + Sync + 'static> FrameworkError<E> {
    /// Whether the request may not have reached the actor, or its answer was lost.
    pub fn is_transport(&self) -> bool {
        matches!(self, FrameworkError::ActorClosed | FrameworkError::ActorDropped)
    }
}
