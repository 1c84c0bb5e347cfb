use crate::model::{Caller, Trigger, TransitionPayload};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Validates and applies `trigger` against freshly loaded state.
    Transition {
        trigger: Trigger,
        caller: Caller,
        payload: TransitionPayload,
        deadline: Instant,
    },
}
