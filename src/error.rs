//! Cross-component error classification.
//!
//! Every component error enum exposes `class()`, so callers can decide between
//! rejecting, retrying with fresh state, or re-invoking after an unknown outcome
//! without matching each variant.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed input. Rejected before any state change.
    Validation,
    /// Well-formed but not allowed now. No partial state change.
    BusinessRule,
    /// Lost a race against another writer. Safe to retry with fresh state.
    Concurrency,
    /// The outcome is unknown. Recover by re-invoking the idempotent operation.
    Infrastructure,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Concurrency | ErrorClass::Infrastructure)
    }
}

