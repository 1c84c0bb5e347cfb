//! Error types for the Ledger actor.

use crate::error::ErrorClass;
use crate::model::AccountKey;
use crate::storage::StorageError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// Amounts are positive magnitudes; the entry kind carries the sign.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Insufficient balance on {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        account: AccountKey,
        balance: Decimal,
        requested: Decimal,
    },

    /// The deadline passed before the entry log answered. The post may or may not
    /// have been written.
    #[error("Ledger request timed out for {0}")]
    Timeout(AccountKey),

    #[error("Ledger storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::InvalidAmount(_) => ErrorClass::Validation,
            LedgerError::InsufficientBalance { .. } => ErrorClass::BusinessRule,
            LedgerError::Storage(e) => e.class(),
            LedgerError::Timeout(_) | LedgerError::ActorCommunicationError(_) => {
                ErrorClass::Infrastructure
            }
        }
    }
}
