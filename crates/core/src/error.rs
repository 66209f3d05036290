//! Domain error model.

use thiserror::Error;

use crate::id::TransferId;
use crate::quantity::Quantity;

/// Result type used across the domain layer.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, state-machine violations) plus the single `Storage` variant
/// that carries an infrastructure commit failure up to the caller unchanged.
///
/// Rejections that concern quantities always carry the concrete numbers
/// (required/available) so the caller can present an actionable message
/// without a follow-up query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// A quantity-changing operation would breach the non-negativity invariant.
    #[error("insufficient stock: required {required}, available {available}")]
    InsufficientStock {
        required: Quantity,
        available: Quantity,
    },

    /// A quantity was malformed, or non-positive where positive is required.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A conversion ratio was zero or negative.
    #[error("invalid conversion ratio: {0}")]
    InvalidConversionRatio(String),

    /// A receive was attempted on a transfer that already completed.
    #[error("transfer {0} has already been received")]
    AlreadyReceived(TransferId),

    /// A state-machine transition was attempted from the wrong state.
    #[error("cannot {attempted} a transfer in state '{actual}'")]
    InvalidTransferState { attempted: String, actual: String },

    /// A physical token exists but cannot be bound (wrong status or already
    /// bound to a concurrent transfer).
    #[error("physical token '{0}' is not available for binding")]
    TokenUnavailable(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested cell/transfer/token/record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying atomic write could not be committed. Callers retry with
    /// the same idempotency key, never drop silently.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl InventoryError {
    pub fn insufficient_stock(required: Quantity, available: Quantity) -> Self {
        Self::InsufficientStock {
            required,
            available,
        }
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn invalid_ratio(msg: impl Into<String>) -> Self {
        Self::InvalidConversionRatio(msg.into())
    }

    pub fn invalid_state(attempted: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidTransferState {
            attempted: attempted.into(),
            actual: actual.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
