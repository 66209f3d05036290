//! Stock adjustments: single-cell quantity changes with idempotent retries.
//!
//! The [`AdjustmentEngine`] applies relative deltas or absolute targets to
//! one stock cell through the ledger, deduplicating retried requests via a
//! durable idempotency record keyed by the caller's idempotency key.

pub mod engine;
pub mod idempotency;
pub mod request;

pub use engine::AdjustmentEngine;
pub use idempotency::{
    ClaimOutcome, IdempotencyRecord, IdempotencyStatus, IdempotencyStore,
    InMemoryIdempotencyStore,
};
pub use request::{AdjustmentMode, AdjustmentRequest, AdjustmentResult, AdjustmentType};
