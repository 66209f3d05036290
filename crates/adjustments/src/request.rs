use serde::{Deserialize, Serialize};

use tillpoint_core::{
    AdjustmentId, IdempotencyKey, LocationId, ProductId, Quantity, StoreId, UserId,
};
use tillpoint_ledger::TransactionType;

/// Why stock is being adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    CountCorrection,
    Damage,
    Shrinkage,
    Theft,
    Expired,
    Received,
    Return,
    Other,
}

impl AdjustmentType {
    /// Ledger transaction type this adjustment is recorded under.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            AdjustmentType::Received => TransactionType::Received,
            AdjustmentType::Return => TransactionType::Return,
            _ => TransactionType::Adjustment,
        }
    }
}

/// How the new quantity is expressed.
///
/// `Absolute` exists to defeat a stale-read race: between the time a UI reads
/// "current quantity" and submits an audit, concurrent sales may have moved
/// it. Absolute mode makes the audit authoritative for the end state instead
/// of applying a delta computed against stale data. Never collapse it into a
/// client-computed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMode {
    Relative { delta: Quantity },
    Absolute { target: Quantity },
}

/// Transient input consumed once by the engine.
///
/// Only the idempotency key outlives the request, as a durable record that
/// detects replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub adjustment_type: AdjustmentType,
    pub mode: AdjustmentMode,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub idempotency_key: IdempotencyKey,
    pub performed_by: Option<UserId>,
}

/// Outcome of an applied (or replayed) adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub adjustment_id: AdjustmentId,
    pub quantity_before: Quantity,
    pub quantity_after: Quantity,
    /// The cell's resulting total, restated for the caller contract.
    pub cell_total: Quantity,
}
