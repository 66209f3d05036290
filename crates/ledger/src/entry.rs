use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tillpoint_core::{EntryId, LocationId, ProductId, Quantity, StoreId, UserId};

/// Kind of quantity change an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Adjustment,
    TransferOut,
    TransferIn,
    ConversionOut,
    ConversionIn,
    Received,
    Return,
}

/// What kind of operation an entry's reference id points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Adjustment,
    Transfer,
    Conversion,
}

/// Link from a ledger entry back to the operation that produced it.
///
/// Both halves of a transfer or conversion carry the same reference, so the
/// full movement is reconstructable from the ledger alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReference {
    pub kind: ReferenceKind,
    pub id: Uuid,
}

impl EntryReference {
    pub fn adjustment(id: impl Into<Uuid>) -> Self {
        Self {
            kind: ReferenceKind::Adjustment,
            id: id.into(),
        }
    }

    pub fn transfer(id: impl Into<Uuid>) -> Self {
        Self {
            kind: ReferenceKind::Transfer,
            id: id.into(),
        }
    }

    pub fn conversion(id: impl Into<Uuid>) -> Self {
        Self {
            kind: ReferenceKind::Conversion,
            id: id.into(),
        }
    }
}

/// Caller-supplied context persisted alongside a quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub store_id: StoreId,
    pub transaction_type: TransactionType,
    pub reason: Option<String>,
    pub reference: Option<EntryReference>,
    pub performed_by: Option<UserId>,
}

impl EntryMetadata {
    pub fn new(store_id: StoreId, transaction_type: TransactionType) -> Self {
        Self {
            store_id,
            transaction_type,
            reason: None,
            reference: None,
            performed_by: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_reference(mut self, reference: EntryReference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_actor(mut self, actor: Option<UserId>) -> Self {
        self.performed_by = actor;
        self
    }
}

/// Immutable record appended on every quantity mutation.
///
/// Ordered by append position per cell, entries form a gapless audit trail:
/// each entry's `quantity_before` equals the previous entry's
/// `quantity_after`, and summing `quantity_change` from zero reproduces the
/// cell's current quantity exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub transaction_type: TransactionType,
    pub quantity_before: Quantity,
    pub quantity_change: Quantity,
    pub quantity_after: Quantity,
    pub reason: Option<String>,
    pub reference: Option<EntryReference>,
    pub performed_by: Option<UserId>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Before/after reconciliation invariant.
    pub fn reconciles(&self) -> bool {
        self.quantity_after == self.quantity_before + self.quantity_change
    }
}
