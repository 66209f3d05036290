use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{
    Entity, LocationId, ProductId, Quantity, StoreId, TokenCode, TransferId, TransferNumber, UserId,
};

/// Transfer lifecycle.
///
/// `draft → in_transit → completed`, with `in_transit → cancelled` as the
/// only other transition. Transfers are created as already-shipped in this
/// domain, so `draft` is never persisted on the common path; the variant
/// exists for systems that stage transfers before shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Draft,
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }

    /// Status is monotonic: no transition ever leaves a terminal state.
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::Draft, TransferStatus::InTransit)
                | (TransferStatus::InTransit, TransferStatus::Completed)
                | (TransferStatus::InTransit, TransferStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Draft => "draft",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

/// Condition of an item as observed at receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    Good,
    Damaged,
    Missing,
}

/// How an item's movement is accounted for.
///
/// A tagged variant rather than a nullable token field, so the two paths are
/// exhaustively handled: `Ledger` items move numeric stock at receipt;
/// `Token` items are accounted for solely by the bound token's location and
/// status, and per-unit ledger mutation is suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTracking {
    Ledger,
    Token(TokenCode),
}

/// One product line within a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub tracking: ItemTracking,
    /// Set when the item has been processed at receipt; doubles as the
    /// per-item completion marker that lets a resumed receipt skip work
    /// already applied.
    pub received_quantity: Option<Quantity>,
    pub condition: Option<ItemCondition>,
}

impl TransferItem {
    pub fn is_received(&self) -> bool {
        self.received_quantity.is_some()
    }

    pub fn bound_token(&self) -> Option<&TokenCode> {
        match &self.tracking {
            ItemTracking::Token(code) => Some(code),
            ItemTracking::Ledger => None,
        }
    }
}

/// A grouped, stateful movement of products between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub number: TransferNumber,
    pub store_id: StoreId,
    pub source_location_id: LocationId,
    pub destination_location_id: LocationId,
    pub status: TransferStatus,
    pub items: Vec<TransferItem>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub created_by: Option<UserId>,
    pub received_by: Option<UserId>,
    pub cancelled_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
