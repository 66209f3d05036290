use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{Entity, LocationId, ProductId, StoreId, TokenCode, TransferId};

/// Lifecycle of a physical tag.
///
/// `in_transit` holds exactly while the token is bound to a non-terminal
/// transfer; the sold/split/consumed states are terminal for the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Available,
    InTransit,
    Sold,
    Split,
    Consumed,
}

impl TokenStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TokenStatus::Sold | TokenStatus::Split | TokenStatus::Consumed
        )
    }
}

/// A scannable code representing one physical unit.
///
/// The token's status and location are the sole source of truth for the unit
/// it represents; while bound to a transfer, per-unit ledger mutation for
/// that item is suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalToken {
    pub code: TokenCode,
    pub store_id: StoreId,
    pub product_id: Option<ProductId>,
    pub current_location_id: LocationId,
    pub status: TokenStatus,
    pub current_transfer_id: Option<TransferId>,
    pub total_scans: u64,
    pub last_scanned_at: Option<DateTime<Utc>>,
}

impl PhysicalToken {
    /// A freshly printed tag sitting at a location, not yet bound to anything.
    pub fn available(code: TokenCode, store_id: StoreId, location_id: LocationId) -> Self {
        Self {
            code,
            store_id,
            product_id: None,
            current_location_id: location_id,
            status: TokenStatus::Available,
            current_transfer_id: None,
            total_scans: 0,
            last_scanned_at: None,
        }
    }

    /// A token can join a transfer only while available and unbound.
    pub fn is_bindable(&self) -> bool {
        self.status == TokenStatus::Available && self.current_transfer_id.is_none()
    }

    pub fn record_scan(&mut self, at: DateTime<Utc>) {
        self.total_scans += 1;
        self.last_scanned_at = Some(at);
    }
}

impl Entity for PhysicalToken {
    type Id = TokenCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }
}
