use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{Entity, LocationId, ProductId, Quantity, StoreId};

/// Key of the atomic unit of inventory truth: one product at one location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockCellId {
    pub product_id: ProductId,
    pub location_id: LocationId,
}

impl StockCellId {
    pub fn new(product_id: ProductId, location_id: LocationId) -> Self {
        Self {
            product_id,
            location_id,
        }
    }
}

/// Current quantity of one product at one location.
///
/// Cells are created lazily on first stock arrival and never deleted, only
/// zeroed. `quantity` stays non-negative except under the explicit
/// negative-on-sale policy (see [`crate::LedgerConfig`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCell {
    pub id: StockCellId,
    pub store_id: StoreId,
    pub quantity: Quantity,
    pub updated_at: DateTime<Utc>,
}

impl Entity for StockCell {
    type Id = StockCellId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
