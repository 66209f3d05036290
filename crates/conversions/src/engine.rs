use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use tillpoint_core::{
    ConversionId, InventoryError, InventoryResult, LocationId, ProductId, Quantity, StoreId, UserId,
};
use tillpoint_ledger::{
    EntryMetadata, EntryReference, LedgerStore, StockCellId, TransactionType,
};

use crate::record::{ConversionRecord, ConversionStore};

/// Input for one conversion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub variant_id: ProductId,
    pub location_id: LocationId,
    pub units_to_create: Quantity,
    /// Parent quantity consumed per variant unit created.
    pub conversion_ratio: Decimal,
    pub performed_by: Option<UserId>,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub conversion_id: ConversionId,
    pub parent_quantity_consumed: Quantity,
    pub variant_units_created: Quantity,
    pub parent_remaining: Quantity,
    pub variant_total: Quantity,
}

/// Atomically moves stock from a parent SKU to a derived variant SKU at a
/// fixed ratio, rejecting overdraft.
///
/// Constructed with injected storage; holds no process-wide state of its own.
pub struct ConversionEngine<L, C> {
    ledger: L,
    conversions: C,
}

impl<L, C> ConversionEngine<L, C>
where
    L: LedgerStore,
    C: ConversionStore,
{
    pub fn new(ledger: L, conversions: C) -> Self {
        Self {
            ledger,
            conversions,
        }
    }

    /// Convert parent stock into variant units at one location.
    ///
    /// The overdraft check runs against the live parent cell inside the
    /// ledger's atomic delta, not against a caller-cached value, so a stale
    /// UI read cannot oversubscribe the parent. On rejection neither cell
    /// changes and the error carries both required and available.
    pub fn convert(&self, request: ConversionRequest) -> InventoryResult<ConversionOutcome> {
        if request.conversion_ratio <= Decimal::ZERO {
            return Err(InventoryError::invalid_ratio(format!(
                "ratio must be positive, got {}",
                request.conversion_ratio
            )));
        }
        if !request.units_to_create.is_positive() {
            return Err(InventoryError::invalid_quantity(format!(
                "units to create must be positive, got {}",
                request.units_to_create
            )));
        }
        if request.product_id == request.variant_id {
            return Err(InventoryError::validation(
                "variant must differ from its parent product",
            ));
        }

        let conversion_id = ConversionId::new();
        let reference = EntryReference::conversion(conversion_id);
        let required = request.units_to_create.scaled_by(request.conversion_ratio);

        let parent_cell = StockCellId::new(request.product_id, request.location_id);
        let variant_cell = StockCellId::new(request.variant_id, request.location_id);

        let out_entry = self.ledger.apply_delta(
            parent_cell,
            -required,
            EntryMetadata::new(request.store_id, TransactionType::ConversionOut)
                .with_reference(reference)
                .with_actor(request.performed_by),
        )?;
        let in_entry = self.ledger.apply_delta(
            variant_cell,
            request.units_to_create,
            EntryMetadata::new(request.store_id, TransactionType::ConversionIn)
                .with_reference(reference)
                .with_actor(request.performed_by),
        )?;

        self.conversions.insert(ConversionRecord {
            conversion_id,
            store_id: request.store_id,
            product_id: request.product_id,
            variant_id: request.variant_id,
            location_id: request.location_id,
            parent_quantity_consumed: required,
            variant_units_created: request.units_to_create,
            conversion_ratio: request.conversion_ratio,
            performed_by: request.performed_by,
            recorded_at: Utc::now(),
        })?;

        info!(
            conversion = %conversion_id,
            parent = %request.product_id,
            variant = %request.variant_id,
            consumed = %required,
            created = %request.units_to_create,
            "parent stock converted to variant"
        );

        Ok(ConversionOutcome {
            conversion_id,
            parent_quantity_consumed: required,
            variant_units_created: request.units_to_create,
            parent_remaining: out_entry.quantity_after,
            variant_total: in_entry.quantity_after,
        })
    }
}
