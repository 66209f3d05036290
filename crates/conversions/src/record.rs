use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tillpoint_core::{
    ConversionId, InventoryError, InventoryResult, LocationId, ProductId, Quantity, StoreId, UserId,
};

/// Immutable record of one parent→variant stock conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub conversion_id: ConversionId,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub variant_id: ProductId,
    pub location_id: LocationId,
    pub parent_quantity_consumed: Quantity,
    pub variant_units_created: Quantity,
    pub conversion_ratio: Decimal,
    pub performed_by: Option<UserId>,
    pub recorded_at: DateTime<Utc>,
}

/// Durable conversion records.
pub trait ConversionStore: Send + Sync {
    fn insert(&self, record: ConversionRecord) -> InventoryResult<()>;
    fn get(&self, id: ConversionId) -> InventoryResult<Option<ConversionRecord>>;
    fn list_for_product(&self, product_id: ProductId) -> InventoryResult<Vec<ConversionRecord>>;
}

impl<S> ConversionStore for Arc<S>
where
    S: ConversionStore + ?Sized,
{
    fn insert(&self, record: ConversionRecord) -> InventoryResult<()> {
        (**self).insert(record)
    }

    fn get(&self, id: ConversionId) -> InventoryResult<Option<ConversionRecord>> {
        (**self).get(id)
    }

    fn list_for_product(&self, product_id: ProductId) -> InventoryResult<Vec<ConversionRecord>> {
        (**self).list_for_product(product_id)
    }
}

/// In-memory conversion record store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryConversionStore {
    records: RwLock<HashMap<ConversionId, ConversionRecord>>,
}

impl InMemoryConversionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ConversionStore for InMemoryConversionStore {
    fn insert(&self, record: ConversionRecord) -> InventoryResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| InventoryError::storage("conversion lock poisoned"))?;
        if records.contains_key(&record.conversion_id) {
            return Err(InventoryError::storage(format!(
                "conversion {} already exists",
                record.conversion_id
            )));
        }
        records.insert(record.conversion_id, record);
        Ok(())
    }

    fn get(&self, id: ConversionId) -> InventoryResult<Option<ConversionRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| InventoryError::storage("conversion lock poisoned"))?;
        Ok(records.get(&id).cloned())
    }

    fn list_for_product(&self, product_id: ProductId) -> InventoryResult<Vec<ConversionRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| InventoryError::storage("conversion lock poisoned"))?;
        let mut found: Vec<ConversionRecord> = records
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.recorded_at);
        Ok(found)
    }
}
