use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use tillpoint_core::{EntryId, InventoryError, InventoryResult, Quantity};

use crate::cell::{StockCell, StockCellId};
use crate::entry::{EntryMetadata, LedgerEntry, TransactionType};
use crate::store::{LedgerConfig, LedgerStore};

#[derive(Debug, Default)]
struct Inner {
    cells: HashMap<StockCellId, StockCell>,
    /// Global append-only journal. Per-cell order falls out of append order.
    journal: Vec<LedgerEntry>,
}

/// In-memory ledger store.
///
/// Intended for tests/dev. One lock guards cells and journal together, so
/// every mutation is a single atomic read-modify-write that commits the new
/// cell value and its entry as one unit.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    config: LedgerConfig,
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            inner: RwLock::default(),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn write_lock(&self) -> InventoryResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| InventoryError::storage("ledger lock poisoned"))
    }

    fn negative_allowed(&self, meta: &EntryMetadata) -> bool {
        meta.transaction_type == TransactionType::Sale && self.config.allow_negative_on_sale
    }

    /// Commit a computed change: upsert the cell and append its entry.
    fn commit(
        inner: &mut Inner,
        cell_id: StockCellId,
        before: Quantity,
        change: Quantity,
        meta: EntryMetadata,
    ) -> LedgerEntry {
        let now = Utc::now();
        let after = before + change;

        inner
            .cells
            .entry(cell_id)
            .and_modify(|cell| {
                cell.quantity = after;
                cell.updated_at = now;
            })
            .or_insert_with(|| StockCell {
                id: cell_id,
                store_id: meta.store_id,
                quantity: after,
                updated_at: now,
            });

        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            store_id: meta.store_id,
            product_id: cell_id.product_id,
            location_id: cell_id.location_id,
            transaction_type: meta.transaction_type,
            quantity_before: before,
            quantity_change: change,
            quantity_after: after,
            reason: meta.reason,
            reference: meta.reference,
            performed_by: meta.performed_by,
            recorded_at: now,
        };
        inner.journal.push(entry.clone());
        entry
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn apply_delta(
        &self,
        cell_id: StockCellId,
        change: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry> {
        let mut inner = self.write_lock()?;

        let current = inner
            .cells
            .get(&cell_id)
            .map(|c| c.quantity)
            .unwrap_or(Quantity::ZERO);

        // Only deductions can breach the invariant; a positive delta into a
        // cell already negative under the sale policy moves it toward zero.
        let next = current + change;
        if change.is_negative() && next.is_negative() && !self.negative_allowed(&meta) {
            return Err(InventoryError::insufficient_stock(-change, current));
        }

        Ok(Self::commit(&mut inner, cell_id, current, change, meta))
    }

    fn set_absolute(
        &self,
        cell_id: StockCellId,
        target: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry> {
        if target.is_negative() {
            return Err(InventoryError::invalid_quantity(format!(
                "absolute target cannot be negative: {target}"
            )));
        }

        let mut inner = self.write_lock()?;

        let current = inner
            .cells
            .get(&cell_id)
            .map(|c| c.quantity)
            .unwrap_or(Quantity::ZERO);

        Ok(Self::commit(&mut inner, cell_id, current, target - current, meta))
    }

    fn cell(&self, cell_id: &StockCellId) -> InventoryResult<Option<StockCell>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| InventoryError::storage("ledger lock poisoned"))?;
        Ok(inner.cells.get(cell_id).cloned())
    }

    fn entries_for_cell(&self, cell_id: &StockCellId) -> InventoryResult<Vec<LedgerEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| InventoryError::storage("ledger lock poisoned"))?;
        Ok(inner
            .journal
            .iter()
            .filter(|e| e.product_id == cell_id.product_id && e.location_id == cell_id.location_id)
            .cloned()
            .collect())
    }

    fn entries_for_reference(&self, reference_id: Uuid) -> InventoryResult<Vec<LedgerEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| InventoryError::storage("ledger lock poisoned"))?;
        Ok(inner
            .journal
            .iter()
            .filter(|e| e.reference.is_some_and(|r| r.id == reference_id))
            .cloned()
            .collect())
    }
}
