use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tillpoint_core::{InventoryResult, Quantity};

use crate::cell::{StockCell, StockCellId};
use crate::entry::{EntryMetadata, LedgerEntry};

/// Ledger-wide policy knobs.
///
/// `allow_negative_on_sale` relaxes the non-negativity invariant for
/// sale-context deltas only: a checkout caller may decide that overselling a
/// miscounted shelf beats blocking the till. Defaults to off; every other
/// transaction type always rejects overdraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub allow_negative_on_sale: bool,
}

/// Durable record of every inventory quantity plus its append-only
/// transaction log.
///
/// Both mutators execute as a single atomic unit against the backing store:
/// read the current quantity, compute the new one, and commit the cell and
/// its [`LedgerEntry`] together or not at all. A cell's read-modify-write
/// sequence is atomic relative to all other writers of that same cell; no
/// two cells are ever locked together.
pub trait LedgerStore: Send + Sync {
    /// Apply a signed quantity change to one cell.
    ///
    /// Rejects `InsufficientStock` (carrying required/available) when the
    /// result would be negative, unless the entry is sale-context and the
    /// store's [`LedgerConfig`] allows negative-on-sale.
    fn apply_delta(
        &self,
        cell_id: StockCellId,
        change: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry>;

    /// Set one cell to an absolute target value.
    ///
    /// The audit is authoritative for the end state regardless of what
    /// concurrent sales did since the caller last read the cell; the delta
    /// is computed here, against the live value. Rejects negative targets.
    fn set_absolute(
        &self,
        cell_id: StockCellId,
        target: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry>;

    /// Read one cell. `None` means no stock has ever arrived there.
    fn cell(&self, cell_id: &StockCellId) -> InventoryResult<Option<StockCell>>;

    /// Audit stream for one cell, in append order.
    fn entries_for_cell(&self, cell_id: &StockCellId) -> InventoryResult<Vec<LedgerEntry>>;

    /// All entries written under one operation reference (both halves of a
    /// transfer or conversion), in append order.
    fn entries_for_reference(&self, reference_id: Uuid) -> InventoryResult<Vec<LedgerEntry>>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn apply_delta(
        &self,
        cell_id: StockCellId,
        change: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry> {
        (**self).apply_delta(cell_id, change, meta)
    }

    fn set_absolute(
        &self,
        cell_id: StockCellId,
        target: Quantity,
        meta: EntryMetadata,
    ) -> InventoryResult<LedgerEntry> {
        (**self).set_absolute(cell_id, target, meta)
    }

    fn cell(&self, cell_id: &StockCellId) -> InventoryResult<Option<StockCell>> {
        (**self).cell(cell_id)
    }

    fn entries_for_cell(&self, cell_id: &StockCellId) -> InventoryResult<Vec<LedgerEntry>> {
        (**self).entries_for_cell(cell_id)
    }

    fn entries_for_reference(&self, reference_id: Uuid) -> InventoryResult<Vec<LedgerEntry>> {
        (**self).entries_for_reference(reference_id)
    }
}
