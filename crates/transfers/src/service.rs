use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tillpoint_core::{
    InventoryError, InventoryResult, LocationId, ProductId, Quantity, StoreId, TokenCode,
    TransferId, TransferNumber, UserId,
};
use tillpoint_ledger::{
    EntryMetadata, EntryReference, LedgerStore, StockCellId, TransactionType,
};

use crate::store::{TokenStore, TransferStore};
use crate::token::TokenStatus;
use crate::transfer::{ItemCondition, ItemTracking, Transfer, TransferItem, TransferStatus};

/// Input line for a transfer being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransferItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub tracking: ItemTracking,
}

/// Input for creating a transfer (created as already-shipped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransfer {
    pub store_id: StoreId,
    pub source_location_id: LocationId,
    pub destination_location_id: LocationId,
    pub items: Vec<NewTransferItem>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub created_by: Option<UserId>,
}

/// A source-side deduction that had to be floored at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptShortfall {
    pub product_id: ProductId,
    pub requested: Quantity,
    pub deducted: Quantity,
}

/// Outcome of a completed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    pub items_received: usize,
    /// Source cells that held less than the shipped quantity. The deduction
    /// was clamped rather than failed, which under-reports shrinkage; the
    /// shortfall is reported here and logged so it is not silently absorbed.
    pub shortfalls: Vec<ReceiptShortfall>,
}

/// Orchestrates multi-item stock movement between two locations through the
/// transfer lifecycle, writing through the ledger at receipt time only.
///
/// Constructed with injected storage; holds no process-wide state of its own.
pub struct TransferService<L, T, K> {
    ledger: L,
    transfers: T,
    tokens: K,
}

impl<L, T, K> TransferService<L, T, K>
where
    L: LedgerStore,
    T: TransferStore,
    K: TokenStore,
{
    pub fn new(ledger: L, transfers: T, tokens: K) -> Self {
        Self {
            ledger,
            transfers,
            tokens,
        }
    }

    /// Create a transfer in `in_transit`.
    ///
    /// Persists the header and items and binds any tokens, but never touches
    /// a stock cell: physical custody and ledger are reconciled at receipt,
    /// not at shipment.
    pub fn create_transfer(&self, new: NewTransfer) -> InventoryResult<Transfer> {
        if new.items.is_empty() {
            return Err(InventoryError::validation(
                "transfer must contain at least one item",
            ));
        }
        if new.source_location_id == new.destination_location_id {
            return Err(InventoryError::validation(
                "source and destination locations must differ",
            ));
        }
        for item in &new.items {
            if !item.quantity.is_positive() {
                return Err(InventoryError::invalid_quantity(format!(
                    "transfer quantity must be positive: {}",
                    item.quantity
                )));
            }
        }

        let id = TransferId::new();

        // Validate every token before binding any, so a bad code cannot
        // leave earlier tokens half-bound.
        let mut seen_codes = HashSet::new();
        let mut to_bind = Vec::new();
        for item in &new.items {
            if let ItemTracking::Token(code) = &item.tracking {
                if !seen_codes.insert(code.clone()) {
                    return Err(InventoryError::validation(format!(
                        "token '{code}' appears on more than one item"
                    )));
                }
                let token = self
                    .tokens
                    .get(code)?
                    .ok_or_else(|| InventoryError::not_found(format!("token '{code}'")))?;
                if token.store_id != new.store_id || !token.is_bindable() {
                    return Err(InventoryError::TokenUnavailable(code.as_str().to_string()));
                }
                to_bind.push(token);
            }
        }
        for mut token in to_bind {
            token.status = TokenStatus::InTransit;
            token.current_transfer_id = Some(id);
            self.tokens.upsert(token)?;
        }

        let now = Utc::now();
        let transfer = Transfer {
            id,
            number: TransferNumber::generate(id),
            store_id: new.store_id,
            source_location_id: new.source_location_id,
            destination_location_id: new.destination_location_id,
            status: TransferStatus::InTransit,
            items: new
                .items
                .into_iter()
                .map(|item| TransferItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    tracking: item.tracking,
                    received_quantity: None,
                    condition: None,
                })
                .collect(),
            notes: new.notes,
            tracking_number: new.tracking_number,
            created_by: new.created_by,
            received_by: None,
            cancelled_by: None,
            created_at: now,
            shipped_at: Some(now),
            received_at: None,
            cancelled_at: None,
        };
        self.transfers.insert(transfer.clone())?;

        info!(
            transfer = %transfer.id,
            number = %transfer.number,
            items = transfer.items.len(),
            "transfer created in transit"
        );
        Ok(transfer)
    }

    /// Receive a transfer at its destination, moving stock (or tokens) and
    /// completing the lifecycle.
    ///
    /// `conditions` is aligned with the transfer's item order; missing
    /// entries mean no condition was recorded. Reprocessing an already
    /// completed transfer returns `AlreadyReceived` and moves nothing. A
    /// receipt interrupted mid-way resumes on retry: items already marked
    /// received are skipped, never double-credited.
    pub fn receive_transfer(
        &self,
        transfer_id: TransferId,
        destination_location_id: LocationId,
        actor: Option<UserId>,
        conditions: &[Option<ItemCondition>],
    ) -> InventoryResult<TransferReceipt> {
        let mut transfer = self
            .transfers
            .get(transfer_id)?
            .ok_or_else(|| InventoryError::not_found(format!("transfer {transfer_id}")))?;

        match transfer.status {
            TransferStatus::InTransit => {}
            TransferStatus::Completed => {
                return Err(InventoryError::AlreadyReceived(transfer_id));
            }
            other => return Err(InventoryError::invalid_state("receive", other.as_str())),
        }
        if destination_location_id != transfer.destination_location_id {
            return Err(InventoryError::validation(format!(
                "transfer {} is destined for location {}, not {}",
                transfer.id, transfer.destination_location_id, destination_location_id
            )));
        }

        let reference = EntryReference::transfer(transfer.id);
        let mut shortfalls = Vec::new();
        let mut items_received = 0usize;

        for idx in 0..transfer.items.len() {
            if transfer.items[idx].is_received() {
                continue;
            }

            let item = transfer.items[idx].clone();
            match &item.tracking {
                ItemTracking::Token(code) => {
                    self.settle_token(code, destination_location_id, item.product_id)?;
                }
                ItemTracking::Ledger => {
                    if let Some(shortfall) = self.move_stock(&transfer, &item, reference, actor)? {
                        shortfalls.push(shortfall);
                    }
                }
            }

            let slot = &mut transfer.items[idx];
            slot.received_quantity = Some(item.quantity);
            slot.condition = conditions.get(idx).copied().flatten();
            items_received += 1;
            // Persist per-item progress so a retry after a mid-receipt
            // failure resumes instead of repeating applied items.
            self.transfers.update(&transfer)?;
        }

        transfer.status = TransferStatus::Completed;
        transfer.received_at = Some(Utc::now());
        transfer.received_by = actor;
        self.transfers.update(&transfer)?;

        info!(
            transfer = %transfer.id,
            items = items_received,
            shortfalls = shortfalls.len(),
            "transfer received"
        );
        Ok(TransferReceipt {
            transfer_id: transfer.id,
            items_received,
            shortfalls,
        })
    }

    /// Cancel an in-transit transfer.
    ///
    /// Bound tokens return to `available` at their pre-transfer location. No
    /// ledger entries are written; no stock ever moved at shipment time.
    pub fn cancel_transfer(
        &self,
        transfer_id: TransferId,
        actor: Option<UserId>,
    ) -> InventoryResult<Transfer> {
        let mut transfer = self
            .transfers
            .get(transfer_id)?
            .ok_or_else(|| InventoryError::not_found(format!("transfer {transfer_id}")))?;

        if transfer.status != TransferStatus::InTransit {
            return Err(InventoryError::invalid_state(
                "cancel",
                transfer.status.as_str(),
            ));
        }

        for item in &transfer.items {
            if let Some(code) = item.bound_token() {
                let mut token = self
                    .tokens
                    .get(code)?
                    .ok_or_else(|| InventoryError::not_found(format!("token '{code}'")))?;
                if token.current_transfer_id == Some(transfer.id) {
                    token.status = TokenStatus::Available;
                    token.current_transfer_id = None;
                    self.tokens.upsert(token)?;
                }
            }
        }

        transfer.status = TransferStatus::Cancelled;
        transfer.cancelled_at = Some(Utc::now());
        transfer.cancelled_by = actor;
        self.transfers.update(&transfer)?;

        info!(transfer = %transfer.id, "transfer cancelled");
        Ok(transfer)
    }

    /// Resolve a scanned physical-token code to its governing transfer.
    ///
    /// Falls back to whitespace-stripped, case-folded matching when the
    /// exact code is unknown. Records the scan on the token either way.
    pub fn lookup_by_token(
        &self,
        code: &TokenCode,
        store_id: StoreId,
    ) -> InventoryResult<Option<Transfer>> {
        let token = match self.tokens.get(code)? {
            Some(token) => Some(token),
            None => self.tokens.find_normalized(code)?,
        };
        let Some(mut token) = token else {
            return Ok(None);
        };
        if token.store_id != store_id {
            return Ok(None);
        }

        token.record_scan(Utc::now());
        self.tokens.upsert(token.clone())?;

        match token.current_transfer_id {
            Some(transfer_id) => self.transfers.get(transfer_id),
            None => Ok(None),
        }
    }

    pub fn transfer(&self, id: TransferId) -> InventoryResult<Option<Transfer>> {
        self.transfers.get(id)
    }

    pub fn transfers_for_store(&self, store_id: StoreId) -> InventoryResult<Vec<Transfer>> {
        self.transfers.list_for_store(store_id)
    }

    /// Move one ledger-tracked item's stock: deduct at source (floored at
    /// zero), credit the full quantity at destination, both entries sharing
    /// the transfer reference.
    fn move_stock(
        &self,
        transfer: &Transfer,
        item: &TransferItem,
        reference: EntryReference,
        actor: Option<UserId>,
    ) -> InventoryResult<Option<ReceiptShortfall>> {
        let source = StockCellId::new(item.product_id, transfer.source_location_id);
        let destination = StockCellId::new(item.product_id, transfer.destination_location_id);

        // The deduction is retried with the store-reported availability so
        // the clamp stays correct under concurrent writers of the source
        // cell.
        let mut deduct = item.quantity;
        while !deduct.is_zero() {
            let meta = EntryMetadata::new(transfer.store_id, TransactionType::TransferOut)
                .with_reference(reference)
                .with_actor(actor);
            match self.ledger.apply_delta(source, -deduct, meta) {
                Ok(_) => break,
                Err(InventoryError::InsufficientStock { available, .. }) => deduct = available,
                Err(e) => return Err(e),
            }
        }

        let meta = EntryMetadata::new(transfer.store_id, TransactionType::TransferIn)
            .with_reference(reference)
            .with_actor(actor);
        self.ledger.apply_delta(destination, item.quantity, meta)?;

        if deduct < item.quantity {
            warn!(
                transfer = %transfer.id,
                product = %item.product_id,
                requested = %item.quantity,
                deducted = %deduct,
                "source stock short at receipt; deduction floored at zero"
            );
            return Ok(Some(ReceiptShortfall {
                product_id: item.product_id,
                requested: item.quantity,
                deducted: deduct,
            }));
        }
        Ok(None)
    }

    /// Settle a token-bound item: the token becomes available at the
    /// destination and the numeric ledger is left untouched; the token is
    /// the inventory record for that unit.
    fn settle_token(
        &self,
        code: &TokenCode,
        destination: LocationId,
        product_id: ProductId,
    ) -> InventoryResult<()> {
        let mut token = self
            .tokens
            .get(code)?
            .ok_or_else(|| InventoryError::not_found(format!("token '{code}'")))?;
        token.status = TokenStatus::Available;
        token.current_transfer_id = None;
        token.current_location_id = destination;
        if token.product_id.is_none() {
            token.product_id = Some(product_id);
        }
        self.tokens.upsert(token)
    }
}
