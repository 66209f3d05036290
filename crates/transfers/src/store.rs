use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tillpoint_core::{InventoryError, InventoryResult, StoreId, TokenCode, TransferId};

use crate::token::PhysicalToken;
use crate::transfer::Transfer;

/// Durable transfer records.
pub trait TransferStore: Send + Sync {
    /// Persist a new transfer. Rejects duplicate ids.
    fn insert(&self, transfer: Transfer) -> InventoryResult<()>;

    fn get(&self, id: TransferId) -> InventoryResult<Option<Transfer>>;

    /// Persist the current state of an existing transfer (item progress and
    /// status updates during receipt).
    fn update(&self, transfer: &Transfer) -> InventoryResult<()>;

    fn list_for_store(&self, store_id: StoreId) -> InventoryResult<Vec<Transfer>>;
}

impl<S> TransferStore for Arc<S>
where
    S: TransferStore + ?Sized,
{
    fn insert(&self, transfer: Transfer) -> InventoryResult<()> {
        (**self).insert(transfer)
    }

    fn get(&self, id: TransferId) -> InventoryResult<Option<Transfer>> {
        (**self).get(id)
    }

    fn update(&self, transfer: &Transfer) -> InventoryResult<()> {
        (**self).update(transfer)
    }

    fn list_for_store(&self, store_id: StoreId) -> InventoryResult<Vec<Transfer>> {
        (**self).list_for_store(store_id)
    }
}

/// Durable physical-token records, keyed by code.
pub trait TokenStore: Send + Sync {
    fn upsert(&self, token: PhysicalToken) -> InventoryResult<()>;

    /// Exact-code lookup.
    fn get(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>>;

    /// Fallback lookup matching on the whitespace-stripped, case-folded
    /// form, for hand-typed or badly scanned codes.
    fn find_normalized(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>>;
}

impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    fn upsert(&self, token: PhysicalToken) -> InventoryResult<()> {
        (**self).upsert(token)
    }

    fn get(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>> {
        (**self).get(code)
    }

    fn find_normalized(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>> {
        (**self).find_normalized(code)
    }
}

/// In-memory transfer store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTransferStore {
    transfers: RwLock<HashMap<TransferId, Transfer>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl TransferStore for InMemoryTransferStore {
    fn insert(&self, transfer: Transfer) -> InventoryResult<()> {
        let mut transfers = self
            .transfers
            .write()
            .map_err(|_| InventoryError::storage("transfer lock poisoned"))?;
        if transfers.contains_key(&transfer.id) {
            return Err(InventoryError::storage(format!(
                "transfer {} already exists",
                transfer.id
            )));
        }
        transfers.insert(transfer.id, transfer);
        Ok(())
    }

    fn get(&self, id: TransferId) -> InventoryResult<Option<Transfer>> {
        let transfers = self
            .transfers
            .read()
            .map_err(|_| InventoryError::storage("transfer lock poisoned"))?;
        Ok(transfers.get(&id).cloned())
    }

    fn update(&self, transfer: &Transfer) -> InventoryResult<()> {
        let mut transfers = self
            .transfers
            .write()
            .map_err(|_| InventoryError::storage("transfer lock poisoned"))?;
        if !transfers.contains_key(&transfer.id) {
            return Err(InventoryError::not_found(format!(
                "transfer {}",
                transfer.id
            )));
        }
        transfers.insert(transfer.id, transfer.clone());
        Ok(())
    }

    fn list_for_store(&self, store_id: StoreId) -> InventoryResult<Vec<Transfer>> {
        let transfers = self
            .transfers
            .read()
            .map_err(|_| InventoryError::storage("transfer lock poisoned"))?;
        let mut found: Vec<Transfer> = transfers
            .values()
            .filter(|t| t.store_id == store_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }
}

/// In-memory token store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<TokenCode, PhysicalToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl TokenStore for InMemoryTokenStore {
    fn upsert(&self, token: PhysicalToken) -> InventoryResult<()> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| InventoryError::storage("token lock poisoned"))?;
        tokens.insert(token.code.clone(), token);
        Ok(())
    }

    fn get(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| InventoryError::storage("token lock poisoned"))?;
        Ok(tokens.get(code).cloned())
    }

    fn find_normalized(&self, code: &TokenCode) -> InventoryResult<Option<PhysicalToken>> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| InventoryError::storage("token lock poisoned"))?;
        let wanted = code.normalized();
        Ok(tokens
            .values()
            .find(|t| t.code.normalized() == wanted)
            .cloned())
    }
}
