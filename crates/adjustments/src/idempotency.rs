use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tillpoint_core::{IdempotencyKey, InventoryError, InventoryResult};

/// Lifecycle of a durable idempotency record.
///
/// Result payloads are kept as opaque JSON so the record store stays
/// decoupled from the engine's result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    InFlight,
    Completed { result: JsonValue },
    Failed { error: String },
}

/// Durable replay guard for one logical request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub status: IdempotencyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a caller holds after attempting to claim a key.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// First writer wins: the caller owns the key and must `complete` or
    /// `fail` it.
    Claimed,
    /// A concurrent claimer holds the key; wait for it to resolve.
    InFlight,
    /// The request already completed; replay its stored result.
    Completed(JsonValue),
}

/// Durable idempotency-key records.
///
/// The record's atomic insert is the only cross-request serialization point
/// in the system: a retried request claims the same key and either wins,
/// observes the winner in flight, or replays the winner's result. A `Failed`
/// record never blocks a retry; `begin` re-claims it.
pub trait IdempotencyStore: Send + Sync {
    fn begin(&self, key: &IdempotencyKey) -> InventoryResult<ClaimOutcome>;
    fn complete(&self, key: &IdempotencyKey, result: JsonValue) -> InventoryResult<()>;
    fn fail(&self, key: &IdempotencyKey, error: String) -> InventoryResult<()>;
    fn get(&self, key: &IdempotencyKey) -> InventoryResult<Option<IdempotencyRecord>>;
}

impl<S> IdempotencyStore for Arc<S>
where
    S: IdempotencyStore + ?Sized,
{
    fn begin(&self, key: &IdempotencyKey) -> InventoryResult<ClaimOutcome> {
        (**self).begin(key)
    }

    fn complete(&self, key: &IdempotencyKey, result: JsonValue) -> InventoryResult<()> {
        (**self).complete(key, result)
    }

    fn fail(&self, key: &IdempotencyKey, error: String) -> InventoryResult<()> {
        (**self).fail(key, error)
    }

    fn get(&self, key: &IdempotencyKey) -> InventoryResult<Option<IdempotencyRecord>> {
        (**self).get(key)
    }
}

/// In-memory idempotency record store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<IdempotencyKey, IdempotencyRecord>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> InventoryResult<std::sync::MutexGuard<'_, HashMap<IdempotencyKey, IdempotencyRecord>>> {
        self.records
            .lock()
            .map_err(|_| InventoryError::storage("idempotency lock poisoned"))
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn begin(&self, key: &IdempotencyKey) -> InventoryResult<ClaimOutcome> {
        let mut records = self.lock()?;
        let now = Utc::now();

        match records.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(IdempotencyRecord {
                    key: key.clone(),
                    status: IdempotencyStatus::InFlight,
                    created_at: now,
                    updated_at: now,
                });
                Ok(ClaimOutcome::Claimed)
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                match &record.status {
                    IdempotencyStatus::InFlight => Ok(ClaimOutcome::InFlight),
                    IdempotencyStatus::Completed { result } => {
                        Ok(ClaimOutcome::Completed(result.clone()))
                    }
                    IdempotencyStatus::Failed { .. } => {
                        record.status = IdempotencyStatus::InFlight;
                        record.updated_at = now;
                        Ok(ClaimOutcome::Claimed)
                    }
                }
            }
        }
    }

    fn complete(&self, key: &IdempotencyKey, result: JsonValue) -> InventoryResult<()> {
        let mut records = self.lock()?;
        let record = records.get_mut(key).ok_or_else(|| {
            InventoryError::storage(format!("completing unknown idempotency record '{key}'"))
        })?;
        record.status = IdempotencyStatus::Completed { result };
        record.updated_at = Utc::now();
        Ok(())
    }

    fn fail(&self, key: &IdempotencyKey, error: String) -> InventoryResult<()> {
        let mut records = self.lock()?;
        let record = records.get_mut(key).ok_or_else(|| {
            InventoryError::storage(format!("failing unknown idempotency record '{key}'"))
        })?;
        record.status = IdempotencyStatus::Failed { error };
        record.updated_at = Utc::now();
        Ok(())
    }

    fn get(&self, key: &IdempotencyKey) -> InventoryResult<Option<IdempotencyRecord>> {
        Ok(self.lock()?.get(key).cloned())
    }
}
