//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InventoryError;

/// Identifier of a store (tenant boundary for a multi-store deployment).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(Uuid);

/// Identifier of a stock location (shelf, back room, warehouse, van).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(Uuid);

/// Identifier of a product or product variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

/// Identifier of a user (actor identity, supplied by the auth boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Identifier of a stock transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

/// Identifier of an applied stock adjustment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentId(Uuid);

/// Identifier of a parent→variant stock conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(Uuid);

/// Identifier of an appended ledger entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = InventoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s).map_err(|e| {
                    InventoryError::validation(format!("{}: {}", $name, e))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(StoreId, "StoreId");
impl_uuid_newtype!(LocationId, "LocationId");
impl_uuid_newtype!(ProductId, "ProductId");
impl_uuid_newtype!(UserId, "UserId");
impl_uuid_newtype!(TransferId, "TransferId");
impl_uuid_newtype!(AdjustmentId, "AdjustmentId");
impl_uuid_newtype!(ConversionId, "ConversionId");
impl_uuid_newtype!(EntryId, "EntryId");

/// Caller-supplied token ensuring a retried request is applied at most once.
///
/// Unique per logical intent; the caller generates it and reuses it verbatim
/// on every retry of the same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Result<Self, InventoryError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(InventoryError::validation("idempotency key cannot be empty"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scannable code printed on a physical tag (QR or barcode).
///
/// Codes are matched exactly first; scan workflows fall back to a
/// whitespace-stripped, case-folded comparison via [`TokenCode::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCode(String);

impl TokenCode {
    pub fn new(code: impl Into<String>) -> Result<Self, InventoryError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(InventoryError::validation("token code cannot be empty"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-stripped, upper-cased form used for fallback matching.
    pub fn normalized(&self) -> String {
        self.0
            .split_whitespace()
            .collect::<String>()
            .to_ascii_uppercase()
    }
}

impl core::fmt::Display for TokenCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable transfer number shown on packing slips and scan screens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferNumber(String);

impl TransferNumber {
    /// Derive a number from the transfer id.
    ///
    /// Uses the random tail of the UUIDv7 rather than its timestamp prefix so
    /// transfers created in the same millisecond still get distinct numbers.
    pub fn generate(transfer_id: TransferId) -> Self {
        let hex = transfer_id.as_uuid().simple().to_string();
        Self(format!("TRF-{}", hex[20..].to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TransferNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_numbers_use_the_random_uuid_tail() {
        let id = TransferId::new();
        let number = TransferNumber::generate(id);
        assert!(number.as_str().starts_with("TRF-"));
        assert_eq!(number.as_str().len(), "TRF-".len() + 12);
    }

    #[test]
    fn token_code_normalization_strips_whitespace_and_case() {
        let code = TokenCode::new("  qr-00 42 ").unwrap();
        assert_eq!(code.normalized(), "QR-0042");
    }

    #[test]
    fn empty_idempotency_key_is_rejected() {
        assert!(IdempotencyKey::new("   ").is_err());
        assert!(IdempotencyKey::new("retry-1").is_ok());
    }
}
