//! Inventory quantity ledger: durable stock cells plus an append-only
//! transaction log.
//!
//! The ledger is the single point of durability and audit truth for every
//! quantity mutation in the system. Adjustments, transfers, and conversions
//! all write through [`LedgerStore`]; each mutation commits the new cell
//! value and its [`LedgerEntry`] as one atomic unit.

pub mod cell;
pub mod entry;
pub mod memory;
pub mod store;

pub use cell::{StockCell, StockCellId};
pub use entry::{EntryMetadata, EntryReference, LedgerEntry, ReferenceKind, TransactionType};
pub use memory::InMemoryLedgerStore;
pub use store::{LedgerConfig, LedgerStore};
