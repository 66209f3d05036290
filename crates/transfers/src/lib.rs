//! Location-to-location stock movement through an explicit lifecycle, with
//! optional physical-token (QR tag) binding per item.
//!
//! Transfers never move stock at creation time; custody and ledger are
//! reconciled at receipt. A token-bound item bypasses per-unit ledger math
//! entirely: the token's own status and location are the inventory record
//! for that unit.

pub mod service;
pub mod store;
pub mod token;
pub mod transfer;

pub use service::{NewTransfer, NewTransferItem, ReceiptShortfall, TransferReceipt, TransferService};
pub use store::{InMemoryTokenStore, InMemoryTransferStore, TokenStore, TransferStore};
pub use token::{PhysicalToken, TokenStatus};
pub use transfer::{ItemCondition, ItemTracking, Transfer, TransferItem, TransferStatus};
