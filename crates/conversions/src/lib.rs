//! Parent→variant stock conversion at a fixed ratio.
//!
//! A conversion atomically consumes parent stock and creates variant units
//! at one location (e.g. breaking a 1kg bag into 100g jars), rejecting
//! overdraft against the live parent cell and recording an immutable
//! [`ConversionRecord`] alongside the paired ledger entries.

pub mod engine;
pub mod record;

pub use engine::{ConversionEngine, ConversionOutcome, ConversionRequest};
pub use record::{ConversionRecord, ConversionStore, InMemoryConversionStore};
