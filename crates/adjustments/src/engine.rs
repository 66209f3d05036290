use tracing::info;

use tillpoint_core::{AdjustmentId, InventoryError, InventoryResult};
use tillpoint_ledger::{EntryMetadata, EntryReference, LedgerStore, StockCellId};

use crate::idempotency::{ClaimOutcome, IdempotencyStore};
use crate::request::{AdjustmentMode, AdjustmentRequest, AdjustmentResult};

/// Applies quantity adjustments to single stock cells with exactly-once
/// semantics for retried network calls.
///
/// Constructed with injected storage; holds no process-wide state of its own.
pub struct AdjustmentEngine<L, I> {
    ledger: L,
    idempotency: I,
}

impl<L, I> AdjustmentEngine<L, I>
where
    L: LedgerStore,
    I: IdempotencyStore,
{
    pub fn new(ledger: L, idempotency: I) -> Self {
        Self { ledger, idempotency }
    }

    /// Apply one adjustment request.
    ///
    /// Replaying a request with the same idempotency key any number of times
    /// returns the identical result and applies the quantity change exactly
    /// once. A concurrent retry of an in-flight request waits for the first
    /// writer to resolve instead of racing a fresh application.
    pub fn adjust(&self, request: AdjustmentRequest) -> InventoryResult<AdjustmentResult> {
        Self::validate(&request)?;

        loop {
            match self.idempotency.begin(&request.idempotency_key)? {
                ClaimOutcome::Claimed => break,
                ClaimOutcome::Completed(payload) => {
                    let result: AdjustmentResult =
                        serde_json::from_value(payload).map_err(|e| {
                            InventoryError::storage(format!(
                                "stored adjustment result corrupt: {e}"
                            ))
                        })?;
                    info!(key = %request.idempotency_key, "replaying completed adjustment");
                    return Ok(result);
                }
                ClaimOutcome::InFlight => std::thread::yield_now(),
            }
        }

        let outcome = self.apply(&request);
        match &outcome {
            Ok(result) => {
                let payload = serde_json::to_value(result).map_err(|e| {
                    InventoryError::storage(format!("adjustment result serialization failed: {e}"))
                })?;
                self.idempotency.complete(&request.idempotency_key, payload)?;
            }
            Err(err) => {
                self.idempotency
                    .fail(&request.idempotency_key, err.to_string())?;
            }
        }
        outcome
    }

    fn validate(request: &AdjustmentRequest) -> InventoryResult<()> {
        match request.mode {
            AdjustmentMode::Relative { delta } if delta.is_zero() => Err(
                InventoryError::invalid_quantity("relative delta cannot be zero"),
            ),
            AdjustmentMode::Absolute { target } if target.is_negative() => {
                Err(InventoryError::invalid_quantity(format!(
                    "absolute target cannot be negative: {target}"
                )))
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, request: &AdjustmentRequest) -> InventoryResult<AdjustmentResult> {
        let adjustment_id = AdjustmentId::new();
        let cell_id = StockCellId::new(request.product_id, request.location_id);

        let reason = match (&request.reason, &request.notes) {
            (Some(reason), Some(notes)) => Some(format!("{reason} ({notes})")),
            (Some(reason), None) => Some(reason.clone()),
            (None, Some(notes)) => Some(notes.clone()),
            (None, None) => None,
        };

        let mut meta = EntryMetadata::new(
            request.store_id,
            request.adjustment_type.transaction_type(),
        )
        .with_reference(EntryReference::adjustment(adjustment_id))
        .with_actor(request.performed_by);
        meta.reason = reason;

        let entry = match request.mode {
            AdjustmentMode::Relative { delta } => {
                self.ledger.apply_delta(cell_id, delta, meta)?
            }
            AdjustmentMode::Absolute { target } => {
                self.ledger.set_absolute(cell_id, target, meta)?
            }
        };

        info!(
            adjustment = %adjustment_id,
            product = %request.product_id,
            location = %request.location_id,
            before = %entry.quantity_before,
            after = %entry.quantity_after,
            "stock adjusted"
        );

        Ok(AdjustmentResult {
            adjustment_id,
            quantity_before: entry.quantity_before,
            quantity_after: entry.quantity_after,
            cell_total: entry.quantity_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;
    use tillpoint_core::{IdempotencyKey, LocationId, ProductId, Quantity, StoreId};
    use tillpoint_ledger::{InMemoryLedgerStore, TransactionType};

    use crate::idempotency::InMemoryIdempotencyStore;
    use crate::request::AdjustmentType;

    type TestEngine = AdjustmentEngine<Arc<InMemoryLedgerStore>, Arc<InMemoryIdempotencyStore>>;

    fn qty(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn test_engine() -> (TestEngine, Arc<InMemoryLedgerStore>) {
        let ledger = InMemoryLedgerStore::arc();
        let engine = AdjustmentEngine::new(Arc::clone(&ledger), InMemoryIdempotencyStore::arc());
        (engine, ledger)
    }

    fn request(
        store_id: StoreId,
        product_id: ProductId,
        location_id: LocationId,
        mode: AdjustmentMode,
        key: &str,
    ) -> AdjustmentRequest {
        AdjustmentRequest {
            store_id,
            product_id,
            location_id,
            adjustment_type: AdjustmentType::CountCorrection,
            mode,
            reason: None,
            notes: None,
            idempotency_key: IdempotencyKey::new(key).unwrap(),
            performed_by: None,
        }
    }

    fn seed(ledger: &InMemoryLedgerStore, cell_id: StockCellId, store_id: StoreId, amount: &str) {
        ledger
            .apply_delta(
                cell_id,
                qty(amount),
                EntryMetadata::new(store_id, TransactionType::Received),
            )
            .unwrap();
    }

    #[test]
    fn replaying_a_key_applies_the_change_exactly_once() {
        let (engine, ledger) = test_engine();
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
        seed(&ledger, cell_id, store_id, "100");

        let req = request(
            store_id,
            cell_id.product_id,
            cell_id.location_id,
            AdjustmentMode::Relative { delta: qty("-30") },
            "audit-1",
        );

        let first = engine.adjust(req.clone()).unwrap();
        let second = engine.adjust(req).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.cell(&cell_id).unwrap().unwrap().quantity, qty("70"));
        // Seed entry + exactly one adjustment entry.
        assert_eq!(ledger.entries_for_cell(&cell_id).unwrap().len(), 2);
    }

    #[test]
    fn failed_attempts_do_not_block_retries_with_the_same_key() {
        let (engine, ledger) = test_engine();
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());

        let req = request(
            store_id,
            cell_id.product_id,
            cell_id.location_id,
            AdjustmentMode::Relative { delta: qty("-30") },
            "retry-after-failure",
        );

        let err = engine.adjust(req.clone()).unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { .. }));

        seed(&ledger, cell_id, store_id, "100");
        let result = engine.adjust(req).unwrap();
        assert_eq!(result.quantity_after, qty("70"));
    }

    #[test]
    fn sale_then_absolute_then_relative_scenario() {
        // 100g on hand; sale of 30, audit sets 50 absolute, restock of 5.
        let (engine, ledger) = test_engine();
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
        seed(&ledger, cell_id, store_id, "100");

        let mut sale = request(
            store_id,
            cell_id.product_id,
            cell_id.location_id,
            AdjustmentMode::Relative { delta: qty("-30") },
            "k-sale",
        );
        sale.adjustment_type = AdjustmentType::Other;
        sale.reason = Some("sale".to_string());
        engine.adjust(sale).unwrap();

        engine
            .adjust(request(
                store_id,
                cell_id.product_id,
                cell_id.location_id,
                AdjustmentMode::Absolute { target: qty("50") },
                "k-audit",
            ))
            .unwrap();

        let last = engine
            .adjust(request(
                store_id,
                cell_id.product_id,
                cell_id.location_id,
                AdjustmentMode::Relative { delta: qty("5") },
                "k-restock",
            ))
            .unwrap();

        assert_eq!(last.cell_total, qty("55"));

        let entries = ledger.entries_for_cell(&cell_id).unwrap();
        let spans: Vec<(Quantity, Quantity)> = entries[1..]
            .iter()
            .map(|e| (e.quantity_before, e.quantity_after))
            .collect();
        assert_eq!(
            spans,
            vec![
                (qty("100"), qty("70")),
                (qty("70"), qty("50")),
                (qty("50"), qty("55")),
            ]
        );
    }

    #[test]
    fn absolute_mode_is_authoritative_over_concurrent_sales() {
        let (engine, ledger) = test_engine();
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
        seed(&ledger, cell_id, store_id, "100");

        // A sale lands between the UI's read of "100" and the audit submit.
        ledger
            .apply_delta(
                cell_id,
                qty("-25"),
                EntryMetadata::new(store_id, TransactionType::Sale),
            )
            .unwrap();

        let result = engine
            .adjust(request(
                store_id,
                cell_id.product_id,
                cell_id.location_id,
                AdjustmentMode::Absolute { target: qty("80") },
                "k-audit-race",
            ))
            .unwrap();

        assert_eq!(result.quantity_before, qty("75"));
        assert_eq!(result.quantity_after, qty("80"));
    }

    #[test]
    fn invalid_quantities_are_rejected_before_claiming_the_key() {
        let (engine, _ledger) = test_engine();
        let store_id = StoreId::new();
        let product_id = ProductId::new();
        let location_id = LocationId::new();

        let err = engine
            .adjust(request(
                store_id,
                product_id,
                location_id,
                AdjustmentMode::Relative {
                    delta: Quantity::ZERO,
                },
                "k-zero",
            ))
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidQuantity(_)));

        let err = engine
            .adjust(request(
                store_id,
                product_id,
                location_id,
                AdjustmentMode::Absolute { target: qty("-5") },
                "k-neg",
            ))
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidQuantity(_)));
    }

    #[test]
    fn concurrent_adjustments_with_distinct_keys_all_apply() {
        let (engine, ledger) = test_engine();
        let engine = Arc::new(engine);
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
        seed(&ledger, cell_id, store_id, "100");

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        engine
                            .adjust(request(
                                store_id,
                                cell_id.product_id,
                                cell_id.location_id,
                                AdjustmentMode::Relative {
                                    delta: Quantity::from(1),
                                },
                                &format!("bulk-{t}-{i}"),
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            ledger.cell(&cell_id).unwrap().unwrap().quantity,
            qty("200")
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the final cell quantity equals the initial value plus
        /// the sum of all relative deltas that were accepted, even when every
        /// request is also replayed with its original key.
        #[test]
        fn accepted_deltas_accumulate_and_replays_add_nothing(
            deltas in prop::collection::vec(
                (-50i64..100i64).prop_filter("engine rejects zero deltas", |d| *d != 0),
                1..30,
            )
        ) {
            let (engine, ledger) = test_engine();
            let store_id = StoreId::new();
            let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
            seed(&ledger, cell_id, store_id, "1000");

            let mut expected = qty("1000");
            for (i, delta) in deltas.iter().enumerate() {
                let req = request(
                    store_id,
                    cell_id.product_id,
                    cell_id.location_id,
                    AdjustmentMode::Relative {
                        delta: Quantity::from(*delta),
                    },
                    &format!("prop-{i}"),
                );
                let first = engine.adjust(req.clone());
                let replay = engine.adjust(req);
                match (first, replay) {
                    (Ok(a), Ok(b)) => {
                        prop_assert_eq!(a, b);
                        expected = expected + Quantity::from(*delta);
                    }
                    // An overdrafted delta failed twice; nothing applied.
                    (Err(_), Err(_)) => {}
                    (a, b) => {
                        return Err(TestCaseError::fail(format!(
                            "first and replay disagreed: {a:?} vs {b:?}"
                        )));
                    }
                }
            }

            prop_assert_eq!(
                ledger.cell(&cell_id).unwrap().unwrap().quantity,
                expected
            );
        }
    }

    #[test]
    fn concurrent_retries_of_one_key_converge_on_one_application() {
        let (engine, ledger) = test_engine();
        let engine = Arc::new(engine);
        let store_id = StoreId::new();
        let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
        seed(&ledger, cell_id, store_id, "100");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine
                        .adjust(request(
                            store_id,
                            cell_id.product_id,
                            cell_id.location_id,
                            AdjustmentMode::Relative { delta: qty("10") },
                            "shared-key",
                        ))
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<AdjustmentResult> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(ledger.cell(&cell_id).unwrap().unwrap().quantity, qty("110"));
        assert_eq!(ledger.entries_for_cell(&cell_id).unwrap().len(), 2);
    }
}
