use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tillpoint_core::{LocationId, ProductId, Quantity, StoreId};
use tillpoint_ledger::{
    EntryMetadata, InMemoryLedgerStore, LedgerStore, StockCellId, TransactionType,
};

/// Naive unaudited baseline: direct key-value quantity updates, no history.
#[derive(Debug, Clone)]
struct NaiveStockMap {
    inner: Arc<RwLock<HashMap<StockCellId, i64>>>,
}

impl NaiveStockMap {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn adjust(&self, cell_id: StockCellId, delta: i64) -> Result<(), ()> {
        let mut map = self.inner.write().unwrap();
        let entry = map.entry(cell_id).or_insert(0);
        let next = *entry + delta;
        if next < 0 {
            return Err(());
        }
        *entry = next;
        Ok(())
    }
}

fn bench_delta_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_application");

    for &batch in &[100u64, 1_000] {
        group.throughput(Throughput::Elements(batch));

        group.bench_with_input(BenchmarkId::new("naive_map", batch), &batch, |b, &batch| {
            let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
            b.iter(|| {
                let map = NaiveStockMap::new();
                for _ in 0..batch {
                    map.adjust(black_box(cell_id), black_box(1)).unwrap();
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("audited_ledger", batch),
            &batch,
            |b, &batch| {
                let cell_id = StockCellId::new(ProductId::new(), LocationId::new());
                let store_id = StoreId::new();
                b.iter(|| {
                    let store = InMemoryLedgerStore::new();
                    for _ in 0..batch {
                        store
                            .apply_delta(
                                black_box(cell_id),
                                black_box(Quantity::from(1)),
                                EntryMetadata::new(store_id, TransactionType::Received),
                            )
                            .unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_delta_application);
criterion_main!(benches);
