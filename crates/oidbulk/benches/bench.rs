use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use oidbulk::{
    BatchOrchestrator, IdEncoder, IdentifierSource, MemoryStore, ObjectIdGenerator,
    OrchestratorConfig,
};
use std::sync::Arc;
use tokio::runtime::Builder;

// Number of IDs encoded per benchmark iteration.
const TOTAL_IDS: usize = 4096;

fn bench_encoder(c: &mut Criterion) {
    let generator = ObjectIdGenerator::new();
    let ids: Vec<_> = (0..TOTAL_IDS).map(|_| generator.next_id()).collect();

    let mut group = c.benchmark_group("encoder");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("id64/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for oid in &ids {
                black_box(IdEncoder::id64(black_box(oid)));
            }
        });
    });

    group.bench_function(format!("id_wide/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for oid in &ids {
                black_box(IdEncoder::id_wide(black_box(oid)));
            }
        });
    });

    group.finish();
}

fn bench_orchestrator(c: &mut Criterion) {
    const TOTAL: usize = 100_000;
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    let mut group = c.benchmark_group("orchestrator");
    group.throughput(Throughput::Elements(TOTAL as u64));
    group.sample_size(10);

    for batch_size in [1_000, 10_000] {
        group.bench_function(format!("memory/batch/{batch_size}"), |b| {
            b.to_async(&rt).iter(|| async move {
                let orchestrator = BatchOrchestrator::new(
                    Arc::new(MemoryStore::new()),
                    Arc::new(ObjectIdGenerator::new()),
                    OrchestratorConfig::default(),
                );
                black_box(orchestrator.run(TOTAL, batch_size).await.expect("job"));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encoder, bench_orchestrator);
criterion_main!(benches);
