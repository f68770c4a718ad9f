use crate::{
    BatchOrchestrator, BulkWriter, EncodedRecord, Error, IdEncoder, MemoryStore, ObjectId,
    ObjectIdGenerator, OrchestratorConfig, TimeSource, WriteError,
};
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

struct FixedTime {
    secs: u32,
}

impl TimeSource for FixedTime {
    fn current_secs(&self) -> u32 {
        self.secs
    }
}

fn fixed_source() -> Arc<ObjectIdGenerator<FixedTime>> {
    Arc::new(ObjectIdGenerator::from_components(
        [0xde, 0xad, 0xbe, 0xef, 0x01],
        0,
        FixedTime { secs: 1_700_000_000 },
    ))
}

fn orchestrator<W: BulkWriter + 'static>(
    writer: Arc<W>,
    max_inflight_batches: usize,
) -> BatchOrchestrator<W, ObjectIdGenerator<FixedTime>> {
    BatchOrchestrator::new(
        writer,
        fixed_source(),
        OrchestratorConfig {
            max_inflight_batches,
        },
    )
}

/// Fails the `fail_on`-th call (1-based) and stores everything else.
struct FlakyWriter {
    store: MemoryStore,
    calls: AtomicUsize,
    fail_on: usize,
}

impl FlakyWriter {
    fn new(fail_on: usize) -> Self {
        Self {
            store: MemoryStore::new(),
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl BulkWriter for FlakyWriter {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(WriteError::Unavailable {
                    reason: format!("injected failure on call {call}"),
                });
            }
            self.store.bulk_insert(records).await
        }
    }
}

/// Records how many writes overlap, sleeping inside each one.
struct GaugeWriter {
    store: MemoryStore,
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    delay: Duration,
}

impl GaugeWriter {
    fn new(delay: Duration) -> Self {
        Self {
            store: MemoryStore::new(),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

impl BulkWriter for GaugeWriter {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let res = self.store.bulk_insert(records).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            res
        }
    }
}

struct PanickingWriter;

impl BulkWriter for PanickingWriter {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move {
            if records.is_empty() {
                return Err(WriteError::EmptyBatch);
            }
            panic!("writer exploded");
        }
    }
}

#[tokio::test]
async fn writes_every_record_in_sized_batches() {
    let writer = Arc::new(GaugeWriter::new(Duration::ZERO));
    let report = orchestrator(Arc::clone(&writer), 100)
        .run(25, 10)
        .await
        .unwrap();

    assert_eq!(report.total, 25);
    assert_eq!(report.batches, 3);
    assert_eq!(report.written, 25);
    assert_eq!(writer.calls.load(Ordering::SeqCst), 3);
    assert_eq!(writer.store.len(), 25);
}

#[tokio::test]
async fn stored_records_carry_consistent_encodings() {
    let store = Arc::new(MemoryStore::new());
    orchestrator(Arc::clone(&store), 4)
        .run(50, 7)
        .await
        .unwrap();

    for counter in 0..50 {
        let oid =
            ObjectId::from_parts(1_700_000_000, [0xde, 0xad, 0xbe, 0xef, 0x01], counter);
        let stored = store
            .find_by_id64(IdEncoder::id64(&oid))
            .expect("record for every counter value");
        assert_eq!(stored.primary_key(), oid.to_hex());
        assert_eq!(stored.id_wide(), IdEncoder::id_wide(&oid));
        assert_eq!(
            IdEncoder::extract_timestamp_seconds(stored.id64()),
            1_700_000_000
        );
    }
}

#[tokio::test]
async fn single_batch_uses_a_single_slot() {
    let writer = Arc::new(GaugeWriter::new(Duration::from_millis(5)));
    let report = orchestrator(Arc::clone(&writer), 100)
        .run(10_000, 10_000)
        .await
        .unwrap();

    assert_eq!(report.batches, 1);
    assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(writer.peak.load(Ordering::SeqCst), 1);
    assert_eq!(writer.store.len(), 10_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn inflight_batches_never_exceed_the_limit() {
    let writer = Arc::new(GaugeWriter::new(Duration::from_millis(10)));
    let report = orchestrator(Arc::clone(&writer), 4)
        .run(200, 5)
        .await
        .unwrap();

    assert_eq!(report.batches, 40);
    assert_eq!(writer.calls.load(Ordering::SeqCst), 40);
    let peak = writer.peak.load(Ordering::SeqCst);
    assert!((1..=4).contains(&peak), "peak concurrency was {peak}");
    assert_eq!(writer.current.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_batch_does_not_stop_its_siblings() {
    // One slot keeps the calls in submission order, so call 2 is batch 1.
    let writer = Arc::new(FlakyWriter::new(2));
    let err = orchestrator(Arc::clone(&writer), 1)
        .run(25, 10)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::JobFailed {
            failed: 1,
            batches: 3,
            written: 15,
        }
    ));
    assert_eq!(writer.calls.load(Ordering::SeqCst), 3);
    assert_eq!(writer.store.len(), 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failures_are_aggregated_after_all_batches_finish() {
    let writer = Arc::new(FlakyWriter::new(1));
    let err = orchestrator(Arc::clone(&writer), 8)
        .run(1_000, 10)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::JobFailed {
            failed: 1,
            batches: 100,
            written: 990,
        }
    ));
    assert_eq!(writer.calls.load(Ordering::SeqCst), 100);
    assert_eq!(writer.store.len(), 990);
}

#[tokio::test]
async fn duplicate_key_rejections_fail_the_job() {
    // Every id shares second, tag and counter with one already stored.
    let store = Arc::new(MemoryStore::new());
    orchestrator(Arc::clone(&store), 2).run(10, 5).await.unwrap();

    let err = orchestrator(Arc::clone(&store), 2)
        .run(10, 5)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::JobFailed {
            failed: 2,
            batches: 2,
            written: 0,
        }
    ));
    assert_eq!(store.len(), 10);
}

#[tokio::test]
async fn panicking_batch_counts_as_failed() {
    let err = orchestrator(Arc::new(PanickingWriter), 2)
        .run(4, 2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::JobFailed {
            failed: 2,
            batches: 2,
            written: 0,
        }
    ));
}

#[tokio::test]
async fn interrupt_stops_submission_but_drains_admitted_batches() {
    let writer = Arc::new(GaugeWriter::new(Duration::from_millis(200)));
    let interrupt = CancellationToken::new();

    let trigger = interrupt.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = orchestrator(Arc::clone(&writer), 1)
        .run_until(30, 10, interrupt)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Interrupted {
            submitted: 1,
            written: 10,
        }
    ));
    // The admitted batch finished writing before the error surfaced.
    assert_eq!(writer.current.load(Ordering::SeqCst), 0);
    assert_eq!(writer.store.len(), 10);
}

#[tokio::test]
async fn interrupted_before_start_submits_nothing() {
    let store = Arc::new(MemoryStore::new());
    let interrupt = CancellationToken::new();
    interrupt.cancel();

    let err = orchestrator(Arc::clone(&store), 10)
        .run_until(100, 10, interrupt)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Interrupted {
            submitted: 0,
            written: 0,
        }
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn rejects_empty_jobs() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(Arc::clone(&store), 10);

    assert!(matches!(
        orch.run(0, 10).await,
        Err(Error::InvalidRequest { .. })
    ));
    assert!(matches!(
        orch.run(10, 0).await,
        Err(Error::InvalidRequest { .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn zero_inflight_limit_is_clamped() {
    let orch = orchestrator(Arc::new(MemoryStore::new()), 0);
    assert_eq!(orch.max_inflight_batches(), 1);
    assert_eq!(
        OrchestratorConfig::default().max_inflight_batches,
        crate::DEFAULT_MAX_INFLIGHT_BATCHES
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn random_generator_yields_unique_ids_across_batches() {
    let store = Arc::new(MemoryStore::new());
    let orch = BatchOrchestrator::new(
        Arc::clone(&store),
        Arc::new(ObjectIdGenerator::new()),
        OrchestratorConfig::default(),
    );

    let report = orch.run(5_000, 100).await.unwrap();

    assert_eq!(report.written, 5_000);
    assert_eq!(store.len(), 5_000);
}
