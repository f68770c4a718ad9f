//! Admission-controlled concurrent batch execution.
//!
//! [`BatchOrchestrator`] splits a job into a [`BatchPlan`], then for each
//! batch in index order waits for a slot from a counting semaphore and spawns
//! one Tokio task. Each task generates its records, hands them to the
//! [`BulkWriter`], and on success adds its record count to the job
//! [`Progress`]. The slot is an owned permit moved into the task, so it is
//! released on every exit path, including a panic.
//!
//! Once submission ends, every spawned task is joined. A failed batch never
//! cancels its siblings; failures are aggregated only after all tasks have
//! reached a terminal state.
//!
//! ## Interruption
//!
//! [`BatchOrchestrator::run_until`] takes a [`CancellationToken`]. It is only
//! observed while waiting for a slot: no further batches are submitted, the
//! batches already admitted drain, and the job then fails with
//! [`Error::Interrupted`].

use crate::{
    BatchPlan, BatchSpec, BatchStatus, BulkWriter, EncodedRecord, Error, IdentifierSource,
    Progress, Result, batch::status::BatchTask,
};
use core::time::Duration;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Default number of batches allowed to execute at the same time.
pub const DEFAULT_MAX_INFLIGHT_BATCHES: usize = 100;

/// Tuning for a [`BatchOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrently running batches (not records, and not
    /// batches still waiting to be submitted). `0` is treated as `1`.
    pub max_inflight_batches: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_inflight_batches: DEFAULT_MAX_INFLIGHT_BATCHES,
        }
    }
}

/// Summary of a job in which every batch succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub total: usize,
    pub batches: usize,
    pub written: u64,
    pub elapsed: Duration,
}

/// Drives a bulk generation job to completion under bounded concurrency.
pub struct BatchOrchestrator<W, S> {
    writer: Arc<W>,
    source: Arc<S>,
    max_inflight_batches: usize,
}

impl<W, S> BatchOrchestrator<W, S>
where
    W: BulkWriter + 'static,
    S: IdentifierSource + 'static,
{
    pub fn new(writer: Arc<W>, source: Arc<S>, config: OrchestratorConfig) -> Self {
        Self {
            writer,
            source,
            max_inflight_batches: config.max_inflight_batches.max(1),
        }
    }

    pub const fn max_inflight_batches(&self) -> usize {
        self.max_inflight_batches
    }

    pub fn writer(&self) -> &Arc<W> {
        &self.writer
    }

    /// Runs a job that cannot be interrupted.
    ///
    /// See [`run_until`](Self::run_until).
    pub async fn run(&self, total: usize, batch_size: usize) -> Result<JobReport> {
        self.run_until(total, batch_size, CancellationToken::new())
            .await
    }

    /// Generates and writes `total` records in batches of `batch_size`.
    ///
    /// Returns only after every submitted batch has finished.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if `total` or `batch_size` is zero. Nothing
    ///   is submitted.
    /// - [`Error::Interrupted`] if `interrupt` fired while waiting for a slot.
    /// - [`Error::JobFailed`] if any batch failed. Writes from the other
    ///   batches are kept.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, interrupt)))]
    pub async fn run_until(
        &self,
        total: usize,
        batch_size: usize,
        interrupt: CancellationToken,
    ) -> Result<JobReport> {
        let plan = BatchPlan::new(total, batch_size)?;
        let start = Instant::now();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Generating {} records in {} batches of up to {}",
            total,
            plan.batches(),
            batch_size
        );

        let limiter = Arc::new(Semaphore::new(self.max_inflight_batches));
        let progress = Arc::new(Progress::new());
        let mut handles = Vec::with_capacity(plan.batches());
        let mut interrupted = false;

        for spec in plan.iter() {
            // The only point where submission blocks.
            let permit = tokio::select! {
                biased;
                () = interrupt.cancelled() => None,
                permit = Arc::clone(&limiter).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Interrupted while waiting for a slot; {} of {} batches submitted",
                    spec.index,
                    plan.batches()
                );
                interrupted = true;
                break;
            };

            let fut = run_batch(
                BatchTask::new(spec),
                Arc::clone(&self.writer),
                Arc::clone(&self.source),
                Arc::clone(&progress),
                total as u64,
                permit,
            );
            #[cfg(feature = "tracing")]
            let fut = {
                use tracing::Instrument;
                fut.instrument(tracing::debug_span!("batch", index = spec.index))
            };

            handles.push(tokio::spawn(fut));
        }

        let submitted = handles.len();
        let failed = join_all(handles)
            .await
            .into_iter()
            .filter(|joined| !matches!(joined, Ok(BatchStatus::Succeeded)))
            .count();

        let written = progress.get();
        let elapsed = start.elapsed();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Finished generating records in {:.3}s ({} of {} written)",
            elapsed.as_secs_f64(),
            written,
            total
        );

        if interrupted {
            return Err(Error::Interrupted { submitted, written });
        }

        if failed > 0 {
            #[cfg(feature = "tracing")]
            tracing::error!("{} of {} batches failed", failed, plan.batches());
            return Err(Error::JobFailed {
                failed,
                batches: plan.batches(),
                written,
            });
        }

        Ok(JobReport {
            total,
            batches: plan.batches(),
            written,
            elapsed,
        })
    }
}

/// Body of one batch task. `_permit` is held for the lifetime of the future.
async fn run_batch<W, S>(
    mut task: BatchTask,
    writer: Arc<W>,
    source: Arc<S>,
    progress: Arc<Progress>,
    total: u64,
    _permit: OwnedSemaphorePermit,
) -> BatchStatus
where
    W: BulkWriter,
    S: IdentifierSource,
{
    task.start();
    let BatchSpec { index, count } = task.spec();

    let records = generate_records(source.as_ref(), count);

    match write_batch(writer.as_ref(), records).await {
        Ok(_inserted) => {
            let done = progress.add(count as u64);
            log_progress(index, done, total);
            task.finish(true)
        }
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Batch {} of {} records failed: {}", index, count, _e);
            task.finish(false)
        }
    }
}

/// Progress is reported every tenth batch and once the job is complete.
#[cfg(any(feature = "tracing", test))]
const fn reports_progress(index: usize, done: u64, total: u64) -> bool {
    index % 10 == 0 || done == total
}

#[cfg(feature = "tracing")]
fn log_progress(index: usize, done: u64, total: u64) {
    if reports_progress(index, done, total) {
        tracing::info!("Progress {} of total {}", done, total);
    }
}

#[cfg(not(feature = "tracing"))]
const fn log_progress(_index: usize, _done: u64, _total: u64) {}

/// Builds `count` records, each from a fresh identifier.
fn generate_records<S: IdentifierSource + ?Sized>(source: &S, count: usize) -> Vec<EncodedRecord> {
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let oid = source.next_id();
        let record = EncodedRecord::from_object_id(&oid);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            "Generated id: {}, id64: {}, id_wide: {}",
            record.primary_key(),
            record.id64(),
            record.id_wide()
        );
        records.push(record);
    }
    records
}

async fn write_batch<W: BulkWriter + ?Sized>(
    writer: &W,
    records: Vec<EncodedRecord>,
) -> Result<usize> {
    Ok(writer.bulk_insert(records).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_reported_every_tenth_batch_and_at_completion() {
        let reported: Vec<usize> = (0..25)
            .filter(|&index| reports_progress(index, (index as u64 + 1) * 4, 100))
            .collect();
        assert_eq!(reported, [0, 10, 20, 24]);

        assert!(!reports_progress(7, 99, 100));
        assert!(reports_progress(7, 100, 100));
    }
}
