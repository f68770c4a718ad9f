use portable_atomic::{AtomicU64, Ordering};

/// Number of records written by successful batches in one job.
///
/// Only ever increased, with a relaxed atomic add. It is read for logging and
/// reporting; nothing waits on it and it is not rolled back on failure.
#[derive(Debug, Default)]
pub struct Progress {
    done: AtomicU64,
}

impl Progress {
    pub const fn new() -> Self {
        Self {
            done: AtomicU64::new(0),
        }
    }

    /// Adds `records` and returns the new total.
    pub fn add(&self, records: u64) -> u64 {
        self.done.fetch_add(records, Ordering::Relaxed) + records
    }

    pub fn get(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}
