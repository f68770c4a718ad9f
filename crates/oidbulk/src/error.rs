//! Error types for identifier encoding and batch orchestration.
//!
//! ## Error Cases
//! - `InvalidLength`: a raw identifier was not exactly 12 bytes.
//! - `InvalidHex`: a hex string did not describe a 12-byte identifier.
//! - `InvalidRequest`: job parameters were out of bounds.
//! - `Write`: the bulk writer rejected a batch.
//! - `Interrupted`: submission stopped while waiting for an admission slot.
//! - `JobFailed`: one or more batches failed; successful writes were kept.

use crate::WriteError;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the `oidbulk` crate.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// A raw identifier of the wrong size was handed to the encoder.
    #[error("object id must be {expected} bytes, got {len}")]
    InvalidLength { len: usize, expected: usize },

    /// The input was not a 24 character hex string.
    #[error("invalid object id hex string: {input:?}")]
    InvalidHex { input: String },

    /// The job parameters were rejected before any batch was submitted.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A single batch write failed.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// The job stopped submitting batches after an interrupt. Every batch
    /// already admitted ran to completion before this was returned.
    #[error("Job interrupted after submitting {submitted} batches ({written} records written)")]
    Interrupted { submitted: usize, written: u64 },

    /// At least one batch ended in failure. Records written by the other
    /// batches remain in the store.
    #[error("{failed} of {batches} batches failed ({written} records written, not rolled back)")]
    JobFailed {
        failed: usize,
        batches: usize,
        written: u64,
    },
}
