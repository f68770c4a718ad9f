use crate::{EncodedRecord, WriteError};
use core::future::Future;

/// Bulk-insert capability of the backing document store.
///
/// Inserts are *unordered*: the store may apply them in any order, and one
/// rejected record does not stop the rest of the call. The call fails as a
/// whole if any record was rejected, aggregating the per-document errors.
///
/// Implementations own their connection or resource pool and are shared by
/// every batch task without further locking, hence the `Send + Sync` bound.
pub trait BulkWriter: Send + Sync {
    /// Writes `records` and returns how many were inserted.
    ///
    /// # Errors
    ///
    /// - [`WriteError::EmptyBatch`] if `records` is empty.
    /// - [`WriteError::BulkWrite`] if one or more documents were rejected.
    /// - [`WriteError::CapacityExceeded`] if a bounded store is full.
    /// - [`WriteError::Unavailable`] if the store could not be reached.
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send;
}
