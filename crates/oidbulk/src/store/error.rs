use core::fmt;

/// Unique index on the hex primary key.
pub const PRIMARY_KEY_INDEX: &str = "_id_";
/// Unique index on `id64`.
pub const ID64_INDEX: &str = "unique_id64";
/// Unique index on `id_wide`.
pub const ID_WIDE_INDEX: &str = "unique_id_wide";

/// Failure reported by a [`BulkWriter`](crate::BulkWriter).
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum WriteError {
    /// `bulk_insert` was called with no records.
    #[error("bulk insert requires at least one record")]
    EmptyBatch,

    /// Some documents were rejected. With unordered semantics the others in
    /// the same call may still have been written.
    #[error("bulk write failed: {inserted} inserted, {} rejected (first: {})", .errors.len(), FirstError(.errors))]
    BulkWrite {
        inserted: usize,
        errors: Vec<DocumentError>,
    },

    /// The batch would take a bounded collection past its capacity. Nothing
    /// from the batch was written.
    #[error("collection full: {stored} of {capacity} documents stored, batch of {requested} refused")]
    CapacityExceeded {
        capacity: usize,
        stored: usize,
        requested: usize,
    },

    /// The store could not be reached or timed out.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A single rejected document inside a bulk write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentError {
    /// Position of the document in the submitted batch.
    pub index: usize,
    /// Name of the unique index that was violated.
    pub index_name: &'static str,
    /// Primary key of the rejected document.
    pub key: String,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate key on {} at position {} ({})",
            self.index_name, self.index, self.key
        )
    }
}

struct FirstError<'a>(&'a [DocumentError]);

impl fmt::Display for FirstError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.first() {
            Some(err) => err.fmt(f),
            None => f.write_str("none"),
        }
    }
}
