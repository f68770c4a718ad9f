use crate::{Error, Result};

/// One unit of work: the batch position and how many records it generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpec {
    pub index: usize,
    pub count: usize,
}

/// Partition of `total` records into batches of at most `batch_size`.
///
/// Every batch holds exactly `batch_size` records except possibly the last,
/// which holds the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total: usize,
    batch_size: usize,
    batches: usize,
}

impl BatchPlan {
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `total` or `batch_size` is zero.
    pub fn new(total: usize, batch_size: usize) -> Result<Self> {
        if total == 0 {
            return Err(Error::InvalidRequest {
                reason: "total must be greater than 0".to_string(),
            });
        }
        if batch_size == 0 {
            return Err(Error::InvalidRequest {
                reason: "batch size must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            total,
            batch_size,
            batches: total.div_ceil(batch_size),
        })
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub const fn batches(&self) -> usize {
        self.batches
    }

    /// Number of records in batch `index`. `index` must be below
    /// [`batches`](Self::batches).
    pub const fn size_of(&self, index: usize) -> usize {
        debug_assert!(index < self.batches);
        let remaining = self.total - index * self.batch_size;
        if remaining < self.batch_size {
            remaining
        } else {
            self.batch_size
        }
    }

    /// Batches in index order.
    pub fn iter(&self) -> impl Iterator<Item = BatchSpec> + use<> {
        let plan = *self;
        (0..plan.batches).map(move |index| BatchSpec {
            index,
            count: plan.size_of(index),
        })
    }
}
