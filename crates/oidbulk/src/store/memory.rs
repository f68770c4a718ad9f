use crate::{
    BulkWriter, COLLECTION, DocumentError, EncodedRecord, ID_WIDE_INDEX, ID64_INDEX,
    PRIMARY_KEY_INDEX, WriteError,
};
use core::future::Future;
use parking_lot::Mutex;
use std::collections::HashMap;

/// An in-process document store enforcing the three unique indexes.
///
/// Documents live in a single vector; each index maps a key to its position.
/// A bulk insert takes the lock once for the whole batch.
///
/// Nothing is ever evicted. A store built with [`MemoryStore::bounded`]
/// refuses any batch that would take it past its capacity.
#[derive(Debug)]
pub struct MemoryStore {
    collection: String,
    capacity: Option<usize>,
    inner: Mutex<Collection>,
}

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<EncodedRecord>,
    by_primary_key: HashMap<String, usize>,
    by_id64: HashMap<i64, usize>,
    by_id_wide: HashMap<u128, usize>,
}

impl Collection {
    fn violated_index(&self, record: &EncodedRecord) -> Option<&'static str> {
        if self.by_primary_key.contains_key(record.primary_key()) {
            Some(PRIMARY_KEY_INDEX)
        } else if self.by_id64.contains_key(&record.id64()) {
            Some(ID64_INDEX)
        } else if self.by_id_wide.contains_key(&record.id_wide()) {
            Some(ID_WIDE_INDEX)
        } else {
            None
        }
    }

    fn insert(&mut self, record: EncodedRecord) {
        let pos = self.documents.len();
        self.by_primary_key
            .insert(record.primary_key().to_owned(), pos);
        self.by_id64.insert(record.id64(), pos);
        self.by_id_wide.insert(record.id_wide(), pos);
        self.documents.push(record);
    }
}

impl MemoryStore {
    /// Creates an empty store for the default collection.
    pub fn new() -> Self {
        Self::with_collection(COLLECTION)
    }

    pub fn with_collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            capacity: None,
            inner: Mutex::new(Collection::default()),
        }
    }

    /// Creates an empty store for the default collection that holds at most
    /// `capacity` documents.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, primary_key: &str) -> bool {
        self.inner.lock().by_primary_key.contains_key(primary_key)
    }

    pub fn find_by_id64(&self, id64: i64) -> Option<EncodedRecord> {
        let inner = self.inner.lock();
        inner
            .by_id64
            .get(&id64)
            .map(|&pos| inner.documents[pos].clone())
    }

    pub fn find_by_id_wide(&self, id_wide: u128) -> Option<EncodedRecord> {
        let inner = self.inner.lock();
        inner
            .by_id_wide
            .get(&id_wide)
            .map(|&pos| inner.documents[pos].clone())
    }

    /// Applies `records` with unordered semantics: every record that does not
    /// collide with an existing document (or an earlier record of the same
    /// call) is kept.
    fn insert_unordered(&self, records: Vec<EncodedRecord>) -> Result<usize, WriteError> {
        if records.is_empty() {
            return Err(WriteError::EmptyBatch);
        }

        let mut errors = Vec::new();
        let mut inserted = 0;
        {
            let mut inner = self.inner.lock();
            let stored = inner.documents.len();
            if let Some(capacity) = self.capacity {
                if records.len() > capacity.saturating_sub(stored) {
                    return Err(WriteError::CapacityExceeded {
                        capacity,
                        stored,
                        requested: records.len(),
                    });
                }
            }
            inner.documents.reserve(records.len());

            for (index, record) in records.into_iter().enumerate() {
                match inner.violated_index(&record) {
                    Some(index_name) => errors.push(DocumentError {
                        index,
                        index_name,
                        key: record.primary_key().to_owned(),
                    }),
                    None => {
                        inner.insert(record);
                        inserted += 1;
                    }
                }
            }
        }

        if errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Inserted {} documents into collection {}",
                inserted,
                self.collection
            );
            Ok(inserted)
        } else {
            Err(WriteError::BulkWrite { inserted, errors })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkWriter for MemoryStore {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move { self.insert_unordered(records) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectId;

    fn record(secs: u32, tag: [u8; 5], counter: u32) -> EncodedRecord {
        EncodedRecord::from_object_id(&ObjectId::from_parts(secs, tag, counter))
    }

    #[tokio::test]
    async fn inserts_and_indexes_records() {
        let store = MemoryStore::new();
        let records: Vec<_> = (0..3).map(|i| record(100, [1; 5], i)).collect();
        let first = records[0].clone();

        assert_eq!(store.bulk_insert(records).await, Ok(3));
        assert_eq!(store.len(), 3);
        assert_eq!(store.collection(), "products");
        assert!(store.contains(first.primary_key()));
        assert_eq!(store.find_by_id64(first.id64()), Some(first.clone()));
        assert_eq!(store.find_by_id_wide(first.id_wide()), Some(first));
        assert_eq!(store.find_by_id64(0), None);
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        let store = MemoryStore::with_collection("scratch");
        assert_eq!(store.bulk_insert(Vec::new()).await, Err(WriteError::EmptyBatch));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn duplicates_do_not_stop_the_rest_of_the_batch() {
        let store = MemoryStore::new();
        let dup = record(5, [2; 5], 9);
        let batch = vec![record(5, [2; 5], 1), dup.clone(), dup.clone(), record(5, [2; 5], 3)];

        let err = store.bulk_insert(batch).await.unwrap_err();

        assert_eq!(
            err,
            WriteError::BulkWrite {
                inserted: 3,
                errors: vec![DocumentError {
                    index: 2,
                    index_name: PRIMARY_KEY_INDEX,
                    key: dup.primary_key().to_owned(),
                }],
            }
        );
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn id64_collisions_are_caught_by_their_own_index() {
        let store = MemoryStore::new();
        // Tags [0,0,0,0,3] and [0,0,0,1,228] fold to the same byte.
        let a = record(7, [0, 0, 0, 0, 3], 1);
        let b = record(7, [0, 0, 0, 1, 228], 1);
        assert_eq!(a.id64(), b.id64());

        assert_eq!(store.bulk_insert(vec![a]).await, Ok(1));
        let err = store.bulk_insert(vec![b]).await.unwrap_err();
        match err {
            WriteError::BulkWrite { inserted, errors } => {
                assert_eq!(inserted, 0);
                assert_eq!(errors[0].index_name, ID64_INDEX);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bounded_store_refuses_batches_past_capacity() {
        let store = MemoryStore::bounded(5);
        assert_eq!(store.capacity(), Some(5));

        let batch = |from: u32| (from..from + 3).map(|i| record(9, [3; 5], i)).collect::<Vec<_>>();

        assert_eq!(store.bulk_insert(batch(0)).await, Ok(3));
        assert_eq!(
            store.bulk_insert(batch(3)).await,
            Err(WriteError::CapacityExceeded {
                capacity: 5,
                stored: 3,
                requested: 3,
            })
        );
        assert_eq!(store.len(), 3);

        // A batch that fits exactly is still accepted.
        let fits: Vec<_> = (10..12).map(|i| record(9, [3; 5], i)).collect();
        assert_eq!(store.bulk_insert(fits).await, Ok(2));
        assert_eq!(store.len(), 5);
        assert!(matches!(
            store.bulk_insert(batch(20)).await,
            Err(WriteError::CapacityExceeded { stored: 5, .. })
        ));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn unbounded_by_default() {
        assert_eq!(MemoryStore::new().capacity(), None);
        assert_eq!(MemoryStore::default().capacity(), None);
    }

    #[test]
    fn bulk_write_display_names_the_index() {
        let err = WriteError::BulkWrite {
            inserted: 4,
            errors: vec![DocumentError {
                index: 2,
                index_name: ID64_INDEX,
                key: "k".into(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "bulk write failed: 4 inserted, 1 rejected (first: duplicate key on unique_id64 at position 2 (k))"
        );
    }
}
