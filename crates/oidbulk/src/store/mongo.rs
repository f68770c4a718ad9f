//! MongoDB-backed [`BulkWriter`].
//!
//! Documents are written as
//! `{_id: ObjectId, id64: Int64, id_wide: Decimal128}` into the
//! [`COLLECTION`] collection. `id_wide` uses `Decimal128` because BSON has no
//! integer type wide enough for 96 bits; every value below `2^96` is exact
//! with exponent `0`.

use crate::{
    BulkWriter, COLLECTION, DocumentError, EncodedRecord, ID_WIDE_INDEX, ID64_INDEX,
    PRIMARY_KEY_INDEX, WriteError,
};
use core::future::Future;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{self, Decimal128, Document, doc},
    error::{Error as MongoError, ErrorKind},
    options::IndexOptions,
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Biased exponent of `10^0` in the IEEE 754-2008 decimal128 BID encoding.
const DECIMAL128_EXPONENT_BIAS: u128 = 6176;
/// Width of the coefficient field in the common BID form.
const DECIMAL128_COEFFICIENT_BITS: u32 = 113;

/// Writes records into a MongoDB collection with unordered `insert_many`.
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connects to `uri`, opens [`COLLECTION`] in `database`, and makes sure
    /// the unique indexes exist.
    ///
    /// # Errors
    ///
    /// [`WriteError::Unavailable`] if the URI is invalid, the server cannot
    /// be reached, or the indexes cannot be created.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, WriteError> {
        let client = Client::with_uri_str(uri).await.map_err(unavailable)?;
        let store = Self::from_collection(client.database(database).collection(COLLECTION));
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub const fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &str {
        self.collection.name()
    }

    /// Creates `unique_id64` and `unique_id_wide`. `_id_` always exists.
    /// Creating an index that already exists with the same spec is a no-op.
    pub async fn ensure_indexes(&self) -> Result<(), WriteError> {
        let unique = |field: &str, name: &str| {
            let mut keys = Document::new();
            keys.insert(field, 1_i32);
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(name.to_string())
                        .build(),
                )
                .build()
        };

        self.collection
            .create_indexes([unique("id64", ID64_INDEX), unique("id_wide", ID_WIDE_INDEX)])
            .await
            .map_err(unavailable)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Ensured indexes {}, {} and {} on collection {}",
            PRIMARY_KEY_INDEX,
            ID64_INDEX,
            ID_WIDE_INDEX,
            self.collection.name()
        );
        Ok(())
    }
}

impl BulkWriter for MongoStore {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move {
            if records.is_empty() {
                return Err(WriteError::EmptyBatch);
            }

            let documents: Vec<Document> = records.iter().map(to_document).collect();
            match self.collection.insert_many(documents).ordered(false).await {
                Ok(result) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "Inserted {} documents into collection {}",
                        result.inserted_ids.len(),
                        self.collection.name()
                    );
                    Ok(result.inserted_ids.len())
                }
                Err(err) => Err(write_error(&err, &records)),
            }
        }
    }
}

/// The persisted form of a record.
pub fn to_document(record: &EncodedRecord) -> Document {
    doc! {
        "_id": bson::oid::ObjectId::from_bytes(record.object_id().to_bytes()),
        "id64": record.id64(),
        "id_wide": wide_to_decimal128(record.id_wide()),
    }
}

/// Encodes an integer below `2^113` as an exact `Decimal128` with exponent 0.
pub fn wide_to_decimal128(value: u128) -> Decimal128 {
    let bits = (DECIMAL128_EXPONENT_BIAS << DECIMAL128_COEFFICIENT_BITS) | value;
    Decimal128::from_bytes(bits.to_le_bytes())
}

/// Decodes a `Decimal128` written by [`wide_to_decimal128`]. Returns `None`
/// for negative values, non-zero exponents, or coefficients of 96 bits or more.
pub fn decimal128_to_wide(value: &Decimal128) -> Option<u128> {
    let bits = u128::from_le_bytes(value.bytes());
    let coefficient = bits & ((1 << DECIMAL128_COEFFICIENT_BITS) - 1);
    let header = bits >> DECIMAL128_COEFFICIENT_BITS;

    (header == DECIMAL128_EXPONENT_BIAS && coefficient >> 96 == 0).then_some(coefficient)
}

/// Maps a driver error from an unordered insert of `records`.
///
/// Per-document write errors become [`WriteError::BulkWrite`]; every other
/// failure, including write-concern errors, is [`WriteError::Unavailable`].
fn write_error(err: &MongoError, records: &[EncodedRecord]) -> WriteError {
    let ErrorKind::InsertMany(failure) = err.kind.as_ref() else {
        return unavailable(err);
    };
    let Some(write_errors) = failure.write_errors.as_ref().filter(|e| !e.is_empty()) else {
        return unavailable(err);
    };

    let errors: Vec<DocumentError> = write_errors
        .iter()
        .map(|e| DocumentError {
            index: e.index,
            index_name: violated_index(e.code, &e.message),
            key: records
                .get(e.index)
                .map(|r| r.primary_key().to_owned())
                .unwrap_or_default(),
        })
        .collect();

    WriteError::BulkWrite {
        inserted: records.len().saturating_sub(errors.len()),
        errors,
    }
}

/// Names the unique index a write error refers to.
///
/// Duplicate key messages read `E11000 duplicate key error collection: ...
/// index: <name> dup key: ...`.
fn violated_index(code: i32, message: &str) -> &'static str {
    if code != DUPLICATE_KEY {
        return PRIMARY_KEY_INDEX;
    }
    if message.contains(ID_WIDE_INDEX) {
        ID_WIDE_INDEX
    } else if message.contains(ID64_INDEX) {
        ID64_INDEX
    } else {
        PRIMARY_KEY_INDEX
    }
}

fn unavailable(err: impl core::fmt::Display) -> WriteError {
    WriteError::Unavailable {
        reason: err.to_string(),
    }
}
