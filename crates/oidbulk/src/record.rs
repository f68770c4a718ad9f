use crate::{IdEncoder, ObjectId, Result};

/// Name of the collection records are written to.
pub const COLLECTION: &str = "products";

/// A generated record carrying three encodings of one [`ObjectId`].
///
/// - `primary_key`: 24-character hex string
/// - `id64`: compact, time-ordered 64-bit projection
/// - `id_wide`: lossless 96-bit projection
///
/// All three are unique at the storage layer. The only way to build a record
/// is from an [`ObjectId`], so `id64` and `id_wide` always describe the same
/// identifier.
///
/// With the `serde` feature the record serializes as the persisted document
/// `{"_id": "...", "id64": ..., "id_wide": "..."}`. `id_wide` is written as a
/// decimal string to keep all 96 bits through JSON.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodedRecord {
    #[cfg_attr(feature = "serde", serde(rename = "_id"))]
    primary_key: String,
    id64: i64,
    #[cfg_attr(feature = "serde", serde(with = "wide_decimal"))]
    id_wide: u128,
}

impl EncodedRecord {
    pub fn from_object_id(oid: &ObjectId) -> Self {
        Self {
            primary_key: oid.to_hex(),
            id64: IdEncoder::id64(oid),
            id_wide: IdEncoder::id_wide(oid),
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub const fn id64(&self) -> i64 {
        self.id64
    }

    pub const fn id_wide(&self) -> u128 {
        self.id_wide
    }

    /// The identifier this record was built from, recovered from `id_wide`.
    pub fn object_id(&self) -> ObjectId {
        let wide = self.id_wide.to_be_bytes();
        let mut bytes = [0_u8; 12];
        bytes.copy_from_slice(&wide[4..]);
        ObjectId::from_bytes(bytes)
    }
}

impl From<ObjectId> for EncodedRecord {
    fn from(oid: ObjectId) -> Self {
        Self::from_object_id(&oid)
    }
}

impl TryFrom<&[u8]> for EncodedRecord {
    type Error = crate::Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        ObjectId::try_from(bytes).map(|oid| Self::from_object_id(&oid))
    }
}

#[cfg(feature = "serde")]
mod wide_decimal {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        let value: u128 = raw.parse().map_err(D::Error::custom)?;
        if value >> 96 != 0 {
            return Err(D::Error::custom("id_wide exceeds 96 bits"));
        }
        Ok(value)
    }
}
