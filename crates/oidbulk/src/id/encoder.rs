//! Integer projections of an [`ObjectId`].
//!
//! Two encodings are derived from the same 12 bytes:
//!
//! - `id64`: a compact, lossy 64-bit value whose high 32 bits are the
//!   timestamp, so values sort chronologically across seconds.
//!
//!   ```text
//!    Bit:   63            32 31           8 7        0
//!           +---------------+--------------+----------+
//!    Field: | secs (32)     | counter (24) | tag (8)  |
//!           +---------------+--------------+----------+
//!   ```
//!
//!   The 5-byte process tag is folded into 8 bits, so two processes can share
//!   a tag. A tag that folds to `0` is stored as `1`; `0` means "unset".
//!
//! - `id_wide`: all 12 bytes read as one big-endian unsigned integer. This is
//!   a bijection on the raw bytes and is the canonical encoding.

use crate::{ObjectId, Result};

/// Stateless encoder for [`ObjectId`] projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdEncoder;

impl IdEncoder {
    /// Packs `secs << 32 | counter << 8 | tag` and reinterprets the result as
    /// a signed 64-bit integer, matching an INT64 storage column.
    #[inline]
    pub const fn id64(oid: &ObjectId) -> i64 {
        let secs = oid.timestamp() as u64;
        let counter = oid.counter() as u64;
        let tag = fold_to_8bit(&oid.process_tag()) as u64;
        ((secs << 32) | (counter << 8) | tag) as i64
    }

    /// Reads the 12 bytes as an unsigned big-endian integer in `0..2^96`.
    #[inline]
    pub fn id_wide(oid: &ObjectId) -> u128 {
        let mut buf = [0_u8; 16];
        buf[4..].copy_from_slice(oid.as_bytes());
        u128::from_be_bytes(buf)
    }

    /// Encodes raw bytes into `(id64, id_wide)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`](crate::Error::InvalidLength) unless
    /// `bytes` is exactly 12 bytes long.
    pub fn encode(bytes: &[u8]) -> Result<(i64, u128)> {
        let oid = ObjectId::try_from(bytes)?;
        Ok((Self::id64(&oid), Self::id_wide(&oid)))
    }

    /// Recovers the embedded seconds from an `id64` produced by
    /// [`IdEncoder::id64`].
    #[inline]
    pub const fn extract_timestamp_seconds(id64: i64) -> u32 {
        ((id64 as u64) >> 32) as u32
    }
}

/// `h = (h * 31 + byte) mod 256` over the tag, with `0` remapped to `1`.
const fn fold_to_8bit(tag: &[u8; 5]) -> u8 {
    let mut h: u32 = 0;
    let mut i = 0;
    while i < tag.len() {
        h = (h * 31 + tag[i] as u32) & 0xFF;
        i += 1;
    }
    if h == 0 { 1 } else { h as u8 }
}
