use crate::{Error, Result};
use core::fmt::{self, Write};
use core::str::FromStr;

/// Size in bytes of a raw [`ObjectId`].
pub const OBJECT_ID_LEN: usize = 12;

/// Largest value the 3-byte counter field can hold.
pub const MAX_COUNTER: u32 = 0x00FF_FFFF;

/// A 12-byte structured unique identifier.
///
/// ```text
///  Byte:   0       4                   9         12
///          +-------+-------------------+---------+
///  Field:  | secs  | process tag (5 B) | counter |
///          +-------+-------------------+---------+
/// ```
///
/// - `secs`: big-endian seconds since the Unix epoch
/// - `process tag`: random per machine/process, fixed for a generator
/// - `counter`: big-endian 24-bit counter, incremented per identifier
///
/// Values are immutable once produced. Uniqueness is the responsibility of the
/// [`IdentifierSource`](crate::IdentifierSource) that made them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Wraps raw bytes without interpretation.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Assembles an identifier from its three fields. Only the low 24 bits of
    /// `counter` are kept.
    pub const fn from_parts(timestamp: u32, process_tag: [u8; 5], counter: u32) -> Self {
        let ts = timestamp.to_be_bytes();
        let ctr = (counter & MAX_COUNTER).to_be_bytes();
        Self([
            ts[0],
            ts[1],
            ts[2],
            ts[3],
            process_tag[0],
            process_tag[1],
            process_tag[2],
            process_tag[3],
            process_tag[4],
            ctr[1],
            ctr[2],
            ctr[3],
        ])
    }

    pub const fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Seconds since the Unix epoch stored in bytes `0..4`.
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Machine/process tag stored in bytes `4..9`.
    pub const fn process_tag(&self) -> [u8; 5] {
        [self.0[4], self.0[5], self.0[6], self.0[7], self.0[8]]
    }

    /// 24-bit counter stored in bytes `9..12`.
    pub const fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.0[9], self.0[10], self.0[11]])
    }

    /// Lowercase hex form, always 24 characters.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(OBJECT_ID_LEN * 2);
        for byte in self.0 {
            // Writing into a String cannot fail.
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; OBJECT_ID_LEN] = bytes.try_into().map_err(|_| Error::InvalidLength {
            len: bytes.len(),
            expected: OBJECT_ID_LEN,
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidHex {
            input: s.to_owned(),
        };

        if s.len() != OBJECT_ID_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0_u8; OBJECT_ID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectId")
            .field("hex", &self.to_hex())
            .field("timestamp", &self.timestamp())
            .field("process_tag", &self.process_tag())
            .field("counter", &self.counter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: [u8; 12] = [
        0x65, 0x1f, 0x00, 0x2a, 0xde, 0xad, 0xbe, 0xef, 0x01, 0x12, 0x34, 0x56,
    ];

    #[test]
    fn fields_are_big_endian() {
        let oid = ObjectId::from_bytes(RAW);
        assert_eq!(oid.timestamp(), 0x651f_002a);
        assert_eq!(oid.process_tag(), [0xde, 0xad, 0xbe, 0xef, 0x01]);
        assert_eq!(oid.counter(), 0x12_3456);
    }

    #[test]
    fn from_parts_matches_layout() {
        let oid = ObjectId::from_parts(0x651f_002a, [0xde, 0xad, 0xbe, 0xef, 0x01], 0x12_3456);
        assert_eq!(oid.to_bytes(), RAW);
    }

    #[test]
    fn from_parts_truncates_counter_to_24_bits() {
        let oid = ObjectId::from_parts(0, [0; 5], 0xAB12_3456);
        assert_eq!(oid.counter(), 0x12_3456);
        assert_eq!(oid.timestamp(), 0);
    }

    #[test]
    fn hex_is_24_lowercase_chars() {
        let oid = ObjectId::from_bytes(RAW);
        assert_eq!(oid.to_hex(), "651f002adeadbeef01123456");
        assert_eq!(oid.to_string(), oid.to_hex());
        assert_eq!("651F002ADEADBEEF01123456".parse::<ObjectId>().unwrap(), oid);
    }

    #[test]
    fn rejects_wrong_length_slices() {
        let err = ObjectId::try_from(&RAW[..11]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLength {
                len: 11,
                expected: 12
            }
        ));

        let mut long = RAW.to_vec();
        long.push(0);
        assert!(ObjectId::try_from(long.as_slice()).is_err());
        assert!(ObjectId::try_from(&RAW[..]).is_ok());
    }

    #[test]
    fn rejects_bad_hex() {
        for input in [
            "",
            "651f002adeadbeef0112345",
            "651f002adeadbeef011234567",
            "zz1f002adeadbeef01123456",
            "é51f002adeadbeef0112345",
            "+f1f002adeadbeef01123456",
        ] {
            assert!(
                matches!(input.parse::<ObjectId>(), Err(Error::InvalidHex { .. })),
                "{input:?} should not parse"
            );
        }
    }
}
