use std::fmt;

use crate::byte_order::{ByteOrder, NativeOrder};
use crate::error::{DvplError, Result};

/// Literal tag closing every DVPL container.
pub const MAGIC: &[u8; 4] = b"DVPL";

/// Fixed size of the trailing signature in bytes.
///   origin_size:u32 + compress_size:u32 + checksum:u32
///   + compress_level:u32 + magic[4]
///   = 4 + 4 + 4 + 4 + 4 = 20
pub const SIGNATURE_SIZE: usize = 20;

/// Inputs up to this many bytes are stored verbatim; compression is never
/// attempted on them.
pub const MAX_PLAIN_LEN: usize = 64;

/// Byte order of every integer field in the signature.
pub const WIRE_ORDER: ByteOrder = ByteOrder::Little;

// ── Compression level ───────────────────────────────────────────────────────

/// Label stored in the signature describing how the payload was written.
///
/// Decoding never branches on this field; it only records whether
/// compression shrank the data at encode time.
///
/// Levels compare by their wire value, so `Other(0)` equals `None` and
/// `Other(2)` equals `Low`, matching what a serialize/parse cycle yields.
#[derive(Debug, Clone, Copy)]
pub enum CompressLevel {
    /// Stored verbatim.
    None,
    /// LZ4 block compression.
    Low,
    /// Any other value written by a foreign producer.
    Other(u32),
}

impl CompressLevel {
    pub const NONE: u32 = 0;
    pub const LOW: u32 = 2;

    pub fn as_u32(self) -> u32 {
        match self {
            CompressLevel::None => Self::NONE,
            CompressLevel::Low => Self::LOW,
            CompressLevel::Other(raw) => raw,
        }
    }
}

impl PartialEq for CompressLevel {
    fn eq(&self, other: &Self) -> bool {
        self.as_u32() == other.as_u32()
    }
}

impl Eq for CompressLevel {}

impl From<u32> for CompressLevel {
    fn from(raw: u32) -> Self {
        match raw {
            Self::NONE => CompressLevel::None,
            Self::LOW => CompressLevel::Low,
            other => CompressLevel::Other(other),
        }
    }
}

impl fmt::Display for CompressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CompressLevel::from(self.as_u32()) {
            CompressLevel::None => write!(f, "none (0)"),
            CompressLevel::Low => write!(f, "lz4 (2)"),
            CompressLevel::Other(raw) => write!(f, "unknown ({})", raw),
        }
    }
}

// ── Signature ───────────────────────────────────────────────────────────────

/// Decoded representation of the 20-byte trailer closing a DVPL container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Length of the original, decompressed data.
    pub origin_size: u32,
    /// Length of the stored payload preceding the signature.
    pub compress_size: u32,
    /// CRC-32 of the stored payload.
    pub checksum: u32,
    pub compress_level: CompressLevel,
}

fn read_field(sign: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&sign[at..at + 4]);
    u32::from_ne_bytes(raw).to_native(WIRE_ORDER)
}

fn wire_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| DvplError::PayloadTooLarge { len })
}

impl Signature {
    /// Split `data` into its signature and the candidate stored payload.
    ///
    /// Only the trailer itself is validated here. Whether `compress_size`
    /// agrees with the returned payload length is left to the caller.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < SIGNATURE_SIZE {
            tracing::error!(len = data.len(), "dvpl signature cannot be loaded: buffer too short");
            return Err(DvplError::TooShort { len: data.len() });
        }

        let (payload, sign) = data.split_at(data.len() - SIGNATURE_SIZE);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&sign[16..20]);
        if &magic != MAGIC {
            tracing::error!(magic = ?magic, "buffer is not a dvpl container");
            return Err(DvplError::BadMagic { found: magic });
        }

        let signature = Self {
            origin_size: read_field(sign, 0),
            compress_size: read_field(sign, 4),
            checksum: read_field(sign, 8),
            compress_level: CompressLevel::from(read_field(sign, 12)),
        };
        tracing::debug!(
            origin_size = signature.origin_size,
            compress_size = signature.compress_size,
            "signature loaded"
        );

        Ok((signature, payload))
    }

    /// Describe the pair `(original, stored)` produced by an encode.
    ///
    /// Fails only when a length does not fit the 32-bit size fields.
    pub fn build(original: &[u8], stored: &[u8]) -> Result<Self> {
        let origin_size = wire_len(original.len())?;
        let compress_size = wire_len(stored.len())?;
        let compress_level = if origin_size > compress_size {
            CompressLevel::Low
        } else {
            CompressLevel::None
        };
        Ok(Self {
            origin_size,
            compress_size,
            checksum: crc32fast::hash(stored),
            compress_level,
        })
    }

    /// Serialize to exactly `SIGNATURE_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut buf = [0u8; SIGNATURE_SIZE];
        buf[0..4].copy_from_slice(&self.origin_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.compress_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        buf[12..16].copy_from_slice(&self.compress_level.as_u32().to_le_bytes());
        buf[16..20].copy_from_slice(MAGIC);
        buf
    }

    /// Whether the stored payload has to go through the decompressor.
    ///
    /// Driven only by size equality, never by `compress_level`.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.origin_size != self.compress_size
    }

    /// Check `stored` against the recorded CRC-32.
    pub fn verify_checksum(&self, stored: &[u8]) -> Result<()> {
        let actual = crc32fast::hash(stored);
        if actual != self.checksum {
            return Err(DvplError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin={} stored={} crc32={:08x} level={}",
            self.origin_size, self.compress_size, self.checksum, self.compress_level
        )
    }
}
