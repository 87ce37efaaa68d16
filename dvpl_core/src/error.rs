use std::path::PathBuf;

use thiserror::Error;

use crate::format::SIGNATURE_SIZE;

/// Failures surfaced while reading or producing a DVPL container.
///
/// All of them are deterministic validation failures over a fixed buffer,
/// so none is retried internally.
#[derive(Error, Debug)]
pub enum DvplError {
    #[error("buffer of {len} bytes is shorter than the {size}-byte DVPL signature", size = SIGNATURE_SIZE)]
    TooShort { len: usize },

    #[error("invalid magic {found:02x?}: not a DVPL container")]
    BadMagic { found: [u8; 4] },

    #[error("file corruption: signature declares {declared} stored bytes but {actual} precede it")]
    SizeMismatch { declared: u32, actual: usize },

    #[error("cannot decompress payload to {expected} bytes: {reason}")]
    DecompressionFailure { expected: u32, reason: String },

    #[error("checksum mismatch: signature says {expected:08x}, stored payload hashes to {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("payload of {len} bytes does not fit a 32-bit size field")]
    PayloadTooLarge { len: usize },

    #[error("{compressor} failed: {msg}")]
    Compression { compressor: &'static str, msg: String },

    #[error("file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DvplError>;
