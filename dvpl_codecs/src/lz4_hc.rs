use dvpl_core::compressor::BlockCompressor;
use dvpl_core::error::{DvplError, Result};
use lz4::block::{compress, decompress, CompressionMode};

use crate::check_expansion;

/// LZ4 HC level used for every DVPL written by this crate.
pub const DEFAULT_HC_LEVEL: i32 = 2;

/// LZ4 high-compression block codec (liblz4 via the `lz4` crate).
///
/// Best ratio of the bundled compressors and the configuration existing
/// DVPL producers use. Decoding cost is the same as for plain LZ4.
pub struct Lz4HcCompressor {
    /// HC level (1 = fastest / larger, 12 = slowest / smallest).
    pub level: i32,
}

impl Default for Lz4HcCompressor {
    fn default() -> Self {
        Self {
            level: DEFAULT_HC_LEVEL,
        }
    }
}

impl Lz4HcCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCompressor for Lz4HcCompressor {
    fn name(&self) -> &'static str {
        "lz4-hc"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        compress(raw, Some(CompressionMode::HIGHCOMPRESSION(self.level)), false).map_err(|e| {
            DvplError::Compression {
                compressor: self.name(),
                msg: e.to_string(),
            }
        })
    }

    fn decompress(&self, stored: &[u8], expected_size: u32) -> Result<Vec<u8>> {
        check_expansion(self.name(), stored.len(), expected_size)?;
        let size = i32::try_from(expected_size).map_err(|_| DvplError::Compression {
            compressor: self.name(),
            msg: format!("expected size {} exceeds liblz4 limits", expected_size),
        })?;
        decompress(stored, Some(size)).map_err(|e| DvplError::Compression {
            compressor: self.name(),
            msg: e.to_string(),
        })
    }
}
