use dvpl_core::compressor::BlockCompressor;
use dvpl_core::error::{DvplError, Result};
use lz4_flex::block::{compress, decompress};

use crate::check_expansion;

/// Pure-Rust LZ4 block codec (`lz4_flex`).
///
/// Needs no C toolchain and compresses several times faster than the HC
/// codec at the cost of a larger stored payload. Blocks are plain LZ4, so
/// containers it writes decode with any other LZ4 compressor.
pub struct Lz4FastCompressor;

impl BlockCompressor for Lz4FastCompressor {
    fn name(&self) -> &'static str {
        "lz4-fast"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(compress(raw))
    }

    fn decompress(&self, stored: &[u8], expected_size: u32) -> Result<Vec<u8>> {
        check_expansion(self.name(), stored.len(), expected_size)?;
        decompress(stored, expected_size as usize).map_err(|e| DvplError::Compression {
            compressor: self.name(),
            msg: e.to_string(),
        })
    }
}
