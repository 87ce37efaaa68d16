use crate::error::Result;

/// Narrow interface to an external block compressor.
///
/// Implementations must emit a bare block: no size prefix and no framing,
/// since the DVPL signature already records both the stored and the original
/// length. Any implementation must be able to decompress blocks written by
/// any other, which holds for every LZ4 block encoder.
pub trait BlockCompressor: Send + Sync {
    /// Human-readable name for logs and CLI display.
    fn name(&self) -> &'static str;

    /// Compress `raw` into a single independent block.
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decompress `stored` into at most `expected_size` bytes.
    ///
    /// The returned buffer may be shorter than `expected_size`; the caller is
    /// responsible for rejecting a length mismatch.
    fn decompress(&self, stored: &[u8], expected_size: u32) -> Result<Vec<u8>>;
}
