mod lz4_fast;
mod lz4_hc;

pub use lz4_fast::Lz4FastCompressor;
pub use lz4_hc::{Lz4HcCompressor, DEFAULT_HC_LEVEL};

use dvpl_core::{BlockCompressor, DvplCodec, DvplError};

/// Upper bound on LZ4 output bytes per input byte.
///
/// Every additional 255 bytes of a match or literal run costs one input
/// byte, so a block of `n` bytes never decodes to more than `255 * n`.
pub const LZ4_MAX_EXPANSION: usize = 255;

/// Reject an `expected_size` no LZ4 block of `stored_len` bytes can reach,
/// before an output buffer of that size is allocated.
pub(crate) fn check_expansion(
    compressor: &'static str,
    stored_len: usize,
    expected_size: u32,
) -> dvpl_core::Result<()> {
    let limit = stored_len.saturating_mul(LZ4_MAX_EXPANSION);
    if expected_size as usize > limit {
        return Err(DvplError::Compression {
            compressor,
            msg: format!(
                "expected size {} exceeds the {} bytes a {}-byte block can hold",
                expected_size, limit, stored_len
            ),
        });
    }
    Ok(())
}

/// Names accepted by [`compressor_by_name`].
pub const COMPRESSOR_NAMES: &[&str] = &["hc", "fast"];

/// Resolve a compressor from its short CLI name.
pub fn compressor_by_name(name: &str) -> Option<Box<dyn BlockCompressor>> {
    match name {
        "hc" | "lz4-hc" => Some(Box::new(Lz4HcCompressor::default())),
        "fast" | "lz4-fast" | "lz4" => Some(Box::new(Lz4FastCompressor)),
        _ => None,
    }
}

/// Codec configured the way existing DVPL producers write containers.
pub fn default_codec() -> DvplCodec {
    DvplCodec::new(Box::new(Lz4HcCompressor::default()))
}
