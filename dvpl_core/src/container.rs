use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::Span;

use crate::compressor::BlockCompressor;
use crate::error::{DvplError, Result};
use crate::format::{Signature, MAX_PLAIN_LEN, SIGNATURE_SIZE};

/// Knobs applied on the read path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Reject containers whose stored payload does not hash to the
    /// signature's CRC-32. Off by default so existing containers with a
    /// stale checksum still decode.
    pub verify_checksum: bool,
}

/// Encoder/decoder for single-buffer DVPL containers.
///
/// # Layout
/// ```text
/// [STORED PAYLOAD: compress_size bytes]
/// [SIGNATURE: origin_size:u32 compress_size:u32 crc32:u32 level:u32 "DVPL"]
/// ```
///
/// The codec holds no per-call state: `encode` and `decode` are independent
/// request/response calls and may run concurrently on a shared instance.
/// Diagnostics are emitted inside the span supplied via [`with_span`], so each
/// instance can be routed to its own logging context.
///
/// [`with_span`]: DvplCodec::with_span
pub struct DvplCodec {
    compressor: Box<dyn BlockCompressor>,
    options: DecodeOptions,
    span: Span,
}

impl DvplCodec {
    pub fn new(compressor: Box<dyn BlockCompressor>) -> Self {
        let span = tracing::debug_span!("dvpl", compressor = compressor.name());
        Self {
            compressor,
            options: DecodeOptions::default(),
            span,
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Route this codec's log events through `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn compressor_name(&self) -> &'static str {
        self.compressor.name()
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Recover the original bytes from a full container.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let _enter = self.span.enter();

        let (sign, stored) = Signature::parse(data).inspect_err(|_| {
            tracing::error!("signature didn't load");
        })?;

        if sign.compress_size as usize != stored.len() {
            tracing::error!(
                declared = sign.compress_size,
                actual = stored.len(),
                "file corruption: stored size disagrees with signature"
            );
            return Err(DvplError::SizeMismatch {
                declared: sign.compress_size,
                actual: stored.len(),
            });
        }

        if self.options.verify_checksum {
            sign.verify_checksum(stored).inspect_err(|e| {
                tracing::error!(error = %e, "stored payload failed checksum verification");
            })?;
        }

        if !sign.is_compressed() {
            tracing::debug!(level = %sign.compress_level, "payload stored verbatim");
            return Ok(stored.to_vec());
        }

        tracing::debug!(level = %sign.compress_level, "decompressing payload");
        let raw = self
            .compressor
            .decompress(stored, sign.origin_size)
            .map_err(|e| {
                tracing::error!(error = %e, "block decompressor rejected payload");
                DvplError::DecompressionFailure {
                    expected: sign.origin_size,
                    reason: e.to_string(),
                }
            })?;
        if raw.len() != sign.origin_size as usize {
            tracing::error!(
                expected = sign.origin_size,
                actual = raw.len(),
                "decompressed size disagrees with signature"
            );
            return Err(DvplError::DecompressionFailure {
                expected: sign.origin_size,
                reason: format!("decompressor produced {} bytes", raw.len()),
            });
        }
        Ok(raw)
    }

    /// Wrap `raw` into a signed container.
    ///
    /// Inputs of at most [`MAX_PLAIN_LEN`] bytes are stored verbatim; larger
    /// ones go through the block compressor. A block exactly as long as the
    /// input is discarded in favour of the input itself: decode treats equal
    /// sizes as "stored verbatim" and would otherwise hand back the block.
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let _enter = self.span.enter();

        let compressed;
        let stored: &[u8] = if raw.len() > MAX_PLAIN_LEN {
            compressed = self
                .compressor
                .compress(raw)
                .inspect_err(|e| tracing::error!(error = %e, "block compressor failed"))?;
            if compressed.len() == raw.len() {
                tracing::debug!(len = raw.len(), "block as long as input, storing verbatim");
                raw
            } else {
                &compressed
            }
        } else {
            raw
        };

        let sign = Signature::build(raw, stored).inspect_err(|e| {
            tracing::error!(error = %e, "cannot sign payload");
        })?;
        tracing::debug!(%sign, "payload signed");

        let mut out = Vec::with_capacity(stored.len() + SIGNATURE_SIZE);
        out.extend_from_slice(stored);
        out.extend_from_slice(&sign.to_bytes());
        Ok(out)
    }

    /// Read the container at `path` and decode it.
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let data = {
            let _enter = self.span.enter();
            read_container_file(path)?
        };
        self.decode(&data)
    }

    /// Encode `raw` and write the container to `path`, replacing any
    /// existing file. Returns the container length.
    pub fn encode_file(&self, raw: &[u8], path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let container = self.encode(raw)?;
        fs::write(path, &container).map_err(|source| {
            let _enter = self.span.enter();
            tracing::error!(path = %path.display(), error = %source, "cannot write container");
            DvplError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(container.len())
    }
}

/// Read a whole file into memory.
///
/// A missing file is reported as [`DvplError::NotFound`]; every other
/// failure as [`DvplError::Io`].
pub fn read_container_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "cannot read file");
        if source.kind() == ErrorKind::NotFound {
            DvplError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DvplError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CompressLevel;

    /// Toy run-length compressor: `[count, byte]` pairs.
    struct RleCompressor;

    impl BlockCompressor for RleCompressor {
        fn name(&self) -> &'static str {
            "rle"
        }

        fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            let mut iter = raw.iter().peekable();
            while let Some(&b) = iter.next() {
                let mut run = 1u8;
                while run < u8::MAX && iter.peek() == Some(&&b) {
                    iter.next();
                    run += 1;
                }
                out.push(run);
                out.push(b);
            }
            Ok(out)
        }

        fn decompress(&self, stored: &[u8], expected_size: u32) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            for pair in stored.chunks(2) {
                if let &[run, b] = pair {
                    out.extend(std::iter::repeat(b).take(run as usize));
                }
                if out.len() > expected_size as usize {
                    out.truncate(expected_size as usize);
                    break;
                }
            }
            Ok(out)
        }
    }

    fn codec() -> DvplCodec {
        DvplCodec::new(Box::new(RleCompressor))
    }

    fn signed(stored: &[u8], sign: Signature) -> Vec<u8> {
        let mut out = stored.to_vec();
        out.extend_from_slice(&sign.to_bytes());
        out
    }

    #[test]
    fn small_input_is_stored_verbatim() {
        let container = codec().encode(b"\x01\x02\x03").unwrap();
        assert_eq!(container.len(), 3 + SIGNATURE_SIZE);
        assert_eq!(&container[..3], b"\x01\x02\x03");

        let (sign, _) = Signature::parse(&container).unwrap();
        assert_eq!(sign.origin_size, 3);
        assert_eq!(sign.compress_size, 3);
        assert_eq!(sign.compress_level, CompressLevel::None);
        assert_eq!(codec().decode(&container).unwrap(), b"\x01\x02\x03");
    }

    #[test]
    fn threshold_input_is_not_compressed() {
        let raw = [b'A'; MAX_PLAIN_LEN];
        let container = codec().encode(&raw).unwrap();
        assert_eq!(&container[..MAX_PLAIN_LEN], &raw[..]);
    }

    #[test]
    fn large_input_goes_through_compressor() {
        let raw = [b'A'; 100];
        let container = codec().encode(&raw).unwrap();
        let (sign, stored) = Signature::parse(&container).unwrap();
        assert_eq!(stored, &[100, b'A']);
        assert_eq!(sign.compress_level, CompressLevel::Low);
        assert_eq!(sign.checksum, crc32fast::hash(stored));
        assert_eq!(codec().decode(&container).unwrap(), raw);
    }

    #[test]
    fn empty_input_round_trips() {
        let container = codec().encode(&[]).unwrap();
        assert_eq!(container.len(), SIGNATURE_SIZE);
        assert!(codec().decode(&container).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_declared_size_mismatch() {
        let sign = Signature {
            origin_size: 10,
            compress_size: 10,
            checksum: 0,
            compress_level: CompressLevel::None,
        };
        let err = codec().decode(&signed(&[1u8; 5], sign)).unwrap_err();
        assert!(matches!(
            err,
            DvplError::SizeMismatch {
                declared: 10,
                actual: 5
            }
        ));
    }

    #[test]
    fn decode_ignores_level_when_sizes_match() {
        let sign = Signature {
            origin_size: 4,
            compress_size: 4,
            checksum: 0,
            compress_level: CompressLevel::Low,
        };
        let out = codec().decode(&signed(b"\x04abc", sign)).unwrap();
        assert_eq!(out, b"\x04abc");
    }

    #[test]
    fn decode_detects_short_decompression() {
        let sign = Signature {
            origin_size: 50,
            compress_size: 2,
            checksum: 0,
            compress_level: CompressLevel::Low,
        };
        let err = codec().decode(&signed(&[10, b'z'], sign)).unwrap_err();
        match err {
            DvplError::DecompressionFailure { expected, reason } => {
                assert_eq!(expected, 50);
                assert!(reason.contains("10 bytes"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn checksum_is_only_checked_when_requested() {
        let sign = Signature {
            origin_size: 3,
            compress_size: 3,
            checksum: 0x1234_5678,
            compress_level: CompressLevel::None,
        };
        let data = signed(b"abc", sign);
        assert_eq!(codec().decode(&data).unwrap(), b"abc");

        let strict = codec().with_options(DecodeOptions {
            verify_checksum: true,
        });
        assert!(matches!(
            strict.decode(&data),
            Err(DvplError::ChecksumMismatch { expected: 0x1234_5678, .. })
        ));

        let good = strict.encode(b"abc").unwrap();
        assert_eq!(strict.decode(&good).unwrap(), b"abc");
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("dvpl_core_unit_missing.dvpl");
        let _ = fs::remove_file(&path);
        assert!(matches!(
            codec().decode_file(&path),
            Err(DvplError::NotFound { .. })
        ));
    }

    /// Emits a block exactly as long as its input.
    struct SameLengthCompressor;

    impl BlockCompressor for SameLengthCompressor {
        fn name(&self) -> &'static str {
            "same-length"
        }

        fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
            Ok(raw.iter().map(|b| b ^ 0x5a).collect())
        }

        fn decompress(&self, stored: &[u8], _expected_size: u32) -> Result<Vec<u8>> {
            Ok(stored.iter().map(|b| b ^ 0x5a).collect())
        }
    }

    #[test]
    fn equal_length_block_falls_back_to_raw() {
        let codec = DvplCodec::new(Box::new(SameLengthCompressor));
        let raw: Vec<u8> = (0..200u32).map(|i| (i * 7) as u8).collect();

        let container = codec.encode(&raw).unwrap();
        let (sign, stored) = Signature::parse(&container).unwrap();
        assert_eq!(stored, raw.as_slice());
        assert_eq!(sign.compress_level, CompressLevel::None);
        assert_eq!(sign.checksum, crc32fast::hash(&raw));
        assert_eq!(codec.decode(&container).unwrap(), raw);
    }

    #[test]
    fn decompressor_error_is_a_decompression_failure() {
        struct Refusing;

        impl BlockCompressor for Refusing {
            fn name(&self) -> &'static str {
                "refusing"
            }

            fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
                Ok(raw.to_vec())
            }

            fn decompress(&self, _stored: &[u8], _expected_size: u32) -> Result<Vec<u8>> {
                Err(DvplError::Compression {
                    compressor: "refusing",
                    msg: "corrupt block".into(),
                })
            }
        }

        let sign = Signature {
            origin_size: 40,
            compress_size: 3,
            checksum: 0,
            compress_level: CompressLevel::Low,
        };
        let err = DvplCodec::new(Box::new(Refusing))
            .decode(&signed(b"xyz", sign))
            .unwrap_err();
        match err {
            DvplError::DecompressionFailure { expected, reason } => {
                assert_eq!(expected, 40);
                assert!(reason.contains("corrupt block"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn codec_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DvplCodec>();
    }
}
