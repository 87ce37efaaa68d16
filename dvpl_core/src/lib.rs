pub mod byte_order;
pub mod compressor;
pub mod container;
pub mod error;
pub mod format;

pub use byte_order::{ByteOrder, NativeOrder};
pub use compressor::BlockCompressor;
pub use container::{read_container_file, DecodeOptions, DvplCodec};
pub use error::{DvplError, Result};
pub use format::{CompressLevel, Signature, MAGIC, MAX_PLAIN_LEN, SIGNATURE_SIZE};
