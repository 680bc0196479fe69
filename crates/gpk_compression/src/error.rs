//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// The chunk does not start with the package magic
    #[error("invalid or corrupted compression chunk: bad magic")]
    #[diagnostic(help("compressed chunks must start with 0x9E2A83C1"))]
    BadMagic,

    /// A single block failed to decode
    #[error("corrupted compression block {index}. Code: {code}")]
    CorruptBlock {
        /// Position of the block inside its chunk
        index: usize,
        /// Error code reported by the block decompressor
        code: i32,
    },

    /// Sizes stored in the chunk disagree with each other or with the data available
    #[error("{what} size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Which size failed validation
        what: &'static str,
        /// The size required by the chunk
        expected: usize,
        /// The size actually present
        actual: usize,
    },

    /// The destination buffer cannot hold the decompressed chunk
    #[error("chunk decompresses to {required} bytes but the destination only holds {capacity}")]
    CapacityExceeded {
        /// Total decompressed size of the chunk
        required: usize,
        /// Size of the destination
        capacity: usize,
    },

    /// Block size of zero with a non-empty payload
    #[error("invalid block size {0}")]
    InvalidBlockSize(u32),

    /// Input is too large to be described by the 32-bit size fields
    #[error("{0} bytes cannot be stored in a compression chunk")]
    TooLarge(usize),

    /// The block compressor reported an error
    #[error("failed to compress block {index}. Code: {code}")]
    CompressFailed {
        /// Position of the block inside its chunk
        index: usize,
        /// Error code reported by the block compressor
        code: i32,
    },

    /// Unknown compression method value
    #[error("unknown compression method {0}")]
    UnknownMethod(u32),
}

impl From<binrw::Error> for FormatError {
    fn from(value: binrw::Error) -> Self {
        match value {
            binrw::Error::BadMagic { .. } => FormatError::BadMagic,
            binrw::Error::Io(e) => FormatError::IOError(e),
            e => FormatError::BinRWError(e),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, FormatError>;
