//! This library handles reading and creating the compressed block chunks used inside **GPK** packages.
//!
//! # Compressed Chunk Format Documentation
//!
//! A GPK package body may be stored compressed. The body is split into one or more *chunks*, and every
//! chunk is a self-contained container of independently compressed *blocks*. Because each block can be
//! decoded without looking at any other block, decoding may happen on many threads at once.
//!
//! ## Chunk Structure
//!
//! A chunk consists of a prologue, followed by one size pair per block, followed by the block payloads.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x9E2A83C1, the package magic                     |
//! | 0x0004         | Block Size             | 4 bytes: Maximum decompressed size of a single block       |
//! | 0x0008         | Compressed Size        | 4 bytes: Sum of the compressed sizes of every block        |
//! | 0x000C         | Decompressed Size      | 4 bytes: Sum of the decompressed sizes of every block      |
//! | 0x0010         | Block Sizes            | 8 bytes per block: compressed size, decompressed size      |
//! | ...            | Block Payloads         | Compressed blocks, stored contiguously in block order      |
//!
//! The number of blocks is not stored. It is always `ceil(decompressed size / block size)`.
//!
//! ### Prologue
//!
//! - **Magic Number**: A 4-byte identifier set to `0x9E2A83C1`. A chunk with any other value is rejected.
//! - **Block Size**: The size every block decompresses to, except the last one which may be shorter.
//! - **Compressed Size**: The total size of the payload area that follows the size pairs.
//! - **Decompressed Size**: The total size of the data once every block has been decoded.
//!
//! ### Block Sizes
//!
//! One pair per block. Source offsets are cumulative: the first payload starts right after the last pair,
//! at `16 + block count * 8`, and each following payload starts where the previous one ended. Destination
//! offsets are cumulative in the same way, so the blocks exactly tile the decompressed buffer.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression Methods** (chosen by the package, not stored in the chunk):
//!   - `0`: None (blocks are stored as they are)
//!   - `1`: Zlib, the default. Its checksum catches any corrupted byte of a block
//!   - `2`: LZO1X, as used by the game. Corruption is only caught when it breaks the stream
//!

pub mod compression;
pub mod error;
pub mod read;
pub mod types;
pub mod write;

pub use compression::CompressionMethod;
pub use error::{FormatError, Result};
pub use read::{decompress, decompress_into, decompress_with, BlockLayout};
pub use types::{BlockDescriptor, BlockSizes, CompressedBlockHeader};
pub use write::{compress, BlockWriterOptions};
