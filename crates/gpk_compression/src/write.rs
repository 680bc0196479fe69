//! Types for creating compressed chunks
//!

use std::io::Cursor;

use binrw::BinWrite;
use bon::Builder;
use rayon::prelude::*;
use tracing::instrument;

use crate::compression::CompressionMethod;
use crate::error::{FormatError, Result};
use crate::types::{BlockSizes, CompressedBlockHeader, DEFAULT_BLOCK_SIZE};

/// Options for how a chunk should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct BlockWriterOptions {
    /// The compression method to use for every block
    #[builder(default)]
    pub method: CompressionMethod,

    /// The decompressed size of each block
    #[builder(default = DEFAULT_BLOCK_SIZE)]
    pub block_size: u32,

    /// Compress blocks on the rayon thread pool
    #[builder(default = true)]
    pub parallel: bool,
}

impl Default for BlockWriterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FormatError::TooLarge(len))
}

/// Compress `data` into a single chunk.
///
/// Every block is compressed on its own; the prologue and block sizes are written before any payload.
///
/// ```
/// # fn doit() -> gpk_compression::Result<()>
/// # {
/// use gpk_compression::{compress, decompress, BlockWriterOptions};
///
/// let data = b"Hello, World!".repeat(100);
/// let chunk = compress(&data, BlockWriterOptions::builder().block_size(256).build())?;
///
/// assert_eq!(decompress(&chunk, data.len(), true)?, data);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[instrument(skip(data), fields(size = data.len()), err)]
pub fn compress(data: &[u8], options: BlockWriterOptions) -> Result<Vec<u8>> {
    if options.block_size == 0 {
        return Err(FormatError::InvalidBlockSize(options.block_size));
    }
    let decompressed = to_u32(data.len())?;
    let block_size = options.block_size as usize;
    let method = options.method;

    let blocks: Vec<Vec<u8>> = if options.parallel {
        data.par_chunks(block_size)
            .enumerate()
            .map(|(index, block)| method.compress_block(index, block))
            .collect::<Result<_>>()?
    } else {
        data.chunks(block_size)
            .enumerate()
            .map(|(index, block)| method.compress_block(index, block))
            .collect::<Result<_>>()?
    };

    let compressed = to_u32(blocks.iter().map(Vec::len).sum())?;
    let header = CompressedBlockHeader {
        block_size: options.block_size,
        total: BlockSizes {
            compressed,
            decompressed,
        },
    };

    let capacity = CompressedBlockHeader::SIZE
        + blocks.len() * BlockSizes::SIZE
        + compressed as usize;
    let mut writer = Cursor::new(Vec::with_capacity(capacity));
    header.write(&mut writer)?;
    for (block, input) in blocks.iter().zip(data.chunks(block_size)) {
        BlockSizes {
            compressed: to_u32(block.len())?,
            decompressed: to_u32(input.len())?,
        }
        .write(&mut writer)?;
    }

    let mut chunk = writer.into_inner();
    for block in &blocks {
        chunk.extend_from_slice(block);
    }

    Ok(chunk)
}
