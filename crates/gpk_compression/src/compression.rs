//! Block compression and decompression handling.

use std::io::Write;

use binrw::{BinRead, BinWrite};
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use rust_lzo::{LZOContext, LZOError};

use crate::error::{FormatError, Result};

/// Generic failure code used when a decompressor does not report one of its own
const BLOCK_ERROR: i32 = -1;

/// `Z_DATA_ERROR`
const ZLIB_DATA_ERROR: i32 = -3;

/// Identifies the method used to compress every block of a package body
///
/// The value is stored in the package summary; compressed chunks themselves do not record it.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[brw(repr=u32)]
pub enum CompressionMethod {
    /// Stores the data as it is
    None = 0,

    /// Compress the data using Zlib. Its checksum rejects any corrupted block.
    #[default]
    Zlib = 1,

    /// Compress the data using LZO1X, as the game client does. A corrupted block may decode to
    /// wrong data without an error.
    Lzo = 2,
}

impl TryFrom<u32> for CompressionMethod {
    type Error = FormatError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zlib),
            2 => Ok(CompressionMethod::Lzo),
            other => Err(FormatError::UnknownMethod(other)),
        }
    }
}

fn lzo_worst_case(len: usize) -> usize {
    len + len / 16 + 64 + 3
}

impl CompressionMethod {
    /// Decode one block into `output`, which must be exactly the decompressed size of the block.
    ///
    /// On failure the decompressor's error code is returned.
    pub(crate) fn decompress_block(self, input: &[u8], output: &mut [u8]) -> core::result::Result<(), i32> {
        match self {
            CompressionMethod::None => {
                if input.len() != output.len() {
                    return Err(BLOCK_ERROR);
                }
                output.copy_from_slice(input);
                Ok(())
            }
            CompressionMethod::Zlib => {
                // The stream must end exactly at the end of the block, with its checksum verified
                let mut decoder = Decompress::new(true);
                match decoder.decompress(input, output, FlushDecompress::Finish) {
                    Ok(Status::StreamEnd) if decoder.total_out() == output.len() as u64 => Ok(()),
                    _ => Err(ZLIB_DATA_ERROR),
                }
            }
            CompressionMethod::Lzo => {
                let expected = output.len();
                let (decoded, result) = LZOContext::decompress_to_slice(input, output);
                let written = decoded.len();
                if result != LZOError::OK {
                    return Err(result as i32);
                }
                if written != expected {
                    return Err(BLOCK_ERROR);
                }
                Ok(())
            }
        }
    }

    /// Compress one block, returning its payload.
    pub(crate) fn compress_block(self, index: usize, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::None => Ok(input.to_vec()),
            CompressionMethod::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(input)?;
                Ok(encoder.finish()?)
            }
            CompressionMethod::Lzo => {
                let mut context = LZOContext::new();
                let mut output = vec![0u8; lzo_worst_case(input.len())];
                let (compressed, result) = context.compress_to_slice(input, &mut output);
                let written = compressed.len();
                if result != LZOError::OK {
                    return Err(FormatError::CompressFailed {
                        index,
                        code: result as i32,
                    });
                }
                output.truncate(written);
                Ok(output)
            }
        }
    }
}
