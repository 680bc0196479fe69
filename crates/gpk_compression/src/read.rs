//! Types for decoding compressed chunks
//!

use std::io::{Cursor, Seek, SeekFrom};
use std::mem;

use binrw::BinRead;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::{
    compression::CompressionMethod,
    error::{FormatError, Result},
    types::{BlockDescriptor, BlockSizes, CompressedBlockHeader},
};

/// The parsed layout of a compressed chunk
///
/// ```
/// # fn doit() -> gpk_compression::Result<()>
/// # {
/// use gpk_compression::{compress, BlockLayout, BlockWriterOptions, CompressionMethod};
///
/// let chunk = compress(b"Hello, World!", BlockWriterOptions::builder()
///            .method(CompressionMethod::None)
///            .block_size(8)
///            .build())?;
///
/// let layout = BlockLayout::parse(&chunk)?;
/// assert_eq!(layout.len(), 2);
/// assert_eq!(layout.decompressed_size(), 13);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    header: CompressedBlockHeader,
    descriptors: Vec<BlockDescriptor>,
}

impl BlockLayout {
    /// Read the prologue and block sizes of the chunk at the start of `source`, validating that
    /// the sizes agree with each other and that `source` holds every block payload.
    #[instrument(skip(source), fields(size = source.len()), err)]
    pub fn parse(source: &[u8]) -> Result<Self> {
        let header = CompressedBlockHeader::parse(source)?;
        let block_count = header.block_count()?;
        let header_size = header.header_size()?;
        if source.len() < header_size {
            return Err(FormatError::SizeMismatch {
                what: "block table",
                expected: header_size,
                actual: source.len(),
            });
        }

        let mut reader = Cursor::new(source);
        reader.seek(SeekFrom::Start(CompressedBlockHeader::SIZE as u64))?;

        let mut descriptors = Vec::with_capacity(block_count);
        let mut source_offset = header_size;
        let mut destination_offset = 0;
        for _ in 0..block_count {
            let sizes = BlockSizes::read(&mut reader)?;
            let descriptor = BlockDescriptor {
                source_offset,
                source_size: sizes.compressed as usize,
                destination_offset,
                destination_size: sizes.decompressed as usize,
            };
            source_offset += descriptor.source_size;
            destination_offset += descriptor.destination_size;
            descriptors.push(descriptor);
        }
        trace!("read {} block descriptors", descriptors.len());

        let compressed = source_offset - header_size;
        if compressed != header.total.compressed as usize {
            return Err(FormatError::SizeMismatch {
                what: "total compressed",
                expected: header.total.compressed as usize,
                actual: compressed,
            });
        }
        if destination_offset != header.total.decompressed as usize {
            return Err(FormatError::SizeMismatch {
                what: "total decompressed",
                expected: header.total.decompressed as usize,
                actual: destination_offset,
            });
        }
        if source.len() < source_offset {
            return Err(FormatError::SizeMismatch {
                what: "block payload",
                expected: source_offset,
                actual: source.len(),
            });
        }

        Ok(Self {
            header,
            descriptors,
        })
    }

    /// The chunk prologue
    pub fn header(&self) -> &CompressedBlockHeader {
        &self.header
    }

    /// Every block of the chunk, in order
    pub fn descriptors(&self) -> &[BlockDescriptor] {
        &self.descriptors
    }

    /// Number of blocks in the chunk
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the chunk contains no blocks
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Total size of the chunk once decoded
    pub fn decompressed_size(&self) -> usize {
        self.header.total.decompressed as usize
    }

    /// Number of bytes the chunk occupies in its source, header included
    pub fn encoded_size(&self) -> usize {
        self.descriptors
            .last()
            .map(|d| d.source_offset + d.source_size)
            .unwrap_or(CompressedBlockHeader::SIZE)
    }

    /// Decode every block of the chunk into `destination`.
    ///
    /// `destination` must be exactly [`BlockLayout::decompressed_size`] bytes long. A failing block fails
    /// the whole call; when decoding in parallel, which failing block gets reported is unspecified.
    pub fn decode_into(
        &self,
        source: &[u8],
        destination: &mut [u8],
        method: CompressionMethod,
        parallel: bool,
    ) -> Result<()> {
        if destination.len() != self.decompressed_size() {
            return Err(FormatError::SizeMismatch {
                what: "destination",
                expected: self.decompressed_size(),
                actual: destination.len(),
            });
        }

        let mut outputs = Vec::with_capacity(self.descriptors.len());
        let mut rest = destination;
        for descriptor in &self.descriptors {
            let (output, tail) = mem::take(&mut rest).split_at_mut(descriptor.destination_size);
            outputs.push(output);
            rest = tail;
        }

        let decode = |(index, (descriptor, output)): (usize, (&BlockDescriptor, &mut [u8]))| {
            trace!("decompressing block {index}: {descriptor:?}");
            method
                .decompress_block(&source[descriptor.source_range()], output)
                .map_err(|code| FormatError::CorruptBlock { index, code })
        };

        if parallel {
            self.descriptors
                .par_iter()
                .zip(outputs.into_par_iter())
                .enumerate()
                .try_for_each(decode)
        } else {
            self.descriptors
                .iter()
                .zip(outputs)
                .enumerate()
                .try_for_each(decode)
        }
    }
}

/// Decompress a chunk written with the default [`CompressionMethod`] into a new buffer.
///
/// Fails before decoding anything when the chunk decompresses to more than `capacity` bytes.
pub fn decompress(source: &[u8], capacity: usize, parallel: bool) -> Result<Vec<u8>> {
    decompress_with(source, capacity, CompressionMethod::default(), parallel)
}

/// Decompress a chunk compressed with `method` into a new buffer.
#[instrument(skip(source), fields(size = source.len()), err)]
pub fn decompress_with(
    source: &[u8],
    capacity: usize,
    method: CompressionMethod,
    parallel: bool,
) -> Result<Vec<u8>> {
    let layout = BlockLayout::parse(source)?;
    let required = layout.decompressed_size();
    if required > capacity {
        return Err(FormatError::CapacityExceeded { required, capacity });
    }

    let mut destination = vec![0u8; required];
    layout.decode_into(source, &mut destination, method, parallel)?;
    Ok(destination)
}

/// Decompress a chunk into the start of `destination`, returning the number of bytes written and the
/// number of source bytes consumed.
#[instrument(skip(source, destination), fields(size = source.len(), capacity = destination.len()), err)]
pub fn decompress_into(
    source: &[u8],
    destination: &mut [u8],
    method: CompressionMethod,
    parallel: bool,
) -> Result<(usize, usize)> {
    let layout = BlockLayout::parse(source)?;
    let required = layout.decompressed_size();
    if required > destination.len() {
        return Err(FormatError::CapacityExceeded {
            required,
            capacity: destination.len(),
        });
    }

    debug!(
        "decompressing {} blocks ({required} bytes) with {method:?}",
        layout.len()
    );
    layout.decode_into(source, &mut destination[..required], method, parallel)?;
    Ok((required, layout.encoded_size()))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::compression::CompressionMethod;
    use crate::error::{FormatError, Result};
    use crate::read::{decompress_with, BlockLayout};
    use crate::types::BlockDescriptor;

    #[rustfmt::skip]
    const STORED_CHUNK: [u8; 43] = [
        // Prologue
        0xC1, 0x83, 0x2A, 0x9E,
        0x06, 0x00, 0x00, 0x00,
        0x0B, 0x00, 0x00, 0x00,
        0x0B, 0x00, 0x00, 0x00,
        // Block sizes
        0x06, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00,
        0x05, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00,
        // Blocks
        0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20,
        0x57, 0x6F, 0x72, 0x6C, 0x64,
    ];

    #[test]
    fn read_stored_layout() -> Result<()> {
        let layout = BlockLayout::parse(&STORED_CHUNK)?;

        assert_eq!(
            layout.descriptors(),
            &[
                BlockDescriptor {
                    source_offset: 32,
                    source_size: 6,
                    destination_offset: 0,
                    destination_size: 6,
                },
                BlockDescriptor {
                    source_offset: 38,
                    source_size: 5,
                    destination_offset: 6,
                    destination_size: 5,
                },
            ]
        );
        assert_eq!(layout.encoded_size(), STORED_CHUNK.len());

        Ok(())
    }

    #[test]
    fn read_stored_chunk() -> Result<()> {
        for parallel in [false, true] {
            let output = decompress_with(&STORED_CHUNK, 11, CompressionMethod::None, parallel)?;
            assert_eq!(output, b"Hello World");
        }

        Ok(())
    }

    #[test]
    fn read_with_small_capacity() {
        assert!(matches!(
            decompress_with(&STORED_CHUNK, 10, CompressionMethod::None, false),
            Err(FormatError::CapacityExceeded {
                required: 11,
                capacity: 10
            })
        ));
    }

    #[test]
    fn read_truncated_payload() {
        assert!(matches!(
            BlockLayout::parse(&STORED_CHUNK[..40]),
            Err(FormatError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn read_mismatched_totals() {
        let mut input = STORED_CHUNK;
        // Claim 12 compressed bytes while the blocks only add up to 11
        input[8] = 0x0C;

        assert!(matches!(
            BlockLayout::parse(&input),
            Err(FormatError::SizeMismatch {
                what: "total compressed",
                ..
            })
        ));
    }

    #[test]
    fn read_empty_chunk() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0xC1, 0x83, 0x2A, 0x9E,
            0x00, 0x00, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let layout = BlockLayout::parse(&input)?;
        assert!(layout.is_empty());
        assert!(decompress_with(&input, 0, CompressionMethod::Lzo, true)?.is_empty());

        Ok(())
    }
}
