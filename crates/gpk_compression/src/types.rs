//! Base types for structure of a compressed chunk.

use std::io::Cursor;
use std::ops::Range;

use binrw::{BinRead, BinWrite};

use crate::error::{FormatError, Result};

/// The magic tag every compressed chunk starts with. It is the same value as the package magic.
pub const COMPRESSED_BLOCK_MAGIC: u32 = 0x9E2A83C1;

/// Block size used by the game client when writing packages
pub const DEFAULT_BLOCK_SIZE: u32 = 0x20000;

/// A compressed/decompressed size pair
///
/// Used both for the totals in the prologue and for every block entry that follows it.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct BlockSizes {
    /// Size of the data after compression
    pub compressed: u32,

    /// Size of the data before compression
    pub decompressed: u32,
}

impl BlockSizes {
    /// Size of a serialized pair
    pub const SIZE: usize = 8;
}

/// Compressed chunk prologue
///
/// Always starts with [`COMPRESSED_BLOCK_MAGIC`]. All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(little, magic = 0x9E2A83C1u32)]
pub struct CompressedBlockHeader {
    /// The decompressed size of every block except possibly the last one
    pub block_size: u32,

    /// Sum of all the block sizes
    pub total: BlockSizes,
}

impl Default for CompressedBlockHeader {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            total: BlockSizes::default(),
        }
    }
}

impl CompressedBlockHeader {
    /// Size of the serialized prologue
    pub const SIZE: usize = 16;

    /// Read the prologue from the start of `source`.
    ///
    /// An input too short to hold the magic is reported as [`FormatError::BadMagic`].
    pub fn parse(source: &[u8]) -> Result<Self> {
        let magic = source
            .get(..4)
            .map(|m| u32::from_le_bytes([m[0], m[1], m[2], m[3]]));
        if magic != Some(COMPRESSED_BLOCK_MAGIC) {
            return Err(FormatError::BadMagic);
        }
        if source.len() < Self::SIZE {
            return Err(FormatError::SizeMismatch {
                what: "chunk prologue",
                expected: Self::SIZE,
                actual: source.len(),
            });
        }
        Ok(Self::read(&mut Cursor::new(source))?)
    }

    /// Number of blocks described by this prologue
    pub fn block_count(&self) -> Result<usize> {
        if self.total.decompressed == 0 {
            return Ok(0);
        }
        if self.block_size == 0 {
            return Err(FormatError::InvalidBlockSize(self.block_size));
        }
        Ok(self.total.decompressed.div_ceil(self.block_size) as usize)
    }

    /// Size of the prologue plus the block size pairs
    pub fn header_size(&self) -> Result<usize> {
        Ok(Self::SIZE + self.block_count()? * BlockSizes::SIZE)
    }
}

/// Location of a single block, derived from the size pairs
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Offset of the compressed payload from the start of the chunk
    pub source_offset: usize,
    /// Size of the compressed payload
    pub source_size: usize,
    /// Offset of the decoded data in the destination buffer
    pub destination_offset: usize,
    /// Size of the decoded data
    pub destination_size: usize,
}

impl BlockDescriptor {
    pub fn source_range(&self) -> Range<usize> {
        self.source_offset..self.source_offset + self.source_size
    }

    pub fn destination_range(&self) -> Range<usize> {
        self.destination_offset..self.destination_offset + self.destination_size
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use binrw::BinWrite;
    use pretty_assertions::assert_eq;

    use crate::error::{FormatError, Result};
    use crate::types::{BlockSizes, CompressedBlockHeader};

    #[test]
    fn read_header() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0xC1, 0x83, 0x2A, 0x9E,
            0x00, 0x00, 0x02, 0x00,
            0x13, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00,
        ];

        let expected = CompressedBlockHeader {
            block_size: 0x20000,
            total: BlockSizes {
                compressed: 19,
                decompressed: 11,
            },
        };

        assert_eq!(CompressedBlockHeader::parse(&input)?, expected);
        assert_eq!(expected.block_count()?, 1);
        assert_eq!(expected.header_size()?, 24);

        Ok(())
    }

    #[test]
    fn write_header() -> Result<()> {
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0xC1, 0x83, 0x2A, 0x9E,
            0x04, 0x00, 0x00, 0x00,
            0x0A, 0x00, 0x00, 0x00,
            0x0A, 0x00, 0x00, 0x00,
        ];

        let header = CompressedBlockHeader {
            block_size: 4,
            total: BlockSizes {
                compressed: 10,
                decompressed: 10,
            },
        };

        let mut actual = Vec::new();
        header.write(&mut Cursor::new(&mut actual))?;

        assert_eq!(actual, expected);
        assert_eq!(header.block_count()?, 3);

        Ok(())
    }

    #[test]
    fn read_block_sizes() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x13, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00,
        ]);

        assert_eq!(
            BlockSizes::read(&mut input)?,
            BlockSizes {
                compressed: 19,
                decompressed: 11
            }
        );

        Ok(())
    }

    #[test]
    fn read_invalid_magic() {
        #[rustfmt::skip]
        let input = [
            0xC1, 0x83, 0x2A, 0x9F,
            0x00, 0x00, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            CompressedBlockHeader::parse(&input),
            Err(FormatError::BadMagic)
        ));
    }

    #[test]
    fn read_empty_input() {
        assert!(matches!(
            CompressedBlockHeader::parse(&[]),
            Err(FormatError::BadMagic)
        ));
    }

    #[test]
    fn read_truncated_prologue() {
        let input = [0xC1, 0x83, 0x2A, 0x9E, 0x00, 0x00];

        assert!(matches!(
            CompressedBlockHeader::parse(&input),
            Err(FormatError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn zero_block_size_is_invalid() {
        let header = CompressedBlockHeader {
            block_size: 0,
            total: BlockSizes {
                compressed: 1,
                decompressed: 1,
            },
        };

        assert!(matches!(
            header.block_count(),
            Err(FormatError::InvalidBlockSize(0))
        ));
    }
}
