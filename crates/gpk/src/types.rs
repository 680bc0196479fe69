//! Base types for structure of a package file.

use std::fmt;

use binrw::{binrw, BinRead, BinWrite};
use gpk_compression::CompressionMethod;

use crate::string::FString;

/// The magic tag every package starts with
pub const PACKAGE_MAGIC: u32 = 0x9E2A83C1;

/// Decompressed size of every body chunk except possibly the last one
pub const PACKAGE_CHUNK_SIZE: usize = 0x10_0000;

bitflags::bitflags! {
    /// Package flags stored in the summary
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PackageFlags: u32 {
        const ALLOW_DOWNLOAD = 0x0000_0001;
        const CLIENT_OPTIONAL = 0x0000_0002;
        const SERVER_SIDE_ONLY = 0x0000_0004;
        const COOKED = 0x0000_0008;
        const UNSECURE = 0x0000_0010;
        const SAVED_WITH_NEWER_VERSION = 0x0000_0020;
        const NEED = 0x0000_8000;
        const COMPILING = 0x0001_0000;
        const CONTAINS_MAP = 0x0002_0000;
        const TRASH = 0x0004_0000;
        const DISALLOW_LAZY_LOADING = 0x0008_0000;
        const PLAY_IN_EDITOR = 0x0010_0000;
        const CONTAINS_SCRIPT = 0x0020_0000;
        const CONTAINS_DEBUG_INFO = 0x0040_0000;
        const REQUIRE_IMPORTS_ALREADY_LOADED = 0x0080_0000;
        const SELF_CONTAINED_LIGHTING = 0x0100_0000;
        /// The body is stored as compressed chunks
        const STORE_COMPRESSED = 0x0200_0000;
        const STORE_FULLY_COMPRESSED = 0x0400_0000;
        const CONTAINS_INLINED_SHADERS = 0x0800_0000;
        const CONTAINS_FACEFX_DATA = 0x1000_0000;
        const NO_EXPORT_ALLOWED = 0x2000_0000;
        const STRIPPED_SOURCE = 0x4000_0000;
    }
}

impl fmt::Display for PackageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// Location of a compressed chunk of the package body
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ChunkPointer {
    /// Offset of the chunk data in the decompressed body
    pub uncompressed_offset: u32,

    /// Size of the chunk data once decompressed
    pub uncompressed_size: u32,

    /// Offset of the chunk from the end of the summary
    pub compressed_offset: u32,

    /// Size of the chunk on disk, block table included
    pub compressed_size: u32,
}

/// Package file summary
///
/// Always starts with [`PACKAGE_MAGIC`]. All data is stored in little endian format
#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
#[brw(little, magic = 0x9E2A83C1u32)]
pub struct PackageSummary {
    pub file_version: u16,

    pub licensee_version: u16,

    #[br(map = PackageFlags::from_bits_retain)]
    #[bw(map = |flags: &PackageFlags| flags.bits())]
    pub flags: PackageFlags,

    /// Name the package was saved under
    pub name: FString,

    /// Method used for every block of every chunk
    pub compression: CompressionMethod,

    /// Size of the decompressed body
    pub body_size: u32,

    #[br(temp)]
    #[bw(calc = chunks.len() as u32)]
    chunk_count: u32,

    #[br(count = chunk_count)]
    pub chunks: Vec<ChunkPointer>,
}

impl Default for PackageSummary {
    fn default() -> Self {
        Self {
            file_version: 610,
            licensee_version: 14,
            flags: PackageFlags::empty(),
            name: FString::default(),
            compression: CompressionMethod::None,
            body_size: 0,
            chunks: Vec::new(),
        }
    }
}

impl PackageSummary {
    /// Whether the body is stored as compressed chunks
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(PackageFlags::STORE_COMPRESSED)
    }

    /// Number of bytes this summary occupies once serialized
    pub fn serialized_size(&self) -> usize {
        4 + 2 + 2 + 4 + self.name.serialized_size() + 4 + 4 + 4 + self.chunks.len() * 16
    }
}

/// One exported object of the object table
#[derive(BinRead, BinWrite, Debug, Default, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ObjectTableEntry {
    pub class: FString,

    pub name: FString,

    /// Full path of the object, may be empty
    pub object_path: FString,

    /// Object flags, passed through unchanged
    pub flags: u64,

    /// Offset of the payload from the start of the payload area
    pub serial_offset: u32,

    pub serial_size: u32,
}

/// A reference to an object living in another package
#[derive(BinRead, BinWrite, Debug, Default, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ImportEntry {
    pub package: FString,

    /// Index of the object in that package's object table
    pub object_index: u32,

    pub class: FString,
}

/// Export and import tables at the start of the package body
#[binrw]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ObjectTable {
    #[br(temp)]
    #[bw(calc = exports.len() as u32)]
    export_count: u32,

    #[br(count = export_count)]
    pub exports: Vec<ObjectTableEntry>,

    #[br(temp)]
    #[bw(calc = imports.len() as u32)]
    import_count: u32,

    #[br(count = import_count)]
    pub imports: Vec<ImportEntry>,
}

/// Where an [`ObjectRef`] points to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Null,
    Export(usize),
    Import(usize),
}

/// Signed object reference
///
/// `0` is null, `n > 0` refers to export `n - 1` of the same package and `n < 0` to import `-n - 1`.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct ObjectRef(pub i32);

impl ObjectRef {
    pub const NULL: ObjectRef = ObjectRef(0);

    pub fn export(index: usize) -> Self {
        Self(index as i32 + 1)
    }

    pub fn import(index: usize) -> Self {
        Self(-(index as i32) - 1)
    }

    pub fn target(self) -> RefTarget {
        match self.0 {
            0 => RefTarget::Null,
            n if n > 0 => RefTarget::Export(n as usize - 1),
            n => RefTarget::Import(n.unsigned_abs() as usize - 1),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            RefTarget::Null => f.write_str("null"),
            RefTarget::Export(i) => write!(f, "export:{i}"),
            RefTarget::Import(i) => write!(f, "import:{i}"),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::{BinRead, BinWrite};
    use gpk_compression::CompressionMethod;
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::types::{
        ChunkPointer, ImportEntry, ObjectRef, ObjectTable, ObjectTableEntry, PackageFlags,
        PackageSummary, RefTarget,
    };

    #[rustfmt::skip]
    const SUMMARY: [u8; 50] = [
        // Magic
        0xC1, 0x83, 0x2A, 0x9E,
        // Versions
        0x62, 0x02, 0x0E, 0x00,
        // Flags
        0x01, 0x00, 0x00, 0x02,
        // Name
        0x04, 0x00, 0x00, 0x00, 0x50, 0x6B, 0x67, 0x00,
        // Compression, body size, chunk count
        0x02, 0x00, 0x00, 0x00,
        0x00, 0x10, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00,
        // Chunk
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x10, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x40, 0x00, 0x00, 0x00,
        // Trailing
        0xFF, 0xFF,
    ];

    #[test]
    fn read_summary() -> Result<()> {
        let mut reader = Cursor::new(&SUMMARY[..]);
        let summary = PackageSummary::read(&mut reader)?;

        assert_eq!(
            summary,
            PackageSummary {
                file_version: 610,
                licensee_version: 14,
                flags: PackageFlags::ALLOW_DOWNLOAD | PackageFlags::STORE_COMPRESSED,
                name: "Pkg".into(),
                compression: CompressionMethod::Lzo,
                body_size: 0x1000,
                chunks: vec![ChunkPointer {
                    uncompressed_offset: 0,
                    uncompressed_size: 0x1000,
                    compressed_offset: 0,
                    compressed_size: 0x40,
                }],
            }
        );
        assert!(summary.is_compressed());
        assert_eq!(reader.position() as usize, summary.serialized_size());
        assert_eq!(summary.serialized_size(), 48);

        Ok(())
    }

    #[test]
    fn write_summary() -> Result<()> {
        let summary = PackageSummary::read(&mut Cursor::new(&SUMMARY[..]))?;

        let mut actual = Cursor::new(Vec::new());
        summary.write(&mut actual)?;
        assert_eq!(actual.into_inner(), SUMMARY[..48].to_vec());

        Ok(())
    }

    #[test]
    fn read_invalid_magic() {
        let mut input = SUMMARY;
        input[3] = 0x9F;

        assert!(matches!(
            PackageSummary::read(&mut Cursor::new(&input[..])),
            Err(binrw::Error::BadMagic { .. })
        ));
    }

    #[test]
    fn unknown_flags_are_kept() -> Result<()> {
        let mut input = SUMMARY;
        input[9] = 0x40;

        let summary = PackageSummary::read(&mut Cursor::new(&input[..]))?;
        assert_eq!(summary.flags.bits(), 0x0200_4001);

        Ok(())
    }

    #[test]
    fn read_object_table() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            // Export count
            0x01, 0x00, 0x00, 0x00,
            // Class, name, path
            0x02, 0x00, 0x00, 0x00, 0x41, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x42, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Flags
            0x01, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00,
            // Serial offset, serial size
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            // Import count
            0x01, 0x00, 0x00, 0x00,
            // Package, object index, class
            0x02, 0x00, 0x00, 0x00, 0x43, 0x00,
            0x03, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x44, 0x00,
        ];

        let table = ObjectTable::read(&mut Cursor::new(&input))?;
        assert_eq!(
            table,
            ObjectTable {
                exports: vec![ObjectTableEntry {
                    class: "A".into(),
                    name: "B".into(),
                    object_path: "".into(),
                    flags: 0x000F_0001,
                    serial_offset: 0,
                    serial_size: 4,
                }],
                imports: vec![ImportEntry {
                    package: "C".into(),
                    object_index: 3,
                    class: "D".into(),
                }],
            }
        );

        let mut actual = Cursor::new(Vec::new());
        table.write(&mut actual)?;
        assert_eq!(actual.into_inner(), input);

        Ok(())
    }

    #[test]
    fn object_ref_targets() {
        assert_eq!(ObjectRef::NULL.target(), RefTarget::Null);
        assert_eq!(ObjectRef(1).target(), RefTarget::Export(0));
        assert_eq!(ObjectRef(-1).target(), RefTarget::Import(0));
        assert_eq!(ObjectRef::export(4), ObjectRef(5));
        assert_eq!(ObjectRef::import(2), ObjectRef(-3));
        assert_eq!(ObjectRef::import(2).to_string(), "import:2");
    }

    #[test]
    fn flags_display() {
        let flags = PackageFlags::COOKED | PackageFlags::STORE_COMPRESSED;
        assert_eq!(flags.to_string(), "COOKED, STORE_COMPRESSED");
    }
}
