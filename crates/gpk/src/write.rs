//! Types for creating packages from scratch
//!

use std::path::Path;

use bon::Builder;
use gpk_compression::CompressionMethod;
use tracing::instrument;

use crate::error::Result;
use crate::object::ObjectData;
use crate::package::{Package, SaveContext};
use crate::types::{ImportEntry, ObjectRef, PackageFlags, PackageSummary};

/// Options for how the package should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct PackageWriterOptions {
    /// Compression of the package body, `None` stores it uncompressed
    pub compression: Option<CompressionMethod>,

    #[builder(default = 610)]
    pub file_version: u16,

    #[builder(default = 14)]
    pub licensee_version: u16,

    /// Extra package flags. [`PackageFlags::STORE_COMPRESSED`] is managed by the writer.
    #[builder(default)]
    pub flags: PackageFlags,
}

/// Package generator
///
/// ```
/// # fn doit() -> gpk::error::Result<()>
/// # {
/// use gpk::{CompressionMethod, ObjectData, Package, PackageWriter, PackageWriterOptions};
///
/// let mut writer = PackageWriter::new("Pkg1", PackageWriterOptions::builder()
///            .compression(CompressionMethod::Lzo)
///            .build());
///
/// writer.add_object("Material", "M_Default", ObjectData::Raw(b"Hello, World!".to_vec()));
///
/// let bytes = writer.finish()?;
/// let package = Package::from_bytes("Pkg1", "Pkg1.gpk", &bytes)?;
/// assert_eq!(package.find_object("m_default")?, 0);
///
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct PackageWriter {
    package: Package,
}

impl PackageWriter {
    pub fn new(name: impl Into<String>, options: PackageWriterOptions) -> PackageWriter {
        let mut package = Package::create(
            name,
            PackageSummary {
                file_version: options.file_version,
                licensee_version: options.licensee_version,
                flags: options.flags,
                ..Default::default()
            },
        );
        package.set_compression(options.compression);

        PackageWriter { package }
    }

    /// Add an export, returning the reference other objects of the package can use for it.
    pub fn add_object(&mut self, class: &str, name: &str, data: ObjectData) -> ObjectRef {
        self.add_object_with_flags(class, name, 0, data)
    }

    pub fn add_object_with_flags(
        &mut self,
        class: &str,
        name: &str,
        flags: u64,
        data: ObjectData,
    ) -> ObjectRef {
        ObjectRef::export(self.package.add_object(class, name, flags, data))
    }

    /// Add an import of `object_index` from `package`
    pub fn add_import(&mut self, package: &str, object_index: u32, class: &str) -> ObjectRef {
        self.package.add_import(&ImportEntry {
            package: package.into(),
            object_index,
            class: class.into(),
        })
    }

    /// Number of exports added so far
    pub fn len(&self) -> usize {
        self.package.len()
    }

    pub fn is_empty(&self) -> bool {
        self.package.is_empty()
    }

    /// Serialize the package
    pub fn finish(self) -> Result<Vec<u8>> {
        self.package.to_bytes(&SaveContext::default())
    }

    /// Serialize the package into a file
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<()> {
        self.package
            .save(&SaveContext::builder().path(path.as_ref()).build())
    }

    /// Keep editing the package in memory instead of serializing it
    pub fn into_package(self) -> Package {
        self.package
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::object::ObjectData;
    use crate::package::Package;
    use crate::types::{ObjectRef, PackageFlags};
    use crate::write::{PackageWriter, PackageWriterOptions};
    use gpk_compression::CompressionMethod;

    #[traced_test]
    #[test]
    fn write_empty_package() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0xC1, 0x83, 0x2A, 0x9E,
            0x62, 0x02, 0x0E, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Name
            0x02, 0x00, 0x00, 0x00, 0x45, 0x00,
            // Compression, body size, chunk count
            0x00, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Body
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let writer = PackageWriter::new("E", PackageWriterOptions::builder().build());
        assert!(writer.is_empty());
        assert_eq!(writer.finish()?, expected);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn write_compressed_package() -> Result<()> {
        let mut writer = PackageWriter::new(
            "C",
            PackageWriterOptions::builder()
                .compression(CompressionMethod::Zlib)
                .flags(PackageFlags::COOKED)
                .build(),
        );
        let first = writer.add_object("Material", "A", ObjectData::Raw(vec![7; 64]));
        let import = writer.add_import("Other", 2, "Texture2D");
        writer.add_object("ObjectRedirector", "B", ObjectData::Redirector(first));
        writer.add_object("ObjectRedirector", "C", ObjectData::Redirector(import));

        let bytes = writer.finish()?;
        let mut package = Package::from_bytes("C", "", &bytes)?;
        assert_eq!(package.compression(), Some(CompressionMethod::Zlib));
        assert!(package.flags().contains(PackageFlags::COOKED));
        assert_eq!(package.summary().chunks.len(), 1);
        assert_eq!(package.len(), 3);

        assert_eq!(package.load_object(1)?.redirect_target(), Some(ObjectRef::export(0)));
        assert_eq!(package.load_object(2)?.redirect_target(), Some(ObjectRef::import(0)));
        assert_eq!(package.import(0).map(|i| i.package.as_str()), Some("Other"));

        Ok(())
    }
}
