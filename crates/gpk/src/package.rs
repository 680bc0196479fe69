//! Types for reading, editing and saving packages
//!

use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use binrw::{BinRead, BinWrite};
use bon::Builder;
use gpk_compression::{compress, decompress_into, BlockWriterOptions, CompressionMethod};
use tracing::{debug, instrument, trace};

use crate::error::{Error, IndexError, Result};
use crate::object::{LoadState, Object, ObjectData, ObjectKind};
use crate::string::FString;
use crate::types::{
    ChunkPointer, ImportEntry, ObjectRef, ObjectTable, ObjectTableEntry, PackageFlags,
    PackageSummary, PACKAGE_CHUNK_SIZE,
};

/// Flags and destination of a single save
#[derive(Debug, Clone, Default, Builder)]
pub struct SaveContext {
    /// File the package is written to
    #[builder(into)]
    pub path: PathBuf,

    /// Store `<package>.<object>` as the object path of every export
    #[builder(default)]
    pub embed_object_path: bool,

    /// Clear the texture file cache name of every loaded texture so that mips are read inline
    #[builder(default)]
    pub disable_texture_caching: bool,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PackageState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidPackage(format!("{len} bytes do not fit in a package")))
}

/// A package and its object table
///
/// ```no_run
/// fn list_objects(path: &std::path::Path) -> gpk::error::Result<()> {
///     let mut package = gpk::Package::new("S1UI_Chat", path);
///     package.load()?;
///
///     for object in package.objects() {
///         println!("{}: {} ({})", object.index(), object.name(), object.class());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    path: PathBuf,
    state: PackageState,
    summary: PackageSummary,
    objects: Vec<Object>,
    imports: Vec<ImportEntry>,
    body: Vec<u8>,
    payload_start: usize,
}

impl Package {
    /// Create an unloaded package backed by the file at `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            state: PackageState::Unloaded,
            summary: PackageSummary::default(),
            objects: Vec::new(),
            imports: Vec::new(),
            body: Vec::new(),
            payload_start: 0,
        }
    }

    /// Create an empty, loaded package that only exists in memory.
    pub fn create(name: impl Into<String>, summary: PackageSummary) -> Self {
        Self {
            state: PackageState::Loaded,
            summary,
            ..Self::new(name, PathBuf::new())
        }
    }

    /// Parse a package from its serialized form.
    pub fn from_bytes(name: impl Into<String>, path: impl Into<PathBuf>, data: &[u8]) -> Result<Self> {
        let mut package = Self::new(name, path);
        package.read_from(data)?;
        package.state = PackageState::Loaded;
        Ok(package)
    }

    /// Read the package from its file. Loading a loaded package does nothing.
    #[instrument(skip(self), fields(package = %self.name), err)]
    pub fn load(&mut self) -> Result<()> {
        if self.state == PackageState::Loaded {
            return Ok(());
        }

        self.state = PackageState::Loading;
        let result = fs::read(&self.path)
            .map_err(Error::from)
            .and_then(|data| self.read_from(&data));
        self.state = match result {
            Ok(()) => PackageState::Loaded,
            Err(_) => PackageState::Unloaded,
        };
        result
    }

    fn read_from(&mut self, data: &[u8]) -> Result<()> {
        let mut reader = Cursor::new(data);
        let summary = PackageSummary::read(&mut reader).map_err(|e| match e {
            binrw::Error::BadMagic { .. } => Error::InvalidPackage("bad magic".into()),
            e => Error::from(e),
        })?;
        let summary_end = reader.position() as usize;
        debug!(
            "read summary of {}: {} chunks, {} body bytes",
            self.name,
            summary.chunks.len(),
            summary.body_size
        );

        let body = Self::read_body(&summary, &data[summary_end..])?;

        let mut reader = Cursor::new(body.as_slice());
        let table = ObjectTable::read(&mut reader)?;
        let payload_start = reader.position() as usize;
        for (index, entry) in table.exports.iter().enumerate() {
            let end = payload_start + entry.serial_offset as usize + entry.serial_size as usize;
            if end > body.len() {
                return Err(Error::InvalidPackage(format!(
                    "payload of object {index} ends at {end}, past the end of the body ({})",
                    body.len()
                )));
            }
        }
        trace!(
            "read {} exports and {} imports",
            table.exports.len(),
            table.imports.len()
        );

        self.objects = table
            .exports
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Object::new(index, entry))
            .collect();
        self.imports = table.imports;
        self.summary = summary;
        self.body = body;
        self.payload_start = payload_start;

        Ok(())
    }

    fn read_body(summary: &PackageSummary, area: &[u8]) -> Result<Vec<u8>> {
        let body_size = summary.body_size as usize;
        if !summary.is_compressed() {
            return area.get(..body_size).map(<[u8]>::to_vec).ok_or_else(|| {
                Error::InvalidPackage(format!(
                    "body is truncated: expected {body_size} bytes, found {}",
                    area.len()
                ))
            });
        }

        let mut body = vec![0u8; body_size];
        let mut offset = 0;
        for (index, chunk) in summary.chunks.iter().enumerate() {
            let size = chunk.uncompressed_size as usize;
            if chunk.uncompressed_offset as usize != offset || offset + size > body_size {
                return Err(Error::InvalidPackage(format!(
                    "chunk {index} does not continue the body at {offset}"
                )));
            }

            let start = chunk.compressed_offset as usize;
            let source = area
                .get(start..start + chunk.compressed_size as usize)
                .ok_or_else(|| Error::InvalidPackage(format!("chunk {index} is truncated")))?;

            trace!("decompressing chunk {index}: {chunk:?}");
            let (written, _) = decompress_into(
                source,
                &mut body[offset..offset + size],
                summary.compression,
                true,
            )?;
            if written != size {
                return Err(Error::InvalidPackage(format!(
                    "chunk {index} decompressed to {written} bytes instead of {size}"
                )));
            }
            offset += size;
        }

        if offset != body_size {
            return Err(Error::InvalidPackage(format!(
                "chunks cover {offset} of {body_size} body bytes"
            )));
        }
        Ok(body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the package is read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PackageState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == PackageState::Loaded
    }

    pub fn summary(&self) -> &PackageSummary {
        &self.summary
    }

    pub fn flags(&self) -> PackageFlags {
        self.summary.flags
    }

    /// Compression used for the body, if it is stored compressed
    pub fn compression(&self) -> Option<CompressionMethod> {
        self.summary
            .is_compressed()
            .then_some(self.summary.compression)
    }

    /// Choose how the body is stored on the next save. `None` stores it uncompressed.
    pub fn set_compression(&mut self, method: Option<CompressionMethod>) {
        match method {
            Some(method) => {
                self.summary.flags.insert(PackageFlags::STORE_COMPRESSED);
                self.summary.compression = method;
            }
            None => {
                self.summary.flags.remove(PackageFlags::STORE_COMPRESSED);
                self.summary.compression = CompressionMethod::None;
            }
        }
    }

    /// Every export, in table order
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    /// Number of exports
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.state != PackageState::Loaded {
            return Err(Error::NotLoaded(self.name.clone()));
        }
        Ok(())
    }

    fn index_error(&self, index: usize) -> Error {
        Error::Index(IndexError {
            package: self.name.clone(),
            index,
            count: self.objects.len(),
        })
    }

    /// Get an object by its table index, without loading it
    pub fn resolve(&self, index: usize) -> Result<&Object> {
        self.ensure_loaded()?;
        self.objects.get(index).ok_or_else(|| self.index_error(index))
    }

    /// Get a mutable object by its table index, without loading it
    pub fn resolve_mut(&mut self, index: usize) -> Result<&mut Object> {
        self.ensure_loaded()?;
        if index >= self.objects.len() {
            return Err(self.index_error(index));
        }
        Ok(&mut self.objects[index])
    }

    /// Find the index of an export by name, ignoring case
    pub fn find_object(&self, name: &str) -> Result<usize> {
        self.ensure_loaded()?;
        self.objects
            .iter()
            .position(|o| o.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ObjectNotFound {
                package: self.name.clone(),
                name: name.to_owned(),
            })
    }

    /// Resolve an import to the package name and object index it refers to
    pub fn import(&self, index: usize) -> Option<&ImportEntry> {
        self.imports.get(index)
    }

    fn stored_payload(&self, object: &Object) -> Result<&[u8]> {
        let start = self.payload_start + object.entry.serial_offset as usize;
        self.body
            .get(start..start + object.entry.serial_size as usize)
            .ok_or_else(|| {
                Error::InvalidPackage(format!("object {} has no stored payload", object.index))
            })
    }

    /// Decode the payload of an object. Objects are only decoded once.
    ///
    /// A payload that cannot be decoded marks the object as failed.
    pub fn load_object(&mut self, index: usize) -> Result<&mut Object> {
        self.resolve(index)?;
        if self.objects[index].data.is_some() {
            return Ok(&mut self.objects[index]);
        }

        let parsed = {
            let object = &self.objects[index];
            let payload = self.stored_payload(object)?;
            ObjectData::parse(&object.kind, payload)
        };

        let object = &mut self.objects[index];
        match parsed {
            Ok(data) => {
                trace!("loaded object {index} ({}) of {}", object.name(), self.name);
                object.set_data(data);
                Ok(object)
            }
            Err(source) => {
                object.state = LoadState::Failed;
                Err(Error::CorruptObject {
                    package: self.name.clone(),
                    object: object.name().to_owned(),
                    source,
                })
            }
        }
    }

    /// Add an object with a decoded payload, returning its index
    pub fn add_object(&mut self, class: &str, name: &str, flags: u64, data: ObjectData) -> usize {
        let index = self.objects.len();
        let mut object = Object::new(
            index,
            ObjectTableEntry {
                class: class.into(),
                name: name.into(),
                flags,
                ..Default::default()
            },
        );
        object.set_data(data);
        self.objects.push(object);
        index
    }

    /// Add an import, reusing an existing import of the same object
    pub fn add_import(&mut self, target: &ImportEntry) -> ObjectRef {
        let existing = self.imports.iter().position(|import| {
            import.package.eq_ignore_ascii_case(&target.package)
                && import.object_index == target.object_index
        });
        let index = existing.unwrap_or_else(|| {
            self.imports.push(target.clone());
            self.imports.len() - 1
        });
        ObjectRef::import(index)
    }

    /// Turn an object into a redirector to `target`, discarding its payload.
    ///
    /// A target in this package becomes an export reference, any other target an import. The target
    /// is not checked to exist.
    #[instrument(skip(self), fields(package = %self.name), err)]
    pub fn convert_to_redirector(&mut self, index: usize, target: &ImportEntry) -> Result<ObjectRef> {
        self.resolve(index)?;

        let reference = if target.package.eq_ignore_ascii_case(&self.name) {
            ObjectRef::export(target.object_index as usize)
        } else {
            self.add_import(target)
        };

        let object = &mut self.objects[index];
        object.set_class(ObjectKind::ObjectRedirector);
        object.set_data(ObjectData::Redirector(reference));
        debug!("object {index} now redirects to {reference}");

        Ok(reference)
    }

    /// Serialize the package.
    ///
    /// Objects that were never loaded are written exactly as they were read.
    #[instrument(skip(self, context), fields(package = %self.name), err)]
    pub fn to_bytes(&self, context: &SaveContext) -> Result<Vec<u8>> {
        self.ensure_loaded()?;

        let mut payloads = Vec::new();
        let mut exports = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let payload: Cow<[u8]> = match &object.data {
                Some(ObjectData::Texture(texture))
                    if context.disable_texture_caching
                        && !texture.texture_file_cache_name.is_empty() =>
                {
                    let mut texture = texture.clone();
                    texture.texture_file_cache_name = FString::default();
                    Cow::Owned(ObjectData::Texture(texture).to_bytes()?)
                }
                Some(data) => Cow::Owned(data.to_bytes()?),
                None => Cow::Borrowed(self.stored_payload(object)?),
            };

            let mut entry = object.entry.clone();
            entry.serial_offset = to_u32(payloads.len())?;
            entry.serial_size = to_u32(payload.len())?;
            if context.embed_object_path {
                entry.object_path = format!("{}.{}", self.name, object.name()).into();
            }
            payloads.extend_from_slice(&payload);
            exports.push(entry);
        }

        let table = ObjectTable {
            exports,
            imports: self.imports.clone(),
        };
        let mut writer = Cursor::new(Vec::new());
        table.write(&mut writer)?;
        let mut body = writer.into_inner();
        body.extend_from_slice(&payloads);

        let mut summary = PackageSummary {
            name: self.name.as_str().into(),
            body_size: to_u32(body.len())?,
            chunks: Vec::new(),
            ..self.summary.clone()
        };

        let data = if summary.is_compressed() {
            let mut data = Vec::new();
            for (index, chunk) in body.chunks(PACKAGE_CHUNK_SIZE).enumerate() {
                let compressed = compress(
                    chunk,
                    BlockWriterOptions::builder()
                        .method(summary.compression)
                        .build(),
                )?;
                summary.chunks.push(ChunkPointer {
                    uncompressed_offset: to_u32(index * PACKAGE_CHUNK_SIZE)?,
                    uncompressed_size: to_u32(chunk.len())?,
                    compressed_offset: to_u32(data.len())?,
                    compressed_size: to_u32(compressed.len())?,
                });
                data.extend_from_slice(&compressed);
            }
            debug!(
                "compressed {} body bytes into {} chunks",
                body.len(),
                summary.chunks.len()
            );
            data
        } else {
            body
        };

        let mut writer = Cursor::new(Vec::with_capacity(summary.serialized_size() + data.len()));
        summary.write(&mut writer)?;
        let mut output = writer.into_inner();
        output.extend_from_slice(&data);
        Ok(output)
    }

    /// Serialize the package and write it to `context.path`, creating missing directories.
    #[instrument(skip(self, context), fields(package = %self.name, path = %context.path.display()), err)]
    pub fn save(&self, context: &SaveContext) -> Result<()> {
        let data = self.to_bytes(context)?;
        if let Some(parent) = context.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&context.path, data)?;
        Ok(())
    }
}
