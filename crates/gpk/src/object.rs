//! Objects of a package and their lazily decoded payloads

use std::fmt;
use std::io::Cursor;

use binrw::{BinRead, BinResult, BinWrite};

use crate::sound::SoundNodeWave;
use crate::texture::Texture2D;
use crate::types::{ObjectRef, ObjectTableEntry};

pub const TEXTURE2D_CLASS: &str = "Texture2D";
pub const SOUND_NODE_WAVE_CLASS: &str = "SoundNodeWave";
pub const OBJECT_REDIRECTOR_CLASS: &str = "ObjectRedirector";

/// What an object is, resolved from its class name when the table is read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Texture2D,
    SoundNodeWave,
    ObjectRedirector,
    Other(String),
}

impl ObjectKind {
    pub fn from_class(class: &str) -> Self {
        if class.eq_ignore_ascii_case(TEXTURE2D_CLASS) {
            ObjectKind::Texture2D
        } else if class.eq_ignore_ascii_case(SOUND_NODE_WAVE_CLASS) {
            ObjectKind::SoundNodeWave
        } else if class.eq_ignore_ascii_case(OBJECT_REDIRECTOR_CLASS) {
            ObjectKind::ObjectRedirector
        } else {
            ObjectKind::Other(class.to_owned())
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            ObjectKind::Texture2D => TEXTURE2D_CLASS,
            ObjectKind::SoundNodeWave => SOUND_NODE_WAVE_CLASS,
            ObjectKind::ObjectRedirector => OBJECT_REDIRECTOR_CLASS,
            ObjectKind::Other(class) => class,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

/// Decoded payload of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    Texture(Texture2D),
    Sound(SoundNodeWave),
    Redirector(ObjectRef),
    Raw(Vec<u8>),
}

impl ObjectData {
    /// Decode a payload according to the object's kind. The payload must be consumed entirely.
    pub fn parse(kind: &ObjectKind, payload: &[u8]) -> BinResult<Self> {
        let mut reader = Cursor::new(payload);
        let data = match kind {
            ObjectKind::Texture2D => ObjectData::Texture(Texture2D::read(&mut reader)?),
            ObjectKind::SoundNodeWave => ObjectData::Sound(SoundNodeWave::read(&mut reader)?),
            ObjectKind::ObjectRedirector => ObjectData::Redirector(ObjectRef::read(&mut reader)?),
            ObjectKind::Other(_) => return Ok(ObjectData::Raw(payload.to_vec())),
        };

        let consumed = reader.position();
        if consumed != payload.len() as u64 {
            return Err(binrw::Error::AssertFail {
                pos: consumed,
                message: format!("{} trailing bytes after {kind} payload", payload.len() as u64 - consumed),
            });
        }
        Ok(data)
    }

    /// Serialize the payload
    pub fn to_bytes(&self) -> BinResult<Vec<u8>> {
        let mut writer = Cursor::new(Vec::new());
        match self {
            ObjectData::Texture(texture) => texture.write(&mut writer)?,
            ObjectData::Sound(sound) => sound.write(&mut writer)?,
            ObjectData::Redirector(target) => target.write(&mut writer)?,
            ObjectData::Raw(data) => return Ok(data.clone()),
        }
        Ok(writer.into_inner())
    }
}

/// An exported object
///
/// Objects are created from the object table with no payload. The payload is decoded on the first
/// call to [`crate::Package::load_object`].
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) index: usize,
    pub(crate) entry: ObjectTableEntry,
    pub(crate) kind: ObjectKind,
    pub(crate) state: LoadState,
    pub(crate) data: Option<ObjectData>,
}

impl Object {
    pub(crate) fn new(index: usize, entry: ObjectTableEntry) -> Self {
        Self {
            index,
            kind: ObjectKind::from_class(&entry.class),
            entry,
            state: LoadState::NotLoaded,
            data: None,
        }
    }

    /// Position of the object in the object table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn class(&self) -> &str {
        &self.entry.class
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn flags(&self) -> u64 {
        self.entry.flags
    }

    pub fn object_path(&self) -> &str {
        &self.entry.object_path
    }

    /// The table entry as it was read or last written
    pub fn entry(&self) -> &ObjectTableEntry {
        &self.entry
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn data(&self) -> Option<&ObjectData> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut ObjectData> {
        self.data.as_mut()
    }

    /// Replace the payload. The object counts as loaded afterwards.
    pub fn set_data(&mut self, data: ObjectData) {
        self.data = Some(data);
        self.state = LoadState::Loaded;
    }

    /// The redirector target, if this object is a loaded redirector
    pub fn redirect_target(&self) -> Option<ObjectRef> {
        match self.data {
            Some(ObjectData::Redirector(target)) => Some(target),
            _ => None,
        }
    }

    pub(crate) fn set_class(&mut self, kind: ObjectKind) {
        self.entry.class = kind.class_name().into();
        self.kind = kind;
    }
}
