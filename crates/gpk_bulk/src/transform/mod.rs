//! Converters replacing the payload of an object with the content of an external file
//!

use std::path::Path;

use gpk::{Object, ObjectKind};

use crate::error::Result;

mod raw;
mod sound;
mod texture;

pub use raw::RawTransformer;
pub use sound::SoundTransformer;
pub use texture::{TextureImportOptions, TextureTransformer};

/// Replaces the payload of a loaded object from a source file
pub trait ImportTransformer {
    /// Import `source` into `object`. The object is left untouched when the import fails.
    fn import(&self, object: &mut Object, source: &Path) -> Result<()>;
}

/// One transformer per kind of object
#[derive(Debug, Default)]
pub struct Transformers {
    texture: TextureTransformer,
    sound: SoundTransformer,
    raw: RawTransformer,
}

impl Transformers {
    pub fn new(texture_options: TextureImportOptions) -> Self {
        Self {
            texture: TextureTransformer::new(texture_options),
            ..Default::default()
        }
    }

    /// Transformer used for objects of `kind`
    pub fn for_kind(&self, kind: &ObjectKind) -> &dyn ImportTransformer {
        match kind {
            ObjectKind::Texture2D => &self.texture,
            ObjectKind::SoundNodeWave => &self.sound,
            ObjectKind::ObjectRedirector | ObjectKind::Other(_) => &self.raw,
        }
    }
}
