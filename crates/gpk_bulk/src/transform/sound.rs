use std::path::Path;

use gpk::{Object, ObjectData};
use tracing::{debug, instrument};

use super::ImportTransformer;
use crate::error::{Error, Result};
use crate::source::read_source;

/// Replaces the audio data of `SoundNodeWave` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct SoundTransformer;

impl ImportTransformer for SoundTransformer {
    #[instrument(skip_all, fields(object = object.name(), source = %source.display()), err)]
    fn import(&self, object: &mut Object, source: &Path) -> Result<()> {
        let name = object.name().to_owned();
        let Some(ObjectData::Sound(sound)) = object.data_mut() else {
            return Err(Error::UnexpectedPayload {
                object: name,
                expected: "sound node",
            });
        };

        sound.data = read_source(source)?;
        debug!("imported {} bytes of audio", sound.data.len());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use gpk::{ObjectData, Package, PackageSummary, SoundNodeWave};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::SoundTransformer;
    use crate::error::{Error, Result};
    use crate::transform::ImportTransformer;

    #[traced_test]
    #[test]
    fn import_sound() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("click.ogg");
        std::fs::write(&source, b"OggS\x00\x02")?;

        let mut package = Package::create("P", PackageSummary::default());
        package.add_object("SoundNodeWave", "S_Click", 0, ObjectData::Sound(SoundNodeWave::new(vec![1])));
        package.add_object("Material", "M", 0, ObjectData::Raw(vec![1]));

        SoundTransformer.import(package.resolve_mut(0)?, &source)?;
        assert_eq!(
            package.resolve(0)?.data(),
            Some(&ObjectData::Sound(SoundNodeWave::new(b"OggS\x00\x02".to_vec())))
        );

        assert!(matches!(
            SoundTransformer.import(package.resolve_mut(1)?, &source),
            Err(Error::UnexpectedPayload { .. })
        ));

        Ok(())
    }
}
