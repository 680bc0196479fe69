use std::path::Path;

use gpk::{Object, ObjectData, ObjectKind};
use tracing::{debug, instrument};

use super::ImportTransformer;
use crate::error::{Error, Result};
use crate::source::read_source;

/// Replaces the serialized payload of any other object with the source bytes
///
/// Objects whose class has a parsed payload, such as redirectors, are refused: their class would no
/// longer match the bytes written for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawTransformer;

impl ImportTransformer for RawTransformer {
    #[instrument(skip_all, fields(object = object.name(), source = %source.display()), err)]
    fn import(&self, object: &mut Object, source: &Path) -> Result<()> {
        if !matches!(object.kind(), ObjectKind::Other(_)) {
            return Err(Error::UnexpectedPayload {
                object: object.name().to_owned(),
                expected: "raw object",
            });
        }

        let data = read_source(source)?;
        debug!("imported {} raw bytes", data.len());
        object.set_data(ObjectData::Raw(data));
        Ok(())
    }
}
