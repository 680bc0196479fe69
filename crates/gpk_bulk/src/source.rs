//! Reading import sources

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};

/// Read the whole source file. Imports never start from an empty file.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path)?;
    if data.is_empty() {
        return Err(Error::EmptySource(path.to_path_buf()));
    }
    trace!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}
