//! Description of the work done by a bulk import
//!

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An object a [`BulkOperation`] is applied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEntry {
    /// Name of the package holding the object
    pub package: String,

    /// Index of the object in the package
    pub index: usize,

    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Path of the object, only used for reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
}

fn enabled() -> bool {
    true
}

impl BulkEntry {
    pub fn new(package: impl Into<String>, index: usize) -> Self {
        Self {
            package: package.into(),
            index,
            enabled: true,
            object_path: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// What happens to the objects of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Replace the payload with the content of a file
    Import(&'a Path),

    /// Turn the object into a redirector to `Package.Object`
    Redirect {
        path: &'a str,
        index: Option<usize>,
    },
}

/// One import or redirect applied to a list of objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<PathBuf>,

    /// Target of a redirect written as `Package.Object`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_path: Option<String>,

    /// Index of the target object, looked up by name when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_index: Option<usize>,

    #[serde(default)]
    pub entries: Vec<BulkEntry>,
}

impl BulkOperation {
    pub fn import(path: impl Into<PathBuf>, entries: Vec<BulkEntry>) -> Self {
        Self {
            import_path: Some(path.into()),
            entries,
            ..Default::default()
        }
    }

    pub fn redirect(path: impl Into<String>, index: Option<usize>, entries: Vec<BulkEntry>) -> Self {
        Self {
            redirect_path: Some(path.into()),
            redirect_index: index,
            entries,
            ..Default::default()
        }
    }

    /// Operations without entries are skipped
    pub fn is_valid(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The action of the operation, `None` when it has no action or both
    pub fn action(&self) -> Option<Action<'_>> {
        let import = self.import_path.as_deref().filter(|p| !p.as_os_str().is_empty());
        let redirect = self.redirect_path.as_deref().filter(|p| !p.is_empty());
        match (import, redirect) {
            (Some(path), None) => Some(Action::Import(path)),
            (None, Some(path)) => Some(Action::Redirect {
                path,
                index: self.redirect_index,
            }),
            _ => None,
        }
    }
}

/// A list of operations stored as JSON
///
/// ```
/// let manifest = gpk_bulk::Manifest::from_reader(r#"{
///     "operations": [{
///         "import_path": "icons/chat.png",
///         "entries": [{ "package": "S1UI_Chat", "index": 3 }]
///     }]
/// }"#.as_bytes()).unwrap();
///
/// assert!(manifest.operations[0].entries[0].enabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub operations: Vec<BulkOperation>,
}

impl Manifest {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn to_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
