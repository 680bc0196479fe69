//! Error types that can be emitted from this library

use std::fmt;
use std::path::PathBuf;

use gpk::PixelFormat;
use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`gpk::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] gpk::error::Error),

    /// Transparent warpper for [`image::ImageError`]
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Transparent warpper for [`serde_json::Error`]
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("can't import {extension} files")]
    #[diagnostic(help("textures are imported from tga, png or dds files"))]
    UnsupportedFormat { extension: String },

    #[error("can't import to textures with {0} pixel format")]
    #[diagnostic(help("supported pixel formats are PF_DXT1, PF_DXT5, PF_A8R8G8B8 and PF_G8"))]
    UnsupportedPixelFormat(PixelFormat),

    #[error("file is empty: {}", .0.display())]
    EmptySource(PathBuf),

    #[error("failed to read object {index} of {package}")]
    ObjectNotLoaded {
        package: String,
        index: usize,
        #[source]
        source: gpk::error::Error,
    },

    /// The object was loaded but holds a payload of another class
    #[error("{object} is not a {expected}")]
    UnexpectedPayload {
        object: String,
        expected: &'static str,
    },

    #[error("failed to get target package of redirect {0}")]
    #[diagnostic(help("redirect targets are written as Package.Object"))]
    MissingTargetPackage(String),

    #[error("failed to get redirected object {path}")]
    TargetObjectNotFound {
        path: String,
        #[source]
        source: gpk::error::Error,
    },

    #[error("Nothing to do!")]
    NothingToDo,
}

/// Result type for library
pub type Result<T> = std::result::Result<T, Error>;

/// A failure recorded while running a bulk operation
#[derive(Debug)]
pub struct BulkError {
    /// Package the failure belongs to, or [`BulkError::GENERAL`] for the operation as a whole
    pub source: String,
    /// Index of the object the failing entry targeted, if the failure belongs to one entry
    pub object: Option<usize>,
    pub error: Error,
}

impl BulkError {
    pub const GENERAL: &'static str = "General";

    pub fn new(source: impl Into<String>, error: Error) -> Self {
        Self {
            source: source.into(),
            object: None,
            error,
        }
    }

    /// A failure of the entry targeting object `index` of package `source`
    pub fn for_object(source: impl Into<String>, index: usize, error: Error) -> Self {
        Self {
            object: Some(index),
            ..Self::new(source, error)
        }
    }
}

impl fmt::Display for BulkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.object {
            Some(index) => write!(f, "{}:{}: {}", self.source, index, self.error),
            None => write!(f, "{}: {}", self.source, self.error),
        }
    }
}
