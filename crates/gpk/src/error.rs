//! Error types that can be emitted from this library

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`gpk_compression::FormatError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    FormatError(#[from] gpk_compression::FormatError),

    /// Transparent warpper for [`std::string::FromUtf16Error`]
    #[error(transparent)]
    UTF16Error(#[from] std::string::FromUtf16Error),

    /// Object index outside of the object table
    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    /// Redirector chain could not be followed to its end
    #[error(transparent)]
    #[diagnostic(transparent)]
    Cycle(#[from] CycleError),

    /// No file is known for the requested package name
    #[error("unable to find package {0}")]
    #[diagnostic(help("packages are found by walking the store roots for .gpk and .upk files"))]
    PackageNotFound(String),

    /// Writing a package to disk failed
    #[error("failed to save package {package} to {}", path.display())]
    SaveFailure {
        /// Name of the package being saved
        package: String,
        /// Destination of the save
        path: PathBuf,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    /// The file is not a valid package
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// The package has to be loaded before its objects can be accessed
    #[error("package {0} is not loaded")]
    NotLoaded(String),

    /// An object could not be decoded from its serialized payload
    #[error("unable to read object {object} of package {package}")]
    CorruptObject {
        /// Name of the owning package
        package: String,
        /// Name of the object
        object: String,
        /// Decoder error
        #[source]
        source: binrw::Error,
    },

    /// An object reference does not point into the object or import table
    #[error("object reference {reference} in package {package} cannot be resolved")]
    UnresolvedReference {
        /// Package containing the reference
        package: String,
        /// The raw reference value
        reference: i32,
    },

    /// No export with the requested name
    #[error("unable to find object {name} in package {package}")]
    ObjectNotFound {
        /// Package that was searched
        package: String,
        /// Requested object name
        name: String,
    },
}

/// Error type to provide further information when an object index is out of range
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("object index {index} is out of range for package {package} ({count} objects)")]
pub struct IndexError {
    /// Package that was indexed
    pub package: String,
    /// Requested index
    pub index: usize,
    /// Number of objects in the package
    pub count: usize,
}

/// Error type to provide further information when following redirectors fails
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// the chain visits the same object twice
    #[error("redirector chain loops back to object {index} of package {package}")]
    Loop {
        /// Package of the repeated object
        package: String,
        /// Index of the repeated object
        index: usize,
    },

    /// the chain is longer than allowed
    #[error("redirector chain is longer than {max_depth} links")]
    TooDeep {
        /// The depth limit that was hit
        max_depth: usize,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
