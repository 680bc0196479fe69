//! Bulk editing of **GPK** packages.
//!
//! A bulk import is a list of [`BulkOperation`]s. Each operation either imports a file into a list of
//! objects or turns them into redirectors to another object. Running it goes through four steps:
//!
//! 1. Every package named by an enabled entry is acquired from the [`gpk::PackageStore`] and loaded.
//! 2. Nothing happens when no package could be acquired.
//! 3. Each entry is applied to its object. Imports pick a transformer by the kind of the object:
//!    textures are decoded and re-encoded to the pixel format of the texture, sounds and any other
//!    object take the bytes of the file as they are.
//! 4. Every acquired package is saved to the output directory and released.
//!
//! Failures are recorded as [`BulkError`]s against the package they happened in and never stop the
//! run.

pub mod error;
pub mod operation;
pub mod orchestrator;
pub mod progress;
pub mod source;
pub mod transform;

pub use error::{BulkError, Error, Result};
pub use operation::{Action, BulkEntry, BulkOperation, Manifest};
pub use orchestrator::{BulkImport, BulkImportOptions};
pub use progress::{ChannelProgress, NoProgress, ProgressEvent, ProgressObserver, TracingProgress};
pub use transform::{ImportTransformer, TextureImportOptions, Transformers};
