//! This library handles reading, editing and writing **GPK** packages.
//!
//! # Package Format Documentation
//!
//! A package is a container of serialized objects. It starts with a summary, followed by the package
//! body. The body holds the object table and the serialized payload of every object, and may be stored
//! as a sequence of compressed chunks (see [`gpk_compression`]).
//!
//! ## Summary
//!
//! | Field               | Type      | Description                                                 |
//! |---------------------|-----------|-------------------------------------------------------------|
//! | Magic number        | `u32`     | 0x9E2A83C1                                                  |
//! | File version        | `u16`     | Engine file version                                         |
//! | Licensee version    | `u16`     | Game specific file version                                  |
//! | Package flags       | `u32`     | `0x02000000` marks a compressed body                        |
//! | Name                | `FString` | Name the package was saved under                            |
//! | Compression method  | `u32`     | `0` None, `1` Zlib, `2` LZO                                 |
//! | Body size           | `u32`     | Size of the decompressed body                               |
//! | Chunk count         | `u32`     | Number of chunk pointers, `0` for an uncompressed body      |
//! | Chunk pointers      | 16 bytes  | Uncompressed offset and size, compressed offset and size    |
//!
//! Compressed offsets are relative to the end of the summary. A body is split into chunks of at most
//! 1 MiB, each of them a self-contained compressed chunk.
//!
//! ## Body
//!
//! | Field               | Type      | Description                                                 |
//! |---------------------|-----------|-------------------------------------------------------------|
//! | Object count        | `u32`     |                                                             |
//! | Objects             |           | Class, name and path `FString`s, flags `u64`, serial offset and size `u32` |
//! | Import count        | `u32`     |                                                             |
//! | Imports             |           | Package `FString`, object index `u32`, class `FString`      |
//! | Payloads            |           | Object payloads, serial offsets start here                  |
//!
//! ### FString
//!
//! An `i32` length counting the NUL terminator, followed by the characters. A positive length means
//! 8-bit characters, a negative one UTF-16 code units, and `0` is the empty string without any
//! terminator.
//!
//! ### Object references
//!
//! References between objects are signed `i32` values: `0` is null, `n > 0` is export `n - 1` of the
//! same package and `n < 0` is import `-n - 1`.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Payloads**: `Texture2D`, `SoundNodeWave` and `ObjectRedirector` payloads are decoded, every
//!   other class is kept as raw bytes.
//!

pub mod error;
pub mod object;
pub mod package;
pub mod sound;
pub mod store;
pub mod string;
pub mod texture;
pub mod types;
pub mod write;

pub use gpk_compression::CompressionMethod;

pub use object::{LoadState, Object, ObjectData, ObjectKind};
pub use package::{Package, PackageState, SaveContext};
pub use sound::SoundNodeWave;
pub use store::{ObjectLocation, PackageHandle, PackageStore, DEFAULT_REDIRECT_DEPTH};
pub use string::FString;
pub use texture::{MipMap, PixelFormat, Texture2D, TextureAddress, TextureCompressionSettings};
pub use types::{ImportEntry, ObjectRef, PackageFlags, PackageSummary, RefTarget};
pub use write::{PackageWriter, PackageWriterOptions};
