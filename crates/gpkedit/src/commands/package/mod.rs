use std::path::Path;

use gpk::Package;
use miette::{miette, Context, Result};

pub mod decompress;
pub mod info;

#[derive(clap::Subcommand)]
pub enum PackageCommands {
    /// Describe GPK files
    Info(info::InfoArgs),
    /// Rewrite a GPK file with an uncompressed body
    Decompress(decompress::DecompressArgs),
}

impl PackageCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            PackageCommands::Info(info) => info.handle(),
            PackageCommands::Decompress(decompress) => decompress.handle(),
        }
    }
}

/// Load the package stored at `path`, named after the file
pub(crate) fn open(path: &Path) -> Result<Package> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or(miette!("unable to get a package name from {}", path.display()))?;

    let mut package = Package::new(name, path);
    package
        .load()
        .context(format!("loading {}", path.display()))?;
    Ok(package)
}
