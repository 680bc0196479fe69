use std::path::PathBuf;

use clap::Args;
use gpk::SaveContext;
use miette::{miette, Context, Result};
use tracing::info;

#[derive(Args)]
pub struct DecompressArgs {
    /// An input GPK file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target GPK file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl DecompressArgs {
    pub fn handle(&self) -> Result<()> {
        if !self.overwrite && self.output.exists() {
            return Err(miette!("{} already exists", self.output.display()));
        }

        let mut package = super::open(&self.file)?;
        if package.compression().is_none() {
            info!("{} is not compressed", package.name());
        }
        package.set_compression(None);

        info!("writing {}", self.output.display());
        package
            .save(&SaveContext::builder().path(&self.output).build())
            .context(format!("writing {}", self.output.display()))?;

        Ok(())
    }
}
