use std::path::PathBuf;

use clap::Args;
use gpk::PackageStore;
use gpk_bulk::{BulkImport, BulkImportOptions, Manifest, TextureImportOptions, TracingProgress};
use miette::{miette, Context, Result};
use owo_colors::OwoColorize;
use tracing::info;

#[derive(Args)]
pub struct BulkArgs {
    /// A JSON file listing the operations
    #[arg(short, long, value_name = "FILE")]
    manifest: PathBuf,

    /// Directories searched for packages
    #[arg(short, long = "root", value_name = "DIR", required = true)]
    roots: Vec<PathBuf>,

    /// A target directory for the modified packages
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Generate every mip level of imported textures
    #[arg(long, default_value_t = false)]
    generate_mips: bool,
}

impl BulkArgs {
    pub fn handle(&self) -> Result<()> {
        let manifest = Manifest::from_path(&self.manifest)
            .context(format!("reading {}", self.manifest.display()))?;

        let store = PackageStore::from_roots(&self.roots)?;
        info!("found {} package(s)", store.known_packages().len());

        let options = BulkImportOptions::builder()
            .output_dir(&self.output)
            .texture(
                TextureImportOptions::builder()
                    .generate_mips(self.generate_mips)
                    .build(),
            )
            .build();
        let mut import = BulkImport::new(&store, options, manifest.operations);
        let had_work = import.execute(&TracingProgress);

        let errors = import.errors();
        for error in errors {
            match error.object {
                Some(index) => println!("{}:{} {}", error.source.red(), index, error.error),
                None => println!("{} {}", error.source.red(), error.error),
            }
        }

        match (had_work, errors.len()) {
            (false, _) => Err(miette!("nothing was imported")),
            (true, 0) => Ok(()),
            (true, count) => Err(miette!("bulk import finished with {count} error(s)")),
        }
    }
}
