use std::ffi::OsStr;
use std::path::PathBuf;

use clap::Args;
use gpk::{store::PACKAGE_EXTENSIONS, Package};
use itertools::Itertools;
use miette::{miette, Result};
use owo_colors::OwoColorize;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Args)]
pub struct InfoArgs {
    /// Input GPK files or directories holding them
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// List the objects and imports of each package
    #[arg(long, default_value_t = false)]
    objects: bool,
}

impl InfoArgs {
    fn files(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .flat_map(|path| {
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| !e.file_type().is_dir())
                    .map(|e| e.into_path())
            })
            .filter(|path| {
                path.extension()
                    .and_then(OsStr::to_str)
                    .is_some_and(|ext| PACKAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            })
            .collect()
    }

    fn print(&self, package: &mut Package) {
        let summary = package.summary();
        println!("{}", package.name().bold());
        println!("  version: {}/{}", summary.file_version, summary.licensee_version);
        println!("  flags: {}", summary.flags);
        println!(
            "  compression: {:?} ({} chunks)",
            summary.compression,
            summary.chunks.len()
        );
        println!("  body: {} bytes", summary.body_size);
        println!(
            "  objects: {}, imports: {}",
            package.len(),
            package.imports().len()
        );

        if !self.objects {
            return;
        }

        for index in 0..package.len() {
            let redirect = match package.load_object(index) {
                Ok(object) => object
                    .redirect_target()
                    .map(|target| format!(" -> {target}"))
                    .unwrap_or_default(),
                Err(e) => {
                    warn!("{e}");
                    format!(" {}", "(unreadable)".red())
                }
            };
            let object = &package.objects()[index];
            println!(
                "  {:>5} {} {} ({} bytes){}",
                index,
                object.class().dimmed(),
                object.name(),
                object.entry().serial_size,
                redirect.blue()
            );
        }

        let imports = package
            .imports()
            .iter()
            .enumerate()
            .map(|(index, import)| {
                format!(
                    "  {:>5} {}:{} {}",
                    index,
                    import.package,
                    import.object_index,
                    import.class.dimmed()
                )
            })
            .join("\n");
        if !imports.is_empty() {
            println!("{}", "  imports:".bold());
            println!("{imports}");
        }
    }

    pub fn handle(&self) -> Result<()> {
        let files = self.files();
        if files.is_empty() {
            return Err(miette!("no packages found"));
        }

        info!("reading {} package(s)", files.len());
        for file in files {
            let mut package = super::open(&file)?;
            self.print(&mut package);
        }
        Ok(())
    }
}
