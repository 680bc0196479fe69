//! Running bulk operations against a package store
//!

use std::path::PathBuf;

use bon::Builder;
use gpk::{ImportEntry, PackageHandle, PackageStore, SaveContext};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{BulkError, Error, Result};
use crate::operation::{Action, BulkEntry, BulkOperation};
use crate::progress::ProgressObserver;
use crate::transform::{TextureImportOptions, Transformers};

/// Extension of the packages written by a bulk import
pub const OUTPUT_EXTENSION: &str = "gpk";

#[derive(Debug, Clone, Builder)]
pub struct BulkImportOptions {
    /// Directory the modified packages are written to
    #[builder(into)]
    pub output_dir: PathBuf,

    #[builder(default)]
    pub texture: TextureImportOptions,
}

/// An entry whose package was acquired
struct WorkItem<'a> {
    operation: &'a BulkOperation,
    entry: &'a BulkEntry,
    package: usize,
}

/// Applies imports and redirects to objects of many packages, then saves every package involved.
///
/// A failing entry or package never stops the run, failures are collected and available from
/// [`BulkImport::errors`] afterwards.
///
/// ```no_run
/// use gpk::PackageStore;
/// use gpk_bulk::{BulkEntry, BulkImport, BulkImportOptions, BulkOperation, TracingProgress};
///
/// let store = PackageStore::from_roots(["CookedPC"]).unwrap();
/// let mut import = BulkImport::new(
///     &store,
///     BulkImportOptions::builder().output_dir("out").build(),
///     vec![BulkOperation::import("chat.png", vec![BulkEntry::new("S1UI_Chat", 3)])],
/// );
///
/// import.execute(&TracingProgress);
/// for error in import.errors() {
///     println!("{error}");
/// }
/// ```
pub struct BulkImport<'a> {
    store: &'a PackageStore,
    options: BulkImportOptions,
    operations: Vec<BulkOperation>,
    transformers: Transformers,
    errors: Vec<BulkError>,
}

impl<'a> BulkImport<'a> {
    pub fn new(
        store: &'a PackageStore,
        options: BulkImportOptions,
        operations: Vec<BulkOperation>,
    ) -> Self {
        Self {
            store,
            transformers: Transformers::new(options.texture),
            options,
            operations,
            errors: Vec::new(),
        }
    }

    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    /// Failures of the last run
    pub fn errors(&self) -> &[BulkError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<BulkError> {
        std::mem::take(&mut self.errors)
    }

    /// Run every operation.
    ///
    /// Returns `false` only when no package could be acquired, in which case nothing is written.
    #[instrument(skip_all, fields(operations = self.operations.len()))]
    pub fn execute(&mut self, progress: &dyn ProgressObserver) -> bool {
        let mut errors = Vec::new();
        let had_work = self.run(progress, &mut errors);
        for error in &errors {
            warn!("{error}");
        }
        info!("finished with {} error(s)", errors.len());
        self.errors = errors;
        had_work
    }

    fn run(&self, progress: &dyn ProgressObserver, errors: &mut Vec<BulkError>) -> bool {
        let (packages, work) = self.acquire_packages(errors);
        if packages.is_empty() {
            errors.push(BulkError::new(BulkError::GENERAL, Error::NothingToDo));
            return false;
        }

        let total = work.len();
        progress.set_maximum(total);
        progress.set_description(&format!("Executing {total} operation(s)..."));

        for (position, item) in work.iter().enumerate() {
            let handle = &packages[item.package];
            progress.set_current(position + 1);
            progress.set_description(&format!("Processing: {}", handle.name()));

            if let Err(error) = self.apply(item.operation, item.entry, handle) {
                errors.push(BulkError::for_object(handle.name(), item.entry.index, error));
            }
        }

        progress.set_description("Saving...");
        for handle in packages {
            if let Err(error) = self.save(&handle) {
                errors.push(BulkError::new(handle.name(), error));
            }
            self.store.unload(handle);
        }

        true
    }

    /// Acquire and load the package of every enabled entry, keeping one handle per package
    fn acquire_packages(
        &self,
        errors: &mut Vec<BulkError>,
    ) -> (Vec<PackageHandle>, Vec<WorkItem<'_>>) {
        let mut packages: Vec<PackageHandle> = Vec::new();
        let mut work = Vec::new();

        for operation in self.operations.iter().filter(|op| op.is_valid()) {
            for entry in operation.entries.iter().filter(|entry| entry.enabled) {
                let handle = match self.acquire(&entry.package) {
                    Ok(handle) => handle,
                    Err(error) => {
                        errors.push(BulkError::for_object(
                            entry.package.as_str(),
                            entry.index,
                            error,
                        ));
                        continue;
                    }
                };

                let package = match packages.iter().position(|known| known.ptr_eq(&handle)) {
                    Some(position) => {
                        self.store.unload(handle);
                        position
                    }
                    None => {
                        packages.push(handle);
                        packages.len() - 1
                    }
                };
                work.push(WorkItem {
                    operation,
                    entry,
                    package,
                });
            }
        }

        debug!("acquired {} package(s) for {} entries", packages.len(), work.len());
        (packages, work)
    }

    fn acquire(&self, name: &str) -> Result<PackageHandle> {
        let handle = self.store.get_or_create(name)?;
        if let Err(error) = self.store.load(&handle) {
            self.store.unload(handle);
            return Err(error.into());
        }
        Ok(handle)
    }

    fn apply(
        &self,
        operation: &BulkOperation,
        entry: &BulkEntry,
        handle: &PackageHandle,
    ) -> Result<()> {
        let mut package = handle.write();
        let object = package
            .load_object(entry.index)
            .map_err(|source| Error::ObjectNotLoaded {
                package: handle.name().to_owned(),
                index: entry.index,
                source,
            })?;

        match operation.action() {
            Some(Action::Import(source)) => self
                .transformers
                .for_kind(object.kind())
                .import(object, source),
            Some(Action::Redirect { path, index }) => {
                // The target may live in this very package
                drop(package);
                self.redirect(handle, entry.index, path, index)
            }
            None => {
                trace!("nothing to apply to {}:{}", handle.name(), entry.index);
                Ok(())
            }
        }
    }

    fn redirect(
        &self,
        handle: &PackageHandle,
        index: usize,
        path: &str,
        target_index: Option<usize>,
    ) -> Result<()> {
        let (target_package, target_object) = path
            .split_once('.')
            .filter(|(package, _)| !package.is_empty())
            .ok_or_else(|| Error::MissingTargetPackage(path.to_owned()))?;

        let target = self.store.get_or_create(target_package)?;
        let resolved = Self::resolve_target(&target, target_object, target_index)
            .map_err(|source| Error::TargetObjectNotFound {
                path: path.to_owned(),
                source,
            });
        self.store.unload(target);

        handle.write().convert_to_redirector(index, &resolved?)?;
        Ok(())
    }

    fn resolve_target(
        target: &PackageHandle,
        name: &str,
        index: Option<usize>,
    ) -> gpk::error::Result<ImportEntry> {
        let mut package = target.write();
        package.load()?;
        let index = match index {
            Some(index) => index,
            None => package.find_object(name)?,
        };
        let class = package.load_object(index)?.class().to_owned();

        Ok(ImportEntry {
            package: package.name().into(),
            object_index: index as u32,
            class: class.into(),
        })
    }

    fn save(&self, handle: &PackageHandle) -> Result<()> {
        let path = self
            .options
            .output_dir
            .join(format!("{}.{OUTPUT_EXTENSION}", handle.name()));
        let context = SaveContext::builder()
            .path(path)
            .embed_object_path(true)
            .disable_texture_caching(true)
            .build();

        self.store.save(handle, &context)?;
        debug!("saved {} to {}", handle.name(), context.path.display());
        Ok(())
    }
}
