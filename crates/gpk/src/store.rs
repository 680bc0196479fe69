//! Catalog of known packages and the packages currently in use
//!

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

use crate::error::{CycleError, Error, Result};
use crate::object::ObjectKind;
use crate::package::{Package, SaveContext};
use crate::types::RefTarget;

/// Longest redirector chain [`PackageStore::follow_redirectors`] follows by default
pub const DEFAULT_REDIRECT_DEPTH: usize = 16;

/// File extensions picked up when indexing a directory
pub const PACKAGE_EXTENSIONS: [&str; 2] = ["gpk", "upk"];

fn canonical(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A reference to a live package of a [`PackageStore`]
///
/// Every handle returned by [`PackageStore::get_or_create`] holds one reference to the package and
/// must be given back with [`PackageStore::unload`].
pub struct PackageHandle {
    key: String,
    name: String,
    package: Arc<RwLock<Package>>,
}

impl fmt::Debug for PackageHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PackageHandle({})", self.name)
    }
}

impl PackageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Package> {
        self.package.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Package> {
        self.package.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same package instance
    pub fn ptr_eq(&self, other: &PackageHandle) -> bool {
        Arc::ptr_eq(&self.package, &other.package)
    }
}

/// Where a redirector chain ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub package: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
struct KnownPackage {
    name: String,
    path: PathBuf,
}

#[derive(Debug)]
struct LivePackage {
    name: String,
    package: Arc<RwLock<Package>>,
    references: usize,
}

/// Registry of packages by name
///
/// Package files are found by indexing directories or by registering them one by one. At most one
/// instance of a package is alive at a time; it is dropped once every handle to it has been unloaded.
/// Names are compared ignoring case.
///
/// ```no_run
/// fn count_objects(root: &std::path::Path) -> gpk::error::Result<usize> {
///     let store = gpk::PackageStore::from_roots([root])?;
///
///     let handle = store.get_or_create("S1UI_Chat")?;
///     store.load(&handle)?;
///     let count = handle.read().len();
///     store.unload(handle);
///
///     Ok(count)
/// }
/// ```
#[derive(Debug, Default)]
pub struct PackageStore {
    known: Mutex<IndexMap<String, KnownPackage>>,
    live: Mutex<IndexMap<String, LivePackage>>,
}

impl PackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that knows every package found under `roots`
    pub fn from_roots<P: AsRef<Path>>(roots: impl IntoIterator<Item = P>) -> Result<Self> {
        let store = Self::new();
        for root in roots {
            store.index_root(root)?;
        }
        Ok(store)
    }

    /// Walk `root` for package files, returning how many were found.
    ///
    /// A package found again replaces the earlier path.
    #[instrument(skip(self, root), fields(root = %root.as_ref().display()), err)]
    pub fn index_root(&self, root: impl AsRef<Path>) -> Result<usize> {
        let mut count = 0;
        for entry in WalkDir::new(root.as_ref()).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let is_package = path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| PACKAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)));
            let Some(name) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            if is_package {
                self.register(name, path);
                count += 1;
            }
        }

        debug!("indexed {count} packages");
        Ok(count)
    }

    /// Make the package `name` known, stored at `path`
    pub fn register(&self, name: &str, path: impl Into<PathBuf>) {
        let path = path.into();
        trace!("registering {name} at {}", path.display());
        let previous = lock(&self.known).insert(
            canonical(name),
            KnownPackage {
                name: name.to_owned(),
                path,
            },
        );
        if let Some(previous) = previous {
            warn!("{name} replaces {}", previous.path.display());
        }
    }

    /// Whether a file is known for the package
    pub fn contains(&self, name: &str) -> bool {
        lock(&self.known).contains_key(&canonical(name))
    }

    /// Path of the file known for the package
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        lock(&self.known)
            .get(&canonical(name))
            .map(|known| known.path.clone())
    }

    /// Names of all known packages, in discovery order
    pub fn known_packages(&self) -> Vec<String> {
        lock(&self.known)
            .values()
            .map(|known| known.name.clone())
            .collect()
    }

    /// Get the live instance of a package, creating an unloaded one if there is none.
    ///
    /// Every call takes one reference that is released by [`PackageStore::unload`].
    #[instrument(skip(self), err)]
    pub fn get_or_create(&self, name: &str) -> Result<PackageHandle> {
        let key = canonical(name);
        let mut live = lock(&self.live);

        if let Some(entry) = live.get_mut(&key) {
            entry.references += 1;
            trace!("{name} has {} references", entry.references);
            return Ok(PackageHandle {
                key,
                name: entry.name.clone(),
                package: entry.package.clone(),
            });
        }

        let known = lock(&self.known)
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(name.to_owned()))?;

        debug!("creating {} from {}", known.name, known.path.display());
        let package = Arc::new(RwLock::new(Package::new(&known.name, &known.path)));
        live.insert(
            key.clone(),
            LivePackage {
                name: known.name.clone(),
                package: package.clone(),
                references: 1,
            },
        );

        Ok(PackageHandle {
            key,
            name: known.name,
            package,
        })
    }

    /// Read the package from disk if it is not loaded yet
    pub fn load(&self, handle: &PackageHandle) -> Result<()> {
        handle.write().load()
    }

    /// Release the reference held by `handle`, dropping the package once nothing refers to it
    pub fn unload(&self, handle: PackageHandle) {
        let mut live = lock(&self.live);
        match live.get_mut(&handle.key) {
            Some(entry) if Arc::ptr_eq(&entry.package, &handle.package) => {
                entry.references -= 1;
                if entry.references == 0 {
                    live.shift_remove(&handle.key);
                    debug!("dropped {}", handle.name);
                }
            }
            _ => warn!("{} is not a live package of this store", handle.name),
        }
    }

    /// Write the package as described by `context`
    #[instrument(skip(self, handle, context), fields(package = %handle.name), err)]
    pub fn save(&self, handle: &PackageHandle, context: &SaveContext) -> Result<()> {
        let package = handle.read();
        package.save(context).map_err(|e| Error::SaveFailure {
            package: package.name().to_owned(),
            path: context.path.clone(),
            source: Box::new(e),
        })
    }

    /// Whether an instance of the package is alive
    pub fn is_live(&self, name: &str) -> bool {
        lock(&self.live).contains_key(&canonical(name))
    }

    /// Number of handles currently held for the package
    pub fn references(&self, name: &str) -> usize {
        lock(&self.live)
            .get(&canonical(name))
            .map_or(0, |entry| entry.references)
    }

    /// Number of live packages
    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }

    /// Follow redirectors starting at object `index` of `handle` until a non redirector is reached.
    ///
    /// Packages reached through imports are acquired for the walk and released afterwards. Fails
    /// with [`CycleError`] when an object is visited twice or more than `max_depth` redirectors are
    /// followed.
    #[instrument(skip(self, handle), fields(package = %handle.name), err)]
    pub fn follow_redirectors(
        &self,
        handle: &PackageHandle,
        index: usize,
        max_depth: usize,
    ) -> Result<ObjectLocation> {
        let mut acquired = None;
        let result = self.walk_redirectors(handle, index, max_depth, &mut acquired);
        if let Some(handle) = acquired {
            self.unload(handle);
        }
        result
    }

    fn walk_redirectors(
        &self,
        start: &PackageHandle,
        mut index: usize,
        max_depth: usize,
        acquired: &mut Option<PackageHandle>,
    ) -> Result<ObjectLocation> {
        let mut visited = HashSet::new();
        let mut depth = 0;

        loop {
            let current = acquired.as_ref().unwrap_or(start);
            let key = current.key.clone();
            if !visited.insert((key.clone(), index)) {
                return Err(CycleError::Loop {
                    package: current.name.clone(),
                    index,
                }
                .into());
            }

            let (next_package, next_index) = {
                let mut package = current.write();
                package.load()?;
                let location = ObjectLocation {
                    package: package.name().to_owned(),
                    index,
                };
                if package.resolve(index)?.kind() != &ObjectKind::ObjectRedirector {
                    return Ok(location);
                }
                let Some(reference) = package.load_object(index)?.redirect_target() else {
                    return Ok(location);
                };
                trace!("{}:{index} redirects to {reference}", location.package);

                let unresolved = || Error::UnresolvedReference {
                    package: location.package.clone(),
                    reference: reference.0,
                };
                match reference.target() {
                    RefTarget::Null => return Err(unresolved()),
                    RefTarget::Export(export) => (None, export),
                    RefTarget::Import(import) => {
                        let import = package.import(import).ok_or_else(unresolved)?;
                        (Some(import.package.to_string()), import.object_index as usize)
                    }
                }
            };

            depth += 1;
            if depth > max_depth {
                return Err(CycleError::TooDeep { max_depth }.into());
            }

            if let Some(next_package) = next_package {
                let next_key = canonical(&next_package);
                if next_key != key {
                    let next = if next_key == start.key {
                        None
                    } else {
                        Some(self.get_or_create(&next_package)?)
                    };
                    if let Some(previous) = std::mem::replace(acquired, next) {
                        self.unload(previous);
                    }
                }
            }
            index = next_index;
        }
    }
}
