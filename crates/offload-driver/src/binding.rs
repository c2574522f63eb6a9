//! Process-wide driver binding.
//!
//! A [`DriverBinding`] is constructed once and handed to every session as
//! `Arc<DriverBinding>`. It owns the loaded driver library: `init` loads and
//! initialises it (all-or-nothing), `driver()` hands out the shared
//! [`GraphDriver`], and `deinit` tears it down.
//!
//! The loaded driver is published through an `ArcSwapOption`, so sessions read
//! it wait-free. `init` and `deinit` are serialised by a `Mutex` and never
//! overlap each other.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use offload_config::DriverConfig;
use parking_lot::Mutex;

use crate::driver::GraphDriver;
use crate::error::{DriverError, Operation, Result};
use crate::types::InitData;

/// Source of driver libraries.
///
/// Production loaders open the vendor shared object and resolve its symbols;
/// [`SimLoader`](crate::sim::SimLoader) hands out an in-process model.
pub trait DriverLoader: Send + Sync {
    /// Name of the library this loader opens, for diagnostics.
    fn library_name(&self) -> &str;

    /// Open the library.
    ///
    /// Returns [`DriverError::LibraryUnavailable`] when it cannot be opened.
    fn load(&self) -> Result<LoadedLibrary>;
}

/// An opened driver library: the driver object plus the operations it exports.
///
/// Dropping the value unloads the library.
pub struct LoadedLibrary {
    driver: Arc<dyn GraphDriver>,
    exported: Vec<Operation>,
    on_unload: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl LoadedLibrary {
    /// A library exporting `exported`.
    pub fn new(driver: Arc<dyn GraphDriver>, exported: Vec<Operation>) -> Self {
        Self {
            driver,
            exported,
            on_unload: None,
        }
    }

    /// A library exporting every operation.
    pub fn complete(driver: Arc<dyn GraphDriver>) -> Self {
        Self::new(driver, Operation::ALL.to_vec())
    }

    /// Run `hook` when the library is unloaded.
    pub fn on_unload(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_unload = Some(Box::new(hook));
        self
    }

    /// Required operations this library does not export.
    pub fn missing_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .iter()
            .copied()
            .filter(|op| !self.exported.contains(op))
            .collect()
    }
}

impl Drop for LoadedLibrary {
    fn drop(&mut self) {
        if let Some(hook) = self.on_unload.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("exported", &self.exported)
            .finish_non_exhaustive()
    }
}

/// The process-wide holder of the loaded graph driver.
pub struct DriverBinding {
    loader: Box<dyn DriverLoader>,
    loaded: ArcSwapOption<LoadedLibrary>,
    lifecycle: Mutex<()>,
}

impl DriverBinding {
    /// Create an unloaded binding that will load through `loader`.
    pub fn new(loader: impl DriverLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            loaded: ArcSwapOption::empty(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Load and initialise the driver. Idempotent.
    ///
    /// Either the whole sequence succeeds (library opened, every operation
    /// resolved, driver initialised) and the driver is published, or nothing
    /// is published and the library is unloaded again.
    pub fn init(&self, config: &DriverConfig) -> Result<()> {
        let _guard = self.lifecycle.lock();
        if self.loaded.load().is_some() {
            tracing::debug!("driver already initialised");
            return Ok(());
        }

        config.validate()?;

        let library_name = self.loader.library_name().to_string();
        let library = self.loader.load()?;

        let missing = library.missing_operations();
        if !missing.is_empty() {
            tracing::error!(library = %library_name, ?missing, "driver library incomplete");
            return Err(DriverError::MissingOperations {
                library: library_name,
                missing,
            });
        }

        let data = InitData::from(config);
        if let Err(e) = library.driver.init(&data) {
            tracing::error!(library = %library_name, error = %e, "driver init failed");
            return Err(match e {
                DriverError::Status { status, .. } => DriverError::InitFailed { status },
                other => other,
            });
        }

        self.loaded.store(Some(Arc::new(library)));
        tracing::info!(
            library = %library_name,
            calibration_files = data.calibration_files.len(),
            "driver initialised"
        );
        Ok(())
    }

    /// Tear down and unload the driver. A no-op when nothing is loaded.
    ///
    /// Sessions still holding the driver keep a reference to it until they
    /// drop it, but every later [`driver`](Self::driver) call fails with
    /// [`DriverError::NotLoaded`].
    pub fn deinit(&self) {
        let _guard = self.lifecycle.lock();
        if let Some(library) = self.loaded.swap(None) {
            library.driver.deinit();
            tracing::info!(library = self.loader.library_name(), "driver deinitialised");
        }
    }

    /// Returns true when a driver is published.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load().is_some()
    }

    /// The published driver.
    pub fn driver(&self) -> Result<Arc<dyn GraphDriver>> {
        self.loaded
            .load()
            .as_ref()
            .map(|library| Arc::clone(&library.driver))
            .ok_or(DriverError::NotLoaded)
    }
}

impl std::fmt::Debug for DriverBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverBinding")
            .field("library", &self.loader.library_name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
