//! Driver binding for the offloaded audio graph runtime.
//!
//! The vendor runtime instantiates signal-processing graphs on a DSP, moves
//! sample data through them and accepts binary configuration addressed to
//! individual module instances. This crate exposes that runtime to Rust as:
//!
//! - [`GraphDriver`] - object-safe capability trait with the runtime's full
//!   operation set (open/close, configuration, ioctl commands, tagged module
//!   lookup, event registration, blocking read/write)
//! - [`DriverBinding`] - the process-wide, explicitly constructed holder of a
//!   loaded driver, shared by every session; loading is all-or-nothing
//! - [`DriverLoader`] - how a binding obtains a driver library
//! - [`sim`] - a deterministic in-process driver for tests and host-side work
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │     Sessions (one per stream)    │
//! └──────────────┬───────────────────┘
//!                │ Arc<DriverBinding>
//!                ▼
//! ┌──────────────────────────────────┐
//! │          DriverBinding           │
//! │  init / deinit / driver()        │
//! └──────────────┬───────────────────┘
//!                │ DriverLoader::load
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ vendor .so  │  │  SimDriver  │
//! │  (platform) │  │   (tests)   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use offload_config::DriverConfig;
//! use offload_driver::DriverBinding;
//! use offload_driver::sim::{SimDriver, SimLoader};
//!
//! let driver = Arc::new(SimDriver::new());
//! let binding = DriverBinding::new(SimLoader::new(driver));
//! binding.init(&DriverConfig::new("/vendor/etc/cal.acdb")).unwrap();
//! assert!(binding.is_loaded());
//! ```

mod binding;
mod driver;
mod error;
mod types;

pub mod sim;

pub use binding::{DriverBinding, DriverLoader, LoadedLibrary};
pub use driver::GraphDriver;
pub use error::{DriverError, Operation, Result};
pub use types::{
    BufferFlags, CustomEventRegistration, DriverCommand, DriverEvent, EventCallback, GraphHandle,
    GraphSelect, InitData, ModuleEntry, ModuleInfo, ReadResult,
};
