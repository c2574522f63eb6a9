//! Driver error type and the operation catalog.

use offload_config::ConfigError;
use offload_core::ModuleTag;

/// One entry point of the vendor graph runtime.
///
/// A driver library must export every operation in [`Operation::ALL`];
/// a binding refuses to publish a library that is missing any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Process-wide initialisation.
    Init,
    /// Process-wide teardown.
    Deinit,
    /// Instantiate a graph.
    Open,
    /// Tear down a graph.
    Close,
    /// Apply calibration for a (gkv, ckv) pair.
    SetCal,
    /// Apply a tag key vector.
    SetConfig,
    /// Push a raw parameter payload.
    SetCustomConfig,
    /// Read back a raw parameter payload.
    GetCustomConfig,
    /// Issue a graph command.
    Ioctl,
    /// Resolve a tag to module instances.
    GetTaggedModuleInfo,
    /// Read back a tagged parameter payload.
    GetTaggedCustomConfig,
    /// Register an event callback.
    RegisterEventCallback,
    /// Blocking capture transfer.
    Read,
    /// Blocking render transfer.
    Write,
}

impl Operation {
    /// Every operation a driver library must export.
    pub const ALL: [Operation; 14] = [
        Operation::Init,
        Operation::Deinit,
        Operation::Open,
        Operation::Close,
        Operation::SetCal,
        Operation::SetConfig,
        Operation::SetCustomConfig,
        Operation::GetCustomConfig,
        Operation::Ioctl,
        Operation::GetTaggedModuleInfo,
        Operation::GetTaggedCustomConfig,
        Operation::RegisterEventCallback,
        Operation::Read,
        Operation::Write,
    ];

    /// Exported symbol name in the vendor library.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operation::Init => "gsl_init",
            Operation::Deinit => "gsl_deinit",
            Operation::Open => "gsl_open",
            Operation::Close => "gsl_close",
            Operation::SetCal => "gsl_set_cal",
            Operation::SetConfig => "gsl_set_config",
            Operation::SetCustomConfig => "gsl_set_custom_config",
            Operation::GetCustomConfig => "gsl_get_custom_config",
            Operation::Ioctl => "gsl_ioctl",
            Operation::GetTaggedModuleInfo => "gsl_get_tagged_module_info",
            Operation::GetTaggedCustomConfig => "gsl_get_tagged_custom_config",
            Operation::RegisterEventCallback => "gsl_register_event_cb",
            Operation::Read => "gsl_read",
            Operation::Write => "gsl_write",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

fn symbol_list(ops: &[Operation]) -> String {
    ops.iter()
        .map(|op| op.symbol())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors reported by the driver binding or by a driver call.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver library could not be loaded at all.
    #[error("failed to load driver library '{library}': {reason}")]
    LibraryUnavailable {
        /// Library that was requested.
        library: String,
        /// Loader-provided reason.
        reason: String,
    },

    /// The library loaded but does not export the full operation set.
    #[error("driver library '{library}' is missing operations: {}", symbol_list(.missing))]
    MissingOperations {
        /// Library that was inspected.
        library: String,
        /// Every operation that could not be resolved.
        missing: Vec<Operation>,
    },

    /// The driver's own initialisation rejected the configuration.
    #[error("driver initialisation failed with status {status}")]
    InitFailed {
        /// Vendor status code.
        status: i32,
    },

    /// The process configuration is unusable.
    #[error("invalid driver configuration: {0}")]
    Config(#[from] ConfigError),

    /// No driver is currently loaded.
    #[error("driver is not loaded")]
    NotLoaded,

    /// A driver call returned a non-zero status.
    #[error("{op} failed with status {status}")]
    Status {
        /// Operation that failed.
        op: Operation,
        /// Vendor status code.
        status: i32,
    },

    /// The tag has no module in the open graph's topology.
    #[error("tag {tag} is not present in the graph")]
    TagNotFound {
        /// Tag that was looked up.
        tag: ModuleTag,
    },

    /// The handle does not name an open graph.
    #[error("invalid graph handle {0:#x}")]
    InvalidHandle(u64),
}

impl DriverError {
    /// Create a status error for `op`.
    pub fn status(op: Operation, status: i32) -> Self {
        DriverError::Status { op, status }
    }

    /// Returns true for failures that leave the process without a usable driver.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DriverError::LibraryUnavailable { .. }
                | DriverError::MissingOperations { .. }
                | DriverError::InitFailed { .. }
                | DriverError::Config(_)
        )
    }
}

/// Convenience result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_a_distinct_symbol() {
        let mut symbols: Vec<&str> = Operation::ALL.iter().map(|op| op.symbol()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), Operation::ALL.len());
    }

    #[test]
    fn missing_operations_lists_symbols() {
        let err = DriverError::MissingOperations {
            library: "libgraph.so".to_string(),
            missing: vec![Operation::Read, Operation::Write],
        };
        assert_eq!(
            err.to_string(),
            "driver library 'libgraph.so' is missing operations: gsl_read, gsl_write"
        );
        assert!(err.is_load_error());
    }

    #[test]
    fn status_display() {
        let err = DriverError::status(Operation::Ioctl, -22);
        assert_eq!(err.to_string(), "gsl_ioctl failed with status -22");
        assert!(!err.is_load_error());
    }
}
