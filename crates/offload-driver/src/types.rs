//! Values exchanged with the graph runtime.

use std::path::PathBuf;
use std::time::Duration;

use offload_config::DriverConfig;
use offload_core::{BufferSpec, KeyVector};

/// Opaque token naming one open graph.
///
/// Handles are minted by [`GraphDriver::open`](crate::GraphDriver::open) and
/// are valid until the matching close succeeds. The type is deliberately not
/// `Clone`: exactly one session owns each handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GraphHandle(u64);

impl GraphHandle {
    /// Wrap a driver-provided handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The driver-provided value, for logging and driver-side lookup.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "graph@{:#x}", self.0)
    }
}

/// One module occupying a tagged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Module type identifier.
    pub module_id: u32,
    /// Instance identifier, the address used for configuration payloads.
    pub module_iid: u32,
}

/// Module instances resolved for one tag in an open graph.
///
/// Only meaningful while the graph it was resolved against stays open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Resolved entries, in driver order.
    pub entries: Vec<ModuleEntry>,
}

impl ModuleInfo {
    /// Module info with the given entries.
    pub fn new(entries: Vec<ModuleEntry>) -> Self {
        Self { entries }
    }

    /// The first resolved instance ID, the usual configuration target.
    pub fn first_instance(&self) -> Option<u32> {
        self.entries.first().map(|e| e.module_iid)
    }

    /// Returns true when the tag resolved to no instances.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request to add a supplemental subgraph to an open graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSelect {
    /// Key vector identifying the subgraph.
    pub graph_kv: KeyVector,
    /// Calibration key vector for the subgraph (usually empty).
    pub cal_kv: KeyVector,
}

/// Registration (or removal) of a module's custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomEventRegistration {
    /// Event identifier.
    pub event_id: u32,
    /// Module instance raising the event.
    pub module_iid: u32,
    /// Size of the event configuration payload.
    pub config_payload_size: u32,
    /// `true` to register, `false` to unregister.
    pub register: bool,
}

/// A graph command, the typed form of the runtime's ioctl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// Move the graph to the prepared state.
    Prepare,
    /// Start data flow.
    Start,
    /// Stop data flow.
    Stop,
    /// Configure the capture queue.
    ConfigureReadParams(BufferSpec),
    /// Configure the render queue.
    ConfigureWriteParams(BufferSpec),
    /// Add a supplemental subgraph.
    AddGraph(GraphSelect),
    /// Register or unregister a module event.
    RegisterCustomEvent(CustomEventRegistration),
}

impl DriverCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DriverCommand::Prepare => "PREPARE",
            DriverCommand::Start => "START",
            DriverCommand::Stop => "STOP",
            DriverCommand::ConfigureReadParams(_) => "CONFIGURE_READ_PARAMS",
            DriverCommand::ConfigureWriteParams(_) => "CONFIGURE_WRITE_PARAMS",
            DriverCommand::AddGraph(_) => "ADD_GRAPH",
            DriverCommand::RegisterCustomEvent(_) => "REGISTER_CUSTOM_EVENT",
        }
    }
}

/// Flags attached to a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferFlags(u32);

impl BufferFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// This request is the last of the stream.
    pub const EOS: Self = Self(1);

    /// Returns true if all bits in `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit pattern.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Outcome of a single read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadResult {
    /// Bytes placed at the start of the request buffer.
    pub bytes: usize,
    /// Capture timestamp of the block in microseconds, if the driver has one.
    pub timestamp_us: Option<u64>,
}

/// An event raised by a module in an open graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverEvent {
    /// Event identifier.
    pub event_id: u32,
    /// Raw event payload.
    pub payload: Vec<u8>,
}

/// Callback invoked by the driver when a registered event fires.
///
/// Runs on a driver thread; it must not call back into the same graph.
pub type EventCallback = Box<dyn Fn(&DriverEvent) + Send + Sync>;

/// Data handed to the driver's process-wide initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    /// Calibration database files.
    pub calibration_files: Vec<PathBuf>,
    /// Delta-calibration file.
    pub delta_file: PathBuf,
    /// Preloaded calibration address (0 = none).
    pub calibration_addr: u64,
    /// Number of DSP readiness probes.
    pub max_ready_checks: u32,
    /// Interval between probes.
    pub ready_check_interval: Duration,
}

impl From<&DriverConfig> for InitData {
    fn from(config: &DriverConfig) -> Self {
        Self {
            calibration_files: config.calibration_files.clone(),
            delta_file: config.delta_file.clone(),
            calibration_addr: config.calibration_addr,
            max_ready_checks: config.max_ready_checks,
            ready_check_interval: Duration::from_millis(u64::from(config.ready_check_interval_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_data_from_config() {
        let config = DriverConfig::new("/cal.acdb").with_ready_checks(4, 25);
        let data = InitData::from(&config);
        assert_eq!(data.calibration_files, vec![PathBuf::from("/cal.acdb")]);
        assert_eq!(data.max_ready_checks, 4);
        assert_eq!(data.ready_check_interval, Duration::from_millis(25));
    }

    #[test]
    fn eos_flag() {
        assert!(BufferFlags::EOS.contains(BufferFlags::EOS));
        assert!(!BufferFlags::NONE.contains(BufferFlags::EOS));
        assert!(BufferFlags::NONE.contains(BufferFlags::NONE));
    }

    #[test]
    fn first_instance() {
        let info = ModuleInfo::new(vec![
            ModuleEntry {
                module_id: 1,
                module_iid: 0x4001,
            },
            ModuleEntry {
                module_id: 1,
                module_iid: 0x4002,
            },
        ]);
        assert_eq!(info.first_instance(), Some(0x4001));
        assert_eq!(ModuleInfo::default().first_instance(), None);
    }
}
