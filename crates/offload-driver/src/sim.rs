//! Deterministic in-process graph runtime.
//!
//! [`SimDriver`] implements [`GraphDriver`] without any hardware. It records
//! every call in order, resolves tags against a configurable topology, and
//! serves reads and writes from a block-level model with scripted short,
//! zero-byte or failing responses. Any operation, or a single `ioctl`
//! command, can be made to fail with a vendor status code.
//!
//! ```rust
//! use offload_core::{KeyVector, ModuleTag};
//! use offload_driver::GraphDriver;
//! use offload_driver::sim::SimDriver;
//!
//! let driver = SimDriver::new().with_module(ModuleTag::STREAM_PCM_DECODER, 0x10, 0x4001);
//! let gkv = KeyVector::new();
//! let info = driver.get_tagged_module_info(&gkv, ModuleTag::STREAM_PCM_DECODER).unwrap();
//! assert_eq!(info.first_instance(), Some(0x4001));
//! assert!(driver.get_tagged_module_info(&gkv, ModuleTag::DEVICE_PP_RX).is_err());
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use offload_core::{KeyVector, ModuleTag};
use parking_lot::Mutex;

use crate::binding::{DriverLoader, LoadedLibrary};
use crate::driver::GraphDriver;
use crate::error::{DriverError, Operation, Result};
use crate::types::{
    BufferFlags, DriverCommand, DriverEvent, EventCallback, GraphHandle, InitData, ModuleEntry,
    ModuleInfo, ReadResult,
};

/// Status code returned by injected failures unless another is given.
pub const SIM_FAILURE_STATUS: i32 = -22;

const FIRST_HANDLE: u64 = 0x1000;
const FILL_BYTE: u8 = 0x5a;

/// One call observed by a [`SimDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    /// `init`.
    Init,
    /// `deinit`.
    Deinit,
    /// `open` with the key vectors it was given.
    Open {
        /// Graph key vector.
        gkv: KeyVector,
        /// Calibration key vector.
        ckv: KeyVector,
    },
    /// `close` of the raw handle.
    Close(u64),
    /// `set_cal`.
    SetCal {
        /// Graph key vector.
        gkv: KeyVector,
        /// Calibration key vector.
        ckv: KeyVector,
    },
    /// `set_config`.
    SetConfig {
        /// Tag the key vector was applied to.
        tag: ModuleTag,
        /// Tag key vector.
        tkv: KeyVector,
    },
    /// `set_custom_config` with the pushed payload.
    SetCustomConfig(Vec<u8>),
    /// `get_custom_config`.
    GetCustomConfig,
    /// `ioctl`.
    Ioctl(DriverCommand),
    /// `get_tagged_module_info`.
    GetTaggedModuleInfo(ModuleTag),
    /// `get_tagged_custom_config`.
    GetTaggedCustomConfig(ModuleTag),
    /// `register_event_callback`.
    RegisterEventCallback,
    /// `read` with the requested length.
    Read {
        /// Tag read from.
        tag: ModuleTag,
        /// Requested bytes.
        len: usize,
    },
    /// `write` with the offered length and flags.
    Write {
        /// Tag written to.
        tag: ModuleTag,
        /// Offered bytes.
        len: usize,
        /// Request flags.
        flags: BufferFlags,
    },
}

/// Scripted response to one read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimRead {
    /// Fill the whole request.
    Full,
    /// Return at most this many bytes.
    Bytes(usize),
    /// Return zero bytes.
    Zero,
    /// Fail with a status.
    Fail(i32),
}

/// Scripted response to one write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimWrite {
    /// Accept the whole request.
    Full,
    /// Accept at most this many bytes.
    Bytes(usize),
    /// Fail with a status.
    Fail(i32),
}

#[derive(Default)]
struct SimState {
    next_handle: u64,
    open: HashSet<u64>,
    topology: HashMap<ModuleTag, ModuleInfo>,
    calls: Vec<SimCall>,
    read_script: VecDeque<SimRead>,
    read_timestamp_us: Option<u64>,
    write_script: VecDeque<SimWrite>,
    write_fail_at: Option<usize>,
    writes_seen: usize,
    failures: HashMap<Operation, i32>,
    command_failures: HashMap<&'static str, i32>,
    custom_config_response: Vec<u8>,
    tagged_responses: HashMap<ModuleTag, Vec<u8>>,
    callbacks: HashMap<u64, Vec<Arc<dyn Fn(&DriverEvent) + Send + Sync>>>,
    init_data: Option<InitData>,
}

impl SimState {
    fn check(&self, op: Operation) -> Result<()> {
        match self.failures.get(&op) {
            Some(&status) => Err(DriverError::status(op, status)),
            None => Ok(()),
        }
    }

    fn check_handle(&self, handle: &GraphHandle) -> Result<()> {
        if self.open.contains(&handle.raw()) {
            Ok(())
        } else {
            Err(DriverError::InvalidHandle(handle.raw()))
        }
    }
}

/// In-process model of the graph runtime.
pub struct SimDriver {
    state: Mutex<SimState>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// A driver with an empty topology that fills every read.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_handle: FIRST_HANDLE,
                ..SimState::default()
            }),
        }
    }

    /// Add a module occupying `tag` to the topology.
    pub fn with_module(self, tag: ModuleTag, module_id: u32, module_iid: u32) -> Self {
        self.add_module(tag, module_id, module_iid);
        self
    }

    /// Timestamp reported with every read.
    pub fn with_read_timestamp(self, micros: u64) -> Self {
        self.state.lock().read_timestamp_us = Some(micros);
        self
    }

    /// Add a module occupying `tag` to the topology of a shared driver.
    pub fn add_module(&self, tag: ModuleTag, module_id: u32, module_iid: u32) {
        self.state
            .lock()
            .topology
            .entry(tag)
            .or_default()
            .entries
            .push(ModuleEntry {
                module_id,
                module_iid,
            });
    }

    /// Make `op` fail with `status` until [`clear_failure`](Self::clear_failure).
    pub fn fail(&self, op: Operation, status: i32) {
        self.state.lock().failures.insert(op, status);
    }

    /// Stop injecting failures into `op`.
    pub fn clear_failure(&self, op: Operation) {
        self.state.lock().failures.remove(&op);
    }

    /// Queue responses for the next read requests. Unscripted reads fill fully.
    pub fn script_reads(&self, script: impl IntoIterator<Item = SimRead>) {
        self.state.lock().read_script.extend(script);
    }

    /// Queue responses for the next write requests. Unscripted writes are
    /// accepted whole.
    pub fn script_writes(&self, script: impl IntoIterator<Item = SimWrite>) {
        self.state.lock().write_script.extend(script);
    }

    /// Reject `ioctl` requests whose [`DriverCommand::name`] is `name`.
    /// Other commands still succeed.
    pub fn fail_command(&self, name: &'static str, status: i32) {
        self.state.lock().command_failures.insert(name, status);
    }

    /// Stop rejecting the command named `name`.
    pub fn clear_command_failure(&self, name: &str) {
        self.state.lock().command_failures.remove(name);
    }

    /// Fail the write request with this zero-based index (counted from now).
    pub fn fail_write_at(&self, index: usize) {
        let mut state = self.state.lock();
        state.writes_seen = 0;
        state.write_fail_at = Some(index);
    }

    /// Bytes copied into buffers passed to `get_custom_config`.
    pub fn set_custom_config_response(&self, bytes: Vec<u8>) {
        self.state.lock().custom_config_response = bytes;
    }

    /// Bytes copied into buffers passed to `get_tagged_custom_config` for `tag`.
    pub fn set_tagged_response(&self, tag: ModuleTag, bytes: Vec<u8>) {
        self.state.lock().tagged_responses.insert(tag, bytes);
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<SimCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Commands issued through `ioctl`, in order.
    pub fn commands(&self) -> Vec<DriverCommand> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SimCall::Ioctl(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Payloads pushed through `set_custom_config`, in order.
    pub fn custom_configs(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SimCall::SetCustomConfig(payload) => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of graphs currently open.
    pub fn open_graphs(&self) -> usize {
        self.state.lock().open.len()
    }

    /// Data passed to the last successful `init`, cleared by `deinit`.
    pub fn init_data(&self) -> Option<InitData> {
        self.state.lock().init_data.clone()
    }

    /// Deliver `event` to every callback registered on `handle`.
    ///
    /// Returns the number of callbacks invoked. Callbacks run on the calling
    /// thread after the driver state is released.
    pub fn emit_event(&self, handle: u64, event: &DriverEvent) -> usize {
        let callbacks = self
            .state
            .lock()
            .callbacks
            .get(&handle)
            .cloned()
            .unwrap_or_default();
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    fn record(&self, call: SimCall) -> parking_lot::MutexGuard<'_, SimState> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
    }
}

impl GraphDriver for SimDriver {
    fn init(&self, data: &InitData) -> Result<()> {
        let mut state = self.record(SimCall::Init);
        state.check(Operation::Init)?;
        state.init_data = Some(data.clone());
        Ok(())
    }

    fn deinit(&self) {
        let mut state = self.record(SimCall::Deinit);
        state.init_data = None;
        state.callbacks.clear();
    }

    fn open(&self, gkv: &KeyVector, ckv: &KeyVector) -> Result<GraphHandle> {
        let mut state = self.record(SimCall::Open {
            gkv: gkv.clone(),
            ckv: ckv.clone(),
        });
        state.check(Operation::Open)?;
        let raw = state.next_handle;
        state.next_handle += 1;
        state.open.insert(raw);
        Ok(GraphHandle::from_raw(raw))
    }

    fn close(&self, handle: &GraphHandle) -> Result<()> {
        let mut state = self.record(SimCall::Close(handle.raw()));
        state.check_handle(handle)?;
        state.check(Operation::Close)?;
        state.open.remove(&handle.raw());
        state.callbacks.remove(&handle.raw());
        Ok(())
    }

    fn set_cal(&self, handle: &GraphHandle, gkv: &KeyVector, ckv: &KeyVector) -> Result<()> {
        let state = self.record(SimCall::SetCal {
            gkv: gkv.clone(),
            ckv: ckv.clone(),
        });
        state.check_handle(handle)?;
        state.check(Operation::SetCal)
    }

    fn set_config(
        &self,
        handle: &GraphHandle,
        _gkv: &KeyVector,
        tag: ModuleTag,
        tkv: &KeyVector,
    ) -> Result<()> {
        let state = self.record(SimCall::SetConfig {
            tag,
            tkv: tkv.clone(),
        });
        state.check_handle(handle)?;
        state.check(Operation::SetConfig)
    }

    fn set_custom_config(&self, handle: &GraphHandle, payload: &[u8]) -> Result<()> {
        let state = self.record(SimCall::SetCustomConfig(payload.to_vec()));
        state.check_handle(handle)?;
        state.check(Operation::SetCustomConfig)
    }

    fn get_custom_config(&self, handle: &GraphHandle, payload: &mut [u8]) -> Result<usize> {
        let state = self.record(SimCall::GetCustomConfig);
        state.check_handle(handle)?;
        state.check(Operation::GetCustomConfig)?;
        let n = state.custom_config_response.len().min(payload.len());
        payload[..n].copy_from_slice(&state.custom_config_response[..n]);
        Ok(n)
    }

    fn ioctl(&self, handle: &GraphHandle, command: &DriverCommand) -> Result<()> {
        let state = self.record(SimCall::Ioctl(command.clone()));
        state.check_handle(handle)?;
        state.check(Operation::Ioctl)?;
        match state.command_failures.get(command.name()) {
            Some(&status) => Err(DriverError::status(Operation::Ioctl, status)),
            None => Ok(()),
        }
    }

    fn get_tagged_module_info(&self, _gkv: &KeyVector, tag: ModuleTag) -> Result<ModuleInfo> {
        let state = self.record(SimCall::GetTaggedModuleInfo(tag));
        state.check(Operation::GetTaggedModuleInfo)?;
        state
            .topology
            .get(&tag)
            .filter(|info| !info.is_empty())
            .cloned()
            .ok_or(DriverError::TagNotFound { tag })
    }

    fn get_tagged_custom_config(
        &self,
        handle: &GraphHandle,
        tag: ModuleTag,
        payload: &mut [u8],
    ) -> Result<()> {
        let state = self.record(SimCall::GetTaggedCustomConfig(tag));
        state.check_handle(handle)?;
        state.check(Operation::GetTaggedCustomConfig)?;
        let response = state
            .tagged_responses
            .get(&tag)
            .ok_or(DriverError::TagNotFound { tag })?;
        let n = response.len().min(payload.len());
        payload[..n].copy_from_slice(&response[..n]);
        Ok(())
    }

    fn register_event_callback(
        &self,
        handle: &GraphHandle,
        callback: EventCallback,
    ) -> Result<()> {
        let mut state = self.record(SimCall::RegisterEventCallback);
        state.check_handle(handle)?;
        state.check(Operation::RegisterEventCallback)?;
        state
            .callbacks
            .entry(handle.raw())
            .or_default()
            .push(Arc::from(callback));
        Ok(())
    }

    fn read(&self, handle: &GraphHandle, tag: ModuleTag, buf: &mut [u8]) -> Result<ReadResult> {
        let mut state = self.record(SimCall::Read {
            tag,
            len: buf.len(),
        });
        state.check_handle(handle)?;
        state.check(Operation::Read)?;
        let bytes = match state.read_script.pop_front().unwrap_or(SimRead::Full) {
            SimRead::Full => buf.len(),
            SimRead::Bytes(n) => n.min(buf.len()),
            SimRead::Zero => 0,
            SimRead::Fail(status) => return Err(DriverError::status(Operation::Read, status)),
        };
        buf[..bytes].fill(FILL_BYTE);
        Ok(ReadResult {
            bytes,
            timestamp_us: state.read_timestamp_us,
        })
    }

    fn write(
        &self,
        handle: &GraphHandle,
        tag: ModuleTag,
        buf: &[u8],
        flags: BufferFlags,
    ) -> Result<usize> {
        let mut state = self.record(SimCall::Write {
            tag,
            len: buf.len(),
            flags,
        });
        state.check_handle(handle)?;
        state.check(Operation::Write)?;
        let index = state.writes_seen;
        state.writes_seen += 1;
        if state.write_fail_at == Some(index) {
            return Err(DriverError::status(Operation::Write, SIM_FAILURE_STATUS));
        }
        match state.write_script.pop_front().unwrap_or(SimWrite::Full) {
            SimWrite::Full => Ok(buf.len()),
            SimWrite::Bytes(n) => Ok(n.min(buf.len())),
            SimWrite::Fail(status) => Err(DriverError::status(Operation::Write, status)),
        }
    }
}

impl std::fmt::Debug for SimDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimDriver")
            .field("open", &state.open.len())
            .field("tags", &state.topology.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

/// Loader handing out a shared [`SimDriver`].
///
/// Clones share their load/unload counters, so a test can keep one clone and
/// move another into a [`DriverBinding`](crate::DriverBinding).
#[derive(Clone)]
pub struct SimLoader {
    driver: Arc<SimDriver>,
    withheld: Vec<Operation>,
    unavailable: bool,
    loads: Arc<AtomicUsize>,
    unloads: Arc<AtomicUsize>,
}

impl SimLoader {
    /// Library name reported by every sim loader.
    pub const LIBRARY: &'static str = "libgraph-sim.so";

    /// A loader exporting every operation of `driver`.
    pub fn new(driver: Arc<SimDriver>) -> Self {
        Self {
            driver,
            withheld: Vec::new(),
            unavailable: false,
            loads: Arc::new(AtomicUsize::new(0)),
            unloads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Do not export `op`.
    pub fn without(mut self, op: Operation) -> Self {
        self.withheld.push(op);
        self
    }

    /// Fail every load as if the library file did not exist.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Successful loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Libraries unloaded so far.
    pub fn unload_count(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }
}

impl DriverLoader for SimLoader {
    fn library_name(&self) -> &str {
        Self::LIBRARY
    }

    fn load(&self) -> Result<LoadedLibrary> {
        if self.unavailable {
            return Err(DriverError::LibraryUnavailable {
                library: Self::LIBRARY.to_string(),
                reason: "no such file".to_string(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        let exported = Operation::ALL
            .iter()
            .copied()
            .filter(|op| !self.withheld.contains(op))
            .collect();
        let unloads = Arc::clone(&self.unloads);
        let driver: Arc<dyn GraphDriver> = self.driver.clone();
        Ok(LoadedLibrary::new(driver, exported).on_unload(move || {
            unloads.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphSelect;

    fn open(driver: &SimDriver) -> GraphHandle {
        driver.open(&KeyVector::new(), &KeyVector::new()).unwrap()
    }

    #[test]
    fn handles_are_distinct_and_closable_once() {
        let driver = SimDriver::new();
        let a = open(&driver);
        let b = open(&driver);
        assert_ne!(a, b);
        assert_eq!(driver.open_graphs(), 2);

        driver.close(&a).unwrap();
        assert!(matches!(driver.close(&a), Err(DriverError::InvalidHandle(_))));
        assert_eq!(driver.open_graphs(), 1);
    }

    #[test]
    fn read_script_then_full() {
        let driver = SimDriver::new().with_read_timestamp(1_500_000);
        let h = open(&driver);
        driver.script_reads([SimRead::Bytes(3), SimRead::Zero, SimRead::Fail(-5)]);
        let mut buf = [0u8; 8];
        let tag = ModuleTag::STREAM_PCM_ENCODER;

        assert_eq!(driver.read(&h, tag, &mut buf).unwrap().bytes, 3);
        assert_eq!(driver.read(&h, tag, &mut buf).unwrap().bytes, 0);
        assert!(driver.read(&h, tag, &mut buf).is_err());

        let full = driver.read(&h, tag, &mut buf).unwrap();
        assert_eq!(full.bytes, 8);
        assert_eq!(full.timestamp_us, Some(1_500_000));
        assert!(buf.iter().all(|&b| b == FILL_BYTE));
    }

    #[test]
    fn write_failure_injection_by_index() {
        let driver = SimDriver::new();
        let h = open(&driver);
        driver.fail_write_at(1);
        let tag = ModuleTag::STREAM_PCM_DECODER;
        assert_eq!(driver.write(&h, tag, &[0; 4], BufferFlags::NONE).unwrap(), 4);
        assert!(driver.write(&h, tag, &[0; 4], BufferFlags::NONE).is_err());
        assert_eq!(driver.write(&h, tag, &[0; 4], BufferFlags::EOS).unwrap(), 4);
    }

    #[test]
    fn write_script_then_whole() {
        let driver = SimDriver::new();
        let h = open(&driver);
        driver.script_writes([SimWrite::Bytes(3), SimWrite::Fail(-32)]);
        let tag = ModuleTag::STREAM_PCM_DECODER;
        assert_eq!(driver.write(&h, tag, &[0; 8], BufferFlags::NONE).unwrap(), 3);
        assert!(matches!(
            driver.write(&h, tag, &[0; 8], BufferFlags::NONE),
            Err(DriverError::Status {
                op: Operation::Write,
                status: -32
            })
        ));
        assert_eq!(driver.write(&h, tag, &[0; 8], BufferFlags::NONE).unwrap(), 8);
    }

    #[test]
    fn command_failure_is_per_command() {
        let driver = SimDriver::new();
        let h = open(&driver);
        driver.fail_command("ADD_GRAPH", -22);
        let add = DriverCommand::AddGraph(GraphSelect::default());
        assert!(driver.ioctl(&h, &add).is_err());
        assert!(driver.ioctl(&h, &DriverCommand::Start).is_ok());

        driver.clear_command_failure("ADD_GRAPH");
        assert!(driver.ioctl(&h, &add).is_ok());
    }

    #[test]
    fn operation_failure_injection() {
        let driver = SimDriver::new();
        driver.fail(Operation::Open, -19);
        let err = driver
            .open(&KeyVector::new(), &KeyVector::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Status {
                op: Operation::Open,
                status: -19
            }
        ));
        driver.clear_failure(Operation::Open);
        assert!(driver.open(&KeyVector::new(), &KeyVector::new()).is_ok());
    }

    #[test]
    fn events_reach_registered_callbacks() {
        let driver = SimDriver::new();
        let h = open(&driver);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        driver
            .register_event_callback(
                &h,
                Box::new(move |event: &DriverEvent| {
                    counter.fetch_add(event.payload.len(), Ordering::SeqCst);
                }),
            )
            .unwrap();

        let event = DriverEvent {
            event_id: 7,
            payload: vec![1, 2, 3],
        };
        assert_eq!(driver.emit_event(h.raw(), &event), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(driver.emit_event(h.raw() + 1, &event), 0);
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let driver = SimDriver::new();
        let h = open(&driver);
        driver.ioctl(&h, &DriverCommand::Prepare).unwrap();
        driver.ioctl(&h, &DriverCommand::Start).unwrap();
        assert_eq!(
            driver.commands(),
            vec![DriverCommand::Prepare, DriverCommand::Start]
        );
        assert!(matches!(driver.calls()[0], SimCall::Open { .. }));
    }
}
