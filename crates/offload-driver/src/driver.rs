//! The graph runtime capability trait.

use offload_core::{KeyVector, ModuleTag};

use crate::Result;
use crate::types::{
    BufferFlags, DriverCommand, EventCallback, GraphHandle, InitData, ModuleInfo, ReadResult,
};

/// The operation set of the offloaded graph runtime.
///
/// One implementation wraps the vendor library; [`SimDriver`](crate::sim::SimDriver)
/// models it in-process. The trait is object-safe so a
/// [`DriverBinding`](crate::DriverBinding) can hold any implementation as
/// `Arc<dyn GraphDriver>` and share it across sessions.
///
/// ## Threading
///
/// Implementations are shared by every open session and must be `Send + Sync`.
/// Calls on different handles may run concurrently; calls on the same handle
/// are serialised by the owning session. [`read`](Self::read) and
/// [`write`](Self::write) block the caller until the driver has moved the
/// block, with no timeout.
pub trait GraphDriver: Send + Sync {
    /// Process-wide initialisation with calibration data.
    fn init(&self, data: &InitData) -> Result<()>;

    /// Process-wide teardown.
    fn deinit(&self);

    /// Instantiate the graph selected by `gkv`, calibrated by `ckv`.
    fn open(&self, gkv: &KeyVector, ckv: &KeyVector) -> Result<GraphHandle>;

    /// Tear down a graph. The handle is invalid after success.
    fn close(&self, handle: &GraphHandle) -> Result<()>;

    /// Apply the calibration selected by `ckv` to the graph selected by `gkv`.
    fn set_cal(&self, handle: &GraphHandle, gkv: &KeyVector, ckv: &KeyVector) -> Result<()>;

    /// Apply the tag key vector `tkv` to the modules carrying `tag`.
    fn set_config(
        &self,
        handle: &GraphHandle,
        gkv: &KeyVector,
        tag: ModuleTag,
        tkv: &KeyVector,
    ) -> Result<()>;

    /// Push a raw parameter payload; the payload header addresses the module instance.
    fn set_custom_config(&self, handle: &GraphHandle, payload: &[u8]) -> Result<()>;

    /// Fill `payload` (header pre-populated by the caller) with the current
    /// parameter value. Returns the number of valid bytes.
    fn get_custom_config(&self, handle: &GraphHandle, payload: &mut [u8]) -> Result<usize>;

    /// Issue a graph command.
    fn ioctl(&self, handle: &GraphHandle, command: &DriverCommand) -> Result<()>;

    /// Resolve `tag` against the topology selected by `gkv`.
    ///
    /// Returns [`DriverError::TagNotFound`](crate::DriverError::TagNotFound)
    /// when the topology has no module with that role.
    fn get_tagged_module_info(&self, gkv: &KeyVector, tag: ModuleTag) -> Result<ModuleInfo>;

    /// Fill `payload` (header pre-populated) from the module carrying `tag`.
    fn get_tagged_custom_config(
        &self,
        handle: &GraphHandle,
        tag: ModuleTag,
        payload: &mut [u8],
    ) -> Result<()>;

    /// Route events raised inside the graph to `callback`.
    fn register_event_callback(&self, handle: &GraphHandle, callback: EventCallback)
    -> Result<()>;

    /// Blocking capture of up to `buf.len()` bytes from the module carrying `tag`.
    fn read(&self, handle: &GraphHandle, tag: ModuleTag, buf: &mut [u8]) -> Result<ReadResult>;

    /// Blocking render of `buf` to the module carrying `tag`. Returns bytes accepted.
    fn write(
        &self,
        handle: &GraphHandle,
        tag: ModuleTag,
        buf: &[u8],
        flags: BufferFlags,
    ) -> Result<usize>;
}
