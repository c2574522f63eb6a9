//! Services a session consumes but does not own.
//!
//! A session never stores device or stream attributes and never lays out
//! payload bytes itself. It asks three collaborators:
//!
//! - [`StreamContext`] - the stream the session serves: attributes, the
//!   devices it is routed to, buffer sizing, volume, the application callback
//! - [`ResourceManager`] - process-wide catalogs and the registry of active
//!   devices and streams, shared with every other session
//! - [`PayloadBuilder`] - turns module addresses and semantic parameters into
//!   vendor payload blobs
//!
//! All three are object-safe and `Send + Sync` so they can be shared as
//! `Arc<dyn ...>` between sessions and driver callback threads.

use offload_core::{DeviceId, DeviceInfo, MediaConfig, ModuleTag, StreamAttributes};
use offload_driver::{DriverEvent, ModuleInfo};

use crate::configurator::SessionMediaConfig;
use crate::error::CollaboratorError;
use crate::params::{StreamSetupDuration, WakeUpBufferConfig, WakeUpConfig};

/// A binary payload addressed to one module instance (header + body).
pub type Payload = Vec<u8>;

/// Buffer sizing requested by a stream, per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferInfo {
    /// Capture block size in bytes.
    pub in_size: usize,
    /// Capture block count.
    pub in_count: usize,
    /// Render block size in bytes.
    pub out_size: usize,
    /// Render block count.
    pub out_count: usize,
}

/// Gain for the channels selected by `channel_mask`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelVolume {
    /// Bit mask of the channels this gain applies to.
    pub channel_mask: u32,
    /// Linear gain, 0.0 to 1.0.
    pub volume: f32,
}

/// Per-channel volume of a stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeData {
    /// Gain pairs; the first pair selects the calibration level.
    pub pairs: Vec<ChannelVolume>,
}

impl VolumeData {
    /// The same gain on every channel.
    pub fn uniform(volume: f32) -> Self {
        Self {
            pairs: vec![ChannelVolume {
                channel_mask: 0x3,
                volume,
            }],
        }
    }

    /// Gain of the first pair.
    pub fn primary(&self) -> Option<f32> {
        self.pairs.first().map(|p| p.volume)
    }
}

/// The stream a session serves.
pub trait StreamContext: Send + Sync {
    /// Current stream attributes.
    fn attributes(&self) -> Result<StreamAttributes, CollaboratorError>;

    /// Devices the stream is routed to, in routing order.
    fn associated_devices(&self) -> Result<Vec<DeviceInfo>, CollaboratorError>;

    /// Requested buffer sizing.
    fn buffer_info(&self) -> BufferInfo;

    /// Current volume, if one has been set.
    fn volume(&self) -> Option<VolumeData>;

    /// Deliver a driver event to the application callback.
    ///
    /// Called on a driver thread.
    fn notify(&self, event: &DriverEvent);
}

/// Process-wide catalogs and the active device/stream registry.
///
/// Snapshots returned here may be read while other sessions open and close;
/// consistency is the implementation's responsibility.
pub trait ResourceManager: Send + Sync {
    /// Tags configured by the stream pass, in order.
    fn stream_tags(&self) -> Result<Vec<ModuleTag>, CollaboratorError>;

    /// Tags configured by the device passes, in order.
    fn device_tags(&self) -> Result<Vec<ModuleTag>, CollaboratorError>;

    /// Hardware endpoint name of a device.
    fn device_endpoint_name(&self, id: DeviceId) -> Option<String>;

    /// Devices currently active across all sessions.
    fn active_devices(&self) -> Vec<DeviceInfo>;

    /// Attributes of the streams currently active on `device`.
    fn active_streams(&self, device: &DeviceInfo) -> Vec<StreamAttributes>;
}

/// Builds vendor payloads. `None` means the payload could not be built.
///
/// Module-addressed builders receive the resolved [`ModuleInfo`]; parameter
/// builders receive the first resolved instance ID.
pub trait PayloadBuilder: Send + Sync {
    /// Media format payload for a stream-pass tag.
    fn stream_config(
        &self,
        info: &ModuleInfo,
        tag: ModuleTag,
        media: &SessionMediaConfig,
    ) -> Option<Payload>;

    /// Hardware endpoint payload for an endpoint tag.
    fn device_ep_config(
        &self,
        info: &ModuleInfo,
        tag: ModuleTag,
        media: &MediaConfig,
        endpoint: &str,
    ) -> Option<Payload>;

    /// Device media format payload for a device-pass tag.
    fn device_config(&self, info: &ModuleInfo, tag: ModuleTag, media: &MediaConfig)
    -> Option<Payload>;

    /// Volume payload for a calibrated module.
    fn volume(&self, module_iid: u32, volume: &VolumeData, tag: ModuleTag) -> Option<Payload>;

    /// Detection engine sound model.
    fn sound_model(&self, module_iid: u32, model: &[u8]) -> Option<Payload>;

    /// Detection engine wake-up configuration.
    fn wakeup_config(&self, module_iid: u32, config: &WakeUpConfig) -> Option<Payload>;

    /// Detection engine generic event configuration.
    fn event_config(&self, module_iid: u32, config: &[u8]) -> Option<Payload>;

    /// Wake-up history buffering configuration.
    fn wakeup_buffer_config(&self, module_iid: u32, config: &WakeUpBufferConfig)
    -> Option<Payload>;

    /// Downstream setup duration of the data-arbitration module.
    fn stream_setup_duration(
        &self,
        module_iid: u32,
        duration: &StreamSetupDuration,
    ) -> Option<Payload>;

    /// Detection engine reset.
    fn engine_reset(&self, module_iid: u32) -> Option<Payload>;
}
