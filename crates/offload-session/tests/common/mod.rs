//! Shared fakes for session tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use offload_config::DriverConfig;
use offload_core::{DeviceId, DeviceInfo, MediaConfig, ModuleTag, StreamAttributes};
use offload_driver::sim::{SimDriver, SimLoader};
use offload_driver::{DriverBinding, DriverEvent, ModuleInfo};
use offload_session::params::{StreamSetupDuration, WakeUpBufferConfig, WakeUpConfig};
use offload_session::{
    BufferInfo, CollaboratorError, Payload, PayloadBuilder, ResourceManager, Session,
    SessionMediaConfig, StreamContext, VolumeData,
};
use parking_lot::Mutex;

pub const STEREO_48K: MediaConfig = MediaConfig::new(48_000, 16, 2);
pub const MONO_16K: MediaConfig = MediaConfig::new(16_000, 16, 1);

pub const DECODER_IID: u32 = 0x4001;
pub const EP_RX_IID: u32 = 0x4002;
pub const PP_RX_IID: u32 = 0x4003;
pub const VOLUME_IID: u32 = 0x4004;
pub const ENCODER_IID: u32 = 0x4101;
pub const EP_TX_IID: u32 = 0x4102;
pub const PP_TX_IID: u32 = 0x4103;
pub const DETECTION_IID: u32 = 0x4104;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Payload produced by [`FakeBuilder`]: a kind byte, then the instance ID.
pub fn payload(kind: u8, iid: u32) -> Payload {
    let mut bytes = vec![kind];
    bytes.extend_from_slice(&iid.to_le_bytes());
    bytes
}

pub fn dev(id: DeviceId, media: MediaConfig) -> DeviceInfo {
    DeviceInfo::new(id, media)
}

/// Playback topology: decoder, speaker endpoint, device post-processing, volume.
pub fn playback_driver() -> SimDriver {
    SimDriver::new()
        .with_module(ModuleTag::STREAM_PCM_DECODER, 0x0700_1005, DECODER_IID)
        .with_module(ModuleTag::DEVICE_HW_ENDPOINT_RX, 0x0700_1000, EP_RX_IID)
        .with_module(ModuleTag::DEVICE_PP_RX, 0x0700_1066, PP_RX_IID)
        .with_module(ModuleTag::STREAM_VOLUME, 0x0700_1002, VOLUME_IID)
}

/// Capture topology: encoder, mic endpoint, echo canceller, detection engine.
pub fn capture_driver() -> SimDriver {
    SimDriver::new()
        .with_module(ModuleTag::STREAM_PCM_ENCODER, 0x0700_1006, ENCODER_IID)
        .with_module(ModuleTag::DEVICE_HW_ENDPOINT_TX, 0x0700_1001, EP_TX_IID)
        .with_module(ModuleTag::DEVICE_PP_TX, 0x0700_1067, PP_TX_IID)
        .with_module(ModuleTag::STREAM_POST_PROCESS, 0x0700_1100, DETECTION_IID)
}

pub struct FakeStream {
    attributes: Mutex<StreamAttributes>,
    devices: Mutex<Vec<DeviceInfo>>,
    buffers: Mutex<BufferInfo>,
    volume: Mutex<Option<VolumeData>>,
    events: Mutex<Vec<DriverEvent>>,
}

impl FakeStream {
    pub fn new(attributes: StreamAttributes, devices: Vec<DeviceInfo>) -> Self {
        Self {
            attributes: Mutex::new(attributes),
            devices: Mutex::new(devices),
            buffers: Mutex::new(BufferInfo {
                in_size: 640,
                in_count: 4,
                out_size: 1920,
                out_count: 4,
            }),
            volume: Mutex::new(None),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn playback(devices: Vec<DeviceInfo>) -> Arc<Self> {
        Arc::new(Self::new(
            StreamAttributes::output(offload_core::StreamType::LowLatency, STEREO_48K),
            devices,
        ))
    }

    pub fn capture(devices: Vec<DeviceInfo>) -> Arc<Self> {
        Arc::new(Self::new(
            StreamAttributes::input(offload_core::StreamType::LowLatency, MONO_16K),
            devices,
        ))
    }

    pub fn set_buffers(&self, buffers: BufferInfo) {
        *self.buffers.lock() = buffers;
    }

    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock() = Some(VolumeData::uniform(volume));
    }

    pub fn set_devices(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock() = devices;
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.events.lock().clone()
    }
}

impl StreamContext for FakeStream {
    fn attributes(&self) -> Result<StreamAttributes, CollaboratorError> {
        Ok(self.attributes.lock().clone())
    }

    fn associated_devices(&self) -> Result<Vec<DeviceInfo>, CollaboratorError> {
        Ok(self.devices.lock().clone())
    }

    fn buffer_info(&self) -> BufferInfo {
        *self.buffers.lock()
    }

    fn volume(&self) -> Option<VolumeData> {
        self.volume.lock().clone()
    }

    fn notify(&self, event: &DriverEvent) {
        self.events.lock().push(event.clone());
    }
}

pub struct FakeResourceManager {
    stream_tags: Vec<ModuleTag>,
    device_tags: Vec<ModuleTag>,
    endpoints: HashMap<DeviceId, String>,
    active: Mutex<Vec<(DeviceInfo, Vec<StreamAttributes>)>>,
}

impl FakeResourceManager {
    pub fn new() -> Self {
        let endpoints = [
            (DeviceId::OUT_SPEAKER, "CODEC_DMA-LPAIF_WSA-RX-0"),
            (DeviceId::OUT_WIRED_HEADPHONE, "CODEC_DMA-LPAIF_RXTX-RX-0"),
            (DeviceId::IN_HANDSET_MIC, "CODEC_DMA-LPAIF_VA-TX-0"),
            (DeviceId::IN_TRI_MIC, "CODEC_DMA-LPAIF_VA-TX-0"),
        ];
        Self {
            stream_tags: vec![
                ModuleTag::STREAM_INPUT_MEDIA_FORMAT,
                ModuleTag::STREAM_PCM_DECODER,
                ModuleTag::STREAM_PCM_ENCODER,
                ModuleTag::STREAM_PCM_CONVERTER,
            ],
            device_tags: vec![
                ModuleTag::DEVICE_HW_ENDPOINT_RX,
                ModuleTag::DEVICE_HW_ENDPOINT_TX,
                ModuleTag::DEVICE_PP_RX,
                ModuleTag::DEVICE_PP_TX,
            ],
            endpoints: endpoints
                .into_iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect(),
            active: Mutex::new(Vec::new()),
        }
    }

    pub fn without_endpoint(mut self, id: DeviceId) -> Self {
        self.endpoints.remove(&id);
        self
    }

    /// Register `device` as active, carrying `streams`.
    pub fn activate(&self, device: DeviceInfo, streams: Vec<StreamAttributes>) {
        self.active.lock().push((device, streams));
    }
}

impl ResourceManager for FakeResourceManager {
    fn stream_tags(&self) -> Result<Vec<ModuleTag>, CollaboratorError> {
        Ok(self.stream_tags.clone())
    }

    fn device_tags(&self) -> Result<Vec<ModuleTag>, CollaboratorError> {
        Ok(self.device_tags.clone())
    }

    fn device_endpoint_name(&self, id: DeviceId) -> Option<String> {
        self.endpoints.get(&id).cloned()
    }

    fn active_devices(&self) -> Vec<DeviceInfo> {
        self.active.lock().iter().map(|(d, _)| d.clone()).collect()
    }

    fn active_streams(&self, device: &DeviceInfo) -> Vec<StreamAttributes> {
        self.active
            .lock()
            .iter()
            .filter(|(d, _)| d.same_device(device))
            .flat_map(|(_, s)| s.iter().cloned())
            .collect()
    }
}

/// Payload builder tagging each payload with a kind byte and the instance ID.
///
/// | kind | payload |
/// |---|---|
/// | `S` | stream config |
/// | `E` | endpoint config |
/// | `D` | device config |
/// | `V` | volume |
/// | `M` | sound model |
/// | `W` | wake-up config |
/// | `G` | event config |
/// | `B` | wake-up buffer config |
/// | `T` | stream setup duration |
/// | `R` | engine reset |
#[derive(Default)]
pub struct FakeBuilder {
    refused: Mutex<HashSet<ModuleTag>>,
    refuse_params: Mutex<bool>,
    endpoints: Mutex<Vec<String>>,
    volumes: Mutex<Vec<f32>>,
}

impl FakeBuilder {
    pub fn refuse(&self, tag: ModuleTag) {
        self.refused.lock().insert(tag);
    }

    pub fn refuse_params(&self) {
        *self.refuse_params.lock() = true;
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().clone()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.volumes.lock().clone()
    }

    fn module(&self, kind: u8, info: &ModuleInfo, tag: ModuleTag) -> Option<Payload> {
        if self.refused.lock().contains(&tag) {
            return None;
        }
        Some(payload(kind, info.first_instance()?))
    }

    fn param(&self, kind: u8, iid: u32) -> Option<Payload> {
        if *self.refuse_params.lock() {
            return None;
        }
        Some(payload(kind, iid))
    }
}

impl PayloadBuilder for FakeBuilder {
    fn stream_config(
        &self,
        info: &ModuleInfo,
        tag: ModuleTag,
        _media: &SessionMediaConfig,
    ) -> Option<Payload> {
        self.module(b'S', info, tag)
    }

    fn device_ep_config(
        &self,
        info: &ModuleInfo,
        tag: ModuleTag,
        _media: &MediaConfig,
        endpoint: &str,
    ) -> Option<Payload> {
        self.endpoints.lock().push(endpoint.to_string());
        self.module(b'E', info, tag)
    }

    fn device_config(
        &self,
        info: &ModuleInfo,
        tag: ModuleTag,
        _media: &MediaConfig,
    ) -> Option<Payload> {
        self.module(b'D', info, tag)
    }

    fn volume(&self, module_iid: u32, volume: &VolumeData, tag: ModuleTag) -> Option<Payload> {
        if self.refused.lock().contains(&tag) {
            return None;
        }
        self.volumes.lock().extend(volume.primary());
        Some(payload(b'V', module_iid))
    }

    fn sound_model(&self, module_iid: u32, _model: &[u8]) -> Option<Payload> {
        self.param(b'M', module_iid)
    }

    fn wakeup_config(&self, module_iid: u32, _config: &WakeUpConfig) -> Option<Payload> {
        self.param(b'W', module_iid)
    }

    fn event_config(&self, module_iid: u32, _config: &[u8]) -> Option<Payload> {
        self.param(b'G', module_iid)
    }

    fn wakeup_buffer_config(
        &self,
        module_iid: u32,
        _config: &WakeUpBufferConfig,
    ) -> Option<Payload> {
        self.param(b'B', module_iid)
    }

    fn stream_setup_duration(
        &self,
        module_iid: u32,
        _duration: &StreamSetupDuration,
    ) -> Option<Payload> {
        self.param(b'T', module_iid)
    }

    fn engine_reset(&self, module_iid: u32) -> Option<Payload> {
        self.param(b'R', module_iid)
    }
}

/// A loaded binding plus the collaborators sessions are created with.
pub struct Fixture {
    pub sim: Arc<SimDriver>,
    pub binding: Arc<DriverBinding>,
    pub rm: Arc<FakeResourceManager>,
    pub builder: Arc<FakeBuilder>,
}

impl Fixture {
    pub fn new(sim: SimDriver) -> Self {
        Self::with_rm(sim, FakeResourceManager::new())
    }

    pub fn with_rm(sim: SimDriver, rm: FakeResourceManager) -> Self {
        init_tracing();
        let sim = Arc::new(sim);
        let binding = Arc::new(DriverBinding::new(SimLoader::new(Arc::clone(&sim))));
        binding
            .init(&DriverConfig::new("/vendor/etc/cal.acdb"))
            .unwrap();
        Self {
            sim,
            binding,
            rm: Arc::new(rm),
            builder: Arc::new(FakeBuilder::default()),
        }
    }

    pub fn session(&self) -> Session {
        Session::new(
            Arc::clone(&self.binding),
            self.rm.clone(),
            self.builder.clone(),
        )
    }
}
