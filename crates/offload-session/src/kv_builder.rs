//! Key-vector derivation.
//!
//! Three key vectors address a graph in the runtime:
//!
//! - **gkv** (graph key vector) selects the graph: one stream key derived
//!   from the stream type and direction, then one key per routed device
//! - **ckv** (calibration key vector) selects calibration data: empty at
//!   open, a volume level once volume calibration is applied
//! - **tkv** (tag key vector) selects a runtime setting for one tag: mute,
//!   pause, or the sample rate of the rate adapter
//!
//! Key order is significant: the runtime matches vectors positionally.

use offload_core::keys::{key, value};
use offload_core::{
    DeviceId, DeviceInfo, Direction, KeyValuePair, KeyVector, ModuleTag, StreamAttributes,
    StreamType, tag_sample_rate,
};

use crate::error::{Result, SessionError};

/// Highest calibration volume level.
pub const MAX_VOLUME_LEVEL: u32 = value::LEVEL_15;

/// The stream key for `(stream_type, direction)`.
pub fn stream_key(stream_type: StreamType, direction: Direction) -> Result<KeyValuePair> {
    let (k, v) = match (stream_type, direction) {
        (StreamType::LowLatency, Direction::Output) => (key::STREAMRX, value::PCM_LL_PLAYBACK),
        (StreamType::LowLatency, Direction::Input) => (key::STREAMTX, value::PCM_RECORD),
        (StreamType::DeepBuffer, Direction::Output) => (key::STREAMRX, value::PCM_DEEP_BUFFER),
        (StreamType::Compressed, Direction::Output) => {
            (key::STREAMRX, value::COMPRESSED_OFFLOAD_PLAYBACK)
        }
        (StreamType::VoipRx, Direction::Output) => (key::STREAMRX, value::VOIP_RX_PLAYBACK),
        (StreamType::VoipTx, Direction::Input) => (key::STREAMTX, value::VOIP_TX_RECORD),
        (StreamType::VoiceUi, Direction::Input) => (key::STREAMTX, value::VOICE_UI),
        _ => {
            return Err(SessionError::UnsupportedStream {
                stream_type,
                direction,
            });
        }
    };
    Ok(KeyValuePair::new(k, v))
}

/// The device key for `id`, if the device has a graph role.
pub fn device_key(id: DeviceId) -> Option<KeyValuePair> {
    let (k, v) = match id {
        DeviceId::OUT_EARPIECE => (key::DEVICERX, value::HANDSET),
        DeviceId::OUT_SPEAKER => (key::DEVICERX, value::SPEAKER),
        DeviceId::OUT_WIRED_HEADSET | DeviceId::OUT_WIRED_HEADPHONE => {
            (key::DEVICERX, value::HEADPHONES)
        }
        DeviceId::OUT_BLUETOOTH_SCO | DeviceId::OUT_BLUETOOTH_A2DP => (key::DEVICERX, value::BT_RX),
        DeviceId::IN_HANDSET_MIC => (key::DEVICETX, value::HANDSETMIC),
        DeviceId::IN_SPEAKER_MIC => (key::DEVICETX, value::SPEAKER_MIC),
        DeviceId::IN_TRI_MIC => (key::DEVICETX, value::TRI_MIC),
        DeviceId::IN_WIRED_HEADSET => (key::DEVICETX, value::HEADPHONE_MIC),
        DeviceId::IN_BLUETOOTH_SCO_HEADSET => (key::DEVICETX, value::BT_TX),
        _ => return None,
    };
    Some(KeyValuePair::new(k, v))
}

/// Build the graph key vector for a stream routed to `devices`.
///
/// # Example
///
/// ```rust
/// use offload_core::keys::{key, value};
/// use offload_core::{DeviceId, DeviceInfo, MediaConfig, StreamAttributes, StreamType};
/// use offload_session::kv_builder::graph_key_vector;
///
/// let media = MediaConfig::new(48_000, 16, 2);
/// let stream = StreamAttributes::output(StreamType::LowLatency, media);
/// let speaker = DeviceInfo::new(DeviceId::OUT_SPEAKER, media);
///
/// let gkv = graph_key_vector(&stream, &[speaker]).unwrap();
/// assert_eq!(gkv.value_of(key::STREAMRX), Some(value::PCM_LL_PLAYBACK));
/// assert_eq!(gkv.value_of(key::DEVICERX), Some(value::SPEAKER));
/// ```
pub fn graph_key_vector(stream: &StreamAttributes, devices: &[DeviceInfo]) -> Result<KeyVector> {
    let mut gkv = KeyVector::new();
    gkv.push_unique(stream_key(stream.stream_type, stream.direction)?);
    for device in devices {
        if let Some(pair) = device_key(device.id) {
            gkv.push_unique(pair);
        }
    }
    Ok(gkv)
}

/// Calibration level for a linear volume, `round(volume * 15)` clamped to `0..=15`.
pub fn volume_level(volume: f32) -> u32 {
    if volume.is_nan() {
        return value::LEVEL_0;
    }
    let level = (volume * MAX_VOLUME_LEVEL as f32).round();
    level.clamp(value::LEVEL_0 as f32, MAX_VOLUME_LEVEL as f32) as u32
}

/// Calibration key vector selecting the volume level for `volume`.
pub fn calibration_key_vector(volume: f32) -> KeyVector {
    KeyVector::from(vec![(key::VOLUME, volume_level(volume))])
}

/// The tag actually sent to the runtime for `tag`, plus its tag key vector.
///
/// Mute and unmute both address the mute module; pause and resume both
/// address the pause module; every rate-adapter tag addresses the stream
/// rate converter with the rate as value.
pub fn tag_key_vector(tag: ModuleTag) -> Result<(ModuleTag, KeyVector)> {
    let (sent, k, v) = match tag {
        ModuleTag::MUTE => (ModuleTag::MUTE, key::MUTE, value::ON),
        ModuleTag::UNMUTE => (ModuleTag::MUTE, key::MUTE, value::OFF),
        ModuleTag::PAUSE => (ModuleTag::PAUSE, key::PAUSE, value::ON),
        ModuleTag::RESUME => (ModuleTag::PAUSE, key::PAUSE, value::OFF),
        _ => match tag_sample_rate(tag) {
            Some(rate) => (ModuleTag::STREAM_MFC, key::SAMPLINGRATE, rate),
            None => return Err(SessionError::UnsupportedTag(tag)),
        },
    };
    Ok((sent, KeyVector::from(vec![(k, v)])))
}
