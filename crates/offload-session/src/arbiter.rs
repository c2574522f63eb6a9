//! Concurrency arbitration.
//!
//! When a capture stream starts while the loudspeaker is playing (or
//! playback starts on the loudspeaker while a built-in microphone array is
//! capturing), the capture graph needs the echo-cancelling device
//! post-processing chain that references the playback signal. The arbiter
//! detects that pairing from the resource manager's active-device registry
//! and adds the matching subgraph to the already-open graph.
//!
//! The registry is read as a best-effort snapshot; no locking happens here.

use offload_core::keys::{key, value};
use offload_core::{DeviceId, DeviceInfo, Direction, KeyVector, StreamAttributes, StreamType};
use offload_driver::{DriverCommand, GraphSelect};

use crate::collaborators::ResourceManager;
use crate::configurator::GraphTarget;
use crate::error::{Result, SessionError};

/// A matched render/capture pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePair {
    /// Render side (the loudspeaker).
    pub rx: DeviceInfo,
    /// Capture side (a built-in microphone array).
    pub tx: DeviceInfo,
}

/// Capture stream key and device post-processing key for a concurrent use case.
///
/// | capture use case | direction | channels | keys |
/// |---|---|---|---|
/// | voice UI | any | any | `VOICE_UI`, `VOICE_UI_FLUENCE_FFECNS` |
/// | VoIP | any | any | `VOIP_TX_RECORD`, `VOIP_FLUENCE_PRO` |
/// | low latency | input | 3 or more | `PCM_RECORD`, `AUDIO_FLUENCE_PRO` |
/// | low latency | input | 1 | `PCM_RECORD`, `HFP_SINK_FLUENCE_SMECNS` |
///
/// Every other combination has no subgraph.
pub fn concurrency_keys(
    tx_stream: StreamType,
    direction: Direction,
    channels: u16,
) -> Option<(u32, u32)> {
    match tx_stream {
        StreamType::VoiceUi => Some((value::VOICE_UI, value::DEVICEPP_TX_VOICE_UI_FLUENCE_FFECNS)),
        StreamType::VoipTx => Some((value::VOIP_TX_RECORD, value::DEVICEPP_TX_VOIP_FLUENCE_PRO)),
        StreamType::LowLatency if direction == Direction::Input && channels >= 3 => {
            Some((value::PCM_RECORD, value::DEVICEPP_TX_AUDIO_FLUENCE_PRO))
        }
        StreamType::LowLatency if direction == Direction::Input && channels == 1 => {
            Some((value::PCM_RECORD, value::DEVICEPP_TX_HFP_SINK_FLUENCE_SMECNS))
        }
        _ => None,
    }
}

/// Find the loudspeaker/microphone pair linking this session to an active device.
///
/// A capture session pairs an active loudspeaker with its own microphone
/// array; a playback session pairs an active microphone array with its own
/// loudspeaker.
pub fn find_pair(
    direction: Direction,
    devices: &[DeviceInfo],
    active: &[DeviceInfo],
) -> Option<DevicePair> {
    let mut rx = None;
    let mut tx = None;
    for device in active {
        if device.id == DeviceId::OUT_SPEAKER && direction == Direction::Input {
            rx = Some(device);
            if let Some(mic) = devices.iter().rev().find(|d| d.id.is_mic_array()) {
                tx = Some(mic);
            }
        }
        if device.id.is_mic_array() && direction == Direction::Output {
            tx = Some(device);
            if let Some(speaker) = devices.iter().find(|d| d.id == DeviceId::OUT_SPEAKER) {
                rx = Some(speaker);
            }
        }
    }
    Some(DevicePair {
        rx: rx?.clone(),
        tx: tx?.clone(),
    })
}

/// The use case of the capture side of `pair`.
///
/// Returns `None` when the session is routed to a device outside the pair.
fn capture_stream_type(
    stream: &StreamAttributes,
    devices: &[DeviceInfo],
    pair: &DevicePair,
    rm: &dyn ResourceManager,
) -> Option<StreamType> {
    let mut tx_stream = StreamType::LowLatency;
    for device in devices {
        if device.same_device(&pair.rx) {
            if let Some(active) = rm.active_streams(&pair.tx).last() {
                tx_stream = active.stream_type;
            }
        } else if device.same_device(&pair.tx) {
            tx_stream = stream.stream_type;
        } else {
            tracing::debug!(device = %device.id, "concurrent use case unrelated to this stream");
            return None;
        }
    }
    Some(tx_stream)
}

/// The subgraph key vector this session needs, if any.
pub fn plan_patch(
    stream: &StreamAttributes,
    devices: &[DeviceInfo],
    rm: &dyn ResourceManager,
) -> Option<KeyVector> {
    let active = rm.active_devices();
    let Some(pair) = find_pair(stream.direction, devices, &active) else {
        tracing::debug!("no concurrent render/capture pair");
        return None;
    };
    tracing::debug!(rx = %pair.rx.id, tx = %pair.tx.id, "concurrent device pair");

    let tx_stream = capture_stream_type(stream, devices, &pair, rm)?;
    let Some((stream_value, pp_value)) =
        concurrency_keys(tx_stream, stream.direction, stream.in_media.channels)
    else {
        tracing::debug!(?tx_stream, "no subgraph for concurrent use case");
        return None;
    };

    let mut kv = KeyVector::new();
    kv.push(key::STREAMTX, stream_value);
    kv.push(key::DEVICEPP_TX, pp_value);
    if pair.tx.id.is_mic_array() {
        kv.push(key::DEVICETX, value::HANDSETMIC);
    }
    if pair.rx.id == DeviceId::OUT_SPEAKER {
        kv.push(key::DEVICERX, value::SPEAKER);
    }
    Some(kv)
}

/// Add the concurrency subgraph to the open graph when one is needed.
///
/// Returns the key vector that was submitted. Adding a subgraph that is
/// already present is left to the driver.
pub(crate) fn arbitrate(
    target: &GraphTarget<'_>,
    stream: &StreamAttributes,
    devices: &[DeviceInfo],
    rm: &dyn ResourceManager,
) -> Result<Option<KeyVector>> {
    let Some(graph_kv) = plan_patch(stream, devices, rm) else {
        return Ok(None);
    };
    tracing::debug!(kv = %graph_kv, "adding concurrency graph");
    let select = GraphSelect {
        graph_kv,
        cal_kv: KeyVector::new(),
    };
    target
        .driver
        .ioctl(target.handle, &DriverCommand::AddGraph(select.clone()))
        .map_err(SessionError::ConcurrencyPatch)?;
    Ok(Some(select.graph_kv))
}
