//! Tag-indexed payload configuration.
//!
//! After a graph opens, three passes push configuration into it, in order:
//!
//! 1. **stream** - every stream tag gets the session media format
//! 2. **endpoint** - hardware endpoint tags get the routed device's format and
//!    endpoint name, after the rate adapter is set to the device rate
//! 3. **device** - device tags get the routed device's format
//!
//! Every pass runs the same procedure per tag: resolve the tag against the
//! open graph, skip it if the graph has no such module, otherwise build a
//! payload and push it to the resolved instance. A failure on one tag is
//! logged and never stops the pass.

use offload_core::{
    DeviceInfo, Direction, KeyVector, MediaConfig, ModuleTag, StreamAttributes, sample_rate_tag,
};
use offload_driver::{GraphDriver, GraphHandle, ModuleInfo};

use crate::collaborators::{Payload, PayloadBuilder, ResourceManager};
use crate::error::{CollaboratorError, Result, SessionError};
use crate::kv_builder::tag_key_vector;

/// Media format of a session as seen by stream-pass payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMediaConfig {
    /// Stream direction.
    pub direction: Direction,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bit_width: u16,
    /// Channel count.
    pub channels: u16,
    /// Capture runs at the device's native channel count.
    pub native: bool,
}

impl SessionMediaConfig {
    /// Derive the media format from stream attributes and routed devices.
    ///
    /// A capture stream is native when its first routed device has the same
    /// channel count. Playback is never native.
    pub fn derive(stream: &StreamAttributes, devices: &[DeviceInfo]) -> Self {
        let media = stream.active_media();
        let native = stream.direction == Direction::Input
            && devices
                .first()
                .is_some_and(|d| d.config.channels == media.channels);
        Self {
            direction: stream.direction,
            sample_rate: media.sample_rate,
            bit_width: media.bit_width,
            channels: media.channels,
            native,
        }
    }
}

/// Outcome counts of one configuration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Tags whose payload was accepted.
    pub applied: usize,
    /// Tags skipped: absent from the graph or not handled by the pass.
    pub skipped: usize,
    /// Tags whose payload could not be built or was rejected.
    pub failed: usize,
}

/// Outcome of the three configuration passes run at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigReport {
    /// Stream pass.
    pub stream: PassReport,
    /// Device-endpoint pass.
    pub endpoint: PassReport,
    /// Device pass.
    pub device: PassReport,
}

impl ConfigReport {
    /// Total tags that failed across all passes.
    pub fn failures(&self) -> usize {
        self.stream.failed + self.endpoint.failed + self.device.failed
    }
}

/// The open graph a pass configures.
pub(crate) struct GraphTarget<'a> {
    pub driver: &'a dyn GraphDriver,
    pub handle: &'a GraphHandle,
    pub gkv: &'a KeyVector,
}

/// Decision of a payload strategy for one resolved tag.
enum TagPlan {
    Push(Payload),
    Skip(&'static str),
    Fail(SessionError),
}

/// How one pass turns a resolved tag into a payload.
trait PayloadStrategy {
    fn name(&self) -> &'static str;

    fn plan(&mut self, target: &GraphTarget<'_>, info: &ModuleInfo, tag: ModuleTag) -> TagPlan;
}

/// Resolve each tag, build its payload, push it. Per-tag failures are absorbed.
fn run_pass(
    target: &GraphTarget<'_>,
    tags: &[ModuleTag],
    strategy: &mut dyn PayloadStrategy,
) -> PassReport {
    let mut report = PassReport::default();
    for &tag in tags {
        let info = match target.driver.get_tagged_module_info(target.gkv, tag) {
            Ok(info) if !info.is_empty() => info,
            Ok(_) | Err(_) => {
                tracing::debug!(pass = strategy.name(), %tag, "tag not in graph, skipped");
                report.skipped += 1;
                continue;
            }
        };

        match strategy.plan(target, &info, tag) {
            TagPlan::Push(payload) => {
                match target.driver.set_custom_config(target.handle, &payload) {
                    Ok(()) => {
                        tracing::trace!(
                            pass = strategy.name(),
                            %tag,
                            bytes = payload.len(),
                            "payload pushed"
                        );
                        report.applied += 1;
                    }
                    Err(e) => {
                        let err = SessionError::config_push(tag, e);
                        tracing::warn!(
                            pass = strategy.name(),
                            error = %err,
                            "configuration rejected"
                        );
                        report.failed += 1;
                    }
                }
            }
            TagPlan::Skip(reason) => {
                tracing::debug!(pass = strategy.name(), %tag, reason, "tag skipped");
                report.skipped += 1;
            }
            TagPlan::Fail(err) => {
                tracing::warn!(pass = strategy.name(), %tag, error = %err, "tag not configured");
                report.failed += 1;
            }
        }
    }
    report
}

/// Push the tag key vector for `tag` to the graph.
///
/// Pause and resume resolve to the pause module, which the calibration
/// database has no tag key vector entry for; they are accepted and not sent.
pub(crate) fn apply_module_config(target: &GraphTarget<'_>, tag: ModuleTag) -> Result<()> {
    let (sent, tkv) = tag_key_vector(tag)?;
    if sent == ModuleTag::PAUSE {
        tracing::debug!(%tag, "pause module has no tag key vector, not sent");
        return Ok(());
    }
    tracing::debug!(%tag, %sent, %tkv, "set config");
    target
        .driver
        .set_config(target.handle, target.gkv, sent, &tkv)
        .map_err(|e| SessionError::config_push(sent, e))
}

/// The routed device a hardware endpoint tag configures.
///
/// Render endpoints take render devices, capture endpoints capture devices.
/// When several devices qualify the last one routed wins.
pub(crate) fn endpoint_device(tag: ModuleTag, devices: &[DeviceInfo]) -> Option<&DeviceInfo> {
    match tag {
        ModuleTag::DEVICE_HW_ENDPOINT_RX => devices.iter().rev().find(|d| d.id.is_render()),
        ModuleTag::DEVICE_HW_ENDPOINT_TX => devices.iter().rev().find(|d| d.id.is_capture()),
        _ => None,
    }
}

struct StreamPass<'a> {
    builder: &'a dyn PayloadBuilder,
    media: &'a SessionMediaConfig,
}

impl PayloadStrategy for StreamPass<'_> {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn plan(&mut self, _target: &GraphTarget<'_>, info: &ModuleInfo, tag: ModuleTag) -> TagPlan {
        match self.builder.stream_config(info, tag, self.media) {
            Some(payload) => TagPlan::Push(payload),
            None => TagPlan::Fail(SessionError::PayloadUnavailable { tag }),
        }
    }
}

struct EndpointPass<'a> {
    builder: &'a dyn PayloadBuilder,
    rm: &'a dyn ResourceManager,
    devices: &'a [DeviceInfo],
}

impl EndpointPass<'_> {
    fn adapt_sample_rate(target: &GraphTarget<'_>, media: &MediaConfig) {
        let result = sample_rate_tag(media.sample_rate)
            .ok_or(SessionError::UnmappedSampleRate(media.sample_rate))
            .and_then(|tag| apply_module_config(target, tag));
        if let Err(e) = result {
            tracing::warn!(rate = media.sample_rate, error = %e, "sample rate adapter not set");
        }
    }
}

impl PayloadStrategy for EndpointPass<'_> {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn plan(&mut self, target: &GraphTarget<'_>, info: &ModuleInfo, tag: ModuleTag) -> TagPlan {
        if !tag.is_endpoint() {
            return TagPlan::Skip("not an endpoint tag");
        }
        let Some(device) = endpoint_device(tag, self.devices) else {
            return TagPlan::Skip("no routed device for endpoint");
        };
        tracing::debug!(
            %tag,
            device = %device.id,
            rate = device.config.sample_rate,
            bit_width = device.config.bit_width,
            channels = device.config.channels,
            "endpoint device"
        );

        Self::adapt_sample_rate(target, &device.config);

        let Some(endpoint) = self.rm.device_endpoint_name(device.id) else {
            return TagPlan::Fail(
                CollaboratorError::new("endpoint name", format!("none for {}", device.id)).into(),
            );
        };
        match self
            .builder
            .device_ep_config(info, tag, &device.config, &endpoint)
        {
            Some(payload) => TagPlan::Push(payload),
            None => TagPlan::Fail(SessionError::PayloadUnavailable { tag }),
        }
    }
}

struct DevicePass<'a> {
    builder: &'a dyn PayloadBuilder,
    devices: &'a [DeviceInfo],
}

impl PayloadStrategy for DevicePass<'_> {
    fn name(&self) -> &'static str {
        "device"
    }

    fn plan(&mut self, _target: &GraphTarget<'_>, info: &ModuleInfo, tag: ModuleTag) -> TagPlan {
        // Endpoint tags follow their partition; other device tags use the
        // primary routed device.
        let device = if tag.is_endpoint() {
            endpoint_device(tag, self.devices)
        } else {
            self.devices.first()
        };
        let Some(device) = device else {
            return TagPlan::Skip("no routed device");
        };
        match self.builder.device_config(info, tag, &device.config) {
            Some(payload) => TagPlan::Push(payload),
            None => TagPlan::Fail(SessionError::PayloadUnavailable { tag }),
        }
    }
}

fn catalog(
    name: &'static str,
    tags: std::result::Result<Vec<ModuleTag>, CollaboratorError>,
) -> Vec<ModuleTag> {
    tags.unwrap_or_else(|e| {
        tracing::warn!(catalog = name, error = %e, "tag catalog unavailable");
        Vec::new()
    })
}

/// Run the stream, endpoint and device passes against an open graph.
pub(crate) fn configure_graph(
    target: &GraphTarget<'_>,
    rm: &dyn ResourceManager,
    builder: &dyn PayloadBuilder,
    stream: &StreamAttributes,
    devices: &[DeviceInfo],
) -> ConfigReport {
    let media = SessionMediaConfig::derive(stream, devices);
    tracing::debug!(
        rate = media.sample_rate,
        bit_width = media.bit_width,
        channels = media.channels,
        native = media.native,
        "session media"
    );

    let stream_tags = catalog("stream", rm.stream_tags());
    let device_tags = catalog("device", rm.device_tags());

    let stream = run_pass(
        target,
        &stream_tags,
        &mut StreamPass {
            builder,
            media: &media,
        },
    );
    let endpoint = run_pass(
        target,
        &device_tags,
        &mut EndpointPass {
            builder,
            rm,
            devices,
        },
    );
    let device = run_pass(target, &device_tags, &mut DevicePass { builder, devices });

    let report = ConfigReport {
        stream,
        endpoint,
        device,
    };
    tracing::debug!(?report, "configuration passes complete");
    report
}
