//! Sound-device identifiers.
//!
//! Device IDs are plain integers assigned by the platform. Render devices
//! occupy the low range (`NONE..=OUT_PROXY`), capture devices the range
//! directly above it (`IN_HANDSET_MIC..=IN_PROXY`). Several decisions in the
//! session layer partition devices purely by these ranges, so the ranges are
//! exposed as methods rather than left to callers.

use crate::stream::MediaConfig;

/// A numeric sound-device identifier.
///
/// # Example
///
/// ```rust
/// use offload_core::DeviceId;
///
/// let speaker = DeviceId::OUT_SPEAKER;
/// assert!(speaker.is_render());
/// assert!(!speaker.is_capture());
///
/// let tri = DeviceId::IN_TRI_MIC;
/// assert!(tri.is_capture());
/// assert!(tri.is_mic_array());
/// assert!(!DeviceId::IN_QUAD_MIC.is_mic_array());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId(u32);

#[allow(missing_docs)]
impl DeviceId {
    pub const NONE: Self = Self(0);
    pub const OUT_EARPIECE: Self = Self(1);
    pub const OUT_SPEAKER: Self = Self(2);
    pub const OUT_WIRED_HEADSET: Self = Self(3);
    pub const OUT_WIRED_HEADPHONE: Self = Self(4);
    pub const OUT_LINE: Self = Self(5);
    pub const OUT_BLUETOOTH_SCO: Self = Self(6);
    pub const OUT_BLUETOOTH_A2DP: Self = Self(7);
    pub const OUT_AUX_DIGITAL: Self = Self(8);
    pub const OUT_HDMI: Self = Self(9);
    pub const OUT_USB_DEVICE: Self = Self(10);
    pub const OUT_USB_HEADSET: Self = Self(11);
    pub const OUT_SPDIF: Self = Self(12);
    pub const OUT_FM: Self = Self(13);
    pub const OUT_AUX_LINE: Self = Self(14);
    pub const OUT_PROXY: Self = Self(15);
    pub const IN_HANDSET_MIC: Self = Self(16);
    pub const IN_SPEAKER_MIC: Self = Self(17);
    pub const IN_TRI_MIC: Self = Self(18);
    pub const IN_QUAD_MIC: Self = Self(19);
    pub const IN_EIGHT_MIC: Self = Self(20);
    pub const IN_BLUETOOTH_SCO_HEADSET: Self = Self(21);
    pub const IN_WIRED_HEADSET: Self = Self(22);
    pub const IN_AUX_DIGITAL: Self = Self(23);
    pub const IN_HDMI: Self = Self(24);
    pub const IN_USB_ACCESSORY: Self = Self(25);
    pub const IN_USB_DEVICE: Self = Self(26);
    pub const IN_USB_HEADSET: Self = Self(27);
    pub const IN_FM_TUNER: Self = Self(28);
    pub const IN_LINE: Self = Self(29);
    pub const IN_SPDIF: Self = Self(30);
    pub const IN_PROXY: Self = Self(31);
}

impl DeviceId {
    /// Creates a device ID from its raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Returns true for render-capable devices (`NONE..=OUT_PROXY`).
    #[inline]
    pub const fn is_render(&self) -> bool {
        self.0 <= Self::OUT_PROXY.0
    }

    /// Returns true for capture-capable devices (`IN_HANDSET_MIC..=IN_PROXY`).
    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.0 >= Self::IN_HANDSET_MIC.0 && self.0 <= Self::IN_PROXY.0
    }

    /// Returns true for the built-in microphone arrays (`IN_HANDSET_MIC..=IN_TRI_MIC`).
    ///
    /// These are the capture devices that can pair with the loudspeaker for
    /// echo cancellation.
    #[inline]
    pub const fn is_mic_array(&self) -> bool {
        self.0 >= Self::IN_HANDSET_MIC.0 && self.0 <= Self::IN_TRI_MIC.0
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// A sound device as seen by a session: its ID and current media format.
///
/// Two `DeviceInfo` values describe the same physical device when their IDs
/// match, regardless of format.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Platform device identifier.
    pub id: DeviceId,
    /// Media format the device is currently configured for.
    pub config: MediaConfig,
}

impl DeviceInfo {
    /// Create a device description.
    pub fn new(id: DeviceId, config: MediaConfig) -> Self {
        Self { id, config }
    }

    /// Returns true if `other` refers to the same physical device.
    pub fn same_device(&self, other: &DeviceInfo) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_capture_ranges_are_disjoint() {
        for raw in 0..=40 {
            let id = DeviceId::from_raw(raw);
            assert!(
                !(id.is_render() && id.is_capture()),
                "{id} classified as both render and capture"
            );
        }
    }

    #[test]
    fn range_boundaries() {
        assert!(DeviceId::NONE.is_render());
        assert!(DeviceId::OUT_PROXY.is_render());
        assert!(!DeviceId::IN_HANDSET_MIC.is_render());
        assert!(DeviceId::IN_PROXY.is_capture());
        assert!(!DeviceId::from_raw(32).is_capture());
        assert!(!DeviceId::from_raw(32).is_render());
    }

    #[test]
    fn mic_array_is_subset_of_capture() {
        for id in [
            DeviceId::IN_HANDSET_MIC,
            DeviceId::IN_SPEAKER_MIC,
            DeviceId::IN_TRI_MIC,
        ] {
            assert!(id.is_mic_array());
            assert!(id.is_capture());
        }
        assert!(!DeviceId::IN_WIRED_HEADSET.is_mic_array());
    }

    #[test]
    fn same_device_ignores_format() {
        let a = DeviceInfo::new(DeviceId::OUT_SPEAKER, MediaConfig::new(48000, 16, 2));
        let b = DeviceInfo::new(DeviceId::OUT_SPEAKER, MediaConfig::new(44100, 24, 1));
        assert!(a.same_device(&b));
        assert_ne!(a, b);
    }
}
