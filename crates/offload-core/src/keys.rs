//! Key, value and tag constants understood by the graph runtime.
//!
//! Keys occupy the high byte of a 32-bit word and each key owns a value
//! namespace sharing that prefix, e.g. every `STREAMRX` value is `0xA1xx_xxxx`.
//! Tags live in the `0xC0xx_xxxx` space.

/// Key identifiers.
pub mod key {
    /// Playback stream use case.
    pub const STREAMRX: u32 = 0xA100_0000;
    /// Render device role.
    pub const DEVICERX: u32 = 0xA200_0000;
    /// Stream volume level (calibration).
    pub const VOLUME: u32 = 0xA500_0000;
    /// Render device post-processing chain.
    pub const DEVICEPP_RX: u32 = 0xAC00_0000;
    /// Capture device post-processing chain.
    pub const DEVICEPP_TX: u32 = 0xAD00_0000;
    /// Sample-rate adapter output rate (tag key vector).
    pub const SAMPLINGRATE: u32 = 0xAE00_0000;
    /// Capture stream use case.
    pub const STREAMTX: u32 = 0xB100_0000;
    /// Capture device role.
    pub const DEVICETX: u32 = 0xB200_0000;
    /// Mute control (tag key vector).
    pub const MUTE: u32 = 0xD800_0000;
    /// Pause control (tag key vector).
    pub const PAUSE: u32 = 0xD900_0000;
}

/// Values, grouped by the key they belong to.
#[allow(missing_docs)]
pub mod value {
    // STREAMRX
    pub const PCM_DEEP_BUFFER: u32 = 0xA100_0001;
    pub const PCM_LL_PLAYBACK: u32 = 0xA100_0003;
    pub const VOIP_RX_PLAYBACK: u32 = 0xA100_0005;
    pub const COMPRESSED_OFFLOAD_PLAYBACK: u32 = 0xA100_000A;

    // DEVICERX
    pub const SPEAKER: u32 = 0xA200_0001;
    pub const HEADPHONES: u32 = 0xA200_0002;
    pub const BT_RX: u32 = 0xA200_0003;
    pub const HANDSET: u32 = 0xA200_0004;

    // VOLUME: LEVEL_0..=LEVEL_15 are the plain integers 0..=15
    pub const LEVEL_0: u32 = 0;
    pub const LEVEL_15: u32 = 15;

    // DEVICEPP_TX
    pub const DEVICEPP_TX_AUDIO_FLUENCE_SMECNS: u32 = 0xAD00_0001;
    pub const DEVICEPP_TX_AUDIO_FLUENCE_PRO: u32 = 0xAD00_0003;
    pub const DEVICEPP_TX_VOIP_FLUENCE_PRO: u32 = 0xAD00_0004;
    pub const DEVICEPP_TX_VOICE_UI_FLUENCE_FFECNS: u32 = 0xAD00_0006;
    pub const DEVICEPP_TX_HFP_SINK_FLUENCE_SMECNS: u32 = 0xAD00_0008;

    // SAMPLINGRATE: the rate in Hz
    pub const SAMPLINGRATE_8K: u32 = 8000;
    pub const SAMPLINGRATE_16K: u32 = 16000;
    pub const SAMPLINGRATE_32K: u32 = 32000;
    pub const SAMPLINGRATE_44K: u32 = 44100;
    pub const SAMPLINGRATE_48K: u32 = 48000;
    pub const SAMPLINGRATE_96K: u32 = 96000;
    pub const SAMPLINGRATE_192K: u32 = 192_000;
    pub const SAMPLINGRATE_384K: u32 = 384_000;

    // STREAMTX
    pub const PCM_RECORD: u32 = 0xB100_0001;
    pub const VOICE_UI: u32 = 0xB100_0003;
    pub const VOIP_TX_RECORD: u32 = 0xB100_0004;

    // DEVICETX
    pub const HANDSETMIC: u32 = 0xB200_0001;
    pub const SPEAKER_MIC: u32 = 0xB200_0002;
    pub const TRI_MIC: u32 = 0xB200_0003;
    pub const HEADPHONE_MIC: u32 = 0xB200_0004;
    pub const BT_TX: u32 = 0xB200_0005;

    // MUTE / PAUSE
    pub const OFF: u32 = 0;
    pub const ON: u32 = 1;
}

/// Functional role of a tagged module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagRole {
    /// Stream source or sink (decoder, encoder, media-format stage).
    StreamSource,
    /// Stream-side post-processing (converters, stream sample-rate adapter).
    StreamPostProcess,
    /// Stream mixer.
    Mixer,
    /// Device-side post-processing.
    DevicePostProcess,
    /// Generic device stage.
    Device,
    /// Hardware endpoint on the render path.
    DeviceEndpointRx,
    /// Hardware endpoint on the capture path.
    DeviceEndpointTx,
    /// Control tags that select a topology variant through a tag key vector
    /// (mute, pause, volume, sample-rate adaptation).
    Control,
}

/// An integer tag classifying a functional role within a graph.
///
/// Tags are resolved against an open graph to concrete module instances;
/// the same tag may resolve to nothing in one topology and to several
/// instances in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleTag(u32);

#[allow(missing_docs)]
impl ModuleTag {
    pub const STREAM_INPUT_MEDIA_FORMAT: Self = Self(0xC000_0001);
    pub const STREAM_PCM_DECODER: Self = Self(0xC000_0002);
    pub const STREAM_PCM_ENCODER: Self = Self(0xC000_0003);
    pub const DEVICE_HW_ENDPOINT_RX: Self = Self(0xC000_0004);
    pub const DEVICE_HW_ENDPOINT_TX: Self = Self(0xC000_0005);
    pub const STREAM_PCM_CONVERTER: Self = Self(0xC000_0006);
    pub const STREAM_MFC: Self = Self(0xC000_0007);
    pub const STREAM_POST_PROCESS: Self = Self(0xC000_0008);
    pub const STREAM_MIXER: Self = Self(0xC000_0009);
    pub const DEVICE_PP_RX: Self = Self(0xC000_000A);
    pub const DEVICE_PP_TX: Self = Self(0xC000_000B);
    pub const DEVICE_MFC: Self = Self(0xC000_000C);

    pub const STREAM_VOLUME: Self = Self(0xC000_0010);
    pub const MUTE: Self = Self(0xC000_0011);
    pub const UNMUTE: Self = Self(0xC000_0012);
    pub const PAUSE: Self = Self(0xC000_0013);
    pub const RESUME: Self = Self(0xC000_0014);

    pub const MFC_SR_8K: Self = Self(0xC000_0020);
    pub const MFC_SR_16K: Self = Self(0xC000_0021);
    pub const MFC_SR_32K: Self = Self(0xC000_0022);
    pub const MFC_SR_44K: Self = Self(0xC000_0023);
    pub const MFC_SR_48K: Self = Self(0xC000_0024);
    pub const MFC_SR_96K: Self = Self(0xC000_0025);
    pub const MFC_SR_192K: Self = Self(0xC000_0026);
    pub const MFC_SR_384K: Self = Self(0xC000_0027);
}

impl ModuleTag {
    /// Creates a tag from its raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Role of a well-known tag; `None` for tags outside this catalog.
    pub fn role(&self) -> Option<TagRole> {
        let role = match *self {
            Self::STREAM_INPUT_MEDIA_FORMAT | Self::STREAM_PCM_DECODER | Self::STREAM_PCM_ENCODER => {
                TagRole::StreamSource
            }
            Self::STREAM_PCM_CONVERTER | Self::STREAM_MFC | Self::STREAM_POST_PROCESS => {
                TagRole::StreamPostProcess
            }
            Self::STREAM_MIXER => TagRole::Mixer,
            Self::DEVICE_PP_RX | Self::DEVICE_PP_TX => TagRole::DevicePostProcess,
            Self::DEVICE_MFC => TagRole::Device,
            Self::DEVICE_HW_ENDPOINT_RX => TagRole::DeviceEndpointRx,
            Self::DEVICE_HW_ENDPOINT_TX => TagRole::DeviceEndpointTx,
            _ if self.is_control() => TagRole::Control,
            _ => return None,
        };
        Some(role)
    }

    /// Returns true for the hardware endpoint tags.
    pub fn is_endpoint(&self) -> bool {
        matches!(*self, Self::DEVICE_HW_ENDPOINT_RX | Self::DEVICE_HW_ENDPOINT_TX)
    }

    fn is_control(&self) -> bool {
        (Self::STREAM_VOLUME.0..=Self::RESUME.0).contains(&self.0)
            || (Self::MFC_SR_8K.0..=Self::MFC_SR_384K.0).contains(&self.0)
    }
}

impl core::fmt::Display for ModuleTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
