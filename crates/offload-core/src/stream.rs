//! Stream attributes: use-case type, direction and media formats.

/// Declared use case of a stream.
///
/// The graph runtime selects an entirely different processing graph per use
/// case, so this is the first input to graph-identity key vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamType {
    /// Low-latency PCM playback or capture.
    #[default]
    LowLatency,
    /// Deep-buffered PCM playback.
    DeepBuffer,
    /// Compressed offload playback.
    Compressed,
    /// Voice-over-IP downlink.
    VoipRx,
    /// Voice-over-IP uplink.
    VoipTx,
    /// Voice user interface (keyword detection) capture.
    VoiceUi,
    /// Generic stream with no dedicated graph.
    Generic,
}

/// Data direction of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Playback (render).
    Output,
    /// Capture (record).
    Input,
    /// Loopback or full-duplex use cases.
    InputOutput,
}

impl Direction {
    /// Returns true for capture streams.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input)
    }

    /// Returns true for playback streams.
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output)
    }
}

/// Sample rate, bit width and channel count of one side of a stream or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bit_width: u16,
    /// Channel count.
    pub channels: u16,
}

impl MediaConfig {
    /// Create a media config.
    pub const fn new(sample_rate: u32, bit_width: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bit_width,
            channels,
        }
    }
}

/// Attributes a stream exposes to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamAttributes {
    /// Declared use case.
    pub stream_type: StreamType,
    /// Data direction.
    pub direction: Direction,
    /// Capture-side format (meaningful for [`Direction::Input`]).
    pub in_media: MediaConfig,
    /// Render-side format (meaningful for [`Direction::Output`]).
    pub out_media: MediaConfig,
}

impl StreamAttributes {
    /// Attributes for a playback stream.
    pub fn output(stream_type: StreamType, media: MediaConfig) -> Self {
        Self {
            stream_type,
            direction: Direction::Output,
            in_media: MediaConfig::default(),
            out_media: media,
        }
    }

    /// Attributes for a capture stream.
    pub fn input(stream_type: StreamType, media: MediaConfig) -> Self {
        Self {
            stream_type,
            direction: Direction::Input,
            in_media: media,
            out_media: MediaConfig::default(),
        }
    }

    /// The media format on the side this stream moves data.
    ///
    /// Bidirectional streams report their render side.
    pub fn active_media(&self) -> MediaConfig {
        match self.direction {
            Direction::Input => self.in_media,
            Direction::Output | Direction::InputOutput => self.out_media,
        }
    }
}
