//! Typed runtime parameters.
//!
//! Each settable parameter is one [`ParamRequest`] variant carrying its own
//! payload type; each readable parameter is one [`ParamQuery`] variant whose
//! answer comes back as the matching [`ParamValue`].

/// Parameter ID of the direction-of-arrival tracking monitor.
pub const DOA_TRACKING_MONITOR_PARAM_ID: u32 = 0x0800_10A2;

/// Event raised by the detection engine on a keyword match.
pub const DETECTION_ENGINE_GENERIC_EVENT_ID: u32 = 0x0800_104F;

/// Number of polar activity bins reported by the DOA monitor (one per degree).
pub const POLAR_BINS: usize = 360;

/// Header preceding every module parameter payload.
///
/// Four little-endian `u32` words: instance ID, parameter ID, body size,
/// error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamHeader {
    /// Module instance the parameter belongs to.
    pub module_iid: u32,
    /// Parameter ID.
    pub param_id: u32,
    /// Size of the body following the header.
    pub param_size: u32,
    /// Error code filled in by the runtime.
    pub error_code: u32,
}

impl ParamHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;

    /// Little-endian encoding.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip([
            self.module_iid,
            self.param_id,
            self.param_size,
            self.error_code,
        ]) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Decode a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::SIZE)?;
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_le_bytes(w)
        };
        Some(Self {
            module_iid: word(0),
            param_id: word(1),
            param_size: word(2),
            error_code: word(3),
        })
    }
}

/// Direction-of-arrival tracking state reported by the far-field module.
///
/// Angles are in degrees. Each polar bin holds the activity level for one
/// degree of arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoaTrackingMonitor {
    /// Angles of the two tracked talkers.
    pub target_angles: [i16; 2],
    /// Angles of the two strongest interferers.
    pub interference_angles: [i16; 2],
    /// Activity per degree.
    pub polar_activity: [i8; POLAR_BINS],
}

impl Default for DoaTrackingMonitor {
    fn default() -> Self {
        Self {
            target_angles: [0; 2],
            interference_angles: [0; 2],
            polar_activity: [0; POLAR_BINS],
        }
    }
}

impl DoaTrackingMonitor {
    /// Encoded body size in bytes.
    pub const SIZE: usize = 4 * 2 + POLAR_BINS;

    /// Decode the little-endian body.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::SIZE)?;
        let angle = |i: usize| i16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
        let mut polar_activity = [0i8; POLAR_BINS];
        for (bin, &b) in polar_activity.iter_mut().zip(&bytes[8..]) {
            *bin = b as i8;
        }
        Some(Self {
            target_angles: [angle(0), angle(1)],
            interference_angles: [angle(2), angle(3)],
            polar_activity,
        })
    }

    /// Little-endian body encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        for a in self.target_angles.iter().chain(&self.interference_angles) {
            out.extend_from_slice(&a.to_le_bytes());
        }
        out.extend(self.polar_activity.iter().map(|&b| b as u8));
        out
    }

    /// Degree with the highest activity, if any bin is active.
    pub fn peak_direction(&self) -> Option<u16> {
        self.polar_activity
            .iter()
            .enumerate()
            .filter(|(_, a)| **a > 0)
            .max_by_key(|(_, a)| **a)
            .map(|(deg, _)| deg as u16)
    }
}

/// Detection engine wake-up configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WakeUpConfig {
    /// Detection mode bits.
    pub mode: u32,
    /// Size of the trailing custom payload.
    pub custom_payload_size: u32,
    /// Number of models currently active.
    pub num_active_models: u32,
    /// Confidence threshold per keyword.
    pub confidence_levels: Vec<u8>,
    /// Per-keyword user enable flags.
    pub keyword_user_enables: Vec<u8>,
}

/// History buffering around a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakeUpBufferConfig {
    /// Audio retained before the keyword, in milliseconds.
    pub history_buffer_ms: u32,
    /// Audio retained before the keyword start, in milliseconds.
    pub pre_roll_ms: u32,
}

/// Setup duration of one downstream output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortSetupDuration {
    /// Output port ID.
    pub port_id: u32,
    /// Setup duration in milliseconds.
    pub duration_ms: u32,
}

/// Downstream setup durations of the data-arbitration module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSetupDuration {
    /// One entry per output port.
    pub ports: Vec<PortSetupDuration>,
}

/// A parameter to set on a tagged module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRequest {
    /// Load a sound model into the detection engine.
    SoundModel(Vec<u8>),
    /// Configure keyword detection.
    WakeUpConfig(WakeUpConfig),
    /// Enable detection events. Registers the session's event callback first.
    EventConfig(Vec<u8>),
    /// Configure history buffering.
    WakeUpBufferConfig(WakeUpBufferConfig),
    /// Configure downstream setup durations.
    StreamSetupDuration(StreamSetupDuration),
    /// Reset the detection engine. Unregisters detection events first.
    EngineReset,
}

impl ParamRequest {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ParamRequest::SoundModel(_) => "sound_model",
            ParamRequest::WakeUpConfig(_) => "wakeup_config",
            ParamRequest::EventConfig(_) => "event_config",
            ParamRequest::WakeUpBufferConfig(_) => "wakeup_buffer_config",
            ParamRequest::StreamSetupDuration(_) => "stream_setup_duration",
            ParamRequest::EngineReset => "engine_reset",
        }
    }
}

/// A parameter to read from a tagged module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamQuery {
    /// Direction-of-arrival tracking state.
    DirectionOfArrival,
}

/// Answer to a [`ParamQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Direction-of-arrival tracking state.
    DirectionOfArrival(Box<DoaTrackingMonitor>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let header = ParamHeader {
            module_iid: 0x4001,
            param_id: DOA_TRACKING_MONITOR_PARAM_ID,
            param_size: DoaTrackingMonitor::SIZE as u32,
            error_code: 0,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], &[0x01, 0x40, 0x00, 0x00]);
        assert_eq!(&bytes[8..12], &(368u32).to_le_bytes());
        assert_eq!(ParamHeader::from_bytes(&bytes), Some(header));
    }

    #[test]
    fn doa_decode() {
        let mut body = vec![0u8; DoaTrackingMonitor::SIZE];
        body[..2].copy_from_slice(&90i16.to_le_bytes());
        body[2..4].copy_from_slice(&270i16.to_le_bytes());
        body[4..6].copy_from_slice(&(-1i16).to_le_bytes());
        body[8 + 91] = 40;
        body[8 + 270] = 12;

        let doa = DoaTrackingMonitor::from_bytes(&body).unwrap();
        assert_eq!(doa.target_angles, [90, 270]);
        assert_eq!(doa.interference_angles, [-1, 0]);
        assert_eq!(doa.peak_direction(), Some(91));
        assert_eq!(doa.to_bytes(), body);
    }

    #[test]
    fn doa_short_body_rejected() {
        assert!(DoaTrackingMonitor::from_bytes(&[0u8; 100]).is_none());
        assert_eq!(DoaTrackingMonitor::default().peak_direction(), None);
    }
}
