//! Sample-rate adapter tag selection.
//!
//! The hardware endpoint may run at a different rate than the stream. The
//! graph carries a sample-rate adapter whose output rate is selected by
//! pushing one of eight control tags; this module owns the rate → tag map.

use crate::keys::{ModuleTag, value};

/// Every rate the sample-rate adapter can be configured for, in Hz.
pub const SUPPORTED_SAMPLE_RATES: [u32; 8] = [
    value::SAMPLINGRATE_8K,
    value::SAMPLINGRATE_16K,
    value::SAMPLINGRATE_32K,
    value::SAMPLINGRATE_44K,
    value::SAMPLINGRATE_48K,
    value::SAMPLINGRATE_96K,
    value::SAMPLINGRATE_192K,
    value::SAMPLINGRATE_384K,
];

/// Sample-rate adapter tag for `rate` Hz, or `None` for an unsupported rate.
///
/// The map is total over [`SUPPORTED_SAMPLE_RATES`] and injective: no two
/// rates share a tag.
///
/// # Example
///
/// ```rust
/// use offload_core::{ModuleTag, sample_rate_tag};
///
/// assert_eq!(sample_rate_tag(48000), Some(ModuleTag::MFC_SR_48K));
/// assert_eq!(sample_rate_tag(22050), None);
/// ```
pub fn sample_rate_tag(rate: u32) -> Option<ModuleTag> {
    let tag = match rate {
        value::SAMPLINGRATE_8K => ModuleTag::MFC_SR_8K,
        value::SAMPLINGRATE_16K => ModuleTag::MFC_SR_16K,
        value::SAMPLINGRATE_32K => ModuleTag::MFC_SR_32K,
        value::SAMPLINGRATE_44K => ModuleTag::MFC_SR_44K,
        value::SAMPLINGRATE_48K => ModuleTag::MFC_SR_48K,
        value::SAMPLINGRATE_96K => ModuleTag::MFC_SR_96K,
        value::SAMPLINGRATE_192K => ModuleTag::MFC_SR_192K,
        value::SAMPLINGRATE_384K => ModuleTag::MFC_SR_384K,
        _ => return None,
    };
    Some(tag)
}

/// The rate a sample-rate adapter tag selects; inverse of [`sample_rate_tag`].
pub fn tag_sample_rate(tag: ModuleTag) -> Option<u32> {
    SUPPORTED_SAMPLE_RATES
        .iter()
        .copied()
        .find(|&rate| sample_rate_tag(rate) == Some(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_supported_rate_maps_to_exactly_one_tag() {
        let tags: HashSet<ModuleTag> = SUPPORTED_SAMPLE_RATES
            .iter()
            .map(|&rate| sample_rate_tag(rate).expect("supported rate must map"))
            .collect();
        assert_eq!(tags.len(), SUPPORTED_SAMPLE_RATES.len());
    }

    #[test]
    fn inverse_round_trips() {
        for rate in SUPPORTED_SAMPLE_RATES {
            let tag = sample_rate_tag(rate).unwrap();
            assert_eq!(tag_sample_rate(tag), Some(rate));
        }
        assert_eq!(tag_sample_rate(ModuleTag::MUTE), None);
    }

    #[test]
    fn unsupported_rates() {
        for rate in [0, 11025, 22050, 88200, 176_400] {
            assert_eq!(sample_rate_tag(rate), None, "rate {rate}");
        }
    }
}
