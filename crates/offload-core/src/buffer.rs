//! Transfer buffer negotiation and timestamps.

/// Data transfer mode requested from the driver.
///
/// Sessions only run blocking transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TransferMode {
    /// Each read/write blocks until the driver has moved the block.
    #[default]
    Blocking,
}

/// Negotiated shape of the transfer queue between session and driver.
///
/// Fixed once `prepare` has pushed it to the driver; all reads and writes
/// are chunked by [`block_size`](Self::block_size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferSpec {
    /// Bytes per block.
    pub block_size: usize,
    /// Number of blocks in the driver queue.
    pub block_count: usize,
    /// Transfer attributes.
    pub mode: TransferMode,
    /// Blocks queued before the driver starts draining (0 = immediately).
    pub start_threshold: u32,
    /// Blocks remaining at which the driver stops (0 = never).
    pub stop_threshold: u32,
}

impl BufferSpec {
    /// A blocking spec with zero start/stop thresholds.
    pub const fn blocking(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            mode: TransferMode::Blocking,
            start_threshold: 0,
            stop_threshold: 0,
        }
    }

    /// Size of the next request when `remaining` bytes are still to move.
    #[inline]
    pub fn next_chunk(&self, remaining: usize) -> usize {
        remaining.min(self.block_size)
    }
}

/// Presentation timestamp split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Whole seconds.
    pub secs: u64,
    /// Nanoseconds within the second (always below 1e9).
    pub nanos: u32,
}

impl Timestamp {
    /// Convert a driver timestamp in microseconds.
    ///
    /// ```rust
    /// use offload_core::Timestamp;
    ///
    /// let ts = Timestamp::from_micros(2_500_001);
    /// assert_eq!(ts.secs, 2);
    /// assert_eq!(ts.nanos, 500_001_000);
    /// ```
    pub const fn from_micros(micros: u64) -> Self {
        let secs = micros / 1_000_000;
        let nanos = ((micros - secs * 1_000_000) * 1000) as u32;
        Self { secs, nanos }
    }

    /// Convert to [`std::time::Duration`].
    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::new(self.secs, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_chunk_caps_at_block_size() {
        let spec = BufferSpec::blocking(960, 4);
        assert_eq!(spec.next_chunk(5000), 960);
        assert_eq!(spec.next_chunk(960), 960);
        assert_eq!(spec.next_chunk(17), 17);
        assert_eq!(spec.next_chunk(0), 0);
    }

    #[test]
    fn blocking_defaults() {
        let spec = BufferSpec::blocking(1024, 2);
        assert_eq!(spec.mode, TransferMode::Blocking);
        assert_eq!(spec.start_threshold, 0);
        assert_eq!(spec.stop_threshold, 0);
    }

    #[test]
    fn timestamp_conversion() {
        assert_eq!(Timestamp::from_micros(0), Timestamp::default());
        let ts = Timestamp::from_micros(999_999);
        assert_eq!((ts.secs, ts.nanos), (0, 999_999_000));
        let ts = Timestamp::from_micros(7_000_000);
        assert_eq!((ts.secs, ts.nanos), (7, 0));
        assert_eq!(ts.as_duration(), std::time::Duration::from_secs(7));
    }
}
