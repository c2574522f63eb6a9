//! Chunked blocking transfers.
//!
//! Once a session is prepared its [`BufferSpec`] fixes the block size. Reads
//! and writes are split into block-sized driver requests; each request blocks
//! until the driver has moved it.

use offload_core::{BufferSpec, ModuleTag, Timestamp};
use offload_driver::{BufferFlags, GraphDriver, GraphHandle};

use crate::error::{Result, SessionError};

/// Result of a [`read`](crate::Session::read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOutcome {
    /// Bytes placed at the start of the caller's buffer.
    pub bytes: usize,
    /// Capture time of the first block, if the driver reported one.
    pub timestamp: Option<Timestamp>,
}

/// Fill `buf` with up to `buf.len()` bytes in block-sized requests.
///
/// Stops early on a zero-byte response or a driver error. An error on the
/// very first request is returned as [`SessionError::Transfer`]; a later
/// error ends the loop and the partial count is returned.
pub(crate) fn read_blocks(
    driver: &dyn GraphDriver,
    handle: &GraphHandle,
    tag: ModuleTag,
    spec: &BufferSpec,
    buf: &mut [u8],
) -> Result<ReadOutcome> {
    if spec.block_size == 0 {
        return Err(SessionError::NotPrepared);
    }

    let mut outcome = ReadOutcome::default();
    let mut requests = 0usize;
    while outcome.bytes < buf.len() {
        let chunk = spec.next_chunk(buf.len() - outcome.bytes);
        let window = &mut buf[outcome.bytes..outcome.bytes + chunk];
        requests += 1;
        match driver.read(handle, tag, window) {
            Ok(result) if result.bytes == 0 => {
                tracing::debug!(requests, bytes = outcome.bytes, "read returned no data");
                break;
            }
            Ok(result) => {
                if outcome.bytes == 0 {
                    outcome.timestamp = result.timestamp_us.map(Timestamp::from_micros);
                }
                outcome.bytes += result.bytes.min(chunk);
                tracing::trace!(requests, got = result.bytes, total = outcome.bytes, "read block");
            }
            Err(source) if requests == 1 => {
                return Err(SessionError::Transfer {
                    transferred: 0,
                    source,
                });
            }
            Err(e) => {
                tracing::warn!(requests, bytes = outcome.bytes, error = %e, "read stopped early");
                break;
            }
        }
    }
    Ok(outcome)
}

/// Send `buf` as full blocks followed by one trailing remainder request.
///
/// Each request starts where the driver stopped accepting, so bytes a short
/// write leaves behind are offered again. The request covering everything
/// still pending carries end-of-stream when `eos` is set: the remainder when
/// there is one, otherwise the last full block. An empty buffer with `eos`
/// set sends a single empty end-of-stream request. A driver error aborts the
/// transfer; a request the driver accepts nothing from ends it with the
/// partial count.
pub(crate) fn write_blocks(
    driver: &dyn GraphDriver,
    handle: &GraphHandle,
    tag: ModuleTag,
    spec: &BufferSpec,
    buf: &[u8],
    eos: bool,
) -> Result<usize> {
    if spec.block_size == 0 {
        return Err(SessionError::NotPrepared);
    }
    if buf.is_empty() && !eos {
        return Ok(0);
    }

    let mut written = 0usize;
    let mut requests = 0usize;
    loop {
        let pending = buf.len() - written;
        let chunk = spec.next_chunk(pending);
        let last = chunk == pending;
        let flags = if eos && last {
            BufferFlags::EOS
        } else {
            BufferFlags::NONE
        };
        requests += 1;
        let accepted = driver
            .write(handle, tag, &buf[written..written + chunk], flags)
            .map_err(|source| SessionError::Transfer {
                transferred: written,
                source,
            })?
            .min(chunk);
        written += accepted;
        tracing::trace!(
            offset = written - accepted,
            len = chunk,
            accepted,
            eos = flags.contains(BufferFlags::EOS),
            "write block"
        );

        if written == buf.len() {
            break;
        }
        if accepted == 0 {
            tracing::warn!(requests, written, total = buf.len(), "driver stopped accepting data");
            break;
        }
    }
    Ok(written)
}
