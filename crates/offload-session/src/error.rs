//! Session error taxonomy.

use offload_core::{Direction, ModuleTag, StreamType};
use offload_driver::DriverError;
use thiserror::Error;

use crate::session::SessionState;

/// A collaborator (stream, resource manager) could not answer a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{what}: {reason}")]
pub struct CollaboratorError {
    /// Which query failed.
    pub what: &'static str,
    /// Collaborator-provided reason.
    pub reason: String,
}

impl CollaboratorError {
    /// Create a collaborator error.
    pub fn new(what: &'static str, reason: impl Into<String>) -> Self {
        Self {
            what,
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The process-wide driver is not usable.
    #[error("driver unavailable: {0}")]
    DriverLoad(#[source] DriverError),

    /// The driver refused to instantiate the graph.
    #[error("failed to open graph: {0}")]
    GraphOpen(#[source] DriverError),

    /// A tag has no module in the open graph.
    #[error("tag {tag} not present in the open graph")]
    TagResolutionMiss {
        /// Tag that was looked up.
        tag: ModuleTag,
    },

    /// A configuration push was rejected.
    #[error("failed to configure tag {tag}: {source}")]
    ConfigPush {
        /// Tag being configured.
        tag: ModuleTag,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// The driver aborted a read or write.
    #[error("transfer failed after {transferred} bytes: {source}")]
    Transfer {
        /// Bytes moved before the failure.
        transferred: usize,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// The supplemental concurrency subgraph could not be added.
    #[error("failed to add concurrency graph: {0}")]
    ConcurrencyPatch(#[source] DriverError),

    /// A graph command failed.
    #[error("{command} failed: {source}")]
    Command {
        /// Command name.
        command: &'static str,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// The operation is not valid in the current state.
    #[error("{operation} not allowed in state {state:?}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the session was in.
        state: SessionState,
    },

    /// `open` on a session that already holds a graph.
    #[error("session already holds an open graph")]
    AlreadyOpen,

    /// Transfer attempted without a negotiated buffer spec.
    #[error("no buffer negotiated for this session")]
    NotPrepared,

    /// No graph key exists for this stream type and direction.
    #[error("unsupported stream {stream_type:?} ({direction:?})")]
    UnsupportedStream {
        /// Stream type.
        stream_type: StreamType,
        /// Stream direction.
        direction: Direction,
    },

    /// The tag cannot be expressed as a tag key vector.
    #[error("tag {0} has no tag key vector")]
    UnsupportedTag(ModuleTag),

    /// The rate has no sample-rate adapter tag.
    #[error("sample rate {0} Hz has no adapter tag")]
    UnmappedSampleRate(u32),

    /// The payload builder produced nothing.
    #[error("no payload built for tag {tag}")]
    PayloadUnavailable {
        /// Tag the payload was meant for.
        tag: ModuleTag,
    },

    /// The driver's reply does not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A collaborator query failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl SessionError {
    /// Wrap a failed command.
    pub fn command(command: &'static str, source: DriverError) -> Self {
        SessionError::Command { command, source }
    }

    /// Wrap a rejected configuration push.
    pub fn config_push(tag: ModuleTag, source: DriverError) -> Self {
        SessionError::ConfigPush { tag, source }
    }

    /// Returns true for failures that leave a usable, if degraded, graph.
    ///
    /// Per-tag misses, rejected configuration pushes and concurrency patch
    /// failures are absorbed during open/start. Driver load and graph open
    /// failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::TagResolutionMiss { .. }
                | SessionError::ConfigPush { .. }
                | SessionError::ConcurrencyPatch(_)
                | SessionError::UnmappedSampleRate(_)
                | SessionError::PayloadUnavailable { .. }
        )
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use offload_driver::Operation;

    #[test]
    fn recoverable_classification() {
        assert!(
            SessionError::TagResolutionMiss {
                tag: ModuleTag::DEVICE_PP_RX
            }
            .is_recoverable()
        );
        assert!(
            SessionError::ConcurrencyPatch(DriverError::status(Operation::Ioctl, -1))
                .is_recoverable()
        );
        assert!(!SessionError::DriverLoad(DriverError::NotLoaded).is_recoverable());
        assert!(
            !SessionError::GraphOpen(DriverError::status(Operation::Open, -5)).is_recoverable()
        );
        assert!(!SessionError::NotPrepared.is_recoverable());
    }

    #[test]
    fn transfer_message_names_progress() {
        let err = SessionError::Transfer {
            transferred: 0,
            source: DriverError::status(Operation::Read, -32),
        };
        assert_eq!(
            err.to_string(),
            "transfer failed after 0 bytes: gsl_read failed with status -32"
        );
    }

    #[test]
    fn collaborator_errors_are_transparent() {
        let err: SessionError = CollaboratorError::new("stream tags", "catalog empty").into();
        assert_eq!(err.to_string(), "stream tags: catalog empty");
    }
}
