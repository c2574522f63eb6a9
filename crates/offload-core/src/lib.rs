//! Offload Core - domain types for hardware-offloaded audio graph sessions
//!
//! This crate holds the plain data model shared by the driver binding and the
//! session layer. Nothing here talks to a driver; every type is a value that can
//! be built, compared and inspected in tests.
//!
//! # Core Abstractions
//!
//! ## Addressing
//!
//! - [`KeyVector`] - Ordered `(key, value)` list the driver uses to pick a graph,
//!   a calibration set, or a topology variant
//! - [`ModuleTag`] - Functional role a module may occupy inside a graph
//! - [`keys`] - Key and value constants understood by the graph runtime
//!
//! ## Devices and Streams
//!
//! - [`DeviceId`] - Numeric sound-device identifier with render/capture ranges
//! - [`DeviceInfo`] - A device plus its media format
//! - [`StreamType`], [`Direction`], [`MediaConfig`], [`StreamAttributes`]
//!
//! ## Transfer
//!
//! - [`BufferSpec`] - Negotiated block size/count for blocking I/O
//! - [`Timestamp`] - Driver microsecond timestamps split into seconds + nanoseconds
//!
//! ## Sample-Rate Adaptation
//!
//! - [`sample_rate_tag`] - Total, injective map from the supported rate set to
//!   sample-rate-adapter tags
//!
//! # Example
//!
//! ```rust
//! use offload_core::{DeviceId, KeyVector, keys};
//!
//! let mut gkv = KeyVector::new();
//! gkv.push(keys::key::STREAMRX, keys::value::PCM_LL_PLAYBACK);
//! gkv.push(keys::key::DEVICERX, keys::value::SPEAKER);
//! assert_eq!(gkv.len(), 2);
//!
//! assert!(DeviceId::OUT_SPEAKER.is_render());
//! assert!(DeviceId::IN_HANDSET_MIC.is_capture());
//! ```

pub mod buffer;
pub mod device;
pub mod key_vector;
pub mod keys;
pub mod sample_rate;
pub mod stream;

pub use buffer::{BufferSpec, Timestamp, TransferMode};
pub use device::{DeviceId, DeviceInfo};
pub use key_vector::{KeyValuePair, KeyVector};
pub use keys::{ModuleTag, TagRole};
pub use sample_rate::{SUPPORTED_SAMPLE_RATES, sample_rate_tag, tag_sample_rate};
pub use stream::{Direction, MediaConfig, StreamAttributes, StreamType};
