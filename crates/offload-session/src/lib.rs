//! Offload Session - one audio stream's graph on the offload runtime
//!
//! A [`Session`] turns a stream (type, direction, routed devices, buffer
//! sizing) into an open, configured, running graph on the vendor runtime
//! behind [`offload_driver::DriverBinding`], and moves audio through it.
//!
//! # Core Abstractions
//!
//! ## Lifecycle
//!
//! - [`Session`] - `open → prepare → start → stop → close` state machine
//!   owning one graph handle
//! - [`SessionState`] - where a session is in that lifecycle
//! - [`ConfigKind`], [`ParamRequest`], [`ParamQuery`] - runtime configuration
//!
//! ## Derivation
//!
//! - [`kv_builder`] - graph, calibration and tag key vectors
//! - [`concurrency_keys`], [`plan_patch`] - echo-reference subgraph selection
//!   when capture and loudspeaker playback overlap
//!
//! ## Collaborators
//!
//! - [`StreamContext`], [`ResourceManager`], [`PayloadBuilder`] - services the
//!   session queries but does not own
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   attributes, devices   ┌───────────────────┐
//! │ StreamContext│◀────────────────────────│                   │
//! └──────────────┘                         │                   │
//! ┌──────────────┐   tag catalogs, active  │      Session      │
//! │ResourceManager◀────────────────────────│                   │
//! └──────────────┘                         │  kv_builder       │
//! ┌──────────────┐   payload blobs         │  configurator     │
//! │PayloadBuilder│◀────────────────────────│  io, arbiter      │
//! └──────────────┘                         └─────────┬─────────┘
//!                                                    │ GraphDriver
//!                                                    ▼
//!                                          ┌───────────────────┐
//!                                          │   DriverBinding   │
//!                                          └───────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use offload_session::{ConfigKind, Session};
//!
//! let mut session = Session::new(binding, resource_manager, payload_builder);
//! session.open(stream)?;
//! session.prepare()?;
//! session.start()?;
//!
//! session.write(ModuleTag::STREAM_PCM_DECODER, &pcm, false)?;
//! session.set_config(ConfigKind::Module(ModuleTag::MUTE))?;
//!
//! session.stop()?;
//! session.close()?;
//! ```

mod arbiter;
mod collaborators;
mod configurator;
mod error;
mod io;
mod session;

pub mod kv_builder;
pub mod params;

pub use arbiter::{DevicePair, concurrency_keys, find_pair, plan_patch};
pub use collaborators::{
    BufferInfo, ChannelVolume, Payload, PayloadBuilder, ResourceManager, StreamContext,
    VolumeData,
};
pub use configurator::{ConfigReport, PassReport, SessionMediaConfig};
pub use error::{CollaboratorError, Result, SessionError};
pub use io::ReadOutcome;
pub use params::{ParamQuery, ParamRequest, ParamValue};
pub use session::{ConfigKind, Session, SessionState};
