//! Graph lifecycle management.

use std::sync::Arc;

use offload_core::{BufferSpec, DeviceInfo, Direction, KeyVector, ModuleTag, StreamAttributes};
use offload_driver::{
    CustomEventRegistration, DriverBinding, DriverCommand, DriverEvent, GraphDriver, GraphHandle,
    ModuleInfo,
};

use crate::arbiter;
use crate::collaborators::{PayloadBuilder, ResourceManager, StreamContext};
use crate::configurator::{self, ConfigReport, GraphTarget};
use crate::error::{CollaboratorError, Result, SessionError};
use crate::io::{self, ReadOutcome};
use crate::kv_builder;
use crate::params::{
    DETECTION_ENGINE_GENERIC_EVENT_ID, DOA_TRACKING_MONITOR_PARAM_ID, DoaTrackingMonitor,
    ParamHeader, ParamQuery, ParamRequest, ParamValue,
};

/// Where a session is in its lifecycle.
///
/// ```text
/// Idle ──open──▶ Open ──(configuration passes)──▶ Configured
///                                                    │ prepare
///                                                    ▼
///   Idle ◀──close── (any open state)             Prepared
///                                                    │ start
///                                                    ▼
///                          Stopped ◀────stop──── Started
///                             │ start / prepare ▲
///                             └──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No graph; the driver may be loaded.
    Idle,
    /// Graph instantiated, configuration passes not yet run.
    Open,
    /// Graph open and configured.
    Configured,
    /// Buffers negotiated.
    Prepared,
    /// Data flowing.
    Started,
    /// Data flow halted; may be restarted.
    Stopped,
}

/// What [`Session::set_config`] should configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Whole-graph configuration. Accepted and does nothing.
    Graph,
    /// Push the tag key vector of a control tag (mute, pause, rate adapter).
    Module(ModuleTag),
    /// Apply volume calibration to the module carrying the tag.
    Calibration(ModuleTag),
}

/// Everything a session owns while its graph is open.
struct OpenGraph {
    driver: Arc<dyn GraphDriver>,
    handle: GraphHandle,
    stream: Arc<dyn StreamContext>,
    gkv: KeyVector,
    ckv: KeyVector,
    read_spec: Option<BufferSpec>,
    write_spec: Option<BufferSpec>,
    report: ConfigReport,
}

impl OpenGraph {
    fn target(&self) -> GraphTarget<'_> {
        GraphTarget {
            driver: self.driver.as_ref(),
            handle: &self.handle,
            gkv: &self.gkv,
        }
    }

    fn routing(&self) -> Result<(StreamAttributes, Vec<DeviceInfo>)> {
        Ok((self.stream.attributes()?, self.stream.associated_devices()?))
    }

    fn resolve(&self, tag: ModuleTag) -> Result<ModuleInfo> {
        match self.driver.get_tagged_module_info(&self.gkv, tag) {
            Ok(info) if !info.is_empty() => Ok(info),
            _ => Err(SessionError::TagResolutionMiss { tag }),
        }
    }

    fn command(&self, command: &DriverCommand) -> Result<()> {
        self.driver
            .ioctl(&self.handle, command)
            .map_err(|e| SessionError::command(command.name(), e))
    }
}

/// One stream's graph on the offload runtime.
///
/// A session is created against the process-wide [`DriverBinding`] and its
/// collaborators, then driven through `open → prepare → start → stop →
/// close`. It owns exactly one graph handle at a time. Dropping an open
/// session closes its graph.
pub struct Session {
    binding: Arc<DriverBinding>,
    rm: Arc<dyn ResourceManager>,
    builder: Arc<dyn PayloadBuilder>,
    state: SessionState,
    graph: Option<OpenGraph>,
}

impl Session {
    /// Create an idle session.
    pub fn new(
        binding: Arc<DriverBinding>,
        rm: Arc<dyn ResourceManager>,
        builder: Arc<dyn PayloadBuilder>,
    ) -> Self {
        Self {
            binding,
            rm,
            builder,
            state: SessionState::Idle,
            graph: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Raw value of the open graph handle.
    pub fn handle(&self) -> Option<u64> {
        self.graph.as_ref().map(|g| g.handle.raw())
    }

    /// Graph key vector of the open graph.
    pub fn graph_key_vector(&self) -> Option<&KeyVector> {
        self.graph.as_ref().map(|g| &g.gkv)
    }

    /// Calibration key vector of the open graph.
    pub fn calibration_key_vector(&self) -> Option<&KeyVector> {
        self.graph.as_ref().map(|g| &g.ckv)
    }

    /// Outcome of the configuration passes run by the last `open`.
    pub fn config_report(&self) -> Option<ConfigReport> {
        self.graph.as_ref().map(|g| g.report)
    }

    /// Negotiated buffer spec, if the session is prepared.
    pub fn buffer_spec(&self) -> Option<BufferSpec> {
        self.graph.as_ref().and_then(|g| g.read_spec.or(g.write_spec))
    }

    fn require_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn open_graph(&self, operation: &'static str) -> Result<&OpenGraph> {
        self.graph.as_ref().ok_or(SessionError::InvalidState {
            operation,
            state: self.state,
        })
    }

    /// Instantiate and configure the graph for `stream`.
    ///
    /// Builds the graph key vector from the stream's type, direction and
    /// routed devices, opens the graph with an empty calibration key vector,
    /// then runs the stream, endpoint and device configuration passes.
    /// Configuration failures are logged and leave the graph open; see
    /// [`config_report`](Self::config_report).
    pub fn open(&mut self, stream: Arc<dyn StreamContext>) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyOpen);
        }
        let driver = self.binding.driver().map_err(SessionError::DriverLoad)?;
        let attributes = stream.attributes()?;
        let devices = stream.associated_devices()?;
        tracing::debug!(
            stream_type = ?attributes.stream_type,
            direction = ?attributes.direction,
            devices = devices.len(),
            "opening graph"
        );

        let gkv = kv_builder::graph_key_vector(&attributes, &devices)?;
        let ckv = KeyVector::new();
        let handle = driver.open(&gkv, &ckv).map_err(|e| {
            tracing::error!(%gkv, error = %e, "graph open failed");
            SessionError::GraphOpen(e)
        })?;
        tracing::info!(%handle, %gkv, "graph opened");

        let mut graph = OpenGraph {
            driver,
            handle,
            stream,
            gkv,
            ckv,
            read_spec: None,
            write_spec: None,
            report: ConfigReport::default(),
        };
        self.state = SessionState::Open;

        let report = configurator::configure_graph(
            &graph.target(),
            self.rm.as_ref(),
            self.builder.as_ref(),
            &attributes,
            &devices,
        );
        if report.failures() > 0 {
            tracing::warn!(
                failures = report.failures(),
                "graph opened with partial configuration"
            );
        }
        graph.report = report;

        self.graph = Some(graph);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Prepare the graph and negotiate transfer buffers.
    ///
    /// Capture sessions negotiate read buffers, playback sessions write
    /// buffers; bidirectional sessions negotiate none. Once negotiated the
    /// buffer spec stays fixed; preparing again from `Stopped` keeps it.
    pub fn prepare(&mut self) -> Result<()> {
        self.require_state("prepare", &[SessionState::Configured, SessionState::Stopped])?;
        let graph = self.open_graph("prepare")?;
        graph.command(&DriverCommand::Prepare)?;

        let negotiated_already = graph.read_spec.is_some() || graph.write_spec.is_some();
        let (read_spec, write_spec) = if negotiated_already {
            (graph.read_spec, graph.write_spec)
        } else {
            let direction = graph.stream.attributes()?.direction;
            let info = graph.stream.buffer_info();
            match direction {
                Direction::Input => {
                    let spec = negotiated(info.in_size, info.in_count)?;
                    graph.command(&DriverCommand::ConfigureReadParams(spec))?;
                    (Some(spec), None)
                }
                Direction::Output => {
                    let spec = negotiated(info.out_size, info.out_count)?;
                    graph.command(&DriverCommand::ConfigureWriteParams(spec))?;
                    (None, Some(spec))
                }
                Direction::InputOutput => (None, None),
            }
        };
        tracing::debug!(?read_spec, ?write_spec, "graph prepared");

        if let Some(graph) = self.graph.as_mut() {
            graph.read_spec = read_spec;
            graph.write_spec = write_spec;
        }
        self.state = SessionState::Prepared;
        Ok(())
    }

    /// Start data flow, adding the concurrency subgraph first when needed.
    ///
    /// Arbitration failures are logged and do not prevent the start.
    pub fn start(&mut self) -> Result<()> {
        self.require_state("start", &[SessionState::Prepared, SessionState::Stopped])?;
        let graph = self.open_graph("start")?;

        match graph.routing() {
            Ok((attributes, devices)) => {
                let patched = arbiter::arbitrate(
                    &graph.target(),
                    &attributes,
                    &devices,
                    self.rm.as_ref(),
                );
                match patched {
                    Ok(Some(kv)) => tracing::info!(%kv, "concurrency graph added"),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "continuing without concurrency graph"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping concurrency arbitration"),
        }

        graph.command(&DriverCommand::Start)?;
        tracing::debug!(handle = %graph.handle, "graph started");
        self.state = SessionState::Started;
        Ok(())
    }

    /// Halt data flow.
    pub fn stop(&mut self) -> Result<()> {
        self.require_state("stop", &[SessionState::Started])?;
        let graph = self.open_graph("stop")?;
        graph.command(&DriverCommand::Stop)?;
        tracing::debug!(handle = %graph.handle, "graph stopped");
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// Close the graph and release its key vectors.
    ///
    /// Closing an idle session does nothing. If the driver refuses the close
    /// the session keeps its handle and state so the close can be retried.
    pub fn close(&mut self) -> Result<()> {
        let Some(graph) = self.graph.as_ref() else {
            tracing::debug!("close on idle session ignored");
            return Ok(());
        };
        graph.driver.close(&graph.handle).map_err(|e| {
            tracing::error!(handle = %graph.handle, error = %e, "graph close failed");
            SessionError::command("close", e)
        })?;
        tracing::info!(handle = %graph.handle, "graph closed");
        self.graph = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Apply a configuration to the open graph.
    pub fn set_config(&mut self, kind: ConfigKind) -> Result<()> {
        let state = self.state;
        let builder = Arc::clone(&self.builder);
        let graph = self.graph.as_mut().ok_or(SessionError::InvalidState {
            operation: "set_config",
            state,
        })?;

        match kind {
            ConfigKind::Graph => Ok(()),
            ConfigKind::Module(tag) => {
                let (attributes, devices) = graph.routing()?;
                graph.gkv = kv_builder::graph_key_vector(&attributes, &devices)?;
                configurator::apply_module_config(&graph.target(), tag)
            }
            ConfigKind::Calibration(tag) => apply_calibration(graph, builder.as_ref(), tag),
        }
    }

    /// Set a runtime parameter on the module carrying `tag`.
    pub fn set_parameter(&mut self, tag: ModuleTag, request: ParamRequest) -> Result<()> {
        let graph = self.open_graph("set_parameter")?;
        let info = graph.resolve(tag)?;
        let iid = info.first_instance().ok_or(SessionError::TagResolutionMiss { tag })?;
        tracing::debug!(%tag, iid, param = request.name(), "set parameter");

        let builder = self.builder.as_ref();
        let payload = match &request {
            ParamRequest::SoundModel(model) => builder.sound_model(iid, model),
            ParamRequest::WakeUpConfig(config) => builder.wakeup_config(iid, config),
            ParamRequest::EventConfig(config) => {
                let stream = Arc::clone(&graph.stream);
                graph
                    .driver
                    .register_event_callback(
                        &graph.handle,
                        Box::new(move |event: &DriverEvent| stream.notify(event)),
                    )
                    .map_err(|e| SessionError::command("register_event_callback", e))?;
                graph.command(&detection_event(iid, true))?;
                builder.event_config(iid, config)
            }
            ParamRequest::WakeUpBufferConfig(config) => builder.wakeup_buffer_config(iid, config),
            ParamRequest::StreamSetupDuration(duration) => {
                builder.stream_setup_duration(iid, duration)
            }
            ParamRequest::EngineReset => {
                graph.command(&detection_event(iid, false))?;
                builder.engine_reset(iid)
            }
        };

        let payload = payload.ok_or(SessionError::PayloadUnavailable { tag })?;
        graph
            .driver
            .set_custom_config(&graph.handle, &payload)
            .map_err(|e| SessionError::config_push(tag, e))
    }

    /// Read a runtime parameter from the module carrying `tag`.
    pub fn get_parameter(&self, tag: ModuleTag, query: ParamQuery) -> Result<ParamValue> {
        let graph = self.open_graph("get_parameter")?;
        let info = graph.resolve(tag)?;
        let iid = info.first_instance().ok_or(SessionError::TagResolutionMiss { tag })?;

        match query {
            ParamQuery::DirectionOfArrival => {
                let header = ParamHeader {
                    module_iid: iid,
                    param_id: DOA_TRACKING_MONITOR_PARAM_ID,
                    param_size: DoaTrackingMonitor::SIZE as u32,
                    error_code: 0,
                };
                let mut data = vec![0u8; ParamHeader::SIZE + DoaTrackingMonitor::SIZE];
                data[..ParamHeader::SIZE].copy_from_slice(&header.to_bytes());
                graph
                    .driver
                    .get_tagged_custom_config(&graph.handle, tag, &mut data)
                    .map_err(|e| SessionError::command("get_tagged_custom_config", e))?;

                if let Some(reply) = ParamHeader::from_bytes(&data)
                    && reply.error_code != 0
                {
                    return Err(SessionError::UnexpectedResponse(format!(
                        "module {iid:#x} reported error {:#x}",
                        reply.error_code
                    )));
                }
                let doa = DoaTrackingMonitor::from_bytes(&data[ParamHeader::SIZE..]).ok_or_else(
                    || SessionError::UnexpectedResponse("short direction-of-arrival body".into()),
                )?;
                Ok(ParamValue::DirectionOfArrival(Box::new(doa)))
            }
        }
    }

    /// Fill `payload` (header pre-populated) with the current value of a raw
    /// parameter. Returns the number of valid bytes.
    pub fn query_custom_config(&self, payload: &mut [u8]) -> Result<usize> {
        let graph = self.open_graph("query_custom_config")?;
        graph
            .driver
            .get_custom_config(&graph.handle, payload)
            .map_err(|e| SessionError::command("get_custom_config", e))
    }

    /// Capture up to `buf.len()` bytes from the module carrying `tag`.
    ///
    /// Blocks until the request is satisfied, the driver runs dry, or the
    /// driver fails after the first block.
    pub fn read(&mut self, tag: ModuleTag, buf: &mut [u8]) -> Result<ReadOutcome> {
        let graph = self.graph.as_ref().ok_or(SessionError::NotPrepared)?;
        let spec = graph.read_spec.ok_or(SessionError::NotPrepared)?;
        io::read_blocks(graph.driver.as_ref(), &graph.handle, tag, &spec, buf)
    }

    /// Render `buf` to the module carrying `tag`. Returns bytes accepted.
    ///
    /// With `eos` set the final request is marked end-of-stream.
    pub fn write(&mut self, tag: ModuleTag, buf: &[u8], eos: bool) -> Result<usize> {
        let graph = self.graph.as_ref().ok_or(SessionError::NotPrepared)?;
        let spec = graph.write_spec.ok_or(SessionError::NotPrepared)?;
        io::write_blocks(graph.driver.as_ref(), &graph.handle, tag, &spec, buf, eos)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(graph) = self.graph.take() {
            match graph.driver.close(&graph.handle) {
                Ok(()) => tracing::debug!(handle = %graph.handle, "graph closed on drop"),
                Err(e) => {
                    tracing::warn!(handle = %graph.handle, error = %e, "graph close on drop failed");
                }
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("handle", &self.handle())
            .finish_non_exhaustive()
    }
}

fn negotiated(block_size: usize, block_count: usize) -> Result<BufferSpec> {
    if block_size == 0 || block_count == 0 {
        return Err(CollaboratorError::new(
            "buffer info",
            format!("unusable buffer {block_size} bytes x {block_count}"),
        )
        .into());
    }
    Ok(BufferSpec::blocking(block_size, block_count))
}

fn detection_event(module_iid: u32, register: bool) -> DriverCommand {
    DriverCommand::RegisterCustomEvent(CustomEventRegistration {
        event_id: DETECTION_ENGINE_GENERIC_EVENT_ID,
        module_iid,
        config_payload_size: 0,
        register,
    })
}

/// Volume calibration: push the volume payload, then select calibration.
///
/// The volume payload is best-effort; the calibration selection always runs
/// and its result is returned.
fn apply_calibration(
    graph: &mut OpenGraph,
    builder: &dyn PayloadBuilder,
    tag: ModuleTag,
) -> Result<()> {
    let volume = graph
        .stream
        .volume()
        .ok_or_else(|| CollaboratorError::new("volume", "stream has no volume set"))?;
    let level = volume
        .primary()
        .ok_or_else(|| CollaboratorError::new("volume", "no channel gains"))?;

    // The calibration key vector is rewritten in place and kept for the life
    // of the graph. Graph and tag key vectors are rebuilt on every call.
    graph
        .ckv
        .reset_to(kv_builder::calibration_key_vector(level).iter().copied());

    match graph.resolve(tag) {
        Ok(info) => {
            let pushed = info
                .first_instance()
                .and_then(|iid| builder.volume(iid, &volume, tag))
                .ok_or(SessionError::PayloadUnavailable { tag })
                .and_then(|payload| {
                    graph
                        .driver
                        .set_custom_config(&graph.handle, &payload)
                        .map_err(|e| SessionError::config_push(tag, e))
                });
            if let Err(e) = pushed {
                tracing::warn!(%tag, error = %e, "volume payload not applied");
            }
        }
        Err(e) => tracing::warn!(error = %e, "volume module not found"),
    }

    tracing::debug!(ckv = %graph.ckv, "set calibration");
    graph
        .driver
        .set_cal(&graph.handle, &graph.gkv, &graph.ckv)
        .map_err(|e| SessionError::config_push(tag, e))
}
