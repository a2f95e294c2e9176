//! The `DigitizerDriver` trait: the stable surface the acquisition
//! engine programs against, independent of which device family answered
//! `connect()`.

use daq_types::channel::Channel;
use daq_types::error::CoreError;
use daq_types::scope::ScopeSettings;
use daq_types::trigger::TriggerSpec;

use crate::buffer::BoundBuffer;

/// Which concrete family is behind a `DigitizerDriver` trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    Model3000,
    Model6000,
}

impl std::fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceFamily::Model3000 => write!(f, "3000-series"),
            DeviceFamily::Model6000 => write!(f, "6000-series"),
        }
    }
}

/// Returned by `open()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub family: DeviceFamily,
    pub serial: String,
    pub max_adc: i32,
}

/// Returned by `configure_trigger()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSummary {
    pub num_conditions: usize,
    pub condition_channels: Vec<Vec<Channel>>,
    pub threshold_mv: f32,
    pub direction: daq_types::trigger::Direction,
    pub auto_trigger_ms: Option<u32>,
}

/// Requested channel configuration, passed to `configure_channels`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    pub range_mv: i32,
    pub impedance_ohm: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            range_mv: crate::consts::DEFAULT_RANGE_MV,
            impedance_ohm: crate::consts::IMPEDANCE_50_OHM,
        }
    }
}

/// The poll result for an in-flight block, returned by `poll_ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Ready,
    NotReady,
}

/// Action used when binding a buffer via `bind_buffers` (see DESIGN.md
/// for the exact CLEAR_ALL|ADD semantics on 6000-series hardware).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAction {
    /// Replace whatever was previously bound to this (channel, segment).
    Set,
    /// Clear every prior binding for this channel, then add this one.
    /// Only meaningful on the first segment of a batch; see DESIGN.md.
    ClearThenAdd,
}

/// Hardware-abstracted façade over the vendor digitizer library.
/// Implementors: `Model3000Driver`, `Model6000Driver`,
/// `MockDriver`. All operations are synchronous and must be serialized
/// against a single device handle by the caller (the acquisition
/// engine never calls two of these concurrently).
pub trait DigitizerDriver: Send {
    /// Open and identify the device. `NotFound` if nothing answers,
    /// `DeviceBusy` if another process holds it, `DeviceUnsupported` if
    /// identification succeeds but programming does not.
    fn open(&mut self) -> Result<DeviceInfo, CoreError>;

    /// Configure all four channels identically and return the
    /// normalized settings actually achieved. `DeviceUnsupported` if the
    /// requested impedance is not available on this family.
    fn configure_channels(&mut self, config: ChannelConfig) -> Result<ScopeSettings, CoreError>;

    /// Find the fastest timebase supporting four active channels at the
    /// requested pre/post windows; returns the filled-in scope settings
    /// (`timebase_index`, `sample_interval_ns`, `pre_samples`,
    /// `post_samples`). `TimebaseUnavailable` if no index works.
    fn resolve_timebase(
        &mut self,
        target_pre_ns: u32,
        target_post_ns: u32,
        channel_count: usize,
    ) -> Result<ScopeSettings, CoreError>;

    /// Program level, direction, hysteresis, and AND/OR logic described
    /// by `spec`. `ConfigurationInvalid` if `spec` has no active
    /// condition.
    fn configure_trigger(
        &mut self,
        spec: &TriggerSpec,
        settings: &ScopeSettings,
    ) -> Result<TriggerSummary, CoreError>;

    /// Split capture memory into `count` rapid-block segments.
    fn allocate_segments(&mut self, count: usize) -> Result<(), CoreError>;

    /// Number of captures to actually run this block; must be
    /// `<= allocate_segments`'s last `count`.
    fn set_capture_count(&mut self, count: usize) -> Result<(), CoreError>;

    /// Bind a contiguous int16 buffer to (channel, segment).
    fn bind_buffers(
        &mut self,
        channel: Channel,
        segment_index: usize,
        buffer: BoundBuffer,
        action: BindAction,
    ) -> Result<(), CoreError>;

    /// Begin capture; does not block for completion.
    fn run_block(&mut self, settings: &ScopeSettings) -> Result<(), CoreError>;

    /// Non-blocking readiness check.
    fn poll_ready(&mut self) -> Result<PollStatus, CoreError>;

    /// Copy captured data into the previously bound buffers for
    /// segments `[start_segment, end_segment]` inclusive.
    fn bulk_download(&mut self, start_segment: usize, end_segment: usize) -> Result<(), CoreError>;

    fn stop(&mut self) -> Result<(), CoreError>;

    fn close(&mut self) -> Result<(), CoreError>;

    /// The family this implementation identifies as, once `open()` has
    /// succeeded. Used by the engine to pick the right integer width
    /// for capture counts.
    fn family(&self) -> DeviceFamily;
}
