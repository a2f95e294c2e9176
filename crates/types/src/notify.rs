//! Notification messages carried on the acquisition engine's event
//! channel: a typed, non-blocking channel in place of Qt signal/slots,
//! that the out-of-scope shell (or a test) can subscribe to.

use std::sync::Arc;

/// Engine lifecycle state, observable through `StateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Paused,
}

/// A representative waveform emitted once per batch for display,
/// throttled by the engine.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub channel_samples_mv: [Arc<[f32]>; 4],
}

/// Messages the acquisition engine emits for consumers outside the
/// core (a GUI shell, a test harness, a log sink).
#[derive(Debug, Clone)]
pub enum Notification {
    WaveformReady(Arc<Waveform>),
    BatchComplete { count: usize, events_per_second: f64 },
    StorageWarning { fill_fraction: f64 },
    AcquisitionError(String),
    StateChanged(EngineState),
}
