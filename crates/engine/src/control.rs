//! Control-plane messages for the acquisition engine: Pause/Resume/
//! Stop/Restart are cooperative requests observed between poll ticks
//! and between iterations, not preemptive.

/// Sent to the acquisition thread over a `crossbeam_channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Pause,
    Resume,
    Stop,
    /// Force Stopped -> clear store -> Running.
    Restart,
}
