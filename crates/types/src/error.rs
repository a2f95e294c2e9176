//! The error taxonomy shared across the driver, engine and analysis
//! crates. Uses `thiserror` derive macros throughout.

use thiserror::Error;

/// Sub-reasons for a rejected calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalibrationInvalidReason {
    #[error("fewer than 100 events with a pulse on this channel")]
    TooFewEvents,
    #[error("the two raw peak positions are too close together")]
    PeaksTooClose,
    #[error("the ratio between the two raw peaks is outside [1.5, 4.0]")]
    RatioOutOfRange,
    #[error("computed gain is non-positive or non-finite")]
    NonPositiveGain,
    #[error("computed gain is outside [1e-3, 1e3] keV per mV·ns")]
    GainOutOfRange,
    #[error("the selected peak-finding sub-range contains no events")]
    EmptyRange,
}

/// Device/engine/analysis error kinds.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("device not found")]
    DeviceNotFound,
    #[error("device is busy (held by another process)")]
    DeviceBusy,
    #[error("device reported an unexpected power state")]
    DevicePowerState,
    #[error("device identified but does not support the requested operation")]
    DeviceUnsupported,
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
    #[error("no timebase index satisfies the requested windows for the requested channel count")]
    TimebaseUnavailable,
    #[error("buffer binding failed: {0}")]
    BufferBindingFailed(String),
    #[error("bulk download failed: {0}")]
    DownloadFailed(String),
    #[error("calibration invalid: {0}")]
    CalibrationInvalid(CalibrationInvalidReason),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}
