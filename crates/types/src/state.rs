//! Persisted state: a JSON object the core reads/writes but neither
//! enforces schema evolution for nor depends on human-readable
//! formatting of. Consumed by the out-of-scope shell.

use serde::{Deserialize, Serialize};

use crate::calibration::ChannelCalibration;
use crate::trigger::TriggerSpec;

/// Which digitizer family was last used, for the shell's convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceFamily {
    Model3000,
    Model6000,
}

/// Retention limits used by the acquisition engine's auto-stop logic
/// and the event store's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionLimits {
    pub max_events: usize,
    pub time_limit_secs: Option<f64>,
    pub event_limit: Option<u64>,
}

impl Default for RetentionLimits {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            time_limit_secs: None,
            event_limit: None,
        }
    }
}

/// The full persisted-state object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonState {
    pub last_device_family: Option<DeviceFamily>,
    pub trigger_spec: TriggerSpec,
    pub calibration: [ChannelCalibration; 4],
    pub retention: RetentionLimits,
}

impl Default for DaemonState {
    fn default() -> Self {
        Self {
            last_device_family: None,
            trigger_spec: TriggerSpec::all_channels(),
            calibration: Default::default(),
            retention: RetentionLimits::default(),
        }
    }
}

impl DaemonState {
    /// Read from a JSON file on disk, or fall back to `Default` if the
    /// file does not exist yet (first run).
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, crate::error::CoreError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::error::CoreError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("daq_state_test_{}.json", std::process::id()));
        let mut state = DaemonState::default();
        state.last_device_family = Some(DeviceFamily::Model6000);
        state.retention.event_limit = Some(500);
        state.save(&path).unwrap();
        let reloaded = DaemonState::load_or_default(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(reloaded.last_device_family, Some(DeviceFamily::Model6000));
        assert_eq!(reloaded.retention.event_limit, Some(500));
    }

    #[test]
    fn missing_file_yields_default() {
        let path = std::path::Path::new("/nonexistent/daq_state_missing.json");
        let state = DaemonState::load_or_default(path).unwrap();
        assert!(state.last_device_family.is_none());
    }
}
