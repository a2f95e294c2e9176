//! Per-channel two-point linear energy calibration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference energies for the two Na-22 annihilation/cascade lines used
/// for calibration.
pub const REFERENCE_ENERGY_1_KEV: f64 = 511.0;
pub const REFERENCE_ENERGY_2_KEV: f64 = 1275.0;

/// One channel's calibration. `calibrated == false` is the default,
/// uncalibrated state; analyses must not emit keV values for such a
/// channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCalibration {
    pub calibrated: bool,
    /// keV per mV·ns.
    pub gain: f64,
    /// keV.
    pub offset: f64,
    pub peak_1_raw: f64,
    pub peak_2_raw: f64,
    pub calibration_date: Option<DateTime<Utc>>,
}

impl Default for ChannelCalibration {
    fn default() -> Self {
        Self {
            calibrated: false,
            gain: 0.0,
            offset: 0.0,
            peak_1_raw: 0.0,
            peak_2_raw: 0.0,
            calibration_date: None,
        }
    }
}

impl ChannelCalibration {
    /// Invariant: if calibrated, gain is finite and positive, and the
    /// two raw peaks differ.
    pub fn invariant_holds(&self) -> bool {
        if !self.calibrated {
            return true;
        }
        self.gain.is_finite() && self.gain > 0.0 && self.peak_1_raw != self.peak_2_raw
    }

    /// Apply the calibration to a raw (mV·ns) energy. Returns `None` for
    /// an uncalibrated channel.
    pub fn apply(&self, raw_energy: f64) -> Option<f64> {
        if !self.calibrated {
            return None;
        }
        Some(self.gain * raw_energy + self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_uncalibrated_and_applies_to_none() {
        let cal = ChannelCalibration::default();
        assert!(!cal.calibrated);
        assert_eq!(cal.apply(100_000.0), None);
        assert!(cal.invariant_holds());
    }

    #[test]
    fn calibrated_channel_applies_linear_fit() {
        let cal = ChannelCalibration {
            calibrated: true,
            gain: 0.002547,
            offset: 1.467,
            peak_1_raw: 200_000.0,
            peak_2_raw: 500_000.0,
            calibration_date: None,
        };
        assert!(cal.invariant_holds());
        let applied = cal.apply(200_000.0).unwrap();
        assert!((applied - 511.0).abs() < 1.0);
    }
}
