//! Result of channel/timebase configuration, frozen for the life of a run.

use serde::{Deserialize, Serialize};

/// Achieved acquisition timing and resolution, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScopeSettings {
    /// Achieved sample interval, in nanoseconds.
    pub sample_interval_ns: f64,
    /// Samples captured before the trigger.
    pub pre_samples: usize,
    /// Samples captured after the trigger.
    pub post_samples: usize,
    /// ADC resolution, in bits.
    pub resolution_bits: u8,
    /// Full-scale voltage range, in millivolts.
    pub range_mv: i32,
    /// Maximum ADC code representable at `resolution_bits`.
    pub max_adc: i32,
    /// Opaque device-chosen timebase index.
    pub timebase_index: u32,
}

impl ScopeSettings {
    pub fn total_samples(&self) -> usize {
        self.pre_samples + self.post_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_samples_is_sum_of_pre_and_post() {
        let settings = ScopeSettings {
            sample_interval_ns: 0.8,
            pre_samples: 1249,
            post_samples: 2500,
            resolution_bits: 8,
            range_mv: 100,
            max_adc: 32512,
            timebase_index: 3,
        };
        assert_eq!(settings.total_samples(), 3749);
    }
}
