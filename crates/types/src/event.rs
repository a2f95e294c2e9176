//! The immutable per-trigger record produced by the acquisition engine.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// Timing, energy and presence for one channel of one event.
///
/// Invariant: if `has_pulse` is false, `timing_ns` is NaN and `energy`
/// is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPulse {
    /// Constant-fraction timing, in nanoseconds relative to the trigger.
    /// NaN when `has_pulse` is false.
    pub timing_ns: f64,
    /// Integrated charge, in mV·ns. Zero when `has_pulse` is false.
    pub energy: f64,
    /// Waveform minimum (most negative sample), in mV.
    pub peak_mv: f64,
    pub has_pulse: bool,
}

impl ChannelPulse {
    pub fn absent(peak_mv: f64) -> Self {
        Self {
            timing_ns: f64::NAN,
            energy: 0.0,
            peak_mv,
            has_pulse: false,
        }
    }

    pub fn present(timing_ns: f64, energy: f64, peak_mv: f64) -> Self {
        Self {
            timing_ns,
            energy,
            peak_mv,
            has_pulse: true,
        }
    }
}

/// One immutable record of a single trigger, carrying a pulse record
/// per channel in the fixed {A,B,C,D} order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic, zero-based id: matches the event's position in the
    /// store at the moment of insertion.
    pub event_id: u64,
    /// Seconds since the start of the acquisition run.
    pub timestamp: f64,
    pub channel_pulses: [ChannelPulse; 4],
}

impl Event {
    pub fn new(event_id: u64, timestamp: f64, channel_pulses: [ChannelPulse; 4]) -> Self {
        Self {
            event_id,
            timestamp,
            channel_pulses,
        }
    }

    pub fn pulse(&self, channel: Channel) -> &ChannelPulse {
        &self.channel_pulses[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_pulse_has_nan_timing_and_zero_energy() {
        let pulse = ChannelPulse::absent(-0.02);
        assert!(pulse.timing_ns.is_nan());
        assert_eq!(pulse.energy, 0.0);
        assert!(!pulse.has_pulse);
    }

    #[test]
    fn event_pulse_lookup_respects_channel_order() {
        let pulses = [
            ChannelPulse::present(1.0, 2.0, -3.0),
            ChannelPulse::absent(0.0),
            ChannelPulse::absent(0.0),
            ChannelPulse::absent(0.0),
        ];
        let event = Event::new(0, 0.0, pulses);
        assert_eq!(event.pulse(Channel::A).timing_ns, 1.0);
        assert!(!event.pulse(Channel::B).has_pulse);
    }
}
