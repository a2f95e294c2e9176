//! Single-channel energy histogram: raw (mV·ns) or calibrated (keV),
//! with an optional gate events must satisfy and an optional fixed
//! range.

use daq_types::calibration::ChannelCalibration;
use daq_types::channel::Channel;
use daq_types::event::Event;

use crate::histogram::{build_histogram, Histogram};

#[derive(Debug, Clone, Copy)]
pub struct EnergyHistogramRequest {
    pub channel: Channel,
    pub bin_count: usize,
    pub range: Option<(f64, f64)>,
    /// Request keV values via `calibration` rather than raw mV·ns.
    pub calibrated: bool,
}

/// Builds the requested channel's energy histogram. Returns `None` if
/// a calibrated histogram was requested on a channel that has no
/// calibration yet: the channel is omitted rather than shown raw.
pub fn energy_histogram(
    events: &[Event],
    request: &EnergyHistogramRequest,
    calibration: &ChannelCalibration,
) -> Option<Histogram> {
    if request.calibrated && !calibration.calibrated {
        return None;
    }

    let samples: Vec<f64> = events
        .iter()
        .map(|event| event.pulse(request.channel))
        .filter(|pulse| pulse.has_pulse)
        .filter_map(|pulse| {
            if request.calibrated {
                calibration.apply(pulse.energy)
            } else {
                Some(pulse.energy)
            }
        })
        .collect();

    build_histogram(&samples, request.bin_count, request.range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_types::event::ChannelPulse;

    fn event_with(channel_energy: f64, has_pulse: bool) -> Event {
        let mut pulses = [ChannelPulse::absent(0.0); 4];
        pulses[Channel::A.index()] = if has_pulse {
            ChannelPulse::present(10.0, channel_energy, -5.0)
        } else {
            ChannelPulse::absent(0.0)
        };
        Event::new(0, 0.0, pulses)
    }

    #[test]
    fn raw_histogram_ignores_events_without_a_pulse() {
        let events = vec![event_with(100.0, true), event_with(200.0, false), event_with(300.0, true)];
        let request = EnergyHistogramRequest {
            channel: Channel::A,
            bin_count: 2,
            range: Some((0.0, 400.0)),
            calibrated: false,
        };
        let histogram = energy_histogram(&events, &request, &ChannelCalibration::default()).unwrap();
        assert_eq!(histogram.total(), 2);
    }

    #[test]
    fn calibrated_histogram_on_uncalibrated_channel_is_omitted() {
        let events = vec![event_with(100.0, true)];
        let request = EnergyHistogramRequest {
            channel: Channel::A,
            bin_count: 2,
            range: None,
            calibrated: true,
        };
        assert!(energy_histogram(&events, &request, &ChannelCalibration::default()).is_none());
    }

    #[test]
    fn calibrated_histogram_applies_the_linear_fit() {
        let events = vec![event_with(200_000.0, true)];
        let calibration = ChannelCalibration {
            calibrated: true,
            gain: 0.002547,
            offset: 1.467,
            peak_1_raw: 200_000.0,
            peak_2_raw: 500_000.0,
            calibration_date: None,
        };
        let request = EnergyHistogramRequest {
            channel: Channel::A,
            bin_count: 1,
            range: Some((500.0, 520.0)),
            calibrated: true,
        };
        let histogram = energy_histogram(&events, &request, &calibration).unwrap();
        assert_eq!(histogram.total(), 1);
    }
}
