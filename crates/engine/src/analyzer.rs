//! Per-waveform pulse analyzer: pure, side-effect free, safe to call
//! from any thread.

use daq_types::event::ChannelPulse;

/// CFD fraction used to locate the pulse-timing crossing.
pub const CFD_FRACTION: f64 = 0.5;

/// Minimum amplitude (baseline minus peak) for a waveform to count as a
/// pulse, in millivolts. Independently configurable from the trigger
/// threshold (see DESIGN.md).
pub const AMPLITUDE_THRESHOLD_MV: f64 = 5.0;

/// Analyze one channel's waveform. `samples` has length `total_samples`
/// and covers `pre_samples` baseline samples followed by the post-trigger
/// window; `sample_interval_ns` is the achieved sample spacing.
pub fn analyze_waveform(
    samples: &[f64],
    pre_samples: usize,
    sample_interval_ns: f64,
) -> ChannelPulse {
    let total_samples = samples.len();
    debug_assert!(pre_samples <= total_samples);

    let baseline = mean(&samples[..pre_samples]);

    let (peak_index, peak) = argmin(&samples[pre_samples..total_samples])
        .map(|(i, v)| (i + pre_samples, v))
        .unwrap_or((pre_samples, baseline));

    let amplitude = baseline - peak;
    if amplitude < AMPLITUDE_THRESHOLD_MV {
        return ChannelPulse::absent(peak);
    }

    let threshold = baseline - CFD_FRACTION * amplitude;
    let crossing = (pre_samples..peak_index).find(|&i| {
        samples[i] >= threshold && samples[i + 1] < threshold
    });

    let Some(i) = crossing else {
        return ChannelPulse::absent(peak);
    };

    let timing_samples = i as f64 + (samples[i] - threshold) / (samples[i] - samples[i + 1]);
    let timing_ns = (timing_samples - pre_samples as f64) * sample_interval_ns;

    let energy: f64 = -samples.iter().map(|s| (s - baseline) * sample_interval_ns).sum::<f64>();

    ChannelPulse::present(timing_ns, energy, peak)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn argmin(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .fold(None, |acc, (i, &v)| match acc {
            Some((_, best)) if best <= v => acc,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE_SAMPLES: usize = 1249;
    const TOTAL_SAMPLES: usize = 3749;
    const INTERVAL_NS: f64 = 0.8;

    fn flat_waveform() -> Vec<f64> {
        vec![0.0; TOTAL_SAMPLES]
    }

    /// Deterministic "noise" generator: a small-amplitude sine so the
    /// scenario is reproducible without pulling in `rand` for a pure
    /// math crate.
    fn noisy_waveform(sigma: f64) -> Vec<f64> {
        (0..TOTAL_SAMPLES)
            .map(|i| sigma * ((i as f64 * 0.137).sin()))
            .collect()
    }

    fn inject_triangular_pulse(samples: &mut [f64], peak_sample: usize, peak_mv: f64, rise: usize) {
        for i in peak_sample.saturating_sub(rise)..=peak_sample {
            let distance = peak_sample - i;
            let fraction = 1.0 - (distance as f64 / rise.max(1) as f64);
            samples[i] += peak_mv * fraction;
        }
    }

    #[test]
    fn baseline_only_noise_has_no_pulse() {
        let samples = noisy_waveform(0.3);
        let pulse = analyze_waveform(&samples, PRE_SAMPLES, INTERVAL_NS);
        assert!(!pulse.has_pulse);
        assert!(pulse.timing_ns.is_nan());
        assert_eq!(pulse.energy, 0.0);
    }

    #[test]
    fn single_clean_pulse_is_detected_with_expected_timing_and_peak() {
        let mut samples = flat_waveform();
        inject_triangular_pulse(&mut samples, 1300, -40.0, 3);
        let pulse = analyze_waveform(&samples, PRE_SAMPLES, INTERVAL_NS);
        assert!(pulse.has_pulse);
        assert!((pulse.peak_mv - (-40.0)).abs() < 0.5);
        let expected_ns = (1300.0 - 1.0 - PRE_SAMPLES as f64) * INTERVAL_NS;
        assert!(
            (pulse.timing_ns - expected_ns).abs() <= 0.8,
            "timing_ns = {}, expected ~{}",
            pulse.timing_ns,
            expected_ns
        );
    }

    #[test]
    fn energy_scales_linearly_with_rectangular_pulse_amplitude() {
        let mut first = flat_waveform();
        let mut second = flat_waveform();
        for i in 1300..1320 {
            first[i] = -40.0;
            second[i] = -80.0;
        }
        let e1 = analyze_waveform(&first, PRE_SAMPLES, INTERVAL_NS).energy;
        let e2 = analyze_waveform(&second, PRE_SAMPLES, INTERVAL_NS).energy;
        let ratio = e2 / e1;
        assert!((ratio - 2.0).abs() <= 0.01, "ratio = {ratio}");
    }

    #[test]
    fn amplitude_exactly_at_threshold_counts_as_a_pulse() {
        let mut samples = flat_waveform();
        samples[1300] = -5.0;
        let pulse = analyze_waveform(&samples, PRE_SAMPLES, INTERVAL_NS);
        assert!(pulse.has_pulse);
    }

    #[test]
    fn minimum_at_the_window_edge_has_no_resolvable_crossing() {
        let mut samples = flat_waveform();
        // Amplitude is well above threshold, but the minimum falls on the
        // very first post-trigger sample, so the crossing search range
        // (pre_samples..peak_index) is empty: there is no leading-edge
        // pair left to resolve a timing crossing from.
        samples[PRE_SAMPLES] = -40.0;
        let pulse = analyze_waveform(&samples, PRE_SAMPLES, INTERVAL_NS);
        assert!(!pulse.has_pulse);
    }
}
