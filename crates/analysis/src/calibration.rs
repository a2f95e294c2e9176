//! Two-point energy calibration: fits a per-channel linear map from raw
//! mV·ns energy to keV using the Na-22 511 keV and 1275 keV lines,
//! validated against the sub-reasons in
//! `daq_types::error::CalibrationInvalidReason`.

use chrono::Utc;

use daq_types::calibration::{ChannelCalibration, REFERENCE_ENERGY_1_KEV, REFERENCE_ENERGY_2_KEV};
use daq_types::channel::Channel;
use daq_types::error::CalibrationInvalidReason;
use daq_types::event::Event;

const MIN_EVENTS: usize = 100;
const MIN_PEAK_SEPARATION_FRACTION: f64 = 0.10;
const RATIO_RANGE: (f64, f64) = (1.5, 4.0);
const GAIN_RANGE: (f64, f64) = (1e-3, 1e3);
const PEAK_FINDER_BINS: usize = 100;
/// Below this count a peak-finding sub-range is suspiciously thin; still
/// fit through it, but warn rather than reject outright.
const MIN_REGION_EVENTS: usize = 20;

/// Raw (mV·ns) energies of every event with a pulse on `channel`, in
/// event order.
pub fn raw_energies_with_pulse(events: &[Event], channel: Channel) -> Vec<f64> {
    events
        .iter()
        .map(|event| event.pulse(channel))
        .filter(|pulse| pulse.has_pulse)
        .map(|pulse| pulse.energy)
        .collect()
}

/// Count-weighted mean of bin centers over `[lo, hi]`, the peak-finding
/// rule. `EmptyRange` if the sub-range holds no events.
pub fn weighted_mean_peak(raw_energies: &[f64], lo: f64, hi: f64) -> Result<f64, CalibrationInvalidReason> {
    let histogram = crate::histogram::build_histogram(raw_energies, PEAK_FINDER_BINS, Some((lo, hi)))
        .filter(|h| h.total() > 0)
        .ok_or(CalibrationInvalidReason::EmptyRange)?;

    let width = histogram.bin_width();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (i, &count) in histogram.counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let center = histogram.lo + width * (i as f64 + 0.5);
        weighted_sum += center * count as f64;
        weight_total += count as f64;
    }
    Ok(weighted_sum / weight_total)
}

/// Number of raw energies falling in `[lo, hi]`.
fn count_in_range(raw_energies: &[f64], lo: f64, hi: f64) -> usize {
    raw_energies.iter().filter(|&&e| e >= lo && e <= hi).count()
}

/// Fits a two-point linear calibration from raw energies observed
/// around two user-chosen sub-ranges, each expected to bracket one of
/// the reference lines. `raw_energies` must already be filtered to
/// events with a pulse on the target channel.
pub fn fit_calibration(
    raw_energies: &[f64],
    range_1: (f64, f64),
    range_2: (f64, f64),
) -> Result<ChannelCalibration, CalibrationInvalidReason> {
    if raw_energies.len() < MIN_EVENTS {
        return Err(CalibrationInvalidReason::TooFewEvents);
    }

    let region_1_count = count_in_range(raw_energies, range_1.0, range_1.1);
    if region_1_count < MIN_REGION_EVENTS {
        log::warn!(
            "peak-finding region 1 ({:?}) holds only {region_1_count} events, below the recommended minimum of {MIN_REGION_EVENTS}",
            range_1
        );
    }
    let region_2_count = count_in_range(raw_energies, range_2.0, range_2.1);
    if region_2_count < MIN_REGION_EVENTS {
        log::warn!(
            "peak-finding region 2 ({:?}) holds only {region_2_count} events, below the recommended minimum of {MIN_REGION_EVENTS}",
            range_2
        );
    }

    let peak_1_raw = weighted_mean_peak(raw_energies, range_1.0, range_1.1)?;
    let peak_2_raw = weighted_mean_peak(raw_energies, range_2.0, range_2.1)?;

    let separation = (peak_2_raw - peak_1_raw).abs() / peak_1_raw.abs().max(peak_2_raw.abs());
    if separation < MIN_PEAK_SEPARATION_FRACTION {
        return Err(CalibrationInvalidReason::PeaksTooClose);
    }

    let ratio = peak_2_raw / peak_1_raw;
    if !(RATIO_RANGE.0..=RATIO_RANGE.1).contains(&ratio) {
        return Err(CalibrationInvalidReason::RatioOutOfRange);
    }

    let gain = (REFERENCE_ENERGY_2_KEV - REFERENCE_ENERGY_1_KEV) / (peak_2_raw - peak_1_raw);
    if !gain.is_finite() || gain <= 0.0 {
        return Err(CalibrationInvalidReason::NonPositiveGain);
    }
    if !(GAIN_RANGE.0..=GAIN_RANGE.1).contains(&gain) {
        return Err(CalibrationInvalidReason::GainOutOfRange);
    }

    let offset = REFERENCE_ENERGY_1_KEV - gain * peak_1_raw;

    Ok(ChannelCalibration {
        calibrated: true,
        gain,
        offset,
        peak_1_raw,
        peak_2_raw,
        calibration_date: Some(Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 150 events split between two tight clusters bracketing the
    /// 511/1275 keV lines, enough to clear every validation rule.
    fn two_peak_raw_energies() -> Vec<f64> {
        let mut energies = Vec::new();
        for i in 0..90 {
            energies.push(200_000.0 + (i % 5) as f64 * 40.0 - 80.0);
        }
        for i in 0..60 {
            energies.push(500_000.0 + (i % 5) as f64 * 40.0 - 80.0);
        }
        energies
    }

    #[test]
    fn two_point_fit_recovers_gain_and_offset_matching_the_reference_lines() {
        let energies = two_peak_raw_energies();
        let cal = fit_calibration(&energies, (190_000.0, 210_000.0), (490_000.0, 510_000.0)).unwrap();
        assert!(cal.calibrated);
        assert!(cal.invariant_holds());
        assert!((cal.apply(cal.peak_1_raw).unwrap() - REFERENCE_ENERGY_1_KEV).abs() < 1.0);
        assert!((cal.apply(cal.peak_2_raw).unwrap() - REFERENCE_ENERGY_2_KEV).abs() < 1.0);
    }

    #[test]
    fn fewer_than_100_events_is_rejected() {
        let energies = vec![200_000.0; 50];
        let err = fit_calibration(&energies, (190_000.0, 210_000.0), (490_000.0, 510_000.0)).unwrap_err();
        assert_eq!(err, CalibrationInvalidReason::TooFewEvents);
    }

    #[test]
    fn peaks_too_close_together_is_rejected() {
        let mut energies = vec![200_000.0; 60];
        energies.extend(vec![205_000.0; 60]);
        let err = fit_calibration(&energies, (190_000.0, 210_000.0), (195_000.0, 215_000.0)).unwrap_err();
        assert_eq!(err, CalibrationInvalidReason::PeaksTooClose);
    }

    #[test]
    fn ratio_outside_expected_band_is_rejected() {
        let mut energies = vec![200_000.0; 60];
        energies.extend(vec![1_200_000.0; 60]);
        let err = fit_calibration(&energies, (190_000.0, 210_000.0), (1_190_000.0, 1_210_000.0)).unwrap_err();
        assert_eq!(err, CalibrationInvalidReason::RatioOutOfRange);
    }

    #[test]
    fn thin_peak_region_still_fits_but_is_non_fatal() {
        // Region 1 holds only 10 events, below MIN_REGION_EVENTS, but the
        // overall event count and peak separation still clear every hard
        // rejection rule, so the fit should still succeed.
        let mut energies = vec![200_000.0; 10];
        energies.extend(vec![500_000.0; 140]);
        let cal = fit_calibration(&energies, (190_000.0, 210_000.0), (490_000.0, 510_000.0)).unwrap();
        assert!(cal.calibrated);
    }

    #[test]
    fn empty_sub_range_is_rejected() {
        let energies = two_peak_raw_energies();
        let err = fit_calibration(&energies, (1.0, 2.0), (490_000.0, 510_000.0)).unwrap_err();
        assert_eq!(err, CalibrationInvalidReason::EmptyRange);
    }
}
