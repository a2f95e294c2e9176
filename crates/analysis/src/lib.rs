//! Offline analyses over a captured run's events: energy calibration
//! and the energy/timing histograms built on top of it.

pub mod calibration;
pub mod energy_histogram;
pub mod histogram;
pub mod timing_histogram;

pub use calibration::{fit_calibration, raw_energies_with_pulse, weighted_mean_peak};
pub use energy_histogram::{energy_histogram, EnergyHistogramRequest};
pub use histogram::{build_histogram, Histogram};
pub use timing_histogram::{timing_difference_histogram, TimingHistogramRequest};
