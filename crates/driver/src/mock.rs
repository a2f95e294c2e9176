//! A stubbed-out driver that does not access any hardware: generates
//! synthetic rapid-block captures so the acquisition engine and pulse
//! analyzer can be exercised without a physical digitizer.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use daq_types::channel::Channel;
use daq_types::error::CoreError;
use daq_types::scope::ScopeSettings;
use daq_types::trigger::{Direction, TriggerSpec, TRIGGER_LEVEL_MV};

use crate::buffer::BoundBuffer;
use crate::consts;
use crate::convert::mv_to_code;
use crate::traits::{
    BindAction, ChannelConfig, DeviceFamily, DeviceInfo, DigitizerDriver, PollStatus,
    TriggerSummary,
};

/// A negative triangular pulse to inject into one channel of one
/// segment on the next `bulk_download`.
#[derive(Debug, Clone, Copy)]
pub struct InjectedPulse {
    pub peak_mv: f32,
    pub peak_sample: usize,
    pub rise_samples: usize,
}

pub struct MockDriver {
    opened: bool,
    max_adc: i32,
    settings: Option<ScopeSettings>,
    segment_count: usize,
    capture_count: usize,
    bindings: HashMap<(Channel, usize), BoundBuffer>,
    noise_sigma_mv: f32,
    injections: HashMap<(Channel, usize), InjectedPulse>,
    rng: StdRng,
}

impl MockDriver {
    /// `seed` makes the injected Gaussian noise reproducible across test
    /// runs.
    pub fn new(seed: u64) -> Self {
        Self {
            opened: false,
            max_adc: consts::MAX_ADC_8BIT,
            settings: None,
            segment_count: 0,
            capture_count: 0,
            bindings: HashMap::new(),
            noise_sigma_mv: 0.3,
            injections: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_noise_sigma_mv(mut self, sigma: f32) -> Self {
        self.noise_sigma_mv = sigma;
        self
    }

    /// Register a pulse to be written into (channel, segment) on the
    /// next `bulk_download`. Consumed (not replayed across blocks).
    pub fn inject_pulse(&mut self, channel: Channel, segment: usize, pulse: InjectedPulse) {
        self.injections.insert((channel, segment), pulse);
    }

    fn require_opened(&self) -> Result<(), CoreError> {
        if self.opened {
            Ok(())
        } else {
            Err(CoreError::ConfigurationInvalid(
                "device not open".to_string(),
            ))
        }
    }

    fn synthesize_waveform(&mut self, total_samples: usize, injection: Option<InjectedPulse>) -> Vec<f32> {
        let normal = Normal::new(0.0f32, self.noise_sigma_mv).expect("sigma must be finite and >= 0");
        let mut samples: Vec<f32> = (0..total_samples)
            .map(|_| normal.sample(&mut self.rng))
            .collect();
        if let Some(pulse) = injection {
            for (i, sample) in samples.iter_mut().enumerate() {
                if i < pulse.peak_sample.saturating_sub(pulse.rise_samples) || i > pulse.peak_sample {
                    continue;
                }
                let distance = pulse.peak_sample - i;
                let fraction = 1.0 - (distance as f32 / pulse.rise_samples.max(1) as f32);
                *sample += pulse.peak_mv * fraction;
            }
        }
        samples
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DigitizerDriver for MockDriver {
    fn open(&mut self) -> Result<DeviceInfo, CoreError> {
        self.opened = true;
        Ok(DeviceInfo {
            family: DeviceFamily::Model3000,
            serial: "MOCK-0001".to_string(),
            max_adc: self.max_adc,
        })
    }

    fn configure_channels(&mut self, config: ChannelConfig) -> Result<ScopeSettings, CoreError> {
        self.require_opened()?;
        let settings = ScopeSettings {
            sample_interval_ns: 0.8,
            pre_samples: 0,
            post_samples: 0,
            resolution_bits: consts::RESOLUTION_BITS,
            range_mv: config.range_mv,
            max_adc: self.max_adc,
            timebase_index: 0,
        };
        self.settings = Some(settings);
        Ok(settings)
    }

    fn resolve_timebase(
        &mut self,
        target_pre_ns: u32,
        target_post_ns: u32,
        channel_count: usize,
    ) -> Result<ScopeSettings, CoreError> {
        self.require_opened()?;
        if channel_count > 4 {
            return Err(CoreError::TimebaseUnavailable);
        }
        let mut settings = self.settings.ok_or(CoreError::TimebaseUnavailable)?;
        let interval_ns = settings.sample_interval_ns;
        settings.pre_samples = (target_pre_ns as f64 / interval_ns).floor() as usize;
        settings.post_samples = (target_post_ns as f64 / interval_ns).floor() as usize;
        self.settings = Some(settings);
        Ok(settings)
    }

    fn configure_trigger(
        &mut self,
        spec: &TriggerSpec,
        _settings: &ScopeSettings,
    ) -> Result<TriggerSummary, CoreError> {
        self.require_opened()?;
        spec.validate()?;
        Ok(TriggerSummary {
            num_conditions: spec.active_conditions().count(),
            condition_channels: spec
                .active_conditions()
                .map(|c| c.channels.clone())
                .collect(),
            threshold_mv: TRIGGER_LEVEL_MV,
            direction: Direction::Falling,
            auto_trigger_ms: spec.auto_trigger_ms,
        })
    }

    fn allocate_segments(&mut self, count: usize) -> Result<(), CoreError> {
        self.require_opened()?;
        self.segment_count = count;
        self.bindings.clear();
        Ok(())
    }

    fn set_capture_count(&mut self, count: usize) -> Result<(), CoreError> {
        self.require_opened()?;
        if count > self.segment_count {
            return Err(CoreError::ConfigurationInvalid(format!(
                "capture count {count} exceeds allocated segments {}",
                self.segment_count
            )));
        }
        self.capture_count = count;
        Ok(())
    }

    fn bind_buffers(
        &mut self,
        channel: Channel,
        segment_index: usize,
        buffer: BoundBuffer,
        action: BindAction,
    ) -> Result<(), CoreError> {
        self.require_opened()?;
        if segment_index >= self.segment_count {
            return Err(CoreError::BufferBindingFailed(format!(
                "segment {segment_index} out of range (allocated {})",
                self.segment_count
            )));
        }
        if action == BindAction::ClearThenAdd && segment_index == 0 {
            self.bindings.retain(|(c, _), _| *c != channel);
        }
        self.bindings.insert((channel, segment_index), buffer);
        Ok(())
    }

    fn run_block(&mut self, _settings: &ScopeSettings) -> Result<(), CoreError> {
        self.require_opened()
    }

    fn poll_ready(&mut self) -> Result<PollStatus, CoreError> {
        self.require_opened()?;
        Ok(PollStatus::Ready)
    }

    fn bulk_download(&mut self, start_segment: usize, end_segment: usize) -> Result<(), CoreError> {
        self.require_opened()?;
        let settings = self.settings.ok_or(CoreError::DownloadFailed(
            "channels not configured".to_string(),
        ))?;
        let total_samples = settings.total_samples();
        for segment in start_segment..=end_segment {
            for channel in Channel::ALL {
                let injection = self.injections.remove(&(channel, segment));
                let Some(mut buffer) = self.bindings.remove(&(channel, segment)) else {
                    continue;
                };
                let waveform = self.synthesize_waveform(total_samples, injection);
                let codes: Vec<i16> = waveform
                    .iter()
                    .map(|mv| mv_to_code(*mv as f64, settings.range_mv, settings.max_adc))
                    .collect();
                // SAFETY: the caller (acquisition engine) guarantees the
                // backing memory for every bound buffer outlives the
                // block this download belongs to.
                unsafe {
                    buffer.write(&codes);
                }
                self.bindings.insert((channel, segment), buffer);
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CoreError> {
        self.require_opened()
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.opened = false;
        self.bindings.clear();
        Ok(())
    }

    fn family(&self) -> DeviceFamily {
        DeviceFamily::Model3000
    }
}
