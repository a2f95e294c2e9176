//! 3000-series driver: 1 MΩ fixed impedance, iterative timebase search,
//! series-specific trigger API (advanced condition/property/direction
//! triplet, modeled rather than bound via FFI — see `consts` module doc).

use std::collections::HashMap;

use daq_types::channel::Channel;
use daq_types::error::CoreError;
use daq_types::scope::ScopeSettings;
use daq_types::trigger::{Direction, TriggerSpec, TRIGGER_LEVEL_MV};

use crate::buffer::BoundBuffer;
use crate::consts;
use crate::convert::level_to_adc;
use crate::traits::{
    BindAction, ChannelConfig, DeviceFamily, DeviceInfo, DigitizerDriver, PollStatus,
    TriggerSummary,
};

/// No 3000-series vendor library is linked into this build; probing
/// always reports nothing found. Kept as its own function so a future
/// build that links the real SDK only has to change this one spot.
fn probe_vendor_device() -> Option<(String, i32)> {
    None
}

pub struct Model3000Driver {
    opened: bool,
    serial: String,
    max_adc: i32,
    settings: Option<ScopeSettings>,
    segment_count: usize,
    capture_count: usize,
    bindings: HashMap<(Channel, usize), BoundBuffer>,
}

impl Model3000Driver {
    pub fn new() -> Self {
        Self {
            opened: false,
            serial: String::new(),
            max_adc: consts::MAX_ADC_8BIT,
            settings: None,
            segment_count: 0,
            capture_count: 0,
            bindings: HashMap::new(),
        }
    }

    /// Construct a driver already in the opened state, for tests that
    /// exercise timebase search / trigger programming / buffer binding
    /// logic without a physical device attached.
    #[cfg(test)]
    fn new_opened_for_test() -> Self {
        let mut d = Self::new();
        d.opened = true;
        d.serial = "TEST-3000".to_string();
        d
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
}

impl Default for Model3000Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitizerDriver for Model3000Driver {
    fn open(&mut self) -> Result<DeviceInfo, CoreError> {
        let (serial, max_adc) = probe_vendor_device().ok_or(CoreError::DeviceNotFound)?;
        self.opened = true;
        self.serial = serial.clone();
        self.max_adc = max_adc;
        Ok(DeviceInfo {
            family: DeviceFamily::Model3000,
            serial,
            max_adc,
        })
    }

    fn configure_channels(&mut self, config: ChannelConfig) -> Result<ScopeSettings, CoreError> {
        self.require_opened()?;
        if config.impedance_ohm != consts::IMPEDANCE_1M_OHM {
            return Err(CoreError::DeviceUnsupported);
        }
        let settings = ScopeSettings {
            sample_interval_ns: 0.0,
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
        let mut settings = self.settings.ok_or(CoreError::TimebaseUnavailable)?;

        // Iterative search: starting from timebase 0, increase until the
        // device (modeled) reports validity for `channel_count` active
        // channels. A real 3000-series unit can run every timebase index
        // with 4 channels active in 8-bit mode, so the search always
        // terminates quickly here; the loop bound below guards against
        // an unbounded search on a future, stricter model.
        const MAX_TIMEBASE: u32 = 32;
        for timebase in 0..MAX_TIMEBASE {
            if channel_count > 4 {
                continue;
            }
            let interval_ns = consts::timebase_3000_interval_ns(timebase);
            let pre_samples = (target_pre_ns as f64 / interval_ns).floor() as usize;
            let post_samples = (target_post_ns as f64 / interval_ns).floor() as usize;
            if pre_samples == 0 || post_samples == 0 {
                continue;
            }
            settings.sample_interval_ns = interval_ns;
            settings.pre_samples = pre_samples;
            settings.post_samples = post_samples;
            settings.timebase_index = timebase;
            self.settings = Some(settings);
            return Ok(settings);
        }
        Err(CoreError::TimebaseUnavailable)
    }

    fn configure_trigger(
        &mut self,
        spec: &TriggerSpec,
        settings: &ScopeSettings,
    ) -> Result<TriggerSummary, CoreError> {
        self.require_opened()?;
        spec.validate()?;
        let threshold_code = level_to_adc(TRIGGER_LEVEL_MV as f64, settings.range_mv, settings.max_adc);
        let _ = threshold_code; // programmed into the (modeled) advanced trigger API
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
        if end_segment >= self.segment_count || start_segment > end_segment {
            return Err(CoreError::DownloadFailed(format!(
                "invalid segment range [{start_segment}, {end_segment}]"
            )));
        }
        // With no vendor library linked, there is nothing to copy into
        // the bound buffers; a real implementation issues the bulk
        // transfer call here. Buffers are left as the caller initialized
        // them.
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

#[cfg(test)]
mod tests {
    use super::*;
    use daq_types::trigger::TriggerCondition;

    #[test]
    fn resolve_timebase_picks_fastest_index_with_nonzero_samples() {
        let mut d = Model3000Driver::new_opened_for_test();
        d.configure_channels(ChannelConfig {
            range_mv: 100,
            impedance_ohm: consts::IMPEDANCE_1M_OHM,
        })
        .unwrap();
        let settings = d.resolve_timebase(1_000, 2_000, 4).unwrap();
        assert!(settings.pre_samples > 0);
        assert!(settings.post_samples > 0);
        assert_eq!(
            settings.sample_interval_ns,
            consts::timebase_3000_interval_ns(settings.timebase_index)
        );
    }

    #[test]
    fn configure_trigger_rejects_all_inactive_spec() {
        let mut d = Model3000Driver::new_opened_for_test();
        let settings = d
            .configure_channels(ChannelConfig {
                range_mv: 100,
                impedance_ohm: consts::IMPEDANCE_1M_OHM,
            })
            .unwrap();
        let spec = TriggerSpec::new(vec![TriggerCondition::new(vec![])], None);
        assert!(d.configure_trigger(&spec, &settings).is_err());
    }

    #[test]
    fn set_capture_count_rejects_exceeding_allocated_segments() {
        let mut d = Model3000Driver::new_opened_for_test();
        d.allocate_segments(5).unwrap();
        assert!(d.set_capture_count(6).is_err());
        assert!(d.set_capture_count(5).is_ok());
    }

    #[test]
    fn configure_channels_rejects_50_ohm_impedance() {
        let mut d = Model3000Driver::new_opened_for_test();
        let result = d.configure_channels(ChannelConfig {
            range_mv: 100,
            impedance_ohm: consts::IMPEDANCE_50_OHM,
        });
        assert!(matches!(result, Err(CoreError::DeviceUnsupported)));
    }
}
