//! Trigger specification: up to four OR'd conditions, each AND'ing a
//! non-empty set of channels. Level, direction and hysteresis are fixed
//! for this instrument family (see module constants).

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::CoreError;

/// Fixed trigger level, in millivolts.
pub const TRIGGER_LEVEL_MV: f32 = -5.0;

/// Fixed trigger hysteresis, in ADC counts.
pub const TRIGGER_HYSTERESIS_COUNTS: i16 = 10;

/// Trigger edge direction. Fixed to falling for this instrument, but
/// modeled as an enum because the driver layer must still program a
/// concrete direction value to satisfy vendor validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Falling,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Falling
    }
}

/// A single OR-branch of the trigger specification: all channels in
/// `channels` must cross the threshold (logical AND) for this condition
/// to fire. An empty channel set makes the condition inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub channels: Vec<Channel>,
}

impl TriggerCondition {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn is_active(&self) -> bool {
        !self.channels.is_empty()
    }
}

/// Up to four conditions, OR'd together. At least one must be active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub conditions: Vec<TriggerCondition>,
    /// Optional auto-trigger timeout in milliseconds; `None` disables
    /// auto-triggering (the device waits indefinitely for a real edge).
    pub auto_trigger_ms: Option<u32>,
}

impl TriggerSpec {
    pub fn new(conditions: Vec<TriggerCondition>, auto_trigger_ms: Option<u32>) -> Self {
        Self {
            conditions,
            auto_trigger_ms,
        }
    }

    /// A single condition ANDing all four channels, no auto-trigger timeout.
    pub fn all_channels() -> Self {
        Self::new(
            vec![TriggerCondition::new(Channel::ALL.to_vec())],
            None,
        )
    }

    pub fn active_conditions(&self) -> impl Iterator<Item = &TriggerCondition> {
        self.conditions.iter().filter(|c| c.is_active())
    }

    /// An all-inactive specification (no conditions, or every condition
    /// empty, or more than four conditions) is invalid.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.conditions.len() > 4 {
            return Err(CoreError::ConfigurationInvalid(format!(
                "trigger specification carries {} conditions, at most 4 are supported",
                self.conditions.len()
            )));
        }
        if self.active_conditions().next().is_none() {
            return Err(CoreError::ConfigurationInvalid(
                "trigger specification has no active condition".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_inactive_is_rejected() {
        let spec = TriggerSpec::new(vec![TriggerCondition::new(vec![])], None);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn empty_conditions_is_rejected() {
        let spec = TriggerSpec::new(vec![], None);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn single_active_condition_is_accepted() {
        let spec = TriggerSpec::all_channels();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn mixed_active_and_inactive_conditions_is_accepted() {
        let spec = TriggerSpec::new(
            vec![
                TriggerCondition::new(vec![Channel::A]),
                TriggerCondition::new(vec![]),
            ],
            Some(5_000),
        );
        assert!(spec.validate().is_ok());
    }
}
