//! Shared domain types for the acquisition pipeline.
//!
//! No I/O, no locking, just the data shapes and error taxonomy that
//! every other crate in the workspace builds on.

pub mod calibration;
pub mod channel;
pub mod error;
pub mod event;
pub mod notify;
pub mod scope;
pub mod state;
pub mod trigger;

pub use calibration::ChannelCalibration;
pub use channel::Channel;
pub use error::{CalibrationInvalidReason, CoreError};
pub use event::{ChannelPulse, Event};
pub use notify::Notification;
pub use scope::ScopeSettings;
pub use state::DaemonState;
pub use trigger::{TriggerCondition, TriggerSpec};
