//! Vendor-SDK-derived constants.
//!
//! Mirrors the pattern used by vendor timing-electronics bindings (e.g.
//! a `mhdefin.h`-derived constants module): the values below are the
//! ones a PicoScope 3000/6000-series vendor header would define. They
//! are reproduced here rather than pulled in via a bindgen'd sys crate,
//! since no such proprietary SDK is available to this build — see
//! DESIGN.md for the tradeoff.

/// 1 MΩ input impedance, available on every 3000-series channel.
pub const IMPEDANCE_1M_OHM: u32 = 1_000_000;

/// 50 Ω input impedance, available on 6000-series channels (and on
/// some 3000-series units, which this driver does not target).
pub const IMPEDANCE_50_OHM: u32 = 50;

/// Requested pre/post trigger windows: ~1 µs pre, ~2 µs post, chosen
/// to maximize sample rate for four active channels.
pub const TARGET_PRE_NS: u32 = 1_000;
pub const TARGET_POST_NS: u32 = 2_000;

/// Default full-scale voltage range for all four channels, in mV.
pub const DEFAULT_RANGE_MV: i32 = 100;

/// 8-bit resolution on both families for the models this driver targets.
pub const RESOLUTION_BITS: u8 = 8;
pub const MAX_ADC_8BIT: i32 = 32_512;

/// Per-family batch size (rapid-block capture count): a throughput
/// knob, not a semantic one.
pub const BATCH_SIZE_3000: usize = 10;
pub const BATCH_SIZE_6000: usize = 20;

/// 3000-series timebase model: `interval_ns = (timebase + 1) / rate_ghz`
/// below index 3, and `2^(timebase - 2)` nanoseconds from index 3
/// upward, mirroring the documented PicoScope 3000-series timebase
/// table for four simultaneously active channels.
pub fn timebase_3000_interval_ns(timebase: u32) -> f64 {
    match timebase {
        0 => 0.8,
        1 => 1.6,
        2 => 3.2,
        t => 2f64.powi(t as i32 - 2),
    }
}

/// 6000-series timebase model: `interval_ns = 2^timebase / rate_ghz`
/// for the resolution this driver targets, with a fixed fastest index
/// (`0`) for four active channels at 8-bit resolution.
pub fn timebase_6000_interval_ns(timebase: u32) -> f64 {
    match timebase {
        0 => 0.4,
        1 => 0.8,
        t => 2f64.powi(t as i32 - 1),
    }
}
