//! Mathematical utility functions for analog-modeled DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Saturation
//!
//! | Function | Character | Use Case |
//! |----------|-----------|----------|
//! | [`saturate`] | tanh with drive | Oscillator squaring circuit, output stages |
//! | [`hard_clip`] | Flat tops | Overload protection inside feedback paths |
//!
//! # Pitch
//!
//! - [`pitch_to_freq`] - Fractional MIDI pitch to Hz (A4 = 69 = 440 Hz)
//!
//! # Utilities
//!
//! - [`map_clamped`] - Clamped linear mapping
//! - [`seconds_to_samples`] - Time conversions
//! - [`flush_denormal`] - Subnormal protection in feedback loops

use libm::{exp2f, tanhf};

/// Hyperbolic tangent saturation with input drive: `tanh(x * drive)`.
///
/// # Example
/// ```rust
/// use voltage_core::saturate;
///
/// assert!(saturate(1.0, 1.2) < 1.0);
/// assert!(saturate(10.0, 1.2) <= 1.0);
/// assert_eq!(saturate(0.0, 1.2), 0.0);
/// ```
#[inline]
pub fn saturate(x: f32, drive: f32) -> f32 {
    tanhf(x * drive)
}

/// Hard clip to ±threshold range.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Map `x` from `[in_min, in_max]` to `[out_min, out_max]`, clamping to the output range.
///
/// Used to blend correction factors smoothly across a frequency band so
/// coefficients never jump at a boundary.
///
/// # Example
/// ```rust
/// use voltage_core::map_clamped;
///
/// assert_eq!(map_clamped(250.0, 0.0, 500.0, 0.8, 1.0), 0.9);
/// assert_eq!(map_clamped(900.0, 0.0, 500.0, 0.8, 1.0), 1.0);
/// ```
#[inline]
pub fn map_clamped(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if span == 0.0 {
        return out_min;
    }
    let t = ((x - in_min) / span).clamp(0.0, 1.0);
    out_min + (out_max - out_min) * t
}

/// Convert a (fractional) MIDI pitch to frequency in Hz.
///
/// `f = 440 * 2^((pitch - 69) / 12)`
///
/// # Example
/// ```rust
/// use voltage_core::pitch_to_freq;
///
/// assert!((pitch_to_freq(69.0) - 440.0).abs() < 1e-3);
/// assert!((pitch_to_freq(81.0) - 880.0).abs() < 1e-2);
/// ```
#[inline]
pub fn pitch_to_freq(pitch: f32) -> f32 {
    440.0 * exp2f((pitch - 69.0) / 12.0)
}

/// Convert seconds to samples.
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> f32 {
    seconds * sample_rate
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving margin before the
/// IEEE 754 subnormal range. Use in recursive filters whose state can
/// decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
