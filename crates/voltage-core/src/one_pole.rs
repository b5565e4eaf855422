//! One-pole (6 dB/oct) filters.
//!
//! The low-pass section uses the difference equation:
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! ```
//!
//! where `coeff = exp(-2π * freq / sample_rate)`. The high-pass section is the
//! complement `x[n] - lowpass(x[n])`, which keeps both responses perfectly
//! matched at the crossover.
//!
//! # Usage
//!
//! ```rust
//! use voltage_core::{OnePole, OnePoleHighpass};
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! assert!(lp.process(1.0) < 1.0);
//!
//! let mut hp = OnePoleHighpass::new(48000.0, 72.0);
//! assert!(hp.process(1.0) > 0.9);
//! ```
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio Applications",
//! Section: One-Pole Filter.

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in [0, 1) for stable operation
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Cutoff frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Process one sample through the lowpass filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    fn recalculate_coeff(&mut self) {
        let freq = self.freq.clamp(0.0, self.sample_rate * 0.5);
        self.coeff = expf(-core::f32::consts::TAU * freq / self.sample_rate);
    }
}

/// One-pole (6 dB/oct) highpass built as the complement of [`OnePole`].
///
/// Models a coupling capacitor at the input of an analog stage: DC and
/// sub-sonic content are removed, everything well above the corner passes.
#[derive(Debug, Clone)]
pub struct OnePoleHighpass {
    lowpass: OnePole,
}

impl OnePoleHighpass {
    /// Create a new one-pole highpass with the given corner frequency.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            lowpass: OnePole::new(sample_rate, freq_hz),
        }
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        input - self.lowpass.process(input)
    }

    /// Set the corner frequency.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.lowpass.set_frequency(freq_hz);
    }

    /// Update sample rate, keeping the corner frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.lowpass.set_sample_rate(sample_rate);
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.lowpass.reset();
    }
}
