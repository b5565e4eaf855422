//! DC blocking filter for removing DC offset from audio signals.
//!
//! Uses a first-order highpass (Julius O. Smith's DC blocker):
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R*z^-1)
//! ```
//!
//! where R is a pole close to 1.0. The pole can be placed either from a
//! cutoff frequency or from an RC time constant, which is how an output
//! coupling capacitor is usually specified.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", Chapter on DC Blocker.

use crate::flush_denormal;
use core::f32::consts::TAU;
use libm::expf;

/// DC blocking filter using a first-order highpass.
///
/// ## Transfer Function
///
/// ```text
/// H(z) = (1 - z^-1) / (1 - R * z^-1)
/// ```
///
/// ## Example
///
/// ```rust
/// use voltage_core::DcBlocker;
///
/// // Output capacitor with a 30 ms time constant
/// let mut blocker = DcBlocker::with_time_constant(48000.0, 0.03);
/// let output = blocker.process(0.6);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position)
    coeff: f32,
    /// Previous input sample x[n-1]
    x_prev: f32,
    /// Previous output sample y[n-1]
    y_prev: f32,
}

impl DcBlocker {
    /// Default cutoff frequency target in Hz.
    const DEFAULT_CUTOFF_HZ: f32 = 7.0;

    /// Create a DC blocker with a ~7 Hz cutoff.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_cutoff(sample_rate, Self::DEFAULT_CUTOFF_HZ)
    }

    /// Create a DC blocker with the given -3 dB cutoff in Hz.
    ///
    /// `R = exp(-2π * fc / fs)`, clamped to [0.9, 0.99999].
    pub fn with_cutoff(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self::from_coeff(expf(-TAU * cutoff_hz / sample_rate))
    }

    /// Create a DC blocker from an RC time constant in seconds.
    ///
    /// `R = exp(-1 / (tau * fs))`.
    pub fn with_time_constant(sample_rate: f32, seconds: f32) -> Self {
        let samples = (seconds * sample_rate).max(1.0);
        Self::from_coeff(expf(-1.0 / samples))
    }

    fn from_coeff(coeff: f32) -> Self {
        Self {
            coeff: coeff.clamp(0.9, 0.99999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Process a single sample.
    ///
    /// Implements: `y[n] = x[n] - x[n-1] + R * y[n-1]`
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = flush_denormal(input - self.x_prev + self.coeff * self.y_prev);
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Get the current R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_blocker_removes_dc() {
        let mut blocker = DcBlocker::new(48000.0);
        let mut output = 0.0;
        for _ in 0..48000 {
            output = blocker.process(1.0);
        }
        assert!(output.abs() < 0.01, "DC should be removed, got {}", output);
    }

    #[test]
    fn test_dc_blocker_passes_ac() {
        let mut blocker = DcBlocker::new(48000.0);
        let freq = 1000.0;
        let sample_rate = 48000.0;

        for i in 0..48000 {
            let t = i as f32 / sample_rate;
            blocker.process(libm::sinf(TAU * freq * t));
        }

        let mut max_output = 0.0f32;
        for i in 0..48 {
            let t = (48000 + i) as f32 / sample_rate;
            let output = blocker.process(libm::sinf(TAU * freq * t));
            max_output = max_output.max(output.abs());
        }

        assert!(
            max_output > 0.95,
            "1 kHz should pass through, max output was {}",
            max_output
        );
    }

    #[test]
    fn test_time_constant_coeff() {
        let blocker = DcBlocker::with_time_constant(44100.0, 0.03);
        let expected = expf(-1.0 / (0.03 * 44100.0));
        assert!((blocker.coeff() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_time_constant_zero_is_safe() {
        let mut blocker = DcBlocker::with_time_constant(44100.0, 0.0);
        assert!(blocker.coeff() >= 0.9);
        assert!(blocker.process(1.0).is_finite());
    }

    #[test]
    fn test_dc_blocker_reset() {
        let mut blocker = DcBlocker::new(48000.0);
        for _ in 0..1000 {
            blocker.process(1.0);
        }
        blocker.reset();
        assert_eq!(blocker.x_prev, 0.0);
        assert_eq!(blocker.y_prev, 0.0);
    }

    #[test]
    fn test_dc_blocker_finite_output() {
        let mut blocker = DcBlocker::with_cutoff(48000.0, 72.0);
        for i in 0..10000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!(blocker.process(input).is_finite(), "Output must be finite");
        }
    }
}
