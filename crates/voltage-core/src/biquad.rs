//! Biquad (bi-quadratic) filter in transposed direct form II.
//!
//! Coefficients live in their own value type, [`BiquadCoefficients`], so that
//! a filter model can derive and post-correct them before handing them to the
//! runtime structure. The exact RBJ Audio EQ Cookbook low-pass is provided
//! for reference responses.

use core::f32::consts::PI;
use libm::{cosf, sinf};

use crate::math::hard_clip;

/// Normalized biquad coefficients (a0 = 1).
///
/// ```text
/// H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficient for x[n]
    pub b0: f32,
    /// Feedforward coefficient for x[n-1]
    pub b1: f32,
    /// Feedforward coefficient for x[n-2]
    pub b2: f32,
    /// Feedback coefficient for y[n-1]
    pub a1: f32,
    /// Feedback coefficient for y[n-2]
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Passthrough coefficients: `y[n] = x[n]`.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build from unnormalized coefficients, dividing through by `a0`.
    pub fn from_raw(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
        }
    }

    /// Magnitude response at `freq_hz`, evaluated analytically on the unit circle.
    pub fn magnitude_at(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        let num = num_re * num_re + num_im * num_im;
        let den = (den_re * den_re + den_im * den_im).max(1e-20);
        libm::sqrtf(num / den)
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order IIR filter, transposed direct form II.
///
/// ```text
/// y[n]  = b0*x[n] + s1
/// s1'   = b1*x[n] - a1*y[n] + s2
/// s2'   = b2*x[n] - a2*y[n]
/// ```
///
/// Two state variables instead of four, and better float behaviour than
/// direct form I when coefficients change every sample.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    s1: f32,
    s2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the coefficients, keeping the filter state.
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.s1;
        self.inject(input, output);
        output
    }

    /// Processes a single sample, clamping the output to ±`limit` before it
    /// is fed back into the state.
    ///
    /// Bounds the recursion under overload: the state can never see a value
    /// larger than `limit`, so the filter cannot run away.
    #[inline]
    pub fn process_limited(&mut self, input: f32, limit: f32) -> f32 {
        let c = &self.coeffs;
        let output = hard_clip(c.b0 * input + self.s1, limit);
        self.inject(input, output);
        output
    }

    #[inline]
    fn inject(&mut self, input: f32, output: f32) {
        let c = &self.coeffs;
        self.s1 = crate::flush_denormal(c.b1 * input - c.a1 * output + self.s2);
        self.s2 = crate::flush_denormal(c.b2 * input - c.a2 * output);
    }

    /// Clears the filter state without touching the coefficients.
    pub fn clear(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// Low-pass coefficients from the RBJ cookbook (exact trigonometry).
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (0.707 for Butterworth)
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    BiquadCoefficients::from_raw(
        (1.0 - cos_omega) / 2.0,
        1.0 - cos_omega,
        (1.0 - cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}
