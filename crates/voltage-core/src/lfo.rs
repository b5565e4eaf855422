//! Low-frequency oscillator for vibrato and pulse-width modulation.
//!
//! A phase accumulator in `[0, 1)` read through one of four shapes. Output is
//! bipolar in `[-1, 1]`; phase starts at zero so a freshly reset LFO is
//! deterministic, which the voice relies on for repeatable renders.

use core::f32::consts::TAU;
use libm::sinf;

/// LFO waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoShape {
    /// Smooth sinusoid.
    #[default]
    Sine,
    /// Linear ramps, starting at 0 and rising.
    Triangle,
    /// Rising ramp with an abrupt reset.
    Saw,
    /// Binary ±1.
    Square,
}

/// Phase-accumulating low-frequency oscillator.
///
/// # Example
///
/// ```rust
/// use voltage_core::{Lfo, LfoShape};
///
/// let mut lfo = Lfo::new(44100.0, 5.0);
/// lfo.set_shape(LfoShape::Triangle);
/// let v = lfo.next_sample();
/// assert!((-1.0..=1.0).contains(&v));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    shape: LfoShape,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(44100.0, 1.0)
    }
}

impl Lfo {
    /// Create an LFO at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz.max(0.0) / sample_rate,
            sample_rate,
            shape: LfoShape::Sine,
        }
    }

    /// Set frequency in Hz. Negative values are treated as zero.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz.max(0.0) / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Select the waveform.
    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    /// Current waveform.
    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    /// Set phase in turns (0.0 - 1.0).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.clamp(0.0, 1.0) % 1.0;
    }

    /// Current phase in turns.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Update the sample rate, keeping the frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }

    /// Next bipolar value in `[-1, 1]`.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let out = match self.shape {
            LfoShape::Sine => sinf(p * TAU),
            LfoShape::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            LfoShape::Saw => 2.0 * p - 1.0,
            LfoShape::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
        }
        out
    }
}
