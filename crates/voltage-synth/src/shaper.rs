//! Waveform shapers derived from the VCO's master square.
//!
//! The oscillator core always produces one band-limited 50% square. Each
//! [`Waveform`] is a small circuit model that turns that square (or, for the
//! pulse shapes, the raw phase) into the final shape. Shapers carry their own
//! integrator/filter state inside a closed sum type, so selecting a different
//! waveform starts the new shape from a clean state and leaves nothing behind
//! from the previous one.

use core::f32::consts::PI;
use libm::sinf;
use voltage_core::{DcBlocker, saturate};

use crate::blep::{blep_pulse, poly_blep};

/// Triangle integrator gain per unit phase increment.
const TRIANGLE_GAIN: f32 = 8.0;
/// Triangle integrator leak per sample.
const TRIANGLE_LEAK: f32 = 0.9999;
/// Amount of `sin(wave * π)` added to the triangle.
const TRIANGLE_COLOR: f32 = 0.1;
/// Sawtooth DC-tracking state decay per sample.
const SAW_DECAY: f32 = 0.998;
/// Fixed duty cycle of the pulse shape.
const PULSE_DUTY: f32 = 0.25;
/// PWM depth around 50%.
const PWM_DEPTH: f32 = 0.4;
/// Weight of the new sample in the PWM top-end smoothing.
const PWM_SMOOTHING: f32 = 0.98;

/// Selectable VCO waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Waveform {
    /// Leaky integral of the square.
    Triangle,
    /// Ramp with a sine-shaped harmonic emphasis.
    #[default]
    Sawtooth,
    /// The master square, unchanged.
    Square,
    /// Fixed 25% pulse.
    Pulse,
    /// Pulse whose width follows the PWM LFO.
    Pwm,
}

impl Waveform {
    /// All waveforms in parameter-index order.
    pub const ALL: [Waveform; 5] = [
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::Square,
        Waveform::Pulse,
        Waveform::Pwm,
    ];

    /// Display labels in parameter-index order.
    pub const LABELS: [&'static str; 5] = ["Triangle", "Sawtooth", "Square", "Pulse", "PWM"];

    /// Waveform for a stepped parameter value; out-of-range indices clamp.
    pub fn from_index(index: f32) -> Self {
        let i = libm::roundf(index).clamp(0.0, 4.0) as usize;
        Self::ALL[i]
    }

    /// Parameter index of this waveform.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-sample input to a shaper.
#[derive(Clone, Copy, Debug)]
pub struct ShaperInput {
    /// Saturated master square sample.
    pub square: f32,
    /// Oscillator phase in `[0, 1)` at which `square` was generated.
    pub phase: f32,
    /// Phase increment for this sample.
    pub phase_inc: f32,
    /// PWM LFO value in `[-1, 1]`.
    pub pwm_lfo: f32,
}

#[derive(Debug, Clone)]
struct TriangleState {
    integrator: f32,
    dc: DcBlocker,
}

#[derive(Debug, Clone, Default)]
struct SawState {
    dc_track: f32,
}

#[derive(Debug, Clone, Default)]
struct PwmState {
    prev: f32,
}

#[derive(Debug, Clone)]
enum ShaperState {
    Triangle(TriangleState),
    Sawtooth(SawState),
    Square,
    Pulse,
    Pwm(PwmState),
}

impl ShaperState {
    fn fresh(waveform: Waveform, sample_rate: f32) -> Self {
        match waveform {
            Waveform::Triangle => ShaperState::Triangle(TriangleState {
                integrator: 0.0,
                dc: DcBlocker::new(sample_rate),
            }),
            Waveform::Sawtooth => ShaperState::Sawtooth(SawState::default()),
            Waveform::Square => ShaperState::Square,
            Waveform::Pulse => ShaperState::Pulse,
            Waveform::Pwm => ShaperState::Pwm(PwmState::default()),
        }
    }
}

/// The active waveform shaper and its state.
///
/// # Example
///
/// ```rust
/// use voltage_synth::{ShaperInput, WaveShaper, Waveform};
///
/// let mut shaper = WaveShaper::new(Waveform::Square, 44100.0);
/// let input = ShaperInput { square: 0.8, phase: 0.25, phase_inc: 0.01, pwm_lfo: 0.0 };
/// assert_eq!(shaper.generate(input), 0.8);
/// ```
#[derive(Debug, Clone)]
pub struct WaveShaper {
    waveform: Waveform,
    sample_rate: f32,
    state: ShaperState,
}

impl WaveShaper {
    /// Create a shaper for `waveform`.
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            sample_rate,
            state: ShaperState::fresh(waveform, sample_rate),
        }
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Select a waveform. Switching resets the newly selected shape's state;
    /// re-selecting the current one is a no-op.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        if waveform != self.waveform {
            #[cfg(feature = "tracing")]
            tracing::debug!(from = ?self.waveform, to = ?waveform, "waveform switch");
            self.waveform = waveform;
            self.reset();
        }
    }

    /// Update the sample rate and clear state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
    }

    /// Clear the active shape's state.
    pub fn reset(&mut self) {
        self.state = ShaperState::fresh(self.waveform, self.sample_rate);
    }

    /// Derive one output sample.
    #[inline]
    pub fn generate(&mut self, input: ShaperInput) -> f32 {
        match &mut self.state {
            ShaperState::Triangle(s) => {
                s.integrator += input.square * input.phase_inc * TRIANGLE_GAIN;
                s.integrator *= TRIANGLE_LEAK;
                let wave = s.dc.process(s.integrator);
                wave + sinf(wave * PI) * TRIANGLE_COLOR
            }
            ShaperState::Sawtooth(s) => {
                let ramp = 2.0 * input.phase - 1.0 - poly_blep(input.phase, input.phase_inc);
                s.dc_track = s.dc_track * SAW_DECAY + ramp * (1.0 - SAW_DECAY);
                let linear = ramp - s.dc_track;
                0.7 * linear + 0.3 * sinf(linear * PI)
            }
            ShaperState::Square => input.square,
            ShaperState::Pulse => {
                saturate(blep_pulse(input.phase, PULSE_DUTY, input.phase_inc), 1.5)
            }
            ShaperState::Pwm(s) => {
                let duty = (0.5 + input.pwm_lfo * PWM_DEPTH).clamp(0.05, 0.95);
                let shaped = saturate(blep_pulse(input.phase, duty, input.phase_inc), 1.3);
                let out = PWM_SMOOTHING * shaped + (1.0 - PWM_SMOOTHING) * s.prev;
                s.prev = out;
                out
            }
        }
    }
}
