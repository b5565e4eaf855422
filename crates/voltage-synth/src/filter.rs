//! Resonant two-pole low-pass modeled on the VCF circuit.
//!
//! The analog model wraps a transposed-direct-form-II biquad in the stages
//! around it on the board:
//!
//! ```text
//! in ─► coupling HP (72 Hz) ─► tanh ─► biquad (clamped ±1) ─► resonance drive ─► output cap ─► ×0.98
//! ```
//!
//! Coefficients come from the RBJ low-pass form with truncated Taylor sin/cos,
//! a two-position Q switch, a capacitor-ratio gain correction, and smooth
//! corrections at the low and high ends of the range. They are recomputed only
//! when cutoff or resonance actually change.
//!
//! [`FilterType::Clean`] swaps the circuit model for an exact-trig RBJ
//! low-pass with the same Q switch and no coloration stages.

use core::f32::consts::PI;
use voltage_core::{
    Biquad, BiquadCoefficients, DcBlocker, OnePoleHighpass, lowpass_coefficients, map_clamped,
    saturate,
};

/// Lowest usable cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Highest usable cutoff in Hz, before the sample-rate guard.
pub const MAX_CUTOFF_HZ: f32 = 20000.0;
/// Resonance range accepted by the circuit model.
pub const MIN_RESONANCE: f32 = 0.1;
/// Upper end of the resonance range.
pub const MAX_RESONANCE: f32 = 0.8;

/// Capacitor-ratio correction applied to the feed-forward coefficients.
const ADJUSTMENT_FACTOR: f32 = 1.658;
/// Resonance above which the Q switch flips.
const Q_SWITCH_POINT: f32 = 0.5;
const Q_LOW: f32 = 1.0;
const Q_HIGH: f32 = 10.0;
const INPUT_HP_HZ: f32 = 72.0;
const INPUT_DRIVE: f32 = 0.7;
const RESONANCE_DRIVE: f32 = 1.8;
const OUTPUT_CAP_SECONDS: f32 = 0.03;
const OUTPUT_LEVEL: f32 = 0.98;
/// Overload clamp inside the recursion.
const STATE_LIMIT: f32 = 1.0;

/// Filter model selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FilterType {
    /// Circuit model with Taylor coefficients and saturation stages.
    #[default]
    Analog,
    /// Exact RBJ low-pass, no coloration.
    Clean,
}

impl FilterType {
    /// Display labels in parameter-index order.
    pub const LABELS: [&'static str; 2] = ["Analog", "Clean"];

    /// Filter type for a stepped parameter value.
    pub fn from_index(index: f32) -> Self {
        if libm::roundf(index) >= 1.0 {
            FilterType::Clean
        } else {
            FilterType::Analog
        }
    }

    /// Parameter index of this type.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Q for a resonance setting: the hardware has two positions.
#[inline]
pub fn resonance_to_q(resonance: f32) -> f32 {
    if resonance > Q_SWITCH_POINT { Q_HIGH } else { Q_LOW }
}

/// Circuit-model coefficients for `cutoff` Hz and `resonance`.
///
/// Inputs are clamped to the usable range first. The Taylor approximations
/// hold while the cutoff stays well below the sample rate, which the
/// `0.45 · sample_rate` ceiling guarantees.
pub fn analog_coefficients(cutoff: f32, resonance: f32, sample_rate: f32) -> BiquadCoefficients {
    let cutoff = clamp_cutoff(cutoff, sample_rate);
    let resonance = clamp_resonance(resonance);

    let wc = PI * cutoff / sample_rate;
    let sin_wc = wc - wc * wc * wc / 6.0;
    let cos_wc = 1.0 - wc * wc / 2.0;
    let alpha = sin_wc / (2.0 * resonance_to_q(resonance));

    let b1 = (1.0 - cos_wc) * ADJUSTMENT_FACTOR;
    let b0 = b1 * 0.5;
    let mut c = BiquadCoefficients::from_raw(b0, b1, b0, 1.0 + alpha, -2.0 * cos_wc, 1.0 - alpha);

    let low_end = map_clamped(cutoff, MIN_CUTOFF_HZ, 500.0, 0.8, 1.0);
    c.b0 *= low_end;
    c.b1 *= low_end;
    c.b2 *= low_end;

    let high_end = map_clamped(cutoff, 5000.0, MAX_CUTOFF_HZ, 1.0, 0.85);
    c.a1 *= high_end;
    c.a2 *= high_end;

    c
}

/// Clean-model coefficients: exact RBJ low-pass with the same Q switch.
pub fn clean_coefficients(cutoff: f32, resonance: f32, sample_rate: f32) -> BiquadCoefficients {
    let cutoff = clamp_cutoff(cutoff, sample_rate);
    let resonance = clamp_resonance(resonance);
    lowpass_coefficients(cutoff, resonance_to_q(resonance), sample_rate)
}

/// Clamp a cutoff to `[20, min(20000, 0.45 · sample_rate)]`.
#[inline]
pub fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    let ceiling = MAX_CUTOFF_HZ.min(0.45 * sample_rate);
    if cutoff.is_nan() {
        return ceiling;
    }
    cutoff.clamp(MIN_CUTOFF_HZ, ceiling)
}

/// Clamp a resonance to `[0.1, 0.8]`; NaN maps to the minimum.
#[inline]
pub fn clamp_resonance(resonance: f32) -> f32 {
    if resonance.is_nan() {
        return MIN_RESONANCE;
    }
    resonance.clamp(MIN_RESONANCE, MAX_RESONANCE)
}

/// The voice filter.
///
/// # Example
///
/// ```rust
/// use voltage_synth::Vcf;
///
/// let mut vcf = Vcf::new(44100.0);
/// vcf.set_cutoff(800.0);
/// vcf.set_resonance(0.7);
/// let y = vcf.process(0.25);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Vcf {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    filter_type: FilterType,
    biquad: Biquad,
    input_hp: OnePoleHighpass,
    output_cap: DcBlocker,
    res_amount: f32,
}

impl Vcf {
    /// Create a filter at `sample_rate` with a 2 kHz cutoff and low resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut vcf = Self {
            sample_rate,
            cutoff: 2000.0,
            resonance: MIN_RESONANCE,
            filter_type: FilterType::Analog,
            biquad: Biquad::new(),
            input_hp: OnePoleHighpass::new(sample_rate, INPUT_HP_HZ),
            output_cap: DcBlocker::with_time_constant(sample_rate, OUTPUT_CAP_SECONDS),
            res_amount: 0.0,
        };
        vcf.update_coefficients();
        vcf
    }

    /// Update the sample rate; clears state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.input_hp.set_sample_rate(sample_rate);
        self.output_cap = DcBlocker::with_time_constant(sample_rate, OUTPUT_CAP_SECONDS);
        self.biquad.clear();
        self.update_coefficients();
    }

    /// Set cutoff in Hz; recomputes coefficients if it changed.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.update_coefficients();
        }
    }

    /// Set resonance; recomputes coefficients if it changed.
    pub fn set_resonance(&mut self, resonance: f32) {
        let resonance = clamp_resonance(resonance);
        if resonance != self.resonance {
            self.resonance = resonance;
            self.update_coefficients();
        }
    }

    /// Select the filter model.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        if filter_type != self.filter_type {
            self.filter_type = filter_type;
            self.update_coefficients();
        }
    }

    /// Clamped cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Clamped resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Selected model.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Coefficients currently loaded.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.biquad.coefficients()
    }

    fn update_coefficients(&mut self) {
        let coeffs = match self.filter_type {
            FilterType::Analog => analog_coefficients(self.cutoff, self.resonance, self.sample_rate),
            FilterType::Clean => clean_coefficients(self.cutoff, self.resonance, self.sample_rate),
        };
        self.biquad.set_coefficients(coeffs);
        self.res_amount = ((self.resonance - Q_SWITCH_POINT) / (MAX_RESONANCE - Q_SWITCH_POINT))
            .clamp(0.0, 1.0);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        match self.filter_type {
            FilterType::Analog => {
                let x = self.input_hp.process(input);
                let x = saturate(x, INPUT_DRIVE) / INPUT_DRIVE;
                let y = self.biquad.process_limited(x, STATE_LIMIT);
                let driven = saturate(y, RESONANCE_DRIVE) / saturate(1.0, RESONANCE_DRIVE);
                let y = y + self.res_amount * (driven - y);
                self.output_cap.process(y) * OUTPUT_LEVEL
            }
            FilterType::Clean => self.biquad.process_limited(input, STATE_LIMIT),
        }
    }

    /// Filter a buffer in place at the current settings.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for s in buffer.iter_mut() {
            *s = self.process(*s);
        }
    }

    /// Filter a buffer in place with a per-sample cutoff. Resonance is held
    /// for the block; the cutoff in effect before the call is restored after.
    pub fn process_block_modulated(&mut self, buffer: &mut [f32], cutoffs: &[f32]) {
        let saved = self.cutoff;
        for (s, &fc) in buffer.iter_mut().zip(cutoffs) {
            self.set_cutoff(fc);
            *s = self.process(*s);
        }
        let n = cutoffs.len().min(buffer.len());
        for s in &mut buffer[n..] {
            *s = self.process(*s);
        }
        self.set_cutoff(saved);
    }

    /// Zero the biquad and both coupling stages.
    pub fn reset(&mut self) {
        self.biquad.clear();
        self.input_hp.reset();
        self.output_cap.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn tone_rms(vcf: &mut Vcf, freq: f32, amp: f32) -> f32 {
        let n = 22050;
        let mut sum = 0.0;
        for i in 0..n {
            let x = amp * libm::sinf(2.0 * PI * freq * i as f32 / SR);
            let y = vcf.process(x);
            if i >= n / 2 {
                sum += y * y;
            }
        }
        libm::sqrtf(sum / (n / 2) as f32)
    }

    #[test]
    fn q_switch_has_two_positions() {
        assert_eq!(resonance_to_q(0.1), 1.0);
        assert_eq!(resonance_to_q(0.5), 1.0);
        assert_eq!(resonance_to_q(0.51), 10.0);
        assert_eq!(resonance_to_q(0.8), 10.0);
    }

    #[test]
    fn cutoff_is_clamped() {
        assert_eq!(clamp_cutoff(5.0, SR), 20.0);
        assert!((clamp_cutoff(50000.0, SR) - 19845.0).abs() < 0.01);
        assert_eq!(clamp_cutoff(50000.0, 96000.0), 20000.0);
        assert!((clamp_cutoff(f32::NAN, SR) - 19845.0).abs() < 0.01);
    }

    #[test]
    fn dc_gain_carries_adjustment_factor() {
        let c = analog_coefficients(2000.0, 0.2, SR);
        let dc = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
        assert!((dc - ADJUSTMENT_FACTOR).abs() < 1e-2, "dc gain {dc}");
    }

    #[test]
    fn low_end_correction_scales_feedforward() {
        // 260 Hz sits halfway through the 20..500 Hz blend
        let c = analog_coefficients(260.0, 0.2, SR);
        let num = f64::from(c.b0) + f64::from(c.b1) + f64::from(c.b2);
        let den = 1.0 + f64::from(c.a1) + f64::from(c.a2);
        let dc = (num / den) as f32;
        assert!((dc - 0.9 * ADJUSTMENT_FACTOR).abs() < 0.01, "dc gain {dc}");
    }

    #[test]
    fn high_end_correction_is_continuous() {
        let below = analog_coefficients(4999.0, 0.2, SR);
        let above = analog_coefficients(5001.0, 0.2, SR);
        assert!((below.a1 - above.a1).abs() < 1e-2);
        assert!((below.a2 - above.a2).abs() < 1e-2);
    }

    #[test]
    fn coefficients_stable_across_range() {
        for sr in [22050.0, 44100.0, 96000.0] {
            for cutoff in [20.0, 200.0, 2000.0, 9000.0, 20000.0] {
                for res in [0.1, 0.8] {
                    let c = analog_coefficients(cutoff, res, sr);
                    assert!(c.a2.abs() < 1.0, "a2 {}", c.a2);
                    assert!(c.a1.abs() < 1.0 + c.a2, "a1 {} a2 {}", c.a1, c.a2);
                }
            }
        }
    }

    #[test]
    fn resonance_boosts_near_corner() {
        let mut low = Vcf::new(SR);
        let mut high = Vcf::new(SR);
        for f in [&mut low, &mut high] {
            f.set_cutoff(2000.0);
        }
        low.set_resonance(0.1);
        high.set_resonance(0.9);
        assert!(tone_rms(&mut high, 1000.0, 0.05) > tone_rms(&mut low, 1000.0, 0.05));
    }

    #[test]
    fn higher_cutoff_passes_more() {
        let mut closed = Vcf::new(SR);
        let mut open = Vcf::new(SR);
        closed.set_cutoff(1000.0);
        open.set_cutoff(5000.0);
        assert!(tone_rms(&mut open, 2000.0, 0.05) > tone_rms(&mut closed, 2000.0, 0.05));
    }

    #[test]
    fn overload_stays_bounded() {
        let mut vcf = Vcf::new(SR);
        vcf.set_cutoff(800.0);
        vcf.set_resonance(0.8);
        for i in 0..44100 {
            let x = if (i / 30) % 2 == 0 { 50.0 } else { -50.0 };
            let y = vcf.process(x);
            assert!(y.abs() <= 2.0, "{y}");
        }
    }

    #[test]
    fn modulated_block_restores_cutoff() {
        let mut vcf = Vcf::new(SR);
        vcf.set_cutoff(1500.0);
        let mut buf = [0.3f32; 64];
        let cutoffs = [6000.0f32; 64];
        vcf.process_block_modulated(&mut buf, &cutoffs);
        assert_eq!(vcf.cutoff(), 1500.0);
        assert_eq!(vcf.coefficients(), analog_coefficients(1500.0, vcf.resonance(), SR));
    }

    #[test]
    fn clean_type_uses_exact_coefficients() {
        let mut vcf = Vcf::new(SR);
        vcf.set_filter_type(FilterType::Clean);
        vcf.set_cutoff(1000.0);
        assert_eq!(vcf.coefficients(), lowpass_coefficients(1000.0, 1.0, SR));
    }

    #[test]
    fn reset_silences_state() {
        let mut vcf = Vcf::new(SR);
        for _ in 0..500 {
            vcf.process(0.7);
        }
        vcf.reset();
        assert_eq!(vcf.process(0.0), 0.0);
    }
}
