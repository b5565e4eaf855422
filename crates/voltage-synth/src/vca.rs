//! Output amplifier: EG gating, manual volume and breath control.

use voltage_core::SmoothedParam;

/// Smoothing time for block-rate gain changes.
const GAIN_SMOOTHING_MS: f32 = 5.0;

/// Gain stage at the end of the voice.
///
/// The envelope arrives per sample; volume and breath are block-rate
/// controls and pass through a short one-pole smoother so a new block
/// never steps the gain.
///
/// ```text
/// eg_gain     = 1 - eg_depth + eg_depth * env
/// breath_gain = 1 - breath_amount + breath_amount * breath
/// out         = in * eg_gain * smooth(volume * breath_gain)
/// ```
#[derive(Debug, Clone)]
pub struct Vca {
    eg_depth: f32,
    manual_gain: SmoothedParam,
}

impl Vca {
    /// Create a VCA at full EG depth and unity volume.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            eg_depth: 1.0,
            manual_gain: SmoothedParam::with_config(1.0, sample_rate, GAIN_SMOOTHING_MS),
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.manual_gain.set_sample_rate(sample_rate);
    }

    /// How much the envelope gates the output (0 = ungated, 1 = fully gated).
    pub fn set_eg_depth(&mut self, depth: f32) {
        self.eg_depth = depth.clamp(0.0, 1.0);
    }

    /// Set volume and breath for the coming block.
    ///
    /// `breath_amount` is how strongly breath gates the output and `breath`
    /// the current breath-controller value, both 0..1.
    pub fn set_gain(&mut self, volume: f32, breath_amount: f32, breath: f32) {
        let amount = breath_amount.clamp(0.0, 1.0);
        let breath_gain = 1.0 - amount + amount * breath.clamp(0.0, 1.0);
        self.manual_gain.set_target(volume.max(0.0) * breath_gain);
    }

    /// Jump straight to the current target gain.
    pub fn snap(&mut self) {
        let target = self.manual_gain.target();
        self.manual_gain.set_immediate(target);
    }

    /// Apply the gain to one sample.
    #[inline]
    pub fn process(&mut self, input: f32, envelope: f32) -> f32 {
        let eg_gain = 1.0 - self.eg_depth + self.eg_depth * envelope;
        input * eg_gain * self.manual_gain.advance()
    }

    /// Settle the smoother on its target.
    pub fn reset(&mut self) {
        self.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_depth_follows_envelope() {
        let mut vca = Vca::new(44100.0);
        assert_eq!(vca.process(1.0, 0.0), 0.0);
        assert!((vca.process(1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_depth_ignores_envelope() {
        let mut vca = Vca::new(44100.0);
        vca.set_eg_depth(0.0);
        assert_eq!(vca.process(0.8, 0.0), 0.8);
    }

    #[test]
    fn volume_changes_are_smoothed() {
        let mut vca = Vca::new(44100.0);
        vca.set_gain(0.0, 0.0, 0.0);
        let first = vca.process(1.0, 1.0);
        assert!(first > 0.9, "gain should not jump, got {first}");
        for _ in 0..44100 {
            vca.process(1.0, 1.0);
        }
        assert!(vca.process(1.0, 1.0) < 1e-3);
    }

    #[test]
    fn breath_gates_when_amount_is_full() {
        let mut vca = Vca::new(44100.0);
        vca.set_gain(1.0, 1.0, 0.25);
        vca.snap();
        assert!((vca.process(1.0, 1.0) - 0.25).abs() < 1e-6);
        vca.set_gain(1.0, 0.0, 0.25);
        vca.snap();
        assert!((vca.process(1.0, 1.0) - 1.0).abs() < 1e-6);
    }
}
