//! ADSR envelope generator.
//!
//! Linear segments timed by sample counters. Attack ends when the level
//! reaches full scale, decay and release end when their counters run out.
//! Durations are given in seconds and converted to sample counts once per
//! block with [`Envelope::set_times`].

/// Attack completes within this distance of full scale.
const LEVEL_EPSILON: f32 = 1e-5;

/// Envelope state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Inactive, output zero.
    #[default]
    Idle,
    /// Rising toward full scale.
    Attack,
    /// Falling from full scale toward the sustain level.
    Decay,
    /// Holding the sustain level while the gate is held.
    Sustain,
    /// Falling to zero after the gate is released.
    Release,
}

/// ADSR envelope generator.
///
/// # Example
///
/// ```rust
/// use voltage_synth::{Envelope, EnvelopeState};
///
/// let mut env = Envelope::new(44100.0);
/// env.set_times(0.01, 0.1, 0.5, 0.2);
/// env.trigger_note_on();
/// for _ in 0..441 {
///     env.next_level();
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,
    attack_samples: u32,
    decay_samples: u32,
    release_samples: u32,
    sustain: f32,
    counter: u32,
    /// Level at which the current attack or release began.
    segment_start: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl Envelope {
    /// Create an envelope: 10 ms attack, 300 ms decay, 0.7 sustain, 200 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate,
            attack_samples: 1,
            decay_samples: 1,
            release_samples: 1,
            sustain: 0.7,
            counter: 0,
            segment_start: 0.0,
        };
        env.set_times(0.01, 0.3, 0.7, 0.2);
        env
    }

    /// Update the sample rate. Call [`set_times`](Self::set_times) afterwards.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set attack, decay and release (seconds) and the sustain level (0..1).
    pub fn set_times(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack_samples = self.to_samples(attack);
        self.decay_samples = self.to_samples(decay);
        self.release_samples = self.to_samples(release);
        self.sustain = if sustain.is_nan() { 0.0 } else { sustain.clamp(0.0, 1.0) };
    }

    fn to_samples(&self, seconds: f32) -> u32 {
        let samples = voltage_core::seconds_to_samples(seconds.max(0.0), self.sample_rate);
        if samples.is_nan() {
            1
        } else {
            (libm::roundf(samples) as u32).max(1)
        }
    }

    /// Release duration in samples.
    pub fn release_samples(&self) -> u32 {
        self.release_samples
    }

    /// Enter Attack from wherever the envelope is, starting at the current level.
    pub fn trigger_note_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.counter = 0;
        self.segment_start = self.level;
    }

    /// Enter Release from any active state.
    pub fn trigger_note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
            self.counter = 0;
            self.segment_start = self.level;
        }
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True in every state except Idle.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn next_level(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }
            EnvelopeState::Attack => {
                self.counter += 1;
                self.level =
                    (self.segment_start + self.counter as f32 / self.attack_samples as f32).min(1.0);
                if self.level >= 1.0 - LEVEL_EPSILON {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                    self.counter = 0;
                }
            }
            EnvelopeState::Decay => {
                self.counter += 1;
                let t = self.counter as f32 / self.decay_samples as f32;
                self.level = 1.0 - (1.0 - self.sustain) * t.min(1.0);
                if self.counter >= self.decay_samples {
                    self.level = self.sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {
                self.level = self.sustain;
            }
            EnvelopeState::Release => {
                self.counter += 1;
                let t = self.counter as f32 / self.release_samples as f32;
                self.level = self.segment_start * (1.0 - t.min(1.0));
                if self.counter >= self.release_samples {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }

    /// Force Idle at zero.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.counter = 0;
        self.segment_start = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Envelope {
        let mut env = Envelope::new(1000.0);
        env.set_times(0.01, 0.02, 0.5, 0.04);
        env
    }

    #[test]
    fn full_cycle() {
        let mut env = env();
        assert!(!env.is_active());
        env.trigger_note_on();
        for _ in 0..10 {
            env.next_level();
        }
        assert_eq!(env.state(), EnvelopeState::Decay);
        assert_eq!(env.level(), 1.0);

        for _ in 0..20 {
            env.next_level();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 0.5);

        env.trigger_note_off();
        for _ in 0..39 {
            env.next_level();
            assert!(env.is_active());
        }
        env.next_level();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn attack_is_linear() {
        let mut env = env();
        env.trigger_note_on();
        let a = env.next_level();
        let b = env.next_level();
        assert!((a - 0.1).abs() < 1e-6);
        assert!((b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn retrigger_restarts_attack_from_current_level() {
        let mut env = env();
        env.trigger_note_on();
        for _ in 0..30 {
            env.next_level();
        }
        env.trigger_note_on();
        assert_eq!(env.state(), EnvelopeState::Attack);
        let next = env.next_level();
        assert!(next > 0.5, "attack should continue from sustain, got {next}");
    }

    #[test]
    fn release_from_attack_starts_at_current_level() {
        let mut env = env();
        env.trigger_note_on();
        for _ in 0..5 {
            env.next_level();
        }
        env.trigger_note_off();
        let first = env.next_level();
        assert!(first < 0.5 && first > 0.4, "{first}");
    }

    #[test]
    fn note_off_while_idle_stays_idle() {
        let mut env = env();
        env.trigger_note_off();
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn zero_times_are_one_sample() {
        let mut env = Envelope::new(44100.0);
        env.set_times(0.0, 0.0, 0.3, 0.0);
        env.trigger_note_on();
        assert_eq!(env.next_level(), 1.0);
        assert_eq!(env.next_level(), 0.3);
        env.trigger_note_off();
        assert_eq!(env.next_level(), 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn reset_forces_idle() {
        let mut env = env();
        env.trigger_note_on();
        env.next_level();
        env.reset();
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }
}
