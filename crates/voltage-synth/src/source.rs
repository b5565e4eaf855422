//! Sound sources: the note lifecycle shared by the VCO and the noise
//! generator, and the switch between them.
//!
//! Both generators follow the same contract: `start_note`, `change_note`,
//! `stop_note(allow_tail_off)`, `is_active`. [`SoundSource`] owns one of each
//! and routes to whichever the feet selector picks. Switching moves the
//! current [`NoteState`] across so a held note keeps sounding through the
//! new generator.

use crate::noise::NoiseSource;
use crate::oscillator::Vco;
use crate::params::Feet;

/// Linear post-release fade owned by a generator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TailOff {
    active: bool,
    counter: u32,
    duration: u32,
}

impl TailOff {
    /// Start a fade lasting `duration_samples` (at least one sample).
    pub fn start(&mut self, duration_samples: u32) {
        self.active = true;
        self.counter = 0;
        self.duration = duration_samples.max(1);
    }

    /// Cancel any fade in progress.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a fade is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Gain for the next sample; deactivates once the fade reaches zero.
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        if !self.active {
            return 1.0;
        }
        let gain = 1.0 - self.counter as f32 / self.duration as f32;
        self.counter += 1;
        if self.counter >= self.duration {
            self.active = false;
        }
        gain
    }
}

/// Note-on state carried by a generator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteState {
    /// Sounding MIDI pitch.
    pub pitch: u8,
    /// Velocity 0..1. Carried for hosts; never scales amplitude.
    pub velocity: f32,
    /// A note is held.
    pub playing: bool,
    /// Post-release fade.
    pub tail: TailOff,
}

impl NoteState {
    /// Begin a new note.
    pub fn start(&mut self, pitch: u8, velocity: f32) {
        self.pitch = pitch;
        self.velocity = velocity;
        self.playing = true;
        self.tail.clear();
    }

    /// Release the note, fading over `tail_samples` when allowed.
    pub fn stop(&mut self, allow_tail_off: bool, tail_samples: u32) {
        if allow_tail_off && self.playing {
            self.tail.start(tail_samples);
        } else if !allow_tail_off {
            self.tail.clear();
        }
        self.playing = false;
    }

    /// Whether the generator should produce sound.
    pub fn is_active(&self) -> bool {
        self.playing || self.tail.is_active()
    }

    /// Gain for the next sample: 1 while held, fading during tail-off, 0 when idle.
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        if self.playing {
            1.0
        } else if self.tail.is_active() {
            self.tail.next_gain()
        } else {
            0.0
        }
    }
}

/// Which generator is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Pitched VCO.
    Oscillator,
    /// Filtered white noise.
    Noise,
}

/// The voice's sound generator: VCO or noise, selected by the feet setting.
#[derive(Debug, Clone)]
pub struct SoundSource {
    vco: Vco,
    noise: NoiseSource,
    kind: SourceKind,
}

impl SoundSource {
    /// Create a source at `sample_rate`, starting on the VCO.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            vco: Vco::new(sample_rate),
            noise: NoiseSource::new(sample_rate),
            kind: SourceKind::Oscillator,
        }
    }

    /// Update the sample rate of both generators.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.vco.set_sample_rate(sample_rate);
        self.noise.set_sample_rate(sample_rate);
    }

    /// Currently selected generator.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The VCO, for block-rate configuration.
    pub fn vco(&self) -> &Vco {
        &self.vco
    }

    /// Mutable VCO access, for block-rate configuration.
    pub fn vco_mut(&mut self) -> &mut Vco {
        &mut self.vco
    }

    /// Apply the feet selector: picks the generator and the VCO octave.
    pub fn set_feet(&mut self, feet: Feet) {
        let kind = if feet == Feet::Noise {
            SourceKind::Noise
        } else {
            self.vco.set_octave_offset(feet.semitones());
            SourceKind::Oscillator
        };
        if kind == self.kind {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(from = ?self.kind, to = ?kind, "sound source switch");

        match kind {
            SourceKind::Noise => {
                let state = self.vco.take_note_state();
                self.noise.restore_note_state(state);
            }
            SourceKind::Oscillator => {
                let state = self.noise.take_note_state();
                self.vco.restore_note_state(state);
            }
        }
        self.kind = kind;
    }

    /// Release time used for tail-off, in samples.
    pub fn set_tail_off_samples(&mut self, samples: u32) {
        self.vco.set_tail_off_samples(samples);
        self.noise.set_tail_off_samples(samples);
    }

    /// New attack at `pitch`.
    pub fn start_note(&mut self, pitch: u8, velocity: f32, pitch_wheel: u16) {
        match self.kind {
            SourceKind::Oscillator => self.vco.start_note(pitch, velocity, pitch_wheel),
            SourceKind::Noise => self.noise.start_note(pitch, velocity, pitch_wheel),
        }
    }

    /// Legato move to `pitch`.
    pub fn change_note(&mut self, pitch: u8) {
        match self.kind {
            SourceKind::Oscillator => self.vco.change_note(pitch),
            SourceKind::Noise => self.noise.change_note(pitch),
        }
    }

    /// Release the sounding note.
    pub fn stop_note(&mut self, allow_tail_off: bool) {
        match self.kind {
            SourceKind::Oscillator => self.vco.stop_note(allow_tail_off),
            SourceKind::Noise => self.noise.stop_note(allow_tail_off),
        }
    }

    /// Whether the selected generator is sounding.
    pub fn is_active(&self) -> bool {
        match self.kind {
            SourceKind::Oscillator => self.vco.is_active(),
            SourceKind::Noise => self.noise.is_active(),
        }
    }

    /// One sample from the selected generator. `lfo_semitones` is the pitch
    /// modulation for this sample; noise ignores it.
    #[inline]
    pub fn next_sample(&mut self, lfo_semitones: f32) -> f32 {
        match self.kind {
            SourceKind::Oscillator => self.vco.next_sample(lfo_semitones),
            SourceKind::Noise => self.noise.next_sample(),
        }
    }

    /// Reset both generators.
    pub fn reset(&mut self) {
        self.vco.reset();
        self.noise.reset();
    }
}
