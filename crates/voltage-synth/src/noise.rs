//! White noise source, selected by the feet switch in place of the VCO.

use voltage_core::OnePole;

use crate::source::NoteState;

/// Corner of the noise low-pass, before the Nyquist guard.
const NOISE_CUTOFF_HZ: f32 = 12000.0;
const SEED: u32 = 0x1234_5678;

fn noise_cutoff(sample_rate: f32) -> f32 {
    NOISE_CUTOFF_HZ.min(0.45 * sample_rate)
}

/// Xorshift white noise through a first-order low-pass.
///
/// Follows the same note lifecycle as the VCO; pitch is tracked but has no
/// audible effect.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
    filter: OnePole,
    note: NoteState,
    tail_samples: u32,
}

impl NoiseSource {
    /// Create a noise source at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: SEED,
            filter: OnePole::new(sample_rate, noise_cutoff(sample_rate)),
            note: NoteState::default(),
            tail_samples: (0.2 * sample_rate) as u32,
        }
    }

    /// Update the sample rate and re-place the filter corner.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.filter.set_sample_rate(sample_rate);
        self.filter.set_frequency(noise_cutoff(sample_rate));
    }

    /// Filter corner in Hz.
    pub fn cutoff(&self) -> f32 {
        self.filter.frequency()
    }

    /// Length of the post-release fade, in samples.
    pub fn set_tail_off_samples(&mut self, samples: u32) {
        self.tail_samples = samples;
    }

    /// Begin a note. Pitch and wheel are recorded only.
    pub fn start_note(&mut self, pitch: u8, velocity: f32, _pitch_wheel: u16) {
        self.note.start(pitch, velocity);
    }

    /// Record a legato pitch change.
    pub fn change_note(&mut self, pitch: u8) {
        self.note.pitch = pitch;
    }

    /// Release the note.
    pub fn stop_note(&mut self, allow_tail_off: bool) {
        self.note.stop(allow_tail_off, self.tail_samples);
    }

    /// Whether the source is producing sound.
    pub fn is_active(&self) -> bool {
        self.note.is_active()
    }

    /// Note state, for inspection.
    pub fn note_state(&self) -> &NoteState {
        &self.note
    }

    /// Hand the note state to another generator, leaving this one idle.
    pub fn take_note_state(&mut self) -> NoteState {
        core::mem::take(&mut self.note)
    }

    /// Resume a note handed over from another generator.
    pub fn restore_note_state(&mut self, state: NoteState) {
        self.note = state;
    }

    /// Generate one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.note.is_active() {
            return 0.0;
        }
        let gain = self.note.next_gain();
        let white = self.white();
        self.filter.process(white) * gain
    }

    #[inline]
    fn white(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }

    /// Return to the power-on state.
    pub fn reset(&mut self) {
        self.state = SEED;
        self.filter.reset();
        self.note = NoteState::default();
    }
}
