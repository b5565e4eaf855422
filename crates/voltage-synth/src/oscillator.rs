//! Voltage-controlled oscillator with step glissando.
//!
//! Pitch is computed every sample from a stepped base pitch plus continuous
//! modulation (bend, master tune, fine offset, LFO, octave), so bends and
//! vibrato never quantize to block boundaries. The base pitch itself moves
//! only in whole semitones during a glide, like a hardware step portamento.
//!
//! Signal path per sample:
//!
//! ```text
//! phase ──► 50% square + PolyBLEP ──► tanh(·1.2) ──► WaveShaper ──► tanh(·1.2)
//! ```

use voltage_core::{Lfo, LfoShape, pitch_to_freq, saturate};

use crate::blep::{blep_pulse, wrap_phase};
use crate::midi::pitch_wheel_to_bend;
use crate::shaper::{ShaperInput, WaveShaper, Waveform};
use crate::source::NoteState;

/// Drive of the squaring circuit after the master square.
const SQUARE_DRIVE: f32 = 1.2;
/// Drive of the output stage after the shaper.
const OUTPUT_DRIVE: f32 = 1.2;
/// Glide times below this jump straight to the target.
const MIN_GLIDE_SECONDS: f32 = 0.001;
/// Distance at which a glide snaps onto its target.
const SNAP_SEMITONES: f32 = 0.1;

/// Stepped pitch state driven by note changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchState {
    /// Sounding base pitch in semitones (MIDI numbering).
    pub current: f32,
    /// Pitch being glided toward.
    pub target: f32,
    /// A glide is in progress.
    pub sliding: bool,
    /// Samples between one-semitone steps.
    pub samples_per_step: u32,
    /// Samples since the last step.
    pub counter: u32,
}

impl Default for PitchState {
    fn default() -> Self {
        Self {
            current: 60.0,
            target: 60.0,
            sliding: false,
            samples_per_step: 1,
            counter: 0,
        }
    }
}

impl PitchState {
    fn jump(&mut self, pitch: f32) {
        self.current = pitch;
        self.target = pitch;
        self.sliding = false;
        self.counter = 0;
    }

    #[inline]
    fn advance(&mut self) {
        if !self.sliding {
            return;
        }
        self.counter += 1;
        if self.counter < self.samples_per_step {
            return;
        }
        self.counter = 0;
        let distance = self.target - self.current;
        self.current += distance.clamp(-1.0, 1.0);
        if (self.target - self.current).abs() < SNAP_SEMITONES {
            self.current = self.target;
            self.sliding = false;
        }
    }
}

/// The pitched sound generator.
///
/// # Example
///
/// ```rust
/// use voltage_synth::{Vco, Waveform};
///
/// let mut vco = Vco::new(44100.0);
/// vco.set_waveform(Waveform::Square);
/// vco.start_note(69, 1.0, 8192);
/// let s = vco.next_sample(0.0);
/// assert!(s.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Vco {
    sample_rate: f32,
    phase: f32,
    phase_inc: f32,
    pitch: PitchState,
    glide_seconds: f32,
    octave_offset: f32,
    fine_offset: f32,
    bend: f32,
    master_tune: f32,
    bend_up: f32,
    bend_down: f32,
    shaper: WaveShaper,
    pwm_lfo: Lfo,
    note: NoteState,
    tail_samples: u32,
}

impl Vco {
    /// Create a VCO at `sample_rate` with a sawtooth shaper.
    pub fn new(sample_rate: f32) -> Self {
        let mut pwm_lfo = Lfo::new(sample_rate, 1.0);
        pwm_lfo.set_shape(LfoShape::Sine);
        Self {
            sample_rate,
            phase: 0.0,
            phase_inc: 0.0,
            pitch: PitchState::default(),
            glide_seconds: 0.0,
            octave_offset: 0.0,
            fine_offset: 0.0,
            bend: 0.0,
            master_tune: 0.0,
            bend_up: 2.0,
            bend_down: 2.0,
            shaper: WaveShaper::new(Waveform::default(), sample_rate),
            pwm_lfo,
            note: NoteState::default(),
            tail_samples: (0.2 * sample_rate) as u32,
        }
    }

    /// Update the sample rate. Clears shaper state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.shaper.set_sample_rate(sample_rate);
        self.pwm_lfo.set_sample_rate(sample_rate);
    }

    /// Select the waveform shaper.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.shaper.set_waveform(waveform);
    }

    /// Selected waveform.
    pub fn waveform(&self) -> Waveform {
        self.shaper.waveform()
    }

    /// PWM LFO rate in Hz.
    pub fn set_pwm_speed(&mut self, hz: f32) {
        self.pwm_lfo.set_frequency(hz);
    }

    /// Glide time per semitone, in seconds.
    pub fn set_glide_time(&mut self, seconds: f32) {
        self.glide_seconds = seconds;
    }

    /// Octave offset from the feet selector, in semitones.
    pub fn set_octave_offset(&mut self, semitones: f32) {
        self.octave_offset = semitones;
    }

    /// Fine pitch offset in semitones.
    pub fn set_fine_offset(&mut self, semitones: f32) {
        self.fine_offset = semitones;
    }

    /// Master tuning offset in semitones.
    pub fn set_master_tune(&mut self, semitones: f32) {
        self.master_tune = semitones;
    }

    /// Pitch-bend ranges in semitones for full up/down deflection.
    pub fn set_bend_ranges(&mut self, up: f32, down: f32) {
        self.bend_up = up;
        self.bend_down = down;
    }

    /// Apply a raw 14-bit pitch-wheel value.
    pub fn pitch_wheel_moved(&mut self, value: u16) {
        self.bend = pitch_wheel_to_bend(value, self.bend_up, self.bend_down);
    }

    /// Current bend in semitones.
    pub fn bend(&self) -> f32 {
        self.bend
    }

    /// Length of the post-release fade, in samples.
    pub fn set_tail_off_samples(&mut self, samples: u32) {
        self.tail_samples = samples;
    }

    /// Move the base pitch. A legato move with a glide time of at least 1 ms
    /// and a distance of at least 0.1 semitone starts a stepped glide;
    /// everything else jumps.
    pub fn set_note(&mut self, pitch: f32, legato: bool) {
        let distance = (pitch - self.pitch.current).abs();
        if legato && self.glide_seconds >= MIN_GLIDE_SECONDS && distance > SNAP_SEMITONES {
            self.pitch.target = pitch;
            self.pitch.samples_per_step = self.samples_per_glide_step();
            self.pitch.counter = 0;
            self.pitch.sliding = true;
        } else {
            self.pitch.jump(pitch);
        }
    }

    fn samples_per_glide_step(&self) -> u32 {
        (libm::roundf(self.glide_seconds * self.sample_rate) as u32).max(1)
    }

    /// New attack at `pitch`.
    pub fn start_note(&mut self, pitch: u8, velocity: f32, pitch_wheel: u16) {
        self.note.start(pitch, velocity);
        self.set_note(f32::from(pitch), false);
        self.pitch_wheel_moved(pitch_wheel);
    }

    /// Legato move to `pitch`, gliding when enabled.
    pub fn change_note(&mut self, pitch: u8) {
        self.note.pitch = pitch;
        self.set_note(f32::from(pitch), true);
    }

    /// Release the note.
    pub fn stop_note(&mut self, allow_tail_off: bool) {
        self.note.stop(allow_tail_off, self.tail_samples);
    }

    /// Whether the VCO is producing sound.
    pub fn is_active(&self) -> bool {
        self.note.is_active()
    }

    /// Note state, for inspection.
    pub fn note_state(&self) -> &NoteState {
        &self.note
    }

    /// Pitch state, for inspection.
    pub fn pitch_state(&self) -> &PitchState {
        &self.pitch
    }

    /// Hand the note state to another generator, leaving this one idle.
    pub fn take_note_state(&mut self) -> NoteState {
        core::mem::take(&mut self.note)
    }

    /// Resume a note handed over from another generator.
    pub fn restore_note_state(&mut self, state: NoteState) {
        self.note = state;
        if state.is_active() {
            self.pitch.jump(f32::from(state.pitch));
        }
    }

    /// Phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Phase increment used for the last sample.
    pub fn phase_increment(&self) -> f32 {
        self.phase_inc
    }

    /// Pitch in semitones that the next sample will sound at, before LFO.
    pub fn final_pitch(&self, lfo_semitones: f32) -> f32 {
        self.pitch.current
            + self.bend
            + self.master_tune
            + self.fine_offset
            + lfo_semitones
            + self.octave_offset
    }

    /// Generate one sample.
    #[inline]
    pub fn next_sample(&mut self, lfo_semitones: f32) -> f32 {
        if !self.note.is_active() {
            return 0.0;
        }
        let gain = self.note.next_gain();

        self.pitch.advance();
        let dt = pitch_to_freq(self.final_pitch(lfo_semitones)) / self.sample_rate;
        self.phase_inc = dt;

        let phase = self.phase;
        let square = saturate(blep_pulse(phase, 0.5, dt), SQUARE_DRIVE);
        self.phase = wrap_phase(phase + dt);

        let shaped = self.shaper.generate(ShaperInput {
            square,
            phase,
            phase_inc: dt,
            pwm_lfo: self.pwm_lfo.next_sample(),
        });
        saturate(shaped, OUTPUT_DRIVE) * gain
    }

    /// Return to the power-on state, keeping configuration.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.phase_inc = 0.0;
        self.pitch = PitchState::default();
        self.bend = 0.0;
        self.note = NoteState::default();
        self.shaper.reset();
        self.pwm_lfo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn positive_crossings(vco: &mut Vco, n: usize) -> usize {
        let mut prev = 0.0;
        let mut count = 0;
        for _ in 0..n {
            let s = vco.next_sample(0.0);
            if prev <= 0.0 && s > 0.0 {
                count += 1;
            }
            prev = s;
        }
        count
    }

    #[test]
    fn a4_square_runs_at_440hz() {
        let mut vco = Vco::new(SR);
        vco.set_waveform(Waveform::Square);
        vco.start_note(69, 1.0, 8192);
        let n = positive_crossings(&mut vco, SR as usize);
        assert!((n as i32 - 440).abs() <= 2, "got {n} cycles");
    }

    #[test]
    fn octave_offset_doubles_frequency() {
        let mut vco = Vco::new(SR);
        vco.set_waveform(Waveform::Square);
        vco.set_octave_offset(12.0);
        vco.start_note(57, 1.0, 8192);
        let n = positive_crossings(&mut vco, SR as usize);
        assert!((n as i32 - 440).abs() <= 2, "got {n} cycles");
    }

    #[test]
    fn silent_without_note() {
        let mut vco = Vco::new(SR);
        for _ in 0..1000 {
            assert_eq!(vco.next_sample(0.5), 0.0);
        }
    }

    #[test]
    fn output_bounded_by_output_stage() {
        for w in Waveform::ALL {
            let mut vco = Vco::new(SR);
            vco.set_waveform(w);
            vco.start_note(36, 1.0, 8192);
            for _ in 0..10000 {
                let s = vco.next_sample(0.0);
                assert!(s.abs() <= 1.0, "{w:?}: {s}");
            }
        }
    }

    #[test]
    fn glide_steps_in_semitones_and_lands_exactly() {
        let mut vco = Vco::new(SR);
        vco.set_glide_time(0.01);
        vco.start_note(60, 1.0, 8192);
        vco.change_note(72);
        let spgs = vco.pitch_state().samples_per_step;
        assert_eq!(spgs, 441);

        for _ in 0..12 * spgs {
            vco.next_sample(0.0);
            let p = vco.pitch_state().current;
            assert_eq!(p, p.round(), "non-integer pitch {p}");
        }
        assert_eq!(vco.pitch_state().current, 72.0);
        assert!(!vco.pitch_state().sliding);
    }

    #[test]
    fn glide_disabled_below_one_ms() {
        let mut vco = Vco::new(SR);
        vco.set_glide_time(0.0005);
        vco.start_note(60, 1.0, 8192);
        vco.change_note(67);
        assert_eq!(vco.pitch_state().current, 67.0);
        assert!(!vco.pitch_state().sliding);
    }

    #[test]
    fn new_attack_never_glides() {
        let mut vco = Vco::new(SR);
        vco.set_glide_time(0.1);
        vco.start_note(60, 1.0, 8192);
        vco.start_note(72, 1.0, 8192);
        assert_eq!(vco.pitch_state().current, 72.0);
    }

    #[test]
    fn pitch_wheel_uses_directional_ranges() {
        let mut vco = Vco::new(SR);
        vco.set_bend_ranges(2.0, 12.0);
        vco.pitch_wheel_moved(16383);
        assert!((vco.bend() - 2.0).abs() < 1e-3);
        vco.pitch_wheel_moved(0);
        assert!((vco.bend() + 12.0).abs() < 1e-3);
        vco.pitch_wheel_moved(8192);
        assert_eq!(vco.bend(), 0.0);
    }

    #[test]
    fn final_pitch_sums_all_terms() {
        let mut vco = Vco::new(SR);
        vco.start_note(60, 1.0, 8192);
        vco.set_octave_offset(-12.0);
        vco.set_fine_offset(0.25);
        vco.set_master_tune(-0.5);
        assert!((vco.final_pitch(0.1) - 47.85).abs() < 1e-4);
    }

    #[test]
    fn tail_off_fades_then_goes_idle() {
        let mut vco = Vco::new(SR);
        vco.set_tail_off_samples(100);
        vco.start_note(60, 1.0, 8192);
        vco.stop_note(true);
        assert!(vco.is_active());
        for _ in 0..100 {
            vco.next_sample(0.0);
        }
        assert!(!vco.is_active());
        assert_eq!(vco.next_sample(0.0), 0.0);
    }

    #[test]
    fn hard_stop_is_immediate() {
        let mut vco = Vco::new(SR);
        vco.start_note(60, 1.0, 8192);
        vco.stop_note(false);
        assert!(!vco.is_active());
        assert_eq!(vco.next_sample(0.0), 0.0);
    }

    #[test]
    fn extreme_pitch_stays_finite() {
        let mut vco = Vco::new(SR);
        vco.set_octave_offset(12.0);
        vco.start_note(127, 1.0, 16383);
        for _ in 0..1000 {
            assert!(vco.next_sample(1.0).is_finite());
        }
    }
}
