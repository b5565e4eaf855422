//! The monophonic voice: note manager, sound source, VCF, envelope and VCA
//! composed into one block renderer.
//!
//! Per block the voice applies the parameter snapshot once, then walks the
//! block's events in offset order. Each event is applied at its sample
//! offset and the audio between events is rendered in three stages over
//! preallocated scratch buffers:
//!
//! ```text
//! source (VCO | noise) ──► VCF (cutoff · 2^(eg + breath)) ──► VCA (EG, volume, breath)
//! ```

use alloc::vec;
use alloc::vec::Vec;

use voltage_core::{Lfo, LfoShape};

use crate::envelope::{Envelope, EnvelopeState};
use crate::filter::Vcf;
use crate::midi::{MidiEvent, TimedEvent};
use crate::note_manager::{NoteAction, NoteManager};
use crate::params::{ParamSink, VoiceParams};
use crate::source::{SoundSource, SourceKind};
use crate::vca::Vca;

/// Vibrato depth in semitones at full mod depth.
pub const MAX_VIBRATO_SEMITONES: f32 = 1.0;
/// Cutoff sweep in octaves at full VCF EG depth and full envelope.
pub const VCF_EG_OCTAVES: f32 = 5.0;
/// Cutoff sweep in octaves at full breath amount and full breath.
pub const BREATH_OCTAVES: f32 = 3.0;

/// Default scratch size when none is given.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Everything the voice reads while rendering one block.
pub struct BlockContext<'a> {
    /// Parameter snapshot, applied once at the start of the block.
    pub params: &'a VoiceParams,
    /// Events sorted by offset. Offsets past the block end apply at the end.
    pub events: &'a [TimedEvent],
    /// External LFO samples in `[-1, 1]`, one per output sample. When absent
    /// the voice runs its own triangle LFO at `lfo_speed`.
    pub lfo: Option<&'a [f32]>,
    /// Receives controller writes (mod wheel, breath, pitch-wheel display).
    pub sink: &'a dyn ParamSink,
}

impl<'a> BlockContext<'a> {
    /// Context with no events, the internal LFO and a discarding sink.
    pub fn new(params: &'a VoiceParams) -> Self {
        Self {
            params,
            events: &[],
            lfo: None,
            sink: &(),
        }
    }

    /// Attach events.
    pub fn with_events(mut self, events: &'a [TimedEvent]) -> Self {
        self.events = events;
        self
    }

    /// Attach an external LFO stream.
    pub fn with_lfo(mut self, lfo: &'a [f32]) -> Self {
        self.lfo = Some(lfo);
        self
    }

    /// Route controller writes to `sink`.
    pub fn with_sink(mut self, sink: &'a dyn ParamSink) -> Self {
        self.sink = sink;
        self
    }
}

/// A single analog-modeled voice.
///
/// # Example
///
/// ```rust
/// use voltage_synth::{BlockContext, MidiEvent, MonoVoice, TimedEvent, VoiceParams};
///
/// let mut voice = MonoVoice::new(44100.0, 256);
/// let params = VoiceParams::default();
/// let events = [TimedEvent::new(0, MidiEvent::NoteOn { pitch: 60, velocity: 0.8 })];
///
/// let mut out = [0.0f32; 256];
/// voice.render_block(&mut out, &BlockContext::new(&params).with_events(&events));
/// assert!(voice.is_active());
/// assert!(out.iter().any(|s| *s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct MonoVoice {
    sample_rate: f32,
    notes: NoteManager,
    source: SoundSource,
    vcf: Vcf,
    envelope: Envelope,
    vca: Vca,
    lfo: Lfo,
    mod_depth: f32,
    vcf_eg_depth: f32,
    breath_octaves: f32,
    base_cutoff: f32,
    primed: bool,
    source_buf: Vec<f32>,
    env_buf: Vec<f32>,
    cutoff_buf: Vec<f32>,
}

impl MonoVoice {
    /// Create a voice and [`prepare`](Self::prepare) it.
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        let mut lfo = Lfo::new(sample_rate, 5.0);
        lfo.set_shape(LfoShape::Triangle);
        let mut voice = Self {
            sample_rate,
            notes: NoteManager::new(),
            source: SoundSource::new(sample_rate),
            vcf: Vcf::new(sample_rate),
            envelope: Envelope::new(sample_rate),
            vca: Vca::new(sample_rate),
            lfo,
            mod_depth: 0.0,
            vcf_eg_depth: 0.0,
            breath_octaves: 0.0,
            base_cutoff: 2000.0,
            primed: false,
            source_buf: Vec::new(),
            env_buf: Vec::new(),
            cutoff_buf: Vec::new(),
        };
        voice.prepare(sample_rate, max_block_size);
        voice
    }

    /// Size scratch buffers and set the sample rate everywhere, then reset.
    ///
    /// This is the only place the voice allocates. Blocks longer than
    /// `max_block_size` are still rendered, in several passes.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, max_block_size, "voice prepare");

        let size = max_block_size.max(1);
        self.sample_rate = sample_rate;
        self.source.set_sample_rate(sample_rate);
        self.vcf.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
        self.vca.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(sample_rate);
        self.source_buf = vec![0.0; size];
        self.env_buf = vec![0.0; size];
        self.cutoff_buf = vec![0.0; size];
        self.reset();
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest block rendered in one pass.
    pub fn max_block_size(&self) -> usize {
        self.source_buf.len()
    }

    /// Render `output.len()` samples.
    pub fn render_block(&mut self, output: &mut [f32], ctx: &BlockContext<'_>) {
        self.apply_params(ctx.params);

        let len = output.len();
        let mut cursor = 0;
        for timed in ctx.events {
            let at = timed.offset.clamp(cursor, len);
            self.render_segment(&mut output[cursor..at], cursor, ctx);
            cursor = at;
            self.handle_event(timed.event, ctx);
        }
        self.render_segment(&mut output[cursor..], cursor, ctx);
    }

    /// Apply one MIDI event immediately.
    pub fn handle_event(&mut self, event: MidiEvent, ctx: &BlockContext<'_>) {
        let action = match event {
            MidiEvent::NoteOn { pitch, velocity } => self.notes.note_on(pitch, velocity),
            MidiEvent::NoteOff { pitch } => self.notes.note_off(pitch),
            MidiEvent::ControlChange { controller, value } => {
                self.notes.control_change(controller, value, ctx.sink)
            }
            MidiEvent::PitchWheel(value) => {
                self.notes.pitch_wheel(value, ctx.sink);
                self.source.vco_mut().pitch_wheel_moved(value);
                NoteAction::None
            }
        };
        self.apply_action(action);
    }

    fn apply_action(&mut self, action: NoteAction) {
        match action {
            NoteAction::Start {
                pitch,
                velocity,
                pitch_wheel,
            } => {
                self.source.start_note(pitch, velocity, pitch_wheel);
                self.envelope.trigger_note_on();
            }
            NoteAction::Change(pitch) => self.source.change_note(pitch),
            NoteAction::Stop { allow_tail_off } => {
                self.source.stop_note(allow_tail_off);
                if allow_tail_off {
                    self.envelope.trigger_note_off();
                } else {
                    self.envelope.reset();
                }
            }
            NoteAction::None => {}
        }
    }

    fn apply_params(&mut self, params: &VoiceParams) {
        let vco = self.source.vco_mut();
        vco.set_bend_ranges(params.pitch_bend_up_range, params.pitch_bend_down_range);
        vco.pitch_wheel_moved(self.notes.pitch_wheel_value());
        vco.set_glide_time(params.glissando_time);
        vco.set_waveform(params.waveform);
        vco.set_pwm_speed(params.pwm_speed);
        vco.set_fine_offset(params.pitch);
        vco.set_master_tune(params.master_tune);
        self.source.set_feet(params.feet);

        self.envelope
            .set_times(params.attack, params.decay, params.sustain, params.release);
        self.source
            .set_tail_off_samples(self.envelope.release_samples());

        self.base_cutoff = params.cutoff;
        self.vcf.set_cutoff(params.cutoff);
        self.vcf.set_resonance(params.resonance);
        self.vcf.set_filter_type(params.filter_type);

        self.vca.set_eg_depth(params.vca_eg_depth);
        self.vca
            .set_gain(params.volume, params.breath_vca, params.breath_input);
        if !self.primed {
            self.vca.snap();
            self.primed = true;
        }

        self.lfo.set_frequency(params.lfo_speed);
        self.mod_depth = params.mod_depth;
        self.vcf_eg_depth = params.vcf_eg_depth;
        self.breath_octaves = params.breath_vcf * params.breath_input * BREATH_OCTAVES;
    }

    fn render_segment(&mut self, output: &mut [f32], start: usize, ctx: &BlockContext<'_>) {
        if !self.is_active() {
            output.fill(0.0);
            return;
        }
        let chunk = self.source_buf.len();
        let mut offset = 0;
        while offset < output.len() {
            let n = chunk.min(output.len() - offset);
            self.render_chunk(&mut output[offset..offset + n], start + offset, ctx.lfo);
            offset += n;
        }
    }

    fn render_chunk(&mut self, output: &mut [f32], start: usize, external_lfo: Option<&[f32]>) {
        let n = output.len();
        let vibrato = self.mod_depth * MAX_VIBRATO_SEMITONES;

        let src = &mut self.source_buf[..n];
        for (i, s) in src.iter_mut().enumerate() {
            let lfo = match external_lfo {
                Some(stream) => stream.get(start + i).copied().unwrap_or(0.0),
                None => self.lfo.next_sample(),
            };
            *s = self.source.next_sample(lfo * vibrato);
        }

        let env = &mut self.env_buf[..n];
        let cutoffs = &mut self.cutoff_buf[..n];
        let modulated = self.vcf_eg_depth > 0.0 || self.breath_octaves > 0.0;
        for (e, c) in env.iter_mut().zip(cutoffs.iter_mut()) {
            *e = self.envelope.next_level();
            *c = self.base_cutoff
                * libm::exp2f(self.vcf_eg_depth * *e * VCF_EG_OCTAVES + self.breath_octaves);
        }

        if modulated {
            self.vcf.process_block_modulated(src, cutoffs);
        } else {
            self.vcf.process_block(src);
        }

        for ((out, &s), &e) in output.iter_mut().zip(src.iter()).zip(env.iter()) {
            *out = self.vca.process(s, e);
        }
    }

    /// True while the source sounds or the envelope has not returned to Idle.
    pub fn is_active(&self) -> bool {
        self.source.is_active() || self.envelope.is_active()
    }

    /// Release every held key with tail-off.
    pub fn all_notes_off(&mut self) {
        let action = self.notes.all_notes_off(true);
        self.apply_action(action);
    }

    /// Highest held key, if any.
    pub fn sounding_note(&self) -> Option<u8> {
        self.notes.sounding_note()
    }

    /// Base pitch the VCO is sounding or gliding from.
    pub fn current_pitch(&self) -> f32 {
        self.source.vco().pitch_state().current
    }

    /// Pitch the VCO is gliding toward.
    pub fn target_pitch(&self) -> f32 {
        self.source.vco().pitch_state().target
    }

    /// Envelope state.
    pub fn envelope_state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    /// Selected generator.
    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// The note manager, for inspection.
    pub fn notes(&self) -> &NoteManager {
        &self.notes
    }

    /// Silence everything and clear all state, keeping configuration.
    pub fn reset(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("voice reset");

        self.notes.reset();
        self.source.reset();
        self.vcf.reset();
        self.envelope.reset();
        self.vca.reset();
        self.lfo.reset();
        self.primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Feet, Param};

    const SR: f32 = 44100.0;

    fn on(offset: usize, pitch: u8) -> TimedEvent {
        TimedEvent::new(
            offset,
            MidiEvent::NoteOn {
                pitch,
                velocity: 1.0,
            },
        )
    }

    fn off(offset: usize, pitch: u8) -> TimedEvent {
        TimedEvent::new(offset, MidiEvent::NoteOff { pitch })
    }

    fn render(voice: &mut MonoVoice, params: &VoiceParams, events: &[TimedEvent], len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        voice.render_block(&mut out, &BlockContext::new(params).with_events(events));
        out
    }

    #[test]
    fn idle_voice_renders_silence() {
        let mut voice = MonoVoice::new(SR, 128);
        let out = render(&mut voice, &VoiceParams::default(), &[], 128);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!voice.is_active());
    }

    #[test]
    fn event_offset_is_sample_accurate() {
        let mut voice = MonoVoice::new(SR, 128);
        let out = render(&mut voice, &VoiceParams::default(), &[on(64, 60)], 128);
        assert!(out[..64].iter().all(|&s| s == 0.0));
        assert!(out[64..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn offsets_past_the_end_apply_after_rendering() {
        let mut voice = MonoVoice::new(SR, 64);
        let out = render(&mut voice, &VoiceParams::default(), &[on(1000, 60)], 64);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(voice.sounding_note(), Some(60));
        assert!(voice.is_active());
    }

    #[test]
    fn blocks_longer_than_scratch_are_rendered() {
        let mut voice = MonoVoice::new(SR, 32);
        let out = render(&mut voice, &VoiceParams::default(), &[on(0, 60)], 300);
        assert!(out[200..].iter().any(|&s| s != 0.0));
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn legato_keeps_envelope_running() {
        let mut voice = MonoVoice::new(SR, 512);
        let params = VoiceParams::default();
        render(&mut voice, &params, &[on(0, 60)], 512);
        render(&mut voice, &params, &[on(0, 64)], 512);
        assert_eq!(voice.current_pitch(), 64.0);
        let state = voice.envelope_state();
        render(&mut voice, &params, &[off(0, 64)], 1);
        assert_eq!(voice.current_pitch(), 60.0);
        assert_ne!(voice.envelope_state(), EnvelopeState::Attack);
        assert_eq!(state, EnvelopeState::Decay);
    }

    #[test]
    fn feet_switch_to_noise_keeps_the_note() {
        let mut voice = MonoVoice::new(SR, 256);
        let params = VoiceParams::default();
        render(&mut voice, &params, &[on(0, 60)], 256);
        let noise = params.with(Param::Feet, Feet::Noise.index() as f32);
        let out = render(&mut voice, &noise, &[], 256);
        assert_eq!(voice.source_kind(), SourceKind::Noise);
        assert!(voice.is_active());
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn all_sound_off_silences_immediately() {
        let mut voice = MonoVoice::new(SR, 256);
        let params = VoiceParams::default();
        render(&mut voice, &params, &[on(0, 60)], 256);
        let cut = TimedEvent::new(
            0,
            MidiEvent::ControlChange {
                controller: crate::note_manager::CC_ALL_SOUND_OFF,
                value: 0,
            },
        );
        let out = render(&mut voice, &params, &[cut], 256);
        assert!(!voice.is_active());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn all_sound_off_cuts_release_tail() {
        let mut voice = MonoVoice::new(SR, 256);
        let params = VoiceParams::default().with(Param::Release, 2.0);
        render(&mut voice, &params, &[on(0, 60)], 256);
        render(&mut voice, &params, &[off(0, 60)], 256);
        assert!(voice.is_active(), "release tail should be sounding");

        let cut = TimedEvent::new(
            0,
            MidiEvent::ControlChange {
                controller: crate::note_manager::CC_ALL_SOUND_OFF,
                value: 0,
            },
        );
        let out = render(&mut voice, &params, &[cut], 256);
        assert!(!voice.is_active());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn external_lfo_bends_pitch() {
        let params = VoiceParams::default().with(Param::ModDepth, 1.0);
        let mut plain = MonoVoice::new(SR, 512);
        let mut wobbly = MonoVoice::new(SR, 512);
        let lfo = vec![1.0; 512];
        let events = [on(0, 60)];

        let mut a = vec![0.0; 512];
        let mut b = vec![0.0; 512];
        let ctx = BlockContext::new(&params).with_events(&events).with_lfo(&lfo);
        wobbly.render_block(&mut b, &ctx);
        let zero = vec![0.0; 512];
        let ctx = BlockContext::new(&params).with_events(&events).with_lfo(&zero);
        plain.render_block(&mut a, &ctx);

        let diff: f32 = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum();
        assert!(diff > 1.0, "vibrato had no effect: {diff}");
    }

    #[test]
    fn reset_silences() {
        let mut voice = MonoVoice::new(SR, 128);
        render(&mut voice, &VoiceParams::default(), &[on(0, 60)], 128);
        voice.reset();
        assert!(!voice.is_active());
        assert_eq!(voice.sounding_note(), None);
    }
}
