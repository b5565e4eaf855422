//! Block engine: the voice plus its shared parameter surface.

use alloc::sync::Arc;

use crate::midi::TimedEvent;
use crate::params::{Param, SharedParams, VoiceParams};
use crate::voice::{BlockContext, MonoVoice};

/// A ready-to-run monophonic synth.
///
/// Owns the [`MonoVoice`] and an [`Arc`]-shared [`SharedParams`] surface.
/// A control thread writes parameters through its clone of the `Arc`; each
/// call to [`render_block`](Self::render_block) takes one snapshot and
/// renders the whole block from it. Controller messages in the event stream
/// write back to the same surface.
///
/// ```rust
/// use voltage_synth::{MidiEvent, MonoSynth, Param, TimedEvent};
///
/// let mut synth = MonoSynth::new(48000.0, 128);
/// let controls = synth.params().clone();
/// controls.set(Param::Cutoff, 800.0);
///
/// let events = [TimedEvent::new(0, MidiEvent::NoteOn { pitch: 57, velocity: 1.0 })];
/// let mut out = [0.0f32; 128];
/// synth.render_block(&mut out, &events);
/// assert!(synth.is_active());
/// ```
#[derive(Debug)]
pub struct MonoSynth {
    params: Arc<SharedParams>,
    voice: MonoVoice,
}

impl MonoSynth {
    /// Engine with default parameters.
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        Self::with_params(Arc::new(SharedParams::new()), sample_rate, max_block_size)
    }

    /// Engine reading from an existing parameter surface.
    pub fn with_params(params: Arc<SharedParams>, sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            params,
            voice: MonoVoice::new(sample_rate, max_block_size),
        }
    }

    /// The shared parameter surface.
    pub fn params(&self) -> &Arc<SharedParams> {
        &self.params
    }

    /// Snapshot of the parameters as the next block will see them.
    pub fn snapshot(&self) -> VoiceParams {
        self.params.snapshot()
    }

    /// Change sample rate or maximum block size. Must not overlap rendering.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.voice.prepare(sample_rate, max_block_size);
    }

    /// Render one block using the voice's internal LFO.
    pub fn render_block(&mut self, output: &mut [f32], events: &[TimedEvent]) {
        let snapshot = self.params.snapshot();
        let ctx = BlockContext::new(&snapshot)
            .with_events(events)
            .with_sink(&*self.params);
        self.voice.render_block(output, &ctx);
    }

    /// Render one block with an external LFO stream in `[-1, 1]`.
    pub fn render_block_with_lfo(&mut self, output: &mut [f32], events: &[TimedEvent], lfo: &[f32]) {
        let snapshot = self.params.snapshot();
        let ctx = BlockContext::new(&snapshot)
            .with_events(events)
            .with_lfo(lfo)
            .with_sink(&*self.params);
        self.voice.render_block(output, &ctx);
    }

    /// Global tuning offset in semitones.
    pub fn set_master_tune(&self, semitones: f32) {
        self.params.set(Param::MasterTune, semitones);
    }

    /// Whether the voice is still producing sound.
    pub fn is_active(&self) -> bool {
        self.voice.is_active()
    }

    /// Release every held key.
    pub fn all_notes_off(&mut self) {
        self.voice.all_notes_off();
    }

    /// The voice, for inspection.
    pub fn voice(&self) -> &MonoVoice {
        &self.voice
    }

    /// Silence and clear the voice. Parameters are kept.
    pub fn reset(&mut self) {
        self.voice.reset();
    }
}
