//! Voltage Synth - a monophonic analog-modeled voice engine
//!
//! Turns MIDI note and controller events plus a block-rate parameter
//! snapshot into one channel of audio, following the signal path of a
//! vintage single-oscillator subtractive synthesizer:
//!
//! ```text
//! MIDI ──► NoteManager ──► SoundSource (VCO | noise) ──► Vcf ──► Vca ──► out
//!                    └──► Envelope ──────────────────────┴────────┘
//! ```
//!
//! # Components
//!
//! ## Sound sources
//!
//! - [`Vco`] - stepped-glissando oscillator; a PolyBLEP master square feeds
//!   one of five [`Waveform`] shapers ([`WaveShaper`])
//! - [`NoiseSource`] - low-passed white noise, selected with [`Feet::Noise`]
//! - [`SoundSource`] - owns both and hands the playing note across a switch
//!
//! ## Filter and amplifier
//!
//! - [`Vcf`] - resonant 2-pole low-pass with a circuit model
//!   ([`FilterType::Analog`]) or a plain biquad ([`FilterType::Clean`])
//! - [`Envelope`] - linear ADSR
//! - [`Vca`] - EG gating, volume and breath
//!
//! ## Control
//!
//! - [`NoteManager`] - highest-note priority with legato
//! - [`MidiEvent`] / [`TimedEvent`] - events positioned within a block
//! - [`VoiceParams`] - per-block snapshot, described by [`PARAMS`]
//! - [`SharedParams`] - lock-free surface shared with a control thread
//!
//! ## Rendering
//!
//! - [`MonoVoice`] - sample-accurate block renderer over a [`BlockContext`]
//! - [`MonoSynth`] - the voice plus its shared parameter surface
//!
//! # Example
//!
//! ```rust
//! use voltage_synth::{MidiEvent, MonoSynth, Param, TimedEvent};
//!
//! let mut synth = MonoSynth::new(44100.0, 512);
//! synth.params().set(Param::Cutoff, 1200.0);
//! synth.params().set(Param::Resonance, 0.7);
//!
//! let events = [
//!     TimedEvent::new(0, MidiEvent::NoteOn { pitch: 48, velocity: 1.0 }),
//!     TimedEvent::new(256, MidiEvent::NoteOn { pitch: 55, velocity: 1.0 }),
//! ];
//! let mut block = vec![0.0; 512];
//! synth.render_block(&mut block, &events);
//! assert_eq!(synth.voice().sounding_note(), Some(55));
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for scratch buffers).
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! voltage-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod blep;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod midi;
pub mod noise;
pub mod note_manager;
pub mod oscillator;
pub mod params;
pub mod shaper;
pub mod source;
pub mod vca;
pub mod voice;

pub use engine::MonoSynth;
pub use envelope::{Envelope, EnvelopeState};
pub use filter::{
    FilterType, MAX_CUTOFF_HZ, MAX_RESONANCE, MIN_CUTOFF_HZ, MIN_RESONANCE, Vcf,
    analog_coefficients, clean_coefficients, resonance_to_q,
};
pub use midi::{MidiEvent, PITCH_WHEEL_CENTER, TimedEvent, normalize_pitch_wheel};
pub use noise::NoiseSource;
pub use note_manager::{HeldNotes, NoteAction, NoteManager};
pub use oscillator::{PitchState, Vco};
pub use params::{Feet, PARAMS, Param, ParamSink, SharedParams, VoiceParams, param_index_by_name};
pub use shaper::{ShaperInput, WaveShaper, Waveform};
pub use source::{NoteState, SoundSource, SourceKind, TailOff};
pub use vca::Vca;
pub use voice::{BlockContext, MonoVoice};

pub use voltage_core::{BiquadCoefficients, ParamDescriptor};
