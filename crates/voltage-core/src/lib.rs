//! Voltage Core - DSP primitives for the analog voice engine
//!
//! The building blocks shared by the oscillator, filter and amplifier stages
//! of `voltage-synth`. Everything here is allocation-free and safe to call
//! from the audio thread.
//!
//! # Filters
//!
//! - [`Biquad`] - Transposed direct form II section with separate [`BiquadCoefficients`]
//! - [`OnePole`] / [`OnePoleHighpass`] - 6 dB/oct sections
//! - [`DcBlocker`] - Coupling-capacitor model, by cutoff or RC time constant
//!
//! # Modulation
//!
//! - [`Lfo`] - Sine/triangle/saw/square low-frequency oscillator
//!
//! # Parameters
//!
//! - [`SmoothedParam`] - One-pole smoothing for gain changes
//! - [`AtomicParam`] - Lock-free `f32` cell for the control surface
//! - [`ParamDescriptor`] - Range, unit and flag metadata
//!
//! # Math
//!
//! Saturation ([`saturate`], [`hard_clip`]), interpolation ([`map_clamped`]),
//! pitch ([`pitch_to_freq`]) and denormal protection ([`flush_denormal`]).
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! voltage-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod dc_blocker;
pub mod lfo;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_info;

pub use biquad::{Biquad, BiquadCoefficients, lowpass_coefficients};
pub use dc_blocker::DcBlocker;
pub use lfo::{Lfo, LfoShape};
pub use math::{
    flush_denormal, hard_clip, map_clamped, pitch_to_freq, saturate, seconds_to_samples,
};
pub use one_pole::{OnePole, OnePoleHighpass};
pub use param::{AtomicParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit};
