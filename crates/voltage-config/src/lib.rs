//! Patch configuration for the voltage mono synth.
//!
//! A patch is a named set of parameter values stored as TOML. This crate
//! parses and writes patches, checks every value against the voice's
//! parameter table, and turns a patch into a [`VoiceParams`] snapshot or
//! writes it into a live [`SharedParams`] surface.
//!
//! Values may be plain numbers, numbers with a unit suffix (`"15ms"`,
//! `"1.8kHz"`, `"80%"`), or labels for stepped parameters (`"Pulse"`,
//! `"16'"`). Out-of-range values are rejected or clamped depending on the
//! [`Policy`].
//!
//! # Example
//!
//! ```rust
//! use voltage_config::{Patch, Policy};
//! use voltage_synth::{Feet, SharedParams};
//!
//! let patch = Patch::from_toml(r#"
//!     name = "Bass"
//!     [params]
//!     feet = "16'"
//!     cutoff = "400Hz"
//!     release = "120ms"
//! "#).unwrap();
//!
//! let params = patch.to_params(Policy::Reject).unwrap();
//! assert_eq!(params.feet, Feet::Sixteen);
//!
//! let shared = SharedParams::new();
//! patch.apply(&shared, Policy::Reject).unwrap();
//! ```

mod error;
mod patch;

/// Parameter value parsing and validation.
pub mod validation;

/// Patches bundled with the library.
pub mod factory_patches;

pub use error::ConfigError;
pub use factory_patches::{
    FACTORY_PATCH_NAMES, factory_patch_names, factory_patches, get_factory_patch,
    is_factory_patch,
};
pub use patch::{Patch, PatchValue, param_names};
pub use validation::{
    Policy, ValidationError, ValidationResult, find_param, parse_choice, parse_param_value,
    validate_param, validate_table,
};

/// Re-export the types a patch converts into.
pub use voltage_synth::{Param, SharedParams, VoiceParams};
