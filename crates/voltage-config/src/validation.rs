//! Parameter value parsing and range validation.
//!
//! Patch values are checked against the voice's [`PARAMS`] descriptor
//! table. A value may be a plain number, a number with a unit suffix, or
//! (for stepped parameters) one of the choice labels.
//!
//! # Example
//!
//! ```rust
//! use voltage_config::{Policy, validate_param};
//!
//! assert_eq!(validate_param("cutoff", 1200.0, Policy::Reject), Ok(1200.0));
//! assert!(validate_param("cutoff", 1.0e6, Policy::Reject).is_err());
//! assert_eq!(validate_param("cutoff", 1.0e6, Policy::Clamp), Ok(20000.0));
//! ```

use thiserror::Error;
use voltage_core::ParamFlags;
use voltage_synth::{PARAMS, Param, ParamDescriptor};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No parameter has this string id.
    #[error("unknown parameter '{name}'")]
    UnknownParameter {
        /// The name that was looked up.
        name: String,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Label does not name one of a stepped parameter's choices.
    #[error("parameter '{param}' has no choice '{value}' (expected one of: {})", .choices.join(", "))]
    InvalidChoice {
        /// Name of the parameter.
        param: String,
        /// The label given.
        value: String,
        /// Valid labels.
        choices: Vec<String>,
    },

    /// Value could not be parsed.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Parameter is display-only and cannot be set from a patch.
    #[error("parameter '{param}' is read-only")]
    ReadOnly {
        /// Name of the parameter.
        param: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// What to do with a value outside its declared range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// Out-of-range values and read-only parameters are errors.
    #[default]
    Reject,
    /// Out-of-range values are clamped; read-only parameters are skipped.
    Clamp,
}

impl ValidationError {
    /// Collapse a list of errors: none is `Ok`, one is itself, more are
    /// [`Multiple`](Self::Multiple).
    pub fn from_list(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Look up a parameter by string id.
pub fn find_param(name: &str) -> ValidationResult<Param> {
    Param::from_string_id(name).ok_or_else(|| ValidationError::UnknownParameter {
        name: name.to_string(),
    })
}

/// Check a numeric value for the parameter `name` and return what should be
/// stored.
///
/// Stepped values are rounded to the nearest index before the range check.
pub fn validate_param(name: &str, value: f32, policy: Policy) -> ValidationResult<f32> {
    let param = find_param(name)?;
    check_value(param.descriptor(), value, policy)
}

pub(crate) fn check_value(desc: &ParamDescriptor, value: f32, policy: Policy) -> ValidationResult<f32> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            param: desc.string_id.to_string(),
            reason: format!("{value} is not a finite number"),
        });
    }
    let value = if desc.is_stepped() { value.round() } else { value };
    if desc.contains(value) {
        return Ok(value);
    }
    match policy {
        Policy::Clamp => Ok(desc.clamp(value)),
        Policy::Reject => Err(ValidationError::OutOfRange {
            param: desc.string_id.to_string(),
            value,
            min: desc.min,
            max: desc.max,
        }),
    }
}

pub(crate) fn check_writable(desc: &ParamDescriptor) -> ValidationResult<()> {
    if desc.flags.contains(ParamFlags::READ_ONLY) {
        Err(ValidationError::ReadOnly {
            param: desc.string_id.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Index of `label` among a stepped parameter's choices, ignoring case.
pub fn parse_choice(desc: &ParamDescriptor, label: &str) -> ValidationResult<f32> {
    let label = label.trim();
    desc.choices
        .iter()
        .position(|c| c.eq_ignore_ascii_case(label))
        .map(|i| i as f32)
        .ok_or_else(|| ValidationError::InvalidChoice {
            param: desc.string_id.to_string(),
            value: label.to_string(),
            choices: desc.choices.iter().map(|c| (*c).to_string()).collect(),
        })
}

/// Parse a parameter value string into an f32.
///
/// Supports:
/// - Plain numbers: "0.5", "1200", "-0.3"
/// - Percentages: "50%" (divided by 100)
/// - Time: "100ms" (converted to seconds), "1.5s"
/// - Frequency: "440Hz", "1.2kHz" (converted to Hz)
/// - Pitch: "2st" (semitones, kept as is)
pub fn parse_param_value(param_name: &str, value_str: &str) -> ValidationResult<f32> {
    let s = value_str.trim();
    let (number, multiplier, divisor) = if let Some(v) = s.strip_suffix('%') {
        (v, 1.0, 100.0)
    } else if let Some(v) = s.strip_suffix("ms") {
        (v, 1.0, 1000.0)
    } else if let Some(v) = s.strip_suffix("kHz").or_else(|| s.strip_suffix("khz")) {
        (v, 1000.0, 1.0)
    } else if let Some(v) = s
        .strip_suffix("Hz")
        .or_else(|| s.strip_suffix("hz"))
        .or_else(|| s.strip_suffix("st"))
        .or_else(|| s.strip_suffix('s'))
    {
        (v, 1.0, 1.0)
    } else {
        (s, 1.0, 1.0)
    };

    let number = number.trim();
    number
        .parse::<f32>()
        .map(|v: f32| v * multiplier / divisor)
        .map_err(|_| ValidationError::InvalidFormat {
            param: param_name.to_string(),
            reason: format!("cannot parse '{number}' as number"),
        })
}

/// Validate every descriptor's default against its own range.
///
/// Used by tests and tooling to catch table mistakes.
pub fn validate_table() -> ValidationResult<()> {
    let errors = PARAMS
        .iter()
        .filter_map(|d| check_value(d, d.default, Policy::Reject).err())
        .collect();
    ValidationError::from_list(errors)
}
