//! Patch format and conversion to and from the voice's parameters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use voltage_synth::{PARAMS, Param, SharedParams, VoiceParams};

use crate::error::ConfigError;
use crate::validation::{
    Policy, ValidationError, ValidationResult, check_value, check_writable, find_param,
    parse_choice, parse_param_value,
};

/// One parameter value in a patch: a number, or text holding a number with
/// a unit suffix or a choice label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    /// Plain number in the parameter's native unit.
    Number(f64),
    /// `"5ms"`, `"1.2kHz"`, `"50%"`, or a label such as `"Sawtooth"`.
    Text(String),
}

impl From<f32> for PatchValue {
    fn from(value: f32) -> Self {
        PatchValue::Number(tidy(value))
    }
}

impl From<&str> for PatchValue {
    fn from(value: &str) -> Self {
        PatchValue::Text(value.to_string())
    }
}

impl From<String> for PatchValue {
    fn from(value: String) -> Self {
        PatchValue::Text(value)
    }
}

impl fmt::Display for PatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchValue::Number(v) => write!(f, "{v}"),
            PatchValue::Text(s) => f.write_str(s),
        }
    }
}

/// Widen to f64 without carrying f32 representation noise into the TOML.
fn tidy(value: f32) -> f64 {
    (f64::from(value) * 1.0e6).round() / 1.0e6
}

/// A named set of parameter values.
///
/// Only the parameters a patch mentions are stored; everything else keeps
/// its default when the patch is converted.
///
/// # TOML Format
///
/// ```toml
/// name = "Reed Lead"
/// description = "Pulse through a resonant filter"
///
/// [params]
/// feet = "4'"
/// waveform = "Pulse"
/// cutoff = "1.8kHz"
/// resonance = 0.65
/// attack = "15ms"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Name of the patch.
    pub name: String,

    /// Optional description of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter string id to value.
    #[serde(default)]
    pub params: BTreeMap<String, PatchValue>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: BTreeMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add or replace a parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Capture every writable parameter of a snapshot. Stepped parameters
    /// are written as their labels.
    pub fn from_params(name: impl Into<String>, params: &VoiceParams) -> Self {
        let mut patch = Self::new(name);
        for p in Param::ALL {
            let desc = p.descriptor();
            if check_writable(desc).is_err() {
                continue;
            }
            let value = params.get(p);
            let entry = match desc.choice_label(value) {
                Some(label) => PatchValue::from(label),
                None => PatchValue::from(value),
            };
            patch.params.insert(desc.string_id.to_string(), entry);
        }
        patch
    }

    /// Parse a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of parameters set.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the patch sets no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Value for a parameter string id.
    pub fn get(&self, name: &str) -> Option<&PatchValue> {
        self.params.get(name)
    }

    /// Check every entry strictly, reporting all problems at once.
    pub fn validate(&self) -> ValidationResult<()> {
        self.resolve(Policy::Reject).map(|_| ())
    }

    /// Resolve every entry to `(param, value)` pairs under `policy`.
    pub fn resolve(&self, policy: Policy) -> ValidationResult<Vec<(Param, f32)>> {
        let mut values = Vec::with_capacity(self.params.len());
        let mut errors = Vec::new();
        for (name, value) in &self.params {
            match resolve_entry(name, value, policy) {
                Ok(Some(pair)) => values.push(pair),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }
        ValidationError::from_list(errors)?;
        Ok(values)
    }

    /// Build a snapshot: defaults overlaid with this patch.
    pub fn to_params(&self, policy: Policy) -> Result<VoiceParams, ConfigError> {
        let mut params = VoiceParams::default();
        for (p, v) in self.resolve(policy)? {
            params.set(p, v);
        }
        Ok(params)
    }

    /// Write this patch into a live parameter surface.
    ///
    /// Nothing is written unless every entry resolves. Parameters the patch
    /// does not mention keep their current values.
    pub fn apply(&self, shared: &SharedParams, policy: Policy) -> Result<(), ConfigError> {
        for (p, v) in self.resolve(policy)? {
            shared.set(p, v);
        }
        Ok(())
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new("Init")
    }
}

fn resolve_entry(name: &str, value: &PatchValue, policy: Policy) -> ValidationResult<Option<(Param, f32)>> {
    let param = find_param(name)?;
    let desc = param.descriptor();
    if let Err(e) = check_writable(desc) {
        return match policy {
            Policy::Reject => Err(e),
            Policy::Clamp => Ok(None),
        };
    }

    let raw = match value {
        PatchValue::Number(v) => *v as f32,
        PatchValue::Text(s) if desc.is_stepped() => match parse_choice(desc, s) {
            Ok(index) => index,
            Err(choice_err) => parse_param_value(name, s).map_err(|_| choice_err)?,
        },
        PatchValue::Text(s) => parse_param_value(name, s)?,
    };
    check_value(desc, raw, policy).map(|v| Some((param, v)))
}

/// Parameter string ids in table order.
pub fn param_names() -> impl Iterator<Item = &'static str> {
    PARAMS.iter().map(|d| d.string_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltage_synth::{Feet, FilterType, Waveform};

    #[test]
    fn empty_patch_gives_defaults() {
        let params = Patch::default().to_params(Policy::Reject).unwrap();
        assert_eq!(params, VoiceParams::default());
    }

    #[test]
    fn labels_units_and_numbers() {
        let patch = Patch::new("Lead")
            .with_param("feet", "4'")
            .with_param("waveform", "pwm")
            .with_param("filterType", "Clean")
            .with_param("cutoff", "1.8kHz")
            .with_param("attack", "15ms")
            .with_param("resonance", 0.65f32);
        let params = patch.to_params(Policy::Reject).unwrap();
        assert_eq!(params.feet, Feet::Four);
        assert_eq!(params.waveform, Waveform::Pwm);
        assert_eq!(params.filter_type, FilterType::Clean);
        assert_eq!(params.cutoff, 1800.0);
        assert!((params.attack - 0.015).abs() < 1e-7);
        assert!((params.resonance - 0.65).abs() < 1e-6);
    }

    #[test]
    fn stepped_params_accept_indices() {
        let patch = Patch::new("x")
            .with_param("waveform", 3.0f32)
            .with_param("feet", "0");
        let params = patch.to_params(Policy::Reject).unwrap();
        assert_eq!(params.waveform, Waveform::Pulse);
        assert_eq!(params.feet, Feet::ThirtyTwo);
    }

    #[test]
    fn validate_collects_every_problem() {
        let patch = Patch::new("bad")
            .with_param("cutoff", 5.0f32)
            .with_param("wobble", 1.0f32)
            .with_param("waveform", "Sine")
            .with_param("volume", 0.5f32);
        match patch.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected three errors, got {other:?}"),
        }
    }

    #[test]
    fn clamp_policy_repairs_ranges_but_not_names() {
        let patch = Patch::new("hot").with_param("resonance", 3.0f32);
        let params = patch.to_params(Policy::Clamp).unwrap();
        assert_eq!(params.resonance, 0.8);
        assert!(patch.to_params(Policy::Reject).is_err());

        let unknown = Patch::new("typo").with_param("cutof", 100.0f32);
        assert!(unknown.to_params(Policy::Clamp).is_err());
    }

    #[test]
    fn read_only_is_skipped_or_rejected() {
        let patch = Patch::new("wheel").with_param("pitchWheel", 0.5f32);
        assert!(matches!(
            patch.validate(),
            Err(ValidationError::ReadOnly { .. })
        ));
        assert_eq!(
            patch.to_params(Policy::Clamp).unwrap().pitch_wheel,
            0.0
        );
    }

    #[test]
    fn from_params_round_trips_through_toml() {
        let params = VoiceParams::default()
            .with(Param::Feet, 1.0)
            .with(Param::Cutoff, 640.0)
            .with(Param::Release, 1.25)
            .with(Param::Waveform, 0.0);
        let patch = Patch::from_params("Snapshot", &params).with_description("captured");
        assert!(patch.get("pitchWheel").is_none());
        assert_eq!(patch.get("waveform"), Some(&PatchValue::from("Triangle")));

        let text = patch.to_toml().unwrap();
        let parsed = Patch::from_toml(&text).unwrap();
        assert_eq!(parsed, patch);
        assert_eq!(parsed.to_params(Policy::Reject).unwrap(), params);
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let shared = SharedParams::new();
        let bad = Patch::new("bad")
            .with_param("cutoff", 500.0f32)
            .with_param("sustain", 4.0f32);
        assert!(bad.apply(&shared, Policy::Reject).is_err());
        assert_eq!(shared.get(Param::Cutoff), 2000.0);

        bad.apply(&shared, Policy::Clamp).unwrap();
        assert_eq!(shared.get(Param::Cutoff), 500.0);
        assert_eq!(shared.get(Param::Sustain), 1.0);
    }

    #[test]
    fn tidy_drops_float_noise() {
        assert_eq!(tidy(0.8), 0.8);
        assert_eq!(tidy(0.015), 0.015);
    }

    #[test]
    fn names_follow_table_order() {
        let names: Vec<_> = param_names().collect();
        assert_eq!(names.first(), Some(&"feet"));
        assert_eq!(names.len(), Param::COUNT);
    }
}
