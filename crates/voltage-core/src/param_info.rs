//! Parameter metadata for the host-facing control surface.
//!
//! Every control a voice exposes is described by a [`ParamDescriptor`]:
//! display names, unit, range, default, stable [`ParamId`], normalization
//! [`ParamScale`], and capability [`ParamFlags`]. Descriptors are plain
//! `Copy` data with `const` builders so a whole table can live in a `static`.
//!
//! # Example
//!
//! ```rust
//! use voltage_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};
//!
//! const CUTOFF: ParamDescriptor =
//!     ParamDescriptor::continuous("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 20000.0, 2000.0)
//!         .with_id(ParamId(10), "cutoff")
//!         .with_scale(ParamScale::Logarithmic);
//!
//! assert_eq!(CUTOFF.clamp(50000.0), 20000.0);
//! assert!((CUTOFF.denormalize(CUTOFF.normalize(440.0)) - 440.0).abs() < 0.1);
//! ```

/// Scaling curve for parameter normalization.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`, requires `min > 0`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping. More resolution at low values.
    Logarithmic,
    /// Power curve mapping with configurable exponent.
    Power(f32),
}

/// Stable parameter identifier that survives reordering.
///
/// Once assigned, a `ParamId` must never change for a given parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags.
///
/// ```rust
/// use voltage_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::READ_ONLY));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (enum-like, integer values).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter is read-only (display only, written by the engine).
    pub const READ_ONLY: Self = Self(1 << 2);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Hertz - filter cutoff, LFO rates.
    Hertz,
    /// Seconds - envelope and glide times.
    Seconds,
    /// Semitones - pitch offsets and bend ranges.
    Semitones,
    /// Dimensionless 0..1 amount or level.
    Amount,
    /// Index into a fixed list of choices.
    Choice,
}

/// Describes a single parameter's metadata for display and validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display.
    pub name: &'static str,
    /// Short name for narrow displays, max 8 characters.
    pub short_name: &'static str,
    /// Unit type.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Default value.
    pub default: f32,
    /// Recommended step for encoder-style control.
    pub step: f32,
    /// Stable numeric ID.
    pub id: ParamId,
    /// Human-readable stable ID used for patches and lookups.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
    /// Display labels for stepped parameters (empty for continuous ones).
    pub choices: &'static [&'static str],
}

impl ParamDescriptor {
    /// A continuous parameter with the given unit and range.
    pub const fn continuous(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
            choices: &[],
        }
    }

    /// A stepped parameter selecting one of `choices` by index.
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        choices: &'static [&'static str],
        default: usize,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Choice,
            min: 0.0,
            max: (choices.len() - 1) as f32,
            default: default as f32,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
            choices,
        }
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the parameter flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether this is a stepped (choice) parameter.
    #[inline]
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamps a value to this parameter's valid range. Stepped values are
    /// also rounded to the nearest index.
    ///
    /// ```rust
    /// use voltage_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::choice("Wave", "Wave", &["a", "b", "c"], 0);
    /// assert_eq!(desc.clamp(1.4), 1.0);
    /// assert_eq!(desc.clamp(9.0), 2.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let v = if value.is_nan() { self.default } else { value };
        let v = v.clamp(self.min, self.max);
        if self.is_stepped() { libm::roundf(v) } else { v }
    }

    /// Whether `value` lies inside `[min, max]`.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => {
                let linear = (value - self.min) / range;
                libm::powf(linear, 1.0 / exp)
            }
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the actual parameter range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => {
                let curved = libm::powf(normalized, exp);
                self.min + curved * (self.max - self.min)
            }
        }
    }

    /// Label for a stepped value, if one exists.
    pub fn choice_label(&self, value: f32) -> Option<&'static str> {
        if !self.is_stepped() {
            return None;
        }
        self.choices.get(self.clamp(value) as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDE: ParamDescriptor =
        ParamDescriptor::continuous("Glide", "Glide", ParamUnit::Seconds, 0.0, 0.5, 0.0)
            .with_id(ParamId(5), "glide")
            .with_scale(ParamScale::Power(2.0));

    #[test]
    fn test_continuous_defaults() {
        assert_eq!(GLIDE.id, ParamId(5));
        assert_eq!(GLIDE.string_id, "glide");
        assert!(!GLIDE.is_stepped());
        assert!(GLIDE.flags.contains(ParamFlags::AUTOMATABLE));
        assert!(GLIDE.choices.is_empty());
    }

    #[test]
    fn test_clamp_nan_falls_back_to_default() {
        assert_eq!(GLIDE.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn test_contains() {
        assert!(GLIDE.contains(0.25));
        assert!(!GLIDE.contains(-0.1));
        assert!(!GLIDE.contains(0.6));
    }

    #[test]
    fn test_power_scale_roundtrip() {
        for v in [0.0, 0.05, 0.2, 0.5] {
            let back = GLIDE.denormalize(GLIDE.normalize(v));
            assert!((back - v).abs() < 1e-5, "{v} -> {back}");
        }
    }

    #[test]
    fn test_log_scale_midpoint() {
        let desc = ParamDescriptor::continuous("Cut", "Cut", ParamUnit::Hertz, 20.0, 20000.0, 1000.0)
            .with_scale(ParamScale::Logarithmic);
        let mid = desc.denormalize(0.5);
        assert!((mid - 632.45).abs() < 1.0, "got {mid}");
    }

    #[test]
    fn test_choice_labels() {
        let desc = ParamDescriptor::choice("Feet", "Feet", &["32'", "16'", "8'"], 2);
        assert_eq!(desc.max, 2.0);
        assert_eq!(desc.default, 2.0);
        assert_eq!(desc.choice_label(0.0), Some("32'"));
        assert_eq!(desc.choice_label(7.0), Some("8'"));
        assert_eq!(GLIDE.choice_label(0.0), None);
    }

    #[test]
    fn test_read_only_flag() {
        let desc = GLIDE.with_flags(ParamFlags::READ_ONLY);
        assert!(desc.flags.contains(ParamFlags::READ_ONLY));
        assert!(!desc.flags.contains(ParamFlags::AUTOMATABLE));
    }
}
