//! The voice's parameter surface.
//!
//! Three views of the same set of named controls:
//!
//! - [`PARAMS`]: static [`ParamDescriptor`] metadata (range, unit, default,
//!   stable id), indexed by [`Param`].
//! - [`VoiceParams`]: the immutable per-block snapshot the audio path reads.
//! - [`SharedParams`]: lock-free atomic cells a host or UI thread writes and
//!   the engine snapshots once per block.
//!
//! Writes from the engine itself (mod wheel, breath, pitch-wheel display) go
//! through the [`ParamSink`] trait.

use voltage_core::{AtomicParam, ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit};

use crate::filter::FilterType;
use crate::shaper::Waveform;

/// Octave register selector, named by organ pipe length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feet {
    /// Two octaves down.
    #[cfg_attr(feature = "serde", serde(rename = "32'"))]
    ThirtyTwo,
    /// One octave down.
    #[cfg_attr(feature = "serde", serde(rename = "16'"))]
    Sixteen,
    /// Concert pitch.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "8'"))]
    Eight,
    /// One octave up.
    #[cfg_attr(feature = "serde", serde(rename = "4'"))]
    Four,
    /// White noise instead of the VCO.
    #[cfg_attr(feature = "serde", serde(rename = "noise"))]
    Noise,
}

impl Feet {
    /// All positions in parameter-index order.
    pub const ALL: [Feet; 5] = [Feet::ThirtyTwo, Feet::Sixteen, Feet::Eight, Feet::Four, Feet::Noise];

    /// Display labels in parameter-index order.
    pub const LABELS: [&'static str; 5] = ["32'", "16'", "8'", "4'", "Noise"];

    /// Octave offset in semitones. Noise has none.
    pub fn semitones(self) -> f32 {
        match self {
            Feet::ThirtyTwo => -24.0,
            Feet::Sixteen => -12.0,
            Feet::Eight | Feet::Noise => 0.0,
            Feet::Four => 12.0,
        }
    }

    /// Position for a stepped parameter value; out-of-range indices clamp.
    pub fn from_index(index: f32) -> Self {
        let i = libm::roundf(index).clamp(0.0, 4.0) as usize;
        Self::ALL[i]
    }

    /// Parameter index of this position.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Every named control, in table order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
#[allow(missing_docs)]
pub enum Param {
    Feet,
    Waveform,
    PwmSpeed,
    Pitch,
    GlissandoTime,
    Cutoff,
    Resonance,
    VcfEgDepth,
    VcaEgDepth,
    LfoSpeed,
    ModDepth,
    Attack,
    Decay,
    Sustain,
    Release,
    BreathVcf,
    BreathVca,
    Volume,
    BreathInput,
    PitchBendUpRange,
    PitchBendDownRange,
    FilterType,
    MasterTune,
    PitchWheel,
}

impl Param {
    /// Number of parameters.
    pub const COUNT: usize = 24;

    /// All parameters in table order.
    pub const ALL: [Param; Param::COUNT] = [
        Param::Feet,
        Param::Waveform,
        Param::PwmSpeed,
        Param::Pitch,
        Param::GlissandoTime,
        Param::Cutoff,
        Param::Resonance,
        Param::VcfEgDepth,
        Param::VcaEgDepth,
        Param::LfoSpeed,
        Param::ModDepth,
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::BreathVcf,
        Param::BreathVca,
        Param::Volume,
        Param::BreathInput,
        Param::PitchBendUpRange,
        Param::PitchBendDownRange,
        Param::FilterType,
        Param::MasterTune,
        Param::PitchWheel,
    ];

    /// Metadata for this parameter.
    pub fn descriptor(self) -> &'static ParamDescriptor {
        &PARAMS[self as usize]
    }

    /// Table index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a parameter by its string id (e.g. `"cutoff"`).
    pub fn from_string_id(id: &str) -> Option<Param> {
        param_index_by_name(id).map(|i| Param::ALL[i])
    }
}

/// Table index of the parameter with string id `name`.
pub fn param_index_by_name(name: &str) -> Option<usize> {
    PARAMS.iter().position(|d| d.string_id == name)
}

const fn seconds(name: &'static str, min: f32, max: f32, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, name, ParamUnit::Seconds, min, max, default)
        .with_scale(ParamScale::Power(3.0))
}

const fn amount(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Amount, 0.0, 1.0, default)
}

const fn rate(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Hertz, 0.1, 20.0, default)
        .with_scale(ParamScale::Logarithmic)
}

/// Descriptor table, indexed by [`Param`].
pub static PARAMS: [ParamDescriptor; Param::COUNT] = [
    ParamDescriptor::choice("Feet", "Feet", &Feet::LABELS, 2).with_id(ParamId(0), "feet"),
    ParamDescriptor::choice("Waveform", "Wave", &Waveform::LABELS, 1)
        .with_id(ParamId(1), "waveform"),
    rate("PWM Speed", "PWM", 2.0).with_id(ParamId(2), "pwmSpeed"),
    ParamDescriptor::continuous("Pitch", "Pitch", ParamUnit::Semitones, -1.0, 1.0, 0.0)
        .with_id(ParamId(3), "pitch"),
    seconds("Glissando", 0.0, 0.5, 0.0).with_id(ParamId(4), "glissandoTime"),
    ParamDescriptor::continuous("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 20000.0, 2000.0)
        .with_scale(ParamScale::Logarithmic)
        .with_id(ParamId(5), "cutoff"),
    ParamDescriptor::continuous("Resonance", "Reso", ParamUnit::Amount, 0.1, 0.8, 0.3)
        .with_id(ParamId(6), "resonance"),
    amount("VCF EG Depth", "VCF EG", 0.0).with_id(ParamId(7), "vcfEgDepth"),
    amount("VCA EG Depth", "VCA EG", 1.0).with_id(ParamId(8), "vcaEgDepth"),
    rate("LFO Speed", "LFO", 5.0).with_id(ParamId(9), "lfoSpeed"),
    amount("Mod Depth", "Mod", 0.0).with_id(ParamId(10), "modDepth"),
    seconds("Attack", 0.001, 5.0, 0.01).with_id(ParamId(11), "attack"),
    seconds("Decay", 0.001, 5.0, 0.3).with_id(ParamId(12), "decay"),
    amount("Sustain", "Sustain", 0.7).with_id(ParamId(13), "sustain"),
    seconds("Release", 0.001, 5.0, 0.2).with_id(ParamId(14), "release"),
    amount("Breath VCF", "Br VCF", 0.0).with_id(ParamId(15), "breathVcf"),
    amount("Breath VCA", "Br VCA", 0.0).with_id(ParamId(16), "breathVca"),
    amount("Volume", "Volume", 0.8).with_id(ParamId(17), "volume"),
    amount("Breath Input", "Breath", 0.0).with_id(ParamId(18), "breathInput"),
    ParamDescriptor::continuous("Bend Up", "Bend Up", ParamUnit::Semitones, 0.0, 12.0, 2.0)
        .with_id(ParamId(19), "pitchBendUpRange"),
    ParamDescriptor::continuous("Bend Down", "Bend Dn", ParamUnit::Semitones, 0.0, 12.0, 2.0)
        .with_id(ParamId(20), "pitchBendDownRange"),
    ParamDescriptor::choice("Filter Type", "Filter", &FilterType::LABELS, 0)
        .with_id(ParamId(21), "filterType"),
    ParamDescriptor::continuous("Master Tune", "Tune", ParamUnit::Semitones, -1.0, 1.0, 0.0)
        .with_id(ParamId(22), "masterTune"),
    ParamDescriptor::continuous("Pitch Wheel", "Wheel", ParamUnit::Amount, -1.0, 1.0, 0.0)
        .with_id(ParamId(23), "pitchWheel")
        .with_flags(ParamFlags::READ_ONLY),
];

/// Immutable per-block parameter snapshot.
///
/// Times are in seconds, rates in Hz, pitch offsets in semitones, amounts
/// 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[allow(missing_docs)]
pub struct VoiceParams {
    pub feet: Feet,
    pub waveform: Waveform,
    pub pwm_speed: f32,
    pub pitch: f32,
    pub glissando_time: f32,
    pub cutoff: f32,
    pub resonance: f32,
    pub vcf_eg_depth: f32,
    pub vca_eg_depth: f32,
    pub lfo_speed: f32,
    pub mod_depth: f32,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub breath_vcf: f32,
    pub breath_vca: f32,
    pub volume: f32,
    pub breath_input: f32,
    pub pitch_bend_up_range: f32,
    pub pitch_bend_down_range: f32,
    pub filter_type: FilterType,
    pub master_tune: f32,
    pub pitch_wheel: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        let mut params = Self {
            feet: Feet::default(),
            waveform: Waveform::default(),
            pwm_speed: 0.0,
            pitch: 0.0,
            glissando_time: 0.0,
            cutoff: 0.0,
            resonance: 0.0,
            vcf_eg_depth: 0.0,
            vca_eg_depth: 0.0,
            lfo_speed: 0.0,
            mod_depth: 0.0,
            attack: 0.0,
            decay: 0.0,
            sustain: 0.0,
            release: 0.0,
            breath_vcf: 0.0,
            breath_vca: 0.0,
            volume: 0.0,
            breath_input: 0.0,
            pitch_bend_up_range: 0.0,
            pitch_bend_down_range: 0.0,
            filter_type: FilterType::default(),
            master_tune: 0.0,
            pitch_wheel: 0.0,
        };
        for p in Param::ALL {
            params.set(p, p.descriptor().default);
        }
        params
    }
}

impl VoiceParams {
    /// Value of `param` as a plain float (stepped params as their index).
    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Feet => self.feet.index() as f32,
            Param::Waveform => self.waveform.index() as f32,
            Param::PwmSpeed => self.pwm_speed,
            Param::Pitch => self.pitch,
            Param::GlissandoTime => self.glissando_time,
            Param::Cutoff => self.cutoff,
            Param::Resonance => self.resonance,
            Param::VcfEgDepth => self.vcf_eg_depth,
            Param::VcaEgDepth => self.vca_eg_depth,
            Param::LfoSpeed => self.lfo_speed,
            Param::ModDepth => self.mod_depth,
            Param::Attack => self.attack,
            Param::Decay => self.decay,
            Param::Sustain => self.sustain,
            Param::Release => self.release,
            Param::BreathVcf => self.breath_vcf,
            Param::BreathVca => self.breath_vca,
            Param::Volume => self.volume,
            Param::BreathInput => self.breath_input,
            Param::PitchBendUpRange => self.pitch_bend_up_range,
            Param::PitchBendDownRange => self.pitch_bend_down_range,
            Param::FilterType => self.filter_type.index() as f32,
            Param::MasterTune => self.master_tune,
            Param::PitchWheel => self.pitch_wheel,
        }
    }

    /// Set `param`, clamped to its declared range.
    pub fn set(&mut self, param: Param, value: f32) {
        let v = param.descriptor().clamp(value);
        match param {
            Param::Feet => self.feet = Feet::from_index(v),
            Param::Waveform => self.waveform = Waveform::from_index(v),
            Param::PwmSpeed => self.pwm_speed = v,
            Param::Pitch => self.pitch = v,
            Param::GlissandoTime => self.glissando_time = v,
            Param::Cutoff => self.cutoff = v,
            Param::Resonance => self.resonance = v,
            Param::VcfEgDepth => self.vcf_eg_depth = v,
            Param::VcaEgDepth => self.vca_eg_depth = v,
            Param::LfoSpeed => self.lfo_speed = v,
            Param::ModDepth => self.mod_depth = v,
            Param::Attack => self.attack = v,
            Param::Decay => self.decay = v,
            Param::Sustain => self.sustain = v,
            Param::Release => self.release = v,
            Param::BreathVcf => self.breath_vcf = v,
            Param::BreathVca => self.breath_vca = v,
            Param::Volume => self.volume = v,
            Param::BreathInput => self.breath_input = v,
            Param::PitchBendUpRange => self.pitch_bend_up_range = v,
            Param::PitchBendDownRange => self.pitch_bend_down_range = v,
            Param::FilterType => self.filter_type = FilterType::from_index(v),
            Param::MasterTune => self.master_tune = v,
            Param::PitchWheel => self.pitch_wheel = v,
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, param: Param, value: f32) -> Self {
        self.set(param, value);
        self
    }
}

/// Destination for parameter writes made by the engine itself.
pub trait ParamSink {
    /// Publish `value` for `param`.
    fn write(&self, param: Param, value: f32);
}

/// Discards every write.
impl ParamSink for () {
    fn write(&self, _param: Param, _value: f32) {}
}

/// Lock-free parameter surface shared between a control thread and the
/// audio thread.
///
/// Each value lives in its own [`AtomicParam`]. Writers clamp to the
/// declared range; the audio thread takes one [`snapshot`](Self::snapshot)
/// per block so a block never sees a half-applied change to any single
/// value.
///
/// ```rust
/// use voltage_synth::{Param, SharedParams};
///
/// let shared = SharedParams::new();
/// shared.set(Param::Cutoff, 99999.0);
/// assert_eq!(shared.snapshot().cutoff, 20000.0);
/// ```
#[derive(Debug)]
pub struct SharedParams {
    values: [AtomicParam; Param::COUNT],
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedParams {
    /// Surface holding every parameter's default.
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| AtomicParam::new(PARAMS[i].default)),
        }
    }

    /// Surface initialized from a snapshot.
    pub fn from_params(params: &VoiceParams) -> Self {
        let shared = Self::new();
        shared.store_all(params);
        shared
    }

    /// Current value of `param`.
    pub fn get(&self, param: Param) -> f32 {
        self.values[param.index()].load()
    }

    /// Set `param`, clamped to its declared range.
    pub fn set(&self, param: Param, value: f32) {
        self.values[param.index()].store(param.descriptor().clamp(value));
    }

    /// Position of `param` on a 0..1 control, following its scale.
    pub fn get_normalized(&self, param: Param) -> f32 {
        param.descriptor().normalize(self.get(param))
    }

    /// Set `param` from a 0..1 control position, following its scale.
    pub fn set_normalized(&self, param: Param, normalized: f32) {
        let desc = param.descriptor();
        self.set(param, desc.denormalize(normalized.clamp(0.0, 1.0)));
    }

    /// Overwrite every value from a snapshot.
    pub fn store_all(&self, params: &VoiceParams) {
        for p in Param::ALL {
            self.set(p, params.get(p));
        }
    }

    /// Read every value into a snapshot.
    pub fn snapshot(&self) -> VoiceParams {
        let mut params = VoiceParams::default();
        for p in Param::ALL {
            params.set(p, self.get(p));
        }
        params
    }
}

impl ParamSink for SharedParams {
    fn write(&self, param: Param, value: f32) {
        self.set(param, value);
    }
}
