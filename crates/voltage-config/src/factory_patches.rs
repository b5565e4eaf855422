//! Built-in patches, embedded as TOML so they read like user patches.

use crate::Patch;

/// Internal names of the factory patches.
pub static FACTORY_PATCH_NAMES: &[&str] = &["init", "reed_lead", "sub_bass", "wind", "sweep"];

static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("init", INIT_PATCH),
    ("reed_lead", REED_LEAD_PATCH),
    ("sub_bass", SUB_BASS_PATCH),
    ("wind", WIND_PATCH),
    ("sweep", SWEEP_PATCH),
];

const INIT_PATCH: &str = r#"
name = "Init"
description = "Every parameter at its default"
"#;

const REED_LEAD_PATCH: &str = r#"
name = "Reed Lead"
description = "Narrow pulse, resonant filter and delayed vibrato on the mod wheel"

[params]
feet = "4'"
waveform = "Pulse"
cutoff = "1.8kHz"
resonance = 0.65
vcfEgDepth = 0.3
attack = "15ms"
decay = "400ms"
sustain = 0.6
release = "250ms"
lfoSpeed = "5.5Hz"
glissandoTime = "20ms"
"#;

const SUB_BASS_PATCH: &str = r#"
name = "Sub Bass"
description = "Two octaves down through a closed filter"

[params]
feet = "32'"
waveform = "Triangle"
cutoff = "300Hz"
resonance = 0.2
attack = "2ms"
decay = "300ms"
sustain = "80%"
release = "120ms"
volume = 0.9
"#;

const WIND_PATCH: &str = r#"
name = "Wind"
description = "Breath-controlled noise; blow to open the filter and the VCA"

[params]
feet = "Noise"
cutoff = "600Hz"
resonance = 0.75
breathVcf = 0.8
breathVca = 1.0
attack = "80ms"
release = "600ms"
"#;

const SWEEP_PATCH: &str = r#"
name = "Sweep"
description = "PWM through a full envelope sweep of the filter"

[params]
waveform = "PWM"
pwmSpeed = "0.8Hz"
cutoff = "150Hz"
resonance = 0.7
vcfEgDepth = 1.0
attack = "5ms"
decay = "1.2s"
sustain = 0.3
release = "1s"
"#;

/// Every factory patch, parsed.
pub fn factory_patches() -> Vec<Patch> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml)| Patch::from_toml(toml).ok())
        .collect()
}

/// Find a factory patch by internal name or display name, ignoring case.
pub fn get_factory_patch(name: &str) -> Option<Patch> {
    let wanted = name.to_lowercase();
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(id, toml)| Some((*id, Patch::from_toml(toml).ok()?)))
        .find(|(id, patch)| *id == wanted || patch.name.to_lowercase() == wanted)
        .map(|(_, patch)| patch)
}

/// Internal names of the factory patches.
pub fn factory_patch_names() -> &'static [&'static str] {
    FACTORY_PATCH_NAMES
}

/// Whether `name` is one of the factory patch ids.
pub fn is_factory_patch(name: &str) -> bool {
    FACTORY_PATCH_NAMES.iter().any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Policy;
    use voltage_synth::{Feet, VoiceParams, Waveform};

    #[test]
    fn every_patch_parses_and_validates() {
        for (name, toml) in FACTORY_PATCHES_TOML {
            let patch = Patch::from_toml(toml).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(patch.description.is_some(), "{name} has no description");
            patch
                .validate()
                .unwrap_or_else(|e| panic!("{name} does not validate: {e}"));
        }
        assert_eq!(factory_patches().len(), FACTORY_PATCH_NAMES.len());
    }

    #[test]
    fn lookup_by_id_and_display_name() {
        assert_eq!(get_factory_patch("reed_lead").unwrap().name, "Reed Lead");
        assert_eq!(get_factory_patch("SUB BASS").unwrap().name, "Sub Bass");
        assert!(get_factory_patch("organ").is_none());
        assert!(factory_patch_names().contains(&"wind"));
        assert!(is_factory_patch("Sweep"));
        assert!(!is_factory_patch("Reed Lead"));
    }

    #[test]
    fn init_is_the_default_snapshot() {
        let init = get_factory_patch("init").unwrap();
        assert!(init.is_empty());
        assert_eq!(init.to_params(Policy::Reject).unwrap(), VoiceParams::default());
    }

    #[test]
    fn patches_select_what_they_describe() {
        let wind = get_factory_patch("wind").unwrap().to_params(Policy::Reject).unwrap();
        assert_eq!(wind.feet, Feet::Noise);
        let bass = get_factory_patch("sub_bass").unwrap().to_params(Policy::Reject).unwrap();
        assert_eq!(bass.feet, Feet::ThirtyTwo);
        assert_eq!(bass.waveform, Waveform::Triangle);
        assert!((bass.sustain - 0.8).abs() < 1e-6);
    }
}
