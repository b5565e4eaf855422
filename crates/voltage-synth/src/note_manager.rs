//! Monophonic note priority.
//!
//! Tracks which keys are held and decides, per event, whether the voice
//! starts a new attack, moves legato to another pitch, or releases. The
//! highest held key always sounds; releasing it drops back to the next
//! highest without retriggering the envelope.
//!
//! The manager only makes decisions. It returns a [`NoteAction`] that the
//! voice applies to its sound source and envelope.

use crate::midi::normalize_pitch_wheel;
use crate::midi::PITCH_WHEEL_CENTER;
use crate::params::{Param, ParamSink};

/// Modulation wheel controller number.
pub const CC_MOD_WHEEL: u8 = 1;
/// Breath controller number.
pub const CC_BREATH: u8 = 2;
/// All Sound Off: silence immediately.
pub const CC_ALL_SOUND_OFF: u8 = 120;
/// All Notes Off: release with tail-off.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Set of held MIDI keys, one bit per note number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldNotes(u128);

impl HeldNotes {
    /// Empty set.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add `pitch`. Returns false if it was already held or is not a MIDI note.
    pub fn insert(&mut self, pitch: u8) -> bool {
        if pitch > 127 || self.contains(pitch) {
            return false;
        }
        self.0 |= 1u128 << pitch;
        true
    }

    /// Remove `pitch`. Returns false if it was not held.
    pub fn remove(&mut self, pitch: u8) -> bool {
        if !self.contains(pitch) {
            return false;
        }
        self.0 &= !(1u128 << pitch);
        true
    }

    /// Whether `pitch` is held.
    pub fn contains(&self, pitch: u8) -> bool {
        pitch <= 127 && self.0 & (1u128 << pitch) != 0
    }

    /// Highest held note.
    pub fn highest(&self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some((127 - self.0.leading_zeros()) as u8)
        }
    }

    /// Whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Held notes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=127u8).filter(|&p| self.contains(p))
    }
}

/// What the voice should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteAction {
    /// New attack: start the generator and trigger the envelope.
    Start {
        /// Pitch to sound.
        pitch: u8,
        /// Normalized velocity.
        velocity: f32,
        /// Last 14-bit pitch-wheel value.
        pitch_wheel: u16,
    },
    /// Legato move to a new pitch; the envelope keeps running.
    Change(u8),
    /// Release the generator and the envelope.
    Stop {
        /// Fade over the release time instead of cutting off.
        allow_tail_off: bool,
    },
    /// Nothing audible changes.
    None,
}

/// Monophonic highest-note-priority note manager.
///
/// ```rust
/// use voltage_synth::{NoteAction, NoteManager};
///
/// let mut notes = NoteManager::new();
/// assert!(matches!(notes.note_on(60, 0.8), NoteAction::Start { pitch: 60, .. }));
/// assert_eq!(notes.note_on(64, 0.8), NoteAction::Change(64));
/// assert_eq!(notes.note_off(64), NoteAction::Change(60));
/// assert_eq!(notes.note_off(60), NoteAction::Stop { allow_tail_off: true });
/// ```
#[derive(Debug, Clone)]
pub struct NoteManager {
    held: HeldNotes,
    pitch_wheel: u16,
}

impl Default for NoteManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteManager {
    /// No keys held, wheel centered.
    pub fn new() -> Self {
        Self {
            held: HeldNotes::new(),
            pitch_wheel: PITCH_WHEEL_CENTER,
        }
    }

    /// Key pressed.
    ///
    /// Starts a new attack when nothing was held. Otherwise the sounding
    /// note only changes if `pitch` is now the highest held key. Repeated
    /// presses of a held key are ignored.
    pub fn note_on(&mut self, pitch: u8, velocity: f32) -> NoteAction {
        let was_empty = self.held.is_empty();
        let previous = self.held.highest();
        if !self.held.insert(pitch) {
            return NoteAction::None;
        }

        if was_empty {
            #[cfg(feature = "tracing")]
            tracing::trace!(pitch, "new attack");
            return NoteAction::Start {
                pitch,
                velocity,
                pitch_wheel: self.pitch_wheel,
            };
        }

        match self.held.highest() {
            Some(highest) if Some(highest) != previous => {
                #[cfg(feature = "tracing")]
                tracing::trace!(pitch = highest, "legato");
                NoteAction::Change(highest)
            }
            _ => NoteAction::None,
        }
    }

    /// Key released. Releasing a key that is not held does nothing.
    pub fn note_off(&mut self, pitch: u8) -> NoteAction {
        let previous = self.held.highest();
        if !self.held.remove(pitch) {
            return NoteAction::None;
        }

        match self.held.highest() {
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(pitch, "release");
                NoteAction::Stop {
                    allow_tail_off: true,
                }
            }
            Some(highest) if Some(highest) != previous => {
                #[cfg(feature = "tracing")]
                tracing::trace!(pitch = highest, "legato fallback");
                NoteAction::Change(highest)
            }
            Some(_) => NoteAction::None,
        }
    }

    /// Store the wheel position and publish its normalized value.
    pub fn pitch_wheel(&mut self, value: u16, sink: &dyn ParamSink) {
        self.pitch_wheel = value;
        sink.write(Param::PitchWheel, normalize_pitch_wheel(value));
    }

    /// Last wheel position.
    pub fn pitch_wheel_value(&self) -> u16 {
        self.pitch_wheel
    }

    /// Controller change.
    ///
    /// Mod wheel and breath are written to the parameter surface and take
    /// effect from the next block. All Notes Off releases the held keys.
    /// All Sound Off always cuts the voice, including a release tail that
    /// outlives the keys.
    pub fn control_change(&mut self, controller: u8, value: u8, sink: &dyn ParamSink) -> NoteAction {
        let normalized = f32::from(value.min(127)) / 127.0;
        match controller {
            CC_MOD_WHEEL => {
                sink.write(Param::ModDepth, normalized);
                NoteAction::None
            }
            CC_BREATH => {
                sink.write(Param::BreathInput, normalized);
                NoteAction::None
            }
            CC_ALL_SOUND_OFF => {
                self.held.clear();
                NoteAction::Stop {
                    allow_tail_off: false,
                }
            }
            CC_ALL_NOTES_OFF => self.all_notes_off(true),
            _ => NoteAction::None,
        }
    }

    /// Forget every held key. Returns a stop if anything was sounding.
    pub fn all_notes_off(&mut self, allow_tail_off: bool) -> NoteAction {
        if self.held.is_empty() {
            return NoteAction::None;
        }
        self.held.clear();
        NoteAction::Stop { allow_tail_off }
    }

    /// The note that should be sounding: the highest held key.
    pub fn sounding_note(&self) -> Option<u8> {
        self.held.highest()
    }

    /// Currently held keys.
    pub fn held(&self) -> &HeldNotes {
        &self.held
    }

    /// Release all keys and center the wheel.
    pub fn reset(&mut self) {
        self.held.clear();
        self.pitch_wheel = PITCH_WHEEL_CENTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SharedParams;

    #[test]
    fn held_notes_bitset() {
        let mut held = HeldNotes::new();
        assert!(held.insert(0));
        assert!(held.insert(127));
        assert!(!held.insert(127));
        assert!(!held.insert(128));
        assert_eq!(held.highest(), Some(127));
        assert_eq!(held.len(), 2);
        assert_eq!(held.iter().collect::<Vec<_>>(), vec![0, 127]);
        assert!(held.remove(127));
        assert!(!held.remove(127));
        assert_eq!(held.highest(), Some(0));
    }

    #[test]
    fn first_note_starts_with_stored_wheel() {
        let mut notes = NoteManager::new();
        notes.pitch_wheel(10000, &());
        assert_eq!(
            notes.note_on(48, 0.5),
            NoteAction::Start {
                pitch: 48,
                velocity: 0.5,
                pitch_wheel: 10000
            }
        );
    }

    #[test]
    fn higher_note_takes_over_lower_does_not() {
        let mut notes = NoteManager::new();
        notes.note_on(60, 1.0);
        assert_eq!(notes.note_on(55, 1.0), NoteAction::None);
        assert_eq!(notes.sounding_note(), Some(60));
        assert_eq!(notes.note_on(67, 1.0), NoteAction::Change(67));
        assert_eq!(notes.note_off(55), NoteAction::None);
        assert_eq!(notes.note_off(67), NoteAction::Change(60));
    }

    #[test]
    fn duplicates_and_unheld_releases_are_ignored() {
        let mut notes = NoteManager::new();
        notes.note_on(60, 1.0);
        assert_eq!(notes.note_on(60, 1.0), NoteAction::None);
        assert_eq!(notes.held().len(), 1);
        assert_eq!(notes.note_off(61), NoteAction::None);
        assert_eq!(
            notes.note_off(60),
            NoteAction::Stop {
                allow_tail_off: true
            }
        );
        assert_eq!(notes.note_off(60), NoteAction::None);
    }

    #[test]
    fn controllers_write_parameters() {
        let shared = SharedParams::new();
        let mut notes = NoteManager::new();
        assert_eq!(notes.control_change(CC_MOD_WHEEL, 127, &shared), NoteAction::None);
        assert_eq!(shared.get(Param::ModDepth), 1.0);
        notes.control_change(CC_BREATH, 0, &shared);
        assert_eq!(shared.get(Param::BreathInput), 0.0);
        notes.pitch_wheel(0, &shared);
        assert_eq!(shared.get(Param::PitchWheel), -1.0);
    }

    #[test]
    fn channel_mode_messages_release() {
        let mut notes = NoteManager::new();
        assert_eq!(notes.control_change(CC_ALL_NOTES_OFF, 0, &()), NoteAction::None);
        notes.note_on(60, 1.0);
        notes.note_on(62, 1.0);
        assert_eq!(
            notes.control_change(CC_ALL_SOUND_OFF, 0, &()),
            NoteAction::Stop {
                allow_tail_off: false
            }
        );
        assert!(notes.held().is_empty());
    }

    #[test]
    fn all_sound_off_stops_with_nothing_held() {
        let mut notes = NoteManager::new();
        notes.note_on(60, 1.0);
        notes.note_off(60);
        assert_eq!(
            notes.control_change(CC_ALL_SOUND_OFF, 0, &()),
            NoteAction::Stop {
                allow_tail_off: false
            }
        );
    }
}
