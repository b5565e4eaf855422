//! MIDI events consumed by the voice.
//!
//! Only the channel-voice messages the voice reacts to are modeled. Raw
//! bytes can be parsed with [`MidiEvent::from_bytes`]; channel numbers are
//! ignored since the voice listens on all channels.

/// Pitch-wheel rest position.
pub const PITCH_WHEEL_CENTER: u16 = 8192;
/// Largest 14-bit pitch-wheel value.
pub const PITCH_WHEEL_MAX: u16 = 16383;

/// A MIDI message the voice understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEvent {
    /// Key pressed. Velocity is normalized to 0..1.
    NoteOn {
        /// MIDI note number 0..127.
        pitch: u8,
        /// Normalized velocity.
        velocity: f32,
    },
    /// Key released.
    NoteOff {
        /// MIDI note number 0..127.
        pitch: u8,
    },
    /// Continuous controller.
    ControlChange {
        /// Controller number 0..127.
        controller: u8,
        /// Raw 7-bit value.
        value: u8,
    },
    /// 14-bit pitch wheel, center 8192.
    PitchWheel(u16),
}

impl MidiEvent {
    /// Parse a 3-byte channel-voice message.
    ///
    /// Note-on with velocity zero is a note-off. Returns `None` for anything
    /// the voice does not handle or for short input.
    ///
    /// ```rust
    /// use voltage_synth::MidiEvent;
    ///
    /// assert_eq!(MidiEvent::from_bytes(&[0x90, 60, 0]), Some(MidiEvent::NoteOff { pitch: 60 }));
    /// assert_eq!(MidiEvent::from_bytes(&[0xE0, 0x00, 0x40]), Some(MidiEvent::PitchWheel(8192)));
    /// assert_eq!(MidiEvent::from_bytes(&[0xF8]), None);
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &[status, data1, data2, ..] = bytes else {
            return None;
        };
        let data1 = data1 & 0x7F;
        let data2 = data2 & 0x7F;
        match status & 0xF0 {
            0x80 => Some(MidiEvent::NoteOff { pitch: data1 }),
            0x90 if data2 == 0 => Some(MidiEvent::NoteOff { pitch: data1 }),
            0x90 => Some(MidiEvent::NoteOn {
                pitch: data1,
                velocity: f32::from(data2) / 127.0,
            }),
            0xB0 => Some(MidiEvent::ControlChange {
                controller: data1,
                value: data2,
            }),
            0xE0 => Some(MidiEvent::PitchWheel(
                (u16::from(data2) << 7) | u16::from(data1),
            )),
            _ => None,
        }
    }
}

/// An event positioned within the current block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Sample offset from the start of the block.
    pub offset: usize,
    /// The event.
    pub event: MidiEvent,
}

impl TimedEvent {
    /// Event at `offset`.
    pub fn new(offset: usize, event: MidiEvent) -> Self {
        Self { offset, event }
    }
}

/// Normalize a 14-bit wheel value to `[-1, 1]` with 8192 at zero.
#[inline]
pub fn normalize_pitch_wheel(value: u16) -> f32 {
    let v = value.min(PITCH_WHEEL_MAX);
    if v >= PITCH_WHEEL_CENTER {
        f32::from(v - PITCH_WHEEL_CENTER) / f32::from(PITCH_WHEEL_MAX - PITCH_WHEEL_CENTER)
    } else {
        -f32::from(PITCH_WHEEL_CENTER - v) / f32::from(PITCH_WHEEL_CENTER)
    }
}

/// Bend in semitones for a wheel value, using separate up and down ranges.
#[inline]
pub fn pitch_wheel_to_bend(value: u16, up_range: f32, down_range: f32) -> f32 {
    let n = normalize_pitch_wheel(value);
    if n >= 0.0 { n * up_range } else { n * down_range }
}
