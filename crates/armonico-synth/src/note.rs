//! Note events.

use armonico_core::midi_to_freq;

/// A note event handed to the engine.
///
/// Sequencers emit a stream of these, most of which are [`Note::None`]
/// placeholder ticks; the engine must treat those as strict no-ops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Note {
    /// No event. Leaves all voices untouched.
    #[default]
    None,
    /// Release the most recently triggered voice.
    Off,
    /// Trigger a MIDI note (0..=127).
    Midi(u8),
}

impl Note {
    /// Frequency of the note in Hz, if it carries a pitch.
    pub fn frequency(self) -> Option<f32> {
        match self {
            Note::Midi(n) => Some(midi_to_freq(n)),
            Note::None | Note::Off => None,
        }
    }
}
