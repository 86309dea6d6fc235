//! MIDI ingress: 3-byte message decode.
//!
//! The engine understands note on, note off, and CC 123 (all notes off).
//! A note-on with velocity 0 is treated as a note-on at zero velocity,
//! not as an implicit note-off. Everything else is ignored.

/// Decoded MIDI message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    /// Key pressed.
    NoteOn {
        /// MIDI note number, 0..128.
        note: u8,
        /// Velocity, 0..128. Zero is a valid (silent) note-on.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// MIDI note number, 0..128.
        note: u8,
    },
    /// CC 123: release every held note.
    AllNotesOff,
}

/// Decode a 3-byte MIDI message. Returns `None` for anything the engine
/// does not handle, including data bytes with the high bit set.
pub fn decode(data: [u8; 3]) -> Option<MidiMessage> {
    match data[0] & 0xF0 {
        0x80 => {
            let note = data[1];
            if note > 127 {
                return None;
            }
            Some(MidiMessage::NoteOff { note })
        }
        0x90 => {
            let note = data[1];
            let velocity = data[2];
            if note > 127 || velocity > 127 {
                return None;
            }
            Some(MidiMessage::NoteOn { note, velocity })
        }
        0xB0 => {
            if data[1] == 123 {
                Some(MidiMessage::AllNotesOff)
            } else {
                None
            }
        }
        _ => None,
    }
}
