//! Control-thread ↔ audio-thread bridge.
//!
//! Two bounded lock-free channels plus the shared atomic parameter bank:
//!
//! - control → audio: [`EngineCommand`] values (note events, panic,
//!   resets), drained by the engine without blocking at the start of
//!   every `process` call;
//! - audio → control: [`EngineNotification`] values, posted with
//!   `try_send` so a full queue drops the notification instead of ever
//!   blocking the audio thread.
//!
//! [`Controller`] is the control thread's handle: parameter access, note
//! and MIDI ingress, and notification polling.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::midi::{self, MidiMessage};
use crate::params::{Param, ParamBank};

/// Command queue depth. Far above what one buffer of MIDI produces.
pub(crate) const COMMAND_QUEUE_DEPTH: usize = 256;

/// Notification queue depth. Losing a stale notification is harmless —
/// the control side re-reads state when it drains.
pub(crate) const NOTIFY_QUEUE_DEPTH: usize = 64;

/// Messages from the control thread into the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// Key pressed.
    NoteOn {
        /// MIDI note number.
        note: u8,
        /// Velocity; 0 is a valid silent note-on.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// MIDI note number.
        note: u8,
    },
    /// Release every held note smoothly (CC 123 path).
    StopAllNotes,
    /// Hard-reset the engine: clear all voices and arp state. May click.
    Reset,
    /// Rewind the arp/seq clock and beat counter to zero.
    ResetSequencer,
}

/// Messages from the audio thread back to the control thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineNotification {
    /// The arp/seq beat counter changed; payload is the new value.
    BeatCounterChanged(u32),
    /// A voice started, stopped, or was retired.
    PlayingNotesChanged,
    /// The held-note registry changed.
    HeldNotesChanged,
}

/// Control-thread handle to a running engine.
///
/// Cheap to clone; all clones share the same parameter bank and queues.
#[derive(Clone)]
pub struct Controller {
    pub(crate) params: Arc<ParamBank>,
    pub(crate) commands: Sender<EngineCommand>,
    pub(crate) notifications: Receiver<EngineNotification>,
}

impl Controller {
    /// Clamped parameter write.
    pub fn set_parameter(&self, param: Param, value: f32) {
        self.params.set(param, value);
    }

    /// Clamped parameter write by slot index.
    pub fn set_parameter_by_index(&self, index: usize, value: f32) {
        self.params.set_by_index(index, value);
    }

    /// Raw parameter read.
    pub fn get_parameter(&self, param: Param) -> f32 {
        self.params.get(param)
    }

    /// Bulk unclamped parameter write (preset restore fast path).
    pub fn set_parameters(&self, values: &[f32]) {
        self.params.set_all(values);
    }

    /// Key a note on.
    pub fn note_on(&self, note: u8, velocity: u8) {
        self.send(EngineCommand::NoteOn { note, velocity });
    }

    /// Key a note off.
    pub fn note_off(&self, note: u8) {
        self.send(EngineCommand::NoteOff { note });
    }

    /// Release all held notes without artifacts.
    pub fn stop_all_notes(&self) {
        self.send(EngineCommand::StopAllNotes);
    }

    /// Hard-reset the engine. May click.
    pub fn reset(&self) {
        self.send(EngineCommand::Reset);
    }

    /// Rewind the arp/seq clock.
    pub fn reset_sequencer(&self) {
        self.send(EngineCommand::ResetSequencer);
    }

    /// Feed a raw 3-byte MIDI message through the decoder.
    pub fn handle_midi(&self, data: [u8; 3]) {
        match midi::decode(data) {
            Some(MidiMessage::NoteOn { note, velocity }) => self.note_on(note, velocity),
            Some(MidiMessage::NoteOff { note }) => self.note_off(note),
            Some(MidiMessage::AllNotesOff) => self.stop_all_notes(),
            None => {}
        }
    }

    /// Pop the next pending notification, if any. Drain in a loop.
    pub fn poll_notification(&self) -> Option<EngineNotification> {
        self.notifications.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.try_send(command).is_err() {
            log::warn!("engine command queue full, dropping {command:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn test_controller() -> (Controller, Receiver<EngineCommand>, Sender<EngineNotification>) {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE_DEPTH);
        let (ntf_tx, ntf_rx) = bounded(NOTIFY_QUEUE_DEPTH);
        let controller = Controller {
            params: Arc::new(ParamBank::new()),
            commands: cmd_tx,
            notifications: ntf_rx,
        };
        (controller, cmd_rx, ntf_tx)
    }

    #[test]
    fn midi_routes_to_commands() {
        let (controller, commands, _ntf) = test_controller();
        controller.handle_midi([0x90, 60, 100]);
        controller.handle_midi([0x80, 60, 0]);
        controller.handle_midi([0xB0, 123, 0]);
        assert_eq!(
            commands.try_recv(),
            Ok(EngineCommand::NoteOn {
                note: 60,
                velocity: 100
            })
        );
        assert_eq!(commands.try_recv(), Ok(EngineCommand::NoteOff { note: 60 }));
        assert_eq!(commands.try_recv(), Ok(EngineCommand::StopAllNotes));
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn parameter_roundtrip_is_clamped() {
        let (controller, _cmd, _ntf) = test_controller();
        controller.set_parameter(Param::Cutoff, 1e9);
        assert_eq!(controller.get_parameter(Param::Cutoff), 28000.0);
    }

    #[test]
    fn notifications_drain_in_order() {
        let (controller, _cmd, ntf) = test_controller();
        ntf.try_send(EngineNotification::BeatCounterChanged(3)).unwrap();
        ntf.try_send(EngineNotification::HeldNotesChanged).unwrap();
        assert_eq!(
            controller.poll_notification(),
            Some(EngineNotification::BeatCounterChanged(3))
        );
        assert_eq!(
            controller.poll_notification(),
            Some(EngineNotification::HeldNotesChanged)
        );
        assert_eq!(controller.poll_notification(), None);
    }
}
