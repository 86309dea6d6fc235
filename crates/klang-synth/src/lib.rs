//! Klang Synth - realtime polyphonic wavetable/FM subtractive synthesizer
//! engine
//!
//! The engine consumes note events and a flat parameter vector and renders
//! a stereo stream at 44.1 kHz. Six polyphonic voices (plus a dedicated
//! mono voice with portamento, legato, and come-and-come-again hand-off)
//! each run two morphing wavetable oscillators, a sub oscillator, an FM
//! oscillator, a noise source, three filter types, and twin ADSRs. A
//! tempo-driven arpeggiator/step-sequencer keys synthetic notes inside the
//! render loop, and the summed voice bus passes through bitcrush, autopan,
//! phaser, ping-pong delay, reverb, and compression.
//!
//! # Threads
//!
//! Exactly two: a control thread (host parameters, MIDI) and the audio
//! thread calling [`Engine::process`]. The [`Controller`] handle carries
//! the control side's whole API; the shared parameter vector is atomic
//! per slot, note events travel over a bounded lock-free queue, and the
//! audio thread reports back through [`EngineNotification`] values. The
//! audio thread never blocks and never allocates.
//!
//! # Example
//!
//! ```rust
//! use klang_synth::{Engine, EqualTemperament, Param};
//!
//! let mut engine = Engine::new(Box::new(EqualTemperament));
//! let controller = engine.controller();
//!
//! controller.set_parameter(Param::Cutoff, 4000.0);
//! controller.note_on(60, 100);
//!
//! // On the audio thread:
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! engine.process(&mut left, &mut right);
//! ```

pub mod arp;
pub mod bridge;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod midi;
pub mod osc;
pub mod params;
pub mod tuning;
pub mod voice;

// Re-export main types at crate root
pub use bridge::{Controller, EngineCommand, EngineNotification};
pub use engine::{
    Engine, DELAY_TIME_FLOOR, MAX_POLYPHONY, NUM_MIDI_NOTES, RELEASE_AMPLITUDE_THRESHOLD,
    SAMPLE_RATE,
};
pub use envelope::GatedAdsr;
pub use error::EngineError;
pub use midi::MidiMessage;
pub use params::{Param, ParamBank, ParamSpec, Params, PARAM_COUNT};
pub use tuning::{EqualTemperament, Tuning};
pub use voice::{Voice, VoiceStage};
