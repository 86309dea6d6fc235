//! Property-based tests for the engine's invariants.

use klang_synth::{midi, Engine, EqualTemperament, MidiMessage, Param, PARAM_COUNT, MAX_POLYPHONY};
use proptest::prelude::*;

fn engine() -> Engine {
    Engine::new(Box::new(EqualTemperament))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After any write, every parameter reads back inside its range.
    #[test]
    fn parameter_reads_stay_in_range(
        index in 0usize..PARAM_COUNT,
        value in prop::num::f32::NORMAL,
    ) {
        let engine = engine();
        let param = Param::from_index(index).unwrap();
        engine.set_parameter(param, value);
        let spec = param.spec();
        let read = engine.get_parameter(param);
        prop_assert!(
            spec.min <= read && read <= spec.max,
            "{} = {read} outside [{}, {}]", spec.key, spec.min, spec.max
        );
    }

    /// No sequence of note-ons can exceed the polyphony limit.
    #[test]
    fn polyphony_limit_holds(notes in prop::collection::vec(0u8..128, 1..64)) {
        let mut engine = engine();
        for &note in &notes {
            engine.note_on(note, 100);
            prop_assert!(engine.active_voice_count() <= MAX_POLYPHONY);
        }
    }

    /// Matched note-on/note-off pairs eventually free every voice slot.
    #[test]
    fn note_round_trip_frees_all_voices(notes in prop::collection::vec(20u8..100, 1..12)) {
        let mut engine = engine();
        engine.set_parameter(Param::ReleaseDuration, 0.004);
        for &note in &notes {
            engine.note_on(note, 100);
        }
        for &note in &notes {
            engine.note_off(note);
        }
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        for _ in 0..10 {
            engine.process(&mut left, &mut right);
        }
        prop_assert_eq!(engine.active_voice_count(), 0);
        prop_assert!(engine.voices().iter().all(|v| v.root_note == -1));
    }

    /// The held registry never contains duplicates and stays MRU-ordered.
    #[test]
    fn held_registry_no_duplicates(
        events in prop::collection::vec((0u8..128, prop::bool::ANY), 1..64),
    ) {
        let mut engine = engine();
        for &(note, down) in &events {
            if down {
                engine.note_on(note, 64);
            } else {
                engine.note_off(note);
            }
            let held = engine.held_notes();
            let mut sorted: Vec<u8> = held.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), held.len(), "duplicate in registry");
        }
    }

    /// The MIDI decoder never panics and never emits out-of-range notes.
    #[test]
    fn midi_decode_total(data in prop::array::uniform3(0u8..=255)) {
        match midi::decode(data) {
            Some(MidiMessage::NoteOn { note, velocity }) => {
                prop_assert!(note < 128 && velocity < 128);
            }
            Some(MidiMessage::NoteOff { note }) => prop_assert!(note < 128),
            Some(MidiMessage::AllNotesOff) | None => {}
        }
    }

    /// Rendering stays finite for arbitrary parameter settings.
    #[test]
    fn process_output_finite_under_random_params(
        cutoff in 256.0f32..28000.0,
        resonance in 0.0f32..0.75,
        fm in 0.0f32..15.0,
        filter_type in 0.0f32..=2.0,
        note in 30u8..100,
    ) {
        let mut engine = engine();
        engine.set_parameter(Param::Cutoff, cutoff);
        engine.set_parameter(Param::Resonance, resonance);
        engine.set_parameter(Param::FmAmount, fm);
        engine.set_parameter(Param::FmVolume, 0.5);
        engine.set_parameter(Param::FilterType, filter_type);
        engine.note_on(note, 127);

        let mut left = vec![0.0f32; 1024];
        let mut right = vec![0.0f32; 1024];
        engine.process(&mut left, &mut right);
        prop_assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    }
}
