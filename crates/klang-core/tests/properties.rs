//! Property-based tests for klang-core DSP primitives.
//!
//! Covers filter stability, smoother convergence, delay line integrity, and
//! wavetable lookup bounds using proptest for randomized input generation.

use klang_core::{
    ButterworthBandpass, ButterworthHighpass, DelayLine, Lfo, LfoShape, MoogLadder, Portamento,
    Wavetable, WavetableBank,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Butterworth high-pass stays finite for any valid corner frequency
    /// and bounded input.
    #[test]
    fn butterworth_highpass_stability(
        freq in 20.0f32..20000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut hp = ButterworthHighpass::new(44100.0, freq);
        for &sample in &input {
            let out = hp.process(sample);
            prop_assert!(out.is_finite(), "HP (freq={freq}) produced {out}");
        }
    }

    /// Butterworth band-pass stays finite for any center/bandwidth pair.
    #[test]
    fn butterworth_bandpass_stability(
        freq in 20.0f32..20000.0f32,
        bw in 1.0f32..10000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut bp = ButterworthBandpass::new(44100.0, freq, bw);
        for &sample in &input {
            let out = bp.process(sample);
            prop_assert!(out.is_finite(), "BP (freq={freq}, bw={bw}) produced {out}");
        }
    }

    /// The ladder filter never blows up across its full cutoff/resonance
    /// plane.
    #[test]
    fn ladder_stability(
        cutoff in 20.0f32..18000.0f32,
        res in 0.0f32..=1.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut ladder = MoogLadder::new(44100.0);
        ladder.set_params(cutoff, res);
        for &sample in &input {
            let out = ladder.process(sample);
            prop_assert!(out.is_finite(), "ladder ({cutoff}, {res}) produced {out}");
        }
    }

    /// Portamento output is always between its start value and the target
    /// (monotone approach, no overshoot).
    #[test]
    fn portamento_no_overshoot(
        start in -1000.0f32..1000.0f32,
        target in -1000.0f32..1000.0f32,
        half_time in 0.001f32..0.5f32,
    ) {
        let mut port = Portamento::new(44100.0, half_time, start);
        let (lo, hi) = if start <= target { (start, target) } else { (target, start) };
        for _ in 0..4410 {
            let out = port.advance(target);
            prop_assert!(out >= lo - 1e-3 && out <= hi + 1e-3,
                "smoother left [{lo}, {hi}]: {out}");
        }
    }

    /// LFO output is bounded for every shape and frequency.
    #[test]
    fn lfo_bounded(
        freq in 0.0f32..10.0f32,
        selector in 0.0f32..4.0f32,
    ) {
        let shape = LfoShape::from_selector(selector);
        let mut lfo = Lfo::new(44100.0, freq);
        for _ in 0..4096 {
            let v = lfo.advance(shape);
            prop_assert!((-1.0..=1.0).contains(&v));
        }
    }

    /// A delay line echoes an impulse back exactly at the requested integer
    /// delay.
    #[test]
    fn delay_line_impulse_timing(delay in 1usize..500) {
        let mut line = DelayLine::new(512);
        line.write(1.0);
        for _ in 0..delay - 1 {
            line.write(0.0);
        }
        let out = line.read((delay - 1) as f32);
        prop_assert!((out - 1.0).abs() < 1e-6, "impulse lost at delay {delay}: {out}");
    }

    /// Wavetable lookup never exceeds the amplitude bounds of its contents.
    #[test]
    fn wavetable_lookup_bounded(phase in -10.0f32..10.0f32) {
        let table = Wavetable::sine(4096);
        let v = table.lookup(phase);
        prop_assert!((-1.0001..=1.0001).contains(&v));
    }

    /// Morph lookup interpolates within the range spanned by the bank.
    #[test]
    fn bank_morph_bounded(morph in 0.0f32..=1.0f32, phase in 0.0f32..1.0f32) {
        let bank = WavetableBank::new();
        let v = bank.lookup_morph(morph, phase);
        prop_assert!((-1.0001..=1.0001).contains(&v));
    }
}
