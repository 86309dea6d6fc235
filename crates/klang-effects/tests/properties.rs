//! Property-based tests for the global effects.
//!
//! Every effect must produce finite, bounded output for arbitrary finite
//! input across its full parameter range — `process` in the engine cannot
//! fail, so the chain it drives must not either.

use klang_core::Effect;
use klang_effects::{AutoPan, Bitcrusher, Compressor, FeedbackDelay, Phaser, StereoReverb};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Bitcrusher output is finite and never exceeds the quantizer's top
    /// level for bounded input.
    #[test]
    fn bitcrusher_bounded(
        rate in 1.0f32..44100.0f32,
        bits in 1.0f32..24.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut crusher = Bitcrusher::new(44100.0);
        crusher.set_crush_rate(rate);
        crusher.set_bit_depth(bits);
        for &sample in &input {
            let out = crusher.process(sample);
            prop_assert!(out.is_finite());
            prop_assert!(out.abs() <= 1.5, "crushed output {out} out of bounds");
        }
    }

    /// AutoPan preserves constant power at every frequency/amount pair.
    #[test]
    fn autopan_constant_power(
        freq in 0.0f32..10.0f32,
        amount in 0.0f32..=1.0f32,
    ) {
        let mut pan = AutoPan::new(44100.0);
        pan.set_frequency(freq);
        pan.set_amount(amount);
        for _ in 0..2048 {
            let (l, r) = pan.process(1.0, 1.0);
            prop_assert!((l * l + r * r - 1.0).abs() < 1e-3);
        }
    }

    /// Phaser stays finite across its parameter plane.
    #[test]
    fn phaser_stability(
        bpm in 1.0f32..600.0f32,
        width in 10.0f32..5000.0f32,
        feedback in 0.0f32..0.95f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut phaser = Phaser::new(44100.0);
        phaser.set_rate_bpm(bpm);
        phaser.set_notch_width(width);
        phaser.set_feedback(feedback);
        for &sample in &input {
            let (l, r) = phaser.process_stereo(sample, sample);
            prop_assert!(l.is_finite() && r.is_finite());
        }
    }

    /// Delay output decays (never grows) for feedback < 1.
    #[test]
    fn delay_does_not_diverge(
        time in 0.001f32..1.0f32,
        feedback in 0.0f32..0.95f32,
    ) {
        let mut delay = FeedbackDelay::new(44100.0, 3.1);
        delay.set_time(time);
        delay.set_feedback(feedback);
        delay.process(1.0);
        for _ in 0..44100 {
            let out = delay.process(0.0);
            prop_assert!(out.is_finite());
            prop_assert!(out.abs() <= 1.01, "delay output grew: {out}");
        }
    }

    /// Reverb output is finite for any feedback/cutoff pair.
    #[test]
    fn reverb_stability(
        feedback in 0.0f32..=0.98f32,
        cutoff in 20.0f32..22050.0f32,
    ) {
        let mut reverb = StereoReverb::new(44100.0);
        reverb.set_feedback(feedback);
        reverb.set_lowpass_cutoff(cutoff);
        for i in 0..4096 {
            let x = if i < 64 { 0.5 } else { 0.0 };
            let (l, r) = reverb.process_stereo(x, x);
            prop_assert!(l.is_finite() && r.is_finite());
        }
    }

    /// Compressor never amplifies (no makeup gain in this design).
    #[test]
    fn compressor_never_amplifies(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut comp = Compressor::new(44100.0);
        for &sample in &input {
            let out = comp.process(sample);
            prop_assert!(out.is_finite());
            prop_assert!(out.abs() <= sample.abs() + 1e-6,
                "compressor amplified {sample} to {out}");
        }
    }
}
