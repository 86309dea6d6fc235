//! Bitcrusher: sample-rate reduction and bit-depth quantization.
//!
//! Two independent degradations:
//!
//! - **Bit depth**: amplitude is rounded to the nearest of `2^bits`
//!   quantization levels (mid-tread), adding broadband quantization noise.
//! - **Sample rate**: the input is latched through a zero-order hold
//!   clocked at a target rate in Hz, folding high frequencies back into the
//!   audible band.
//!
//! The hold clock is a fractional accumulator, so non-integer ratios of
//! engine rate to crush rate stay evenly spaced.

use klang_core::Effect;
use libm::{floorf, powf};

/// Lo-fi sample-rate / bit-depth reduction.
#[derive(Debug, Clone)]
pub struct Bitcrusher {
    sample_rate: f32,
    /// Target hold clock rate in Hz.
    crush_rate: f32,
    /// Quantizer resolution in bits.
    bit_depth: f32,
    /// Currently held output sample.
    held: f32,
    /// Fractional hold-clock accumulator.
    counter: f32,
}

impl Bitcrusher {
    /// Create a transparent crusher (full rate, 24 bits).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            crush_rate: sample_rate,
            bit_depth: 24.0,
            held: 0.0,
            counter: 1.0, // latch on the first sample
        }
    }

    /// Set the hold clock rate in Hz. Values at or above the engine rate
    /// disable rate reduction.
    pub fn set_crush_rate(&mut self, rate_hz: f32) {
        self.crush_rate = rate_hz.clamp(1.0, self.sample_rate);
    }

    /// Current hold clock rate in Hz.
    pub fn crush_rate(&self) -> f32 {
        self.crush_rate
    }

    /// Set quantizer resolution in bits (1-24).
    pub fn set_bit_depth(&mut self, bits: f32) {
        self.bit_depth = bits.clamp(1.0, 24.0);
    }

    /// Current quantizer resolution in bits.
    pub fn bit_depth(&self) -> f32 {
        self.bit_depth
    }

    /// Mid-tread quantization to `bits` of resolution.
    #[inline]
    fn quantize(sample: f32, bits: f32) -> f32 {
        let levels = powf(2.0, bits);
        floorf(sample * levels + 0.5) / levels
    }
}

impl Effect for Bitcrusher {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.counter += self.crush_rate / self.sample_rate;
        if self.counter >= 1.0 {
            self.counter -= 1.0;
            self.held = Self::quantize(input, self.bit_depth);
        }
        self.held
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.crush_rate = self.crush_rate.min(sample_rate);
    }

    fn reset(&mut self) {
        self.held = 0.0;
        self.counter = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rate_high_depth_is_near_transparent() {
        let mut crusher = Bitcrusher::new(44100.0);
        crusher.set_crush_rate(44100.0);
        crusher.set_bit_depth(24.0);
        let input = 0.123_456;
        let out = crusher.process(input);
        assert!((out - input).abs() < 1e-4, "expected transparency, got {out}");
    }

    #[test]
    fn one_bit_quantization_snaps_to_levels() {
        // 1 bit: levels = 2, step 0.5
        assert!((Bitcrusher::quantize(0.9, 1.0) - 1.0).abs() < 1e-6);
        assert!(Bitcrusher::quantize(0.1, 1.0).abs() < 1e-6);
        assert!((Bitcrusher::quantize(-0.9, 1.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn reduced_rate_holds_samples() {
        let mut crusher = Bitcrusher::new(44100.0);
        crusher.set_crush_rate(11025.0); // hold 4 samples
        crusher.set_bit_depth(24.0);
        crusher.reset();

        let outputs: Vec<f32> = (0..12).map(|i| crusher.process(i as f32 * 0.05)).collect();
        let repeats = outputs
            .windows(2)
            .filter(|w| (w[0] - w[1]).abs() < 1e-9)
            .count();
        assert!(repeats >= 6, "expected held samples, got {outputs:?}");
    }

    #[test]
    fn reset_clears_held_state() {
        let mut crusher = Bitcrusher::new(44100.0);
        crusher.set_crush_rate(4410.0);
        for _ in 0..20 {
            crusher.process(0.7);
        }
        crusher.reset();
        // First sample after reset latches the new input immediately
        assert_eq!(crusher.process(0.25), Bitcrusher::quantize(0.25, 24.0));
    }
}
