//! Feed-forward dynamics compressor.
//!
//! Signal flow:
//!
//! ```text
//! Input → Envelope Follower → Gain Computer → Gain Reduction → Output
//! ```
//!
//! The engine runs one instance per output channel with fixed settings
//! (ratio 10:1, threshold -3 dB, 1 ms attack, 10 ms release) as the final
//! safety stage before the master volume.

use klang_core::{db_to_linear, linear_to_db, Effect, EnvelopeFollower};

/// Static compression curve: threshold + ratio above it.
#[derive(Debug, Clone)]
struct GainComputer {
    threshold_db: f32,
    ratio: f32,
}

impl GainComputer {
    /// Gain reduction in dB (non-positive) for the given input level in dB.
    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        if overshoot <= 0.0 {
            0.0
        } else {
            -(overshoot * (1.0 - 1.0 / self.ratio))
        }
    }
}

/// Peak-detecting compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    follower: EnvelopeFollower,
    gain_computer: GainComputer,
}

impl Compressor {
    /// Create a compressor with the engine's default settings.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            follower: EnvelopeFollower::new(sample_rate, 0.001, 0.01),
            gain_computer: GainComputer {
                threshold_db: -3.0,
                ratio: 10.0,
            },
        }
    }

    /// Set the threshold in dB.
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.gain_computer.threshold_db = threshold_db.clamp(-60.0, 0.0);
    }

    /// Set the compression ratio (1 = no compression).
    pub fn set_ratio(&mut self, ratio: f32) {
        self.gain_computer.ratio = ratio.clamp(1.0, 20.0);
    }

    /// Set the attack time in seconds.
    pub fn set_attack(&mut self, seconds: f32) {
        self.follower.set_attack(seconds);
    }

    /// Set the release time in seconds.
    pub fn set_release(&mut self, seconds: f32) {
        self.follower.set_release(seconds);
    }
}

impl Effect for Compressor {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let envelope = self.follower.process(input);
        let gain_db = self.gain_computer.compute_gain_db(linear_to_db(envelope));
        input * db_to_linear(gain_db)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.follower.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.follower.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_transparent() {
        let mut comp = Compressor::new(44100.0);
        comp.set_threshold_db(-3.0);
        // -20 dB signal, well under threshold
        let input = db_to_linear(-20.0);
        let mut out = 0.0;
        for _ in 0..4410 {
            out = comp.process(input);
        }
        assert!(
            (out - input).abs() < input * 0.05,
            "below-threshold signal should pass, got {out} for {input}"
        );
    }

    #[test]
    fn above_threshold_is_reduced() {
        let mut comp = Compressor::new(44100.0);
        comp.set_threshold_db(-3.0);
        comp.set_ratio(10.0);
        // 0 dB input: 3 dB overshoot compressed 10:1 leaves ~0.3 dB above
        // threshold, i.e. ~-2.7 dB output
        let mut out = 0.0;
        for _ in 0..4410 {
            out = comp.process(1.0);
        }
        let out_db = linear_to_db(out);
        assert!(
            out_db < -2.0 && out_db > -3.5,
            "expected ~-2.7 dB, got {out_db}"
        );
    }

    #[test]
    fn attack_engages_quickly() {
        let mut comp = Compressor::new(44100.0);
        // 1 ms attack at 44.1 kHz is ~44 samples; after 10x that the gain
        // reduction should be fully engaged
        let mut out = 1.0;
        for _ in 0..441 {
            out = comp.process(1.0);
        }
        assert!(out < 0.95, "gain reduction should have engaged, got {out}");
    }
}
