//! Peak envelope follower for dynamics processing.
//!
//! Tracks signal amplitude with separate attack and release time constants.
//! The compressor at the end of the output chain is built on this.

use libm::expf;

/// Peak detector with independent attack/release smoothing.
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_s: f32,
    release_s: f32,
}

impl EnvelopeFollower {
    /// Create with the given attack and release times in seconds.
    pub fn new(sample_rate: f32, attack_s: f32, release_s: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_s: attack_s.max(1e-5),
            release_s: release_s.max(1e-4),
        };
        follower.recalculate();
        follower
    }

    /// Set the attack time in seconds.
    pub fn set_attack(&mut self, seconds: f32) {
        self.attack_s = seconds.max(1e-5);
        self.recalculate();
    }

    /// Set the release time in seconds.
    pub fn set_release(&mut self, seconds: f32) {
        self.release_s = seconds.max(1e-4);
        self.recalculate();
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Process one sample, returning the current envelope level (>= 0).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = level + (self.envelope - level) * coeff;
        self.envelope
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate(&mut self) {
        self.attack_coeff = expf(-1.0 / (self.attack_s * self.sample_rate));
        self.release_coeff = expf(-1.0 / (self.release_s * self.sample_rate));
    }
}
