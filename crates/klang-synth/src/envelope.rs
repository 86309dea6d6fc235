//! Gate-driven ADSR envelope.
//!
//! Each voice runs two of these: one for amplitude, one for filter cutoff.
//! The gate is sampled every tick; edges move the state machine (rising
//! edge → attack, falling edge → release) so the engine can drive both
//! envelopes with the voice's single `internal_gate` value.
//!
//! Segment times are in seconds and may change every sample — the decay
//! and sustain inputs are LFO-modulated — so each setter caches its value
//! and only recomputes the exponential coefficient when the value moves.
//!
//! Segment scaling: a time parameter is the time the segment takes to
//! *complete*, not one time constant. Release reaches the -100 dB idle
//! threshold after `release` seconds; decay settles to sustain after
//! `decay` seconds; attack hits peak after `attack` seconds (the attack
//! runs toward an overshoot target above 1.0 so the rise actually
//! terminates).

use libm::expf;

/// Level below which a releasing envelope is considered finished.
const RELEASE_THRESHOLD: f32 = 1e-5;

/// Distance from sustain at which decay snaps to the sustain stage.
const DECAY_THRESHOLD: f32 = 1e-4;

/// Attack overshoot target. The attack one-pole aims here and is clipped
/// at 1.0, giving the rise a defined end point.
const ATTACK_TARGET: f32 = 1.2;

/// ln(ATTACK_TARGET / (ATTACK_TARGET - 1)): time-scale factor making the
/// attack parameter the 0 → 1 rise time.
const ATTACK_LOG_RANGE: f32 = 1.791_759_5;

/// ln(1 / DECAY_THRESHOLD): decay parameter = settle time.
const DECAY_LOG_RANGE: f32 = 9.210_34;

/// ln(1 / RELEASE_THRESHOLD): release parameter = time to the idle
/// threshold.
const RELEASE_LOG_RANGE: f32 = 11.512_925;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum AdsrStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR envelope gated by a 0/1 signal sampled per tick.
#[derive(Debug, Clone)]
pub struct GatedAdsr {
    sample_rate: f32,
    attack_s: f32,
    decay_s: f32,
    sustain: f32,
    release_s: f32,
    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
    stage: AdsrStage,
    level: f32,
    prev_gate: f32,
}

impl GatedAdsr {
    /// Create an idle envelope.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            sample_rate,
            attack_s: -1.0,
            decay_s: -1.0,
            sustain: 0.8,
            release_s: -1.0,
            attack_coeff: 0.0,
            decay_coeff: 0.0,
            release_coeff: 0.0,
            stage: AdsrStage::Idle,
            level: 0.0,
            prev_gate: 0.0,
        };
        env.set_attack(0.05);
        env.set_decay(0.005);
        env.set_release(0.05);
        env
    }

    /// Set attack time in seconds. No-op when unchanged.
    #[inline]
    pub fn set_attack(&mut self, seconds: f32) {
        if seconds == self.attack_s {
            return;
        }
        self.attack_s = seconds;
        self.attack_coeff = segment_coeff(seconds, self.sample_rate, ATTACK_LOG_RANGE);
    }

    /// Set decay time in seconds. No-op when unchanged.
    #[inline]
    pub fn set_decay(&mut self, seconds: f32) {
        if seconds == self.decay_s {
            return;
        }
        self.decay_s = seconds;
        self.decay_coeff = segment_coeff(seconds, self.sample_rate, DECAY_LOG_RANGE);
    }

    /// Set sustain level [0, 1].
    #[inline]
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = level;
    }

    /// Set release time in seconds. No-op when unchanged.
    #[inline]
    pub fn set_release(&mut self, seconds: f32) {
        if seconds == self.release_s {
            return;
        }
        self.release_s = seconds;
        self.release_coeff = segment_coeff(seconds, self.sample_rate, RELEASE_LOG_RANGE);
    }

    /// Current output level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True while the envelope is producing output.
    pub fn is_active(&self) -> bool {
        self.stage != AdsrStage::Idle
    }

    /// Force the envelope back to idle with zero output.
    pub fn reset(&mut self) {
        self.stage = AdsrStage::Idle;
        self.level = 0.0;
        self.prev_gate = 0.0;
    }

    /// Advance one sample with the given gate value and return the level.
    ///
    /// A rising gate edge enters attack from the current level (smooth
    /// retrigger); a falling edge enters release.
    #[inline]
    pub fn tick(&mut self, gate: f32) -> f32 {
        if gate > 0.5 && self.prev_gate <= 0.5 {
            self.stage = AdsrStage::Attack;
        } else if gate <= 0.5 && self.prev_gate > 0.5 && self.stage != AdsrStage::Idle {
            self.stage = AdsrStage::Release;
        }
        self.prev_gate = gate;

        match self.stage {
            AdsrStage::Idle => {
                self.level = 0.0;
            }
            AdsrStage::Attack => {
                self.level = ATTACK_TARGET + (self.level - ATTACK_TARGET) * self.attack_coeff;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = AdsrStage::Decay;
                }
            }
            AdsrStage::Decay => {
                self.level = self.sustain + (self.level - self.sustain) * self.decay_coeff;
                if (self.level - self.sustain).abs() < DECAY_THRESHOLD {
                    self.level = self.sustain;
                    self.stage = AdsrStage::Sustain;
                }
            }
            AdsrStage::Sustain => {
                self.level = self.sustain;
            }
            AdsrStage::Release => {
                self.level *= self.release_coeff;
                if self.level < RELEASE_THRESHOLD {
                    self.level = 0.0;
                    self.stage = AdsrStage::Idle;
                }
            }
        }

        self.level
    }
}

/// One-pole coefficient for a segment that completes in `seconds`.
///
/// `log_range` is the natural log of the level ratio the segment spans.
#[inline]
fn segment_coeff(seconds: f32, sample_rate: f32, log_range: f32) -> f32 {
    let samples = (seconds * sample_rate).max(1.0);
    expf(-log_range / samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_outputs_zero() {
        let mut env = GatedAdsr::new(44100.0);
        for _ in 0..100 {
            assert_eq!(env.tick(0.0), 0.0);
        }
        assert!(!env.is_active());
    }

    #[test]
    fn attack_reaches_peak_in_configured_time() {
        let sr = 44100.0;
        let mut env = GatedAdsr::new(sr);
        env.set_attack(0.01);
        let mut samples_to_peak = 0;
        for i in 0..(sr as usize) {
            env.tick(1.0);
            if env.level() >= 1.0 {
                samples_to_peak = i;
                break;
            }
        }
        let expected = (0.01 * sr) as i64;
        assert!(
            (samples_to_peak as i64 - expected).abs() < expected / 3 + 8,
            "peak at {samples_to_peak}, expected ~{expected}"
        );
    }

    #[test]
    fn decays_to_sustain() {
        let mut env = GatedAdsr::new(44100.0);
        env.set_attack(0.001);
        env.set_decay(0.01);
        env.set_sustain(0.5);
        let mut out = 0.0;
        for _ in 0..4410 {
            out = env.tick(1.0);
        }
        assert!((out - 0.5).abs() < 0.01, "expected sustain 0.5, got {out}");
    }

    #[test]
    fn release_hits_threshold_in_configured_time() {
        let sr = 44100.0;
        let mut env = GatedAdsr::new(sr);
        env.set_attack(0.001);
        env.set_decay(0.001);
        env.set_sustain(1.0);
        env.set_release(0.004);
        for _ in 0..441 {
            env.tick(1.0);
        }
        let mut samples_to_idle = 0;
        for i in 0..(sr as usize) {
            env.tick(0.0);
            if !env.is_active() {
                samples_to_idle = i;
                break;
            }
        }
        // 0.004 s at 44.1 kHz is ~176 samples
        assert!(
            samples_to_idle < 220,
            "release took {samples_to_idle} samples"
        );
        assert!(samples_to_idle > 80, "release unrealistically fast");
    }

    #[test]
    fn retrigger_preserves_level() {
        let mut env = GatedAdsr::new(44100.0);
        env.set_attack(0.05);
        for _ in 0..400 {
            env.tick(1.0);
        }
        let before = env.level();
        // Gate off for one sample, back on: level continues from where the
        // release left it, no reset to zero.
        env.tick(0.0);
        let after_release_tick = env.level();
        env.tick(1.0);
        assert!(after_release_tick > 0.0);
        assert!(env.level() <= before + 1e-3);
        assert!(env.level() > after_release_tick * 0.9);
    }

    #[test]
    fn output_bounded_through_full_cycle() {
        let mut env = GatedAdsr::new(44100.0);
        env.set_attack(0.002);
        env.set_decay(0.01);
        env.set_sustain(0.6);
        env.set_release(0.02);
        for _ in 0..2000 {
            let v = env.tick(1.0);
            assert!((0.0..=1.0).contains(&v), "level out of range: {v}");
        }
        for _ in 0..5000 {
            let v = env.tick(0.0);
            assert!((0.0..=1.0).contains(&v), "release level out of range: {v}");
        }
        assert!(!env.is_active());
    }
}
