//! Stereo phaser: cascaded first-order allpass stages swept by an LFO.
//!
//! Each allpass contributes 180 degrees of phase shift at its center
//! frequency; summing with the dry path (done by the engine's crossfade)
//! carves sweeping notches. The sweep runs from a fixed 100 Hz base up to
//! `base + notch width`, driven by a sine LFO whose rate is specified in
//! beats per minute. Feedback from the last stage back into the first
//! deepens the notches.

use klang_core::{flush_denormal, Effect};
use libm::{sinf, tanf};

/// Number of allpass stages per channel.
const STAGES: usize = 6;

/// Lowest notch center frequency in Hz.
const SWEEP_BASE_HZ: f32 = 100.0;

/// Samples between allpass coefficient updates. The sweep still sounds
/// continuous at this decimation and it saves most of the tan() work.
const COEFF_UPDATE_INTERVAL: u32 = 32;

/// First-order allpass section: `y[n] = a·x[n] + x[n-1] - a·y[n-1]`.
#[derive(Debug, Clone, Copy, Default)]
struct AllpassStage {
    a: f32,
    x1: f32,
    y1: f32,
}

impl AllpassStage {
    #[inline]
    fn set_frequency(&mut self, freq: f32, sample_rate: f32) {
        let freq = freq.clamp(10.0, sample_rate * 0.45);
        let t = tanf(core::f32::consts::PI * freq / sample_rate);
        self.a = (t - 1.0) / (t + 1.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.a * input + self.x1 - self.a * self.y1;
        self.x1 = input;
        self.y1 = flush_denormal(output);
        output
    }

    fn clear(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// LFO-swept allpass phaser. Output is fully wet; the engine crossfades
/// against the dry signal.
#[derive(Debug, Clone)]
pub struct Phaser {
    stages_l: [AllpassStage; STAGES],
    stages_r: [AllpassStage; STAGES],
    sample_rate: f32,
    /// Sweep LFO phase [0, 1).
    lfo_phase: f32,
    /// Sweep LFO rate in beats per minute.
    rate_bpm: f32,
    /// Sweep span above the 100 Hz base, in Hz.
    notch_width: f32,
    /// Feedback from the last stage into the first, per channel.
    feedback: f32,
    feedback_l: f32,
    feedback_r: f32,
    coeff_counter: u32,
}

impl Phaser {
    /// Create a phaser with the engine's fixed sweep base.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stages_l: [AllpassStage::default(); STAGES],
            stages_r: [AllpassStage::default(); STAGES],
            sample_rate,
            lfo_phase: 0.0,
            rate_bpm: 30.0,
            notch_width: 800.0,
            feedback: 0.0,
            feedback_l: 0.0,
            feedback_r: 0.0,
            coeff_counter: 0,
        }
    }

    /// Set the sweep rate in beats per minute.
    pub fn set_rate_bpm(&mut self, bpm: f32) {
        self.rate_bpm = bpm.clamp(1.0, 600.0);
    }

    /// Set the sweep span above the base frequency, in Hz.
    pub fn set_notch_width(&mut self, width_hz: f32) {
        self.notch_width = width_hz.clamp(10.0, 5000.0);
    }

    /// Set feedback gain [0, 0.95].
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    /// Recompute every stage's coefficient for the current sweep position.
    fn update_coefficients(&mut self) {
        let sweep = 0.5 * (1.0 + sinf(self.lfo_phase * core::f32::consts::TAU));
        let center = SWEEP_BASE_HZ + sweep * self.notch_width;
        for i in 0..STAGES {
            // Spread stages across a small interval around the center so
            // the notches don't collapse onto each other.
            let freq = center * (1.0 + i as f32 * 0.12);
            self.stages_l[i].set_frequency(freq, self.sample_rate);
            self.stages_r[i].set_frequency(freq, self.sample_rate);
        }
    }
}

impl Effect for Phaser {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        if self.coeff_counter == 0 {
            self.update_coefficients();
            self.coeff_counter = COEFF_UPDATE_INTERVAL;
        }
        self.coeff_counter -= 1;

        self.lfo_phase += self.rate_bpm / 60.0 / self.sample_rate;
        if self.lfo_phase >= 1.0 {
            self.lfo_phase -= 1.0;
        }

        let mut l = left + self.feedback_l * self.feedback;
        let mut r = right + self.feedback_r * self.feedback;
        for i in 0..STAGES {
            l = self.stages_l[i].process(l);
            r = self.stages_r[i].process(r);
        }
        self.feedback_l = flush_denormal(l);
        self.feedback_r = flush_denormal(r);
        (l, r)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.coeff_counter = 0;
    }

    fn reset(&mut self) {
        for stage in self.stages_l.iter_mut().chain(self.stages_r.iter_mut()) {
            stage.clear();
        }
        self.lfo_phase = 0.0;
        self.feedback_l = 0.0;
        self.feedback_r = 0.0;
        self.coeff_counter = 0;
    }
}
