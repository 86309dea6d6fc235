//! Four-stage Moog-style ladder low-pass filter.
//!
//! Huovilainen's nonlinear model of the Moog transistor ladder: four
//! cascaded one-pole stages with tanh saturation, a global resonance
//! feedback tap, and 2x oversampling of the loop for stability at high
//! cutoff. Resonance is normalized to [0, 1]; self-oscillation begins
//! near the top of the range.
//!
//! Reference: Huovilainen, "Non-linear digital implementation of the Moog
//! ladder filter", DAFx 2004.

use libm::{expf, tanhf};

/// Thermal voltage scaling constant from the Huovilainen model.
const THERMAL: f32 = 0.000025;

/// Resonant four-stage ladder low-pass.
#[derive(Debug, Clone)]
pub struct MoogLadder {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    /// Tuned feedback amount (resonance corrected by acr).
    res_quad: f32,
    /// Stage gain.
    tune: f32,
    stage: [f32; 4],
    stage_tanh: [f32; 3],
    delay: [f32; 6],
}

impl MoogLadder {
    /// Create a ladder filter at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let mut ladder = Self {
            sample_rate,
            cutoff: 0.0,
            resonance: 0.0,
            res_quad: 0.0,
            tune: 0.0,
            stage: [0.0; 4],
            stage_tanh: [0.0; 3],
            delay: [0.0; 6],
        };
        ladder.set_params(1000.0, 0.1);
        ladder
    }

    /// Set cutoff frequency (Hz) and resonance [0, 1]. No-op when both
    /// values are unchanged.
    #[inline]
    pub fn set_params(&mut self, cutoff_hz: f32, resonance: f32) {
        let cutoff = cutoff_hz.max(0.0);
        let resonance = resonance.clamp(0.0, 1.0);
        if (cutoff - self.cutoff).abs() < f32::EPSILON
            && (resonance - self.resonance).abs() < f32::EPSILON
        {
            return;
        }
        self.cutoff = cutoff;
        self.resonance = resonance;

        let fc = cutoff / self.sample_rate;
        let f = fc * 0.5; // oversampled by 2
        let fc2 = fc * fc;
        let fc3 = fc2 * fc;

        // Empirical frequency and resonance tuning polynomials.
        let fcr = 1.8730 * fc3 + 0.4955 * fc2 - 0.6490 * fc + 0.9988;
        let acr = -3.9364 * fc2 + 1.8409 * fc + 0.9968;

        self.tune = (1.0 - expf(-core::f32::consts::TAU * f * fcr)) / THERMAL;
        self.res_quad = 4.0 * resonance * acr;
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current resonance [0, 1].
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // Run the loop twice per output sample (2x oversampling).
        for _ in 0..2 {
            let in_with_fb = input - self.res_quad * self.delay[5];
            self.delay[0] += self.tune * (tanhf(in_with_fb * THERMAL) - self.stage_tanh[0]);
            self.stage[0] = self.delay[0];
            for k in 1..4 {
                let stage_in = self.stage[k - 1];
                self.stage_tanh[k - 1] = tanhf(stage_in * THERMAL);
                let upper = if k == 3 {
                    tanhf(self.delay[k] * THERMAL)
                } else {
                    self.stage_tanh[k]
                };
                self.stage[k] = self.delay[k] + self.tune * (self.stage_tanh[k - 1] - upper);
                self.delay[k] = self.stage[k];
            }
            // Half-sample delay for phase compensation of the oversampling.
            self.delay[5] = (self.stage[3] + self.delay[4]) * 0.5;
            self.delay[4] = self.stage[3];
        }
        self.delay[5]
    }

    /// Clear all stage state.
    pub fn reset(&mut self) {
        self.stage = [0.0; 4];
        self.stage_tanh = [0.0; 3];
        self.delay = [0.0; 6];
    }

    /// Update sample rate, retuning the current cutoff/resonance.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let (c, r) = (self.cutoff, self.resonance);
        self.cutoff = -1.0; // force recompute
        self.set_params(c, r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::sinf;

    fn rms_response(cutoff: f32, res: f32, freq: f32) -> f32 {
        let sr = 44100.0;
        let mut ladder = MoogLadder::new(sr);
        ladder.set_params(cutoff, res);
        let n = 8192;
        let mut sum = 0.0f32;
        for i in 0..n {
            let x = 0.5 * sinf(core::f32::consts::TAU * freq * i as f32 / sr);
            let y = ladder.process(x);
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f32).sqrt()
    }

    #[test]
    fn passes_below_cutoff_attenuates_above() {
        let low = rms_response(2000.0, 0.1, 200.0);
        let high = rms_response(2000.0, 0.1, 12000.0);
        assert!(
            high < low * 0.25,
            "12 kHz ({high}) should be well below 200 Hz ({low}) with 2 kHz cutoff"
        );
    }

    #[test]
    fn stable_at_full_resonance() {
        let sr = 44100.0;
        let mut ladder = MoogLadder::new(sr);
        ladder.set_params(8000.0, 1.0);
        for i in 0..44100 {
            let x = if i % 5 == 0 { 0.8 } else { -0.3 };
            let y = ladder.process(x);
            assert!(y.is_finite(), "blew up at sample {i}");
        }
    }

    #[test]
    fn reset_clears_state() {
        let mut ladder = MoogLadder::new(44100.0);
        for _ in 0..100 {
            ladder.process(1.0);
        }
        ladder.reset();
        let out = ladder.process(0.0);
        assert!(out.abs() < 1e-6);
    }
}
