//! Auto-panner: a sine oscillator driving a constant-power stereo panner.
//!
//! Splits the mono voice bus into the stereo field. The pan position is
//! `sin(2π·phase) · amount`, optionally scaled by an external modulation
//! factor supplied per sample (the engine feeds it the selected LFO's
//! unipolar value).

use libm::sinf;

/// Sine-driven stereo panner (mono in, stereo out).
#[derive(Debug, Clone)]
pub struct AutoPan {
    sample_rate: f32,
    phase: f32,
    freq: f32,
    amount: f32,
}

impl AutoPan {
    /// Create a stationary panner (frequency and amount both zero).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            freq: 0.0,
            amount: 0.0,
        }
    }

    /// Set the pan oscillator frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz.max(0.0);
    }

    /// Set the pan depth [0, 1]. 0 leaves the signal centered.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    /// Process one sample. `mod_scale` multiplies the pan position and is
    /// 1.0 when no modulation is routed here.
    #[inline]
    pub fn process(&mut self, input: f32, mod_scale: f32) -> (f32, f32) {
        let pan = sinf(self.phase * core::f32::consts::TAU) * self.amount * mod_scale;
        self.phase += self.freq / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        klang_core::pan2(input, pan)
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
