//! Half-time parameter smoothing (portamento).
//!
//! A one-pole lowpass applied to a control signal, parameterised by
//! *half-time*: the number of seconds the output takes to travel half the
//! remaining distance to the input. The recurrence is
//!
//! ```text
//! y[n] = x[n] + (y[n-1] - x[n]) * coeff,   coeff = 0.5^(1 / (htime * sr))
//! ```
//!
//! The engine runs five of these: detune multiplier, oscillator morph
//! balance, filter cutoff, filter resonance, and the mono note frequency
//! (whose half-time is the glide parameter).

use libm::powf;

/// One-pole control-signal smoother with half-time parameterisation.
///
/// Unlike a fixed-rate smoother the target is passed to every
/// [`advance`](Portamento::advance) call, matching how the engine feeds it
/// a freshly latched parameter each sample.
#[derive(Debug, Clone)]
pub struct Portamento {
    /// Current smoothed output.
    current: f32,
    /// Feedback coefficient derived from half-time.
    coeff: f32,
    /// Half-time in seconds.
    half_time: f32,
    /// Sample rate in Hz.
    sample_rate: f32,
}

impl Portamento {
    /// Create a smoother with the given initial output value and half-time.
    pub fn new(sample_rate: f32, half_time: f32, initial: f32) -> Self {
        let mut port = Self {
            current: initial,
            coeff: 0.0,
            half_time: 0.0,
            sample_rate,
        };
        port.set_half_time(half_time);
        port
    }

    /// Set the half-time in seconds. Zero (or negative) disables smoothing.
    pub fn set_half_time(&mut self, half_time: f32) {
        if (half_time - self.half_time).abs() < f32::EPSILON {
            return;
        }
        self.half_time = half_time;
        self.coeff = if half_time > 0.0 && self.sample_rate > 0.0 {
            powf(0.5, 1.0 / (half_time * self.sample_rate))
        } else {
            0.0
        };
    }

    /// Current half-time in seconds.
    pub fn half_time(&self) -> f32 {
        self.half_time
    }

    /// Advance one sample toward `target` and return the smoothed value.
    #[inline]
    pub fn advance(&mut self, target: f32) -> f32 {
        self.current = target + (self.current - target) * self.coeff;
        self.current
    }

    /// Current output without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Jump the output to `value` immediately.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
    }

    /// Update the sample rate, preserving the configured half-time.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let ht = self.half_time;
        self.half_time = -1.0; // force recompute
        self.set_half_time(ht);
    }
}
