//! Low frequency oscillator.
//!
//! A bare phasor in [0, 1) shaped on output into one of four waveforms.
//! The shape is an argument to [`Lfo::advance`] rather than stored state
//! because the engine re-reads the shape selector parameter every sample.

use libm::sinf;

/// LFO output shape. All shapes produce values in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoShape {
    /// Full sine cycle per phasor period.
    #[default]
    Sine,
    /// +1 for phase above 0.5, -1 otherwise.
    Square,
    /// Rising ramp, -1 at phase 0 to +1 at phase 1.
    Saw,
    /// Falling ramp, +1 at phase 0 to -1 at phase 1.
    ReverseSaw,
}

impl LfoShape {
    /// Map a shape selector parameter (0..=3) to a shape. Out-of-range
    /// values fall back to sine.
    pub fn from_selector(value: f32) -> Self {
        match value as i32 {
            1 => LfoShape::Square,
            2 => LfoShape::Saw,
            3 => LfoShape::ReverseSaw,
            _ => LfoShape::Sine,
        }
    }
}

/// Phasor-based low frequency oscillator.
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0).
    phase: f32,
    /// Phase increment per sample.
    phase_inc: f32,
    /// Sample rate in Hz.
    sample_rate: f32,
}

impl Lfo {
    /// Create a new LFO at the given sample rate and frequency.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
        }
    }

    /// Set frequency in Hz.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Current phase in [0.0, 1.0).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Advance one sample and return the shaped output in [-1, 1].
    #[inline]
    pub fn advance(&mut self, shape: LfoShape) -> f32 {
        let x = self.phase;
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        match shape {
            LfoShape::Sine => sinf(x * core::f32::consts::TAU),
            LfoShape::Square => {
                if x > 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::Saw => (x - 0.5) * 2.0,
            LfoShape::ReverseSaw => (0.5 - x) * 2.0,
        }
    }

    /// Update sample rate, preserving frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }
}
