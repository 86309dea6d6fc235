//! Feedback delay line with smoothed delay-time changes.
//!
//! One tap of the engine's stereo ping-pong topology. The delay time input
//! is smoothed through a one-pole so host automation of the time parameter
//! glides the read head instead of jumping it. Output is the wet signal
//! only; mixing against the dry path happens in the engine.

use klang_core::{flush_denormal, DelayLine, Effect, Portamento};

/// Single delay line with internal feedback.
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    line: DelayLine,
    sample_rate: f32,
    /// Target delay time in seconds.
    time: f32,
    /// Smoothed delay time, in samples.
    time_smooth: Portamento,
    feedback: f32,
    max_seconds: f32,
}

impl FeedbackDelay {
    /// Create a delay line holding up to `max_seconds` of audio.
    pub fn new(sample_rate: f32, max_seconds: f32) -> Self {
        let initial = 0.1 * sample_rate;
        Self {
            line: DelayLine::from_time(sample_rate, max_seconds),
            sample_rate,
            time: 0.1,
            time_smooth: Portamento::new(sample_rate, 0.02, initial),
            feedback: 0.0,
            max_seconds,
        }
    }

    /// Set the delay time in seconds, clamped to the line's capacity.
    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds.clamp(0.0, self.max_seconds);
    }

    /// Current target delay time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Set the feedback amount [0, 0.99].
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }
}

impl Effect for FeedbackDelay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delay_samples = self.time_smooth.advance(self.time * self.sample_rate);
        let output = self.line.read(delay_samples);
        self.line
            .write(flush_denormal(input + output * self.feedback));
        output
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.time_smooth.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.line.clear();
        self.time_smooth
            .set_immediate(self.time * self.sample_rate);
    }
}
