//! Feedback comb filter for the reverb tank.
//!
//! A delay with feedback and a one-pole lowpass in the feedback path. The
//! lowpass models high-frequency absorption; its coefficient is set directly
//! as a damping value in [0, 1].

use crate::flush_denormal;
use crate::DelayLine;

/// Comb filter with damped feedback.
#[derive(Debug, Clone)]
pub struct CombFilter {
    delay: DelayLine,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filter_store: f32,
}

impl CombFilter {
    /// Create a comb with the given delay length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
            damp1: 0.0,
            damp2: 1.0,
            filter_store: 0.0,
        }
    }

    /// Set the feedback amount. Clamped to [0, 0.99] for stability.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Set the damping coefficient [0, 1]. 0 = bright, 1 = fully damped.
    #[inline]
    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp.clamp(0.0, 1.0);
        self.damp2 = 1.0 - self.damp1;
    }

    /// Process one sample; output is the delayed signal.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.delay.read((self.delay.capacity() - 1) as f32);

        // One-pole lowpass in the feedback path
        self.filter_store = flush_denormal(output * self.damp2 + self.filter_store * self.damp1);
        self.delay.write(input + self.filter_store * self.feedback);

        output
    }

    /// Clear delay and filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.filter_store = 0.0;
    }
}
