//! Schroeder allpass filter for reverb diffusion.
//!
//! Passes all frequencies at equal magnitude while smearing phase, turning
//! the comb bank's discrete echoes into a dense tail.

use crate::flush_denormal;
use crate::DelayLine;

/// Schroeder allpass section.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: DelayLine,
    feedback: f32,
}

impl AllpassFilter {
    /// Create an allpass with the given delay length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Set the feedback coefficient. Stable for |feedback| < 1.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read((self.delay.capacity() - 1) as f32);
        let output = -input + delayed;
        self.delay
            .write(flush_denormal(input + delayed * self.feedback));
        output
    }

    /// Clear delay state.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_response_shape() {
        let mut allpass = AllpassFilter::new(10);
        allpass.set_feedback(0.5);
        let first = allpass.process(1.0);
        assert!((first + 1.0).abs() < 1e-6, "first output should be -input");
        for _ in 0..8 {
            allpass.process(0.0);
        }
        let delayed = allpass.process(0.0);
        assert!(delayed.abs() > 0.3, "delayed impulse should appear");
    }

    #[test]
    fn output_finite_under_sustained_input() {
        let mut allpass = AllpassFilter::new(100);
        allpass.set_feedback(0.7);
        for _ in 0..10_000 {
            assert!(allpass.process(0.5).is_finite());
        }
    }

    #[test]
    fn clear_silences() {
        let mut allpass = AllpassFilter::new(10);
        for _ in 0..20 {
            allpass.process(1.0);
        }
        allpass.clear();
        assert!(allpass.process(0.0).abs() < 1e-10);
    }
}
