//! Core Effect trait.
//!
//! All global effects in the output chain implement [`Effect`]. The trait is
//! deliberately small: single-sample mono and stereo processing plus state
//! management. Mono effects implement `process()` and get stereo processing
//! for free (channels processed independently); true stereo effects
//! (ping-pong delay, stereo reverb) implement `process_stereo()` and get a
//! left-channel mono derivation for free.
//!
//! # Safety Contract
//!
//! Implementors must override at least one of `process()` or
//! `process_stereo()`; the defaults call each other, so overriding neither
//! would recurse forever. Every concrete effect in this workspace overrides
//! one of the two.

/// Trait for single-sample audio effects.
///
/// All methods are real-time safe: no locking, no allocation.
pub trait Effect {
    /// Process a single mono sample.
    ///
    /// Default implementation derives mono output from `process_stereo`
    /// using the left channel.
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    /// Process a stereo sample pair.
    ///
    /// Default implementation processes the channels independently through
    /// `process`, which is correct for mono effects.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process(left), self.process(right))
    }

    /// Update the sample rate. Effects recalculate any rate-dependent
    /// coefficients here.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state (delay lines, filter history) without touching
    /// parameters.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Effect for Gain {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    struct Swap;

    impl Effect for Swap {
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (right, left)
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn mono_effect_processes_channels_independently() {
        let mut gain = Gain(2.0);
        assert_eq!(gain.process_stereo(1.0, 0.5), (2.0, 1.0));
    }

    #[test]
    fn stereo_effect_mono_derivation_uses_left() {
        let mut swap = Swap;
        assert_eq!(swap.process(1.0), 1.0);
        assert_eq!(swap.process_stereo(1.0, 2.0), (2.0, 1.0));
    }
}
