//! Stereo tank reverb.
//!
//! Eight parallel feedback combs into four series allpasses per channel,
//! with decorrelated left/right tunings. The external surface matches what
//! the engine drives: a single `feedback` control for tail length and a
//! lowpass cutoff (`lpfreq`) setting the damping of the comb feedback
//! paths. Output is fully wet; the engine crossfades per channel.

use klang_core::{AllpassFilter, CombFilter, Effect};
use libm::{expf, roundf};

/// Left-channel comb delays at the 44.1 kHz reference rate. Mutually prime
/// to avoid coincident resonances.
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Right-channel comb delays, offset for stereo decorrelation.
const COMB_TUNINGS_44K_R: [usize; 8] = [1139, 1211, 1300, 1379, 1445, 1514, 1580, 1640];

/// Left-channel allpass delays at the reference rate.
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Right-channel allpass delays.
const ALLPASS_TUNINGS_44K_R: [usize; 4] = [579, 464, 364, 248];

/// Reference sample rate for the tuning constants.
const REFERENCE_RATE: f32 = 44100.0;

/// Scale a reference-rate delay length to the target rate.
fn scale_to_rate(samples: usize, target_rate: f32) -> usize {
    (roundf(samples as f32 * target_rate / REFERENCE_RATE) as usize).max(1)
}

/// Comb/allpass tank reverb with independent left and right tanks.
pub struct StereoReverb {
    combs_l: [CombFilter; 8],
    combs_r: [CombFilter; 8],
    allpasses_l: [AllpassFilter; 4],
    allpasses_r: [AllpassFilter; 4],
    sample_rate: f32,
    feedback: f32,
    lowpass_hz: f32,
}

impl StereoReverb {
    /// Create a reverb tank at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let combs_l = core::array::from_fn(|i| {
            CombFilter::new(scale_to_rate(COMB_TUNINGS_44K[i], sample_rate))
        });
        let combs_r = core::array::from_fn(|i| {
            CombFilter::new(scale_to_rate(COMB_TUNINGS_44K_R[i], sample_rate))
        });
        let allpasses_l = core::array::from_fn(|i| {
            let mut ap = AllpassFilter::new(scale_to_rate(ALLPASS_TUNINGS_44K[i], sample_rate));
            ap.set_feedback(0.5);
            ap
        });
        let allpasses_r = core::array::from_fn(|i| {
            let mut ap = AllpassFilter::new(scale_to_rate(ALLPASS_TUNINGS_44K_R[i], sample_rate));
            ap.set_feedback(0.5);
            ap
        });

        let mut reverb = Self {
            combs_l,
            combs_r,
            allpasses_l,
            allpasses_r,
            sample_rate,
            feedback: -1.0,
            lowpass_hz: -1.0,
        };
        reverb.set_feedback(0.5);
        reverb.set_lowpass_cutoff(sample_rate * 0.5);
        reverb
    }

    /// Set the tail feedback [0, 0.98]. No-op when unchanged.
    pub fn set_feedback(&mut self, feedback: f32) {
        let feedback = feedback.clamp(0.0, 0.98);
        if (feedback - self.feedback).abs() < f32::EPSILON {
            return;
        }
        self.feedback = feedback;
        for comb in self.combs_l.iter_mut().chain(self.combs_r.iter_mut()) {
            comb.set_feedback(feedback);
        }
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set the damping lowpass cutoff in Hz. At Nyquist the tail stays
    /// bright; lower cutoffs darken it. No-op when unchanged.
    pub fn set_lowpass_cutoff(&mut self, freq_hz: f32) {
        let freq = freq_hz.clamp(20.0, self.sample_rate * 0.5);
        if (freq - self.lowpass_hz).abs() < f32::EPSILON {
            return;
        }
        self.lowpass_hz = freq;
        // Map cutoff to the comb's one-pole damping coefficient.
        let damp = expf(-core::f32::consts::TAU * freq / self.sample_rate);
        for comb in self.combs_l.iter_mut().chain(self.combs_r.iter_mut()) {
            comb.set_damp(damp);
        }
    }
}

impl Effect for StereoReverb {
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut sum_l = 0.0f32;
        for comb in &mut self.combs_l {
            sum_l += comb.process(left);
        }
        sum_l *= 0.125;
        let mut wet_l = sum_l;
        for allpass in &mut self.allpasses_l {
            wet_l = allpass.process(wet_l);
        }

        let mut sum_r = 0.0f32;
        for comb in &mut self.combs_r {
            sum_r += comb.process(right);
        }
        sum_r *= 0.125;
        let mut wet_r = sum_r;
        for allpass in &mut self.allpasses_r {
            wet_r = allpass.process(wet_r);
        }

        (wet_l, wet_r)
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Delay lengths are fixed at construction; the engine rebuilds the
        // reverb if the rate changes.
    }

    fn reset(&mut self) {
        for comb in self.combs_l.iter_mut().chain(self.combs_r.iter_mut()) {
            comb.clear();
        }
        for allpass in self
            .allpasses_l
            .iter_mut()
            .chain(self.allpasses_r.iter_mut())
        {
            allpass.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_produces_a_tail() {
        let mut reverb = StereoReverb::new(44100.0);
        reverb.set_feedback(0.8);

        let (l0, r0) = reverb.process_stereo(1.0, 1.0);
        assert!(l0.is_finite() && r0.is_finite());

        // Energy should persist well after the impulse
        let mut late_energy = 0.0f32;
        for i in 1..44100 {
            let (l, r) = reverb.process_stereo(0.0, 0.0);
            if i > 22050 {
                late_energy += l * l + r * r;
            }
        }
        assert!(late_energy > 0.0, "tail should still carry energy");
    }

    #[test]
    fn higher_feedback_longer_tail() {
        let tail_energy = |fb: f32| {
            let mut reverb = StereoReverb::new(44100.0);
            reverb.set_feedback(fb);
            reverb.process_stereo(1.0, 1.0);
            let mut energy = 0.0f32;
            for _ in 0..44100 {
                let (l, r) = reverb.process_stereo(0.0, 0.0);
                energy += l * l + r * r;
            }
            energy
        };
        assert!(tail_energy(0.9) > tail_energy(0.3) * 2.0);
    }

    #[test]
    fn channels_are_decorrelated() {
        let mut reverb = StereoReverb::new(44100.0);
        reverb.set_feedback(0.7);
        reverb.process_stereo(1.0, 1.0);
        let mut diff = 0.0f32;
        for _ in 0..8820 {
            let (l, r) = reverb.process_stereo(0.0, 0.0);
            diff += (l - r).abs();
        }
        assert!(diff > 0.01, "stereo tanks should differ");
    }

    #[test]
    fn output_stays_finite_under_sustained_input() {
        let mut reverb = StereoReverb::new(44100.0);
        reverb.set_feedback(0.98);
        reverb.set_lowpass_cutoff(22050.0);
        for i in 0..88200 {
            let x = libm::sinf(i as f32 * 0.02);
            let (l, r) = reverb.process_stereo(x, -x);
            assert!(l.is_finite() && r.is_finite());
        }
    }
}
