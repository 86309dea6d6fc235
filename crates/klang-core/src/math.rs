//! Scalar math helpers shared across the workspace.
//!
//! Everything here is branch-light and safe to call from the per-sample
//! loop. Transcendental functions go through `libm` so the crate stays
//! `no_std`-clean.

use libm::{cosf, exp2f, log10f, powf, sinf};

/// Quarter pi, used by the constant-power pan law.
const FRAC_PI_4: f32 = core::f32::consts::FRAC_PI_4;

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Convert linear gain to decibels.
///
/// Input is floored at 1e-10 so silence maps to -200 dB instead of -inf.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * log10f(linear.max(1e-10))
}

/// Linear blend between `a` and `b`.
///
/// `pos` = 0.0 returns `a`, 1.0 returns `b`. Written as a single
/// multiply-add: `a + (b - a) * pos`.
#[inline]
pub fn crossfade(a: f32, b: f32, pos: f32) -> f32 {
    a + (b - a) * pos
}

/// Constant-power stereo pan of a mono signal.
///
/// `pan` ranges from -1.0 (hard left) through 0.0 (center) to 1.0
/// (hard right). At center both channels carry `input / sqrt(2)` so the
/// summed power stays constant across the sweep.
#[inline]
pub fn pan2(input: f32, pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (input * cosf(angle), input * sinf(angle))
}

/// Frequency ratio for a relative note offset in semitones.
///
/// `semitone_ratio(12.0) == 2.0` (one octave up).
#[inline]
pub fn semitone_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Frequency in Hz of a MIDI note number in 12-TET, A4 (69) = 440 Hz.
#[inline]
pub fn note_to_hz(note: i32) -> f32 {
    440.0 * exp2f((note as f32 - 69.0) / 12.0)
}

/// Flush values below 1e-20 to exactly zero.
///
/// IEEE 754 subnormals cause severe slowdowns on most architectures once a
/// feedback path decays into that range. The 1e-20 threshold leaves margin
/// before the actual subnormal boundary (~1.2e-38).
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
