//! Klang Core - DSP primitives for the klang synthesizer engine
//!
//! This crate provides the sample-rate building blocks the engine and the
//! effect chain are assembled from:
//!
//! - [`Effect`] trait shared by the global effects
//! - [`Portamento`] half-time one-pole smoother for glide and zipper-free
//!   parameter motion
//! - [`Lfo`] phasor-based low frequency oscillator with four shapes
//! - [`Biquad`] with Butterworth high-pass and band-pass constructors
//! - [`MoogLadder`] four-stage resonant low-pass
//! - [`DelayLine`] interpolated circular delay buffer
//! - [`CombFilter`] / [`AllpassFilter`] reverb building blocks
//! - [`EnvelopeFollower`] for dynamics processing
//! - [`Wavetable`] / [`WavetableBank`] morphing-oscillator storage
//!
//! ## no_std Support
//!
//! This crate is `no_std` compatible. Use `default-features = false` in your
//! `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! klang-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod comb;
pub mod delay_line;
pub mod effect;
pub mod follower;
pub mod ladder;
pub mod lfo;
pub mod math;
pub mod smooth;
pub mod wavetable;

// Re-export main types at crate root
pub use allpass::AllpassFilter;
pub use biquad::{Biquad, ButterworthBandpass, ButterworthHighpass};
pub use comb::CombFilter;
pub use delay_line::DelayLine;
pub use effect::Effect;
pub use follower::EnvelopeFollower;
pub use ladder::MoogLadder;
pub use lfo::{Lfo, LfoShape};
pub use math::{
    crossfade, db_to_linear, flush_denormal, linear_to_db, note_to_hz, pan2, semitone_ratio,
};
pub use smooth::Portamento;
pub use wavetable::{Wavetable, WavetableBank, FTABLE_SIZE, NUM_FTABLES};
