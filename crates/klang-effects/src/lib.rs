//! Klang Effects - the engine's global output chain
//!
//! Effects applied to the summed voice bus, in the order the engine runs
//! them:
//!
//! - [`Bitcrusher`] - sample-rate and bit-depth reduction
//! - [`AutoPan`] - sine-driven constant-power panner (mono in, stereo out)
//! - [`Phaser`] - cascaded-allpass notch sweep with feedback
//! - [`FeedbackDelay`] - single delay line with feedback, four of which form
//!   the stereo ping-pong topology
//! - [`StereoReverb`] - comb/allpass tank reverb with damping cutoff
//! - [`Compressor`] - peak-detecting dynamics compressor
//!
//! All effects are constructed once at engine init and are allocation-free
//! during processing.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod autopan;
pub mod bitcrusher;
pub mod compressor;
pub mod feedback_delay;
pub mod phaser;
pub mod reverb;

// Re-export main types at crate root
pub use autopan::AutoPan;
pub use bitcrusher::Bitcrusher;
pub use compressor::Compressor;
pub use feedback_delay::FeedbackDelay;
pub use phaser::Phaser;
pub use reverb::StereoReverb;
