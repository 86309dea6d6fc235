//! Engine error type.
//!
//! Errors only arise during construction and configuration — wavetable
//! installation and sample-rate validation. `process` itself never fails;
//! it renders audio or silence.

use klang_core::NUM_FTABLES;
use thiserror::Error;

/// Errors from engine construction and wavetable configuration.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A wavetable slot index outside `0..NUM_FTABLES`.
    #[error("wavetable slot {0} out of range (have {NUM_FTABLES} slots)")]
    WaveformSlot(usize),

    /// A wavetable of zero length was requested.
    #[error("wavetable size must be non-zero")]
    EmptyWaveform,

    /// A sample write outside the wavetable's bounds.
    #[error("sample index {index} out of range for wavetable of {size} samples")]
    WaveformIndex {
        /// Offending sample index.
        index: usize,
        /// Length of the target table.
        size: usize,
    },

    /// A non-positive sample rate.
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f32),
}
