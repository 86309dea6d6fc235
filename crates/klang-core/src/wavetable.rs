//! Wavetable storage for the morphing oscillators.
//!
//! A [`Wavetable`] is a single-cycle waveform sampled into a fixed buffer,
//! read by phase in [0, 1) with linear interpolation and wraparound. The
//! [`WavetableBank`] holds the four user-editable slots the morphing
//! oscillators sweep across; slots default to a sine so the engine produces
//! sound before a host installs custom tables.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use libm::sinf;

/// Default wavetable length in samples.
pub const FTABLE_SIZE: usize = 4096;

/// Number of user-editable wavetable slots.
pub const NUM_FTABLES: usize = 4;

/// A single-cycle waveform table.
#[derive(Debug, Clone)]
pub struct Wavetable {
    samples: Vec<f32>,
}

impl Wavetable {
    /// Allocate a zeroed table of the given size.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn zeroed(size: usize) -> Self {
        assert!(size > 0, "wavetable size must be > 0");
        Self {
            samples: vec![0.0; size],
        }
    }

    /// Generate one cycle of a sine wave.
    pub fn sine(size: usize) -> Self {
        let mut table = Self::zeroed(size);
        for (i, sample) in table.samples.iter_mut().enumerate() {
            *sample = sinf(core::f32::consts::TAU * i as f32 / size as f32);
        }
        table
    }

    /// Build a table from a slice of samples.
    pub fn from_samples(samples: &[f32]) -> Self {
        assert!(!samples.is_empty(), "wavetable size must be > 0");
        Self {
            samples: samples.to_vec(),
        }
    }

    /// Number of samples in the table.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the table holds no samples. Always false by construction.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Overwrite one sample. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(sample) = self.samples.get_mut(index) {
            *sample = value;
        }
    }

    /// Read the table at a phase in [0, 1) with linear interpolation.
    ///
    /// Phases outside the range wrap.
    #[inline]
    pub fn lookup(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        let pos = phase.rem_euclid(1.0) * len as f32;
        let idx = pos as usize;
        let frac = pos - idx as f32;
        let a = self.samples[idx % len];
        let b = self.samples[(idx + 1) % len];
        a + (b - a) * frac
    }
}

/// The engine's four user-editable wavetable slots.
#[derive(Debug, Clone)]
pub struct WavetableBank {
    tables: [Wavetable; NUM_FTABLES],
}

impl WavetableBank {
    /// Create a bank with all slots initialised to a sine of
    /// [`FTABLE_SIZE`] samples.
    pub fn new() -> Self {
        Self {
            tables: core::array::from_fn(|_| Wavetable::sine(FTABLE_SIZE)),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        NUM_FTABLES
    }

    /// Always false; the bank has a fixed slot count.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Borrow a slot.
    #[inline]
    pub fn table(&self, slot: usize) -> &Wavetable {
        &self.tables[slot]
    }

    /// Replace a slot's table. Returns false if the slot is out of range.
    pub fn install(&mut self, slot: usize, table: Wavetable) -> bool {
        match self.tables.get_mut(slot) {
            Some(dst) => {
                *dst = table;
                true
            }
            None => false,
        }
    }

    /// Mutable access to a slot, if in range.
    pub fn table_mut(&mut self, slot: usize) -> Option<&mut Wavetable> {
        self.tables.get_mut(slot)
    }

    /// Read across the bank at a morph position in [0, 1].
    ///
    /// `morph` = 0 reads slot 0, `morph` = 1 reads the last slot; positions
    /// in between crossfade adjacent slots.
    #[inline]
    pub fn lookup_morph(&self, morph: f32, phase: f32) -> f32 {
        let span = (NUM_FTABLES - 1) as f32;
        let pos = morph.clamp(0.0, 1.0) * span;
        let low = pos as usize;
        let frac = pos - low as f32;
        let a = self.tables[low].lookup(phase);
        if frac <= 0.0 || low + 1 >= NUM_FTABLES {
            return a;
        }
        let b = self.tables[low + 1].lookup(phase);
        a + (b - a) * frac
    }
}

impl Default for WavetableBank {
    fn default() -> Self {
        Self::new()
    }
}
