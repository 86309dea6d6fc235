//! The engine's parameter table.
//!
//! Every control the engine exposes lives in one flat vector of floats,
//! one slot per [`Param`]. Each slot carries a static record with its
//! range, default, and stable string key. Writes clamp to the range;
//! reads return the raw float. There is no per-parameter unit conversion
//! inside the engine — callers pass Hz, seconds, and linear gains
//! directly.
//!
//! [`ParamBank`] is the shared, thread-safe form: bit-cast `f32` values in
//! `AtomicU32` slots, written by the control thread and latched into a
//! plain [`Params`] array by the audio thread at the start of every
//! buffer.

use core::ops::{Index, IndexMut};
use core::sync::atomic::{AtomicU32, Ordering};

/// Static descriptor for one parameter slot.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Lower bound, inclusive.
    pub min: f32,
    /// Value installed at init.
    pub default: f32,
    /// Upper bound, inclusive.
    pub max: f32,
    /// Stable string key for logging and host display.
    pub key: &'static str,
}

macro_rules! define_params {
    ($( $variant:ident = ($min:expr, $default:expr, $max:expr, $key:literal) ),+ $(,)?) => {
        /// Parameter identifiers, in slot order.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Param {
            $( $variant ),+
        }

        impl Param {
            /// Every parameter in slot order.
            pub const ALL: &'static [Param] = &[ $( Param::$variant ),+ ];
        }

        static SPECS: &[ParamSpec] = &[
            $( ParamSpec { min: $min, default: $default, max: $max, key: $key } ),+
        ];
    };
}

define_params! {
    Index1                = (0.0, 0.0, 1.0, "index1"),
    Index2                = (0.0, 0.0, 1.0, "index2"),
    MorphBalance          = (0.0, 0.5, 1.0, "morphBalance"),
    Morph1SemitoneOffset  = (-12.0, 0.0, 12.0, "morph1SemitoneOffset"),
    Morph2SemitoneOffset  = (-12.0, 0.0, 12.0, "morph2SemitoneOffset"),
    Morph1Volume          = (0.0, 0.8, 1.0, "morph1Volume"),
    Morph2Volume          = (0.0, 0.8, 1.0, "morph2Volume"),
    SubVolume             = (0.0, 0.0, 1.0, "subVolume"),
    SubOctaveDown         = (0.0, 0.0, 1.0, "subOctaveDown"),
    SubIsSquare           = (0.0, 0.0, 1.0, "subIsSquare"),
    FmVolume              = (0.0, 0.0, 1.0, "fmVolume"),
    FmAmount              = (0.0, 0.0, 15.0, "fmAmount"),
    NoiseVolume           = (0.0, 0.0, 0.25, "noiseVolume"),
    Lfo1Index             = (0.0, 0.0, 3.0, "lfo1Index"),
    Lfo1Amplitude         = (0.0, 0.0, 1.0, "lfo1Amplitude"),
    Lfo1Rate              = (0.0, 0.25, 10.0, "lfo1Rate"),
    Cutoff                = (256.0, 2000.0, 28000.0, "cutoff"),
    Resonance             = (0.0, 0.1, 0.75, "resonance"),
    FilterMix             = (0.0, 1.0, 1.0, "filterMix"),
    FilterAdsrMix         = (0.0, 0.0, 1.2, "filterADSRMix"),
    IsMono                = (0.0, 0.0, 1.0, "isMono"),
    Glide                 = (0.0, 0.0, 0.2, "glide"),
    FilterAttackDuration  = (0.0005, 0.05, 2.0, "filterAttackDuration"),
    FilterDecayDuration   = (0.005, 0.05, 2.0, "filterDecayDuration"),
    FilterSustainLevel    = (0.0, 1.0, 1.0, "filterSustainLevel"),
    FilterReleaseDuration = (0.0, 0.5, 2.0, "filterReleaseDuration"),
    AttackDuration        = (0.0005, 0.05, 2.0, "attackDuration"),
    DecayDuration         = (0.0, 0.005, 2.0, "decayDuration"),
    SustainLevel          = (0.0, 0.8, 1.0, "sustainLevel"),
    ReleaseDuration       = (0.004, 0.05, 2.0, "releaseDuration"),
    Morph2Detuning        = (-4.0, 0.0, 4.0, "morph2Detuning"),
    DetuningMultiplier    = (1.0, 1.0, 2.0, "detuningMultiplier"),
    MasterVolume          = (0.0, 0.5, 2.0, "masterVolume"),
    BitCrushDepth         = (1.0, 24.0, 24.0, "bitCrushDepth"),
    BitCrushSampleRate    = (4096.0, 44100.0, 44100.0, "bitCrushSampleRate"),
    AutoPanAmount         = (0.0, 0.0, 1.0, "autoPanAmount"),
    AutoPanFrequency      = (0.0, 0.25, 10.0, "autoPanFrequency"),
    ReverbOn              = (0.0, 1.0, 1.0, "reverbOn"),
    ReverbFeedback        = (0.0, 0.5, 1.0, "reverbFeedback"),
    ReverbHighPass        = (80.0, 700.0, 900.0, "reverbHighPass"),
    ReverbMix             = (0.0, 0.0, 1.0, "reverbMix"),
    DelayOn               = (0.0, 0.0, 1.0, "delayOn"),
    DelayFeedback         = (0.0, 0.1, 0.9, "delayFeedback"),
    DelayTime             = (0.1, 0.5, 1.5, "delayTime"),
    DelayMix              = (0.0, 0.125, 1.0, "delayMix"),
    Lfo2Index             = (0.0, 0.0, 3.0, "lfo2Index"),
    Lfo2Amplitude         = (0.0, 0.0, 1.0, "lfo2Amplitude"),
    Lfo2Rate              = (0.0, 0.25, 10.0, "lfo2Rate"),
    CutoffLfo             = (0.0, 0.0, 2.0, "cutoffLFO"),
    ResonanceLfo          = (0.0, 0.0, 2.0, "resonanceLFO"),
    OscMixLfo             = (0.0, 0.0, 2.0, "oscMixLFO"),
    SustainLfo            = (0.0, 0.0, 2.0, "sustainLFO"),
    DecayLfo              = (0.0, 0.0, 2.0, "decayLFO"),
    NoiseLfo              = (0.0, 0.0, 2.0, "noiseLFO"),
    FmLfo                 = (0.0, 0.0, 2.0, "fmLFO"),
    DetuneLfo             = (0.0, 0.0, 2.0, "detuneLFO"),
    FilterEnvLfo          = (0.0, 0.0, 2.0, "filterEnvLFO"),
    PitchLfo              = (0.0, 0.0, 2.0, "pitchLFO"),
    BitcrushLfo           = (0.0, 0.0, 2.0, "bitcrushLFO"),
    AutopanLfo            = (0.0, 0.0, 2.0, "autopanLFO"),
    ArpDirection          = (0.0, 1.0, 2.0, "arpDirection"),
    ArpInterval           = (0.0, 12.0, 12.0, "arpInterval"),
    ArpIsOn               = (0.0, 0.0, 1.0, "arpIsOn"),
    ArpOctave             = (0.0, 1.0, 3.0, "arpOctave"),
    ArpRate               = (1.0, 64.0, 256.0, "arpRate"),
    ArpIsSequencer        = (0.0, 0.0, 1.0, "arpIsSequencer"),
    ArpTotalSteps         = (1.0, 4.0, 16.0, "arpTotalSteps"),
    ArpSeqPattern00       = (-24.0, 0.0, 24.0, "arpSeqPattern00"),
    ArpSeqPattern01       = (-24.0, 0.0, 24.0, "arpSeqPattern01"),
    ArpSeqPattern02       = (-24.0, 0.0, 24.0, "arpSeqPattern02"),
    ArpSeqPattern03       = (-24.0, 0.0, 24.0, "arpSeqPattern03"),
    ArpSeqPattern04       = (-24.0, 0.0, 24.0, "arpSeqPattern04"),
    ArpSeqPattern05       = (-24.0, 0.0, 24.0, "arpSeqPattern05"),
    ArpSeqPattern06       = (-24.0, 0.0, 24.0, "arpSeqPattern06"),
    ArpSeqPattern07       = (-24.0, 0.0, 24.0, "arpSeqPattern07"),
    ArpSeqPattern08       = (-24.0, 0.0, 24.0, "arpSeqPattern08"),
    ArpSeqPattern09       = (-24.0, 0.0, 24.0, "arpSeqPattern09"),
    ArpSeqPattern10       = (-24.0, 0.0, 24.0, "arpSeqPattern10"),
    ArpSeqPattern11       = (-24.0, 0.0, 24.0, "arpSeqPattern11"),
    ArpSeqPattern12       = (-24.0, 0.0, 24.0, "arpSeqPattern12"),
    ArpSeqPattern13       = (-24.0, 0.0, 24.0, "arpSeqPattern13"),
    ArpSeqPattern14       = (-24.0, 0.0, 24.0, "arpSeqPattern14"),
    ArpSeqPattern15       = (-24.0, 0.0, 24.0, "arpSeqPattern15"),
    ArpSeqOctBoost00      = (0.0, 0.0, 1.0, "arpSeqOctBoost00"),
    ArpSeqOctBoost01      = (0.0, 0.0, 1.0, "arpSeqOctBoost01"),
    ArpSeqOctBoost02      = (0.0, 0.0, 1.0, "arpSeqOctBoost02"),
    ArpSeqOctBoost03      = (0.0, 0.0, 1.0, "arpSeqOctBoost03"),
    ArpSeqOctBoost04      = (0.0, 0.0, 1.0, "arpSeqOctBoost04"),
    ArpSeqOctBoost05      = (0.0, 0.0, 1.0, "arpSeqOctBoost05"),
    ArpSeqOctBoost06      = (0.0, 0.0, 1.0, "arpSeqOctBoost06"),
    ArpSeqOctBoost07      = (0.0, 0.0, 1.0, "arpSeqOctBoost07"),
    ArpSeqOctBoost08      = (0.0, 0.0, 1.0, "arpSeqOctBoost08"),
    ArpSeqOctBoost09      = (0.0, 0.0, 1.0, "arpSeqOctBoost09"),
    ArpSeqOctBoost10      = (0.0, 0.0, 1.0, "arpSeqOctBoost10"),
    ArpSeqOctBoost11      = (0.0, 0.0, 1.0, "arpSeqOctBoost11"),
    ArpSeqOctBoost12      = (0.0, 0.0, 1.0, "arpSeqOctBoost12"),
    ArpSeqOctBoost13      = (0.0, 0.0, 1.0, "arpSeqOctBoost13"),
    ArpSeqOctBoost14      = (0.0, 0.0, 1.0, "arpSeqOctBoost14"),
    ArpSeqOctBoost15      = (0.0, 0.0, 1.0, "arpSeqOctBoost15"),
    ArpSeqNoteOn00        = (0.0, 0.0, 1.0, "arpSeqNoteOn00"),
    ArpSeqNoteOn01        = (0.0, 0.0, 1.0, "arpSeqNoteOn01"),
    ArpSeqNoteOn02        = (0.0, 0.0, 1.0, "arpSeqNoteOn02"),
    ArpSeqNoteOn03        = (0.0, 0.0, 1.0, "arpSeqNoteOn03"),
    ArpSeqNoteOn04        = (0.0, 0.0, 1.0, "arpSeqNoteOn04"),
    ArpSeqNoteOn05        = (0.0, 0.0, 1.0, "arpSeqNoteOn05"),
    ArpSeqNoteOn06        = (0.0, 0.0, 1.0, "arpSeqNoteOn06"),
    ArpSeqNoteOn07        = (0.0, 0.0, 1.0, "arpSeqNoteOn07"),
    ArpSeqNoteOn08        = (0.0, 0.0, 1.0, "arpSeqNoteOn08"),
    ArpSeqNoteOn09        = (0.0, 0.0, 1.0, "arpSeqNoteOn09"),
    ArpSeqNoteOn10        = (0.0, 0.0, 1.0, "arpSeqNoteOn10"),
    ArpSeqNoteOn11        = (0.0, 0.0, 1.0, "arpSeqNoteOn11"),
    ArpSeqNoteOn12        = (0.0, 0.0, 1.0, "arpSeqNoteOn12"),
    ArpSeqNoteOn13        = (0.0, 0.0, 1.0, "arpSeqNoteOn13"),
    ArpSeqNoteOn14        = (0.0, 0.0, 1.0, "arpSeqNoteOn14"),
    ArpSeqNoteOn15        = (0.0, 0.0, 1.0, "arpSeqNoteOn15"),
    FilterType            = (0.0, 0.0, 2.0, "filterType"),
    PhaserMix             = (0.0, 0.0, 1.0, "phaserMix"),
    PhaserRate            = (12.0, 12.0, 300.0, "phaserRate"),
    PhaserFeedback        = (0.0, 0.0, 0.8, "phaserFeedback"),
    PhaserNotchWidth      = (100.0, 800.0, 1000.0, "phaserNotchWidth"),
    MonoIsLegato          = (0.0, 0.0, 1.0, "monoIsLegato"),
}

/// Total number of parameter slots.
pub const PARAM_COUNT: usize = Param::ALL.len();

/// Number of sequencer steps addressable through the step parameters.
pub const MAX_SEQUENCER_STEPS: usize = 16;

impl Param {
    /// Slot index of this parameter.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parameter at a slot index, if in range.
    pub fn from_index(index: usize) -> Option<Param> {
        Param::ALL.get(index).copied()
    }

    /// Static descriptor for this parameter.
    #[inline]
    pub fn spec(self) -> &'static ParamSpec {
        &SPECS[self as usize]
    }

    /// Default value.
    pub fn default_value(self) -> f32 {
        self.spec().default
    }

    /// Stable string key.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Clamp a value into this parameter's range.
    #[inline]
    pub fn clamp(self, value: f32) -> f32 {
        let spec = self.spec();
        value.clamp(spec.min, spec.max)
    }

    /// Sequencer step note offset parameter for `step` (0..16).
    #[inline]
    pub fn seq_pattern(step: usize) -> Param {
        Param::ALL[Param::ArpSeqPattern00 as usize + step.min(MAX_SEQUENCER_STEPS - 1)]
    }

    /// Sequencer step octave boost parameter for `step` (0..16).
    #[inline]
    pub fn seq_oct_boost(step: usize) -> Param {
        Param::ALL[Param::ArpSeqOctBoost00 as usize + step.min(MAX_SEQUENCER_STEPS - 1)]
    }

    /// Sequencer step gate parameter for `step` (0..16).
    #[inline]
    pub fn seq_note_on(step: usize) -> Param {
        Param::ALL[Param::ArpSeqNoteOn00 as usize + step.min(MAX_SEQUENCER_STEPS - 1)]
    }
}

/// A plain, single-threaded copy of the parameter vector.
///
/// The audio thread latches the shared [`ParamBank`] into one of these at
/// the start of every buffer, so all reads within a buffer see consistent
/// values.
#[derive(Clone)]
pub struct Params([f32; PARAM_COUNT]);

impl Params {
    /// All parameters at their defaults.
    pub fn defaults() -> Self {
        let mut values = [0.0; PARAM_COUNT];
        for (i, slot) in values.iter_mut().enumerate() {
            *slot = SPECS[i].default;
        }
        Self(values)
    }

    /// Raw slot access by index.
    #[inline]
    pub fn as_slice(&self) -> &[f32; PARAM_COUNT] {
        &self.0
    }

    /// Raw mutable slot access by index.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32; PARAM_COUNT] {
        &mut self.0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Index<Param> for Params {
    type Output = f32;

    #[inline]
    fn index(&self, param: Param) -> &f32 {
        &self.0[param as usize]
    }
}

impl IndexMut<Param> for Params {
    #[inline]
    fn index_mut(&mut self, param: Param) -> &mut f32 {
        &mut self.0[param as usize]
    }
}

/// Shared parameter vector: bit-cast `f32` in atomic slots.
///
/// Single-writer (control thread), single-reader (audio thread). Writes
/// through [`set`](ParamBank::set) clamp to the parameter's range and
/// no-op when the value is unchanged; [`set_all`](ParamBank::set_all) is
/// the bulk unclamped fast path used for preset restores.
pub struct ParamBank {
    slots: [AtomicU32; PARAM_COUNT],
}

impl ParamBank {
    /// Create a bank holding every parameter's default.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|i| AtomicU32::new(SPECS[i].default.to_bits())),
        }
    }

    /// Clamped write. No-op (and no log line) when the stored value does
    /// not change.
    pub fn set(&self, param: Param, value: f32) {
        let clamped = param.clamp(value);
        let old = self.get(param);
        if old != clamped {
            self.slots[param as usize].store(clamped.to_bits(), Ordering::Release);
            log::debug!("param {} -> {}", param.key(), clamped);
        }
    }

    /// Clamped write by slot index. Out-of-range indices are ignored.
    pub fn set_by_index(&self, index: usize, value: f32) {
        if let Some(param) = Param::from_index(index) {
            self.set(param, value);
        }
    }

    /// Bulk unclamped write of the first `values.len()` slots.
    pub fn set_all(&self, values: &[f32]) {
        for (slot, &value) in self.slots.iter().zip(values) {
            slot.store(value.to_bits(), Ordering::Release);
        }
    }

    /// Raw read.
    #[inline]
    pub fn get(&self, param: Param) -> f32 {
        f32::from_bits(self.slots[param as usize].load(Ordering::Acquire))
    }

    /// Raw read by slot index; `None` when out of range.
    pub fn get_by_index(&self, index: usize) -> Option<f32> {
        Param::from_index(index).map(|p| self.get(p))
    }

    /// Copy every slot into a plain [`Params`] array.
    pub fn latch(&self, dst: &mut Params) {
        for (dst, slot) in dst.as_mut_slice().iter_mut().zip(self.slots.iter()) {
            *dst = f32::from_bits(slot.load(Ordering::Acquire));
        }
    }
}

impl Default for ParamBank {
    fn default() -> Self {
        Self::new()
    }
}
