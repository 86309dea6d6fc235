//! A single synthesizer voice (one sounding note).
//!
//! Owns two morphing wavetable oscillators, a sub oscillator, an FM
//! oscillator, a noise source, three filters (ladder low-pass, Butterworth
//! band-pass and high-pass), and the amplitude and filter-cutoff ADSRs.
//! Voices are created once at engine init and reused; `clear` returns a
//! voice to the pool without deallocating anything.
//!
//! `run` renders one sample. It reads shared engine state (latched
//! parameters, wavetables, LFO and portamento values) through a borrowed
//! [`VoiceContext`] — voices hold no reference back to the engine.

use klang_core::{crossfade, semitone_ratio, ButterworthBandpass, ButterworthHighpass, MoogLadder,
    Wavetable, WavetableBank};
use libm::exp2f;

use crate::envelope::GatedAdsr;
use crate::osc::{FmOscillator, MorphOscillator, NoiseOsc, TableOscillator};
use crate::params::{Param, Params};

/// Marks a voice slot as unused.
pub const NO_NOTE: i32 = -1;

/// Voice lifecycle stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceStage {
    /// Slot is free.
    #[default]
    Off,
    /// Gate held, envelopes running toward/at sustain.
    On,
    /// Gate released, amplitude decaying toward silence.
    Release,
}

/// Filter topology selector (parameter `filterType`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FilterType {
    Ladder,
    BandPass,
    HighPass,
}

impl FilterType {
    #[inline]
    fn from_selector(value: f32) -> Self {
        match value as i32 {
            1 => FilterType::BandPass,
            2 => FilterType::HighPass,
            _ => FilterType::Ladder,
        }
    }
}

/// Shared per-sample state a voice reads while rendering.
pub struct VoiceContext<'a> {
    /// Parameter vector latched at buffer start.
    pub p: &'a Params,
    /// User wavetable slots for the morphing oscillators.
    pub bank: &'a WavetableBank,
    /// Built-in sine table for the sub and FM oscillators.
    pub sine: &'a Wavetable,
    /// True when the engine is in mono mode.
    pub is_mono: bool,
    /// Glide-smoothed mono note frequency.
    pub mono_freq_smooth: f32,
    /// Smoothed detuning multiplier.
    pub detune_smooth: f32,
    /// Smoothed oscillator morph balance.
    pub morph_balance_smooth: f32,
    /// Smoothed filter cutoff in Hz.
    pub cutoff_smooth: f32,
    /// Smoothed filter resonance.
    pub resonance_smooth: f32,
    /// LFO 1 output, bipolar [-1, 1].
    pub lfo1: f32,
    /// LFO 2 output, bipolar [-1, 1].
    pub lfo2: f32,
    /// Engine sample rate in Hz.
    pub sample_rate: f32,
}

/// One polyphonic (or the mono) voice.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Lifecycle stage.
    pub stage: VoiceStage,
    /// MIDI note sounding in this slot, or [`NO_NOTE`].
    pub root_note: i32,
    /// Latest amplitude envelope output.
    pub amp: f32,
    /// Latest filter envelope output.
    pub filter_env: f32,
    /// 0/1 gate feeding both envelopes.
    gate: f32,

    adsr: GatedAdsr,
    fadsr: GatedAdsr,
    osc1: MorphOscillator,
    osc2: MorphOscillator,
    sub: TableOscillator,
    fm: FmOscillator,
    noise: NoiseOsc,
    lo_pass: MoogLadder,
    band_pass: ButterworthBandpass,
    hi_pass: ButterworthHighpass,
}

impl Voice {
    /// Create an idle voice. All unit generators are allocated here.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: VoiceStage::Off,
            root_note: NO_NOTE,
            amp: 0.0,
            filter_env: 0.0,
            gate: 0.0,
            adsr: GatedAdsr::new(sample_rate),
            fadsr: GatedAdsr::new(sample_rate),
            osc1: MorphOscillator::new(sample_rate),
            osc2: MorphOscillator::new(sample_rate),
            sub: TableOscillator::new(sample_rate),
            fm: FmOscillator::new(sample_rate),
            noise: NoiseOsc::new(),
            lo_pass: MoogLadder::new(sample_rate),
            band_pass: ButterworthBandpass::new(sample_rate, 2000.0, 1000.0),
            hi_pass: ButterworthHighpass::new(sample_rate, 2000.0),
        }
    }

    /// Return the voice to the pool: gate down, stage off, slot free.
    pub fn clear(&mut self) {
        self.gate = 0.0;
        self.stage = VoiceStage::Off;
        self.amp = 0.0;
        self.root_note = NO_NOTE;
    }

    /// Start (or restart) this voice on a note.
    ///
    /// Sets every oscillator to the note frequency and a quadratic
    /// velocity amplitude `(vel / 127)^2`, raises the gate, and enters the
    /// On stage. Envelope levels are not reset, so retriggering a sounding
    /// voice ramps from its current level.
    pub fn start_note(&mut self, note: u8, velocity: u8, frequency: f32) {
        self.set_pitch(frequency);

        let normalized = f32::from(velocity) / 127.0;
        let amplitude = normalized * normalized;
        self.osc1.amp = amplitude;
        self.osc2.amp = amplitude;
        self.sub.amp = amplitude;
        self.fm.amp = amplitude;
        self.noise.amp = amplitude;

        self.stage = VoiceStage::On;
        self.gate = 1.0;
        self.root_note = i32::from(note);
    }

    /// Overwrite the stored note pitch on every oscillator.
    pub fn set_pitch(&mut self, frequency: f32) {
        self.osc1.freq = frequency;
        self.osc2.freq = frequency;
        self.sub.freq = frequency;
        self.fm.freq = frequency;
    }

    /// Drop the gate and enter the release stage.
    pub fn release(&mut self) {
        self.stage = VoiceStage::Release;
        self.gate = 0.0;
    }

    /// Raise the gate again without touching oscillator state.
    ///
    /// Used by the mono hand-off: the voice keeps sounding on the new
    /// pitch installed via [`set_pitch`](Voice::set_pitch).
    pub fn resume(&mut self) {
        self.stage = VoiceStage::On;
        self.gate = 1.0;
    }

    /// Force both envelopes through one released sample.
    ///
    /// The mono retrigger path (non-legato) uses this to restart the
    /// attack from a decaying level instead of holding the sustain.
    pub fn force_release_tick(&mut self) {
        self.gate = 0.0;
        self.stage = VoiceStage::Release;
        self.amp = self.adsr.tick(self.gate);
        self.filter_env = self.fadsr.tick(self.gate);
    }

    /// True when this slot renders (assigned and not Off).
    #[inline]
    pub fn is_sounding(&self) -> bool {
        self.root_note != NO_NOTE && self.stage != VoiceStage::Off
    }

    /// Render one sample into the mono voice bus.
    #[inline]
    pub fn run(&mut self, ctx: &VoiceContext<'_>) -> f32 {
        let p = ctx.p;
        let nyquist = 0.5 * ctx.sample_rate;

        // Unipolar LFO values on [0, amplitude]
        let lfo1_u = 0.5 * (1.0 + ctx.lfo1) * p[Param::Lfo1Amplitude];
        let lfo2_u = 0.5 * (1.0 + ctx.lfo2) * p[Param::Lfo2Amplitude];
        let pick = |selector: f32| -> Option<f32> {
            match selector as i32 {
                1 => Some(lfo1_u),
                2 => Some(lfo2_u),
                _ => None,
            }
        };

        // Common pitch LFO multiplier
        let pitch_lfo = 1.0 + pick(p[Param::PitchLfo]).unwrap_or(0.0);

        // OSC1 frequency: transient modulation of the stored pitch
        let base1 = if ctx.is_mono {
            ctx.mono_freq_smooth
        } else {
            self.osc1.freq
        };
        let semi1 = semitone_ratio(p[Param::Morph1SemitoneOffset] as i32 as f32);
        let freq1 = (base1 * semi1 * ctx.detune_smooth * pitch_lfo).clamp(0.0, nyquist);
        self.osc1.wtpos = p[Param::Index1];

        // OSC2 frequency, with the additive detune term scaled to its
        // stored pitch (4 Hz of detune at C3 per unit)
        let cached2 = self.osc2.freq;
        let base2 = if ctx.is_mono {
            ctx.mono_freq_smooth
        } else {
            cached2
        };
        let semi2 = semitone_ratio(p[Param::Morph2SemitoneOffset] as i32 as f32);
        let mut freq2 = base2 * semi2 * ctx.detune_smooth * pitch_lfo;
        let magic_detune = cached2 / 261.0;
        freq2 += match pick(p[Param::DetuneLfo]) {
            Some(u) => u * p[Param::Morph2Detuning] * magic_detune,
            None => p[Param::Morph2Detuning] * magic_detune,
        };
        let freq2 = freq2.clamp(0.0, nyquist);
        self.osc2.wtpos = p[Param::Index2];

        // Sub oscillator: one or two octaves below the voice pitch
        let base_sub = if ctx.is_mono {
            ctx.mono_freq_smooth
        } else {
            self.sub.freq
        };
        let sub_div = 2.0 * (1.0 + p[Param::SubOctaveDown]);
        let freq_sub = (base_sub * ctx.detune_smooth / sub_div * pitch_lfo).clamp(0.0, nyquist);

        // FM oscillator frequency and index
        let base_fm = if ctx.is_mono {
            ctx.mono_freq_smooth
        } else {
            self.fm.freq
        };
        let freq_fm = (base_fm * ctx.detune_smooth * pitch_lfo).clamp(0.0, nyquist);
        let fm_index = match pick(p[Param::FmLfo]) {
            Some(u) => p[Param::FmAmount] * u,
            None => p[Param::FmAmount],
        };
        self.fm.index = Param::FmAmount.clamp(fm_index);

        // Amplitude ADSR, decay and sustain LFO-modulated
        self.adsr.set_attack(p[Param::AttackDuration]);
        self.adsr.set_release(p[Param::ReleaseDuration]);
        let mut decay = p[Param::DecayDuration];
        if let Some(u) = pick(p[Param::DecayLfo]) {
            decay *= u;
        }
        self.adsr.set_decay(Param::DecayDuration.clamp(decay));
        let mut sustain = p[Param::SustainLevel];
        if let Some(u) = pick(p[Param::SustainLfo]) {
            sustain *= u;
        }
        self.adsr.set_sustain(Param::SustainLevel.clamp(sustain));

        // Filter ADSR, no LFO on its times
        self.fadsr.set_attack(p[Param::FilterAttackDuration]);
        self.fadsr.set_decay(p[Param::FilterDecayDuration]);
        self.fadsr.set_sustain(p[Param::FilterSustainLevel]);
        self.fadsr.set_release(p[Param::FilterReleaseDuration]);

        // Oscillator crossfade position
        let morph_pos = (ctx.morph_balance_smooth + pick(p[Param::OscMixLfo]).unwrap_or(0.0))
            .clamp(0.0, 1.0);

        // Filter resonance
        let mut resonance = ctx.resonance_smooth;
        if let Some(u) = pick(p[Param::ResonanceLfo]) {
            resonance *= u;
        }
        let resonance = Param::Resonance.clamp(resonance);

        // Envelopes
        self.amp = self.adsr.tick(self.gate);
        self.filter_env = self.fadsr.tick(self.gate);

        // Filter cutoff: LFO scaling, then envelope pull-down
        let mut cutoff = ctx.cutoff_smooth;
        if let Some(u) = pick(p[Param::CutoffLfo]) {
            cutoff *= u;
        }
        let env_mix = p[Param::FilterAdsrMix] * pick(p[Param::FilterEnvLfo]).unwrap_or(1.0);
        cutoff -= cutoff * env_mix * (1.0 - self.filter_env);
        let cutoff = Param::Cutoff.clamp(cutoff);

        // Sources
        let osc1_out = self.osc1.tick(ctx.bank, freq1) * p[Param::Morph1Volume];
        let osc2_out = self.osc2.tick(ctx.bank, freq2) * p[Param::Morph2Volume];
        let osc_morph_out = crossfade(osc1_out, osc2_out, morph_pos);

        let mut sub_out = self.sub.tick(ctx.sine, freq_sub);
        if p[Param::SubIsSquare] > 0.5 {
            sub_out = if sub_out > 0.0 {
                p[Param::SubVolume]
            } else {
                -p[Param::SubVolume]
            };
        } else {
            // make sine louder
            sub_out *= p[Param::SubVolume] * 2.0 * 1.5;
        }

        let fm_out = self.fm.tick(ctx.sine, freq_fm) * p[Param::FmVolume];

        let mut noise_out = self.noise.tick() * p[Param::NoiseVolume];
        if let Some(u) = pick(p[Param::NoiseLfo]) {
            noise_out *= u;
        }

        let synth_out = self.amp * (osc_morph_out + sub_out + fm_out + noise_out);

        // Selected filter only; the other two hold their state
        let filter_out = match FilterType::from_selector(p[Param::FilterType]) {
            FilterType::Ladder => {
                self.lo_pass.set_params(cutoff, resonance);
                self.lo_pass.process(synth_out)
            }
            FilterType::BandPass => {
                // Map resonance [0, 1] to bandwidth in Hz
                let bw = 0.0625
                    * ctx.sample_rate
                    * (exp2f((1.0 - resonance).clamp(0.0, 1.0)) - 1.0);
                self.band_pass.set_params(cutoff, bw);
                self.band_pass.process(synth_out)
            }
            FilterType::HighPass => {
                self.hi_pass.set_frequency(cutoff);
                self.hi_pass.process(synth_out)
            }
        };

        crossfade(synth_out, filter_out, p[Param::FilterMix])
    }
}
