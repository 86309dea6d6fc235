//! The synthesizer engine: voice pool, note allocation, arp scheduling,
//! and the per-buffer render driver with the global effect chain.
//!
//! One `Engine` lives on the audio thread and renders stereo output
//! through [`Engine::process`]. The control thread talks to it through a
//! [`Controller`] (parameter bank + command channel); for offline
//! rendering and tests the same ingress methods are callable directly on
//! the engine.
//!
//! Realtime discipline: `process` never blocks and never allocates. All
//! unit generators, voice slots, and arp buffers are built in the
//! constructor; parameters are latched from the shared bank at buffer
//! start; notifications go out through a bounded queue with `try_send`.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use klang_core::{
    crossfade, note_to_hz, ButterworthHighpass, Effect, Lfo, LfoShape, Portamento, Wavetable,
    WavetableBank, FTABLE_SIZE, NUM_FTABLES,
};
use klang_effects::{AutoPan, Bitcrusher, Compressor, FeedbackDelay, Phaser, StereoReverb};

use crate::arp::ArpScheduler;
use crate::bridge::{
    Controller, EngineCommand, EngineNotification, COMMAND_QUEUE_DEPTH, NOTIFY_QUEUE_DEPTH,
};
use crate::error::EngineError;
use crate::midi::{self, MidiMessage};
use crate::params::{Param, ParamBank, Params};
use crate::tuning::Tuning;
use crate::voice::{Voice, VoiceContext, VoiceStage, NO_NOTE};

/// Fixed engine sample rate in Hz.
pub const SAMPLE_RATE: f32 = 44100.0;

/// Number of polyphonic voice slots (plus one dedicated mono voice).
pub const MAX_POLYPHONY: usize = 6;

/// Size of the MIDI note space.
pub const NUM_MIDI_NOTES: usize = 128;

/// A releasing voice below this amplitude is retired to Off.
pub const RELEASE_AMPLITUDE_THRESHOLD: f32 = 1e-5;

/// Added to every delay time so the read head never sits on the write
/// head.
pub const DELAY_TIME_FLOOR: f32 = 1e-4;

/// Capacity of each delay line in seconds.
const MAX_DELAY_SECONDS: f32 = 10.0;

/// The realtime synthesis engine.
pub struct Engine {
    sample_rate: f32,
    params: Arc<ParamBank>,
    /// Parameter vector latched at the start of the current buffer.
    p: Params,
    tuning: Box<dyn Tuning>,

    // Voices
    tables: WavetableBank,
    sine: Wavetable,
    voices: [Voice; MAX_POLYPHONY],
    mono_voice: Voice,
    playing_index: usize,
    /// Currently pressed keys, most recent first.
    held: Vec<u8>,
    prev_mono_status: f32,

    // Arp/seq
    arp: ArpScheduler,
    notes_per_octave: i32,

    // LFOs
    lfo1: Lfo,
    lfo2: Lfo,
    lfo1_value: f32,
    lfo2_value: f32,

    // Portamento smoothers
    detune_smooth: Portamento,
    morph_smooth: Portamento,
    cutoff_smooth: Portamento,
    resonance_smooth: Portamento,
    mono_freq_smooth: Portamento,
    mono_frequency: f32,

    // Global FX
    bitcrush: Bitcrusher,
    autopan: AutoPan,
    phaser: Phaser,
    delay_l: FeedbackDelay,
    delay_r: FeedbackDelay,
    delay_rr: FeedbackDelay,
    delay_fill: FeedbackDelay,
    reverb_hp_l: ButterworthHighpass,
    reverb_hp_r: ButterworthHighpass,
    reverb: StereoReverb,
    comp_l: Compressor,
    comp_r: Compressor,

    // Bridge
    command_tx: Sender<EngineCommand>,
    command_rx: Receiver<EngineCommand>,
    notify_tx: Sender<EngineNotification>,
    notify_rx: Receiver<EngineNotification>,
}

impl Engine {
    /// Create an engine at the fixed 44.1 kHz rate.
    pub fn new(tuning: Box<dyn Tuning>) -> Self {
        Self::build(SAMPLE_RATE, tuning)
    }

    /// Create an engine at a caller-chosen sample rate.
    pub fn with_sample_rate(
        sample_rate: f32,
        tuning: Box<dyn Tuning>,
    ) -> Result<Self, EngineError> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        Ok(Self::build(sample_rate, tuning))
    }

    fn build(sample_rate: f32, tuning: Box<dyn Tuning>) -> Self {
        let (command_tx, command_rx) = bounded(COMMAND_QUEUE_DEPTH);
        let (notify_tx, notify_rx) = bounded(NOTIFY_QUEUE_DEPTH);
        let p = Params::defaults();
        let prev_mono_status = p[Param::IsMono];

        Self {
            sample_rate,
            params: Arc::new(ParamBank::new()),
            p,
            tuning,
            tables: WavetableBank::new(),
            sine: Wavetable::sine(FTABLE_SIZE),
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            mono_voice: Voice::new(sample_rate),
            playing_index: 0,
            held: Vec::with_capacity(NUM_MIDI_NOTES),
            prev_mono_status,
            arp: ArpScheduler::new(),
            notes_per_octave: 12,
            lfo1: Lfo::new(sample_rate, 0.25),
            lfo2: Lfo::new(sample_rate, 0.25),
            lfo1_value: 0.0,
            lfo2_value: 0.0,
            detune_smooth: Portamento::new(sample_rate, 0.02, 1.0),
            morph_smooth: Portamento::new(sample_rate, 0.1, 0.5666),
            cutoff_smooth: Portamento::new(sample_rate, 0.05, 1666.0),
            resonance_smooth: Portamento::new(sample_rate, 0.05, 0.5),
            mono_freq_smooth: Portamento::new(sample_rate, 0.05, note_to_hz(60)),
            mono_frequency: note_to_hz(60),
            bitcrush: Bitcrusher::new(sample_rate),
            autopan: AutoPan::new(sample_rate),
            phaser: Phaser::new(sample_rate),
            delay_l: FeedbackDelay::new(sample_rate, MAX_DELAY_SECONDS),
            delay_r: FeedbackDelay::new(sample_rate, MAX_DELAY_SECONDS),
            delay_rr: FeedbackDelay::new(sample_rate, MAX_DELAY_SECONDS),
            delay_fill: FeedbackDelay::new(sample_rate, MAX_DELAY_SECONDS),
            reverb_hp_l: ButterworthHighpass::new(sample_rate, 700.0),
            reverb_hp_r: ButterworthHighpass::new(sample_rate, 700.0),
            reverb: StereoReverb::new(sample_rate),
            comp_l: Compressor::new(sample_rate),
            comp_r: Compressor::new(sample_rate),
            command_tx,
            command_rx,
            notify_tx,
            notify_rx,
        }
    }

    /// Mint a control-thread handle. Clones share the parameter bank and
    /// queues.
    pub fn controller(&self) -> Controller {
        Controller {
            params: Arc::clone(&self.params),
            commands: self.command_tx.clone(),
            notifications: self.notify_rx.clone(),
        }
    }

    /// Engine sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // ------------------------------------------------------------------
    // Parameter API (engine-side mirror of the Controller)
    // ------------------------------------------------------------------

    /// Clamped parameter write.
    pub fn set_parameter(&self, param: Param, value: f32) {
        self.params.set(param, value);
    }

    /// Raw parameter read.
    pub fn get_parameter(&self, param: Param) -> f32 {
        self.params.get(param)
    }

    /// Bulk unclamped parameter write.
    pub fn set_parameters(&self, values: &[f32]) {
        self.params.set_all(values);
    }

    // ------------------------------------------------------------------
    // Wavetable API
    // ------------------------------------------------------------------

    /// Allocate a zeroed wavetable in a user slot.
    pub fn setup_waveform(&mut self, slot: usize, size: usize) -> Result<(), EngineError> {
        if slot >= NUM_FTABLES {
            return Err(EngineError::WaveformSlot(slot));
        }
        if size == 0 {
            return Err(EngineError::EmptyWaveform);
        }
        self.tables.install(slot, Wavetable::zeroed(size));
        log::debug!("wavetable slot {slot} allocated ({size} samples)");
        Ok(())
    }

    /// Write one sample into a user wavetable.
    pub fn set_waveform_value(
        &mut self,
        slot: usize,
        index: usize,
        value: f32,
    ) -> Result<(), EngineError> {
        let table = self
            .tables
            .table_mut(slot)
            .ok_or(EngineError::WaveformSlot(slot))?;
        if index >= table.len() {
            return Err(EngineError::WaveformIndex {
                index,
                size: table.len(),
            });
        }
        table.set(index, value);
        Ok(())
    }

    /// Install a complete wavetable into a user slot.
    pub fn install_waveform(&mut self, slot: usize, samples: &[f32]) -> Result<(), EngineError> {
        if slot >= NUM_FTABLES {
            return Err(EngineError::WaveformSlot(slot));
        }
        if samples.is_empty() {
            return Err(EngineError::EmptyWaveform);
        }
        self.tables.install(slot, Wavetable::from_samples(samples));
        log::debug!("wavetable slot {slot} installed ({} samples)", samples.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Note ingress
    // ------------------------------------------------------------------

    /// Key a note on: register it as held and, unless the arp owns
    /// voicing, start a voice.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if usize::from(note) >= NUM_MIDI_NOTES {
            return;
        }
        self.held.retain(|&n| n != note);
        self.held.insert(0, note);
        self.notify(EngineNotification::HeldNotesChanged);

        if self.params.get(Param::ArpIsOn) == 1.0 {
            return;
        }
        let frequency = self.tuning.frequency(note);
        self.turn_on_key_with_freq(note, velocity, frequency);
    }

    /// Key a note off: unregister it and, unless the arp owns voicing,
    /// release (or hand off) the voice.
    pub fn note_off(&mut self, note: u8) {
        if usize::from(note) >= NUM_MIDI_NOTES {
            return;
        }
        self.held.retain(|&n| n != note);
        self.notify(EngineNotification::HeldNotesChanged);

        if self.params.get(Param::ArpIsOn) == 1.0 {
            return;
        }
        self.turn_off_key(note);
    }

    /// Release every held note smoothly. With the arp enabled the
    /// scheduler still owns releases of its own notes.
    pub fn stop_all_notes(&mut self) {
        self.held.clear();
        self.notify(EngineNotification::HeldNotesChanged);

        if self.params.get(Param::ArpIsOn) == 1.0 {
            return;
        }
        if self.params.get(Param::IsMono) == 1.0 {
            self.turn_off_key(60);
        } else {
            for note in 0..NUM_MIDI_NOTES as u8 {
                self.turn_off_key(note);
            }
        }
    }

    /// Hard-reset: silence every voice, clear held notes and arp state,
    /// and switch the arp off. May click.
    pub fn reset(&mut self) {
        self.held.clear();
        self.arp.clear_notes();
        self.arp.beat_counter = 0;
        self.params.set(Param::ArpIsOn, 0.0);
        self.p[Param::ArpIsOn] = 0.0;
        self.mono_voice.clear();
        for voice in self.voices.iter_mut() {
            voice.clear();
        }
        self.notify(EngineNotification::HeldNotesChanged);
        self.notify(EngineNotification::PlayingNotesChanged);
        log::debug!("engine hard reset");
    }

    /// Rewind the arp/seq clock and beat counter.
    pub fn reset_sequencer(&mut self) {
        self.arp.reset_clock();
        self.notify(EngineNotification::BeatCounterChanged(0));
    }

    /// Feed a raw 3-byte MIDI message.
    pub fn handle_midi(&mut self, data: [u8; 3]) {
        match midi::decode(data) {
            Some(MidiMessage::NoteOn { note, velocity }) => self.note_on(note, velocity),
            Some(MidiMessage::NoteOff { note }) => self.note_off(note),
            Some(MidiMessage::AllNotesOff) => self.stop_all_notes(),
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Introspection (control-side display, tests)
    // ------------------------------------------------------------------

    /// Currently held notes, most recent first.
    pub fn held_notes(&self) -> &[u8] {
        &self.held
    }

    /// Polyphonic voice slots.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// The dedicated mono voice.
    pub fn mono_voice(&self) -> &Voice {
        &self.mono_voice
    }

    /// Number of voices not in the Off stage (mono mode counts the mono
    /// voice only).
    pub fn active_voice_count(&self) -> usize {
        if self.params.get(Param::IsMono) == 1.0 {
            usize::from(self.mono_voice.stage != VoiceStage::Off)
        } else {
            self.voices
                .iter()
                .filter(|v| v.stage != VoiceStage::Off)
                .count()
        }
    }

    /// True when some voice currently holds this note.
    pub fn is_note_playing(&self, note: u8) -> bool {
        let n = i32::from(note);
        if self.params.get(Param::IsMono) == 1.0 {
            self.mono_voice.root_note == n && self.mono_voice.stage != VoiceStage::Off
        } else {
            self.voices
                .iter()
                .any(|v| v.root_note == n && v.stage != VoiceStage::Off)
        }
    }

    /// The mono voice's target frequency in Hz.
    pub fn mono_frequency(&self) -> f32 {
        self.mono_frequency
    }

    /// Current arp/seq beat counter.
    pub fn arp_beat_counter(&self) -> u32 {
        self.arp.beat_counter
    }

    // ------------------------------------------------------------------
    // Render
    // ------------------------------------------------------------------

    /// Render `min(out_left.len(), out_right.len())` stereo frames.
    ///
    /// Callers with a buffer offset pass pre-sliced channel buffers.
    /// This never fails: it renders audio or silence.
    pub fn process(&mut self, out_left: &mut [f32], out_right: &mut [f32]) {
        let frames = out_left.len().min(out_right.len());

        self.drain_commands();
        // Latch parameters: all reads within this buffer see one snapshot
        let params = Arc::clone(&self.params);
        params.latch(&mut self.p);
        self.prepare_buffer();

        let seconds_per_beat = 0.25 * 60.0 / f64::from(self.p[Param::ArpRate]);
        let sample_rate = f64::from(self.sample_rate);

        for frame in 0..frames {
            // Mono <-> poly transition clears every voice
            if self.p[Param::IsMono] != self.prev_mono_status {
                self.prev_mono_status = self.p[Param::IsMono];
                self.clear_all_voices();
                self.arp.last_notes.clear();
            }

            // Arp/seq clock: runs while enabled, or while notes from a
            // previous beat still need releasing
            if self.p[Param::ArpIsOn] == 1.0 || !self.arp.last_notes.is_empty() {
                if self.arp.advance(seconds_per_beat, sample_rate) {
                    self.fire_beat();
                }
            }

            // LFOs
            self.lfo1_value = self
                .lfo1
                .advance(LfoShape::from_selector(self.p[Param::Lfo1Index]));
            self.lfo2_value = self
                .lfo2
                .advance(LfoShape::from_selector(self.p[Param::Lfo2Index]));

            // Portamento
            let detune = self.detune_smooth.advance(self.p[Param::DetuningMultiplier]);
            let morph = self.morph_smooth.advance(self.p[Param::MorphBalance]);
            let cutoff = self.cutoff_smooth.advance(self.p[Param::Cutoff]);
            let resonance = self.resonance_smooth.advance(self.p[Param::Resonance]);
            let mono_freq = self.mono_freq_smooth.advance(self.mono_frequency);

            // Voice mixdown (mono bus)
            let is_mono = self.p[Param::IsMono] == 1.0;
            let mut voice_sum = 0.0f32;
            {
                let ctx = VoiceContext {
                    p: &self.p,
                    bank: &self.tables,
                    sine: &self.sine,
                    is_mono,
                    mono_freq_smooth: mono_freq,
                    detune_smooth: detune,
                    morph_balance_smooth: morph,
                    cutoff_smooth: cutoff,
                    resonance_smooth: resonance,
                    lfo1: self.lfo1_value,
                    lfo2: self.lfo2_value,
                    sample_rate: self.sample_rate,
                };
                if is_mono {
                    if self.mono_voice.is_sounding() {
                        voice_sum += self.mono_voice.run(&ctx);
                    }
                } else {
                    for voice in self.voices.iter_mut() {
                        if voice.is_sounding() {
                            voice_sum += voice.run(&ctx);
                        }
                    }
                }
            }

            let (left, right) = self.run_fx_chain(voice_sum);
            out_left[frame] = left;
            out_right[frame] = right;
        }
    }

    /// Global FX: bitcrush → autopan → phaser → delay → reverb hi-pass →
    /// reverb → post-gain → compressor → master.
    #[inline]
    fn run_fx_chain(&mut self, voice_sum: f32) -> (f32, f32) {
        // Bitcrush, hold clock optionally wobbled by a bipolar LFO
        let mut crush_rate = self.p[Param::BitCrushSampleRate];
        match self.p[Param::BitcrushLfo] as i32 {
            1 => crush_rate *= 1.0 + 0.5 * self.lfo1_value * self.p[Param::Lfo1Amplitude],
            2 => crush_rate *= 1.0 + 0.5 * self.lfo2_value * self.p[Param::Lfo2Amplitude],
            _ => {}
        }
        self.bitcrush
            .set_crush_rate(Param::BitCrushSampleRate.clamp(crush_rate));
        let crushed = self.bitcrush.process(voice_sum);

        // Autopan splits the mono bus into stereo
        let pan_scale = match self.p[Param::AutopanLfo] as i32 {
            1 => 0.5 * (1.0 + self.lfo1_value) * self.p[Param::Lfo1Amplitude],
            2 => 0.5 * (1.0 + self.lfo2_value) * self.p[Param::Lfo2Amplitude],
            _ => 1.0,
        };
        let (pan_l, pan_r) = self.autopan.process(crushed, pan_scale);

        // Phaser, skipped entirely at zero mix
        let mut fx_l = pan_l;
        let mut fx_r = pan_r;
        let phaser_mix = self.p[Param::PhaserMix];
        if phaser_mix > 0.0 {
            let (wet_l, wet_r) = self.phaser.process_stereo(pan_l, pan_r);
            fx_l = crossfade(pan_l, wet_l, phaser_mix);
            fx_r = crossfade(pan_r, wet_r, phaser_mix);
        }

        // Ping-pong delay: left runs long, right runs long into a short
        // repeat, and a short fill from the right input rounds it out
        let delay_out_l = self.delay_l.process(fx_l);
        let delay_out_r = self.delay_r.process(fx_r);
        let fill_out = self.delay_fill.process(fx_r);
        let mut delay_out_rr = self.delay_rr.process(delay_out_r);
        delay_out_rr += fill_out;

        let delay_mix = self.p[Param::DelayMix] * self.p[Param::DelayOn];
        let mixed_l = crossfade(fx_l, delay_out_l, delay_mix);
        let mixed_r = crossfade(fx_r, delay_out_rr, delay_mix);

        // Reverb pre-emphasis: Butterworth hi-pass plus 6 dB of pre-gain
        let but_l = self.reverb_hp_l.process(mixed_l) * 2.0;
        let but_r = self.reverb_hp_r.process(mixed_r) * 2.0;

        let (rev_l, rev_r) = self.reverb.process_stereo(but_l, but_r);
        let reverb_mix = self.p[Param::ReverbMix] * self.p[Param::ReverbOn];
        let rev_mixed_l = crossfade(mixed_l, rev_l, reverb_mix);
        let rev_mixed_r = crossfade(mixed_r, rev_r, reverb_mix);

        // 6 dB post-gain into the per-channel compressors
        let comp_l = self.comp_l.process(rev_mixed_l * 2.0);
        let comp_r = self.comp_r.process(rev_mixed_r * 2.0);

        let master = self.p[Param::MasterVolume];
        (comp_l * master, comp_r * master)
    }

    /// Per-buffer updates: smoother half-times, LFO rates, FX parameters,
    /// and retirement of released voices.
    fn prepare_buffer(&mut self) {
        self.mono_freq_smooth.set_half_time(self.p[Param::Glide]);
        self.lfo1.set_frequency(self.p[Param::Lfo1Rate]);
        self.lfo2.set_frequency(self.p[Param::Lfo2Rate]);

        self.autopan.set_frequency(self.p[Param::AutoPanFrequency]);
        self.autopan.set_amount(self.p[Param::AutoPanAmount]);
        self.bitcrush.set_bit_depth(self.p[Param::BitCrushDepth]);

        let delay_time = self.p[Param::DelayTime];
        self.delay_l.set_time(delay_time * 2.0 + DELAY_TIME_FLOOR);
        self.delay_r.set_time(delay_time * 2.0 + DELAY_TIME_FLOOR);
        self.delay_rr.set_time(delay_time + DELAY_TIME_FLOOR);
        self.delay_fill.set_time(delay_time + DELAY_TIME_FLOOR);
        self.delay_l.set_feedback(self.p[Param::DelayFeedback]);
        self.delay_r.set_feedback(self.p[Param::DelayFeedback]);

        self.phaser.set_notch_width(self.p[Param::PhaserNotchWidth]);
        self.phaser.set_feedback(self.p[Param::PhaserFeedback]);
        self.phaser.set_rate_bpm(self.p[Param::PhaserRate]);

        self.reverb_hp_l.set_frequency(self.p[Param::ReverbHighPass]);
        self.reverb_hp_r.set_frequency(self.p[Param::ReverbHighPass]);
        self.reverb.set_feedback(self.p[Param::ReverbFeedback]);
        self.reverb.set_lowpass_cutoff(0.5 * self.sample_rate);

        // Retire voices whose release has decayed below audibility.
        // Done per buffer; letting the release linger a few hundred
        // samples is inaudible and keeps the hot loop lean.
        let mut retired = false;
        if self.p[Param::IsMono] == 1.0 {
            if self.mono_voice.stage == VoiceStage::Release
                && self.mono_voice.amp < RELEASE_AMPLITUDE_THRESHOLD
            {
                self.mono_voice.clear();
                retired = true;
            }
        } else {
            for voice in self.voices.iter_mut() {
                if voice.stage == VoiceStage::Release && voice.amp < RELEASE_AMPLITUDE_THRESHOLD {
                    voice.clear();
                    retired = true;
                }
            }
        }
        if retired {
            self.notify(EngineNotification::PlayingNotesChanged);
        }
    }

    /// One arp/seq beat: rebuild the pattern, release the previous
    /// beat's notes, then fire the current step.
    fn fire_beat(&mut self) {
        if self.p[Param::ArpIsOn] == 1.0 {
            // Re-read notes per octave only at beat boundaries so the
            // fired notes and their releases agree
            let npo = self.tuning.notes_per_octave() as i32;
            self.notes_per_octave = if npo > 0 { npo } else { 12 };

            if self.p[Param::ArpIsSequencer] == 1.0 {
                self.arp.rebuild_sequencer(&self.p, self.notes_per_octave);
            } else {
                self.arp.rebuild_arp(&self.held, &self.p, self.notes_per_octave);
            }
        }

        // Release the previous beat's notes
        let mut last = std::mem::take(&mut self.arp.last_notes);
        for &note in &last {
            self.turn_off_key(note);
        }
        last.clear();
        self.arp.last_notes = last;

        // Nothing held: rewind the pattern position and wait
        if self.held.is_empty() {
            if self.arp.beat_counter > 0 {
                self.arp.beat_counter = 0;
                self.notify(EngineNotification::BeatCounterChanged(0));
            }
            return;
        }
        if self.arp.pattern.is_empty() {
            return;
        }

        let position = self.arp.beat_counter as usize % self.arp.pattern.len();
        self.arp.beat_counter = self.arp.beat_counter.wrapping_add(1);
        self.notify(EngineNotification::BeatCounterChanged(self.arp.beat_counter));

        let step = self.arp.pattern[position];
        if self.p[Param::ArpIsSequencer] == 1.0 {
            // Sequencer: the step is an offset applied to every held key
            if step.on {
                let held_count = self.held.len();
                for i in 0..held_count {
                    let note = i32::from(self.held[i]) + step.note;
                    if (0..NUM_MIDI_NOTES as i32).contains(&note) {
                        self.turn_on_key(note as u8, 127);
                        self.arp.record_last(note as u8);
                    }
                }
            }
        } else if (0..NUM_MIDI_NOTES as i32).contains(&step.note) {
            self.turn_on_key(step.note as u8, 127);
            self.arp.record_last(step.note as u8);
        }
    }

    /// Start a voice on a note at the tuning table's frequency.
    fn turn_on_key(&mut self, note: u8, velocity: u8) {
        let frequency = self.tuning.frequency(note);
        self.turn_on_key_with_freq(note, velocity, frequency);
    }

    fn turn_on_key_with_freq(&mut self, note: u8, velocity: u8, frequency: f32) {
        if usize::from(note) >= NUM_MIDI_NOTES {
            return;
        }

        if self.params.get(Param::IsMono) == 1.0 {
            self.mono_frequency = frequency;
            // Retrigger mode forces one released sample so the attack
            // restarts from a decaying level; legato keeps the envelopes
            // running
            if self.params.get(Param::MonoIsLegato) == 0.0 {
                self.mono_voice.force_release_tick();
            }
            self.mono_voice.start_note(note, velocity, frequency);
        } else {
            let root = i32::from(note);
            let same_pitch = self.voices.iter().position(|v| v.root_note == root);
            match same_pitch {
                // Revoice the slot already sounding this pitch
                Some(slot) => self.playing_index = slot,
                None => {
                    let mut idle = None;
                    for offset in 1..=MAX_POLYPHONY {
                        let slot = (self.playing_index + offset) % MAX_POLYPHONY;
                        if self.voices[slot].root_note == NO_NOTE {
                            idle = Some(slot);
                            break;
                        }
                    }
                    self.playing_index = match idle {
                        Some(slot) => slot,
                        // All slots busy: steal the oldest assignment
                        None => (self.playing_index + 1) % MAX_POLYPHONY,
                    };
                }
            }
            self.voices[self.playing_index].start_note(note, velocity, frequency);
        }

        self.notify(EngineNotification::PlayingNotesChanged);
    }

    /// Release a note's voice; in mono mode, hand the voice to the most
    /// recently held remaining key instead of silencing.
    fn turn_off_key(&mut self, note: u8) {
        if usize::from(note) >= NUM_MIDI_NOTES {
            return;
        }

        if self.params.get(Param::IsMono) == 1.0 {
            if self.held.is_empty() || self.params.get(Param::ArpIsOn) == 1.0 {
                // Last key up, or the scheduler owns voicing: let go
                self.mono_voice.release();
            } else {
                // Other keys still down: re-voice the head of the
                // registry (come-and-come-again)
                let head = self.held[0];
                let frequency = self.tuning.frequency(head);
                self.mono_frequency = frequency;
                self.mono_voice.root_note = i32::from(head);
                self.mono_voice.set_pitch(frequency);
                if self.params.get(Param::MonoIsLegato) == 0.0 {
                    self.mono_voice.force_release_tick();
                }
                self.mono_voice.resume();
            }
        } else {
            // A note stolen before its note-off simply has no voice left
            // to release
            if let Some(voice) = self
                .voices
                .iter_mut()
                .find(|v| v.root_note == i32::from(note))
            {
                voice.release();
            }
        }

        self.notify(EngineNotification::PlayingNotesChanged);
    }

    /// Clear every voice (mono/poly switch path).
    fn clear_all_voices(&mut self) {
        self.mono_voice.clear();
        for voice in self.voices.iter_mut() {
            voice.clear();
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                EngineCommand::NoteOn { note, velocity } => self.note_on(note, velocity),
                EngineCommand::NoteOff { note } => self.note_off(note),
                EngineCommand::StopAllNotes => self.stop_all_notes(),
                EngineCommand::Reset => self.reset(),
                EngineCommand::ResetSequencer => self.reset_sequencer(),
            }
        }
    }

    #[inline]
    fn notify(&self, notification: EngineNotification) {
        // Dropping a notification on a full queue is harmless; blocking
        // here is not an option
        let _ = self.notify_tx.try_send(notification);
    }
}
