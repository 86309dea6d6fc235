//! Arpeggiator / step-sequencer scheduler.
//!
//! Keeps the beat clock and the expanded note pattern. The engine calls
//! [`ArpScheduler::advance`] every sample while the scheduler is live
//! (arp enabled, or residual notes still awaiting release) and performs
//! the actual key on/off work itself; everything here is bookkeeping and
//! pattern expansion, which keeps the expansion unit-testable.
//!
//! All three buffers reserve their full capacity at construction — the
//! audio thread never grows them.

use libm::roundf;

use crate::params::{Param, Params, MAX_SEQUENCER_STEPS};

/// Upper bound on expanded pattern length (128 notes x 4 octaves, up and
/// down).
pub const MAX_ARP_NOTES: usize = 1024;

/// One expanded pattern step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqNote {
    /// Note number (arp mode) or note offset (sequencer mode). May land
    /// outside MIDI range; the engine range-checks before keying.
    pub note: i32,
    /// Whether this step sounds. Always true in arp mode.
    pub on: bool,
}

/// Beat clock plus expanded pattern state.
pub struct ArpScheduler {
    /// Samples elapsed since the scheduler started running.
    sample_counter: f64,
    /// Seconds elapsed (sample counter / sample rate).
    time: f64,
    /// Beats fired since the pattern last restarted.
    pub beat_counter: u32,
    /// Expanded pattern played this cycle.
    pub pattern: Vec<SeqNote>,
    /// Held notes snapshot in press order (oldest first).
    held_scratch: Vec<u8>,
    /// Notes keyed on at the previous beat, to release at the next.
    pub last_notes: Vec<u8>,
}

impl ArpScheduler {
    /// Create an idle scheduler with all buffers pre-reserved.
    pub fn new() -> Self {
        Self {
            sample_counter: 0.0,
            time: 0.0,
            beat_counter: 0,
            pattern: Vec::with_capacity(MAX_ARP_NOTES),
            held_scratch: Vec::with_capacity(MAX_ARP_NOTES),
            last_notes: Vec::with_capacity(MAX_ARP_NOTES),
        }
    }

    /// Advance the clock one sample; true when this sample starts a new
    /// beat. Wrap-safe: a boundary is a decrease of `time mod spb`, or a
    /// non-advance of time itself.
    #[inline]
    pub fn advance(&mut self, seconds_per_beat: f64, sample_rate: f64) -> bool {
        let old_time = self.time;
        let r0 = old_time % seconds_per_beat;
        self.time = self.sample_counter / sample_rate;
        let r1 = self.time % seconds_per_beat;
        self.sample_counter += 1.0;
        r1 < r0 || old_time >= self.time
    }

    /// Rewind the beat clock and counter to zero.
    pub fn reset_clock(&mut self) {
        self.sample_counter = 0.0;
        self.time = 0.0;
        self.beat_counter = 0;
    }

    /// Drop all expanded state (pattern, scratch, pending releases).
    pub fn clear_notes(&mut self) {
        self.pattern.clear();
        self.held_scratch.clear();
        self.last_notes.clear();
    }

    /// Expand the step-sequencer parameters into the pattern.
    ///
    /// Each step contributes `round(pattern_i · npo/12)` scale degrees,
    /// pushed a full octave further from zero when its boost flag is set,
    /// with the step's gate flag carried along.
    pub fn rebuild_sequencer(&mut self, p: &Params, notes_per_octave: i32) {
        self.pattern.clear();
        self.held_scratch.clear();

        let npof = notes_per_octave as f32 / 12.0;
        let steps = (p[Param::ArpTotalSteps] as usize).min(MAX_SEQUENCER_STEPS);
        for step in 0..steps {
            let on = p[Param::seq_note_on(step)] > 0.5;
            let oct_boost = p[Param::seq_oct_boost(step)] as i32;
            let offset = roundf(p[Param::seq_pattern(step)] * npof) as i32;
            let boosted = if offset < 0 {
                offset - oct_boost * notes_per_octave
            } else {
                offset + oct_boost * notes_per_octave
            };
            self.push(SeqNote {
                note: boosted,
                on,
            });
        }
    }

    /// Expand held notes into an arpeggio pattern.
    ///
    /// `held` is most-recently-pressed first; the expansion runs oldest
    /// first. Directions: 0 = up, 1 = up then down with the head and tail
    /// played once, 2 = down.
    pub fn rebuild_arp(&mut self, held: &[u8], p: &Params, notes_per_octave: i32) {
        self.pattern.clear();
        self.held_scratch.clear();
        self.held_scratch.extend(held.iter().rev());

        let npof = notes_per_octave as f32 / 12.0;
        let count = self.held_scratch.len();
        let interval = roundf(p[Param::ArpInterval] * npof) as i32;
        let octaves = p[Param::ArpOctave] as i32 + 1;

        match p[Param::ArpDirection] as i32 {
            0 => {
                for octave in 0..octaves {
                    for i in 0..count {
                        let note = i32::from(self.held_scratch[i]) + octave * interval;
                        self.push(SeqNote { note, on: true });
                    }
                }
            }
            1 => {
                for octave in 0..octaves {
                    for i in 0..count {
                        let note = i32::from(self.held_scratch[i]) + octave * interval;
                        self.push(SeqNote { note, on: true });
                    }
                }
                // Down pass, skipping the apex and the base so neither
                // repeats where the passes meet
                for octave in (0..octaves).rev() {
                    for i in (0..count).rev() {
                        let first = i + 1 == count && octave + 1 == octaves;
                        let last = i == 0 && octave == 0;
                        if !first && !last {
                            let note = i32::from(self.held_scratch[i]) + octave * interval;
                            self.push(SeqNote { note, on: true });
                        }
                    }
                }
            }
            2 => {
                for octave in (0..octaves).rev() {
                    for i in (0..count).rev() {
                        let note = i32::from(self.held_scratch[i]) + octave * interval;
                        self.push(SeqNote { note, on: true });
                    }
                }
            }
            _ => {}
        }
    }

    /// Remember a note keyed on this beat so the next beat releases it.
    /// Silently drops past the reserved capacity.
    #[inline]
    pub fn record_last(&mut self, note: u8) {
        if self.last_notes.len() < MAX_ARP_NOTES {
            self.last_notes.push(note);
        }
    }

    #[inline]
    fn push(&mut self, note: SeqNote) {
        if self.pattern.len() < MAX_ARP_NOTES {
            self.pattern.push(note);
        }
    }
}

impl Default for ArpScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_fires_immediately_and_then_periodically() {
        let mut arp = ArpScheduler::new();
        let spb = 0.25;
        let sr = 44100.0;
        let mut boundaries = Vec::new();
        for i in 0..44100 {
            if arp.advance(spb, sr) {
                boundaries.push(i);
            }
        }
        assert_eq!(boundaries, vec![0, 11025, 22050, 33075]);
    }

    #[test]
    fn beat_period_tolerates_odd_rates() {
        let mut arp = ArpScheduler::new();
        // 93 BPM quarter-beats: spb = 60 / (4 * 93)
        let spb = 60.0 / (4.0 * 93.0);
        let sr = 44100.0;
        let mut last: Option<i64> = None;
        for i in 0..441_000i64 {
            if arp.advance(spb, sr) {
                if let Some(prev) = last {
                    let delta = i - prev;
                    let expected = (spb * sr) as i64;
                    assert!(
                        (delta - expected).abs() <= 1,
                        "beat period {delta}, expected {expected}±1"
                    );
                }
                last = Some(i);
            }
        }
    }

    #[test]
    fn arp_up_expands_held_notes_over_octaves() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpDirection] = 0.0;
        p[Param::ArpInterval] = 12.0;
        p[Param::ArpOctave] = 1.0; // two octaves
        // MRU order: 67 pressed last
        arp.rebuild_arp(&[67, 64, 60], &p, 12);
        let notes: Vec<i32> = arp.pattern.iter().map(|n| n.note).collect();
        assert_eq!(notes, vec![60, 64, 67, 72, 76, 79]);
    }

    #[test]
    fn arp_up_down_dedups_head_and_tail() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpDirection] = 1.0;
        p[Param::ArpInterval] = 12.0;
        p[Param::ArpOctave] = 1.0;
        arp.rebuild_arp(&[67, 64, 60], &p, 12);
        let notes: Vec<i32> = arp.pattern.iter().map(|n| n.note).collect();
        // H=3, O=2: 2·H·O − 2 = 10 positions
        assert_eq!(notes, vec![60, 64, 67, 72, 76, 79, 76, 72, 67, 64]);
    }

    #[test]
    fn arp_down_reverses() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpDirection] = 2.0;
        p[Param::ArpInterval] = 12.0;
        p[Param::ArpOctave] = 0.0;
        arp.rebuild_arp(&[64, 60], &p, 12);
        let notes: Vec<i32> = arp.pattern.iter().map(|n| n.note).collect();
        assert_eq!(notes, vec![64, 60]);
    }

    #[test]
    fn sequencer_applies_octave_boost_away_from_zero() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpTotalSteps] = 3.0;
        p[Param::ArpSeqPattern00] = 7.0;
        p[Param::ArpSeqOctBoost00] = 1.0;
        p[Param::ArpSeqNoteOn00] = 1.0;
        p[Param::ArpSeqPattern01] = -5.0;
        p[Param::ArpSeqOctBoost01] = 1.0;
        p[Param::ArpSeqNoteOn01] = 0.0;
        p[Param::ArpSeqPattern02] = 0.0;
        p[Param::ArpSeqNoteOn02] = 1.0;
        arp.rebuild_sequencer(&p, 12);
        assert_eq!(
            arp.pattern,
            vec![
                SeqNote { note: 19, on: true },
                SeqNote { note: -17, on: false },
                SeqNote { note: 0, on: true },
            ]
        );
    }

    #[test]
    fn sequencer_truncates_at_sixteen_steps() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpTotalSteps] = 99.0;
        arp.rebuild_sequencer(&p, 12);
        assert_eq!(arp.pattern.len(), MAX_SEQUENCER_STEPS);
    }

    #[test]
    fn microtonal_scaling_stretches_intervals() {
        let mut arp = ArpScheduler::new();
        let mut p = Params::defaults();
        p[Param::ArpDirection] = 0.0;
        p[Param::ArpInterval] = 12.0;
        p[Param::ArpOctave] = 1.0;
        // 24 notes per octave: an "octave" of interval 12 becomes 24 steps
        arp.rebuild_arp(&[60], &p, 24);
        let notes: Vec<i32> = arp.pattern.iter().map(|n| n.note).collect();
        assert_eq!(notes, vec![60, 84]);
    }
}
