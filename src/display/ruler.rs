//! Beat and time rulers drawn under a sampled waveform.
//!
//! All positions are normalized to the drawn time span: x = 0 is the start
//! of the simulation, x = 1 is `drawn_time` seconds later.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::Tempo;

/// Narrowest a labelled measure group may be, as a fraction of the width
pub const MIN_MEASURE_WIDTH: f64 = 0.04;

/// Candidate spacings for the time ruler, in seconds
pub const TIME_DELTAS: [f32; 8] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

pub const MAX_TIME_LABELS: f32 = 5.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatMark {
    pub x: f32,
    /// Beat index from the start, 0-based
    pub beat: usize,
    /// Major mark carrying a beat number
    pub labelled: bool,
    /// First beat of a bar
    pub bar_start: bool,
}

impl BeatMark {
    /// Beat numbers count from 1.
    pub fn label(&self) -> Option<String> {
        self.labelled.then(|| format!("{}", self.beat + 1))
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMark {
    pub x: f32,
    pub seconds: f32,
    /// Spacing of the ruler this mark belongs to
    pub delta: f32,
}

impl TimeMark {
    pub fn label(&self) -> String {
        let t = self.seconds;
        if (t.round() - t).abs() < 0.05 {
            format!("{} s", t.round() as i64)
        } else if self.delta < 0.1 {
            format!("{:.2} s", t)
        } else {
            format!("{:.1} s", t)
        }
    }
}

/// Beat grid for a span of `drawn_time` seconds.
///
/// Every beat gets a mark while bars are wide enough. When they get
/// narrower than [`MIN_MEASURE_WIDTH`], only every 2nd, 4th, ... bar is
/// labelled and the unlabelled beats are left out.
pub fn beat_marks(tempo: &Tempo, drawn_time: f32) -> Vec<BeatMark> {
    let bps = tempo.beats_per_second();
    let drawn = drawn_time as f64;
    if !(bps > 0.0) || !(drawn > 0.0) {
        return Vec::new();
    }

    let signature = tempo.time_signature;
    let per_bar = signature.beats_per_bar();
    let denominator = signature.denominator.max(1) as usize;
    let quarters = signature.quarters_per_beat();

    let delta_beat = quarters / (bps * drawn);
    let n_beats = ((drawn * bps / quarters).ceil() as usize).max(1);

    let mut measure_width = delta_beat * per_bar as f64;
    let mut every_measure = 1;
    while measure_width < MIN_MEASURE_WIDTH && every_measure < 1 << 16 {
        measure_width *= 2.0;
        every_measure *= 2;
    }

    let mut marks = Vec::new();
    for beat in 0..=n_beats {
        let x = (delta_beat * beat as f64) as f32;
        let bar_start = beat % per_bar == 0;
        if beat % (per_bar * every_measure) == 0 || n_beats <= denominator {
            marks.push(BeatMark {
                x,
                beat,
                labelled: true,
                bar_start,
            });
        } else if every_measure == 1 {
            marks.push(BeatMark {
                x,
                beat,
                labelled: false,
                bar_start,
            });
        }
    }
    marks
}

/// Seconds ruler with at most five labels for spans up to 50 s.
pub fn time_marks(drawn_time: f32) -> Vec<TimeMark> {
    if !(drawn_time > 0.0) {
        return Vec::new();
    }

    let delta = TIME_DELTAS
        .iter()
        .copied()
        .find(|&delta| drawn_time / delta <= MAX_TIME_LABELS)
        .unwrap_or(TIME_DELTAS[TIME_DELTAS.len() - 1]);

    let count = (drawn_time / delta) as usize + 1;
    (0..count)
        .map(|l| {
            let seconds = delta * l as f32;
            TimeMark {
                x: seconds / drawn_time,
                seconds,
                delta,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::TimeSignature;

    #[test]
    fn test_two_seconds_at_120_bpm() {
        let marks = beat_marks(&Tempo::new(120.0), 2.0);
        // 4 beats plus the closing mark, all on screen
        assert_eq!(marks.len(), 5);
        assert!((marks[1].x - 0.25).abs() < 1e-6);
        assert_eq!(marks[0].label().as_deref(), Some("1"));
        assert!(marks[0].bar_start);
        assert!(marks[4].bar_start);
    }

    #[test]
    fn test_eighth_note_meter_spaces_by_eighths() {
        let tempo = Tempo::new(120.0).time_signature(TimeSignature::SIX_EIGHT);
        let marks = beat_marks(&tempo, 1.0);
        // An eighth at 120 BPM lasts 0.25 s
        assert!((marks[1].x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_long_spans_thin_out_labels() {
        let marks = beat_marks(&Tempo::new(120.0), 60.0);
        // Bars are 2 s of 60 s, under the minimum width: every other bar only
        assert!(marks.iter().all(|m| m.labelled));
        assert!(marks.iter().all(|m| m.beat % 8 == 0));
        assert_eq!(marks[1].label().as_deref(), Some("9"));
    }

    #[test]
    fn test_time_ruler_picks_spacing() {
        let marks = time_marks(2.0);
        assert!((marks[1].seconds - 0.5).abs() < 1e-6);
        assert_eq!(marks.len(), 5);
        assert_eq!(marks[2].label(), "1 s");
        assert_eq!(marks[1].label(), "0.5 s");
    }

    #[test]
    fn test_short_span_uses_two_decimals() {
        let marks = time_marks(0.2);
        assert!((marks[1].delta - 0.05).abs() < 1e-6);
        assert_eq!(marks[1].label(), "0.05 s");
    }

    #[test]
    fn test_empty_span_has_no_marks() {
        assert!(time_marks(0.0).is_empty());
        assert!(beat_marks(&Tempo::new(120.0), 0.0).is_empty());
    }
}
