#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::TimeSignature;

/// Host tempo and meter.
///
/// Tempo-synced rates are expressed relative to 120 BPM: a synced LFO at
/// 240 BPM runs twice as fast as the same settings free-running.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub bpm: f64,
    pub time_signature: TimeSignature,
}

impl Tempo {
    /// Tempo at which synced and free rates coincide
    pub const REFERENCE_BPM: f64 = 120.0;

    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            time_signature: TimeSignature::FOUR_FOUR,
        }
    }

    /// Set the time signature
    pub fn time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    /// Multiplier applied to tempo-synced rates
    pub fn sync_ratio(&self) -> f32 {
        (self.bpm / Self::REFERENCE_BPM) as f32
    }

    pub fn sync_ratio_inv(&self) -> f32 {
        (Self::REFERENCE_BPM / self.bpm) as f32
    }

    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(Self::REFERENCE_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_tempo_has_unit_ratio() {
        let tempo = Tempo::default();
        assert!((tempo.sync_ratio() - 1.0).abs() < 1e-6);
        assert!((tempo.sync_ratio_inv() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn doubling_tempo_doubles_ratio() {
        let tempo = Tempo::new(240.0).time_signature(TimeSignature::THREE_FOUR);
        assert!((tempo.sync_ratio() - 2.0).abs() < 1e-6);
        assert!((tempo.beats_per_second() - 4.0).abs() < 1e-9);
        assert_eq!(tempo.time_signature, TimeSignature::THREE_FOUR);
    }
}
