#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Host time signature, used to lay out the beat ruler of synced LFOs
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Number of beats per bar (numerator)
    pub numerator: u8,
    /// Note value that gets one beat (denominator: 4 = quarter, 8 = eighth)
    pub denominator: u8,
}

impl TimeSignature {
    /// Standard 4/4 time
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// 3/4 time (waltz)
    pub const THREE_FOUR: TimeSignature = TimeSignature {
        numerator: 3,
        denominator: 4,
    };

    /// 6/8 time
    pub const SIX_EIGHT: TimeSignature = TimeSignature {
        numerator: 6,
        denominator: 8,
    };

    /// 7/8 time
    pub const SEVEN_EIGHT: TimeSignature = TimeSignature {
        numerator: 7,
        denominator: 8,
    };

    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Length of one beat in quarter notes
    /// 4/4 → 1.0, 6/8 → 0.5, 2/2 → 2.0
    pub fn quarters_per_beat(&self) -> f64 {
        4.0 / self.denominator.max(1) as f64
    }

    /// Beats per bar, never zero
    pub fn beats_per_bar(&self) -> usize {
        self.numerator.max(1) as usize
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}
