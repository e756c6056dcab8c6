#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::ops::RangeInclusive;

use super::trigger::{self, StepTrigger};
use crate::N_STEPS;

/// Step values, loop region and trigger mask of a step-sequencer LFO.
///
/// Fixed-size and `Copy`: edits are plain in-place writes, and snapshots
/// for undo or for the audio thread are cheap copies.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSequencerStorage {
    /// One value per step, -1..1 (0..1 when the LFO is unipolar)
    pub steps: [f32; N_STEPS],
    /// Inclusive loop bounds; `loop_start` may exceed `loop_end`
    pub loop_start: usize,
    pub loop_end: usize,
    pub shuffle: f32,
    /// Packed per-step triggers, see [`trigger`](super::trigger)
    pub trigmask: u64,
}

impl StepSequencerStorage {
    pub fn new() -> Self {
        Self {
            steps: [0.0; N_STEPS],
            loop_start: 0,
            loop_end: N_STEPS - 1,
            shuffle: 0.0,
            trigmask: 0,
        }
    }

    /// Build storage from step values, looping over all steps.
    pub fn from_steps(steps: [f32; N_STEPS]) -> Self {
        Self {
            steps,
            ..Self::new()
        }
    }

    /// Loop points as stored, each limited to the last step. Storage loaded
    /// from a patch may carry anything.
    fn bounds(&self) -> (usize, usize) {
        (self.loop_start.min(N_STEPS - 1), self.loop_end.min(N_STEPS - 1))
    }

    /// Loop region with its bounds put in order.
    pub fn loop_range(&self) -> RangeInclusive<usize> {
        let (start, end) = self.bounds();
        start.min(end)..=start.max(end)
    }

    pub fn loop_len(&self) -> usize {
        let (start, end) = self.bounds();
        start.abs_diff(end) + 1
    }

    pub fn trigger(&self, step: usize) -> StepTrigger {
        trigger::trigger_at(self.trigmask, step)
    }

    pub fn triggers(&self) -> [StepTrigger; N_STEPS] {
        trigger::unpack(self.trigmask)
    }

    /// Step that follows `step` during playback.
    ///
    /// With ordered bounds playback wraps from `loop_end` back to
    /// `loop_start`. With reversed bounds the steps between them are
    /// skipped: reaching `loop_start` jumps to just past `loop_end`.
    pub fn next_step(&self, step: usize) -> usize {
        let (start, end) = self.bounds();
        let next = step + 1;
        if end >= start {
            if next > end {
                return start;
            }
        } else if next >= start {
            return end + 1;
        }
        next
    }
}

impl Default for StepSequencerStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loops_over_every_step() {
        let storage = StepSequencerStorage::new();
        assert_eq!(storage.loop_range(), 0..=15);
        assert_eq!(storage.loop_len(), 16);
    }

    #[test]
    fn reversed_bounds_are_normalized() {
        let storage = StepSequencerStorage {
            loop_start: 12,
            loop_end: 3,
            ..StepSequencerStorage::new()
        };
        assert_eq!(storage.loop_range(), 3..=12);
        assert_eq!(storage.loop_len(), 10);
    }

    #[test]
    fn playback_wraps_inside_ordered_loop() {
        let storage = StepSequencerStorage {
            loop_start: 2,
            loop_end: 5,
            ..StepSequencerStorage::new()
        };
        assert_eq!(storage.next_step(3), 4);
        assert_eq!(storage.next_step(5), 2);
    }

    #[test]
    fn playback_skips_between_reversed_bounds() {
        let storage = StepSequencerStorage {
            loop_start: 10,
            loop_end: 4,
            ..StepSequencerStorage::new()
        };
        assert_eq!(storage.next_step(9), 5);
        assert_eq!(storage.next_step(5), 6);
    }

    #[test]
    fn out_of_range_loop_points_stay_on_steps() {
        let storage = StepSequencerStorage {
            loop_start: 3,
            loop_end: 40,
            ..StepSequencerStorage::new()
        };
        assert_eq!(storage.loop_range(), 3..=15);
        assert_eq!(storage.loop_len(), 13);
        assert_eq!(storage.next_step(14), 15);
        assert_eq!(storage.next_step(15), 3);

        let wild = StepSequencerStorage {
            loop_start: 99,
            loop_end: 99,
            ..StepSequencerStorage::new()
        };
        assert_eq!(wild.next_step(15), 15);
        assert!((0..N_STEPS).all(|step| wild.next_step(step) < N_STEPS));
    }
}
