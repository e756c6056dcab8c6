//! Per-step envelope retrigger flags.
//!
//! Editing works on one [`StepTrigger`] per step. Patches store the same
//! information packed into a 64-bit mask made of three 16-bit fields:
//!
//! ```text
//!   bits  0..16   retrigger amp and filter envelopes
//!   bits 16..32   retrigger filter envelope only
//!   bits 32..48   retrigger amp envelope only
//! ```
//!
//! Bit `i` of each field belongs to step `i`. A step sets at most one of its
//! three bits. Bits 48..64 are unused and dropped on rotation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::N_STEPS;

const FIELD: u64 = 0xffff;
const AMP_AND_FILTER_SHIFT: u32 = 0;
const FILTER_ONLY_SHIFT: u32 = 16;
const AMP_ONLY_SHIFT: u32 = 32;

/// Which envelopes a step retriggers when playback reaches it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepTrigger {
    #[default]
    None,
    AmpAndFilter,
    FilterOnly,
    AmpOnly,
}

impl StepTrigger {
    /// Click order: None → AmpAndFilter → FilterOnly → AmpOnly → None
    pub const CYCLE: [StepTrigger; 4] = [
        StepTrigger::None,
        StepTrigger::AmpAndFilter,
        StepTrigger::FilterOnly,
        StepTrigger::AmpOnly,
    ];

    pub fn next(self) -> Self {
        let index = Self::CYCLE.iter().position(|&t| t == self).unwrap_or(0);
        Self::CYCLE[(index + 1) % Self::CYCLE.len()]
    }

    pub fn previous(self) -> Self {
        let index = Self::CYCLE.iter().position(|&t| t == self).unwrap_or(0);
        Self::CYCLE[(index + Self::CYCLE.len() - 1) % Self::CYCLE.len()]
    }

    pub fn retriggers_amp(self) -> bool {
        matches!(self, StepTrigger::AmpAndFilter | StepTrigger::AmpOnly)
    }

    pub fn retriggers_filter(self) -> bool {
        matches!(self, StepTrigger::AmpAndFilter | StepTrigger::FilterOnly)
    }

    fn shift(self) -> Option<u32> {
        match self {
            StepTrigger::None => None,
            StepTrigger::AmpAndFilter => Some(AMP_AND_FILTER_SHIFT),
            StepTrigger::FilterOnly => Some(FILTER_ONLY_SHIFT),
            StepTrigger::AmpOnly => Some(AMP_ONLY_SHIFT),
        }
    }
}

/// All three mask bits belonging to `step`.
#[inline]
pub fn step_bits(step: usize) -> u64 {
    assert!(step < N_STEPS, "step index {} out of range", step);
    (1u64 << (step as u32 + AMP_AND_FILTER_SHIFT))
        | (1u64 << (step as u32 + FILTER_ONLY_SHIFT))
        | (1u64 << (step as u32 + AMP_ONLY_SHIFT))
}

/// Decode the trigger of one step. The first field wins if a malformed
/// mask sets more than one bit.
pub fn trigger_at(mask: u64, step: usize) -> StepTrigger {
    assert!(step < N_STEPS, "step index {} out of range", step);
    let bit = |shift: u32| mask & (1u64 << (step as u32 + shift)) != 0;

    if bit(AMP_AND_FILTER_SHIFT) {
        StepTrigger::AmpAndFilter
    } else if bit(FILTER_ONLY_SHIFT) {
        StepTrigger::FilterOnly
    } else if bit(AMP_ONLY_SHIFT) {
        StepTrigger::AmpOnly
    } else {
        StepTrigger::None
    }
}

/// Clear all three bits of `step`, then set the one for `trigger`.
pub fn with_trigger(mask: u64, step: usize, trigger: StepTrigger) -> u64 {
    let cleared = mask & !step_bits(step);
    match trigger.shift() {
        Some(shift) => cleared | (1u64 << (step as u32 + shift)),
        None => cleared,
    }
}

pub fn unpack(mask: u64) -> [StepTrigger; N_STEPS] {
    let mut triggers = [StepTrigger::None; N_STEPS];
    for (step, trigger) in triggers.iter_mut().enumerate() {
        *trigger = trigger_at(mask, step);
    }
    triggers
}

pub fn pack(triggers: &[StepTrigger; N_STEPS]) -> u64 {
    triggers
        .iter()
        .enumerate()
        .fold(0, |mask, (step, &trigger)| with_trigger(mask, step, trigger))
}

/// Rotate every field one step toward index 0; step 0 wraps to step 15.
///
/// Operates on raw bits so masks from older patches survive unchanged,
/// including ones that break the one-bit-per-step rule.
pub fn rotate_mask_left(mask: u64) -> u64 {
    [AMP_AND_FILTER_SHIFT, FILTER_ONLY_SHIFT, AMP_ONLY_SHIFT]
        .iter()
        .fold(0, |rotated, &shift| {
            let field = ((mask >> shift) & FIELD) as u16;
            rotated | ((field.rotate_right(1) as u64) << shift)
        })
}

/// Rotate every field one step toward index 15; step 15 wraps to step 0.
pub fn rotate_mask_right(mask: u64) -> u64 {
    [AMP_AND_FILTER_SHIFT, FILTER_ONLY_SHIFT, AMP_ONLY_SHIFT]
        .iter()
        .fold(0, |rotated, &shift| {
            let field = ((mask >> shift) & FIELD) as u16;
            rotated | ((field.rotate_left(1) as u64) << shift)
        })
}
