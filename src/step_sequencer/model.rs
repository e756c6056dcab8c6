use std::ops::{Deref, DerefMut, RangeInclusive};

use log::{debug, warn};

use super::storage::StepSequencerStorage;
use super::trigger::{self, StepTrigger};
use crate::N_STEPS;

/// Receives the pre-gesture state of a sequence when an edit gesture ends.
pub trait UndoSink {
    fn push_step_sequencer(&mut self, sequence_index: usize, prior: StepSequencerStorage);
}

/// Told about every committed gesture so the owning patch can be saved or
/// handed to the audio thread.
pub trait PatchSink {
    fn mark_dirty(&mut self, sequence_index: usize, storage: &StepSequencerStorage);
}

/// Minimal [`PatchSink`]: remembers that something changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtyFlag {
    pub dirty: bool,
}

impl PatchSink for DirtyFlag {
    fn mark_dirty(&mut self, _sequence_index: usize, _storage: &StepSequencerStorage) {
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

/// Keyboard nudge sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogSize {
    Coarse,
    Fine,
    Semitone,
}

impl JogSize {
    pub fn amount(self) -> f32 {
        match self {
            JogSize::Coarse => 0.05,
            JogSize::Fine => 0.01,
            JogSize::Semitone => 1.0 / 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Default,
    Min,
}

/// Snapping applied while dragging a step value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantize {
    #[default]
    Off,
    /// One division per scale degree
    Degrees,
    /// Two divisions per scale degree
    HalfDegrees,
}

/// Round `value` to the nearest multiple of `1 / divisions`.
///
/// A zero divisor leaves the value untouched.
pub fn quantize(value: f32, divisions: u32) -> f32 {
    if divisions == 0 {
        return value;
    }
    let n = divisions as f32;
    (value * n + 0.5).floor() / n
}

/// Editing model of one step-sequencer LFO.
///
/// Every mutation happens inside an edit gesture. The gesture takes a
/// snapshot when it opens and, when it closes, hands that snapshot to an
/// [`UndoSink`] and notifies a [`PatchSink`]. However many steps a drag
/// touches, it yields a single undo entry.
///
/// ```
/// use saavy_lfo::step_sequencer::{DirtyFlag, StepSequencerModel, UndoStack};
///
/// let mut model = StepSequencerModel::new(0);
/// let mut undo = UndoStack::new();
/// let mut patch = DirtyFlag::default();
///
/// {
///     let mut edit = model.edit(&mut undo, &mut patch);
///     edit.set_step(0, 0.5);
///     edit.set_step(1, -0.5);
/// }
///
/// assert_eq!(model.steps()[1], -0.5);
/// assert_eq!(undo.len(), 1);
/// assert!(patch.dirty);
/// ```
#[derive(Debug, Clone)]
pub struct StepSequencerModel {
    storage: StepSequencerStorage,
    unipolar: bool,
    sequence_index: usize,
    scale_length: u32,
    snapshot: Option<StepSequencerStorage>,
}

impl StepSequencerModel {
    /// Twelve-tone default for drag quantization
    pub const DEFAULT_SCALE_LENGTH: u32 = 12;

    pub fn new(sequence_index: usize) -> Self {
        Self::with_storage(sequence_index, StepSequencerStorage::new())
    }

    pub fn with_storage(sequence_index: usize, storage: StepSequencerStorage) -> Self {
        Self {
            storage,
            unipolar: false,
            sequence_index,
            scale_length: Self::DEFAULT_SCALE_LENGTH,
            snapshot: None,
        }
    }

    /// Restrict step values to 0..1 instead of -1..1
    pub fn unipolar(mut self, unipolar: bool) -> Self {
        self.unipolar = unipolar;
        self
    }

    /// Scale length used by drag quantization. Lengths of 0 or 1 fall back
    /// to twelve divisions.
    pub fn scale_length(mut self, degrees: u32) -> Self {
        self.set_scale_length(degrees);
        self
    }

    pub fn set_scale_length(&mut self, degrees: u32) {
        self.scale_length = if degrees > 1 {
            degrees
        } else {
            Self::DEFAULT_SCALE_LENGTH
        };
    }

    pub fn set_unipolar(&mut self, unipolar: bool) {
        self.unipolar = unipolar;
    }

    pub fn is_unipolar(&self) -> bool {
        self.unipolar
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    // Queries

    pub fn storage(&self) -> &StepSequencerStorage {
        &self.storage
    }

    pub fn steps(&self) -> &[f32; N_STEPS] {
        &self.storage.steps
    }

    pub fn trigger(&self, step: usize) -> StepTrigger {
        self.storage.trigger(step)
    }

    pub fn loop_range(&self) -> RangeInclusive<usize> {
        self.storage.loop_range()
    }

    pub fn is_editing(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Divisions used for a drag with the given snapping, if any.
    pub fn quantize_divisions(&self, mode: Quantize) -> Option<u32> {
        match mode {
            Quantize::Off => None,
            Quantize::Degrees => Some(self.scale_length),
            Quantize::HalfDegrees => Some(self.scale_length.saturating_mul(2)),
        }
    }

    /// Lowest value a step may hold.
    pub fn min_value(&self) -> f32 {
        if self.unipolar {
            0.0
        } else {
            -1.0
        }
    }

    fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(self.min_value(), 1.0)
    }

    // Gesture

    /// Open an edit gesture and snapshot the current storage.
    ///
    /// Panics if a gesture is already open.
    pub fn begin_edit(&mut self) {
        assert!(
            self.snapshot.is_none(),
            "step sequencer {} already has an open edit",
            self.sequence_index
        );
        self.snapshot = Some(self.storage);
    }

    /// Close the open gesture, pushing its snapshot to `undo` and telling
    /// `patch` about the new state.
    pub fn end_edit(&mut self, undo: &mut dyn UndoSink, patch: &mut dyn PatchSink) {
        let prior = self
            .snapshot
            .take()
            .unwrap_or_else(|| panic!("step sequencer {} has no open edit", self.sequence_index));

        undo.push_step_sequencer(self.sequence_index, prior);
        patch.mark_dirty(self.sequence_index, &self.storage);
        debug!(
            "step sequencer {}: committed edit (changed: {})",
            self.sequence_index,
            prior != self.storage
        );
    }

    /// Open a gesture that commits when the returned guard drops.
    pub fn edit<'a>(
        &'a mut self,
        undo: &'a mut dyn UndoSink,
        patch: &'a mut dyn PatchSink,
    ) -> EditGuard<'a> {
        self.begin_edit();
        EditGuard {
            model: self,
            undo,
            patch,
        }
    }

    /// Replace the whole storage, e.g. from undo or a patch load, and
    /// return what was there. Not recorded as an undo entry.
    pub fn restore(
        &mut self,
        storage: StepSequencerStorage,
        patch: &mut dyn PatchSink,
    ) -> StepSequencerStorage {
        assert!(
            self.snapshot.is_none(),
            "cannot restore step sequencer {} during an edit",
            self.sequence_index
        );
        let previous = std::mem::replace(&mut self.storage, storage);
        patch.mark_dirty(self.sequence_index, &self.storage);
        previous
    }

    fn check_editing(&self) {
        assert!(
            self.snapshot.is_some(),
            "step sequencer {} mutated outside an edit",
            self.sequence_index
        );
    }

    fn check_step(step: usize) {
        assert!(step < N_STEPS, "step index {} out of range", step);
    }

    // Step values

    pub fn set_step(&mut self, step: usize, value: f32) {
        self.check_editing();
        Self::check_step(step);
        self.storage.steps[step] = self.clamp_value(value);
    }

    pub fn jog_step(&mut self, step: usize, direction: Direction, size: JogSize) {
        self.check_editing();
        Self::check_step(step);
        let value = self.storage.steps[step] + direction.sign() * size.amount();
        self.storage.steps[step] = self.clamp_value(value);
    }

    pub fn set_step_to_extreme(&mut self, step: usize, extreme: Extreme) {
        let value = match extreme {
            Extreme::Max => 1.0,
            Extreme::Default => 0.0,
            Extreme::Min => self.min_value(),
        };
        self.set_step(step, value);
    }

    /// Mouse wheel over a step.
    pub fn wheel_step(&mut self, step: usize, delta: f32) {
        self.check_editing();
        Self::check_step(step);
        if delta == 0.0 {
            return;
        }
        let value = self.storage.steps[step] + delta;
        self.storage.steps[step] = self.clamp_value(value);
    }

    /// Double-click reset.
    pub fn reset_step(&mut self, step: usize) {
        self.set_step(step, 0.0);
    }

    /// Reset every step between two indices, in either order.
    pub fn reset_range(&mut self, from: usize, to: usize) {
        self.check_editing();
        Self::check_step(from);
        Self::check_step(to);
        let (start, end) = (from.min(to), from.max(to));
        self.storage.steps[start..=end].fill(0.0);
    }

    /// Set a step from a drag, optionally snapping to scale degrees.
    pub fn drag_value(&mut self, step: usize, value: f32, mode: Quantize) {
        self.check_editing();
        Self::check_step(step);
        let mut value = self.clamp_value(value);
        if let Some(divisions) = self.quantize_divisions(mode) {
            value = quantize(value, divisions);
        }
        self.storage.steps[step] = value;
    }

    /// Fill `start..=end` with a straight line from `start_value` to
    /// `end_value`. A reversed range is swapped together with its values.
    pub fn ramp_range(
        &mut self,
        start: usize,
        end: usize,
        start_value: f32,
        end_value: f32,
        quantize_steps: Option<u32>,
    ) {
        self.check_editing();
        Self::check_step(start);
        Self::check_step(end);

        let (s, e, sv, ev) = if end < start {
            (end, start, end_value, start_value)
        } else {
            (start, end, start_value, end_value)
        };
        let sv = self.clamp_value(sv);
        let ev = self.clamp_value(ev);

        let divisions = match quantize_steps {
            Some(0) => {
                warn!("ramp quantization with zero divisions skipped");
                None
            }
            other => other,
        };

        let slope = if e > s { (ev - sv) / (e - s) as f32 } else { 0.0 };
        for (offset, slot) in self.storage.steps[s..=e].iter_mut().enumerate() {
            let value = sv + offset as f32 * slope;
            *slot = match divisions {
                Some(n) => quantize(value, n),
                None => value,
            };
        }
    }

    /// Rotate steps and triggers one position toward step 0.
    pub fn shift_left(&mut self) {
        self.check_editing();
        self.storage.steps.rotate_left(1);
        self.storage.trigmask = trigger::rotate_mask_left(self.storage.trigmask);
    }

    /// Rotate steps and triggers one position toward step 15.
    pub fn shift_right(&mut self) {
        self.check_editing();
        self.storage.steps.rotate_right(1);
        self.storage.trigmask = trigger::rotate_mask_right(self.storage.trigmask);
    }

    // Loop region

    pub fn set_loop_start(&mut self, step: i32) {
        self.check_editing();
        self.storage.loop_start = step.clamp(0, N_STEPS as i32 - 1) as usize;
    }

    pub fn set_loop_end(&mut self, step: i32) {
        self.check_editing();
        self.storage.loop_end = step.clamp(0, N_STEPS as i32 - 1) as usize;
    }

    // Triggers

    pub fn set_trigger(&mut self, step: usize, state: StepTrigger) {
        self.check_editing();
        self.storage.trigmask = trigger::with_trigger(self.storage.trigmask, step, state);
    }

    pub fn cycle_trigger(&mut self, step: usize, direction: Direction) {
        let current = self.storage.trigger(step);
        let next = match direction {
            Direction::Up => current.next(),
            Direction::Down => current.previous(),
        };
        self.set_trigger(step, next);
    }

    /// Mouse click on a trigger cell. Returns the new state, which a
    /// following drag paints onto every cell it crosses.
    ///
    /// A plain click toggles between none and amp+filter. The alternate
    /// click (right button or shift) picks filter-only, or amp-only when
    /// the step is already filter-only.
    pub fn click_trigger(&mut self, step: usize, alternate: bool) -> StepTrigger {
        let current = self.storage.trigger(step);
        let next = match (alternate, current) {
            (false, StepTrigger::None) => StepTrigger::AmpAndFilter,
            (false, _) => StepTrigger::None,
            (true, StepTrigger::FilterOnly) => StepTrigger::AmpOnly,
            (true, _) => StepTrigger::FilterOnly,
        };
        self.set_trigger(step, next);
        next
    }

    /// Drag-paint `state` onto a step. Returns true if the mask changed.
    pub fn paint_trigger(&mut self, step: usize, state: StepTrigger) -> bool {
        let before = self.storage.trigmask;
        self.set_trigger(step, state);
        self.storage.trigmask != before
    }
}

/// An open edit gesture. Dereferences to the model; commits on drop.
pub struct EditGuard<'a> {
    model: &'a mut StepSequencerModel,
    undo: &'a mut dyn UndoSink,
    patch: &'a mut dyn PatchSink,
}

impl Deref for EditGuard<'_> {
    type Target = StepSequencerModel;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl DerefMut for EditGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.model
    }
}

impl Drop for EditGuard<'_> {
    fn drop(&mut self) {
        self.model.end_edit(self.undo, self.patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingUndo {
        pushes: Vec<(usize, StepSequencerStorage)>,
    }

    impl UndoSink for RecordingUndo {
        fn push_step_sequencer(&mut self, sequence_index: usize, prior: StepSequencerStorage) {
            self.pushes.push((sequence_index, prior));
        }
    }

    fn with_edit(
        model: &mut StepSequencerModel,
        f: impl FnOnce(&mut StepSequencerModel),
    ) -> RecordingUndo {
        let mut undo = RecordingUndo::default();
        let mut patch = DirtyFlag::default();
        {
            let mut edit = model.edit(&mut undo, &mut patch);
            f(&mut edit);
        }
        assert!(patch.dirty, "commit should mark the patch dirty");
        undo
    }

    #[test]
    fn test_set_step_clamps_to_active_range() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.set_step(0, 2.0);
            m.set_step(1, -2.0);
            m.set_step(2, 0.3);
        });
        assert_eq!(&model.steps()[..3], &[1.0, -1.0, 0.3]);

        let mut model = StepSequencerModel::new(0).unipolar(true);
        with_edit(&mut model, |m| m.set_step(0, -0.5));
        assert_eq!(model.steps()[0], 0.0);
    }

    #[test]
    fn test_gesture_pushes_prior_state_once() {
        let mut model = StepSequencerModel::new(3);
        let undo = with_edit(&mut model, |m| {
            for i in 0..N_STEPS {
                m.set_step(i, 0.5);
            }
        });
        assert_eq!(undo.pushes.len(), 1);
        assert_eq!(undo.pushes[0].0, 3);
        assert_eq!(undo.pushes[0].1, StepSequencerStorage::new());
        assert!(!model.is_editing());
    }

    #[test]
    #[should_panic(expected = "already has an open edit")]
    fn test_nested_edit_panics() {
        let mut model = StepSequencerModel::new(0);
        model.begin_edit();
        model.begin_edit();
    }

    #[test]
    #[should_panic(expected = "outside an edit")]
    fn test_mutation_without_edit_panics() {
        let mut model = StepSequencerModel::new(0);
        model.set_step(0, 0.5);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_step_panics() {
        let mut model = StepSequencerModel::new(0);
        model.begin_edit();
        model.set_step(N_STEPS, 0.5);
    }

    #[test]
    fn test_jog_sizes() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.jog_step(0, Direction::Up, JogSize::Coarse);
            m.jog_step(1, Direction::Down, JogSize::Fine);
            m.jog_step(2, Direction::Up, JogSize::Semitone);
            m.set_step(3, 0.99);
            m.jog_step(3, Direction::Up, JogSize::Coarse);
        });
        let steps = model.steps();
        assert!((steps[0] - 0.05).abs() < 1e-6);
        assert!((steps[1] + 0.01).abs() < 1e-6);
        assert!((steps[2] - 1.0 / 12.0).abs() < 1e-6);
        assert_eq!(steps[3], 1.0, "jog should clamp at the top");
    }

    #[test]
    fn test_extremes_respect_polarity() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.set_step_to_extreme(0, Extreme::Max);
            m.set_step_to_extreme(1, Extreme::Min);
            m.set_step_to_extreme(2, Extreme::Default);
        });
        assert_eq!(&model.steps()[..3], &[1.0, -1.0, 0.0]);

        model.set_unipolar(true);
        with_edit(&mut model, |m| m.set_step_to_extreme(1, Extreme::Min));
        assert_eq!(model.steps()[1], 0.0);
    }

    #[test]
    fn test_ramp_swaps_reversed_range() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| m.ramp_range(6, 2, 1.0, -1.0, None));
        let steps = model.steps();
        assert_eq!(steps[2], -1.0);
        assert_eq!(steps[4], 0.0);
        assert_eq!(steps[6], 1.0);
        assert_eq!(steps[7], 0.0, "steps outside the range are untouched");
    }

    #[test]
    fn test_ramp_with_zero_divisions_is_unquantized() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| m.ramp_range(0, 3, 0.0, 0.3, Some(0)));
        assert!((model.steps()[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_huge_scale_length_does_not_overflow() {
        let mut model = StepSequencerModel::new(0).scale_length(u32::MAX);
        assert_eq!(model.quantize_divisions(Quantize::HalfDegrees), Some(u32::MAX));

        with_edit(&mut model, |m| m.drag_value(0, 0.3, Quantize::HalfDegrees));
        assert!((model.steps()[0] - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_drag_value_snaps_to_scale() {
        let mut model = StepSequencerModel::new(0).scale_length(7);
        with_edit(&mut model, |m| {
            m.drag_value(0, 0.2, Quantize::Degrees);
            m.drag_value(1, 0.2, Quantize::HalfDegrees);
            m.drag_value(2, 0.2, Quantize::Off);
        });
        let steps = model.steps();
        assert!((steps[0] - 1.0 / 7.0).abs() < 1e-6);
        assert!((steps[1] - 3.0 / 14.0).abs() < 1e-6);
        assert_eq!(steps[2], 0.2);
    }

    #[test]
    fn test_degenerate_scale_length_falls_back_to_twelve() {
        let model = StepSequencerModel::new(0).scale_length(1);
        assert_eq!(model.quantize_divisions(Quantize::Degrees), Some(12));
        assert_eq!(model.quantize_divisions(Quantize::HalfDegrees), Some(24));
    }

    #[test]
    fn test_wheel_and_reset() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.wheel_step(0, 0.7);
            m.wheel_step(0, 0.7);
            m.set_step(1, 0.4);
            m.reset_step(1);
            m.set_step(2, 0.4);
            m.set_step(3, 0.4);
            m.reset_range(3, 2);
        });
        assert_eq!(&model.steps()[..4], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shift_moves_triggers_with_steps() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.set_step(0, 0.5);
            m.set_trigger(0, StepTrigger::FilterOnly);
            m.shift_right();
        });
        assert_eq!(model.steps()[1], 0.5);
        assert_eq!(model.trigger(1), StepTrigger::FilterOnly);
        assert_eq!(model.trigger(0), StepTrigger::None);

        with_edit(&mut model, |m| {
            m.shift_left();
            m.shift_left();
        });
        assert_eq!(model.steps()[15], 0.5);
        assert_eq!(model.trigger(15), StepTrigger::FilterOnly);
    }

    #[test]
    fn test_loop_bounds_clamp() {
        let mut model = StepSequencerModel::new(0);
        with_edit(&mut model, |m| {
            m.set_loop_start(20);
            m.set_loop_end(-4);
        });
        assert_eq!(model.storage().loop_start, 15);
        assert_eq!(model.storage().loop_end, 0);
        assert_eq!(model.loop_range(), 0..=15);
    }

    #[test]
    fn test_click_and_paint_triggers() {
        let mut model = StepSequencerModel::new(0);
        let mut painted = Vec::new();
        with_edit(&mut model, |m| {
            let state = m.click_trigger(4, false);
            assert_eq!(state, StepTrigger::AmpAndFilter);
            painted.push(m.paint_trigger(5, state));
            painted.push(m.paint_trigger(5, state));
        });
        assert_eq!(painted, vec![true, false]);
        assert_eq!(model.trigger(5), StepTrigger::AmpAndFilter);

        with_edit(&mut model, |m| {
            assert_eq!(m.click_trigger(4, false), StepTrigger::None);
            assert_eq!(m.click_trigger(6, true), StepTrigger::FilterOnly);
            assert_eq!(m.click_trigger(6, true), StepTrigger::AmpOnly);
            m.cycle_trigger(7, Direction::Down);
        });
        assert_eq!(model.trigger(4), StepTrigger::None);
        assert_eq!(model.trigger(6), StepTrigger::AmpOnly);
        assert_eq!(model.trigger(7), StepTrigger::AmpOnly);
    }

    #[test]
    fn test_restore_returns_replaced_storage() {
        let mut model = StepSequencerModel::new(0);
        let mut patch = DirtyFlag::default();
        let replacement = StepSequencerStorage::from_steps([0.25; N_STEPS]);
        let previous = model.restore(replacement, &mut patch);
        assert_eq!(previous, StepSequencerStorage::new());
        assert_eq!(model.steps()[9], 0.25);
        assert!(patch.dirty);
    }
}
