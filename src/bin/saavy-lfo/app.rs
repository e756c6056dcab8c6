//! Editor state and key handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::info;
use rtrb::Consumer;

use saavy_lfo::{
    display::{render_waveform, SampledWaveform, WaveformSampler},
    modulation::{Formula, LfoConfig, LfoShape},
    step_sequencer::{
        Direction, Extreme, JogSize, RingPatchSink, StepSequencerUpdate, UpdateReceiver,
    },
    StepSequencerModel, StepSequencerStorage, Tempo, UndoStack, N_STEPS,
};

const RATE_STEP: f32 = 0.25;
const AMOUNT_STEP: f32 = 0.1;
const BPM_STEP: f64 = 5.0;

fn shapes() -> [LfoShape; 9] {
    [
        LfoShape::Sine,
        LfoShape::Triangle,
        LfoShape::Square,
        LfoShape::Ramp,
        LfoShape::Noise,
        LfoShape::SampleAndHold,
        LfoShape::Envelope,
        LfoShape::StepSequencer,
        LfoShape::Formula(Formula::default()),
    ]
}

/// Everything the editor shows and edits.
pub struct App {
    pub lfo: LfoConfig,
    pub tempo: Tempo,
    pub model: StepSequencerModel,
    pub undo: UndoStack,
    patch: RingPatchSink,
    /// Receiving end of committed edits, standing in for the audio side
    updates: Consumer<StepSequencerUpdate>,
    /// Last storage received over `updates`
    pub applied: StepSequencerStorage,
    /// Edits committed since startup
    pub published: usize,
    sampler: WaveformSampler,
    pub waveform: SampledWaveform,
    waveform_width: usize,
    waveform_stale: bool,
    pub selected: usize,
    shape: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        lfo: LfoConfig,
        tempo: Tempo,
        model: StepSequencerModel,
        patch: RingPatchSink,
        updates: Consumer<StepSequencerUpdate>,
    ) -> Self {
        let shape = shapes()
            .iter()
            .position(|s| s.name() == lfo.shape.name())
            .unwrap_or(0);
        let applied = *model.storage();
        let model = model.unipolar(lfo.unipolar);

        Self {
            lfo,
            tempo,
            model,
            undo: UndoStack::new(),
            patch,
            updates,
            applied,
            published: 0,
            sampler: WaveformSampler::default(),
            waveform: SampledWaveform::default(),
            waveform_width: 0,
            waveform_stale: true,
            selected: 0,
            shape,
            should_quit: false,
        }
    }

    pub fn dropped_updates(&self) -> usize {
        self.patch.dropped()
    }

    /// Pick up committed edits, as the audio side would between blocks.
    pub fn poll_updates(&mut self) {
        if let Some(update) = self.updates.latest() {
            self.applied = update.storage;
            self.published += 1;
            self.waveform_stale = true;
        }
    }

    /// Resample the waveform if anything it depends on changed.
    pub fn refresh_waveform(&mut self, width: usize) {
        let width = width.max(1);
        if self.waveform_stale || width != self.waveform_width {
            self.waveform =
                render_waveform(&self.sampler, &self.lfo, &self.applied, width, &self.tempo);
            self.waveform_width = width;
            self.waveform_stale = false;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let fine = key.modifiers.contains(KeyModifiers::SHIFT);
        let jog = if fine { JogSize::Fine } else { JogSize::Coarse };
        let step = self.selected;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

            KeyCode::Left => self.selected = (step + N_STEPS - 1) % N_STEPS,
            KeyCode::Right => self.selected = (step + 1) % N_STEPS,
            KeyCode::Up => self.edit(|m| m.jog_step(step, Direction::Up, jog)),
            KeyCode::Down => self.edit(|m| m.jog_step(step, Direction::Down, jog)),
            KeyCode::PageUp => self.edit(|m| m.jog_step(step, Direction::Up, JogSize::Semitone)),
            KeyCode::PageDown => {
                self.edit(|m| m.jog_step(step, Direction::Down, JogSize::Semitone))
            }
            KeyCode::Char('x') => self.edit(|m| m.set_step_to_extreme(step, Extreme::Max)),
            KeyCode::Char('n') => self.edit(|m| m.set_step_to_extreme(step, Extreme::Min)),
            KeyCode::Char('0') => self.edit(|m| m.reset_step(step)),
            KeyCode::Char('<') => self.edit(|m| m.shift_left()),
            KeyCode::Char('>') => self.edit(|m| m.shift_right()),
            KeyCode::Char('t') => self.edit(|m| m.cycle_trigger(step, Direction::Up)),
            KeyCode::Char('T') => self.edit(|m| {
                m.click_trigger(step, true);
            }),
            KeyCode::Char('[') => self.edit(|m| m.set_loop_start(step as i32)),
            KeyCode::Char(']') => self.edit(|m| m.set_loop_end(step as i32)),
            KeyCode::Char('r') => self.ramp_loop(),
            KeyCode::Char('R') => self.edit(|m| {
                let range = m.loop_range();
                m.reset_range(*range.start(), *range.end());
            }),
            KeyCode::Char('u') => self.undo(),
            KeyCode::Char('y') => self.redo(),

            KeyCode::Tab => self.select_shape(1),
            KeyCode::BackTab => self.select_shape(shapes().len() - 1),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.update_lfo(|l| l.rate.value += RATE_STEP)
            }
            KeyCode::Char('-') => self.update_lfo(|l| l.rate.value -= RATE_STEP),
            KeyCode::Char('s') => self.update_lfo(|l| l.rate.temposync = !l.rate.temposync),
            KeyCode::Char('o') => self.update_lfo(|l| l.rate.deactivated = !l.rate.deactivated),
            KeyCode::Char('m') => {
                self.update_lfo(|l| l.magnitude = (l.magnitude - AMOUNT_STEP).max(0.0))
            }
            KeyCode::Char('M') => self.update_lfo(|l| {
                l.magnitude = (l.magnitude + AMOUNT_STEP).min(LfoConfig::MAX_MAGNITUDE)
            }),
            KeyCode::Char('d') => {
                self.update_lfo(|l| l.deform = (l.deform - AMOUNT_STEP).max(-1.0))
            }
            KeyCode::Char('D') => self.update_lfo(|l| l.deform = (l.deform + AMOUNT_STEP).min(1.0)),
            KeyCode::Char('b') => self.update_lfo(|l| l.envelope_bypassed = !l.envelope_bypassed),
            KeyCode::Char('p') => {
                self.update_lfo(|l| l.unipolar = !l.unipolar);
                self.model.set_unipolar(self.lfo.unipolar);
            }
            KeyCode::Char(',') => self.set_bpm(self.tempo.bpm - BPM_STEP),
            KeyCode::Char('.') => self.set_bpm(self.tempo.bpm + BPM_STEP),
            _ => {}
        }
    }

    /// Run `f` as one undoable gesture.
    fn edit(&mut self, f: impl FnOnce(&mut StepSequencerModel)) {
        let mut edit = self.model.edit(&mut self.undo, &mut self.patch);
        f(&mut edit);
    }

    /// Ramp the loop region from the bottom to the top of the range.
    fn ramp_loop(&mut self) {
        let range = self.model.loop_range();
        let low = self.model.min_value();
        self.edit(|m| m.ramp_range(*range.start(), *range.end(), low, 1.0, None));
    }

    fn undo(&mut self) {
        let Self { model, undo, patch, .. } = self;
        if let Some(index) = undo.undo(|_, storage| model.restore(storage, patch)) {
            info!("undo on step sequencer {}", index);
        }
    }

    fn redo(&mut self) {
        let Self { model, undo, patch, .. } = self;
        if let Some(index) = undo.redo(|_, storage| model.restore(storage, patch)) {
            info!("redo on step sequencer {}", index);
        }
    }

    fn select_shape(&mut self, offset: usize) {
        let all = shapes();
        self.shape = (self.shape + offset) % all.len();
        let shape = all[self.shape];
        self.update_lfo(|l| l.shape = shape);
    }

    fn update_lfo(&mut self, f: impl FnOnce(&mut LfoConfig)) {
        f(&mut self.lfo);
        self.waveform_stale = true;
    }

    fn set_bpm(&mut self, bpm: f64) {
        self.tempo.bpm = bpm.clamp(20.0, 300.0);
        self.waveform_stale = true;
    }
}
