use crate::dsp::envelope::{EnvelopeStage, LfoEnvelope};
use crate::dsp::noise::{CorrelatedNoise, Rng};
use crate::dsp::waveshape::{self, cubic_interpolate, interpolate_steps};
use crate::sequencing::Tempo;
use crate::step_sequencer::StepSequencerStorage;
use crate::N_STEPS;

use super::config::{FormulaInput, LfoConfig, LfoShape};
use super::source::ModulationSource;

/*
LFO Simulator
=============

A block-rate rendition of one LFO voice, good enough to draw. It does not
render audio: every call to `process_block` stands for one block of
`block_size` samples and produces a single output value.

Vocabulary
----------

  block rate  block_size / sample_rate: seconds per processed block. Rates
              and envelope stage times are turned into per-block increments
              with it.

  phase       Position in the current cycle, 0.0 → 1.0. Wrapping past 1.0
              is where noise shapes draw a new value and the step sequencer
              moves to its next step.

  history     The last four values a noise or step shape produced. history[1]
              is the value being played, history[0] the one coming next.
              Interpolation between them is what deform controls.

  ratemult    Phase speed multiplier used for step shuffle. Alternating
              steps run at 1 / (1 - s/2) and 1 / (1 + s/2).


Output
------

  output = envelope × clamp(magnitude, -3, 3) × shape value

Unipolar LFOs lift the shape value into 0..1 first (0.5 + 0.5 v). The step
sequencer is the exception: its steps are already unipolar when the LFO is,
so only negative values are cut off.

The noise generator is seeded with a fixed value so repeated simulations of
the same settings draw the same curve.
*/

pub struct LfoSimulator {
    config: LfoConfig,
    steps: StepSequencerStorage,
    tempo: Tempo,
    block_rate: f32,

    envelope: LfoEnvelope,
    phase: f32,
    phase_initialized: bool,
    cycle: i64,
    released: bool,

    step: usize,
    prior_step: Option<usize>,
    prior_phase: Option<f32>,
    ratemult: f32,
    shuffle_odd: bool,
    history: [f32; 4],

    rng: Rng,
    noise: CorrelatedNoise,

    held: f32,
    output: f32,
    envelope_applies: bool,
    retrigger_amp: bool,
    retrigger_filter: bool,
}

impl LfoSimulator {
    /// `block_rate` is block_size / sample_rate.
    pub fn new(config: LfoConfig, tempo: Tempo, block_rate: f32) -> Self {
        Self {
            config,
            steps: StepSequencerStorage::new(),
            tempo,
            block_rate,
            envelope: LfoEnvelope::new(),
            phase: 0.0,
            phase_initialized: false,
            cycle: 0,
            released: false,
            step: 0,
            prior_step: None,
            prior_phase: None,
            ratemult: 1.0,
            shuffle_odd: false,
            history: [0.0; 4],
            rng: Rng::new(Rng::DISPLAY_SEED),
            noise: CorrelatedNoise::new(),
            held: 0.0,
            output: 0.0,
            envelope_applies: config.uses_envelope(),
            retrigger_amp: false,
            retrigger_filter: false,
        }
    }

    /// Step values played by the step-sequencer shape
    pub fn steps(mut self, steps: StepSequencerStorage) -> Self {
        self.steps = steps;
        self
    }

    pub fn config(&self) -> &LfoConfig {
        &self.config
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Step index the sequencer moves to at the next wrap.
    pub fn current_step(&self) -> usize {
        self.step
    }

    /// The last block crossed into a step that retriggers the amp envelope.
    pub fn retrigger_amp(&self) -> bool {
        self.retrigger_amp
    }

    pub fn retrigger_filter(&self) -> bool {
        self.retrigger_filter
    }

    fn tempo_ratio(&self) -> f32 {
        self.tempo.sync_ratio()
    }

    fn deform_correlation(&self) -> f32 {
        self.config.deform.clamp(-1.0, 1.0)
    }

    fn init_phase_from_start_phase(&mut self) {
        let mut phase = self.config.start_phase;
        if matches!(self.config.shape, LfoShape::Triangle)
            && self.config.rate.deactivated
            && !self.config.unipolar
        {
            phase += 0.25;
        }
        self.phase = phase.rem_euclid(1.0);
        self.phase_initialized = true;
        self.cycle = 0;
    }

    fn advance_phase_by(&mut self, offset: f32) {
        self.phase += offset;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
            self.cycle += 1;
        }
    }

    fn next_shuffle(&mut self) {
        let shuffle = self.config.start_phase.clamp(-1.99, 1.99);
        self.shuffle_odd = !self.shuffle_odd;
        self.ratemult = if self.shuffle_odd {
            1.0 / (1.0 - 0.5 * shuffle)
        } else {
            1.0 / (1.0 + 0.5 * shuffle)
        };
    }

    fn step_value(&self, step: usize) -> f32 {
        self.steps.steps[step % N_STEPS]
    }

    fn push_history(&mut self, value: f32) {
        self.history.copy_within(0..3, 1);
        self.history[0] = value;
    }

    fn flag_retriggers(&mut self, step: usize) {
        let trigger = self.steps.trigger(step);
        self.retrigger_amp |= trigger.retriggers_amp();
        self.retrigger_filter |= trigger.retriggers_filter();
    }

    fn frame_rate(&self) -> f32 {
        let rate = self.config.rate;
        if rate.deactivated {
            return 0.0;
        }
        let mut frate = self.block_rate * rate.value.exp2();
        if rate.temposync {
            frate *= self.tempo_ratio();
        }
        frate
    }

    fn wrap_phase(&mut self) {
        if self.phase >= 2.0 {
            let whole = self.phase.trunc();
            self.phase -= whole;
            self.cycle += whole as i64;
        } else if self.phase < 0.0 {
            let p = self.phase as i32 - 1;
            let np = self.phase - p as f32;
            if (0.0..1.0).contains(&np) {
                self.phase = np;
                self.cycle += p as i64;
            } else {
                self.phase = 0.0;
            }
        } else {
            self.phase -= 1.0;
            self.cycle += 1;
        }

        match self.config.shape {
            LfoShape::SampleAndHold => {
                let correlation = self.deform_correlation();
                self.held = self.noise.next(correlation, &mut self.rng);
            }
            LfoShape::Noise => {
                let correlation = self.deform_correlation();
                let value = self.noise.next(correlation, &mut self.rng);
                self.push_history(value);
            }
            LfoShape::StepSequencer => {
                self.flag_retriggers(self.step);
                self.next_shuffle();
                self.step = self.steps.next_step(self.step);
                let value = self.step_value(self.step);
                self.push_history(value);
            }
            _ => {}
        }
    }

    /// With the rate stopped the phase scrubs across all sixteen steps.
    fn scrub_steps(&mut self) -> f32 {
        let p16 = self.phase * N_STEPS as f32;
        let mut pstep = (p16 as i32) & (N_STEPS as i32 - 1);
        let sphase = p16 - pstep as f32;

        let last_step = *self.steps.loop_range().end() as i32;
        let loop_len = self.steps.loop_len() as i32;
        while pstep > last_step && pstep >= 0 {
            pstep -= loop_len;
        }
        let pstep = (pstep & (N_STEPS as i32 - 1)) as usize;

        if self.prior_step != Some(pstep) {
            self.prior_step = Some(pstep);
            self.flag_retriggers(pstep);
        }

        if self.prior_phase != Some(self.phase) {
            self.prior_phase = Some(self.phase);
            for i in 0..4 {
                self.history[i] = self.step_value(pstep + 1 + N_STEPS - i);
            }
        }

        sphase
    }
}

impl ModulationSource for LfoSimulator {
    fn attack(&mut self) {
        if !self.phase_initialized {
            self.init_phase_from_start_phase();
        }

        self.envelope.attack(&self.config.envelope);
        self.ratemult = 1.0;
        self.released = false;

        self.phase = self.config.start_phase;
        if self.config.shape.is_step_sequencer() {
            self.phase = 0.0;
        }
        self.step = 0;

        match self.config.shape {
            LfoShape::SampleAndHold => {
                self.noise.reset();
                let correlation = self.deform_correlation();
                self.held = self.noise.next(correlation, &mut self.rng);
            }
            LfoShape::StepSequencer => {
                self.history[1] = self.step_value(self.step);
                self.history[2] = self.step_value(self.step + N_STEPS - 1);
                self.history[3] = self.step_value(self.step + N_STEPS - 2);

                self.step = self.steps.next_step(self.step);
                self.next_shuffle();
                self.history[0] = self.step_value(self.step);
            }
            LfoShape::Noise => {
                let correlation = self.deform_correlation();
                self.noise.reset();
                for i in (0..4).rev() {
                    self.history[i] = self.noise.next(correlation, &mut self.rng) * self.phase;
                }
                self.phase = 0.0;
            }
            LfoShape::Triangle if !self.config.unipolar => self.advance_phase_by(0.25),
            LfoShape::Sine if self.config.unipolar => self.advance_phase_by(0.75),
            _ => {}
        }
    }

    fn release(&mut self) {
        if self.envelope.release(&self.config.envelope) {
            self.released = true;
        }
    }

    fn process_block(&mut self) {
        if !self.phase_initialized || self.config.rate.deactivated {
            self.init_phase_from_start_phase();
        }

        self.retrigger_amp = false;
        self.retrigger_filter = false;

        let frate = self.frame_rate();
        self.phase += frate * self.ratemult;
        if frate == 0.0 && self.phase == 0.0 && self.config.shape.is_step_sequencer() {
            self.phase = 0.001;
        }

        let tempo_ratio = self.tempo_ratio();
        self.envelope
            .advance(&self.config.envelope, self.block_rate, tempo_ratio);

        if !(0.0..1.0).contains(&self.phase) {
            self.wrap_phase();
        }

        let env = self.envelope.level();
        let mut gain = if self.config.envelope_bypassed { 1.0 } else { env };
        let magnitude = self.config.magnitude.clamp(-3.0, 3.0);
        let deform = self.config.deform;

        let value = match self.config.shape {
            LfoShape::Envelope => (1.0 - deform) + deform * env,
            LfoShape::Sine => waveshape::sine(self.phase, deform),
            LfoShape::Triangle => waveshape::triangle(self.phase, deform),
            LfoShape::Ramp => waveshape::ramp(self.phase, deform),
            LfoShape::Square => waveshape::square(self.phase, deform),
            LfoShape::SampleAndHold => self.held,
            LfoShape::Noise => cubic_interpolate(
                self.history[3],
                self.history[2],
                self.history[1],
                self.history[0],
                self.phase,
            ),
            LfoShape::StepSequencer => {
                let phase = if frate == 0.0 {
                    self.scrub_steps()
                } else {
                    self.phase
                };
                interpolate_steps(&self.history, phase, deform)
            }
            LfoShape::Formula(formula) => {
                let input = FormulaInput {
                    phase: self.phase,
                    cycle: self.cycle,
                    deform,
                    rate: self.config.rate.value,
                    magnitude: self.config.magnitude,
                    tempo: self.tempo.bpm,
                    envelope: env,
                    released: self.released,
                };
                let mut value = (formula.eval)(&input);
                if !formula.use_envelope {
                    gain = 1.0;
                }
                if self.config.unipolar {
                    value = 0.5 + 0.5 * value;
                }
                self.output = gain * magnitude * value;
                return;
            }
        };

        let value = match (self.config.unipolar, self.config.shape) {
            (false, _) => value,
            (true, LfoShape::StepSequencer) => value.max(0.0),
            (true, _) => 0.5 + 0.5 * value,
        };

        self.output = gain * magnitude * value;
    }

    fn output(&self) -> f32 {
        self.output
    }

    fn envelope_value(&self) -> f32 {
        self.envelope.level()
    }

    fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    fn uses_envelope(&self) -> bool {
        self.envelope_applies
    }
}
