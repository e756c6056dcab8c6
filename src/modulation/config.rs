#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::dsp::envelope::Dahdsr;
use crate::dsp::lfo::rate_to_hz;
use crate::sequencing::Tempo;

/// LFO rate as log2 Hz.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub value: f32,
    /// Scale by the host tempo relative to 120 BPM
    pub temposync: bool,
    /// Phase stops moving; the start phase alone selects the output
    pub deactivated: bool,
}

impl Rate {
    pub const fn new(value: f32) -> Self {
        Self {
            value,
            temposync: false,
            deactivated: false,
        }
    }

    pub const fn synced(mut self) -> Self {
        self.temposync = true;
        self
    }

    pub const fn deactivated(mut self) -> Self {
        self.deactivated = true;
        self
    }

    /// Frequency in Hz at the given tempo.
    pub fn hz(&self, tempo: &Tempo) -> f32 {
        let hz = rate_to_hz(self.value);
        if self.temposync {
            hz * tempo.sync_ratio()
        } else {
            hz
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Everything a formula sees when evaluated for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaInput {
    /// Phase within the current cycle, 0..1
    pub phase: f32,
    /// Completed cycles since attack
    pub cycle: i64,
    pub deform: f32,
    pub rate: f32,
    pub magnitude: f32,
    pub tempo: f64,
    /// Current envelope level
    pub envelope: f32,
    pub released: bool,
}

/// A formula-driven shape. Returns a bipolar value for the given input.
#[derive(Clone, Copy)]
pub struct Formula {
    pub eval: fn(&FormulaInput) -> f32,
    /// Whether the LFO envelope scales the formula output
    pub use_envelope: bool,
}

impl Formula {
    pub const fn new(eval: fn(&FormulaInput) -> f32) -> Self {
        Self {
            eval,
            use_envelope: true,
        }
    }

    pub const fn without_envelope(mut self) -> Self {
        self.use_envelope = false;
        self
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("use_envelope", &self.use_envelope)
            .finish_non_exhaustive()
    }
}

fn sine_formula(input: &FormulaInput) -> f32 {
    (input.phase * std::f32::consts::TAU).sin()
}

impl Default for Formula {
    fn default() -> Self {
        Self::new(sine_formula)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Square,
    Ramp,
    Noise,
    SampleAndHold,
    Envelope,
    StepSequencer,
    #[cfg_attr(feature = "serde", serde(skip))]
    Formula(Formula),
}

impl LfoShape {
    /// Shapes that repeat with the rate. The display limits how many cycles
    /// of these it draws.
    pub fn is_oscillating(&self) -> bool {
        !matches!(self, LfoShape::Envelope | LfoShape::StepSequencer)
    }

    pub fn is_step_sequencer(&self) -> bool {
        matches!(self, LfoShape::StepSequencer)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LfoShape::Sine => "Sine",
            LfoShape::Triangle => "Triangle",
            LfoShape::Square => "Square",
            LfoShape::Ramp => "Ramp",
            LfoShape::Noise => "Noise",
            LfoShape::SampleAndHold => "S&H",
            LfoShape::Envelope => "Envelope",
            LfoShape::StepSequencer => "Step Seq",
            LfoShape::Formula(_) => "Formula",
        }
    }
}

/// Full LFO settings: rate, shape, envelope and output scaling.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct LfoConfig {
    pub rate: Rate,
    pub shape: LfoShape,
    pub envelope: Dahdsr,
    /// Treat the envelope as a constant 1
    pub envelope_bypassed: bool,
    /// Output gain, clamped to [-3, 3]
    pub magnitude: f32,
    pub deform: f32,
    /// Start phase, 0..1. Shuffle amount for the step sequencer.
    pub start_phase: f32,
    pub unipolar: bool,
}

impl LfoConfig {
    /// Magnitude at which no amplitude reference is drawn
    pub const MAX_MAGNITUDE: f32 = 1.0;

    pub fn new(shape: LfoShape) -> Self {
        Self {
            rate: Rate::default(),
            shape,
            envelope: Dahdsr::default(),
            envelope_bypassed: false,
            magnitude: 1.0,
            deform: 0.0,
            start_phase: 0.0,
            unipolar: false,
        }
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }

    pub fn envelope(mut self, envelope: Dahdsr) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn envelope_bypassed(mut self, bypassed: bool) -> Self {
        self.envelope_bypassed = bypassed;
        self
    }

    pub fn magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn deform(mut self, deform: f32) -> Self {
        self.deform = deform;
        self
    }

    pub fn start_phase(mut self, start_phase: f32) -> Self {
        self.start_phase = start_phase;
        self
    }

    pub fn unipolar(mut self, unipolar: bool) -> Self {
        self.unipolar = unipolar;
        self
    }

    /// True if the rate or any envelope stage follows the host tempo.
    pub fn any_temposync(&self) -> bool {
        self.rate.temposync || self.envelope.any_temposync()
    }

    /// Whether the envelope shapes the output at all.
    pub fn uses_envelope(&self) -> bool {
        match self.shape {
            LfoShape::Formula(formula) => formula.use_envelope && !self.envelope_bypassed,
            _ => !self.envelope_bypassed,
        }
    }
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self::new(LfoShape::default())
    }
}
