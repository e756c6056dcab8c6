pub mod display; // Waveform sampling for LFO editors
pub mod dsp;
pub mod modulation; // LFO configuration and display-time simulation
pub mod sequencing; // Tempo and meter
pub mod step_sequencer; // Step values, loop region, triggers and undo

pub use display::{render_waveform, DisplayConfig, SampledWaveform, WaveformSampler};
pub use modulation::{LfoConfig, LfoShape, LfoSimulator, ModulationSource};
pub use sequencing::{Tempo, TimeSignature};
pub use step_sequencer::{StepSequencerModel, StepSequencerStorage, StepTrigger, UndoStack};

/// Number of steps in a step-sequencer LFO.
pub const N_STEPS: usize = 16;

/// Samples per processing block of the simulated modulation source.
pub const BLOCK_SIZE: usize = 32;

pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
