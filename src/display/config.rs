#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::lfo::{block_rate, blocks_per_second};
use crate::{BLOCK_SIZE, DEFAULT_SAMPLE_RATE};

/// Settings for waveform sampling.
///
/// The simulation does not need to match the host sample rate; it only
/// sets the time resolution of the drawn curve.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    pub sample_rate: f32,
    pub block_size: usize,
    /// Upper bound on columns for continuous shapes
    pub max_columns: usize,
    /// Upper bound on columns for the step-sequencer curve
    pub step_max_columns: usize,
    /// Seconds the simulated key is held once the envelope sustains
    pub sustain_time: f32,
    /// Draw a full-magnitude reference when magnitude is turned down
    pub ghost_reference: bool,
    /// Most cycles of an oscillating shape to draw
    pub max_cycles: f32,
    /// Longest release drawn, in seconds
    pub release_cap: f32,
    /// Drawn length of a formula that ignores the envelope, in seconds
    pub free_formula_time: f32,
    /// Lowest step-sequencer rate drawn, log2 Hz
    pub step_rate_floor: f32,
    /// Minimum blocks per pixel column of the step curve
    pub step_blocks_per_pixel: usize,
}

impl DisplayConfig {
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            max_columns: 1000,
            step_max_columns: 2000,
            sustain_time: 0.5,
            ghost_reference: true,
            max_cycles: 50.0,
            release_cap: 4.0,
            free_formula_time: 5.5,
            step_rate_floor: -1.2,
            step_blocks_per_pixel: 16,
        }
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns.max(1);
        self
    }

    pub fn sustain_time(mut self, seconds: f32) -> Self {
        self.sustain_time = seconds;
        self
    }

    pub fn ghost_reference(mut self, enabled: bool) -> Self {
        self.ghost_reference = enabled;
        self
    }

    /// Seconds per simulated block
    pub fn block_rate(&self) -> f32 {
        block_rate(self.block_size, self.sample_rate)
    }

    pub fn blocks_per_second(&self) -> f32 {
        blocks_per_second(self.block_size, self.sample_rate)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new()
    }
}
