//! Benchmarks for the display path.

mod sampler;
mod step_sequencer;

pub use sampler::bench_sampler;
pub use step_sequencer::bench_step_sequencer;
