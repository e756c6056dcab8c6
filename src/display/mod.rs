//! Waveform sampling for LFO editors.
//!
//! [`WaveformSampler`] runs an [`LfoSimulator`](crate::LfoSimulator) offline
//! and reduces its output to screen columns, envelope bounds, an optional
//! overlay and beat/time rulers. Coordinates are normalized: x runs 0..1
//! across the drawn time and y runs 0..1 downward.

pub mod config;
pub mod ruler;
pub mod sampler;

pub use config::DisplayConfig;
pub use ruler::{beat_marks, time_marks, BeatMark, TimeMark};
pub use sampler::{
    render_waveform, CurvePoint, Overlay, OverlayKind, SampledWaveform, SamplerError, WavePoint,
    WaveformSampler,
};
