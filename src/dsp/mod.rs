//! Low-level modulation primitives used by the display simulation.
//!
//! These components are allocation-free and run at block rate. They stay
//! focused on the math so the simulator can layer shape selection, step
//! playback and envelope gating on top.

/// Delay/attack/hold/decay/sustain/release envelope, advanced per block.
pub mod envelope;
/// Rate conversions and the value-to-display mapping.
pub mod lfo;
/// Seeded random numbers and correlated noise.
pub mod noise;
/// Phase-to-value functions for the continuous shapes.
pub mod waveshape;

pub use envelope::{Dahdsr, EnvelopeStage, EnvelopeTime, LfoEnvelope};
