//! Phase-to-value functions for the continuous LFO shapes.
//!
//! All functions take a phase in [0, 1) and return a bipolar value. The
//! `deform` amount bends the curve: positive values push it toward the top,
//! negative values toward the bottom.

use std::f32::consts::TAU;

/// Deform bend applied to sine, triangle and ramp shapes.
#[inline]
pub fn bend(x: f32, deform: f32) -> f32 {
    let a = 0.5 * deform.clamp(-3.0, 3.0);
    let x = x - a * x * x + a;
    x - a * x * x + a
}

#[inline]
pub fn sine(phase: f32, deform: f32) -> f32 {
    bend((phase * TAU).sin(), deform)
}

#[inline]
pub fn triangle(phase: f32, deform: f32) -> f32 {
    let folded = if phase > 0.5 { 1.0 - phase } else { phase };
    bend(-1.0 + 4.0 * folded, deform)
}

/// Falling ramp: +1 at phase 0 down to -1 at phase 1.
#[inline]
pub fn ramp(phase: f32, deform: f32) -> f32 {
    bend(1.0 - 2.0 * phase, deform)
}

/// Pulse wave; `deform` moves the duty cycle.
#[inline]
pub fn square(phase: f32, deform: f32) -> f32 {
    if phase > 0.5 + 0.5 * deform {
        -1.0
    } else {
        1.0
    }
}

/// Cubic interpolation between y1 and y2, with y0 and y3 as outer neighbours.
#[inline]
pub fn cubic_interpolate(y0: f32, y1: f32, y2: f32, y3: f32, mu: f32) -> f32 {
    let mu2 = mu * mu;
    let a0 = y3 - y2 - y0 + y1;
    let a1 = y0 - y1 - a0;
    let a2 = y2 - y0;
    let a3 = y1;

    a0 * mu * mu2 + a1 * mu2 + a2 * mu + a3
}

/// Interpolate between held values, as used by the step sequencer.
///
/// `history[1]` is the value being approached, `history[2]` the previous
/// one. Deform chooses the transition:
///
///   > 0.5     blend from linear toward cubic interpolation
///   0 .. 0.5  slew from previous to next over the first part of the step
///   -0.5 .. 0 rise from zero into the step (gated)
///   < -0.5    decay from the step value toward zero
pub fn interpolate_steps(history: &[f32; 4], phase: f32, deform: f32) -> f32 {
    if deform > 0.5 {
        let linear = (1.0 - phase) * history[2] + phase * history[1];
        let cubic = cubic_interpolate(history[3], history[2], history[1], history[0], phase);
        (2.0 - 2.0 * deform) * linear + (2.0 * deform - 1.0) * cubic
    } else if deform > -0.0001 {
        let cf = (phase / (2.0 * deform + 0.00001)).clamp(0.0, 1.0);
        (1.0 - cf) * history[2] + cf * history[1]
    } else if deform > -0.5 {
        let cf = ((1.0 - phase) / (-2.0 * deform + 0.00001)).clamp(0.0, 1.0);
        cf * history[1]
    } else {
        let cf = (phase / (2.0 + 2.0 * deform + 0.00001)).clamp(0.0, 1.0);
        (1.0 - cf) * history[1]
    }
}
