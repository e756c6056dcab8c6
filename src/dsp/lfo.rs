//! LFO rate math and value-to-display mapping.

/*
LFO Rates and Display Values
============================

An LFO in this crate is described in the units an editor exposes, not the
units the audio engine wants. This module holds the small conversions that
glue the two together.

Vocabulary
----------

  log2 rate     Rate parameters are stored as log2 of a frequency in Hz.
                0.0 = 1 Hz, 1.0 = 2 Hz, -1.0 = 0.5 Hz.

  log2 time     Envelope stage times are stored as log2 of seconds.
                0.0 = 1 s, -8.0 ≈ 4 ms.

  tempo ratio   Tempo-synced parameters scale their rate by bpm / 120.
                At 120 BPM a synced rate is identical to a free one.

  block         The simulated source advances one block (BLOCK_SIZE samples)
                at a time. A "block rate" is the fraction of a second one
                block covers: block_size / sample_rate.

  bipolar       Output swings -1.0 to +1.0.
  unipolar      Output stays in 0.0 to 1.0.
                Convert: unipolar = (bipolar + 1.0) / 2.0


The Display Band
----------------

Plots draw with y growing downward, and leave a margin above and below the
wave so peaks never touch the frame:

    y = (-value + 1) * 0.5 * 0.8 + 0.1

    value   y
    +1.0    0.1    (top of band)
     0.0    0.5    (center line)
    -1.0    0.9    (bottom of band)

Step-sequencer plots use the whole frame instead, since the step boxes
already provide the margin:

    y = (-value + 1) * 0.5
*/

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
///
/// Step-sequencer plots run unipolar values through this before mapping
/// them into the frame, so both polarities fill the same height.
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    (unipolar * 2.0) - 1.0
}

/// Map a modulation value into the [0.1, 0.9] display band.
#[inline]
pub fn display_band(value: f32) -> f32 {
    (-value + 1.0) * 0.5 * 0.8 + 0.1
}

/// Map a modulation value into the full [0.0, 1.0] frame.
#[inline]
pub fn full_frame(value: f32) -> f32 {
    (-value + 1.0) * 0.5
}

/// Frequency in Hz of a log2 rate.
///
/// # Example
/// ```
/// use saavy_lfo::dsp::lfo::rate_to_hz;
/// assert!((rate_to_hz(1.0) - 2.0).abs() < 1e-6);
/// ```
#[inline]
pub fn rate_to_hz(log2_rate: f32) -> f32 {
    log2_rate.exp2()
}

/// Calculate LFO period in seconds from frequency.
#[inline]
pub fn period_from_frequency(frequency_hz: f32) -> f32 {
    1.0 / frequency_hz
}

/// Fraction of a second covered by one processing block.
#[inline]
pub fn block_rate(block_size: usize, sample_rate: f32) -> f32 {
    block_size as f32 / sample_rate
}

/// Number of processing blocks per second of simulated time.
#[inline]
pub fn blocks_per_second(block_size: usize, sample_rate: f32) -> f32 {
    sample_rate / block_size as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bipolar_to_unipolar() {
        assert!((bipolar_to_unipolar(-1.0) - 0.0).abs() < 1e-6);
        assert!((bipolar_to_unipolar(0.0) - 0.5).abs() < 1e-6);
        assert!((bipolar_to_unipolar(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unipolar_to_bipolar() {
        assert!((unipolar_to_bipolar(0.0) - (-1.0)).abs() < 1e-6);
        assert!((unipolar_to_bipolar(0.5) - 0.0).abs() < 1e-6);
        assert!((unipolar_to_bipolar(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_display_band_edges() {
        assert!((display_band(1.0) - 0.1).abs() < 1e-6);
        assert!((display_band(0.0) - 0.5).abs() < 1e-6);
        assert!((display_band(-1.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_full_frame_edges() {
        assert!((full_frame(1.0) - 0.0).abs() < 1e-6);
        assert!((full_frame(-1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_block_rate_and_inverse() {
        let rate = block_rate(32, 48_000.0);
        let per_second = blocks_per_second(32, 48_000.0);
        assert!((rate * per_second - 1.0).abs() < 1e-6);
        assert!((per_second - 1500.0).abs() < 1e-3);
    }

    #[test]
    fn test_period_from_rate() {
        assert!((period_from_frequency(rate_to_hz(-1.0)) - 2.0).abs() < 1e-6);
    }
}
