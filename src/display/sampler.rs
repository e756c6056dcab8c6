use std::fmt;

use log::warn;

use crate::dsp::envelope::EnvelopeStage;
use crate::dsp::lfo::{display_band, full_frame, period_from_frequency, unipolar_to_bipolar};
use crate::modulation::{LfoConfig, LfoShape, LfoSimulator, ModulationSource, Rate};
use crate::sequencing::Tempo;
use crate::step_sequencer::StepSequencerStorage;
use crate::N_STEPS;

use super::config::DisplayConfig;
use super::ruler::{beat_marks, time_marks, BeatMark, TimeMark};

/*
Waveform Sampling
=================

Drawing an LFO means running it. The sampler builds a simulated source,
triggers it, holds the key for a moment once the envelope settles, lets go,
and records what comes out, block by block.

Vocabulary
----------

  column      A group of consecutive blocks reduced to one point: mean,
              minimum and maximum output. Keeping min and max preserves
              peaks that a plain mean would flatten.

  window      Blocks per column: total_blocks / max_columns + 1.

  sustain     The first time the source reaches its sustain stage, the
  hold        sampler keeps the key down for `sustain_time` more seconds
              and then releases.

  overlay     A second simulation drawn behind the main curve. With the
              rate deactivated it stretches exactly one cycle over the
              frame; with magnitude turned down it shows the full-magnitude
              wave for reference.


Timing
------

  total time = delay + attack + hold + decay
             + min(release, release_cap) + sustain_time

Oscillating shapes stop after `max_cycles` cycles so fast rates do not
turn into a solid block. The step sequencer always shows sixteen cycles,
one per step, and draws its value across the full frame.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerError {
    /// The source produced NaN or an infinity
    NonFinite { block: usize },
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerError::NonFinite { block } => {
                write!(f, "waveform produced NaN or infinite values at block {}", block)
            }
        }
    }
}

impl std::error::Error for SamplerError {}

/// One column of the main curve. y grows downward.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePoint {
    pub x: f32,
    /// Mean value of the column
    pub y: f32,
    /// Topmost point (the column maximum)
    pub y_min: f32,
    /// Bottommost point (the column minimum)
    pub y_max: f32,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// One complete cycle stretched across the frame (rate deactivated)
    FullCycle,
    /// The same settings at full magnitude
    AmplitudeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub points: Vec<WavePoint>,
}

/// Everything needed to draw one LFO display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledWaveform {
    pub points: Vec<WavePoint>,
    pub envelope_upper: Option<Vec<CurvePoint>>,
    pub envelope_lower: Option<Vec<CurvePoint>>,
    pub overlay: Option<Overlay>,
    /// Seconds covered from x = 0 to x = 1
    pub drawn_time: f32,
    /// Set when the source misbehaved; offending values were drawn as 0
    pub invalid: Option<SamplerError>,
    pub beat_marks: Vec<BeatMark>,
    pub time_marks: Vec<TimeMark>,
}

impl SampledWaveform {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn invalid_message(&self) -> Option<String> {
        self.invalid.map(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
struct Stats {
    sum: f32,
    min: f32,
    max: f32,
    count: usize,
}

impl Stats {
    fn new() -> Self {
        Self {
            sum: 0.0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            count: 0,
        }
    }

    fn add(&mut self, value: f32) {
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
    }

    fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        }
    }

    fn to_point(self, x: f32, map: impl Fn(f32) -> f32) -> WavePoint {
        WavePoint {
            x,
            y: map(self.mean()),
            y_min: map(self.max),
            y_max: map(self.min),
        }
    }
}

struct Column {
    /// First block of the column
    block: usize,
    output: Stats,
    envelope: f32,
    overlay: Option<Stats>,
}

struct Sweep {
    columns: Vec<Column>,
    invalid: Option<SamplerError>,
}

struct SweepPlan {
    total_blocks: usize,
    window: usize,
    sustain_blocks: usize,
    /// Scales the envelope level into envelope bounds
    envelope_gain: f32,
}

fn finite_or_zero(value: f32, block: usize, invalid: &mut Option<SamplerError>) -> f32 {
    if value.is_finite() {
        value
    } else {
        invalid.get_or_insert(SamplerError::NonFinite { block });
        0.0
    }
}

/// Turns LFO settings into drawable curves.
#[derive(Debug, Clone, Default)]
pub struct WaveformSampler {
    config: DisplayConfig,
}

impl WaveformSampler {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Sample a continuous LFO shape, with envelope bounds, overlay and
    /// rulers. `steps` is only read by the step-sequencer shape.
    ///
    /// Panics if `pixel_width` is zero.
    pub fn sample(
        &self,
        lfo: &LfoConfig,
        steps: &StepSequencerStorage,
        pixel_width: usize,
        tempo: &Tempo,
    ) -> SampledWaveform {
        assert!(pixel_width > 0, "pixel width must be positive");
        let c = &self.config;
        let block_rate = c.block_rate();

        let env = &lfo.envelope;
        let mut total_time =
            env.onset_seconds() + env.release.seconds().min(c.release_cap) + c.sustain_time;
        if lfo.shape.is_oscillating() && !lfo.rate.deactivated {
            total_time = total_time.min(c.max_cycles / lfo.rate.hz(tempo));
        }

        let mut primary = LfoSimulator::new(*lfo, *tempo, block_rate).steps(*steps);
        primary.attack();

        let overlay_config = if lfo.rate.deactivated {
            let mut full = *lfo;
            full.rate = Rate {
                value: (1.0 / total_time).log2(),
                deactivated: false,
                ..lfo.rate
            };
            full.start_phase = 0.0;
            Some((full, OverlayKind::FullCycle))
        } else if c.ghost_reference && lfo.magnitude != LfoConfig::MAX_MAGNITUDE {
            Some((lfo.magnitude(LfoConfig::MAX_MAGNITUDE), OverlayKind::AmplitudeReference))
        } else {
            None
        };
        let mut overlay = overlay_config.map(|(config, kind)| {
            let mut sim = LfoSimulator::new(config, *tempo, block_rate).steps(*steps);
            sim.attack();
            (sim, kind)
        });

        if let LfoShape::Formula(formula) = lfo.shape {
            if !formula.use_envelope {
                total_time = c.free_formula_time;
            }
        }

        let bps = c.blocks_per_second();
        let total_blocks = pixel_width.max((total_time * bps) as usize);
        let plan = SweepPlan {
            total_blocks,
            window: total_blocks / c.max_columns.max(1) + 1,
            sustain_blocks: (c.sustain_time * bps) as usize,
            envelope_gain: lfo.magnitude,
        };

        let sweep = self.sweep(
            &mut primary,
            overlay
                .as_mut()
                .map(|(sim, _)| sim as &mut dyn ModulationSource),
            &plan,
        );

        let mut waveform = assemble(&sweep, &plan, lfo.uses_envelope());
        waveform.drawn_time = total_blocks as f32 / bps;
        waveform.points = sweep
            .columns
            .iter()
            .map(|col| col.output.to_point(x_of(col, &plan), display_band))
            .collect();

        if lfo.unipolar || matches!(lfo.shape, LfoShape::Envelope) {
            waveform.envelope_lower = None;
        }

        if let Some((_, kind)) = overlay {
            waveform.overlay = Some(Overlay {
                kind,
                points: sweep
                    .columns
                    .iter()
                    .filter_map(|col| {
                        col.overlay
                            .map(|stats| stats.to_point(x_of(col, &plan), display_band))
                    })
                    .collect(),
            });
        }

        if lfo.any_temposync() {
            waveform.beat_marks = beat_marks(tempo, waveform.drawn_time);
        }
        waveform.time_marks = time_marks(waveform.drawn_time);

        if let Some(err) = waveform.invalid {
            warn!("{} shape: {}", lfo.shape.name(), err);
        }
        waveform
    }

    /// Sample the step-sequencer shape: sixteen cycles across the frame, one
    /// per step, drawn over the full height.
    ///
    /// Panics if `pixel_width` is zero.
    pub fn sample_for_step_sequencer(
        &self,
        lfo: &LfoConfig,
        steps: &StepSequencerStorage,
        pixel_width: usize,
        tempo: &Tempo,
    ) -> SampledWaveform {
        assert!(pixel_width > 0, "pixel width must be positive");
        let c = &self.config;

        let mut floor = c.step_rate_floor;
        if lfo.rate.temposync {
            floor = floor.max((floor.exp2() * tempo.sync_ratio_inv()).log2());
        }
        let mut config = *lfo;
        if config.rate.value < floor {
            config.rate.value = floor;
        }

        let bps = c.blocks_per_second();
        let cycle = period_from_frequency(config.rate.hz(tempo));
        let total_time = cycle * N_STEPS as f32;
        let cycle_blocks = cycle * bps;
        let total_blocks =
            (c.step_blocks_per_pixel * pixel_width).max((total_time * bps) as usize);
        let plan = SweepPlan {
            total_blocks,
            window: total_blocks / c.step_max_columns.max(1) + 1,
            sustain_blocks: (4.0 * cycle * bps) as usize,
            envelope_gain: lfo.magnitude,
        };

        let mut source = LfoSimulator::new(config, *tempo, c.block_rate()).steps(*steps);
        source.attack();
        let sweep = self.sweep(&mut source, None, &plan);

        let span = cycle_blocks * N_STEPS as f32;
        let x_of_step = |col: &Column| col.block as f32 / span;
        let lift = |v: f32| {
            if lfo.unipolar {
                full_frame(unipolar_to_bipolar(v))
            } else {
                full_frame(v)
            }
        };

        let mut waveform = SampledWaveform {
            drawn_time: total_time,
            invalid: sweep.invalid,
            ..SampledWaveform::default()
        };
        waveform.points = sweep
            .columns
            .iter()
            .filter(|&col| x_of_step(col) <= 1.0)
            .map(|col| col.output.to_point(x_of_step(col), &lift))
            .collect();

        if lfo.uses_envelope() {
            let curve = |sign: f32| {
                sweep
                    .columns
                    .iter()
                    .filter(|&col| x_of_step(col) <= 1.0)
                    .map(|col| CurvePoint {
                        x: x_of_step(col),
                        y: full_frame(sign * col.envelope),
                    })
                    .collect::<Vec<_>>()
            };
            waveform.envelope_upper = Some(curve(1.0));
            if !lfo.unipolar {
                waveform.envelope_lower = Some(curve(-1.0));
            }
        }

        if let Some(err) = waveform.invalid {
            warn!("step sequencer: {}", err);
        }
        waveform
    }

    /// Sample any [`ModulationSource`] over `total_time` seconds. The source
    /// is triggered here. No overlay or rulers beyond the time ruler.
    ///
    /// Panics if `pixel_width` is zero.
    pub fn sample_source(
        &self,
        source: &mut dyn ModulationSource,
        pixel_width: usize,
        total_time: f32,
        magnitude: f32,
    ) -> SampledWaveform {
        assert!(pixel_width > 0, "pixel width must be positive");
        let c = &self.config;
        let bps = c.blocks_per_second();
        let total_blocks = pixel_width.max((total_time.max(0.0) * bps) as usize);
        let plan = SweepPlan {
            total_blocks,
            window: total_blocks / c.max_columns.max(1) + 1,
            sustain_blocks: (c.sustain_time * bps) as usize,
            envelope_gain: magnitude,
        };

        source.attack();
        let sweep = self.sweep(source, None, &plan);

        let mut waveform = assemble(&sweep, &plan, source.uses_envelope());
        waveform.drawn_time = total_blocks as f32 / bps;
        waveform.points = sweep
            .columns
            .iter()
            .map(|col| col.output.to_point(x_of(col, &plan), display_band))
            .collect();
        waveform.time_marks = time_marks(waveform.drawn_time);

        if let Some(err) = waveform.invalid {
            warn!("{}", err);
        }
        waveform
    }

    /// Run the simulation column by column.
    fn sweep(
        &self,
        primary: &mut dyn ModulationSource,
        mut overlay: Option<&mut dyn ModulationSource>,
        plan: &SweepPlan,
    ) -> Sweep {
        let mut columns = Vec::with_capacity(plan.total_blocks / plan.window + 1);
        let mut invalid = None;
        let mut countdown: Option<usize> = None;

        let mut block = 0;
        while block < plan.total_blocks {
            let mut output = Stats::new();
            let mut overlay_stats = overlay.as_ref().map(|_| Stats::new());
            let mut envelope = 0.0;

            for offset in 0..plan.window {
                let current = block + offset;
                primary.process_block();
                if let Some(source) = overlay.as_deref_mut() {
                    source.process_block();
                }

                let sustaining = primary.envelope_stage() == EnvelopeStage::Sustain;
                match countdown {
                    None if sustaining => countdown = Some(plan.sustain_blocks),
                    Some(0) if sustaining => {
                        primary.release();
                        if let Some(source) = overlay.as_deref_mut() {
                            source.release();
                        }
                    }
                    Some(n) if n > 0 => countdown = Some(n - 1),
                    _ => {}
                }

                output.add(finite_or_zero(primary.output(), current, &mut invalid));
                if let (Some(stats), Some(source)) = (overlay_stats.as_mut(), overlay.as_deref()) {
                    stats.add(finite_or_zero(source.output(), current, &mut invalid));
                }
                envelope += finite_or_zero(
                    primary.envelope_value() * plan.envelope_gain,
                    current,
                    &mut invalid,
                );
            }

            columns.push(Column {
                block,
                output,
                envelope: envelope / plan.window as f32,
                overlay: overlay_stats,
            });
            block += plan.window;
        }

        Sweep { columns, invalid }
    }
}

/// Sample `lfo` with whichever path suits its shape.
pub fn render_waveform(
    sampler: &WaveformSampler,
    lfo: &LfoConfig,
    steps: &StepSequencerStorage,
    pixel_width: usize,
    tempo: &Tempo,
) -> SampledWaveform {
    if lfo.shape.is_step_sequencer() {
        sampler.sample_for_step_sequencer(lfo, steps, pixel_width, tempo)
    } else {
        sampler.sample(lfo, steps, pixel_width, tempo)
    }
}

/// Envelope bounds and validity shared by the continuous paths.
fn assemble(sweep: &Sweep, plan: &SweepPlan, draw_envelope: bool) -> SampledWaveform {
    let mut waveform = SampledWaveform {
        invalid: sweep.invalid,
        ..SampledWaveform::default()
    };

    if draw_envelope {
        let curve = |sign: f32| {
            sweep
                .columns
                .iter()
                .map(|col| CurvePoint {
                    x: x_of(col, plan),
                    y: display_band(sign * col.envelope),
                })
                .collect::<Vec<_>>()
        };
        waveform.envelope_upper = Some(curve(1.0));
        waveform.envelope_lower = Some(curve(-1.0));
    }
    waveform
}

fn x_of(column: &Column, plan: &SweepPlan) -> f32 {
    column.block as f32 / plan.total_blocks as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::{Dahdsr, EnvelopeTime};

    fn sampler() -> WaveformSampler {
        WaveformSampler::new(DisplayConfig::default())
    }

    fn steps() -> StepSequencerStorage {
        StepSequencerStorage::new()
    }

    #[test]
    fn test_points_stay_in_display_band() {
        let lfo = LfoConfig::new(LfoShape::Sine).rate(Rate::new(2.0));
        let waveform = sampler().sample(&lfo, &steps(), 300, &Tempo::default());
        assert!(waveform.is_valid());
        for p in &waveform.points {
            assert!((0.1 - 1e-5..=0.9 + 1e-5).contains(&p.y), "y {} out of band", p.y);
            assert!(p.y_min <= p.y + 1e-6 && p.y <= p.y_max + 1e-6);
            assert!((0.0..1.0).contains(&p.x));
        }
    }

    #[test]
    fn test_fast_rates_are_limited_to_fifty_cycles() {
        let lfo = LfoConfig::new(LfoShape::Sine).rate(Rate::new(6.0)); // 64 Hz
        let waveform = sampler().sample(&lfo, &steps(), 200, &Tempo::default());
        assert!(waveform.drawn_time < 50.0 / 64.0 + 0.01, "drawn {}", waveform.drawn_time);
    }

    #[test]
    fn test_column_count_is_bounded() {
        let lfo = LfoConfig::new(LfoShape::Envelope).envelope(Dahdsr {
            attack: EnvelopeTime::new(3.0),
            decay: EnvelopeTime::new(3.0),
            ..Dahdsr::default()
        });
        let waveform = sampler().sample(&lfo, &steps(), 400, &Tempo::default());
        assert!(waveform.points.len() <= 1000, "{} columns", waveform.points.len());
        assert!(waveform.points.len() > 400);
    }

    #[test]
    fn test_deactivated_rate_draws_one_cycle_overlay() {
        let lfo = LfoConfig::new(LfoShape::Sine).rate(Rate::new(0.0).deactivated());
        let waveform = sampler().sample(&lfo, &steps(), 200, &Tempo::default());
        let overlay = waveform.overlay.expect("full cycle overlay");
        assert_eq!(overlay.kind, OverlayKind::FullCycle);
        assert_eq!(overlay.points.len(), waveform.points.len());
    }

    #[test]
    fn test_reduced_magnitude_adds_reference() {
        let lfo = LfoConfig::new(LfoShape::Square).magnitude(0.5);
        let waveform = sampler().sample(&lfo, &steps(), 200, &Tempo::default());
        let overlay = waveform.overlay.expect("amplitude reference");
        assert_eq!(overlay.kind, OverlayKind::AmplitudeReference);

        let top = overlay.points.iter().map(|p| p.y_min).fold(f32::MAX, f32::min);
        assert!((top - 0.1).abs() < 1e-4, "reference should reach the top, got {}", top);

        let off = WaveformSampler::new(DisplayConfig::default().ghost_reference(false));
        assert!(off.sample(&lfo, &steps(), 200, &Tempo::default()).overlay.is_none());
    }

    #[test]
    fn test_unipolar_has_no_lower_bound() {
        let lfo = LfoConfig::new(LfoShape::Triangle).unipolar(true);
        let waveform = sampler().sample(&lfo, &steps(), 100, &Tempo::default());
        assert!(waveform.envelope_upper.is_some());
        assert!(waveform.envelope_lower.is_none());

        let bipolar = sampler().sample(&lfo.unipolar(false), &steps(), 100, &Tempo::default());
        assert!(bipolar.envelope_lower.is_some());
    }

    #[test]
    fn test_bypassed_envelope_is_not_drawn() {
        let lfo = LfoConfig::new(LfoShape::Sine).envelope_bypassed(true);
        let waveform = sampler().sample(&lfo, &steps(), 100, &Tempo::default());
        assert!(waveform.envelope_upper.is_none());
    }

    #[test]
    fn test_beats_only_when_synced() {
        let free = LfoConfig::new(LfoShape::Sine);
        let synced = free.rate(Rate::new(0.0).synced());
        let tempo = Tempo::new(120.0);
        assert!(sampler().sample(&free, &steps(), 100, &tempo).beat_marks.is_empty());
        assert!(!sampler().sample(&synced, &steps(), 100, &tempo).beat_marks.is_empty());
    }

    #[test]
    fn test_release_happens_after_sustain_hold() {
        let lfo = LfoConfig::new(LfoShape::Envelope).envelope(Dahdsr {
            decay: EnvelopeTime::new(-2.0),
            sustain: 0.5,
            release: EnvelopeTime::new(-2.0),
            ..Dahdsr::default()
        });
        let waveform = sampler().sample(&lfo, &steps(), 200, &Tempo::default());
        let last = waveform.points.last().expect("points");
        // Sustain at 0.5 draws at 0.3; the released tail ends near the center
        assert!(last.y > 0.45, "last y {}", last.y);
    }

    #[test]
    #[should_panic(expected = "pixel width")]
    fn test_zero_width_panics() {
        sampler().sample(&LfoConfig::default(), &steps(), 0, &Tempo::default());
    }

    #[test]
    fn test_step_curve_spans_sixteen_steps() {
        let mut storage = steps();
        storage.steps[0] = 1.0;
        storage.steps[15] = -1.0;
        // Releasing is disabled so the last step keeps its full level
        let lfo = LfoConfig::new(LfoShape::StepSequencer)
            .rate(Rate::new(2.0))
            .envelope(Dahdsr {
                release: EnvelopeTime::new(EnvelopeTime::MAX),
                ..Dahdsr::default()
            });
        let waveform = sampler().sample_for_step_sequencer(&lfo, &storage, 64, &Tempo::default());

        assert!((waveform.drawn_time - 4.0).abs() < 1e-4);
        let first = waveform.points.first().expect("points");
        let last = waveform.points.last().expect("points");
        assert!(first.y < 0.01, "first step at the top, got {}", first.y);
        assert!(last.y > 0.99, "last step at the bottom, got {}", last.y);
        assert!(waveform.points.iter().all(|p| p.x <= 1.0));
    }

    #[test]
    fn test_slow_step_rates_are_floored() {
        let lfo = LfoConfig::new(LfoShape::StepSequencer).rate(Rate::new(-5.0));
        let waveform = sampler().sample_for_step_sequencer(&lfo, &steps(), 64, &Tempo::default());
        let floor_time = 16.0 / (-1.2f32).exp2();
        assert!((waveform.drawn_time - floor_time).abs() < 1e-3);
    }

    #[test]
    fn test_unipolar_steps_fill_frame() {
        let mut storage = steps();
        storage.steps = [0.0; N_STEPS];
        let lfo = LfoConfig::new(LfoShape::StepSequencer).rate(Rate::new(2.0)).unipolar(true);
        let waveform = sampler().sample_for_step_sequencer(&lfo, &storage, 64, &Tempo::default());
        // Unipolar zero maps to the bottom of the frame
        assert!(waveform.points.iter().all(|p| (p.y - 1.0).abs() < 1e-5));
        assert!(waveform.envelope_lower.is_none());
    }
}
