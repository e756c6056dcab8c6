//! Benchmarks for the step-sequencer curve and edit gestures.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_lfo::modulation::{LfoConfig, LfoShape, Rate};
use saavy_lfo::step_sequencer::{DirtyFlag, Direction, JogSize};
use saavy_lfo::{
    StepSequencerModel, StepSequencerStorage, Tempo, UndoStack, WaveformSampler, N_STEPS,
};

use crate::PIXEL_WIDTHS;

fn ramp_storage() -> StepSequencerStorage {
    let mut steps = [0.0; N_STEPS];
    for (i, step) in steps.iter_mut().enumerate() {
        *step = (i as f32 / (N_STEPS - 1) as f32) * 2.0 - 1.0;
    }
    StepSequencerStorage::from_steps(steps)
}

pub fn bench_step_sequencer(c: &mut Criterion) {
    let mut group = c.benchmark_group("display/step_sequencer");
    let sampler = WaveformSampler::default();
    let storage = ramp_storage();
    let tempo = Tempo::new(120.0);

    for &width in PIXEL_WIDTHS {
        let lfo = LfoConfig::new(LfoShape::StepSequencer).rate(Rate::new(2.0));
        group.bench_with_input(BenchmarkId::new("curve", width), &width, |b, &width| {
            b.iter(|| sampler.sample_for_step_sequencer(black_box(&lfo), &storage, width, &tempo))
        });

        // Slowest drawable rate, the most blocks per curve
        let slow = lfo.rate(Rate::new(-8.0));
        group.bench_with_input(BenchmarkId::new("curve_slow", width), &width, |b, &width| {
            b.iter(|| sampler.sample_for_step_sequencer(black_box(&slow), &storage, width, &tempo))
        });
    }

    // One gesture: jog every step, then commit
    let mut model = StepSequencerModel::with_storage(0, storage);
    let mut undo = UndoStack::new();
    let mut patch = DirtyFlag::default();
    group.bench_function("jog_gesture", |b| {
        b.iter(|| {
            {
                let mut edit = model.edit(&mut undo, &mut patch);
                for step in 0..N_STEPS {
                    edit.jog_step(black_box(step), Direction::Up, JogSize::Fine);
                }
                edit.shift_left();
            }
            undo.clear();
        })
    });

    group.finish();
}
