//! Benchmarks for sampling continuous LFO shapes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_lfo::dsp::envelope::{Dahdsr, EnvelopeTime};
use saavy_lfo::modulation::{LfoConfig, LfoShape, Rate};
use saavy_lfo::{StepSequencerStorage, Tempo, WaveformSampler};

use crate::PIXEL_WIDTHS;

pub fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("display/sampler");
    let sampler = WaveformSampler::default();
    let steps = StepSequencerStorage::new();
    let tempo = Tempo::new(120.0);

    for &width in PIXEL_WIDTHS {
        // Short envelope, a handful of cycles
        let sine = LfoConfig::new(LfoShape::Sine).rate(Rate::new(1.0));
        group.bench_with_input(BenchmarkId::new("sine", width), &width, |b, &width| {
            b.iter(|| sampler.sample(black_box(&sine), &steps, width, &tempo))
        });

        // Long envelope: the column window grows, the column count does not
        let long = LfoConfig::new(LfoShape::Noise).envelope(Dahdsr {
            attack: EnvelopeTime::new(2.0),
            decay: EnvelopeTime::new(2.0),
            release: EnvelopeTime::new(2.0),
            ..Dahdsr::default()
        });
        group.bench_with_input(BenchmarkId::new("noise_long_envelope", width), &width, |b, &width| {
            b.iter(|| sampler.sample(black_box(&long), &steps, width, &tempo))
        });

        // Reduced magnitude draws a second, full-magnitude simulation
        let ghost = LfoConfig::new(LfoShape::Triangle)
            .rate(Rate::new(0.0).synced())
            .magnitude(0.5);
        group.bench_with_input(BenchmarkId::new("triangle_ghost", width), &width, |b, &width| {
            b.iter(|| sampler.sample(black_box(&ghost), &steps, width, &tempo))
        });
    }

    group.finish();
}
