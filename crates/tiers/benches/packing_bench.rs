//! Benchmarks for tier packing.
//!
//! Measures single-chromosome packing at various scales and a short
//! optimizer run.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use u_rack_tiers::{
    rectangles_from_dims, EncodingLimits, StackConfig, StackOptimizer, TierChromosome, TierPacker,
};

fn dims(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let w = 1.0 + (i as f64 * 0.7) % 3.0;
            let h = 1.0 + (i as f64 * 1.3) % 3.5;
            (w, h)
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("tier_pack");

    for &n in &[10, 50, 200] {
        let rects = rectangles_from_dims(&dims(n)).unwrap_or_default();
        let max_containers = (n / 5).max(2);
        let max_total_height = 4.0 * max_containers as f64;
        let packer = TierPacker::new(rects, 10.0, max_total_height, 0.02);
        let limits = EncodingLimits {
            rect_count: n,
            max_containers,
            max_total_height,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let chromosome = TierChromosome::random(&limits, &mut rng);

        group.bench_with_input(
            BenchmarkId::new("rectangles", n),
            &(packer, chromosome),
            |b, (p, ch)| b.iter(|| black_box(p.pack(black_box(ch)))),
        );
    }
    group.finish();
}

fn bench_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack_optimizer");
    group.sample_size(10);

    let config = StackConfig::new(7.0, 20.0)
        .with_max_containers(5)
        .with_population_size(50)
        .with_generations(20)
        .with_seed(7);

    if let Ok(optimizer) = StackOptimizer::new(&dims(20), config) {
        group.bench_function("20_rectangles", |b| b.iter(|| black_box(optimizer.run())));
    }
    group.finish();
}

criterion_group!(benches, bench_pack, bench_optimizer);
criterion_main!(benches);
