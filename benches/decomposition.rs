use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fairness_cookbook::data::{Dataset, Variables};
use fairness_cookbook::estimator::LinearTLearner;
use fairness_cookbook::statistics::{replicate_rng, BootstrapIndexSet};
use fairness_cookbook::{FairnessCookbook, Measure};

fn synthetic(n: usize) -> Dataset {
    let x: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
    let z: Vec<f64> = (0..n).map(|i| ((i * 37) % 101) as f64 / 101.0).collect();
    let w: Vec<f64> = (0..n).map(|i| ((i * 53) % 89) as f64 / 89.0).collect();
    let y: Vec<f64> = (0..n)
        .map(|i| z[i] + 0.5 * w[i] + if i % 2 == 1 { 1.0 } else { 0.0 })
        .collect();
    Dataset::new()
        .with_categorical("x", x)
        .and_then(|d| d.with_numeric("z", z))
        .and_then(|d| d.with_numeric("w", w))
        .and_then(|d| d.with_numeric("y", y))
        .unwrap()
}

fn bench_inner_draws(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_bootstrap");
    for &n in &[500usize, 5_000] {
        let treated: Vec<bool> = (0..n).map(|i| i % 3 == 0).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &treated, |b, treated| {
            b.iter(|| {
                let set = BootstrapIndexSet::draw(treated, 100, true, &mut replicate_rng(1, 1));
                black_box(set.id1(99).len())
            });
        });
    }
    group.finish();
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    group.sample_size(10);
    let data = synthetic(2_000);
    let vars = Variables::new("x", "y", "a", "b").mediators(["z"]).confounders(["w"]);

    group.bench_function("full_plan_4x100", |b| {
        b.iter(|| {
            let result = FairnessCookbook::new(LinearTLearner::new())
                .nboot1(4)
                .nboot2(100)
                .seed(3)
                .decompose(&data, &vars)
                .unwrap();
            black_box(result.mean(Measure::Nde))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_inner_draws, bench_decompose);
criterion_main!(benches);
