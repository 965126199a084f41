use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;
use rand::rngs::SmallRng;
use reel::prelude::*;
use reel_trees::{DecisionTreeRegressor, MaxFeatures};

fn generate_regression(samples: usize, rng: &mut SmallRng) -> (Array2<f64>, Array1<f64>) {
    let records = Array::random_using((samples, 5), Uniform::new(-1., 1.), &mut *rng);
    let noise = Array::random_using(samples, StandardNormal, &mut *rng) * 0.1;
    let targets = records.map_axis(Axis(1), |row| 4. * row[0] - 2. * row[1] * row[2] + row[3])
        + noise;

    (records, targets)
}

fn decision_tree_bench(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);

    let training_set_sizes = &[100, 1000, 10000];

    let mut group = c.benchmark_group("regression_tree");
    group
        .sample_size(30)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2));

    for (name, hyperparams) in &[
        ("all_features", DecisionTreeRegressor::params()),
        (
            "sqrt_features",
            DecisionTreeRegressor::params().max_features(MaxFeatures::Sqrt),
        ),
    ] {
        for n in training_set_sizes.iter() {
            let (records, targets) = generate_regression(*n, &mut rng);
            let dataset = DatasetBase::new(records, targets);

            group.bench_with_input(BenchmarkId::new(*name, n), &dataset, |b, d| {
                b.iter(|| {
                    let model: Result<_> = hyperparams.fit(d);
                    model
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, decision_tree_bench);
criterion_main!(benches);
