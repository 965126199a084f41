use ndarray::{Array, Array1, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::SmallRng;
use reel::prelude::*;
use reel_ensemble::RandomForestRegressor;

fn wave(nsamples: usize, seed: u64) -> Dataset<f64, f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let records = Array::random_using((nsamples, 3), Uniform::new(0f64, 6.), &mut rng);
    let targets = records.map_axis(Axis(1), |row| row[0].sin() * 10. + 2. * row[1]);

    Dataset::new(records, targets)
}

#[test]
fn grid_search_tunes_forest() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(42);
    let (train, test) = wave(300, 7).train_test_split(0.2, &mut rng)?;

    let grid = ParamGrid::new()
        .add("n_estimators", vec![10usize, 20])
        .add("max_depth", vec![Some(2usize), Some(10)])
        .add("min_samples_leaf", vec![1usize, 4]);

    let search: Result<GridSearch<_>> =
        GridSearchParams::new(RandomForestRegressor::params().seed(42), grid)
            .n_folds(3)
            .fit(&train);
    let search = search?;

    assert_eq!(search.results().len(), 8);
    // stumps cannot follow the wave
    assert_eq!(
        search.best_params().get("max_depth"),
        Some(&ParamValue::Int(10))
    );
    assert!(search.best_score() < 0.);

    let prediction: Array1<f64> = search.predict(&test);
    assert!(prediction.r2(&test.targets)? > 0.85);

    Ok(())
}

#[test]
fn fitting_is_reproducible() -> Result<()> {
    let dataset = wave(150, 3);
    let params = RandomForestRegressor::params()
        .n_estimators(12)
        .max_depth(Some(5))
        .seed(1);

    let first = params.fit(&dataset)?;
    let second = params.fit(&dataset)?;
    assert_eq!(first, second);

    let prediction: Array1<f64> = first.predict(dataset.records());
    let other: Array1<f64> = second.predict(dataset.records());
    assert_eq!(prediction, other);

    Ok(())
}
