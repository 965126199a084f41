use anyhow::{anyhow, Context, Result};
use rand::{rngs::SmallRng, SeedableRng};
use reel::model_selection::{GridSearch, GridSearchParams, ParamGrid, Scoring};
use reel::traits::Fit;
use reel::FrameDataset;
use reel_datasets::rotten_tomatoes::{CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use reel_ensemble::{visualization::ScatterPlot, RandomForestParams, RandomForestRegressor};
use reel_preprocessing::prelude::*;
use reel_preprocessing::pipeline::MODEL_PREFIX;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::report::Report;

/// The model pipeline tuned by the grid search
pub type MoviePipeline = PipelineParams<f64, RandomForestParams<f64>>;

/// Numeric features are median imputed and standardized, categorical features are filled with
/// their most frequent category and one-hot encoded. Other columns are dropped.
pub fn preprocessor() -> ColumnTransformer<f64> {
    ColumnTransformer::new()
        .numeric(
            "num",
            &NUMERIC_FEATURES,
            NumericPipeline::new()
                .imputer(SimpleImputer::median())
                .scaler(LinearScaler::standard()),
        )
        .categorical(
            "cat",
            &CATEGORICAL_FEATURES,
            CategoricalPipeline::new()
                .imputer(CategoricalImputer::most_frequent())
                .encoder(OneHotEncoder::new().handle_unknown(HandleUnknown::Ignore)),
        )
}

pub fn pipeline(seed: u64) -> MoviePipeline {
    PipelineParams::new(preprocessor(), RandomForestRegressor::params().seed(seed))
}

/// The forest hyperparameters of `config`, addressed through the pipeline
pub fn param_grid(config: &ExperimentConfig) -> ParamGrid {
    let name = |param: &str| format!("{}{}", MODEL_PREFIX, param);

    ParamGrid::new()
        .add(name("n_estimators"), config.n_estimators.clone())
        .add(name("max_depth"), config.max_depth.clone())
        .add(name("min_samples_split"), config.min_samples_split.clone())
        .add(name("min_samples_leaf"), config.min_samples_leaf.clone())
}

/// Tunes the pipeline on a training split of `dataset` and scores it on the held-out movies
///
/// Saves the scatter plot of actual against predicted ratings when `config.plot` is set.
pub fn run(dataset: &FrameDataset<f64>, config: &ExperimentConfig) -> Result<Report> {
    config.validate()?;

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let (train, test) = dataset
        .train_test_split(config.test_size, &mut rng)
        .context("cannot split the movies")?;
    info!(
        train = train.nsamples(),
        test = test.nsamples(),
        candidates = config.n_candidates(),
        folds = config.folds,
        "tuning random forest"
    );

    let search: std::result::Result<GridSearch<_>, PreprocessingError> =
        GridSearchParams::new(pipeline(config.seed), param_grid(config))
            .n_folds(config.folds)
            .scoring(Scoring::NegMeanSquaredError)
            .fit(&train);
    let search = search.context("grid search failed")?;
    info!(
        params = %search.best_params(),
        score = search.best_score(),
        "selected best candidate"
    );

    let predicted = search.best_estimator().try_predict(test.records())?;
    let report = Report::new(
        test.targets().clone(),
        predicted,
        config.tolerance,
        search.best_params().clone(),
        search.best_score(),
    )?;

    if let Some(path) = &config.plot {
        ScatterPlot::new()
            .draw(report.actual(), report.predicted(), path)
            .map_err(|err| anyhow!("cannot draw {}: {}", path.display(), err))?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel::model_selection::{ParamValue, SetParams};
    use reel::ParamGuard;

    #[test]
    fn grid_routes_to_the_model() {
        let grid = param_grid(&ExperimentConfig::default());
        assert_eq!(grid.len(), 81);

        let first = grid.iter().next().unwrap();
        assert_eq!(first.iter().count(), 4);
        assert!(first.iter().all(|(name, _)| name.starts_with("model__")));
    }

    #[test]
    fn pipeline_uses_seed() -> Result<()> {
        let params = pipeline(7).check()?;

        assert_eq!(params.model().check_ref()?.seed(), 7);
        assert_eq!(
            params.preprocessor().branch_names().collect::<Vec<_>>(),
            vec!["num", "cat"]
        );

        let tuned = pipeline(7).set_param("model__max_depth", &ParamValue::Int(3))?;
        assert_eq!(
            tuned.check()?.model().check_ref()?.tree_params().check()?.max_depth(),
            Some(3)
        );

        Ok(())
    }
}
