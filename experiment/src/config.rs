use std::path::PathBuf;

use anyhow::{ensure, Result};

/// Settings of one audience-rating experiment
///
/// The defaults reproduce the reference setup: a fifth of the movies held out, five folds and a
/// grid of 81 forests.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentConfig {
    /// Fraction of the movies held out for testing
    pub test_size: f64,
    /// Seed of the train/test split and of the forests
    pub seed: u64,
    /// Number of cross-validation folds of the grid search
    pub folds: usize,
    pub n_estimators: Vec<usize>,
    /// Depth limits to try, `None` grows the trees until their leaves are pure
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    /// Relative error up to which a prediction counts as accurate
    pub tolerance: f64,
    /// Where to save the actual vs predicted scatter plot, if at all
    pub plot: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            folds: 5,
            n_estimators: vec![100, 200, 300],
            max_depth: vec![Some(10), Some(20), Some(30)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
            tolerance: 0.1,
            plot: Some(PathBuf::from("actual_vs_predicted.png")),
        }
    }
}

impl ExperimentConfig {
    /// Number of hyperparameter combinations in the grid
    pub fn n_candidates(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.test_size > 0. && self.test_size < 1.,
            "test size must be between 0 and 1, got {}",
            self.test_size
        );
        ensure!(self.folds >= 2, "at least two folds are needed, got {}", self.folds);
        ensure!(
            self.n_candidates() > 0,
            "every hyperparameter needs at least one value"
        );
        ensure!(
            self.tolerance >= 0.,
            "tolerance must not be negative, got {}",
            self.tolerance
        );

        Ok(())
    }
}
