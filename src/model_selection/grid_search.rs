use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayBase, Data, Ix1};
use rayon::prelude::*;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::{KFold, ParamGrid, ParamSet, SetParams};
use crate::dataset::{DatasetBase, Float, Records, SelectRows};
use crate::error::{Error, Result};
use crate::metrics_regression::Regression;
use crate::param_guard::ParamGuard;
use crate::traits::{Fit, Predict, PredictInplace};

/// Score used to rank the candidates of a grid search, greater is better
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    NegMeanSquaredError,
    NegMeanAbsoluteError,
    R2,
}

impl Scoring {
    /// Score `prediction` against `ground_truth`
    pub fn score<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>(
        &self,
        prediction: &ArrayBase<D, Ix1>,
        ground_truth: &ArrayBase<S, Ix1>,
    ) -> Result<f64> {
        let score = match self {
            Scoring::NegMeanSquaredError => -prediction.mean_squared_error(ground_truth)?,
            Scoring::NegMeanAbsoluteError => -prediction.mean_absolute_error(ground_truth)?,
            Scoring::R2 => prediction.r2(ground_truth)?,
        };

        Ok(score.to_f64().unwrap_or(f64::NAN))
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::NegMeanSquaredError
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scoring::NegMeanSquaredError => write!(f, "neg_mean_squared_error"),
            Scoring::NegMeanAbsoluteError => write!(f, "neg_mean_absolute_error"),
            Scoring::R2 => write!(f, "r2"),
        }
    }
}

impl FromStr for Scoring {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "neg_mean_squared_error" => Ok(Scoring::NegMeanSquaredError),
            "neg_mean_absolute_error" => Ok(Scoring::NegMeanAbsoluteError),
            "r2" => Ok(Scoring::R2),
            _ => Err(Error::Parameters(format!("unknown scoring `{}`", s))),
        }
    }
}

/// Checked grid search hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchValidParams<P> {
    estimator: P,
    grid: ParamGrid,
    n_folds: usize,
    shuffle: Option<u64>,
    scoring: Scoring,
    parallel: bool,
}

impl<P> GridSearchValidParams<P> {
    pub fn estimator(&self) -> &P {
        &self.estimator
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn shuffle(&self) -> Option<u64> {
        self.shuffle
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

/// Exhaustive search over a hyperparameter grid with k-fold cross-validation
///
/// Every candidate of the grid is applied to a clone of the estimator template, fitted on the
/// training part of every fold and scored on the validation part. The candidate with the
/// greatest mean score wins, ties are resolved in favour of the earlier candidate. The winner
/// is refitted on the complete dataset.
///
/// Defaults:
/// * `n_folds = 5`
/// * `shuffle = None`, folds are contiguous
/// * `scoring = Scoring::NegMeanSquaredError`
/// * `parallel = true`, candidates and folds are evaluated on the rayon thread pool
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchParams<P>(GridSearchValidParams<P>);

impl<P> GridSearchParams<P> {
    pub fn new(estimator: P, grid: ParamGrid) -> Self {
        GridSearchParams(GridSearchValidParams {
            estimator,
            grid,
            n_folds: 5,
            shuffle: None,
            scoring: Scoring::default(),
            parallel: true,
        })
    }

    /// Sets the number of cross-validation folds
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.0.n_folds = n_folds;
        self
    }

    /// Shuffle the samples with the given seed before building the folds
    pub fn shuffle(mut self, seed: Option<u64>) -> Self {
        self.0.shuffle = seed;
        self
    }

    pub fn scoring(mut self, scoring: Scoring) -> Self {
        self.0.scoring = scoring;
        self
    }

    /// Evaluate the candidates in parallel
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.0.parallel = parallel;
        self
    }
}

impl<P> ParamGuard for GridSearchParams<P> {
    type Checked = GridSearchValidParams<P>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_folds < 2 {
            Err(Error::Parameters(format!(
                "Number of folds should be at least two, but was {}",
                self.0.n_folds
            )))
        } else if self.0.grid.is_empty() {
            Err(Error::Parameters(
                "Parameter grid should contain at least one candidate".to_string(),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Cross-validation outcome of a single candidate
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    /// One-based rank, candidates with equal mean score share a rank
    pub rank: usize,
}

/// Fitted grid search
///
/// Holds the refitted best estimator and predicts through it.
#[derive(Debug, Clone)]
pub struct GridSearch<M> {
    best_estimator: M,
    best_index: usize,
    results: Vec<CandidateResult>,
}

impl<M> GridSearch<M> {
    pub fn best_estimator(&self) -> &M {
        &self.best_estimator
    }

    pub fn into_best_estimator(self) -> M {
        self.best_estimator
    }

    pub fn best_params(&self) -> &ParamSet {
        &self.results[self.best_index].params
    }

    /// Mean cross-validation score of the best candidate
    pub fn best_score(&self) -> f64 {
        self.results[self.best_index].mean_score
    }

    /// Results of all candidates in grid order
    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }
}

impl<R, T, M: PredictInplace<R, T>> PredictInplace<R, T> for GridSearch<M> {
    fn predict_inplace<'a>(&'a self, x: &'a R, y: &mut T) {
        self.best_estimator.predict_inplace(x, y)
    }

    fn default_target(&self, x: &R) -> T {
        self.best_estimator.default_target(x)
    }
}

impl<F, R, P, E> Fit<R, Array1<F>, E> for GridSearchValidParams<P>
where
    F: Float,
    R: Records + SelectRows<Output = R> + Sync,
    P: Fit<R, Array1<F>, E> + SetParams + Clone + Sync,
    P::Object: PredictInplace<R, Array1<F>>,
    E: std::error::Error + From<Error> + Send,
{
    type Object = GridSearch<P::Object>;

    fn fit(&self, dataset: &DatasetBase<R, Array1<F>>) -> std::result::Result<Self::Object, E> {
        let kfold = match self.shuffle {
            Some(seed) => KFold::new(self.n_folds).shuffle(seed),
            None => KFold::new(self.n_folds),
        };
        let folds = kfold
            .split(dataset.nsamples())?
            .into_iter()
            .map(|(train, valid)| (dataset.select(&train), dataset.select(&valid)))
            .collect::<Vec<_>>();

        let candidates = self
            .grid
            .iter()
            .map(|params| {
                let estimator = self.estimator.clone().set_params(&params)?;
                Ok((params, estimator))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            candidates = candidates.len(),
            folds = folds.len(),
            scoring = %self.scoring,
            "running grid search"
        );

        let tasks = (0..candidates.len())
            .flat_map(|candidate| (0..folds.len()).map(move |fold| (candidate, fold)))
            .collect::<Vec<_>>();

        let evaluate = |&(candidate, fold): &(usize, usize)| -> std::result::Result<f64, E> {
            let (train, valid) = &folds[fold];
            let model = candidates[candidate].1.fit(train)?;
            let prediction: Array1<F> = model.predict(valid.records());
            let score = self.scoring.score(&prediction, valid.targets())?;

            debug!(candidate, fold, score, "evaluated fold");
            Ok(score)
        };

        let scores = if self.parallel {
            tasks
                .par_iter()
                .map(evaluate)
                .collect::<std::result::Result<Vec<_>, E>>()?
        } else {
            tasks
                .iter()
                .map(evaluate)
                .collect::<std::result::Result<Vec<_>, E>>()?
        };

        let results = summarize(&candidates, &scores, folds.len());
        let best_index = best_candidate(&results);
        let best = &results[best_index];
        info!(
            params = %best.params,
            score = best.mean_score,
            "refitting best candidate on the full dataset"
        );

        let best_estimator = candidates[best_index].1.fit(dataset)?;

        Ok(GridSearch {
            best_estimator,
            best_index,
            results,
        })
    }
}

fn summarize<P>(
    candidates: &[(ParamSet, P)],
    scores: &[f64],
    nfolds: usize,
) -> Vec<CandidateResult> {
    let mut results = candidates
        .iter()
        .zip(scores.chunks(nfolds))
        .map(|((params, _), fold_scores)| {
            let n = fold_scores.len() as f64;
            let mean_score = fold_scores.iter().sum::<f64>() / n;
            let std_score = (fold_scores
                .iter()
                .map(|x| (x - mean_score) * (x - mean_score))
                .sum::<f64>()
                / n)
                .sqrt();

            CandidateResult {
                params: params.clone(),
                fold_scores: fold_scores.to_vec(),
                mean_score,
                std_score,
                rank: 0,
            }
        })
        .collect::<Vec<_>>();

    let means = results
        .iter()
        .map(|result| comparable(result.mean_score))
        .collect::<Vec<_>>();
    for (result, mean) in results.iter_mut().zip(means.iter()) {
        result.rank = 1 + means.iter().filter(|other| *other > mean).count();
    }

    results
}

/// Index of the first candidate with the greatest mean score
fn best_candidate(results: &[CandidateResult]) -> usize {
    let mut best = 0;
    for (idx, result) in results.iter().enumerate().skip(1) {
        if comparable(result.mean_score) > comparable(results[best].mean_score) {
            best = idx;
        }
    }

    best
}

/// Failed scores rank behind every finite one
fn comparable(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}
