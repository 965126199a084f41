//! Common metrics for regression
//!
//! This module implements common comparison metrices for continuous variables. All metrics are
//! called on the prediction and take the ground truth as argument:
//!
//! ```ignore
//! prediction.r2(&ground_truth)
//! ```

use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::Float;
use crate::error::{Error, Result};

/// Regression metrices trait
pub trait Regression<F: Float> {
    /// Maximal error between two continuous variables
    fn max_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F>;
    /// Mean error between two continuous variables
    fn mean_absolute_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F>;
    /// Mean squared error between two continuous variables
    fn mean_squared_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F>;
    /// Median absolute error between two continuous variables
    fn median_absolute_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>)
        -> Result<F>;
    /// R squared coefficient, is the proportion of the variance in the dependent variable that is
    /// predictable from the independent variable.
    ///
    /// A constant ground truth yields `1` for a perfect prediction and `0` otherwise.
    fn r2<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F>;
    /// Same as R-Squared but uses the variance of the residuals instead of their squared sum
    fn explained_variance<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F>;
    /// Fraction of predictions whose relative error `|truth - prediction| / |truth|` is at most
    /// `tolerance`
    ///
    /// Samples with a ground truth of zero have an undefined relative error and never count as
    /// a hit.
    fn within_relative_tolerance<S: Data<Elem = F>>(
        &self,
        compare_to: &ArrayBase<S, Ix1>,
        tolerance: F,
    ) -> Result<F>;
}

impl<F: Float, D: Data<Elem = F>> Regression<F> for ArrayBase<D, Ix1> {
    fn max_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F> {
        let residuals = residuals(self, compare_to)?;

        Ok(residuals
            .iter()
            .map(|x| x.abs())
            .fold(F::neg_infinity(), F::max))
    }

    fn mean_absolute_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F> {
        let residuals = residuals(self, compare_to)?;

        Ok(residuals.mapv(|x| x.abs()).sum() / F::cast(residuals.len()))
    }

    fn mean_squared_error<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F> {
        let residuals = residuals(self, compare_to)?;

        Ok(residuals.mapv(|x| x * x).sum() / F::cast(residuals.len()))
    }

    fn median_absolute_error<S: Data<Elem = F>>(
        &self,
        compare_to: &ArrayBase<S, Ix1>,
    ) -> Result<F> {
        let residuals = residuals(self, compare_to)?;

        let mut abs_error = residuals.mapv(|x| x.abs()).to_vec();
        abs_error.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = abs_error.len() / 2;
        if abs_error.len() % 2 == 0 {
            Ok((abs_error[mid - 1] + abs_error[mid]) / F::cast(2.0))
        } else {
            Ok(abs_error[mid])
        }
    }

    fn r2<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F> {
        let residuals = residuals(self, compare_to)?;
        let mean = compare_to.sum() / F::cast(compare_to.len());

        let ss_res = residuals.mapv(|x| x * x).sum();
        let ss_tot = compare_to.mapv(|x| (x - mean) * (x - mean)).sum();

        if ss_tot == F::zero() {
            return Ok(if ss_res == F::zero() {
                F::one()
            } else {
                F::zero()
            });
        }

        Ok(F::one() - ss_res / ss_tot)
    }

    fn explained_variance<S: Data<Elem = F>>(&self, compare_to: &ArrayBase<S, Ix1>) -> Result<F> {
        let residuals = residuals(self, compare_to)?;
        let n = F::cast(residuals.len());

        let mean_residual = residuals.sum() / n;
        let var_residual = residuals
            .mapv(|x| (x - mean_residual) * (x - mean_residual))
            .sum()
            / n;

        let mean = compare_to.sum() / n;
        let var_truth = compare_to.mapv(|x| (x - mean) * (x - mean)).sum() / n;

        if var_truth == F::zero() {
            return Ok(if var_residual == F::zero() {
                F::one()
            } else {
                F::zero()
            });
        }

        Ok(F::one() - var_residual / var_truth)
    }

    fn within_relative_tolerance<S: Data<Elem = F>>(
        &self,
        compare_to: &ArrayBase<S, Ix1>,
        tolerance: F,
    ) -> Result<F> {
        let residuals = residuals(self, compare_to)?;

        let hits = residuals
            .iter()
            .zip(compare_to.iter())
            .filter(|(residual, truth)| {
                // NaN and infinite ratios from a zero ground truth fail the comparison
                let relative = (**residual / **truth).abs();
                relative <= tolerance
            })
            .count();

        Ok(F::cast(hits) / F::cast(residuals.len()))
    }
}

/// Ground truth minus prediction, checking both inputs are non-empty and equally long
fn residuals<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>(
    prediction: &ArrayBase<D, Ix1>,
    ground_truth: &ArrayBase<S, Ix1>,
) -> Result<Array1<F>> {
    if prediction.len() != ground_truth.len() {
        return Err(Error::MismatchedShapes {
            expected: ground_truth.len(),
            found: prediction.len(),
        });
    }
    if ground_truth.is_empty() {
        return Err(Error::NotEnoughSamples);
    }

    Ok(ground_truth - prediction)
}
