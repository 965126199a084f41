//! Imputation of missing values
//!
//! Numeric matrices mark missing entries with NaN and are completed by a [`SimpleImputer`].
//! Categorical matrices mark them with `None` and are completed by a [`CategoricalImputer`].
//! Both learn one fill value per feature while fitting and replace the missing entries of any
//! later matrix with it.
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2, Zip};
use reel::dataset::DatasetBase;
use reel::traits::{Fit, Transformer};
use reel::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{PreprocessingError, Result};

/// Fill value rule of a [`SimpleImputer`]
///
/// * Mean: the mean of the observed values of the feature
/// * Median: the median of the observed values, averaging the two middle values for an even count
/// * MostFrequent: the most frequent observed value, the smallest one on ties
/// * Constant: a fixed value, also valid for features without any observed value
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImputeStrategy<F> {
    Mean,
    Median,
    MostFrequent,
    Constant(F),
}

impl<F: Float> fmt::Display for ImputeStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::MostFrequent => write!(f, "most frequent"),
            ImputeStrategy::Constant(value) => write!(f, "constant ({})", value),
        }
    }
}

/// Imputer for numeric features, learns a fill value per feature
///
/// ### Example
///
/// ```rust
/// use ndarray::array;
/// use reel::traits::{Fit, Transformer};
/// use reel::DatasetBase;
/// use reel_preprocessing::imputation::SimpleImputer;
///
/// let records = array![[1., f64::NAN], [3., 4.], [f64::NAN, 8.]];
/// let imputer = SimpleImputer::median().fit(&DatasetBase::from(records.view())).unwrap();
///
/// assert_eq!(imputer.statistics(), &array![2., 6.]);
/// assert_eq!(imputer.transform(records), array![[1., 6.], [3., 4.], [2., 8.]]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpleImputer<F> {
    strategy: ImputeStrategy<F>,
}

impl<F: Float> SimpleImputer<F> {
    pub fn new(strategy: ImputeStrategy<F>) -> Self {
        Self { strategy }
    }

    pub fn mean() -> Self {
        Self::new(ImputeStrategy::Mean)
    }

    pub fn median() -> Self {
        Self::new(ImputeStrategy::Median)
    }

    pub fn most_frequent() -> Self {
        Self::new(ImputeStrategy::MostFrequent)
    }

    pub fn constant(value: F) -> Self {
        Self::new(ImputeStrategy::Constant(value))
    }

    pub fn strategy(&self) -> ImputeStrategy<F> {
        self.strategy
    }
}

impl<F: Float> Default for SimpleImputer<F> {
    fn default() -> Self {
        Self::mean()
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for SimpleImputer<F>
{
    type Object = FittedSimpleImputer<F>;

    /// Learns the fill value of every feature. Fails on an empty dataset and on features without
    /// any observed value, unless the strategy is constant.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let statistics = records
            .axis_iter(Axis(1))
            .zip(dataset.feature_names())
            .map(|(column, name)| match self.strategy {
                ImputeStrategy::Constant(value) => Ok(value),
                ImputeStrategy::Mean => {
                    let observed = observed_values(column, &name)?;
                    Ok(observed.iter().copied().sum::<F>() / F::cast(observed.len()))
                }
                ImputeStrategy::Median => Ok(median(observed_values(column, &name)?)),
                ImputeStrategy::MostFrequent => {
                    Ok(most_frequent(observed_values(column, &name)?))
                }
            })
            .collect::<Result<Array1<F>>>()?;

        Ok(FittedSimpleImputer {
            statistics,
            strategy: self.strategy,
        })
    }
}

fn observed_values<F: Float>(column: ArrayView1<F>, name: &str) -> Result<Vec<F>> {
    let mut observed = column
        .iter()
        .copied()
        .filter(|x| !x.is_nan())
        .collect::<Vec<_>>();

    if observed.is_empty() {
        return Err(PreprocessingError::NoObservedValues(name.to_string()));
    }
    observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Ok(observed)
}

// expects sorted, non-empty values
fn median<F: Float>(sorted: Vec<F>) -> F {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / F::cast(2.)
    } else {
        sorted[n / 2]
    }
}

// expects sorted, non-empty values; the longest run wins and the first run is kept on ties
fn most_frequent<F: Float>(sorted: Vec<F>) -> F {
    let (mut best, mut best_count) = (sorted[0], 0);
    let mut idx = 0;
    while idx < sorted.len() {
        let run = sorted[idx..].iter().take_while(|x| **x == sorted[idx]).count();
        if run > best_count {
            best = sorted[idx];
            best_count = run;
        }
        idx += run;
    }

    best
}

/// A [`SimpleImputer`] after fitting, holds one fill value per feature
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedSimpleImputer<F> {
    statistics: Array1<F>,
    strategy: ImputeStrategy<F>,
}

impl<F: Float> FittedSimpleImputer<F> {
    /// The fill value of each feature
    pub fn statistics(&self) -> &Array1<F> {
        &self.statistics
    }

    pub fn strategy(&self) -> ImputeStrategy<F> {
        self.strategy
    }
}

impl<F: Float> Transformer<Array2<F>, Array2<F>> for FittedSimpleImputer<F> {
    /// Replaces every NaN with the fill value of its feature.
    /// Panics if the number of features differs from the one seen while fitting.
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        let mut x = x;
        Zip::from(x.columns_mut())
            .and(&self.statistics)
            .for_each(|mut column, &fill| {
                column.mapv_inplace(|value| if value.is_nan() { fill } else { value })
            });

        x
    }
}

/// Fill value rule of a [`CategoricalImputer`]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoricalStrategy {
    /// The most frequent observed category, the lexicographically smallest one on ties
    MostFrequent,
    /// A fixed category
    Constant(String),
}

/// Imputer for categorical features
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoricalImputer {
    strategy: CategoricalStrategy,
}

impl CategoricalImputer {
    pub fn new(strategy: CategoricalStrategy) -> Self {
        Self { strategy }
    }

    pub fn most_frequent() -> Self {
        Self::new(CategoricalStrategy::MostFrequent)
    }

    pub fn constant<S: Into<String>>(category: S) -> Self {
        Self::new(CategoricalStrategy::Constant(category.into()))
    }

    pub fn strategy(&self) -> &CategoricalStrategy {
        &self.strategy
    }
}

impl Default for CategoricalImputer {
    fn default() -> Self {
        Self::most_frequent()
    }
}

impl<D: Data<Elem = Option<String>>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for CategoricalImputer
{
    type Object = FittedCategoricalImputer;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let fill = records
            .axis_iter(Axis(1))
            .zip(dataset.feature_names())
            .map(|(column, name)| match &self.strategy {
                CategoricalStrategy::Constant(category) => Ok(category.clone()),
                CategoricalStrategy::MostFrequent => {
                    let mut counts = BTreeMap::new();
                    for category in column.iter().flatten() {
                        *counts.entry(category.as_str()).or_insert(0usize) += 1;
                    }

                    // iteration is sorted, so a strict comparison keeps the smallest on ties
                    let mut best: Option<(&str, usize)> = None;
                    for (category, count) in counts {
                        if best.map_or(true, |(_, best_count)| count > best_count) {
                            best = Some((category, count));
                        }
                    }

                    best.map(|(category, _)| category.to_string())
                        .ok_or(PreprocessingError::NoObservedValues(name))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FittedCategoricalImputer { fill })
    }
}

/// A [`CategoricalImputer`] after fitting, holds one fill category per feature
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FittedCategoricalImputer {
    fill: Vec<String>,
}

impl FittedCategoricalImputer {
    pub fn fill_values(&self) -> &[String] {
        &self.fill
    }
}

impl Transformer<Array2<Option<String>>, Array2<Option<String>>> for FittedCategoricalImputer {
    /// Replaces every missing category with the fill category of its feature.
    /// Panics if the number of features differs from the one seen while fitting.
    fn transform(&self, x: Array2<Option<String>>) -> Array2<Option<String>> {
        assert_eq!(
            x.ncols(),
            self.fill.len(),
            "The number of features must match the number of features seen while fitting."
        );

        let mut x = x;
        for (mut column, fill) in x.columns_mut().into_iter().zip(&self.fill) {
            for value in column.iter_mut().filter(|value| value.is_none()) {
                *value = Some(fill.clone());
            }
        }

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn categories(values: &[&[Option<&str>]]) -> Array2<Option<String>> {
        Array2::from_shape_fn((values.len(), values[0].len()), |(i, j)| {
            values[i][j].map(|x| x.to_string())
        })
    }

    #[test]
    fn imputes_mean_and_median() -> Result<()> {
        let records = array![[1., 10.], [f64::NAN, 20.], [4., f64::NAN], [7., 60.]];
        let dataset = DatasetBase::from(records.view());

        let mean = SimpleImputer::mean().fit(&dataset)?;
        assert_abs_diff_eq!(mean.statistics(), &array![4., 30.]);

        let median = SimpleImputer::median().fit(&dataset)?;
        assert_abs_diff_eq!(median.statistics(), &array![4., 20.]);

        let imputed = median.transform(records);
        assert_abs_diff_eq!(imputed, array![[1., 10.], [4., 20.], [4., 20.], [7., 60.]]);

        Ok(())
    }

    #[test]
    fn median_of_even_count_averages_the_middle() -> Result<()> {
        let records = array![[4.], [1.], [f64::NAN], [3.], [2.]];
        let imputer = SimpleImputer::median().fit(&DatasetBase::from(records))?;

        assert_abs_diff_eq!(imputer.statistics()[0], 2.5);

        Ok(())
    }

    #[test]
    fn most_frequent_picks_smallest_on_ties() -> Result<()> {
        let records = array![[3., 1.], [3., 1.], [1., 2.], [1., 2.], [2., f64::NAN]];
        let imputer = SimpleImputer::most_frequent().fit(&DatasetBase::from(records))?;

        assert_abs_diff_eq!(imputer.statistics(), &array![1., 1.]);

        Ok(())
    }

    #[test]
    fn missing_column_needs_constant_strategy() -> Result<()> {
        let records = array![[1., f64::NAN], [2., f64::NAN]];
        let dataset = DatasetBase::from(records.view()).with_feature_names(vec!["a", "b"]);

        match SimpleImputer::median().fit(&dataset) {
            Err(PreprocessingError::NoObservedValues(name)) => assert_eq!(name, "b"),
            other => panic!("expected missing values error, got {:?}", other),
        }

        let imputer = SimpleImputer::constant(-1.).fit(&dataset)?;
        assert_abs_diff_eq!(imputer.transform(records), array![[1., -1.], [2., -1.]]);

        Ok(())
    }

    #[test]
    fn empty_records_are_rejected() {
        let records = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            SimpleImputer::mean().fit(&DatasetBase::from(records)),
            Err(PreprocessingError::NotEnoughSamples)
        ));
    }

    #[test]
    #[should_panic]
    fn transform_panics_on_wrong_width() {
        let imputer = SimpleImputer::mean()
            .fit(&DatasetBase::from(array![[1., 2.]]))
            .unwrap();
        imputer.transform(array![[1., 2., 3.]]);
    }

    #[test]
    fn imputes_most_frequent_category() -> Result<()> {
        let records = categories(&[
            &[Some("R"), Some("Drama")],
            &[Some("PG"), None],
            &[Some("R"), Some("Comedy")],
            &[None, Some("Drama")],
            &[Some("PG"), Some("Comedy")],
        ]);
        let imputer = CategoricalImputer::most_frequent().fit(&DatasetBase::from(records.view()))?;

        assert_eq!(imputer.fill_values(), &["PG".to_string(), "Comedy".to_string()]);

        let imputed = imputer.transform(records);
        assert_eq!(imputed[[1, 1]], Some("Comedy".to_string()));
        assert_eq!(imputed[[3, 0]], Some("PG".to_string()));
        assert_eq!(imputed[[0, 0]], Some("R".to_string()));

        Ok(())
    }

    #[test]
    fn imputes_constant_category() -> Result<()> {
        let records = categories(&[&[None], &[None]]);
        let imputer =
            CategoricalImputer::constant("unknown").fit(&DatasetBase::from(records.view()))?;

        assert_eq!(
            imputer.transform(records),
            categories(&[&[Some("unknown")], &[Some("unknown")]])
        );

        let missing = categories(&[&[None]]);
        assert!(matches!(
            CategoricalImputer::most_frequent().fit(&DatasetBase::from(missing)),
            Err(PreprocessingError::NoObservedValues(_))
        ));

        Ok(())
    }
}
