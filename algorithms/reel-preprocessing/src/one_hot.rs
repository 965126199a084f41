//! One-hot encoding of categorical features

use std::collections::BTreeSet;

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};
use reel::dataset::DatasetBase;
use reel::traits::{Fit, Transformer};
use reel::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{PreprocessingError, Result};

/// What to do with a category that was not seen while fitting
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleUnknown {
    /// Fail the transformation
    Error,
    /// Encode the feature as all zeros
    Ignore,
}

impl Default for HandleUnknown {
    fn default() -> Self {
        HandleUnknown::Error
    }
}

/// One-hot encoder for categorical features
///
/// Every feature is expanded into one indicator column per category seen while fitting, with the
/// categories of a feature in sorted order. Missing values are never a category and encode to
/// all zeros.
///
/// ### Example
///
/// ```rust
/// use ndarray::{array, Array2};
/// use reel::traits::Fit;
/// use reel::DatasetBase;
/// use reel_preprocessing::one_hot::{HandleUnknown, OneHotEncoder};
///
/// let records = array![[Some("R".to_string())], [Some("PG".to_string())], [None]];
/// let dataset = DatasetBase::from(records.view()).with_feature_names(vec!["rating"]);
///
/// let encoder = OneHotEncoder::new()
///     .handle_unknown(HandleUnknown::Ignore)
///     .fit(&dataset)
///     .unwrap();
/// let encoded: Array2<f64> = encoder.encode(&records).unwrap();
///
/// assert_eq!(encoder.feature_names_out(), vec!["rating_PG", "rating_R"]);
/// assert_eq!(encoded, array![[0., 1.], [1., 0.], [0., 0.]]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the treatment of categories not seen while fitting
    pub fn handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }
}

impl<D: Data<Elem = Option<String>>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for OneHotEncoder
{
    type Object = FittedOneHotEncoder;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let categories = records
            .axis_iter(Axis(1))
            .map(|column| {
                column
                    .iter()
                    .flatten()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(FittedOneHotEncoder {
            categories,
            feature_names: dataset.feature_names(),
            handle_unknown: self.handle_unknown,
        })
    }
}

/// A [`OneHotEncoder`] after fitting, holds the sorted categories of every feature
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FittedOneHotEncoder {
    categories: Vec<Vec<String>>,
    feature_names: Vec<String>,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    /// Sorted categories of every input feature
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    pub fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Names of the output columns, `"{feature}_{category}"`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.feature_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, categories)| {
                categories
                    .iter()
                    .map(move |category| format!("{}_{}", name, category))
            })
            .collect()
    }

    /// Encodes a categorical matrix into indicator columns
    ///
    /// Fails if the number of features differs from the one seen while fitting, or on an unknown
    /// category when unknown categories are not ignored.
    pub fn encode<F: Float, D: Data<Elem = Option<String>>>(
        &self,
        x: &ArrayBase<D, Ix2>,
    ) -> Result<Array2<F>> {
        if x.ncols() != self.n_features_in() {
            return Err(PreprocessingError::MismatchedFeatures {
                expected: self.n_features_in(),
                found: x.ncols(),
            });
        }

        let mut encoded = Array2::zeros((x.nrows(), self.n_features_out()));
        let mut offset = 0;
        for ((column, categories), name) in x
            .axis_iter(Axis(1))
            .zip(&self.categories)
            .zip(&self.feature_names)
        {
            for (row, value) in column.iter().enumerate() {
                let category = match value {
                    Some(category) => category,
                    None => continue,
                };
                match categories.binary_search(category) {
                    Ok(idx) => encoded[[row, offset + idx]] = F::one(),
                    Err(_) if self.handle_unknown == HandleUnknown::Ignore => {}
                    Err(_) => {
                        return Err(PreprocessingError::UnknownCategory {
                            feature: name.clone(),
                            category: category.clone(),
                        })
                    }
                }
            }
            offset += categories.len();
        }

        Ok(encoded)
    }
}

impl<'a, F: Float, D: Data<Elem = Option<String>>>
    Transformer<&'a ArrayBase<D, Ix2>, Result<Array2<F>>> for FittedOneHotEncoder
{
    fn transform(&self, x: &'a ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        self.encode(x)
    }
}
