//! Column-wise preprocessing of frames
//!
//! A [`ColumnTransformer`] routes named columns of a [`Frame`] through branches. A numeric branch
//! imputes and scales, a categorical branch imputes and one-hot encodes. The outputs of all
//! branches are concatenated in branch order into a dense matrix, columns not named in any branch
//! are dropped.
use std::collections::HashSet;

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use reel::dataset::DatasetBase;
use reel::traits::{Fit, Transformer};
use reel::{Float, Frame};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{PreprocessingError, Result};
use crate::imputation::{
    CategoricalImputer, FittedCategoricalImputer, FittedSimpleImputer, SimpleImputer,
};
use crate::linear_scaling::{FittedLinearScaler, LinearScaler};
use crate::one_hot::{FittedOneHotEncoder, OneHotEncoder};

/// Steps of a numeric branch, applied in order: imputation, then scaling
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct NumericPipeline<F> {
    imputer: Option<SimpleImputer<F>>,
    scaler: Option<LinearScaler<F>>,
}

impl<F: Float> NumericPipeline<F> {
    /// A branch passing the columns through unchanged
    pub fn new() -> Self {
        Self {
            imputer: None,
            scaler: None,
        }
    }

    pub fn imputer(mut self, imputer: SimpleImputer<F>) -> Self {
        self.imputer = Some(imputer);
        self
    }

    pub fn scaler(mut self, scaler: LinearScaler<F>) -> Self {
        self.scaler = Some(scaler);
        self
    }

    fn fit(&self, x: Array2<F>, columns: &[String]) -> Result<FittedNumericPipeline<F>> {
        let mut x = x;

        let imputer = match &self.imputer {
            Some(imputer) => {
                let fitted = imputer
                    .fit(&DatasetBase::from(x.view()).with_feature_names(columns.to_vec()))?;
                x = fitted.transform(x);
                Some(fitted)
            }
            None => None,
        };

        let scaler = match &self.scaler {
            Some(scaler) => Some(scaler.fit(&DatasetBase::from(x.view()))?),
            None => None,
        };

        Ok(FittedNumericPipeline { imputer, scaler })
    }
}

impl<F: Float> Default for NumericPipeline<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Steps of a categorical branch, applied in order: imputation, then one-hot encoding
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoricalPipeline {
    imputer: Option<CategoricalImputer>,
    encoder: OneHotEncoder,
}

impl CategoricalPipeline {
    /// A branch one-hot encoding the columns without imputation
    pub fn new() -> Self {
        Self::default()
    }

    pub fn imputer(mut self, imputer: CategoricalImputer) -> Self {
        self.imputer = Some(imputer);
        self
    }

    pub fn encoder(mut self, encoder: OneHotEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    fn fit(
        &self,
        x: Array2<Option<String>>,
        columns: &[String],
    ) -> Result<FittedCategoricalPipeline> {
        let mut x = x;

        let imputer = match &self.imputer {
            Some(imputer) => {
                let fitted = imputer
                    .fit(&DatasetBase::from(x.view()).with_feature_names(columns.to_vec()))?;
                x = fitted.transform(x);
                Some(fitted)
            }
            None => None,
        };

        let dataset = DatasetBase::from(x.view()).with_feature_names(columns.to_vec());
        let encoder = self.encoder.fit(&dataset)?;

        Ok(FittedCategoricalPipeline { imputer, encoder })
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
enum BranchKind<F> {
    Numeric(NumericPipeline<F>),
    Categorical(CategoricalPipeline),
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct Branch<F> {
    name: String,
    columns: Vec<String>,
    kind: BranchKind<F>,
}

/// Preprocessing of frame columns through named branches
///
/// ### Example
///
/// ```rust
/// use ndarray::array;
/// use reel::prelude::*;
/// use reel_preprocessing::prelude::*;
///
/// let frame = Frame::new()
///     .with_numeric("runtime", array![90., f64::NAN, 120.]).unwrap()
///     .with_categorical("rating", vec![Some("R"), None, Some("R")]).unwrap();
///
/// let preprocessor = ColumnTransformer::new()
///     .numeric(
///         "num",
///         &["runtime"],
///         NumericPipeline::new().imputer(SimpleImputer::median()),
///     )
///     .categorical(
///         "cat",
///         &["rating"],
///         CategoricalPipeline::new().imputer(CategoricalImputer::most_frequent()),
///     );
///
/// let fitted = preprocessor.fit(&DatasetBase::from((frame.clone(), ()))).unwrap();
/// let x = fitted.transform(&frame).unwrap();
///
/// assert_eq!(fitted.feature_names_out(), vec!["runtime", "rating_R"]);
/// assert_eq!(x, array![[90., 1.], [105., 1.], [120., 1.]]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnTransformer<F> {
    branches: Vec<Branch<F>>,
}

impl<F: Float> ColumnTransformer<F> {
    /// A transformer without branches, add some before fitting
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
        }
    }

    /// Adds a numeric branch over the named columns
    pub fn numeric<N: Into<String>, S: AsRef<str>>(
        mut self,
        name: N,
        columns: &[S],
        pipeline: NumericPipeline<F>,
    ) -> Self {
        self.branches.push(Branch {
            name: name.into(),
            columns: columns.iter().map(|x| x.as_ref().to_string()).collect(),
            kind: BranchKind::Numeric(pipeline),
        });
        self
    }

    /// Adds a categorical branch over the named columns
    pub fn categorical<N: Into<String>, S: AsRef<str>>(
        mut self,
        name: N,
        columns: &[S],
        pipeline: CategoricalPipeline,
    ) -> Self {
        self.branches.push(Branch {
            name: name.into(),
            columns: columns.iter().map(|x| x.as_ref().to_string()).collect(),
            kind: BranchKind::Categorical(pipeline),
        });
        self
    }

    /// Names of the branches in output order
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|branch| branch.name.as_str())
    }

    /// Checks that there is at least one branch, that branch names are unique and that every
    /// branch selects at least one column
    pub fn validate(&self) -> Result<()> {
        if self.branches.is_empty() {
            return Err(PreprocessingError::NoBranches);
        }

        let mut names = HashSet::new();
        for branch in &self.branches {
            if !names.insert(branch.name.as_str()) {
                return Err(PreprocessingError::DuplicateBranch(branch.name.clone()));
            }
            if branch.columns.is_empty() {
                return Err(PreprocessingError::EmptyBranch(branch.name.clone()));
            }
        }

        Ok(())
    }
}

impl<F: Float> Default for ColumnTransformer<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, T> Fit<Frame<F>, T, PreprocessingError> for ColumnTransformer<F> {
    type Object = FittedColumnTransformer<F>;

    fn fit(&self, dataset: &DatasetBase<Frame<F>, T>) -> Result<Self::Object> {
        self.validate()?;

        let frame = dataset.records();
        if frame.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let branches = self
            .branches
            .iter()
            .map(|branch| {
                let kind = match &branch.kind {
                    BranchKind::Numeric(pipeline) => FittedBranchKind::Numeric(
                        pipeline.fit(frame.numeric(&branch.columns)?, &branch.columns)?,
                    ),
                    BranchKind::Categorical(pipeline) => FittedBranchKind::Categorical(
                        pipeline.fit(frame.categorical(&branch.columns)?, &branch.columns)?,
                    ),
                };

                Ok(FittedBranch {
                    name: branch.name.clone(),
                    columns: branch.columns.clone(),
                    kind,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FittedColumnTransformer { branches })
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct FittedNumericPipeline<F> {
    imputer: Option<FittedSimpleImputer<F>>,
    scaler: Option<FittedLinearScaler<F>>,
}

impl<F: Float> FittedNumericPipeline<F> {
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        let x = match &self.imputer {
            Some(imputer) => imputer.transform(x),
            None => x,
        };

        match &self.scaler {
            Some(scaler) => scaler.transform(x),
            None => x,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct FittedCategoricalPipeline {
    imputer: Option<FittedCategoricalImputer>,
    encoder: FittedOneHotEncoder,
}

impl FittedCategoricalPipeline {
    fn transform<F: Float>(&self, x: Array2<Option<String>>) -> Result<Array2<F>> {
        let x = match &self.imputer {
            Some(imputer) => imputer.transform(x),
            None => x,
        };

        self.encoder.encode(&x)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
enum FittedBranchKind<F> {
    Numeric(FittedNumericPipeline<F>),
    Categorical(FittedCategoricalPipeline),
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct FittedBranch<F> {
    name: String,
    columns: Vec<String>,
    kind: FittedBranchKind<F>,
}

impl<F: Float> FittedBranch<F> {
    fn transform(&self, frame: &Frame<F>) -> Result<Array2<F>> {
        match &self.kind {
            FittedBranchKind::Numeric(pipeline) => {
                Ok(pipeline.transform(frame.numeric(&self.columns)?))
            }
            FittedBranchKind::Categorical(pipeline) => {
                pipeline.transform(frame.categorical(&self.columns)?)
            }
        }
    }

    fn feature_names_out(&self) -> Vec<String> {
        match &self.kind {
            FittedBranchKind::Numeric(_) => self.columns.clone(),
            FittedBranchKind::Categorical(pipeline) => pipeline.encoder.feature_names_out(),
        }
    }
}

/// A [`ColumnTransformer`] after fitting
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedColumnTransformer<F> {
    branches: Vec<FittedBranch<F>>,
}

impl<F: Float> FittedColumnTransformer<F> {
    /// Names of the output columns: numeric columns keep their name, encoded columns are named
    /// `"{column}_{category}"`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.branches
            .iter()
            .flat_map(|branch| branch.feature_names_out())
            .collect()
    }

    pub fn n_features_out(&self) -> usize {
        self.feature_names_out().len()
    }

    /// Names of the frame columns read by the branches
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.branches
            .iter()
            .flat_map(|branch| branch.columns.iter().map(String::as_str))
    }

    /// Transforms the frame into a dense matrix. Fails if a column is missing or of the wrong
    /// kind, or on an unknown category in a strict encoder.
    pub fn transform(&self, frame: &Frame<F>) -> Result<Array2<F>> {
        let blocks = self
            .branches
            .iter()
            .map(|branch| branch.transform(frame))
            .collect::<Result<Vec<_>>>()?;
        let views = blocks.iter().map(|block| block.view()).collect::<Vec<ArrayView2<F>>>();

        Ok(concatenate(Axis(1), &views)?)
    }
}

impl<'a, F: Float> Transformer<&'a Frame<F>, Result<Array2<F>>> for FittedColumnTransformer<F> {
    fn transform(&self, frame: &'a Frame<F>) -> Result<Array2<F>> {
        FittedColumnTransformer::transform(self, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::one_hot::HandleUnknown;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn movies() -> Frame<f64> {
        Frame::new()
            .with_numeric("runtime", array![100., f64::NAN, 80., 120.])
            .and_then(|frame| frame.with_numeric("score", array![50., 70., f64::NAN, 90.]))
            .and_then(|frame| {
                frame.with_categorical("rating", vec![Some("R"), Some("PG"), None, Some("R")])
            })
            .and_then(|frame| {
                frame.with_categorical("studio", vec![Some("A"), Some("B"), Some("C"), None])
            })
            .unwrap()
    }

    fn preprocessor() -> ColumnTransformer<f64> {
        ColumnTransformer::new()
            .numeric(
                "num",
                &["runtime", "score"],
                NumericPipeline::new()
                    .imputer(SimpleImputer::median())
                    .scaler(LinearScaler::standard()),
            )
            .categorical(
                "cat",
                &["rating"],
                CategoricalPipeline::new()
                    .imputer(CategoricalImputer::most_frequent())
                    .encoder(OneHotEncoder::new().handle_unknown(HandleUnknown::Ignore)),
            )
    }

    #[test]
    fn concatenates_branches_and_drops_remainder() -> Result<()> {
        let frame = movies();
        let fitted = preprocessor().fit(&DatasetBase::from((frame.clone(), ())))?;
        let x = fitted.transform(&frame)?;

        assert_eq!(
            fitted.feature_names_out(),
            vec!["runtime", "score", "rating_PG", "rating_R"]
        );
        assert_eq!(x.dim(), (4, 4));
        assert_eq!(fitted.input_columns().collect::<Vec<_>>(), vec!["runtime", "score", "rating"]);

        // the imputed numeric columns are standardized
        for column in x.columns().into_iter().take(2) {
            assert_abs_diff_eq!(column.mean().unwrap(), 0., epsilon = 1e-12);
            assert_abs_diff_eq!(column.std(0.), 1., epsilon = 1e-12);
        }
        // the missing rating becomes the most frequent one
        assert_eq!(x.column(2), array![0., 1., 0., 0.]);
        assert_eq!(x.column(3), array![1., 0., 1., 1.]);

        Ok(())
    }

    #[test]
    fn ignores_unknown_categories() -> Result<()> {
        let fitted = preprocessor().fit(&DatasetBase::from((movies(), ())))?;
        let unseen = Frame::new()
            .with_numeric("runtime", array![100.])?
            .with_numeric("score", array![70.])?
            .with_categorical("rating", vec![Some("NC-17")])?;

        let x = fitted.transform(&unseen)?;
        assert_eq!(x.slice(ndarray::s![0, 2..]), array![0., 0.]);

        Ok(())
    }

    #[test]
    fn reports_schema_errors() -> Result<()> {
        let fitted = preprocessor().fit(&DatasetBase::from((movies(), ())))?;
        let missing = Frame::new().with_numeric("runtime", array![100.])?;

        assert!(matches!(
            fitted.transform(&missing),
            Err(PreprocessingError::BaseError(reel::Error::MissingColumn(_)))
        ));

        let wrong_kind =
            ColumnTransformer::new().numeric("num", &["rating"], NumericPipeline::new());
        assert!(matches!(
            wrong_kind.fit(&DatasetBase::from((movies(), ()))),
            Err(PreprocessingError::BaseError(reel::Error::ColumnKind { .. }))
        ));

        Ok(())
    }

    #[test]
    fn validates_branches() {
        let dataset = DatasetBase::from((movies(), ()));

        assert!(matches!(
            ColumnTransformer::new().fit(&dataset),
            Err(PreprocessingError::NoBranches)
        ));
        assert!(matches!(
            preprocessor()
                .numeric("num", &["score"], NumericPipeline::new())
                .fit(&dataset),
            Err(PreprocessingError::DuplicateBranch(_))
        ));
        assert!(matches!(
            preprocessor()
                .numeric::<_, &str>("empty", &[], NumericPipeline::new())
                .fit(&dataset),
            Err(PreprocessingError::EmptyBranch(_))
        ));
    }
}
