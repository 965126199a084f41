//! Preprocessing and regression in one estimator
use ndarray::{Array1, Array2};
use reel::dataset::DatasetBase;
use reel::model_selection::{ParamValue, SetParams};
use reel::traits::{Fit, Predict, PredictInplace};
use reel::{Float, Frame, ParamGuard};
use tracing::debug;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::column_transformer::{ColumnTransformer, FittedColumnTransformer};
use crate::error::{PreprocessingError, Result};

/// Prefix routing a hyperparameter name to the model of a pipeline
pub const MODEL_PREFIX: &str = "model__";

/// Checked hyperparameters of a [pipeline](PipelineParams)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineValidParams<F, M> {
    preprocessor: ColumnTransformer<F>,
    model: M,
}

impl<F: Float, M> PipelineValidParams<F, M> {
    pub fn preprocessor(&self) -> &ColumnTransformer<F> {
        &self.preprocessor
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

/// A column transformer followed by a regressor
///
/// The pipeline fits on a [`Frame`] dataset: the preprocessor is fitted first, the transformed
/// records are then used to fit the model. Hyperparameters of the model are addressed with the
/// `model__` prefix, so a pipeline can be tuned with a grid search like any other estimator.
///
/// ### Example
///
/// ```ignore
/// let pipeline = PipelineParams::new(preprocessor, RandomForestRegressor::params());
/// let grid = ParamGrid::new().add("model__max_depth", vec![Some(10usize), Some(20)]);
///
/// let search: Result<GridSearch<_>> = GridSearchParams::new(pipeline, grid).fit(&train);
/// let prediction = search?.predict(&test);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineParams<F, M>(PipelineValidParams<F, M>);

impl<F: Float, M> PipelineParams<F, M> {
    pub fn new(preprocessor: ColumnTransformer<F>, model: M) -> Self {
        Self(PipelineValidParams {
            preprocessor,
            model,
        })
    }

    /// Replaces the preprocessor
    pub fn preprocessor(mut self, preprocessor: ColumnTransformer<F>) -> Self {
        self.0.preprocessor = preprocessor;
        self
    }

    /// Replaces the model hyperparameters
    pub fn model(mut self, model: M) -> Self {
        self.0.model = model;
        self
    }
}

impl<F: Float, M> ParamGuard for PipelineParams<F, M> {
    type Checked = PipelineValidParams<F, M>;
    type Error = PreprocessingError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.preprocessor.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, M: SetParams> SetParams for PipelineParams<F, M> {
    fn set_param(self, name: &str, value: &ParamValue) -> reel::error::Result<Self> {
        match name.strip_prefix(MODEL_PREFIX) {
            Some(param) => {
                let PipelineValidParams {
                    preprocessor,
                    model,
                } = self.0;
                let model = model.set_param(param, value)?;

                Ok(Self::new(preprocessor, model))
            }
            None => Err(reel::Error::UnknownParameter(name.to_string())),
        }
    }
}

impl<F, M> Fit<Frame<F>, Array1<F>, PreprocessingError> for PipelineValidParams<F, M>
where
    F: Float,
    M: Fit<Array2<F>, Array1<F>, reel::Error>,
{
    type Object = FittedPipeline<F, M::Object>;

    fn fit(&self, dataset: &DatasetBase<Frame<F>, Array1<F>>) -> Result<Self::Object> {
        let preprocessor = self.preprocessor.fit(dataset)?;
        let records = preprocessor.transform(dataset.records())?;
        debug!(
            samples = records.nrows(),
            features = records.ncols(),
            "preprocessed training records"
        );

        let features = DatasetBase::new(records, dataset.targets().clone())
            .with_feature_names(preprocessor.feature_names_out());
        let model = self.model.fit(&features)?;

        Ok(FittedPipeline {
            preprocessor,
            model,
        })
    }
}

/// A fitted preprocessor and the model fitted on its output
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedPipeline<F, M> {
    preprocessor: FittedColumnTransformer<F>,
    model: M,
}

impl<F: Float, M> FittedPipeline<F, M> {
    pub fn preprocessor(&self) -> &FittedColumnTransformer<F> {
        &self.preprocessor
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predicts the targets of a frame, reporting schema problems as errors
    pub fn try_predict(&self, frame: &Frame<F>) -> Result<Array1<F>>
    where
        M: PredictInplace<Array2<F>, Array1<F>>,
    {
        let records = self.preprocessor.transform(frame)?;

        Ok(self.model.predict(&records))
    }
}

impl<F: Float, M: PredictInplace<Array2<F>, Array1<F>>> PredictInplace<Frame<F>, Array1<F>>
    for FittedPipeline<F, M>
{
    /// Predicts the targets of a frame.
    /// Panics if the frame lacks a column the preprocessor reads, or holds it with another kind.
    /// Use [`FittedPipeline::try_predict`] to handle these cases.
    fn predict_inplace(&self, x: &Frame<F>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let records = match self.preprocessor.transform(x) {
            Ok(records) => records,
            Err(err) => panic!("cannot preprocess records: {}", err),
        };
        self.model.predict_inplace(&records, y);
    }

    fn default_target(&self, x: &Frame<F>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
