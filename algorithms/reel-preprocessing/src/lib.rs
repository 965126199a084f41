//! # Preprocessing
//! `reel-preprocessing` turns raw tabular records into the dense matrices the regressors of
//! the reel toolkit are fitted on.
//!
//! ## Current state
//!
//! * Imputation of numeric (NaN) and categorical (`None`) missing values
//! * Standard and min-max scaling
//! * One-hot encoding with optional tolerance for unknown categories
//! * A column transformer routing the columns of a [`Frame`](reel::Frame) through numeric and
//!   categorical branches
//! * A pipeline combining a column transformer with any regressor, tunable with a grid search
//!   through `model__` prefixed hyperparameters

pub mod column_transformer;
pub mod error;
pub mod imputation;
pub mod linear_scaling;
pub mod one_hot;
pub mod pipeline;

pub use error::{PreprocessingError, Result};

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::column_transformer::{
        CategoricalPipeline, ColumnTransformer, FittedColumnTransformer, NumericPipeline,
    };
    #[doc(no_inline)]
    pub use crate::error::PreprocessingError;
    #[doc(no_inline)]
    pub use crate::imputation::{
        CategoricalImputer, CategoricalStrategy, ImputeStrategy, SimpleImputer,
    };
    #[doc(no_inline)]
    pub use crate::linear_scaling::{LinearScaler, ScalingMethod};
    #[doc(no_inline)]
    pub use crate::one_hot::{HandleUnknown, OneHotEncoder};
    #[doc(no_inline)]
    pub use crate::pipeline::{FittedPipeline, PipelineParams, PipelineValidParams};
}
