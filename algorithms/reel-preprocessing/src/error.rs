//! Error definitions for preprocessing
use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug, Clone)]
pub enum PreprocessingError {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("feature `{0}` has no observed values to impute from")]
    NoObservedValues(String),
    #[error("minimum value for MinMax scaler cannot be greater than the maximum")]
    FlippedMinMaxRange,
    #[error("unknown category `{category}` in feature `{feature}`")]
    UnknownCategory { feature: String, category: String },
    #[error("expected {expected} input features, got {found}")]
    MismatchedFeatures { expected: usize, found: usize },
    #[error("column transformer needs at least one branch")]
    NoBranches,
    #[error("branch `{0}` is defined more than once")]
    DuplicateBranch(String),
    #[error("branch `{0}` selects no columns")]
    EmptyBranch(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    BaseError(#[from] reel::Error),
}
