//! Error types in reel
//!

use thiserror::Error;

use ndarray::ShapeError;

use crate::frame::ColumnKind;
use crate::model_selection::ParamValue;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("expected {expected} values, got {found}")]
    MismatchedShapes { expected: usize, found: usize },
    #[error("column `{0}` not found")]
    MissingColumn(String),
    #[error("column `{0}` already exists")]
    DuplicateColumn(String),
    #[error("column `{name}` has {found} rows, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("column `{name}` is {found}, expected {expected}")]
    ColumnKind {
        name: String,
        expected: ColumnKind,
        found: ColumnKind,
    },
    #[error("target column `{0}` contains missing values")]
    MissingTargets(String),
    #[error("cannot split {nsamples} samples into {folds} folds")]
    InvalidFolds { folds: usize, nsamples: usize },
    #[error("unknown hyperparameter `{0}`")]
    UnknownParameter(String),
    #[error("hyperparameter `{name}` expects {expected}, got {value}")]
    ParameterType {
        name: String,
        expected: &'static str,
        value: ParamValue,
    },
}
