//! Error definitions
//!
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("cannot open {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("column `{0}` not found in the header")]
    MissingColumn(String),
    #[error("line {line}: cannot parse `{value}` in column `{column}` as a number")]
    ParseNumber {
        line: u64,
        column: String,
        value: String,
    },
    #[error(transparent)]
    BaseError(#[from] reel::Error),
}
