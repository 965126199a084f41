//! Rotten Tomatoes movie reviews
//!
//! One row per movie with its MPAA rating, genres, runtime and critic scores. The regression
//! target is the audience rating.

use std::io::Read;
use std::path::Path;

use reel::{Float, Frame, FrameDataset};
use tracing::info;

use crate::error::Result;
use crate::reader::{read_frame, read_frame_from, FrameSchema};

pub const TARGET: &str = "audience_rating";

pub const CATEGORICAL_FEATURES: [&str; 2] = ["rating", "genre"];

pub const NUMERIC_FEATURES: [&str; 3] = [
    "runtime_in_minutes",
    "tomatometer_rating",
    "tomatometer_count",
];

/// All features, in the order of the dataset records
pub const FEATURES: [&str; 5] = [
    "rating",
    "genre",
    "runtime_in_minutes",
    "tomatometer_rating",
    "tomatometer_count",
];

/// Schema reading the features and the target
pub fn schema() -> FrameSchema {
    let schema = CATEGORICAL_FEATURES
        .iter()
        .fold(FrameSchema::new(), |schema, name| schema.categorical(*name));

    NUMERIC_FEATURES
        .iter()
        .fold(schema, |schema, name| schema.numeric(*name))
        .numeric(TARGET)
}

/// Loads the movie reviews from a CSV file, which may be gzip compressed
pub fn load<F: Float, P: AsRef<Path>>(path: P) -> Result<FrameDataset<F>> {
    from_frame(read_frame(path, &schema())?)
}

/// Loads the movie reviews from CSV text
pub fn from_reader<F: Float, R: Read>(reader: R) -> Result<FrameDataset<F>> {
    from_frame(read_frame_from(reader, &schema())?)
}

/// Drops the movies without an audience rating and splits off the target
pub fn from_frame<F: Float>(frame: Frame<F>) -> Result<FrameDataset<F>> {
    let nrows = frame.nrows();
    let frame = frame.drop_missing(&[TARGET])?;
    info!(
        movies = frame.nrows(),
        dropped = nrows - frame.nrows(),
        "removed movies without audience rating"
    );

    Ok(frame.into_dataset(&FEATURES, TARGET)?)
}
