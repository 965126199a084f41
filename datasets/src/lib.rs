//! `reel-datasets` reads tabular data into [`reel::Frame`]s and provides the movie-review data
//! used by the audience-rating experiment.
//!
//! ## Current State
//!
//! * [`reader`]: CSV files, optionally gzip compressed, read into frames through a
//!   [`FrameSchema`] naming the numeric and categorical columns
//! * [`rotten_tomatoes`]: the Rotten Tomatoes movie reviews, with the audience rating as target
//! * [`generate`]: synthetic movie reviews with missing values, for tests and demos
//!
//! ## Loading the movie reviews
//!
//! ```no_run
//! let dataset = reel_datasets::rotten_tomatoes::load::<f64, _>("rotten_tomatoes_movies.csv")
//!     .unwrap();
//!
//! println!("{} movies with an audience rating", dataset.nsamples());
//! ```

pub mod error;
pub mod generate;
pub mod reader;
pub mod rotten_tomatoes;

pub use error::{DatasetError, Result};
pub use reader::{read_frame, read_frame_from, FrameSchema};
