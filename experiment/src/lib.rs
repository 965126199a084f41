//! Predicting the audience rating of movies
//!
//! The experiment loads the Rotten Tomatoes movie reviews, holds out a test set and tunes a
//! random forest behind an imputing, scaling and one-hot encoding preprocessor with a
//! cross-validated grid search. The tuned model is scored on the held-out movies by its mean
//! squared error, its R² and the share of predictions within ten percent of the actual rating.
//!
//! ```no_run
//! use reel_experiment::{run, ExperimentConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dataset = reel_datasets::rotten_tomatoes::load("rotten_tomatoes_movies.csv")?;
//! let report = run(&dataset, &ExperimentConfig::default())?;
//!
//! print!("{}", report);
//! # Ok(())
//! # }
//! ```

mod config;
mod experiment;
mod report;

pub use config::ExperimentConfig;
pub use experiment::{param_grid, pipeline, preprocessor, run, MoviePipeline};
pub use report::Report;
