//! # Ensemble Learning Algorithms
//!
//! Ensemble methods combine the predictions of several base estimators built with a given
//! learning algorithm in order to improve generalizability / robustness over a single estimator.
//!
//! ## Random Forest
//!
//! A random forest averages the predictions of many regression trees (see `reel-trees`), each
//! trained on a bootstrap sample of the same training set. The trees are fitted in parallel on
//! the rayon thread pool.
//!
//! ## Reference
//!
//! * [Scikit-Learn User Guide](https://scikit-learn.org/stable/modules/ensemble.html#forest)
//!
//! ## Example
//!
//! This example trains a forest of 100 trees, each on a bootstrap sample of 70% of the training
//! data, and plots its predictions on the held-out set.
//!
//! ```no_run
//! use ndarray::Array1;
//! use reel::prelude::*;
//! use reel_ensemble::{visualization::ScatterPlot, RandomForestRegressor};
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! # fn run(dataset: Dataset<f64, f64>) -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut rng = SmallRng::seed_from_u64(42);
//! let (train, test) = dataset.train_test_split(0.2, &mut rng)?;
//!
//! let forest = RandomForestRegressor::params()
//!     .n_estimators(100)
//!     .max_samples(Some(0.7))
//!     .fit(&train)?;
//!
//! let prediction: Array1<f64> = forest.predict(&test);
//! println!("R2 {:.2}", prediction.r2(&test.targets)?);
//!
//! ScatterPlot::new().draw(&test.targets, &prediction, "forest.png")?;
//! # Ok(())
//! # }
//! ```
//!
mod random_forest;
pub mod visualization;

pub use random_forest::*;
