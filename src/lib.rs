//! `reel` is a small toolkit for supervised regression on tabular data.
//!
//! It provides the pieces shared by the algorithm crates of this workspace:
//!
//! * [`DatasetBase`] pairs records with targets, the records are either dense matrices or a
//!   mixed-type [`Frame`] with numeric and categorical columns
//! * the [`Fit`](traits::Fit), [`Predict`](traits::Predict) and
//!   [`Transformer`](traits::Transformer) traits every algorithm implements
//! * [`ParamGuard`] for validated hyperparameters
//! * regression [`metrics`]
//! * [`model_selection`] with k-fold splitting and cross-validated grid search
//!
//! The algorithms themselves live in `reel-preprocessing`, `reel-trees` and `reel-ensemble`.
//!
//! ## Example
//!
//! ```ignore
//! use reel::prelude::*;
//!
//! let grid = ParamGrid::new()
//!     .add("n_estimators", vec![100usize, 200])
//!     .add("max_depth", vec![Some(10usize), None]);
//!
//! let search = GridSearchParams::new(RandomForestRegressor::params(), grid)
//!     .n_folds(5)
//!     .fit(&train)?;
//!
//! let prediction = search.predict(&test);
//! println!("R2 {:.2}", prediction.r2(&test.targets)?);
//! ```

pub mod dataset;
pub mod error;
pub mod frame;
mod metrics_regression;
pub mod model_selection;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, FrameDataset};
pub use error::Error;
pub use frame::Frame;
pub use param_guard::ParamGuard;

/// Common metrics functions for regression
pub mod metrics {
    pub use crate::metrics_regression::Regression;
}
