//! Model selection
//!
//! Tools to estimate how well a model generalizes and to pick its hyperparameters: k-fold
//! splitting, hyperparameter grids and an exhaustive, cross-validated grid search.

mod grid_search;
mod kfold;
mod param_grid;

pub use grid_search::*;
pub use kfold::KFold;
pub use param_grid::*;
