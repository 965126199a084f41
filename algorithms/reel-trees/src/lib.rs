//!
//! # Regression trees
//! `reel-trees` provides a pure Rust implementation of CART regression trees.
//!
//! # The big picture
//!
//! `reel-trees` is a crate in the `reel` workspace, a toolkit for supervised regression on
//! tabular data.
//!
//! Decision Trees (DTs) are a non-parametric supervised learning method used for regression.
//! The goal is to create a model that predicts the value of a target variable by learning simple
//! decision rules inferred from the data features. The regression tree of this crate is the base
//! learner of the random forest in `reel-ensemble`.
//!
//! # Current state
//!
//! `reel-trees` currently provides an [implementation](DecisionTreeRegressor) of single-tree
//! fitting with a squared-error criterion, random feature subsampling at every split and
//! feature importances.
//!

mod decision_trees;

pub use decision_trees::*;

pub use reel::error::Result;
