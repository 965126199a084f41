use reel::{
    error::{Error, Result},
    model_selection::{ParamValue, SetParams},
    Float, ParamGuard,
};
use reel_trees::{DecisionTreeParams, MaxFeatures};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::RandomForestRegressor;

/// The set of hyperparameters that can be specified for fitting a
/// [random forest](RandomForestRegressor).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestValidParams<F> {
    n_estimators: usize,
    tree_params: DecisionTreeParams<F>,
    bootstrap: bool,
    max_samples: Option<f32>,
    seed: u64,
    parallel: bool,
}

impl<F: Float> RandomForestValidParams<F> {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Hyperparameters shared by all trees, the seed of each tree is derived from the forest seed
    pub fn tree_params(&self) -> DecisionTreeParams<F> {
        self.tree_params
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn max_samples(&self) -> Option<f32> {
        self.max_samples
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Number of samples drawn for every tree out of `nsamples` training samples
    pub fn samples_per_tree(&self, nsamples: usize) -> usize {
        match self.max_samples {
            Some(fraction) if self.bootstrap => {
                ((fraction as f64 * nsamples as f64).round() as usize).max(1)
            }
            _ => nsamples,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestParams<F>(RandomForestValidParams<F>);

impl<F: Float> RandomForestParams<F> {
    pub fn new() -> Self {
        Self(RandomForestValidParams {
            n_estimators: 100,
            tree_params: DecisionTreeParams::new(),
            bootstrap: true,
            max_samples: None,
            seed: 42,
            parallel: true,
        })
    }

    /// Sets the total number of trees in the forest
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Replaces the hyperparameters of the trees
    pub fn tree_params(mut self, tree_params: DecisionTreeParams<F>) -> Self {
        self.0.tree_params = tree_params;
        self
    }

    /// Sets the optional limit to the depth of every tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.tree_params = self.0.tree_params.max_depth(max_depth);
        self
    }

    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.tree_params = self.0.tree_params.min_samples_split(min_samples_split);
        self
    }

    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.tree_params = self.0.tree_params.min_samples_leaf(min_samples_leaf);
        self
    }

    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.tree_params = self
            .0
            .tree_params
            .min_impurity_decrease(min_impurity_decrease);
        self
    }

    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.tree_params = self.0.tree_params.max_features(max_features);
        self
    }

    /// Set the bootstrap to false/true. If set to true, samples are bootstrapped
    /// when building trees. If false, the whole dataset is used to build each tree.
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    /// Sets the fraction of the training samples drawn for every tree when bootstrapping,
    /// `None` draws as many samples as there are in the training set
    pub fn max_samples(mut self, max_samples: Option<f32>) -> Self {
        self.0.max_samples = max_samples;
        self
    }

    /// Sets the seed from which the bootstrap samples and the tree seeds are derived
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    /// Fit the trees on the rayon thread pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.0.parallel = parallel;
        self
    }
}

impl<F: Float> Default for RandomForestParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> RandomForestRegressor<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `n_estimators = 100`
    /// * `bootstrap = true`
    /// * `max_samples = None`
    /// * `seed = 42`
    /// * `parallel = true`
    /// * the defaults of [`DecisionTreeParams`] for the trees
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RandomForestParams<F> {
        RandomForestParams::new()
    }
}

impl<F: Float> ParamGuard for RandomForestParams<F> {
    type Checked = RandomForestValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_estimators < 1 {
            return Err(Error::Parameters(
                "Number of estimators should be at least one, but was 0".to_string(),
            ));
        }
        if let Some(fraction) = self.0.max_samples {
            if !(fraction > 0. && fraction <= 1.) {
                return Err(Error::Parameters(format!(
                    "Fraction of samples per tree should be in (0, 1], but was {}",
                    fraction
                )));
            }
        }
        self.0.tree_params.check_ref()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float> SetParams for RandomForestParams<F> {
    fn set_param(self, name: &str, value: &ParamValue) -> Result<Self> {
        let params = match name {
            "n_estimators" => self.n_estimators(value.as_usize(name)?),
            "max_depth" | "min_samples_split" | "min_samples_leaf" | "min_impurity_decrease"
            | "max_features" => self.tree_params(self.0.tree_params.set_param(name, value)?),
            "bootstrap" => self.bootstrap(value.as_bool(name)?),
            "max_samples" => match value {
                ParamValue::None => self.max_samples(None),
                _ => self.max_samples(Some(value.as_f64(name)? as f32)),
            },
            "random_state" | "seed" => self.seed(value.as_usize(name)? as u64),
            _ => return Err(Error::UnknownParameter(name.to_string())),
        };

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel::model_selection::ParamSet;

    #[test]
    fn defaults() {
        let params = RandomForestRegressor::<f64>::params().check_unwrap();

        assert_eq!(params.n_estimators(), 100);
        assert!(params.bootstrap());
        assert_eq!(params.max_samples(), None);
        assert_eq!(params.seed(), 42);
        assert_eq!(params.tree_params().check_unwrap().max_depth(), None);
        assert_eq!(params.samples_per_tree(80), 80);
    }

    #[test]
    fn rejects_invalid_params() {
        let params = RandomForestRegressor::<f64>::params();

        assert!(params.n_estimators(0).check_ref().is_err());
        assert!(params.max_samples(Some(0.)).check_ref().is_err());
        assert!(params.max_samples(Some(1.5)).check_ref().is_err());
        assert!(params.min_samples_split(1).check_ref().is_err());
        assert!(params.max_depth(Some(0)).check_ref().is_err());
        assert!(params.max_samples(Some(1.)).check_ref().is_ok());
    }

    #[test]
    fn samples_per_tree() {
        let params = RandomForestRegressor::<f64>::params().max_samples(Some(0.25));

        assert_eq!(params.check_unwrap().samples_per_tree(10), 3);
        assert_eq!(params.check_unwrap().samples_per_tree(1), 1);
        // without bootstrapping every tree sees the whole training set
        assert_eq!(
            params.bootstrap(false).check_unwrap().samples_per_tree(10),
            10
        );
    }

    #[test]
    fn sets_params_by_name() -> Result<()> {
        let params = RandomForestRegressor::<f64>::params().set_params(
            &ParamSet::new()
                .with("n_estimators", 300usize)
                .with("max_depth", Some(20usize))
                .with("min_samples_split", 5usize)
                .with("min_samples_leaf", 4usize)
                .with("max_features", "sqrt")
                .with("bootstrap", false)
                .with("max_samples", 0.5)
                .with("random_state", 7usize),
        )?;
        let checked = params.check()?;
        let tree = checked.tree_params().check()?;

        assert_eq!(checked.n_estimators(), 300);
        assert!(!checked.bootstrap());
        assert_eq!(checked.max_samples(), Some(0.5));
        assert_eq!(checked.seed(), 7);
        assert_eq!(tree.max_depth(), Some(20));
        assert_eq!(tree.min_samples_split(), 5);
        assert_eq!(tree.min_samples_leaf(), 4);
        assert_eq!(tree.max_features(), MaxFeatures::Sqrt);

        assert!(params.set_param("criterion", &ParamValue::None).is_err());
        assert!(params
            .set_param("n_estimators", &ParamValue::Text("many".to_string()))
            .is_err());

        Ok(())
    }
}
