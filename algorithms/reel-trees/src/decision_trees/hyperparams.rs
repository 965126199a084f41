use reel::{
    error::{Error, Result},
    model_selection::{ParamValue, SetParams},
    Float, ParamGuard,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::DecisionTreeRegressor;

/// The number of features drawn as split candidates at every node
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
    /// Consider every feature
    All,
    /// Square root of the number of features
    Sqrt,
    /// Binary logarithm of the number of features
    Log2,
    /// A fraction in `(0, 1]` of the number of features
    Fraction(f32),
    /// A fixed number of features, capped at the number of features
    Count(usize),
}

impl MaxFeatures {
    /// Number of candidate features for a dataset with `nfeatures` features, at least one
    pub fn resolve(&self, nfeatures: usize) -> usize {
        let n = match *self {
            MaxFeatures::All => nfeatures,
            MaxFeatures::Sqrt => (nfeatures as f64).sqrt() as usize,
            MaxFeatures::Log2 => (nfeatures as f64).log2() as usize,
            MaxFeatures::Fraction(fraction) => (fraction as f64 * nfeatures as f64) as usize,
            MaxFeatures::Count(count) => count,
        };

        n.max(1).min(nfeatures.max(1))
    }

    /// Parse a hyperparameter value: `"sqrt"`, `"log2"`, `"all"` or none select a rule, a float
    /// selects a fraction and an integer a fixed count
    pub fn from_param(name: &str, value: &ParamValue) -> Result<Self> {
        match value {
            ParamValue::None => Ok(MaxFeatures::All),
            ParamValue::Int(count) => Ok(MaxFeatures::Count(*count)),
            ParamValue::Float(fraction) => Ok(MaxFeatures::Fraction(*fraction as f32)),
            ParamValue::Text(rule) => match rule.as_str() {
                "all" => Ok(MaxFeatures::All),
                "sqrt" => Ok(MaxFeatures::Sqrt),
                "log2" => Ok(MaxFeatures::Log2),
                _ => Err(value.type_error(name, "`all`, `sqrt`, `log2` or a number")),
            },
            ParamValue::Bool(_) => Err(value.type_error(name, "`all`, `sqrt`, `log2` or a number")),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        match *self {
            MaxFeatures::Fraction(fraction) if !(fraction > 0. && fraction <= 1.) => {
                Err(Error::Parameters(format!(
                    "Fraction of features should be in (0, 1], but was {}",
                    fraction
                )))
            }
            MaxFeatures::Count(0) => Err(Error::Parameters(
                "Number of features should be at least one".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [regression tree](DecisionTreeRegressor).
///
/// ### Example
///
/// ```rust
/// use reel_trees::{DecisionTreeRegressor, MaxFeatures};
/// use reel::prelude::*;
/// use ndarray::{array, Array2};
///
/// // Initialize the default set of parameters
/// let params = DecisionTreeRegressor::params();
/// // Set the parameters to the desired values
/// let params = params.max_depth(Some(3)).min_samples_leaf(1).max_features(MaxFeatures::All);
///
/// let records = array![[1.], [2.], [3.], [10.], [11.], [12.]];
/// let targets = array![1., 1., 1., 5., 5., 5.];
/// let tree = params.fit(&Dataset::new(records, targets)).unwrap();
///
/// let prediction = tree.predict(&array![[2.5], [10.5]]);
/// assert_eq!(prediction, array![1., 5.]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F> {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    min_impurity_decrease: F,
    max_features: MaxFeatures,
    seed: u64,
}

impl<F: Float> DecisionTreeValidParams<F> {
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeParams<F>(DecisionTreeValidParams<F>);

impl<F: Float> DecisionTreeParams<F> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_impurity_decrease: F::zero(),
            max_features: MaxFeatures::All,
            seed: 0,
        })
    }

    /// Sets the optional limit to the depth of the decision tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples that a split has to place in each leaf
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the minimum weighted decrease in impurity that a split needs to bring in order for
    /// it to be applied
    ///
    /// The decrease of a node with `n_t` of the `n` training samples is
    /// `n_t / n * (impurity - weighted child impurity)`.
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Sets the number of features drawn as split candidates at every node
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Sets the seed of the generator drawing the candidate features
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> Default for DecisionTreeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> DecisionTreeRegressor<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `min_impurity_decrease = 0.0`
    /// * `max_features = MaxFeatures::All`
    /// * `seed = 0`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F> {
        DecisionTreeParams::new()
    }
}

impl<F: Float> ParamGuard for DecisionTreeParams<F> {
    type Checked = DecisionTreeValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min_samples_split < 2 {
            Err(Error::Parameters(format!(
                "Minimum samples to split should be at least two, but was {}",
                self.0.min_samples_split
            )))
        } else if self.0.min_samples_leaf < 1 {
            Err(Error::Parameters(
                "Minimum samples per leaf should be at least one, but was 0".to_string(),
            ))
        } else if self.0.max_depth == Some(0) {
            Err(Error::Parameters(
                "Maximum depth should be at least one".to_string(),
            ))
        } else if !(self.0.min_impurity_decrease >= F::zero()) {
            Err(Error::Parameters(format!(
                "Minimum impurity decrease should be non-negative, but was {}",
                self.0.min_impurity_decrease
            )))
        } else {
            self.0.max_features.check()?;
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float> SetParams for DecisionTreeParams<F> {
    fn set_param(self, name: &str, value: &ParamValue) -> Result<Self> {
        let params = match name {
            "max_depth" => self.max_depth(value.as_optional_usize(name)?),
            "min_samples_split" => self.min_samples_split(value.as_usize(name)?),
            "min_samples_leaf" => self.min_samples_leaf(value.as_usize(name)?),
            "min_impurity_decrease" => self.min_impurity_decrease(F::cast(value.as_f64(name)?)),
            "max_features" => self.max_features(MaxFeatures::from_param(name, value)?),
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
    fn resolves_max_features() {
        assert_eq!(MaxFeatures::All.resolve(10), 10);
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Log2.resolve(10), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(10), 5);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(10), 1);
        assert_eq!(MaxFeatures::Count(20).resolve(10), 10);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
    }

    #[test]
    fn rejects_invalid_params() {
        let params = DecisionTreeRegressor::<f64>::params();

        assert!(params.min_samples_split(1).check_ref().is_err());
        assert!(params.min_samples_leaf(0).check_ref().is_err());
        assert!(params.max_depth(Some(0)).check_ref().is_err());
        assert!(params.min_impurity_decrease(-1.0).check_ref().is_err());
        assert!(params.min_impurity_decrease(f64::NAN).check_ref().is_err());
        assert!(params
            .max_features(MaxFeatures::Fraction(0.0))
            .check_ref()
            .is_err());
        assert!(params.max_features(MaxFeatures::Count(0)).check_ref().is_err());
        assert!(params.check_ref().is_ok());
    }

    #[test]
    fn sets_params_by_name() -> Result<()> {
        let params = DecisionTreeRegressor::<f64>::params().set_params(
            &ParamSet::new()
                .with("max_depth", Some(7usize))
                .with("min_samples_split", 5usize)
                .with("min_samples_leaf", 2usize)
                .with("max_features", "sqrt")
                .with("random_state", 3usize),
        )?;
        let checked = params.check()?;

        assert_eq!(checked.max_depth(), Some(7));
        assert_eq!(checked.min_samples_split(), 5);
        assert_eq!(checked.min_samples_leaf(), 2);
        assert_eq!(checked.max_features(), MaxFeatures::Sqrt);
        assert_eq!(checked.seed(), 3);

        let unbounded = params.set_param("max_depth", &ParamValue::None)?;
        assert_eq!(unbounded.check()?.max_depth(), None);

        assert!(params.set_param("criterion", &ParamValue::None).is_err());
        assert!(params
            .set_param("max_features", &ParamValue::Text("half".to_string()))
            .is_err());

        Ok(())
    }
}
