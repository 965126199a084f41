use ndarray::{Array1, ArrayBase, Data, Ix2};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use reel::{
    dataset::AsTargets,
    error::{Error, Result},
    traits::*,
    DatasetBase, Float,
};
use reel_trees::DecisionTreeRegressor;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::RandomForestValidParams;

/// A fitted random forest for regression.
///
/// ### Structure
///
/// A random forest is an ensemble of [regression trees](DecisionTreeRegressor). Every tree is
/// fitted on its own bootstrap sample of the training set, drawn uniformly with replacement, and
/// may additionally consider only a random subset of the features at each split. The forest
/// predicts the mean of the tree predictions.
///
/// ### Reproducibility
///
/// The bootstrap sample and the seed of every tree are derived from the forest seed before any
/// tree is fitted, so the fitted forest does not depend on the order in which the trees are
/// fitted and parallel fitting gives the same model as sequential fitting.
///
/// ### Example
///
/// ```rust
/// use ndarray::{array, Array1};
/// use reel::prelude::*;
/// use reel_ensemble::RandomForestRegressor;
///
/// let records = array![[1.], [2.], [3.], [10.], [11.], [12.]];
/// let targets = array![1., 1., 1., 5., 5., 5.];
/// let dataset = Dataset::new(records, targets);
///
/// let forest = RandomForestRegressor::params()
///     .n_estimators(20)
///     .bootstrap(false)
///     .fit(&dataset)
///     .unwrap();
///
/// let prediction: Array1<f64> = forest.predict(&array![[2.], [11.]]);
/// assert_eq!(prediction, array![1., 5.]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor<F> {
    trees: Vec<DecisionTreeRegressor<F>>,
    num_features: usize,
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for RandomForestRegressor<F>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        y.fill(F::zero());
        for tree in &self.trees {
            let prediction: Array1<F> = tree.predict(x);
            *y += &prediction;
        }
        *y /= F::cast(self.trees.len());
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for RandomForestValidParams<F>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = F>,
{
    type Object = RandomForestRegressor<F>;

    /// Fit a forest of `n_estimators` regression trees on the dataset consisting of a matrix of
    /// features `x` and an array of targets `y`.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let nsamples = dataset.nsamples();
        if nsamples == 0 {
            return Err(Error::NotEnoughSamples);
        }

        let view = DatasetBase::new(dataset.records().view(), dataset.targets().as_targets())
            .with_feature_names(dataset.feature_names());
        let samples_per_tree = self.samples_per_tree(nsamples);

        let mut rng = SmallRng::seed_from_u64(self.seed());
        let seeds = (0..self.n_estimators())
            .map(|_| (rng.gen::<u64>(), rng.gen::<u64>()))
            .collect::<Vec<_>>();

        info!(
            trees = self.n_estimators(),
            samples = nsamples,
            features = dataset.nfeatures(),
            samples_per_tree,
            bootstrap = self.bootstrap(),
            "fitting random forest"
        );

        let fit_tree = |(idx, &(sample_seed, tree_seed)): (usize, &(u64, u64))| {
            let tree_params = self.tree_params().seed(tree_seed);
            let tree = if self.bootstrap() {
                let mut rng = SmallRng::seed_from_u64(sample_seed);
                tree_params.fit(&view.bootstrap_sample(samples_per_tree, &mut rng))?
            } else {
                tree_params.fit(&view)?
            };

            debug!(
                tree = idx,
                depth = tree.max_depth(),
                leaves = tree.num_leaves(),
                "fitted tree"
            );
            Ok(tree)
        };

        let trees = if self.parallel() {
            seeds
                .par_iter()
                .enumerate()
                .map(fit_tree)
                .collect::<Result<Vec<_>>>()?
        } else {
            seeds
                .iter()
                .enumerate()
                .map(fit_tree)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(RandomForestRegressor {
            trees,
            num_features: dataset.nfeatures(),
        })
    }
}

impl<F: Float> RandomForestRegressor<F> {
    /// The fitted trees, in the order their seeds were drawn
    pub fn trees(&self) -> &[DecisionTreeRegressor<F>] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Return the feature importance averaged over the trees
    ///
    /// Every tree contributes its normalized impurity decrease, so the importances sum up to one
    /// unless no tree was able to split.
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![F::zero(); self.num_features];
        for tree in &self.trees {
            for (total, value) in importance.iter_mut().zip(tree.feature_importance()) {
                *total += value;
            }
        }

        let ntrees = F::cast(self.trees.len());
        importance.into_iter().map(|x| x / ntrees).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{concatenate, Array, Array2, Axis};
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use reel::metrics::Regression;
    use reel::Dataset;

    fn noisy_plane(nsamples: usize, seed: u64) -> DatasetBase<Array2<f64>, Array1<f64>> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let relevant = Array::random_using((nsamples, 2), Uniform::new(0f64, 10.), &mut rng);
        let noise = Array::random_using((nsamples, 2), Uniform::new(0f64, 10.), &mut rng);
        let targets = relevant.column(0).mapv(|x| 3. * x) + relevant.column(1).mapv(|x| x * x);
        let records = concatenate(Axis(1), &[relevant.view(), noise.view()]).unwrap();

        Dataset::new(records, targets)
    }

    #[test]
    fn forest_beats_single_tree_on_holdout() -> Result<()> {
        let (train, valid) = noisy_plane(600, 42).split_with_ratio(0.8);

        let tree = DecisionTreeRegressor::params().fit(&train)?;
        let forest = RandomForestRegressor::params().n_estimators(50).fit(&train)?;

        let tree_prediction: Array1<f64> = tree.predict(&valid);
        let forest_prediction: Array1<f64> = forest.predict(&valid);
        let tree_mse = tree_prediction.mean_squared_error(&valid.targets)?;
        let forest_mse = forest_prediction.mean_squared_error(&valid.targets)?;

        assert!(
            forest_mse < tree_mse,
            "forest {} vs tree {}",
            forest_mse,
            tree_mse
        );
        assert!(forest_prediction.r2(&valid.targets)? > 0.9);

        Ok(())
    }

    #[test]
    fn parallel_and_sequential_fits_agree() -> Result<()> {
        let dataset = noisy_plane(200, 3);
        let params = RandomForestRegressor::params()
            .n_estimators(16)
            .max_depth(Some(6))
            .seed(11);

        let parallel = params.parallel(true).fit(&dataset)?;
        let sequential = params.parallel(false).fit(&dataset)?;

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.n_trees(), 16);

        let other_seed = params.seed(12).fit(&dataset)?;
        assert_ne!(parallel, other_seed);

        Ok(())
    }

    #[test]
    fn prediction_is_mean_of_trees() -> Result<()> {
        let dataset = noisy_plane(100, 5);
        let forest = RandomForestRegressor::params()
            .n_estimators(5)
            .max_depth(Some(3))
            .fit(&dataset)?;

        let mut expected = Array1::<f64>::zeros(dataset.nsamples());
        for tree in forest.trees() {
            let prediction: Array1<f64> = tree.predict(dataset.records());
            expected += &prediction;
        }
        expected /= 5.;

        let prediction: Array1<f64> = forest.predict(&dataset);
        assert_abs_diff_eq!(prediction, expected, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn without_bootstrap_every_tree_is_identical() -> Result<()> {
        let dataset = noisy_plane(80, 9);
        let forest = RandomForestRegressor::params()
            .n_estimators(4)
            .bootstrap(false)
            .fit(&dataset)?;

        let first = &forest.trees()[0];
        for tree in forest.trees() {
            assert_eq!(tree.num_leaves(), first.num_leaves());
        }
        let prediction: Array1<f64> = forest.predict(&dataset);
        assert_abs_diff_eq!(prediction, dataset.targets, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn max_samples_limits_the_tree_size() -> Result<()> {
        let dataset = noisy_plane(200, 1);
        let forest = RandomForestRegressor::params()
            .n_estimators(3)
            .max_samples(Some(0.1))
            .fit(&dataset)?;

        for tree in forest.trees() {
            assert_eq!(tree.root_node().nsamples(), 20);
        }

        Ok(())
    }

    #[test]
    fn feature_importance_finds_relevant_features() -> Result<()> {
        let forest = RandomForestRegressor::params()
            .n_estimators(20)
            .fit(&noisy_plane(300, 21))?;
        let importance = forest.feature_importance();

        assert_eq!(importance.len(), 4);
        assert_abs_diff_eq!(importance.iter().sum::<f64>(), 1., epsilon = 1e-9);
        assert!(importance[0] + importance[1] > 0.8);

        Ok(())
    }

    #[test]
    fn rejects_empty_dataset() {
        let dataset = Dataset::new(Array2::<f64>::zeros((0, 2)), Array1::zeros(0));
        assert!(RandomForestRegressor::params().fit(&dataset).is_err());
    }
}
