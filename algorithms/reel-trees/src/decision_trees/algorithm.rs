use std::cmp::Ordering;
use std::collections::HashSet;

use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix1, Ix2};
use rand::{rngs::SmallRng, seq::index::sample, SeedableRng};

use super::NodeIter;
use crate::DecisionTreeValidParams;
use reel::{
    dataset::{AsTargets, Records},
    error::{Error, Result},
    traits::*,
    DatasetBase, Float,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Running sums of the (centered) targets on one side of a candidate split
#[derive(Clone, Copy, Debug)]
struct SplitSide<F> {
    count: usize,
    sum: F,
    sum_sq: F,
}

impl<F: Float> SplitSide<F> {
    fn empty() -> Self {
        SplitSide {
            count: 0,
            sum: F::zero(),
            sum_sq: F::zero(),
        }
    }

    fn push(&mut self, value: F) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    fn without(&self, other: &SplitSide<F>) -> SplitSide<F> {
        SplitSide {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    /// Sum of squared deviations from the mean of this side
    fn squared_error(&self) -> F {
        if self.count == 0 {
            return F::zero();
        }

        let error = self.sum_sq - self.sum * self.sum / F::cast(self.count);
        error.max(F::zero())
    }
}

/// The best split found while scanning the candidate features of a node
struct Split<F> {
    feature_idx: usize,
    threshold: F,
    /// Mean squared error of both children, weighted by their number of samples
    child_impurity: F,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
/// A node in the regression tree
pub struct TreeNode<F> {
    feature_idx: usize,
    feature_name: String,
    split_value: F,
    impurity_decrease: F,
    impurity: F,
    left_child: Option<Box<TreeNode<F>>>,
    right_child: Option<Box<TreeNode<F>>>,
    leaf_node: bool,
    prediction: F,
    nsamples: usize,
    depth: usize,
}

impl<F: Float> TreeNode<F> {
    fn leaf(prediction: F, impurity: F, nsamples: usize, depth: usize) -> Self {
        TreeNode {
            feature_idx: 0,
            feature_name: "".to_string(),
            split_value: F::zero(),
            impurity_decrease: F::zero(),
            impurity,
            left_child: None,
            right_child: None,
            leaf_node: true,
            prediction,
            nsamples,
            depth,
        }
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.leaf_node
    }

    /// Returns the depth of the node in the decision tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `Some(prediction)` for leaf nodes and `None` for internal nodes.
    pub fn prediction(&self) -> Option<F> {
        if self.is_leaf() {
            Some(self.prediction)
        } else {
            None
        }
    }

    /// Mean of the training targets which reached this node
    pub fn mean(&self) -> F {
        self.prediction
    }

    /// Number of training samples which reached this node
    pub fn nsamples(&self) -> usize {
        self.nsamples
    }

    /// Mean squared error of the training targets around their mean
    pub fn impurity(&self) -> F {
        self.impurity
    }

    /// Returns both children, first left then right
    pub fn children(&self) -> Vec<&Option<Box<TreeNode<F>>>> {
        vec![&self.left_child, &self.right_child]
    }

    /// Return the split (feature index, value) and its weighted impurity decrease
    pub fn split(&self) -> (usize, F, F) {
        (self.feature_idx, self.split_value, self.impurity_decrease)
    }

    /// Returns the name of the feature used in the split if the node is internal,
    /// `None` otherwise
    pub fn feature_name(&self) -> Option<&String> {
        if self.leaf_node {
            None
        } else {
            Some(&self.feature_name)
        }
    }

    /// Recursively fits the node on the samples at `indices`
    #[allow(clippy::too_many_arguments)]
    fn fit<D: Data<Elem = F>>(
        records: &ArrayBase<D, Ix2>,
        targets: &ArrayView1<F>,
        indices: Vec<usize>,
        hyperparameters: &DecisionTreeValidParams<F>,
        feature_names: &[String],
        total_samples: usize,
        depth: usize,
        rng: &mut SmallRng,
    ) -> Self {
        let nsamples = indices.len();
        let mean = indices.iter().map(|&idx| targets[idx]).sum::<F>() / F::cast(nsamples);
        let impurity = indices
            .iter()
            .map(|&idx| (targets[idx] - mean) * (targets[idx] - mean))
            .sum::<F>()
            / F::cast(nsamples);

        // return a leaf when we don't have enough samples, the maximal depth is reached or
        // the node is already pure
        if nsamples < hyperparameters.min_samples_split()
            || nsamples < 2 * hyperparameters.min_samples_leaf()
            || hyperparameters
                .max_depth()
                .map(|max_depth| depth >= max_depth)
                .unwrap_or(false)
            || impurity <= F::epsilon()
        {
            return Self::leaf(mean, impurity, nsamples, depth);
        }

        let nfeatures = records.ncols();
        let ncandidates = hyperparameters.max_features().resolve(nfeatures);
        let candidates = if ncandidates < nfeatures {
            sample(rng, nfeatures, ncandidates).into_vec()
        } else {
            (0..nfeatures).collect()
        };

        let best = candidates
            .into_iter()
            .filter_map(|feature_idx| {
                best_split_for_feature(
                    records,
                    targets,
                    &indices,
                    feature_idx,
                    mean,
                    hyperparameters,
                )
            })
            .fold(None, |best: Option<Split<F>>, split| match best {
                Some(best) if best.child_impurity <= split.child_impurity => Some(best),
                _ => Some(split),
            });

        let split = match best {
            Some(split) => split,
            None => return Self::leaf(mean, impurity, nsamples, depth),
        };

        let impurity_decrease =
            F::cast(nsamples) / F::cast(total_samples) * (impurity - split.child_impurity);
        if impurity_decrease + F::epsilon() < hyperparameters.min_impurity_decrease() {
            return Self::leaf(mean, impurity, nsamples, depth);
        }

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&idx| records[[idx, split.feature_idx]] <= split.threshold);

        let left_child = Self::fit(
            records,
            targets,
            left,
            hyperparameters,
            feature_names,
            total_samples,
            depth + 1,
            rng,
        );
        let right_child = Self::fit(
            records,
            targets,
            right,
            hyperparameters,
            feature_names,
            total_samples,
            depth + 1,
            rng,
        );

        TreeNode {
            feature_idx: split.feature_idx,
            feature_name: feature_names[split.feature_idx].clone(),
            split_value: split.threshold,
            impurity_decrease: impurity_decrease.max(F::zero()),
            impurity,
            left_child: Some(Box::new(left_child)),
            right_child: Some(Box::new(right_child)),
            leaf_node: false,
            prediction: mean,
            nsamples,
            depth,
        }
    }
}

/// Scan the sorted values of a single feature and return its best threshold
///
/// Observations are moved one by one from the right side to the left side in ascending order of
/// the feature. A threshold is only placed between two distinct values, halfway between them,
/// and only where both sides hold at least `min_samples_leaf` samples.
fn best_split_for_feature<F: Float, D: Data<Elem = F>>(
    records: &ArrayBase<D, Ix2>,
    targets: &ArrayView1<F>,
    indices: &[usize],
    feature_idx: usize,
    mean: F,
    hyperparameters: &DecisionTreeValidParams<F>,
) -> Option<Split<F>> {
    let nsamples = indices.len();
    let min_samples_leaf = hyperparameters.min_samples_leaf();
    let min_gap = F::cast(1e-7);

    // (feature value, centered target)
    let mut sorted = indices
        .iter()
        .map(|&idx| (records[[idx, feature_idx]], targets[idx] - mean))
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut total = SplitSide::empty();
    sorted.iter().for_each(|(_, target)| total.push(*target));

    let mut left = SplitSide::empty();
    let mut best: Option<Split<F>> = None;

    for i in 0..nsamples - 1 {
        let (value, target) = sorted[i];
        let next_value = sorted[i + 1].0;
        left.push(target);

        if next_value <= value + min_gap {
            continue;
        }
        if left.count < min_samples_leaf || nsamples - left.count < min_samples_leaf {
            continue;
        }

        let right = total.without(&left);
        let child_impurity = (left.squared_error() + right.squared_error()) / F::cast(nsamples);

        if best
            .as_ref()
            .map(|best| child_impurity < best.child_impurity)
            .unwrap_or(true)
        {
            let mut threshold = (value + next_value) / F::cast(2.0);
            if threshold >= next_value || !threshold.is_finite() {
                threshold = value;
            }

            best = Some(Split {
                feature_idx,
                threshold,
                child_impurity,
            });
        }
    }

    best
}

/// A fitted CART regression tree
///
/// Every internal node compares a single feature against a threshold, samples with a value less
/// or equal to the threshold descend to the left child. Leaves predict the mean of the training
/// targets which reached them. Splits are chosen to minimize the squared error of the children.
///
/// ### Example
///
/// ```rust
/// use reel_trees::DecisionTreeRegressor;
/// use reel::prelude::*;
/// use ndarray::{array, Array1};
///
/// let records = array![[0., 1.], [1., 1.], [2., 0.], [3., 0.]];
/// let targets = array![10., 10., 20., 20.];
/// let dataset = Dataset::new(records, targets).with_feature_names(vec!["age", "flag"]);
///
/// let tree = DecisionTreeRegressor::params().fit(&dataset).unwrap();
/// let prediction: Array1<f64> = tree.predict(&dataset);
///
/// assert_eq!(prediction, dataset.targets);
/// assert_eq!(tree.num_leaves(), 2);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeRegressor<F> {
    root_node: TreeNode<F>,
    num_features: usize,
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for DecisionTreeRegressor<F>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.num_features,
            "The number of features must match the number of features seen during fitting."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = make_prediction(&row, &self.root_node);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for DecisionTreeValidParams<F>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = F>,
{
    type Object = DecisionTreeRegressor<F>;

    /// Fit a regression tree using `hyperparamters` on the dataset consisting of
    /// a matrix of features `x` and an array of targets `y`.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets().as_targets();

        if x.nsamples() == 0 {
            return Err(Error::NotEnoughSamples);
        }
        if y.len() != x.nsamples() {
            return Err(Error::MismatchedShapes {
                expected: x.nsamples(),
                found: y.len(),
            });
        }
        if y.iter().any(|target| target.is_nan()) {
            return Err(Error::MissingTargets("target".to_string()));
        }

        let feature_names = dataset.feature_names();
        let mut rng = SmallRng::seed_from_u64(self.seed());

        let root_node = TreeNode::fit(
            x,
            &y,
            (0..x.nsamples()).collect(),
            self,
            &feature_names,
            x.nsamples(),
            0,
            &mut rng,
        );

        Ok(DecisionTreeRegressor {
            root_node,
            num_features: x.nfeatures(),
        })
    }
}

impl<F: Float> DecisionTreeRegressor<F> {
    /// Iterate over the nodes in breadth-first order
    pub fn iter_nodes(&self) -> NodeIter<'_, F> {
        NodeIter::new(&self.root_node)
    }

    /// Return the sorted indices of the features used by a split
    pub fn features(&self) -> Vec<usize> {
        let fitted_features = self
            .iter_nodes()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature_idx)
            .collect::<HashSet<_>>();

        let mut features = fitted_features.into_iter().collect::<Vec<_>>();
        features.sort_unstable();
        features
    }

    /// Return the total weighted impurity decrease for each feature
    pub fn total_impurity_decrease(&self) -> Vec<F> {
        let mut impurity_decrease = vec![F::zero(); self.num_features];

        for node in self.iter_nodes().filter(|node| !node.leaf_node) {
            impurity_decrease[node.feature_idx] += node.impurity_decrease;
        }

        impurity_decrease
    }

    /// Return the feature importance, i.e. the total impurity decrease normalized to sum up to
    /// one, for each feature
    ///
    /// A tree without splits has an importance of zero for every feature.
    pub fn feature_importance(&self) -> Vec<F> {
        let total_impurity_decrease = self.total_impurity_decrease();
        let sum = total_impurity_decrease.iter().cloned().sum::<F>();

        if sum <= F::zero() {
            return vec![F::zero(); self.num_features];
        }

        total_impurity_decrease
            .into_iter()
            .map(|x| x / sum)
            .collect()
    }

    /// Return root node of the tree
    pub fn root_node(&self) -> &TreeNode<F> {
        &self.root_node
    }

    /// Return max depth of the tree
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth))
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }

    /// Return the number of features the tree was fitted on
    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

/// Descend from `node` to the leaf responsible for the sample `x`
fn make_prediction<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix1>, node: &TreeNode<F>) -> F {
    let mut node = node;

    loop {
        let next = if x[node.feature_idx] <= node.split_value {
            &node.left_child
        } else {
            &node.right_child
        };

        match next {
            Some(child) if !node.leaf_node => node = child,
            _ => return node.prediction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaxFeatures;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, s, Array, Array2, Axis};
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use reel::Dataset;

    #[test]
    fn split_side_tracks_squared_error() {
        let mut side = SplitSide::empty();
        for value in &[1.0, 2.0, 3.0, 4.0] {
            side.push(*value);
        }
        assert_abs_diff_eq!(side.squared_error(), 5.0);

        let mut left = SplitSide::empty();
        left.push(1.0);
        left.push(2.0);
        assert_abs_diff_eq!(side.without(&left).squared_error(), 0.5);
    }

    #[test]
    fn step_function_single_split() -> Result<()> {
        let records = Array::linspace(0., 9., 10).insert_axis(Axis(1));
        let targets = records.column(0).mapv(|x| if x < 5. { 0. } else { 10. });
        let dataset = Dataset::new(records, targets);

        let model = DecisionTreeRegressor::params().fit(&dataset)?;

        assert_eq!(model.num_leaves(), 2);
        assert_eq!(model.max_depth(), 1);
        let (feature_idx, threshold, decrease) = model.root_node().split();
        assert_eq!(feature_idx, 0);
        assert_abs_diff_eq!(threshold, 4.5);
        assert_abs_diff_eq!(decrease, 25.0);
        assert_eq!(model.root_node().feature_name(), Some(&"feature-0".to_string()));

        let prediction = model.predict(&array![[-3.], [4.5], [4.6], [100.]]);
        assert_abs_diff_eq!(prediction, array![0., 0., 10., 10.]);

        Ok(())
    }

    #[test]
    fn fits_training_data_exactly_without_limits() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array::random_using((100, 3), Uniform::new(-1., 1.), &mut rng);
        let targets = records.map_axis(Axis(1), |row| row[0] * 3. - row[1] + row[2] * row[2]);
        let dataset = Dataset::new(records, targets);

        let model = DecisionTreeRegressor::params().fit(&dataset)?;
        let prediction = model.predict(&dataset);

        assert_abs_diff_eq!(prediction, dataset.targets, epsilon = 1e-10);
        assert_eq!(model.num_leaves(), 100);

        Ok(())
    }

    #[test]
    fn check_max_depth_and_leaf_size() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array::random_using((200, 2), Uniform::new(0., 1.), &mut rng);
        let targets = Array::random_using(200, Uniform::new(0., 1.), &mut rng);
        let dataset = Dataset::new(records, targets);

        for max_depth in 1..6 {
            let model = DecisionTreeRegressor::params()
                .max_depth(Some(max_depth))
                .fit(&dataset)?;
            assert!(model.max_depth() <= max_depth);
        }

        let model = DecisionTreeRegressor::params()
            .min_samples_leaf(7)
            .fit(&dataset)?;
        assert!(model
            .iter_nodes()
            .filter(|node| node.is_leaf())
            .all(|node| node.nsamples() >= 7));

        let model = DecisionTreeRegressor::params()
            .min_samples_split(50)
            .fit(&dataset)?;
        assert!(model
            .iter_nodes()
            .filter(|node| !node.is_leaf())
            .all(|node| node.nsamples() >= 50));

        Ok(())
    }

    #[test]
    fn min_impurity_decrease_prunes_weak_splits() -> Result<()> {
        let records = Array::linspace(0., 9., 10).insert_axis(Axis(1));
        let targets = array![0., 0., 0., 0., 0., 10., 10., 10., 10., 11.];
        let dataset = Dataset::new(records, targets);

        let full = DecisionTreeRegressor::params().fit(&dataset)?;
        assert_eq!(full.num_leaves(), 3);

        let pruned = DecisionTreeRegressor::params()
            .min_impurity_decrease(1.0)
            .fit(&dataset)?;
        assert_eq!(pruned.num_leaves(), 2);

        Ok(())
    }

    #[test]
    fn constant_targets_give_single_leaf() -> Result<()> {
        let dataset = Dataset::new(Array2::from_elem((5, 2), 1.), Array1::from_elem(5, 3.));
        let model = DecisionTreeRegressor::params().fit(&dataset)?;

        assert_eq!(model.num_leaves(), 1);
        assert_eq!(model.root_node().prediction(), Some(3.));
        assert_eq!(model.feature_importance(), vec![0., 0.]);

        Ok(())
    }

    #[test]
    fn feature_importance_finds_relevant_feature() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array::random_using((300, 3), Uniform::new(0., 1.), &mut rng);
        let targets = records.column(1).mapv(|x| x * 10.);
        let dataset = Dataset::new(records, targets);

        let model = DecisionTreeRegressor::params()
            .max_depth(Some(4))
            .fit(&dataset)?;
        let importance = model.feature_importance();

        assert_abs_diff_eq!(importance.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        assert!(importance[1] > 0.99);
        assert_eq!(model.features(), vec![1]);

        Ok(())
    }

    #[test]
    fn feature_subsampling_is_seeded() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array::random_using((150, 6), Uniform::new(0., 1.), &mut rng);
        let targets = records.sum_axis(Axis(1));
        let dataset = Dataset::new(records, targets);
        let params = DecisionTreeRegressor::params()
            .max_features(MaxFeatures::Sqrt)
            .max_depth(Some(6));

        let first = params.seed(7).fit(&dataset)?;
        let second = params.seed(7).fit(&dataset)?;
        assert_eq!(first, second);

        let test = dataset.records.slice(s![..10, ..]).to_owned();
        let (a, b): (Array1<f64>, Array1<f64>) = (first.predict(&test), second.predict(&test));
        assert_abs_diff_eq!(a, b);

        Ok(())
    }

    #[test]
    fn rejects_empty_and_incomplete_targets() {
        let empty = Dataset::new(Array2::<f64>::zeros((0, 2)), Array1::<f64>::zeros(0));
        assert!(DecisionTreeRegressor::params().fit(&empty).is_err());

        let missing = Dataset::new(Array2::zeros((2, 1)), array![1., f64::NAN]);
        assert!(matches!(
            DecisionTreeRegressor::params().fit(&missing),
            Err(Error::MissingTargets(_))
        ));
    }

    #[test]
    #[should_panic]
    fn panics_on_feature_mismatch() {
        let dataset = Dataset::new(array![[0., 1.], [1., 0.]], array![0., 1.]);
        let model = DecisionTreeRegressor::params().fit(&dataset).unwrap();

        let _: Array1<f64> = model.predict(&array![[0.], [1.]]);
    }
}
