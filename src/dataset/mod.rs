//! Datasets
//!
//! This module implements the dataset struct and various helper traits to extend its
//! functionality.
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2, ScalarOperand,
};

use num_traits::{FromPrimitive, NumAssignOps, NumCast};

use std::fmt;
use std::iter::Sum;

use crate::frame::Frame;

mod impl_dataset;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in records of a dataset and,
/// for regression tasks, in the targets as well. Missing numeric values are encoded as NaN.
pub trait Float:
    num_traits::Float
    + FromPrimitive
    + Default
    + Sum
    + NumAssignOps
    + ScalarOperand
    + fmt::Display
    + fmt::Debug
    + Send
    + Sync
    + approx::AbsDiffEq<Epsilon = Self>
    + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the data
/// and may contain targets. The records can be a dense matrix or a mixed-type [`Frame`], the
/// targets are usually a one-dimensional array of regression values.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<R, T> {
    pub records: R,
    pub targets: T,

    feature_names: Vec<String>,
}

/// Dataset with owned dense records and targets
pub type Dataset<D, T> = DatasetBase<Array2<D>, Array1<T>>;

/// Dataset with borrowed dense records and targets
pub type DatasetView<'a, D, T> = DatasetBase<ArrayView2<'a, D>, ArrayView1<'a, T>>;

/// Dataset with mixed-type records and continuous targets
pub type FrameDataset<F> = DatasetBase<Frame<F>, Array1<F>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

impl<A, S: Data<Elem = A>> Records for ArrayBase<S, Ix2> {
    type Elem = A;

    fn nsamples(&self) -> usize {
        self.len_of(Axis(0))
    }

    fn nfeatures(&self) -> usize {
        self.len_of(Axis(1))
    }
}

/// Return a read-only view of a single target column
pub trait AsTargets {
    type Elem;

    fn as_targets(&self) -> ArrayView1<'_, Self::Elem>;
}

impl<A, S: Data<Elem = A>> AsTargets for ArrayBase<S, Ix1> {
    type Elem = A;

    fn as_targets(&self) -> ArrayView1<'_, A> {
        self.view()
    }
}

/// Gather a subset of rows, in the given order, into an owned container
///
/// Indices may repeat, which is how bootstrap samples are drawn.
pub trait SelectRows {
    type Output;

    fn select_rows(&self, indices: &[usize]) -> Self::Output;
}

impl<A: Clone, S: Data<Elem = A>> SelectRows for ArrayBase<S, Ix2> {
    type Output = Array2<A>;

    fn select_rows(&self, indices: &[usize]) -> Array2<A> {
        self.select(Axis(0), indices)
    }
}

impl<A: Clone, S: Data<Elem = A>> SelectRows for ArrayBase<S, Ix1> {
    type Output = Array1<A>;

    fn select_rows(&self, indices: &[usize]) -> Array1<A> {
        self.select(Axis(0), indices)
    }
}

impl SelectRows for () {
    type Output = ();

    fn select_rows(&self, _indices: &[usize]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Axis};
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use rand::{rngs::SmallRng, SeedableRng};

    fn toy() -> Dataset<f64, f64> {
        let records = Array::linspace(0., 9., 10).into_shape((5, 2)).unwrap();
        let targets = array![0., 1., 2., 3., 4.];
        Dataset::new(records, targets).with_feature_names(vec!["a", "b"])
    }

    #[test]
    fn dataset_implements_required_methods() {
        let dataset = toy();

        assert_eq!(dataset.nsamples(), 5);
        assert_eq!(dataset.nfeatures(), 2);
        assert_eq!(dataset.feature_names(), vec!["a", "b"]);

        let unnamed = Dataset::new(Array2::<f64>::zeros((2, 3)), array![0., 1.]);
        assert_eq!(
            unnamed.feature_names(),
            vec!["feature-0", "feature-1", "feature-2"]
        );
    }

    #[test]
    fn select_keeps_rows_and_targets_aligned() {
        let subset = toy().select(&[4, 0, 4]);

        assert_abs_diff_eq!(subset.records, array![[8., 9.], [0., 1.], [8., 9.]]);
        assert_abs_diff_eq!(subset.targets, array![4., 0., 4.]);
        assert_eq!(subset.feature_names(), vec!["a", "b"]);
    }

    #[test]
    fn split_with_ratio_rounds_up() {
        let (first, second) = toy().split_with_ratio(0.5);

        assert_eq!(first.nsamples(), 3);
        assert_eq!(second.nsamples(), 2);
        assert_abs_diff_eq!(second.targets, array![3., 4.]);
    }

    #[test]
    fn shuffle_preserves_pairs() {
        let mut rng = SmallRng::seed_from_u64(42);
        let shuffled = toy().shuffle(&mut rng);

        for (row, target) in shuffled.records.rows().into_iter().zip(shuffled.targets.iter()) {
            assert_abs_diff_eq!(row[0], target * 2.);
        }
    }

    #[test]
    fn train_test_split_sizes() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array::linspace(0., 9., 10).into_shape((10, 1)).unwrap();
        let dataset = Dataset::new(records, Array::linspace(0., 9., 10));

        let (train, test) = dataset.train_test_split(0.2, &mut rng)?;
        assert_eq!(train.nsamples(), 8);
        assert_eq!(test.nsamples(), 2);

        let mut seen = train
            .targets
            .iter()
            .chain(test.targets.iter())
            .map(|x| *x as usize)
            .collect::<Vec<_>>();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        let (train, test) = dataset.train_test_split(0.25, &mut rng)?;
        assert_eq!((train.nsamples(), test.nsamples()), (7, 3));

        Ok(())
    }

    #[test]
    fn train_test_split_rejects_degenerate_ratios() {
        let mut rng = SmallRng::seed_from_u64(42);
        let dataset = toy();

        assert!(dataset.train_test_split(0.0, &mut rng).is_err());
        assert!(dataset.train_test_split(1.0, &mut rng).is_err());
        assert!(dataset.train_test_split(0.99, &mut rng).is_err());
    }

    #[test]
    fn bootstrap_sample_draws_existing_rows() {
        let mut rng = SmallRng::seed_from_u64(42);
        let sample = toy().bootstrap_sample(20, &mut rng);

        assert_eq!(sample.nsamples(), 20);
        for (row, target) in sample.records.rows().into_iter().zip(sample.targets.iter()) {
            assert_abs_diff_eq!(row[1], target * 2. + 1.);
        }
    }

    #[test]
    fn train_test_split_keeps_random_rows_intact() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let records = Array::random_using((50, 3), Uniform::new(-1f64, 1.), &mut rng);
        let targets = records.sum_axis(Axis(1));
        let dataset = Dataset::new(records, targets);

        let (train, test) = dataset.train_test_split(0.3, &mut rng)?;
        assert_eq!((train.nsamples(), test.nsamples()), (35, 15));
        assert_eq!(train.nfeatures(), 3);

        for part in &[train, test] {
            for (row, target) in part.records.rows().into_iter().zip(part.targets.iter()) {
                assert_abs_diff_eq!(row.sum(), *target, epsilon = 1e-12);
            }
        }

        Ok(())
    }

    #[test]
    fn fold_covers_every_sample_once() -> Result<()> {
        let folds = toy().fold(2)?;

        assert_eq!(folds.len(), 2);
        assert_abs_diff_eq!(folds[0].1.targets, array![0., 1., 2.]);
        assert_abs_diff_eq!(folds[0].0.targets, array![3., 4.]);
        assert_abs_diff_eq!(folds[1].1.targets, array![3., 4.]);
        assert_abs_diff_eq!(folds[1].0.targets, array![0., 1., 2.]);

        Ok(())
    }
}
