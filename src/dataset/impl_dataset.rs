use super::{DatasetBase, Records, SelectRows};
use crate::error::{Error, Result};
use crate::model_selection::KFold;
use rand::{seq::SliceRandom, Rng};

/// Implementation without constraints on records and targets
///
/// This implementation block provides methods for the creation and mutation of datasets. This
/// includes swapping the targets, return the records etc.
impl<R, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dataset = Dataset::new(records, targets);
    /// ```
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Updates the records of a dataset
    ///
    /// This function overwrites the records in a dataset. The feature names are kept.
    pub fn with_records<U>(self, records: U) -> DatasetBase<U, T> {
        DatasetBase {
            records,
            targets: self.targets,
            feature_names: self.feature_names,
        }
    }

    /// Updates the targets of a dataset
    pub fn with_targets<U>(self, targets: U) -> DatasetBase<R, U> {
        DatasetBase {
            records: self.records,
            targets,
            feature_names: self.feature_names,
        }
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }

    /// Map targets with a function `f`
    pub fn map_targets<U, G: FnOnce(T) -> U>(self, fnc: G) -> DatasetBase<R, U> {
        let DatasetBase {
            records,
            targets,
            feature_names,
        } = self;

        DatasetBase {
            records,
            targets: fnc(targets),
            feature_names,
        }
    }
}

impl<R: Records, T> DatasetBase<R, T> {
    /// Return the number of samples in the dataset
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    /// Return the number of features in the records
    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// If no names were given, or their count does not match the records, names of the form
    /// `feature-{idx}` are generated.
    pub fn feature_names(&self) -> Vec<String> {
        if self.feature_names.len() == self.nfeatures() {
            self.feature_names.clone()
        } else {
            (0..self.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }
}

impl<R: Records + SelectRows, T: SelectRows> DatasetBase<R, T> {
    /// Gather the samples at `indices`, in order, into a new dataset
    pub fn select(&self, indices: &[usize]) -> DatasetBase<R::Output, T::Output> {
        DatasetBase {
            records: self.records.select_rows(indices),
            targets: self.targets.select_rows(indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Return a copy of the dataset with its samples randomly permuted
    pub fn shuffle<G: Rng>(&self, rng: &mut G) -> DatasetBase<R::Output, T::Output> {
        let mut indices = (0..self.nsamples()).collect::<Vec<_>>();
        indices.shuffle(rng);

        self.select(&indices)
    }

    /// Split dataset into two disjoint chunks
    ///
    /// This function splits the observations in a dataset into two disjoint chunks. The splitting
    /// threshold is calculated with the `ratio`. For example a ratio of `0.9` allocates 90% to the
    /// first chunks and 10% to the second. This is often used in training, validation splitting
    /// procedures. The first chunk receives `ceil(ratio * nsamples)` samples.
    pub fn split_with_ratio(
        &self,
        ratio: f32,
    ) -> (
        DatasetBase<R::Output, T::Output>,
        DatasetBase<R::Output, T::Output>,
    ) {
        let nsamples = self.nsamples();
        let n = ((nsamples as f32 * ratio).ceil() as usize).min(nsamples);

        let first = (0..n).collect::<Vec<_>>();
        let second = (n..nsamples).collect::<Vec<_>>();

        (self.select(&first), self.select(&second))
    }

    /// Randomly partition the dataset into a training and a test set
    ///
    /// The test set receives `ceil(test_ratio * nsamples)` samples drawn from a random
    /// permutation, the training set receives the remaining ones. Both sets must end up
    /// non-empty.
    pub fn train_test_split<G: Rng>(
        &self,
        test_ratio: f64,
        rng: &mut G,
    ) -> Result<(
        DatasetBase<R::Output, T::Output>,
        DatasetBase<R::Output, T::Output>,
    )> {
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(Error::Parameters(format!(
                "test ratio should be in the open interval (0, 1), but was {}",
                test_ratio
            )));
        }

        let nsamples = self.nsamples();
        let ntest = (test_ratio * nsamples as f64).ceil() as usize;
        if ntest == 0 || ntest >= nsamples {
            return Err(Error::NotEnoughSamples);
        }

        let mut permutation = (0..nsamples).collect::<Vec<_>>();
        permutation.shuffle(rng);
        let (test, train) = permutation.split_at(ntest);

        Ok((self.select(train), self.select(test)))
    }

    /// Draw `nsamples` observations uniformly with replacement
    pub fn bootstrap_sample<G: Rng>(
        &self,
        nsamples: usize,
        rng: &mut G,
    ) -> DatasetBase<R::Output, T::Output> {
        let total = self.nsamples();
        let indices = (0..nsamples)
            .map(|_| rng.gen_range(0..total))
            .collect::<Vec<_>>();

        self.select(&indices)
    }

    /// Create `k` pairs of training and validation sets
    ///
    /// The validation sets are contiguous and disjoint, see [`KFold`] for the exact partition.
    /// Each training set holds every sample not in its validation set.
    pub fn fold(
        &self,
        k: usize,
    ) -> Result<
        Vec<(
            DatasetBase<R::Output, T::Output>,
            DatasetBase<R::Output, T::Output>,
        )>,
    > {
        let splits = KFold::new(k).split(self.nsamples())?;

        Ok(splits
            .into_iter()
            .map(|(train, valid)| (self.select(&train), self.select(&valid)))
            .collect())
    }
}

impl<R, T> From<(R, T)> for DatasetBase<R, T> {
    fn from(rec_tar: (R, T)) -> Self {
        DatasetBase::new(rec_tar.0, rec_tar.1)
    }
}

impl<A, S: ndarray::Data<Elem = A>> From<ndarray::ArrayBase<S, ndarray::Ix2>>
    for DatasetBase<ndarray::ArrayBase<S, ndarray::Ix2>, ()>
{
    fn from(records: ndarray::ArrayBase<S, ndarray::Ix2>) -> Self {
        DatasetBase::new(records, ())
    }
}
