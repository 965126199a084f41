use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use crate::error::{Error, Result};

/// K-fold cross-validation splitter
///
/// Divides `nsamples` indices into `k` contiguous folds. Every fold is used once as validation
/// set while the remaining `k - 1` folds form the training set. The first `nsamples % k` folds
/// hold one sample more than the others, so fold sizes differ by at most one.
///
/// With [`KFold::shuffle`] the indices are permuted with a seeded generator before they are
/// partitioned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KFold {
    k: usize,
    seed: Option<u64>,
}

impl KFold {
    pub fn new(k: usize) -> Self {
        KFold { k, seed: None }
    }

    /// Permute the samples with a generator seeded by `seed` before splitting
    pub fn shuffle(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        self.k
    }

    /// Return `(train, validation)` index pairs, one for each fold
    pub fn split(&self, nsamples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.k < 2 || self.k > nsamples {
            return Err(Error::InvalidFolds {
                folds: self.k,
                nsamples,
            });
        }

        let mut indices = (0..nsamples).collect::<Vec<_>>();
        if let Some(seed) = self.seed {
            indices.shuffle(&mut SmallRng::seed_from_u64(seed));
        }

        let base = nsamples / self.k;
        let remainder = nsamples % self.k;

        let mut start = 0;
        let splits = (0..self.k)
            .map(|fold| {
                let size = base + usize::from(fold < remainder);
                let end = start + size;

                let valid = indices[start..end].to_vec();
                let train = indices[..start]
                    .iter()
                    .chain(indices[end..].iter())
                    .copied()
                    .collect();
                start = end;

                (train, valid)
            })
            .collect();

        Ok(splits)
    }
}
