//! Standardization and min-max scaling of numeric features

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2};
use reel::dataset::DatasetBase;
use reel::traits::{Fit, Transformer};
use reel::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{PreprocessingError, Result};

/// How a [`LinearScaler`] maps every feature
///
/// * `Standard(with_mean, with_std)`: centers the feature on its mean and divides it by its
///   population standard deviation, either step can be switched off
/// * `MinMax(min, max)`: maps the observed range of the feature onto `[min, max]`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalingMethod<F> {
    Standard(bool, bool),
    MinMax(F, F),
}

impl<F: Float> std::fmt::Display for ScalingMethod<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingMethod::Standard(with_mean, with_std) => write!(
                f,
                "Standard scaler (with_mean = {}, with_std = {})",
                with_mean, with_std
            ),
            ScalingMethod::MinMax(min, max) => {
                write!(f, "Min-Max scaler (min = {}, max = {})", min, max)
            }
        }
    }
}

/// Learns an offset and a scale per feature
///
/// Fitting yields a [`FittedLinearScaler`] which applies `(x - offset) * scale` to every value,
/// followed by the affine map onto the target range for min-max scaling. Constant features keep
/// a unit scale.
///
/// ### Example
///
/// ```rust
/// use ndarray::array;
/// use reel::traits::{Fit, Transformer};
/// use reel::DatasetBase;
/// use reel_preprocessing::linear_scaling::LinearScaler;
///
/// let dataset = DatasetBase::from(array![[1., 10.], [3., 10.]]);
/// let scaler = LinearScaler::standard().fit(&dataset).unwrap();
/// let dataset = scaler.transform(dataset);
///
/// assert_eq!(dataset.records(), &array![[-1., 0.], [1., 0.]]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScaler<F> {
    method: ScalingMethod<F>,
}

impl<F: Float> LinearScaler<F> {
    pub fn new(method: ScalingMethod<F>) -> Self {
        Self { method }
    }

    pub fn method(mut self, method: ScalingMethod<F>) -> Self {
        self.method = method;
        self
    }

    /// Zero mean and unit variance
    pub fn standard() -> Self {
        Self::new(ScalingMethod::Standard(true, true))
    }

    /// Unit variance, the mean is kept
    pub fn standard_no_mean() -> Self {
        Self::new(ScalingMethod::Standard(false, true))
    }

    /// Zero mean, the spread is kept
    pub fn standard_no_std() -> Self {
        Self::new(ScalingMethod::Standard(true, false))
    }

    /// Maps every feature onto `[0, 1]`
    pub fn min_max() -> Self {
        Self::new(ScalingMethod::MinMax(F::zero(), F::one()))
    }

    /// Maps every feature onto `[min, max]`, fitting fails if `min > max`
    pub fn min_max_range(min: F, max: F) -> Self {
        Self::new(ScalingMethod::MinMax(min, max))
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for LinearScaler<F>
{
    type Object = FittedLinearScaler<F>;

    /// Fails on a dataset without samples and on a flipped min-max range
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }
        if let ScalingMethod::MinMax(min, max) = self.method {
            if min > max {
                return Err(PreprocessingError::FlippedMinMaxRange);
            }
        }

        let (offsets, scales): (Vec<F>, Vec<F>) = records
            .axis_iter(Axis(1))
            .map(|column| match self.method {
                ScalingMethod::Standard(with_mean, with_std) => {
                    standard_parameters(column, with_mean, with_std)
                }
                ScalingMethod::MinMax(..) => min_max_parameters(column),
            })
            .unzip();

        Ok(FittedLinearScaler {
            offsets: Array1::from(offsets),
            scales: Array1::from(scales),
            method: self.method,
        })
    }
}

/// Inverse of the spread, or one for a constant feature
fn inverse_or_one<F: Float>(spread: F) -> F {
    if spread.abs() <= F::epsilon() {
        F::one()
    } else {
        F::one() / spread
    }
}

fn standard_parameters<F: Float>(
    column: ArrayView1<F>,
    with_mean: bool,
    with_std: bool,
) -> (F, F) {
    let n = F::cast(column.len());
    let mean = column.sum() / n;
    let offset = if with_mean { mean } else { F::zero() };
    let scale = if with_std {
        let variance = column.iter().map(|&x| (x - mean) * (x - mean)).sum::<F>() / n;
        inverse_or_one(variance.sqrt())
    } else {
        F::one()
    };

    (offset, scale)
}

fn min_max_parameters<F: Float>(column: ArrayView1<F>) -> (F, F) {
    let (min, max) = column
        .iter()
        .fold((F::infinity(), F::neg_infinity()), |(min, max), &x| {
            (min.min(x), max.max(x))
        });

    (min, inverse_or_one(max - min))
}

/// A fitted [`LinearScaler`]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedLinearScaler<F> {
    offsets: Array1<F>,
    scales: Array1<F>,
    method: ScalingMethod<F>,
}

impl<F: Float> FittedLinearScaler<F> {
    /// Subtracted from every feature
    pub fn offsets(&self) -> &Array1<F> {
        &self.offsets
    }

    /// Applied to every feature after subtracting the offset
    pub fn scales(&self) -> &Array1<F> {
        &self.scales
    }

    pub fn method(&self) -> &ScalingMethod<F> {
        &self.method
    }
}

impl<F: Float> Transformer<Array2<F>, Array2<F>> for FittedLinearScaler<F> {
    /// Scales a matrix of shape `(nsamples, nfeatures)`.
    /// Panics if the number of features differs from the one seen while fitting.
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        assert_eq!(
            x.ncols(),
            self.offsets.len(),
            "The number of features must match the fitted scaler."
        );

        let scaled = (x - &self.offsets) * &self.scales;
        match self.method {
            ScalingMethod::MinMax(min, max) => scaled * (max - min) + min,
            ScalingMethod::Standard(..) => scaled,
        }
    }
}

impl<F: Float, D: Data<Elem = F>, T>
    Transformer<DatasetBase<ArrayBase<D, Ix2>, T>, DatasetBase<Array2<F>, T>>
    for FittedLinearScaler<F>
{
    /// Replaces the records of the dataset with their scaled version, keeping the feature names
    fn transform(&self, x: DatasetBase<ArrayBase<D, Ix2>, T>) -> DatasetBase<Array2<F>, T> {
        let records = self.transform(x.records().to_owned());
        x.with_records(records)
    }
}
