//! Mixed-type tables
//!
//! A [`Frame`] holds named columns of equal length. Numeric columns store missing values as NaN,
//! categorical columns store them as `None`. Frames are the records of a [`FrameDataset`] and
//! are turned into dense matrices by the preprocessing transformers.
use std::fmt;

use ndarray::{Array1, Array2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::dataset::{DatasetBase, Float, FrameDataset, Records, SelectRows};
use crate::error::{Error, Result};

/// The kind of values stored in a column
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// A single column of a frame
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum Column<F> {
    Numeric(Array1<F>),
    Categorical(Array1<Option<String>>),
}

impl<F: Float> Column<F> {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the value in row `idx` is missing
    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            Column::Numeric(values) => values[idx].is_nan(),
            Column::Categorical(values) => values[idx].is_none(),
        }
    }

    /// Number of missing values in the column
    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&idx| self.is_missing(idx)).count()
    }

    pub fn as_numeric(&self) -> Option<&Array1<F>> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&Array1<Option<String>>> {
        match self {
            Column::Numeric(_) => None,
            Column::Categorical(values) => Some(values),
        }
    }
}

impl<F: Float> SelectRows for Column<F> {
    type Output = Column<F>;

    fn select_rows(&self, indices: &[usize]) -> Column<F> {
        match self {
            Column::Numeric(values) => Column::Numeric(values.select_rows(indices)),
            Column::Categorical(values) => Column::Categorical(values.select_rows(indices)),
        }
    }
}

/// A table of named, equally long columns
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<F> {
    names: Vec<String>,
    columns: Vec<Column<F>>,
    nrows: usize,
}

impl<F: Float> Default for Frame<F> {
    fn default() -> Self {
        Frame::new()
    }
}

impl<F: Float> Frame<F> {
    /// Create an empty frame, the first column added fixes the number of rows
    pub fn new() -> Self {
        Frame {
            names: Vec::new(),
            columns: Vec::new(),
            nrows: 0,
        }
    }

    /// Append a column to the frame
    pub fn push_column<S: Into<String>>(&mut self, name: S, column: Column<F>) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(Error::DuplicateColumn(name));
        }

        if self.columns.is_empty() {
            self.nrows = column.len();
        } else if column.len() != self.nrows {
            return Err(Error::ColumnLength {
                name,
                expected: self.nrows,
                found: column.len(),
            });
        }

        self.names.push(name);
        self.columns.push(column);

        Ok(())
    }

    /// Append a numeric column, NaN marks a missing value
    pub fn with_numeric<S: Into<String>>(mut self, name: S, values: Array1<F>) -> Result<Self> {
        self.push_column(name, Column::Numeric(values))?;
        Ok(self)
    }

    /// Append a categorical column, `None` marks a missing value
    pub fn with_categorical<S, I, V>(mut self, name: S, values: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = Option<V>>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|value| value.map(Into::into))
            .collect::<Array1<_>>();
        self.push_column(name, Column::Categorical(values))?;
        Ok(self)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over `(name, column)` pairs in insertion order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column<F>)> {
        self.names
            .iter()
            .map(|name| name.as_str())
            .zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> Result<&Column<F>> {
        self.names
            .iter()
            .position(|x| x == name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Gather numeric columns into a matrix with one column per name
    pub fn numeric<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<F>> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column(name)?
                    .as_numeric()
                    .ok_or_else(|| Error::ColumnKind {
                        name: name.to_string(),
                        expected: ColumnKind::Numeric,
                        found: ColumnKind::Categorical,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Array2::from_shape_fn((self.nrows, columns.len()), |(i, j)| {
            columns[j][i]
        }))
    }

    /// Gather categorical columns into a matrix with one column per name
    pub fn categorical<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<Option<String>>> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column(name)?
                    .as_categorical()
                    .ok_or_else(|| Error::ColumnKind {
                        name: name.to_string(),
                        expected: ColumnKind::Categorical,
                        found: ColumnKind::Numeric,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Array2::from_shape_fn((self.nrows, columns.len()), |(i, j)| {
            columns[j][i].clone()
        }))
    }

    /// Return a frame with only the named columns, in the given order
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame<F>> {
        let mut frame = Frame::new();
        for name in names {
            let name = name.as_ref();
            frame.push_column(name, self.column(name)?.clone())?;
        }
        // keep the row count for frames without columns
        frame.nrows = self.nrows;

        Ok(frame)
    }

    /// Remove every row with a missing value in one of the `subset` columns
    ///
    /// An empty subset considers all columns.
    pub fn drop_missing<S: AsRef<str>>(&self, subset: &[S]) -> Result<Frame<F>> {
        let columns = if subset.is_empty() {
            self.columns.iter().collect::<Vec<_>>()
        } else {
            subset
                .iter()
                .map(|name| self.column(name.as_ref()))
                .collect::<Result<Vec<_>>>()?
        };

        let keep = (0..self.nrows)
            .filter(|&idx| columns.iter().all(|column| !column.is_missing(idx)))
            .collect::<Vec<_>>();

        Ok(self.select_rows(&keep))
    }

    /// Split the frame into feature records and a numeric target
    ///
    /// The target column must be numeric and must not contain missing values.
    pub fn into_dataset<S: AsRef<str>>(
        self,
        features: &[S],
        target: &str,
    ) -> Result<FrameDataset<F>> {
        let targets = match self.column(target)? {
            Column::Numeric(values) => values.clone(),
            Column::Categorical(_) => {
                return Err(Error::ColumnKind {
                    name: target.to_string(),
                    expected: ColumnKind::Numeric,
                    found: ColumnKind::Categorical,
                })
            }
        };
        if targets.iter().any(|x| x.is_nan()) {
            return Err(Error::MissingTargets(target.to_string()));
        }

        let records = self.select_columns(features)?;
        let names = records.names().to_vec();

        Ok(DatasetBase::new(records, targets).with_feature_names(names))
    }
}

impl<F: Float> Records for Frame<F> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        self.nrows
    }

    fn nfeatures(&self) -> usize {
        self.columns.len()
    }
}

impl<F: Float> SelectRows for Frame<F> {
    type Output = Frame<F>;

    fn select_rows(&self, indices: &[usize]) -> Frame<F> {
        Frame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| column.select_rows(indices))
                .collect(),
            nrows: indices.len(),
        }
    }
}
