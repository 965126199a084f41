use std::fmt;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single hyperparameter value
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(usize),
    Float(f64),
    Bool(bool),
    Text(String),
    None,
}

impl ParamValue {
    /// Interpret the value as a count
    ///
    /// Fails with a descriptive error naming the hyperparameter `name`.
    pub fn as_usize(&self, name: &str) -> Result<usize> {
        match self {
            ParamValue::Int(x) => Ok(*x),
            _ => Err(self.type_error(name, "an integer")),
        }
    }

    /// Interpret the value as an optional count, `None` disables the limit
    pub fn as_optional_usize(&self, name: &str) -> Result<Option<usize>> {
        match self {
            ParamValue::Int(x) => Ok(Some(*x)),
            ParamValue::None => Ok(None),
            _ => Err(self.type_error(name, "an integer or none")),
        }
    }

    /// Interpret the value as a real number, integers are widened
    pub fn as_f64(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Float(x) => Ok(*x),
            ParamValue::Int(x) => Ok(*x as f64),
            _ => Err(self.type_error(name, "a number")),
        }
    }

    pub fn as_bool(&self, name: &str) -> Result<bool> {
        match self {
            ParamValue::Bool(x) => Ok(*x),
            _ => Err(self.type_error(name, "a boolean")),
        }
    }

    pub fn type_error(&self, name: &str, expected: &'static str) -> Error {
        Error::ParameterType {
            name: name.to_string(),
            expected,
            value: self.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Int(x) => write!(f, "{}", x),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(x) => write!(f, "{}", x),
            ParamValue::Text(x) => write!(f, "'{}'", x),
            ParamValue::None => write!(f, "None"),
        }
    }
}

impl From<usize> for ParamValue {
    fn from(x: usize) -> Self {
        ParamValue::Int(x)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<bool> for ParamValue {
    fn from(x: bool) -> Self {
        ParamValue::Bool(x)
    }
}

impl From<&str> for ParamValue {
    fn from(x: &str) -> Self {
        ParamValue::Text(x.to_string())
    }
}

impl From<Option<usize>> for ParamValue {
    fn from(x: Option<usize>) -> Self {
        x.map(ParamValue::Int).unwrap_or(ParamValue::None)
    }
}

/// An assignment of values to named hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        ParamSet::default()
    }

    /// Assign `value` to `name`, replacing an earlier assignment
    pub fn with<S: Into<String>, V: Into<ParamValue>>(mut self, name: S, value: V) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (name, value)) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Exhaustive grid of hyperparameter values
///
/// Candidates are enumerated with the names in lexicographic order and the last name varying
/// fastest, independent of the order in which the axes were added.
///
/// ```ignore
/// let grid = ParamGrid::new()
///     .add("n_estimators", vec![100usize, 200])
///     .add("max_depth", vec![Some(10usize), None]);
///
/// // {max_depth: 10, n_estimators: 100}, {max_depth: 10, n_estimators: 200}, ...
/// assert_eq!(grid.len(), 4);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        ParamGrid::default()
    }

    /// Add an axis to the grid, replacing the values of an axis with the same name
    pub fn add<S, I, V>(mut self, name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        let name = name.into();
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();

        match self.axes.iter_mut().find(|(key, _)| *key == name) {
            Some(axis) => axis.1 = values,
            None => self.axes.push((name, values)),
        }
        self.axes.sort_by(|a, b| a.0.cmp(&b.0));

        self
    }

    /// Number of candidates in the grid
    ///
    /// An axis without values makes the grid empty, a grid without axes has a single empty
    /// candidate.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(name, _)| name.as_str())
    }

    /// Return the candidate at position `idx` of the enumeration order
    pub fn candidate(&self, mut idx: usize) -> Option<ParamSet> {
        if idx >= self.len() {
            return None;
        }

        let mut entries = Vec::with_capacity(self.axes.len());
        for (name, values) in self.axes.iter().rev() {
            entries.push((name.clone(), values[idx % values.len()].clone()));
            idx /= values.len();
        }
        entries.reverse();

        Some(ParamSet { entries })
    }

    /// Enumerate all candidates
    pub fn iter(&self) -> impl Iterator<Item = ParamSet> + '_ {
        (0..self.len()).filter_map(move |idx| self.candidate(idx))
    }
}

/// Hyperparameters which can be updated by name
///
/// Grid search clones an estimator template and applies every candidate through this trait.
pub trait SetParams: Sized {
    /// Update a single hyperparameter
    fn set_param(self, name: &str, value: &ParamValue) -> Result<Self>;

    /// Apply every assignment of `params` in order
    fn set_params(self, params: &ParamSet) -> Result<Self> {
        params
            .iter()
            .try_fold(self, |estimator, (name, value)| estimator.set_param(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Knobs {
        depth: Option<usize>,
        rate: f64,
    }

    impl SetParams for Knobs {
        fn set_param(mut self, name: &str, value: &ParamValue) -> Result<Self> {
            match name {
                "depth" => self.depth = value.as_optional_usize(name)?,
                "rate" => self.rate = value.as_f64(name)?,
                _ => return Err(Error::UnknownParameter(name.to_string())),
            }
            Ok(self)
        }
    }

    #[test]
    fn grid_enumerates_cartesian_product() {
        let grid = ParamGrid::new()
            .add("b", vec![1usize, 2, 3])
            .add("a", vec![true, false]);

        assert_eq!(grid.len(), 6);
        assert_eq!(grid.names().collect::<Vec<_>>(), vec!["a", "b"]);

        let candidates = grid.iter().collect::<Vec<_>>();
        assert_eq!(candidates.len(), 6);
        assert_eq!(
            candidates[0],
            ParamSet::new().with("a", true).with("b", 1usize)
        );
        assert_eq!(
            candidates[1],
            ParamSet::new().with("a", true).with("b", 2usize)
        );
        assert_eq!(
            candidates[5],
            ParamSet::new().with("a", false).with("b", 3usize)
        );
        assert_eq!(grid.candidate(6), None);
    }

    #[test]
    fn grid_edge_cases() {
        assert_eq!(ParamGrid::new().len(), 1);
        assert_eq!(ParamGrid::new().iter().next(), Some(ParamSet::new()));

        let empty = ParamGrid::new().add("a", Vec::<usize>::new());
        assert!(empty.is_empty());
        assert_eq!(empty.iter().count(), 0);

        let replaced = ParamGrid::new()
            .add("a", vec![1usize])
            .add("a", vec![2usize, 3]);
        assert_eq!(replaced.len(), 2);
    }

    #[test]
    fn set_params_applies_all_values() -> Result<()> {
        let params = ParamSet::new().with("depth", Some(4usize)).with("rate", 0.5);
        let knobs = Knobs::default().set_params(&params)?;

        assert_eq!(
            knobs,
            Knobs {
                depth: Some(4),
                rate: 0.5
            }
        );
        assert_eq!(format!("{}", params), "{depth: 4, rate: 0.5}");

        let unbounded = Knobs::default().set_param("depth", &ParamValue::None)?;
        assert_eq!(unbounded.depth, None);

        Ok(())
    }

    #[test]
    fn set_params_reports_bad_values() {
        assert!(matches!(
            Knobs::default().set_param("depth", &ParamValue::Bool(true)),
            Err(Error::ParameterType { .. })
        ));
        assert!(matches!(
            Knobs::default().set_param("width", &ParamValue::Int(1)),
            Err(Error::UnknownParameter(_))
        ));
    }
}
