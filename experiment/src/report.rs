use std::fmt;

use ndarray::Array1;
use reel::metrics::Regression;
use reel::model_selection::ParamSet;

/// Test-set metrics of the tuned model
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    mean_squared_error: f64,
    r2: f64,
    accuracy: f64,
    tolerance: f64,
    best_params: ParamSet,
    best_score: f64,
    actual: Array1<f64>,
    predicted: Array1<f64>,
}

impl Report {
    /// Scores the predictions against the actual ratings
    ///
    /// `best_params` and `best_score` describe the candidate the grid search picked.
    pub fn new(
        actual: Array1<f64>,
        predicted: Array1<f64>,
        tolerance: f64,
        best_params: ParamSet,
        best_score: f64,
    ) -> reel::error::Result<Self> {
        let mean_squared_error = predicted.mean_squared_error(&actual)?;
        let r2 = predicted.r2(&actual)?;
        let accuracy = predicted.within_relative_tolerance(&actual, tolerance)? * 100.;

        Ok(Self {
            mean_squared_error,
            r2,
            accuracy,
            tolerance,
            best_params,
            best_score,
            actual,
            predicted,
        })
    }

    pub fn mean_squared_error(&self) -> f64 {
        self.mean_squared_error
    }

    pub fn r2(&self) -> f64 {
        self.r2
    }

    /// Percentage of test movies predicted within the relative tolerance
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn best_params(&self) -> &ParamSet {
        &self.best_params
    }

    /// Mean cross-validation score of the best candidate, the negated mean squared error
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn actual(&self) -> &Array1<f64> {
        &self.actual
    }

    pub fn predicted(&self) -> &Array1<f64> {
        &self.predicted
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // 0.1 prints as 10, 0.125 as 12.5
        let percent = (self.tolerance * 1000.).round() / 10.;

        writeln!(f, "Mean Squared Error: {:.2}", self.mean_squared_error)?;
        writeln!(f, "R-squared: {:.2}", self.r2)?;
        writeln!(
            f,
            "Accuracy within {}% of actual: {:.2}%",
            percent, self.accuracy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn prints_three_metrics() -> reel::error::Result<()> {
        let actual = array![50., 80., 100., 40.];
        let predicted = array![52., 70., 100., 46.];
        let report = Report::new(actual, predicted, 0.1, ParamSet::new(), -1.5)?;

        assert_abs_diff_eq!(report.mean_squared_error(), 35.);
        assert_abs_diff_eq!(report.accuracy(), 50.);
        assert_eq!(
            report.to_string(),
            "Mean Squared Error: 35.00\nR-squared: 0.94\nAccuracy within 10% of actual: 50.00%\n"
        );

        Ok(())
    }

    #[test]
    fn zero_ratings_are_never_accurate() -> reel::error::Result<()> {
        let report = Report::new(array![0., 10.], array![0., 10.], 0.1, ParamSet::new(), 0.)?;

        assert_abs_diff_eq!(report.accuracy(), 50.);

        Ok(())
    }
}
