//! Plots comparing predictions with the ground truth
use std::error::Error;
use std::ops::Range;
use std::path::Path;

use ndarray::{ArrayBase, Data, Ix1};
use plotters::prelude::*;
use reel::Float;
use tracing::info;

/// Scatter plot of actual against predicted values, rendered to a PNG file
///
/// Every test sample becomes a translucent point at `(actual, predicted)`, so a perfect model
/// draws a diagonal line.
///
/// ### Example
///
/// ```no_run
/// use ndarray::array;
/// use reel_ensemble::visualization::ScatterPlot;
///
/// let actual = array![60., 75., 90.];
/// let predicted = array![63., 71., 88.];
///
/// ScatterPlot::new()
///     .title("Actual vs Predicted Audience Rating")
///     .draw(&actual, &predicted, "actual_vs_predicted.png")
///     .unwrap();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterPlot {
    title: String,
    x_label: String,
    y_label: String,
    size: (u32, u32),
    point_size: u32,
    opacity: f64,
}

impl Default for ScatterPlot {
    fn default() -> Self {
        Self {
            title: "Actual vs Predicted Audience Rating".to_string(),
            x_label: "Actual Audience Rating".to_string(),
            y_label: "Predicted Audience Rating".to_string(),
            size: (800, 600),
            point_size: 3,
            opacity: 0.5,
        }
    }
}

impl ScatterPlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn x_label(mut self, x_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self
    }

    pub fn y_label(mut self, y_label: impl Into<String>) -> Self {
        self.y_label = y_label.into();
        self
    }

    /// Width and height of the image in pixels
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn point_size(mut self, point_size: u32) -> Self {
        self.point_size = point_size;
        self
    }

    /// Opacity of the points, between 0 (invisible) and 1 (opaque)
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.max(0.).min(1.);
        self
    }

    /// Renders the points `(actual[i], predicted[i])` into a PNG image at `path`
    pub fn draw<F, D1, D2, P>(
        &self,
        actual: &ArrayBase<D1, Ix1>,
        predicted: &ArrayBase<D2, Ix1>,
        path: P,
    ) -> Result<(), Box<dyn Error>>
    where
        F: Float,
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        P: AsRef<Path>,
    {
        if actual.len() != predicted.len() {
            return Err(format!(
                "cannot plot {} actual values against {} predictions",
                actual.len(),
                predicted.len()
            )
            .into());
        }

        let points = points(actual, predicted);
        let x_range = axis_range(points.iter().map(|(x, _)| *x));
        let y_range = axis_range(points.iter().map(|(_, y)| *y));

        let path = path.as_ref();
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(10)
            .y_labels(10)
            .draw()?;

        let style = BLUE.mix(self.opacity).filled();
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, self.point_size, style)),
        )?;

        root.present()?;
        info!(points = points.len(), path = %path.display(), "saved scatter plot");

        Ok(())
    }
}

/// Pairs up the values, skipping pairs with a non-finite coordinate
fn points<F, D1, D2>(actual: &ArrayBase<D1, Ix1>, predicted: &ArrayBase<D2, Ix1>) -> Vec<(f64, f64)>
where
    F: Float,
    D1: Data<Elem = F>,
    D2: Data<Elem = F>,
{
    actual
        .iter()
        .zip(predicted.iter())
        .filter_map(|(a, p)| Some((a.to_f64()?, p.to_f64()?)))
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .collect()
}

/// Range covering all values with five percent padding on both sides
///
/// An empty input gives `0..1` and a single distinct value `v` gives `v-1..v+1`.
fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), x| {
        (min.min(x), max.max(x))
    });

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.)..(max + 1.);
    }

    let padding = (max - min) * 0.05;
    (min - padding)..(max + padding)
}
