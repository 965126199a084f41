use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rand::{rngs::SmallRng, SeedableRng};
use reel::FrameDataset;
use reel_datasets::{generate, rotten_tomatoes};
use reel_experiment::{run, ExperimentConfig};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Predicts the audience rating of movies with a random forest tuned by grid search
#[derive(Debug, StructOpt)]
#[structopt(name = "audience-rating")]
struct Options {
    #[structopt(short, long, parse(from_os_str), required_unless = "synthetic")]
    /// CSV file with the movie reviews, may be gzip compressed
    data: Option<PathBuf>,
    #[structopt(long, conflicts_with = "data")]
    /// Run on this many generated movie reviews instead of a file
    synthetic: Option<usize>,
    #[structopt(long, default_value = "0.2")]
    /// Fraction of the movies held out for testing
    test_size: f64,
    #[structopt(long, default_value = "42")]
    /// Seed of the split and of the forests
    seed: u64,
    #[structopt(long, default_value = "5")]
    /// Number of cross-validation folds
    folds: usize,
    #[structopt(long, use_delimiter = true)]
    /// Numbers of trees to try, Default: 100,200,300
    n_estimators: Vec<usize>,
    #[structopt(long, use_delimiter = true)]
    /// Depth limits to try, `none` for unlimited, Default: 10,20,30
    max_depth: Vec<MaxDepth>,
    #[structopt(long, use_delimiter = true)]
    /// Minimal samples to split a node, Default: 2,5,10
    min_samples_split: Vec<usize>,
    #[structopt(long, use_delimiter = true)]
    /// Minimal samples in a leaf, Default: 1,2,4
    min_samples_leaf: Vec<usize>,
    #[structopt(long, default_value = "0.1")]
    /// Relative error up to which a prediction counts as accurate
    tolerance: f64,
    #[structopt(short, long)]
    /// Worker threads, Default: one per core
    jobs: Option<usize>,
    #[structopt(long, parse(from_os_str), default_value = "actual_vs_predicted.png")]
    /// Where to save the actual vs predicted scatter plot
    plot: PathBuf,
    #[structopt(long)]
    /// Skip the scatter plot
    no_plot: bool,
    #[structopt(long, default_value = "info")]
    /// Log level, overridden by RUST_LOG
    log_level: String,
}

#[derive(Debug, Clone, Copy)]
struct MaxDepth(Option<usize>);

impl FromStr for MaxDepth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "none" | "None" => Ok(MaxDepth(None)),
            depth => depth
                .parse()
                .map(|depth| MaxDepth(Some(depth)))
                .map_err(|_| format!("invalid depth `{}`", depth)),
        }
    }
}

impl Options {
    fn config(&self) -> ExperimentConfig {
        let defaults = ExperimentConfig::default();
        let or_default = |values: &[usize], default: Vec<usize>| {
            if values.is_empty() {
                default
            } else {
                values.to_vec()
            }
        };

        ExperimentConfig {
            test_size: self.test_size,
            seed: self.seed,
            folds: self.folds,
            n_estimators: or_default(&self.n_estimators, defaults.n_estimators),
            max_depth: if self.max_depth.is_empty() {
                defaults.max_depth
            } else {
                self.max_depth.iter().map(|depth| depth.0).collect()
            },
            min_samples_split: or_default(&self.min_samples_split, defaults.min_samples_split),
            min_samples_leaf: or_default(&self.min_samples_leaf, defaults.min_samples_leaf),
            tolerance: self.tolerance,
            plot: if self.no_plot {
                None
            } else {
                Some(self.plot.clone())
            },
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let options = Options::from_args();
    init_tracing(&options.log_level);

    if let Some(jobs) = options.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("cannot configure the worker threads")?;
    }

    let dataset: FrameDataset<f64> = match (&options.data, options.synthetic) {
        (Some(path), _) => rotten_tomatoes::load(path)
            .with_context(|| format!("cannot load movie reviews from {}", path.display()))?,
        (None, Some(nsamples)) => {
            let mut rng = SmallRng::seed_from_u64(options.seed);
            rotten_tomatoes::from_frame(generate::movie_reviews(nsamples, &mut rng)?)?
        }
        (None, None) => bail!("either --data or --synthetic is required"),
    };
    info!(movies = dataset.nsamples(), "loaded movie reviews");

    let config = options.config();
    let report = run(&dataset, &config)?;
    info!(params = %report.best_params(), "best hyperparameters");

    print!("{}", report);

    Ok(())
}
