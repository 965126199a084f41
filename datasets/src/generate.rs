//! Utility functions for randomly generating datasets

use ndarray::Array1;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::{Distribution, StandardNormal, Uniform};
use reel::{Float, Frame};

use crate::error::Result;
use crate::rotten_tomatoes::{FEATURES, TARGET};

/// MPAA ratings with their shift of the audience rating
const RATINGS: [(&str, f64); 5] = [("G", 4.), ("PG", 2.), ("PG-13", -2.), ("R", 0.), ("NR", 3.)];

/// Genres with their shift of the audience rating
const GENRES: [(&str, f64); 6] = [
    ("Action & Adventure", -3.),
    ("Animation", 5.),
    ("Comedy", -1.),
    ("Documentary", 8.),
    ("Drama", 2.),
    ("Horror", -8.),
];

/// Probability of a missing feature value
const MISSING_FEATURE: f64 = 0.05;
/// Probability of a missing audience rating
const MISSING_TARGET: f64 = 0.02;
/// Standard deviation of the audience rating around its expected value
const NOISE: f64 = 4.;

/// Generates a frame of `nsamples` fictional movie reviews
///
/// The frame holds the columns of the Rotten Tomatoes dataset. The audience rating follows the
/// tomatometer rating, shifted by rating, genre and runtime, with gaussian noise. About five
/// percent of the feature values and two percent of the audience ratings are missing.
pub fn movie_reviews<F: Float, R: Rng>(nsamples: usize, rng: &mut R) -> Result<Frame<F>> {
    let runtime_dist = Uniform::new(80., 180.);
    let tomatometer_dist = Uniform::new(0., 100.);
    let count_dist = Uniform::new(5, 300);

    let mut ratings = Vec::with_capacity(nsamples);
    let mut genres = Vec::with_capacity(nsamples);
    let mut runtimes = Vec::with_capacity(nsamples);
    let mut tomatometer = Vec::with_capacity(nsamples);
    let mut counts = Vec::with_capacity(nsamples);
    let mut audience = Vec::with_capacity(nsamples);

    for _ in 0..nsamples {
        let (rating, rating_shift) = RATINGS[rng.gen_range(0..RATINGS.len())];
        let (genre, genre_shift) = GENRES[rng.gen_range(0..GENRES.len())];
        let runtime: f64 = runtime_dist.sample(rng);
        let score: f64 = tomatometer_dist.sample(rng);
        let count: u32 = count_dist.sample(rng);

        let noise: f64 = rng.sample(StandardNormal);
        let target = 0.6 * score + 25. + rating_shift + genre_shift + 0.05 * (runtime - 120.)
            + NOISE * noise;

        ratings.push(missing_or(rng, rating));
        genres.push(missing_or(rng, genre));
        runtimes.push(missing_or(rng, runtime).unwrap_or(f64::NAN));
        tomatometer.push(missing_or(rng, score).unwrap_or(f64::NAN));
        counts.push(missing_or(rng, count as f64).unwrap_or(f64::NAN));
        audience.push(if rng.gen_bool(MISSING_TARGET) {
            f64::NAN
        } else {
            target.max(0.).min(100.).round()
        });
    }

    let [rating, genre, runtime, score, count] = FEATURES;

    Ok(Frame::new()
        .with_categorical(rating, ratings)?
        .with_categorical(genre, genres)?
        .with_numeric(runtime, cast(runtimes))?
        .with_numeric(score, cast(tomatometer))?
        .with_numeric(count, cast(counts))?
        .with_numeric(TARGET, cast(audience))?)
}

fn missing_or<T, R: Rng>(rng: &mut R, value: T) -> Option<T> {
    if rng.gen_bool(MISSING_FEATURE) {
        None
    } else {
        Some(value)
    }
}

fn cast<F: Float>(values: Vec<f64>) -> Array1<F> {
    values.into_iter().map(F::cast).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotten_tomatoes;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn generates_all_columns_with_missing_values() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let frame: Frame<f64> = movie_reviews(2000, &mut rng)?;

        assert_eq!(frame.nrows(), 2000);
        assert_eq!(frame.ncols(), 6);

        for name in FEATURES.iter() {
            let missing = frame.column(name)?.n_missing();
            assert!(missing > 40 && missing < 180, "{} has {} missing", name, missing);
        }
        assert!(frame.column(TARGET)?.n_missing() > 10);

        let targets = frame.numeric(&[TARGET])?;
        assert!(targets
            .iter()
            .filter(|x| !x.is_nan())
            .all(|&x| (0. ..=100.).contains(&x)));

        Ok(())
    }

    #[test]
    fn same_seed_same_reviews() -> Result<()> {
        let first: Frame<f64> = movie_reviews(50, &mut SmallRng::seed_from_u64(1))?;
        let second: Frame<f64> = movie_reviews(50, &mut SmallRng::seed_from_u64(1))?;

        assert_eq!(first.categorical(&["genre"])?, second.categorical(&["genre"])?);
        assert_eq!(
            first.column("tomatometer_rating")?.n_missing(),
            second.column("tomatometer_rating")?.n_missing()
        );

        Ok(())
    }

    #[test]
    fn loads_like_the_real_reviews() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let frame: Frame<f64> = movie_reviews(500, &mut rng)?;
        let missing_targets = frame.column(TARGET)?.n_missing();

        let dataset = rotten_tomatoes::from_frame(frame)?;
        assert_eq!(dataset.nsamples(), 500 - missing_targets);
        assert_eq!(dataset.nfeatures(), 5);

        Ok(())
    }
}
