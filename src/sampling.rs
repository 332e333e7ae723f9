use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

pub const LOD_FRACTIONS: [f64; 4] = [0.1, 0.2, 0.5, 1.0];

/// Number of records drawn for `fraction` of `population`, rounded down.
pub fn sample_size(fraction: f64, population: usize) -> usize {
	(fraction * population as f64).floor() as usize
}

/// Uniform sampling without replacement.
pub struct Sampler<R: Rng> {
	rng: R,
}

impl Sampler<StdRng> {
	pub fn seeded(seed: Option<u64>) -> Sampler<StdRng> {
		let rng = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};
		Sampler { rng }
	}
}

impl<R: Rng> Sampler<R> {
	pub fn new(rng: R) -> Sampler<R> {
		Sampler { rng }
	}

	/// Draws `amount` distinct items in random order. Drawing the whole
	/// population still shuffles it.
	pub fn sample<'a, T>(&mut self, population: &'a [T], amount: usize) -> Result<Vec<&'a T>> {
		if amount > population.len() {
			return Err(Error::InsufficientData {
				requested: amount,
				available: population.len(),
			});
		}

		Ok(index::sample(&mut self.rng, population.len(), amount)
			.into_iter()
			.map(|i| &population[i])
			.collect())
	}

	pub fn sample_fraction<'a, T>(&mut self, population: &'a [T], fraction: f64) -> Result<Vec<&'a T>> {
		self.sample(population, sample_size(fraction, population.len()))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use crate::error::Error;
	use crate::sampling::{sample_size, Sampler, LOD_FRACTIONS};

	#[test]
	fn test_sample_size_rounds_down() {
		assert_eq!(sample_size(0.1, 10), 1);
		assert_eq!(sample_size(0.2, 10), 2);
		assert_eq!(sample_size(0.5, 7), 3);
		assert_eq!(sample_size(1.0, 7), 7);
		assert_eq!(sample_size(0.1, 5), 0);
	}

	#[test]
	fn test_full_fraction_resamples_every_record_once() {
		let population: Vec<u32> = (0..10).collect();
		let mut sampler = Sampler::seeded(Some(3));
		let sample = sampler.sample_fraction(&population, 1.0).unwrap();

		assert_eq!(sample.len(), 10);
		let unique: HashSet<u32> = sample.iter().map(|v| **v).collect();
		assert_eq!(unique.len(), 10);
	}

	#[test]
	fn test_samples_are_distinct_members() {
		let population: Vec<u32> = (0..1000).map(|v| v * 3).collect();
		let mut sampler = Sampler::seeded(Some(42));

		for fraction in LOD_FRACTIONS {
			let sample = sampler.sample_fraction(&population, fraction).unwrap();
			assert_eq!(sample.len(), sample_size(fraction, population.len()));

			let unique: HashSet<u32> = sample.iter().map(|v| **v).collect();
			assert_eq!(unique.len(), sample.len());
			assert!(unique.iter().all(|v| v % 3 == 0 && *v < 3000));
		}
	}

	#[test]
	fn test_seeded_sampling_is_reproducible() {
		let population: Vec<u32> = (0..500).collect();
		let first = Sampler::seeded(Some(9)).sample(&population, 50).unwrap();
		let second = Sampler::seeded(Some(9)).sample(&population, 50).unwrap();

		assert_eq!(first, second);
	}

	#[test]
	fn test_oversized_sample() {
		let population = [1, 2, 3];
		let result = Sampler::seeded(None).sample(&population, 4);

		assert!(matches!(
			result,
			Err(Error::InsufficientData {
				requested: 4,
				available: 3
			})
		));
	}
}
