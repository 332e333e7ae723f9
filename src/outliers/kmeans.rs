use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use log::debug;
use ndarray::{Array2, ArrayView1, Axis};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::error::{Error, Result};
use crate::outliers::mad::median;
use crate::outliers::table::PointTable;
use crate::outliers::OutlierDetector;

pub const CLUSTER_FEATURES: [&str; 3] = ["lat", "lon", "depth"];

/// Flags records lying further from their nearest cluster centre than the
/// median record does.
pub struct KMeansDetector {
	clusters: usize,
	seed: u64,
	max_iterations: u64,
}

impl KMeansDetector {
	pub fn new(clusters: usize, seed: u64, max_iterations: u64) -> KMeansDetector {
		KMeansDetector {
			clusters,
			seed,
			max_iterations,
		}
	}

	/// Fits the clustering and returns each record's distance to its
	/// nearest centre.
	pub fn centre_distances(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
		if self.clusters == 0 {
			return Err(Error::InvalidConfig("k-means needs at least one cluster".to_string()));
		}
		if features.nrows() < self.clusters {
			return Err(Error::InsufficientData {
				requested: self.clusters,
				available: features.nrows(),
			});
		}

		let rng = Xoshiro256Plus::seed_from_u64(self.seed);
		let dataset = DatasetBase::from(features.clone());
		let model = KMeans::params_with_rng(self.clusters, rng)
			.max_n_iterations(self.max_iterations)
			.tolerance(1e-4)
			.fit(&dataset)
			.map_err(|e| Error::Clustering(e.to_string()))?;

		let centroids = model.centroids();
		debug!("Fitted {} cluster centres", centroids.nrows());

		Ok(features
			.axis_iter(Axis(0))
			.map(|record| {
				centroids
					.axis_iter(Axis(0))
					.map(|centre| euclidean(record, centre))
					.fold(f64::INFINITY, f64::min)
			})
			.collect())
	}
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
	a.iter()
		.zip(b.iter())
		.map(|(x, y)| (x - y) * (x - y))
		.sum::<f64>()
		.sqrt()
}

impl OutlierDetector for KMeansDetector {
	fn suffix(&self) -> &'static str {
		"kmeans"
	}

	fn column(&self) -> &'static str {
		"kmeans_outlier"
	}

	fn detect(&self, table: &PointTable) -> Result<Vec<bool>> {
		let columns = CLUSTER_FEATURES
			.iter()
			.map(|name| table.column(name))
			.collect::<Result<Vec<_>>>()?;
		let features = Array2::from_shape_fn((table.len(), columns.len()), |(row, col)| {
			columns[col][row]
		});

		let distances = self.centre_distances(&features)?;
		let threshold = match median(&distances) {
			Some(threshold) => threshold,
			None => return Ok(vec![false; distances.len()]),
		};
		debug!("Median distance to cluster centre {}", threshold);

		Ok(distances.iter().map(|d| *d > threshold).collect())
	}
}
