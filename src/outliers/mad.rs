use log::warn;
use ord_subset::OrdSubsetSliceExt;

use crate::error::Result;
use crate::outliers::table::PointTable;
use crate::outliers::OutlierDetector;

/// Median of the finite values, averaging the middle pair for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
	let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
	if sorted.is_empty() {
		return None;
	}
	sorted.ord_subset_sort();

	let mid = sorted.len() / 2;
	if sorted.len() % 2 == 0 {
		Some((sorted[mid - 1] + sorted[mid]) / 2.0)
	} else {
		Some(sorted[mid])
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct MadStatistics {
	pub median: f64,
	pub mad: f64,
}

/// Median and median absolute deviation from it.
pub fn mad_statistics(values: &[f64]) -> Option<MadStatistics> {
	let median = median(values)?;
	let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
	let mad = self::median(&deviations)?;

	Some(MadStatistics { median, mad })
}

/// Flags values deviating from the median by more than
/// `factor * max(mad, min_mad)`. Non-finite values are never flagged.
pub fn flag_mad_outliers(values: &[f64], factor: f64, min_mad: f64) -> Vec<bool> {
	let stats = match mad_statistics(values) {
		Some(stats) => stats,
		None => return vec![false; values.len()],
	};
	if stats.mad == 0.0 {
		warn!(
			"Median absolute deviation is zero (median {}), floor {} applies",
			stats.median, min_mad
		);
	}

	let threshold = factor * stats.mad.max(min_mad);
	values
		.iter()
		.map(|v| (v - stats.median).abs() > threshold)
		.collect()
}

pub struct MadDetector {
	factor: f64,
	min_mad: f64,
}

impl MadDetector {
	pub fn new(factor: f64, min_mad: f64) -> MadDetector {
		MadDetector { factor, min_mad }
	}
}

impl OutlierDetector for MadDetector {
	fn suffix(&self) -> &'static str {
		"mad"
	}

	fn column(&self) -> &'static str {
		"mad_outlier"
	}

	fn detect(&self, table: &PointTable) -> Result<Vec<bool>> {
		let depths = table.column_with_missing("depth")?;
		Ok(flag_mad_outliers(&depths, self.factor, self.min_mad))
	}
}

#[cfg(test)]
mod tests {
	use crate::outliers::mad::{flag_mad_outliers, mad_statistics, median};

	#[test]
	fn test_median() {
		assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
		assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
		assert_eq!(median(&[f64::NAN, 5.0]), Some(5.0));
		assert_eq!(median(&[]), None);
	}

	#[test]
	fn test_mad_flags_single_outlier() {
		let depths = [1.0, 2.0, 3.0, 4.0, 100.0];
		let stats = mad_statistics(&depths).unwrap();

		assert_eq!(stats.median, 3.0);
		assert_eq!(stats.mad, 1.0);
		assert_eq!(
			flag_mad_outliers(&depths, 3.0, 0.0),
			vec![false, false, false, false, true]
		);
	}

	#[test]
	fn test_threshold_is_strict() {
		// median 0, mad 1, threshold 3: exactly 3 away is kept
		let values = [-1.0, 0.0, 0.0, 1.0, 3.0];
		assert_eq!(
			flag_mad_outliers(&values, 3.0, 0.0),
			vec![false, false, false, false, false]
		);
	}

	#[test]
	fn test_zero_mad_without_floor_flags_off_median_points() {
		let depths = [-50.0, -50.0, -50.0, -50.1, -49.9];
		assert_eq!(
			flag_mad_outliers(&depths, 3.0, 0.0),
			vec![false, false, false, true, true]
		);
	}

	#[test]
	fn test_zero_mad_with_floor() {
		let depths = [-50.0, -50.0, -50.0, -50.1, -49.9, -80.0];
		assert_eq!(
			flag_mad_outliers(&depths, 3.0, 0.5),
			vec![false, false, false, false, false, true]
		);
	}

	#[test]
	fn test_identical_depths_flag_nothing() {
		assert_eq!(flag_mad_outliers(&[7.0; 4], 3.0, 0.0), vec![false; 4]);
	}
}
