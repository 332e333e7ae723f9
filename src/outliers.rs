//! Outlier passes over already processed point files.
//!
//! Every pass reads `<data_dir>/<name>.xyz`, appends a single 0/1 column and
//! writes `<data_dir>/<name>_<suffix>.xyz`. Passes share no state.

pub mod kmeans;
pub mod mad;
pub mod mlp;
pub mod table;

use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::outliers::table::PointTable;

pub use kmeans::KMeansDetector;
pub use mad::MadDetector;
pub use mlp::{ModelDetector, OutlierClassifier};

pub trait OutlierDetector {
	/// Appended to the input name to form the output file name.
	fn suffix(&self) -> &'static str;

	/// Name of the appended column.
	fn column(&self) -> &'static str;

	fn detect(&self, table: &PointTable) -> Result<Vec<bool>>;
}

pub fn input_file_name(name: &str) -> String {
	format!("{}.xyz", name)
}

pub fn output_file_name(name: &str, suffix: &str) -> String {
	format!("{}_{}.xyz", name, suffix)
}

/// Runs one pass end to end and returns the path of the written file.
pub fn run_detector(detector: &dyn OutlierDetector, data_dir: &Path, name: &str) -> Result<PathBuf> {
	let table = PointTable::read(&data_dir.join(input_file_name(name)))?;
	let flags = detector.detect(&table)?;

	let output = data_dir.join(output_file_name(name, detector.suffix()));
	table.write_with_column(&output, detector.column(), &flags)?;

	info!(
		"{} pass flagged {} of {} records, written to {}",
		detector.suffix(),
		flags.iter().filter(|flag| **flag).count(),
		flags.len(),
		output.display()
	);
	Ok(output)
}
