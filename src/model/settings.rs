use serde::{Deserialize, Serialize};

fn default_separator() -> char {
	','
}

fn default_to_projected() -> bool {
	true
}

/// Options for one ingestion run. Field aliases accept the payloads sent by
/// the viewer frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSettings {
	pub filename: String,
	#[serde(default = "default_separator", alias = "sep")]
	pub separator: char,
	#[serde(default = "default_to_projected", alias = "to_utm")]
	pub to_projected_coordinates: bool,
	/// Partition the loaded points into this many chunks before export.
	#[serde(default)]
	pub chunk_count: Option<usize>,
}

impl ProcessingSettings {
	pub fn new(filename: &str) -> ProcessingSettings {
		ProcessingSettings {
			filename: filename.to_string(),
			separator: default_separator(),
			to_projected_coordinates: default_to_projected(),
			chunk_count: None,
		}
	}
}

/// Selects the outlier passes to run over an already processed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptSetting {
	pub filename: String,
	#[serde(default, alias = "stat_based")]
	pub use_statistical_outlier_detection: bool,
	#[serde(default, alias = "k_means")]
	pub use_clustering_outlier_detection: bool,
	#[serde(default, alias = "ml")]
	pub use_model_outlier_detection: bool,
}
