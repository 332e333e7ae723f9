//! Run configuration, passed explicitly to every component.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
	/// Directory holding input surveys and all derived files.
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,

	/// Base URL of the static file server that exposes `data_dir`.
	#[serde(default = "default_file_server_url")]
	pub file_server_url: String,

	/// Upper bound on records loaded from one survey file.
	#[serde(default = "default_max_records")]
	pub max_records: Option<usize>,

	/// Loader progress is logged every this many records.
	#[serde(default = "default_progress_interval")]
	pub progress_interval: u64,

	#[serde(default = "default_lod_fractions")]
	pub lod_fractions: Vec<f64>,

	/// Fixed seed for LOD sampling. Entropy seeded when absent.
	#[serde(default)]
	pub sample_seed: Option<u64>,

	/// CSV record store that loaded points are persisted to, if any.
	#[serde(default)]
	pub record_store: Option<PathBuf>,

	#[serde(default)]
	pub outliers: OutlierConfig,
}

fn default_data_dir() -> PathBuf {
	PathBuf::from("data")
}

fn default_file_server_url() -> String {
	"http://127.0.0.1:3333/".to_string()
}

fn default_max_records() -> Option<usize> {
	Some(10_000_000)
}

fn default_progress_interval() -> u64 {
	100_000
}

fn default_lod_fractions() -> Vec<f64> {
	vec![0.1, 0.2, 0.5, 1.0]
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
			file_server_url: default_file_server_url(),
			max_records: default_max_records(),
			progress_interval: default_progress_interval(),
			lod_fractions: default_lod_fractions(),
			sample_seed: None,
			record_store: None,
			outliers: OutlierConfig::default(),
		}
	}
}

impl PipelineConfig {
	pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
		Self {
			data_dir: data_dir.as_ref().to_path_buf(),
			..Self::default()
		}
	}

	pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		let config: PipelineConfig = serde_json::from_str(&content)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.lod_fractions.is_empty() {
			return Err(Error::InvalidConfig("no LOD fractions configured".to_string()));
		}
		if let Some(fraction) = self
			.lod_fractions
			.iter()
			.find(|f| !(**f > 0.0 && **f <= 1.0))
		{
			return Err(Error::InvalidConfig(format!(
				"LOD fraction {} outside (0, 1]",
				fraction
			)));
		}
		if self.progress_interval == 0 {
			return Err(Error::InvalidConfig("progress interval must be positive".to_string()));
		}
		self.outliers.validate()
	}

	pub fn data_path(&self, file_name: &str) -> PathBuf {
		self.data_dir.join(file_name)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
	/// Points deviating more than `mad_factor * MAD` from the median are flagged.
	#[serde(default = "default_mad_factor")]
	pub mad_factor: f64,

	/// Floor applied to the MAD before scaling. 0.0 flags every point off the
	/// median when more than half the depths are identical.
	#[serde(default)]
	pub min_mad: f64,

	#[serde(default = "default_kmeans_clusters")]
	pub kmeans_clusters: usize,

	#[serde(default)]
	pub kmeans_seed: u64,

	#[serde(default = "default_kmeans_max_iterations")]
	pub kmeans_max_iterations: u64,

	#[serde(default = "default_model_path")]
	pub model_path: PathBuf,
}

fn default_mad_factor() -> f64 {
	3.0
}

fn default_kmeans_clusters() -> usize {
	4
}

fn default_kmeans_max_iterations() -> u64 {
	300
}

fn default_model_path() -> PathBuf {
	PathBuf::from("models/mlp_model.json")
}

impl Default for OutlierConfig {
	fn default() -> Self {
		Self {
			mad_factor: default_mad_factor(),
			min_mad: 0.0,
			kmeans_clusters: default_kmeans_clusters(),
			kmeans_seed: 0,
			kmeans_max_iterations: default_kmeans_max_iterations(),
			model_path: default_model_path(),
		}
	}
}

impl OutlierConfig {
	pub fn validate(&self) -> Result<()> {
		if !(self.mad_factor >= 0.0) || !(self.min_mad >= 0.0) {
			return Err(Error::InvalidConfig(
				"MAD factor and floor must be non-negative".to_string(),
			));
		}
		if self.kmeans_clusters == 0 {
			return Err(Error::InvalidConfig("k-means needs at least one cluster".to_string()));
		}
		Ok(())
	}
}
