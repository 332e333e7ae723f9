use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
	InvalidCoordinate { latitude: f64, longitude: f64 },

	#[error("malformed record at line {line}: {message}")]
	MalformedRecord { line: u64, message: String },

	#[error("invalid partition: {0}")]
	InvalidPartition(String),

	#[error("insufficient data: requested {requested} records, {available} available")]
	InsufficientData { requested: usize, available: usize },

	#[error("model artifact '{path}' missing or incompatible: {reason}")]
	ModelArtifactMissing { path: PathBuf, reason: String },

	#[error("missing column '{column}' in {path}")]
	MissingColumn { column: String, path: PathBuf },

	#[error("length mismatch: expected {expected} values, found {found}")]
	LengthMismatch { expected: usize, found: usize },

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("projection error: {0}")]
	Projection(String),

	#[error("failed to write point cloud '{path}': {message}")]
	PointCloud { path: PathBuf, message: String },

	#[error("clustering failed: {0}")]
	Clustering(String),

	#[error("feature scaling failed: {0}")]
	Preprocessing(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
