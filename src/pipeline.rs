//! Ingestion and outlier runs over files in the data directory.

use std::path::{Path, PathBuf};

use log::info;

use crate::chunking::partition_into_chunks;
use crate::config::PipelineConfig;
use crate::database::{CsvRecordStore, RecordStore};
use crate::error::{Error, Result};
use crate::loader::RecordLoader;
use crate::model::bounds::{find_coordinate_boundaries, Bounds};
use crate::model::settings::{ProcessingSettings, ScriptSetting};
use crate::outliers::{run_detector, KMeansDetector, MadDetector, ModelDetector};
use crate::sampling::Sampler;
use crate::writer::{write_lods, LodFile};

#[derive(Debug)]
pub struct ProcessReport {
	pub records: usize,
	pub bounds: Option<Bounds>,
	pub chunks: Option<usize>,
	pub lod_files: Vec<LodFile>,
}

/// Output files are named after the input file without its extension.
pub fn output_basename(filename: &str) -> Result<String> {
	Path::new(filename)
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.filter(|stem| !stem.is_empty())
		.ok_or_else(|| Error::InvalidConfig(format!("'{}' has no file name", filename)))
}

/// Loads `<data_dir>/<filename>`, optionally partitions the records, exports
/// one LOD file per configured fraction and finally persists the records.
pub fn process_file(settings: &ProcessingSettings, config: &PipelineConfig) -> Result<ProcessReport> {
	let basename = output_basename(&settings.filename)?;
	let path = config.data_path(&settings.filename);
	info!("Processing {}", path.display());

	let loader = RecordLoader::from_config(&path, settings.separator, config)?;
	let mut points = loader.load_points(settings.to_projected_coordinates)?;

	let bounds = find_coordinate_boundaries(&points);
	if let Some(bounds) = &bounds {
		info!(
			"Easting {} to {}, northing {} to {} ({:.1} m x {:.1} m)",
			bounds.min_easting,
			bounds.max_easting,
			bounds.min_northing,
			bounds.max_northing,
			bounds.width(),
			bounds.height()
		);
	}

	if let Some(count) = settings.chunk_count {
		partition_into_chunks(&mut points, count)?;
		info!("Partitioned into {} chunks", count);
	}

	let mut sampler = Sampler::seeded(config.sample_seed);
	let lod_files = write_lods(
		&points,
		&basename,
		&config.data_dir,
		&config.lod_fractions,
		&mut sampler,
	)?;

	if let Some(store_path) = &config.record_store {
		let ids = CsvRecordStore::open(store_path)?.insert(&points)?;
		info!("Persisted {} records to {}", ids.len(), store_path.display());
	}

	Ok(ProcessReport {
		records: points.len(),
		bounds,
		chunks: settings.chunk_count,
		lod_files,
	})
}

/// Runs the selected outlier passes over `<data_dir>/<filename>.xyz` in the
/// order statistical, clustering, model. Stops at the first failing pass.
pub fn run_scripts(setting: &ScriptSetting, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
	let outliers = &config.outliers;
	let mut outputs = Vec::new();

	if setting.use_statistical_outlier_detection {
		let detector = MadDetector::new(outliers.mad_factor, outliers.min_mad);
		outputs.push(run_detector(&detector, &config.data_dir, &setting.filename)?);
	}
	if setting.use_clustering_outlier_detection {
		let detector = KMeansDetector::new(
			outliers.kmeans_clusters,
			outliers.kmeans_seed,
			outliers.kmeans_max_iterations,
		);
		outputs.push(run_detector(&detector, &config.data_dir, &setting.filename)?);
	}
	if setting.use_model_outlier_detection {
		let detector = ModelDetector::from_artifact(&outliers.model_path)?;
		outputs.push(run_detector(&detector, &config.data_dir, &setting.filename)?);
	}

	if outputs.is_empty() {
		info!("No outlier pass selected for {}", setting.filename);
	}
	Ok(outputs)
}
