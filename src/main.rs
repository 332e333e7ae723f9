use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};

use rusty_multibeam::catalog::{file_url, list_data_dir, lod_base_names, raw_file_names};
use rusty_multibeam::model::{ProcessingSettings, ScriptSetting};
use rusty_multibeam::pipeline::{process_file, run_scripts};
use rusty_multibeam::PipelineConfig;

#[derive(Parser)]
#[command(name = "mbproc")]
#[command(about = "Multibeam bathymetry ingestion and outlier detection", version)]
struct Cli {
	/// Path to JSON config file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Increase verbosity
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Project a survey file and export LOD point clouds
	Process {
		/// File name inside the data directory
		filename: String,
		#[arg(short, long, default_value_t = ',')]
		separator: char,
		/// Input is already projected easting, northing, depth
		#[arg(long)]
		raw: bool,
		/// Partition into this many chunks before export
		#[arg(long)]
		chunks: Option<usize>,
	},

	/// Run outlier passes over a processed file
	Detect {
		/// Name of `<name>.xyz` inside the data directory
		filename: String,
		#[arg(long)]
		mad: bool,
		#[arg(long)]
		kmeans: bool,
		#[arg(long)]
		ml: bool,
	},

	/// List surveys with LOD files and raw point files
	List,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
	match path {
		Some(path) => {
			let config = PipelineConfig::from_json(path)
				.with_context(|| format!("Failed to load config from {}", path.display()))?;
			info!("Loaded config from: {}", path.display());
			Ok(config)
		}
		None => Ok(PipelineConfig::default()),
	}
}

fn run(cli: Cli) -> anyhow::Result<()> {
	let config = load_config(cli.config.as_ref())?;

	match cli.command {
		Commands::Process {
			filename,
			separator,
			raw,
			chunks,
		} => {
			let settings = ProcessingSettings {
				filename,
				separator,
				to_projected_coordinates: !raw,
				chunk_count: chunks,
			};
			let report = process_file(&settings, &config)
				.with_context(|| format!("Processing {} failed", settings.filename))?;

			println!("{} records", report.records);
			for file in &report.lod_files {
				println!("{} ({} points)", file.path.display(), file.sample_size);
			}
		}
		Commands::Detect {
			filename,
			mad,
			kmeans,
			ml,
		} => {
			let setting = ScriptSetting {
				filename,
				use_statistical_outlier_detection: mad,
				use_clustering_outlier_detection: kmeans,
				use_model_outlier_detection: ml,
			};
			let outputs = run_scripts(&setting, &config)
				.with_context(|| format!("Outlier detection on {} failed", setting.filename))?;

			for output in outputs {
				println!("{}", output.display());
			}
		}
		Commands::List => {
			let files = list_data_dir(&config.data_dir)
				.with_context(|| format!("Cannot list {}", config.data_dir.display()))?;

			println!("LOD surveys:");
			for name in lod_base_names(&files) {
				println!("  {}", name);
			}
			println!("Point files:");
			for name in raw_file_names(&files) {
				println!("  {}", file_url(&config.file_server_url, &name));
			}
		}
	}

	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(match cli.verbose {
			0 => log::LevelFilter::Warn,
			1 => log::LevelFilter::Info,
			_ => log::LevelFilter::Debug,
		})
		.format_timestamp_secs()
		.init();

	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{:#}", e);
			ExitCode::FAILURE
		}
	}
}
