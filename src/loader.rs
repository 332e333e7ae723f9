//! Streaming reader for multibeam sounding files.
//!
//! Lines are pulled from disk one at a time, so a caller that consumes the
//! iterators lazily never holds more than one record. Every physical line is
//! a record, blank ones included. Any malformed line ends the stream with an
//! error; there is no skip mode.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::model::point::{PointRecord, RawRecord};
use crate::transformer::UtmTransformer;

pub struct RecordLoader {
	path: PathBuf,
	separator: char,
	max_records: Option<usize>,
	progress_interval: u64,
}

impl RecordLoader {
	pub fn new<P: AsRef<Path>>(path: P, separator: char) -> Result<RecordLoader> {
		if separator == '\n' || separator == '\r' {
			return Err(Error::InvalidConfig(
				"separator must not be a line break".to_string(),
			));
		}

		Ok(RecordLoader {
			path: path.as_ref().to_path_buf(),
			separator,
			max_records: None,
			progress_interval: 100_000,
		})
	}

	pub fn from_config<P: AsRef<Path>>(
		path: P,
		separator: char,
		config: &PipelineConfig,
	) -> Result<RecordLoader> {
		Ok(RecordLoader::new(path, separator)?
			.with_max_records(config.max_records)
			.with_progress_interval(config.progress_interval))
	}

	pub fn with_max_records(mut self, max_records: Option<usize>) -> RecordLoader {
		self.max_records = max_records;
		self
	}

	pub fn with_progress_interval(mut self, interval: u64) -> RecordLoader {
		self.progress_interval = interval.max(1);
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Tokenized lines without any interpretation.
	pub fn raw_records(&self) -> Result<RawRecords<File>> {
		debug!("Opening {} for raw reading", self.path.display());
		Ok(self.raw_records_from(File::open(&self.path)?))
	}

	pub fn raw_records_from<R: Read>(&self, reader: R) -> RawRecords<R> {
		RawRecords {
			lines: BufReader::new(reader).lines(),
			separator: self.separator,
			line: 0,
			limit: self.max_records,
			progress_interval: self.progress_interval,
			finished: false,
		}
	}

	/// Lines of `latitude, longitude, depth` projected to UTM.
	pub fn points(&self) -> Result<PointRecords<File>> {
		Ok(PointRecords {
			raw: self.raw_records()?,
			transformer: UtmTransformer::new()?,
		})
	}

	pub fn points_from<R: Read>(&self, reader: R) -> Result<PointRecords<R>> {
		Ok(PointRecords {
			raw: self.raw_records_from(reader),
			transformer: UtmTransformer::new()?,
		})
	}

	/// Loads the whole file into memory. Geodetic input is projected when
	/// `to_projected` is set, otherwise the lines are taken as already
	/// projected `easting, northing, depth`. Fails without returning a
	/// partial collection.
	pub fn load_points(&self, to_projected: bool) -> Result<Vec<PointRecord>> {
		let points = if to_projected {
			self.points()?.collect::<Result<Vec<_>>>()?
		} else {
			self.raw_records()?
				.map(|raw| raw.and_then(|raw| raw.to_point()))
				.collect::<Result<Vec<_>>>()?
		};

		info!("Loaded {} records from {}", points.len(), self.path.display());
		Ok(points)
	}
}

pub struct RawRecords<R: Read> {
	lines: Lines<BufReader<R>>,
	separator: char,
	line: u64,
	limit: Option<usize>,
	progress_interval: u64,
	finished: bool,
}

impl<R: Read> Iterator for RawRecords<R> {
	type Item = Result<RawRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}
		if let Some(limit) = self.limit {
			if self.line >= limit as u64 {
				self.finished = true;
				return None;
			}
		}

		let text = match self.lines.next()? {
			Ok(text) => text,
			Err(e) => {
				self.finished = true;
				return Some(Err(e.into()));
			}
		};

		self.line += 1;
		if self.line % self.progress_interval == 0 {
			info!("Loaded {} lines", self.line);
		}

		Some(Ok(RawRecord {
			line: self.line,
			fields: text
				.split(self.separator)
				.map(|field| field.trim().to_string())
				.collect(),
		}))
	}
}

pub struct PointRecords<R: Read> {
	raw: RawRecords<R>,
	transformer: UtmTransformer,
}

impl<R: Read> PointRecords<R> {
	fn project(&mut self, raw: RawRecord) -> Result<PointRecord> {
		let mut values = Vec::with_capacity(raw.fields.len());
		for (index, field) in raw.fields.iter().enumerate() {
			let value = field.parse::<f64>().map_err(|_| Error::MalformedRecord {
				line: raw.line,
				message: format!("field {} is not numeric: '{}'", index + 1, field),
			})?;
			values.push(value);
		}

		if values.len() < 3 {
			return Err(Error::MalformedRecord {
				line: raw.line,
				message: format!(
					"expected latitude, longitude and depth, found {} fields",
					values.len()
				),
			});
		}

		let (easting, northing, zone) = self.transformer.to_utm(values[0], values[1])?;
		Ok(PointRecord::projected(easting, northing, values[2], zone))
	}
}

impl<R: Read> Iterator for PointRecords<R> {
	type Item = Result<PointRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		let item = match self.raw.next()? {
			Ok(raw) => self.project(raw),
			Err(e) => Err(e),
		};
		if item.is_err() {
			self.raw.finished = true;
		}
		Some(item)
	}
}
