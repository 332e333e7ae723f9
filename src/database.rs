//! Storage contract for loaded soundings.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::point::{PointRecord, UtmZone};

/// One stored row. `id` is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
	pub id: u64,
	pub easting: f64,
	pub northing: f64,
	pub h_depth: f64,
	pub zone_number: Option<u8>,
	pub zone_letter: Option<char>,
	pub chunk_index: String,
}

impl From<&PointRecord> for PersistedRecord {
	fn from(point: &PointRecord) -> PersistedRecord {
		PersistedRecord {
			id: 0,
			easting: point.easting,
			northing: point.northing,
			h_depth: point.depth,
			zone_number: point.zone_number(),
			zone_letter: point.zone_letter(),
			chunk_index: point.chunk_label.clone(),
		}
	}
}

impl From<&PersistedRecord> for PointRecord {
	fn from(record: &PersistedRecord) -> PointRecord {
		let zone = match (record.zone_number, record.zone_letter) {
			(Some(number), Some(letter)) => Some(UtmZone { number, letter }),
			_ => None,
		};
		PointRecord {
			easting: record.easting,
			northing: record.northing,
			depth: record.h_depth,
			zone,
			chunk_label: record.chunk_index.clone(),
		}
	}
}

pub trait RecordStore {
	/// Stores `points` and returns the ids assigned to them, in order.
	fn insert(&mut self, points: &[PointRecord]) -> Result<Vec<u64>>;

	fn select_all(&self) -> Result<Vec<PersistedRecord>>;
}

/// Append-only record table in a CSV file. Ids continue from the highest
/// id already in the file.
pub struct CsvRecordStore {
	path: PathBuf,
	next_id: u64,
}

impl CsvRecordStore {
	pub fn open<P: AsRef<Path>>(path: P) -> Result<CsvRecordStore> {
		let path = path.as_ref().to_path_buf();
		let mut store = CsvRecordStore { path, next_id: 1 };

		if store.path.exists() {
			let last = store.select_all()?.iter().map(|record| record.id).max();
			store.next_id = last.map_or(1, |id| id + 1);
		}
		debug!("Opened record store {} at id {}", store.path.display(), store.next_id);

		Ok(store)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl RecordStore for CsvRecordStore {
	fn insert(&mut self, points: &[PointRecord]) -> Result<Vec<u64>> {
		let is_new = !self.path.exists()
			|| self.path.metadata().map(|meta| meta.len() == 0).unwrap_or(true);
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)?;
		let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);

		let mut ids = Vec::with_capacity(points.len());
		for point in points {
			let mut record = PersistedRecord::from(point);
			record.id = self.next_id;
			writer.serialize(&record)?;

			ids.push(self.next_id);
			self.next_id += 1;
		}
		writer.flush()?;

		debug!("Inserted {} records into {}", ids.len(), self.path.display());
		Ok(ids)
	}

	fn select_all(&self) -> Result<Vec<PersistedRecord>> {
		if !self.path.exists() {
			return Ok(Vec::new());
		}
		let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
		reader
			.deserialize()
			.map(|record| record.map_err(Error::from))
			.collect()
	}
}
