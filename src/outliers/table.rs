use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::debug;

use crate::error::{Error, Result};

/// A comma separated point-attribute file with a header row, kept as text so
/// untouched columns are written back verbatim.
pub struct PointTable {
	path: PathBuf,
	headers: StringRecord,
	rows: Vec<StringRecord>,
}

impl PointTable {
	pub fn read(path: &Path) -> Result<PointTable> {
		let mut reader = ReaderBuilder::new()
			.has_headers(true)
			.trim(Trim::All)
			.from_path(path)?;

		let headers = reader.headers()?.clone();
		let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
		debug!("Read {} rows from {}", rows.len(), path.display());

		Ok(PointTable {
			path: path.to_path_buf(),
			headers,
			rows,
		})
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn headers(&self) -> &StringRecord {
		&self.headers
	}

	fn column_index(&self, name: &str) -> Result<usize> {
		self.headers
			.iter()
			.position(|header| header == name)
			.ok_or_else(|| Error::MissingColumn {
				column: name.to_string(),
				path: self.path.clone(),
			})
	}

	/// Numeric column. Any unparsable cell is an error.
	pub fn column(&self, name: &str) -> Result<Vec<f64>> {
		let index = self.column_index(name)?;
		self.rows
			.iter()
			.enumerate()
			.map(|(i, row)| {
				let cell = row.get(index).unwrap_or("");
				cell.parse::<f64>().map_err(|_| Error::MalformedRecord {
					// header is line 1
					line: i as u64 + 2,
					message: format!("column '{}' is not numeric: '{}'", name, cell),
				})
			})
			.collect()
	}

	/// Numeric column where empty cells read as NaN.
	pub fn column_with_missing(&self, name: &str) -> Result<Vec<f64>> {
		let index = self.column_index(name)?;
		self.rows
			.iter()
			.enumerate()
			.map(|(i, row)| match row.get(index).unwrap_or("") {
				"" => Ok(f64::NAN),
				cell => cell.parse::<f64>().map_err(|_| Error::MalformedRecord {
					line: i as u64 + 2,
					message: format!("column '{}' is not numeric: '{}'", name, cell),
				}),
			})
			.collect()
	}

	/// Writes the table to `path` with `flags` appended as a 0/1 column.
	pub fn write_with_column(&self, path: &Path, name: &str, flags: &[bool]) -> Result<()> {
		if flags.len() != self.rows.len() {
			return Err(Error::LengthMismatch {
				expected: self.rows.len(),
				found: flags.len(),
			});
		}

		let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

		let mut headers = self.headers.clone();
		headers.push_field(name);
		writer.write_record(&headers)?;

		for (row, flag) in self.rows.iter().zip(flags) {
			let mut row = row.clone();
			row.push_field(if *flag { "1" } else { "0" });
			writer.write_record(&row)?;
		}
		writer.flush()?;

		Ok(())
	}
}
