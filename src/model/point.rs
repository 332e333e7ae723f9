use crate::error::{Error, Result};

/// UTM grid zone. Number and letter always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
	pub number: u8,
	pub letter: char,
}

impl UtmZone {
	pub fn is_northern(&self) -> bool {
		self.letter >= 'N'
	}
}

/// A single sounding in projected coordinates.
///
/// `zone` is `None` only for records read from files that were already
/// projected, where the zone is not part of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
	pub easting: f64,
	pub northing: f64,
	pub depth: f64,
	pub zone: Option<UtmZone>,
	pub chunk_label: String,
}

impl PointRecord {
	pub fn projected(easting: f64, northing: f64, depth: f64, zone: UtmZone) -> PointRecord {
		PointRecord {
			easting,
			northing,
			depth,
			zone: Some(zone),
			chunk_label: String::new(),
		}
	}

	pub fn unzoned(easting: f64, northing: f64, depth: f64) -> PointRecord {
		PointRecord {
			easting,
			northing,
			depth,
			zone: None,
			chunk_label: String::new(),
		}
	}

	pub fn zone_number(&self) -> Option<u8> {
		self.zone.map(|zone| zone.number)
	}

	pub fn zone_letter(&self) -> Option<char> {
		self.zone.map(|zone| zone.letter)
	}

	pub fn has_chunk(&self) -> bool {
		!self.chunk_label.is_empty()
	}
}

/// Tokenized line from a file read without coordinate transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
	pub line: u64,
	pub fields: Vec<String>,
}

impl RawRecord {
	/// Interprets the first three fields as easting, northing and depth.
	/// Any further fields are auxiliary columns and are ignored.
	pub fn to_point(&self) -> Result<PointRecord> {
		if self.fields.len() < 3 {
			return Err(Error::MalformedRecord {
				line: self.line,
				message: format!("expected at least 3 fields, found {}", self.fields.len()),
			});
		}
		let easting = self.parse_field(0)?;
		let northing = self.parse_field(1)?;
		let depth = self.parse_field(2)?;

		Ok(PointRecord::unzoned(easting, northing, depth))
	}

	fn parse_field(&self, index: usize) -> Result<f64> {
		let value = self.fields[index].trim();
		value.parse::<f64>().map_err(|_| Error::MalformedRecord {
			line: self.line,
			message: format!("field {} is not numeric: '{}'", index + 1, value),
		})
	}
}
