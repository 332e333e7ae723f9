//! Geodetic (WGS84 latitude/longitude) to UTM conversion.
//!
//! Zone selection follows the usual UTM rules including the Norway and
//! Svalbard exceptions; the projection itself is delegated to proj4rs, one
//! cached `Proj` per zone and hemisphere.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{Error, Result};
use crate::model::point::UtmZone;

const WGS84_GEOGRAPHIC: &str = "+proj=longlat +datum=WGS84 +no_defs";

const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

pub const MIN_LATITUDE: f64 = -80.0;
pub const MAX_LATITUDE: f64 = 84.0;

pub fn check_coordinate(latitude: f64, longitude: f64) -> Result<()> {
	if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude)
		|| !(-180.0..=180.0).contains(&longitude)
	{
		return Err(Error::InvalidCoordinate {
			latitude,
			longitude,
		});
	}
	Ok(())
}

pub fn zone_number(latitude: f64, longitude: f64) -> u8 {
	// 180 wraps into zone 1
	let longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;

	if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
		return 32;
	}

	if (72.0..=84.0).contains(&latitude) && longitude >= 0.0 {
		if longitude < 9.0 {
			return 31;
		} else if longitude < 21.0 {
			return 33;
		} else if longitude < 33.0 {
			return 35;
		} else if longitude < 42.0 {
			return 37;
		}
	}

	(((longitude + 180.0) / 6.0) as u8 % 60) + 1
}

pub fn zone_letter(latitude: f64) -> char {
	let index = ((latitude - MIN_LATITUDE) / 8.0) as usize;
	ZONE_LETTERS[index.min(ZONE_LETTERS.len() - 1)] as char
}

fn zone_projection(number: u8, south: bool) -> Result<Proj> {
	let definition = format!(
		"+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
		number,
		if south { " +south" } else { "" }
	);
	Proj::from_proj_string(&definition)
		.map_err(|e| Error::Projection(format!("invalid UTM zone {}: {:?}", number, e)))
}

pub struct UtmTransformer {
	geographic: Proj,
	zones: HashMap<(u8, bool), Proj>,
}

impl UtmTransformer {
	pub fn new() -> Result<UtmTransformer> {
		let geographic = Proj::from_proj_string(WGS84_GEOGRAPHIC)
			.map_err(|e| Error::Projection(format!("{:?}", e)))?;

		Ok(UtmTransformer {
			geographic,
			zones: HashMap::new(),
		})
	}

	/// Returns `(easting, northing, zone)`. Southern hemisphere northings
	/// carry the 10 000 km false northing.
	pub fn to_utm(&mut self, latitude: f64, longitude: f64) -> Result<(f64, f64, UtmZone)> {
		check_coordinate(latitude, longitude)?;

		let zone = UtmZone {
			number: zone_number(latitude, longitude),
			letter: zone_letter(latitude),
		};
		let target = match self.zones.entry((zone.number, latitude < 0.0)) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(zone_projection(zone.number, latitude < 0.0)?),
		};

		let mut point = (longitude.to_radians(), latitude.to_radians(), 0.0);
		transform(&self.geographic, target, &mut point)
			.map_err(|e| Error::Projection(format!("{:?}", e)))?;

		Ok((point.0, point.1, zone))
	}

	/// Inverse of [`UtmTransformer::to_utm`], returns `(latitude, longitude)`.
	pub fn to_latlon(&mut self, easting: f64, northing: f64, zone: UtmZone) -> Result<(f64, f64)> {
		let south = !zone.is_northern();
		let source = match self.zones.entry((zone.number, south)) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(zone_projection(zone.number, south)?),
		};

		let mut point = (easting, northing, 0.0);
		transform(source, &self.geographic, &mut point)
			.map_err(|e| Error::Projection(format!("{:?}", e)))?;

		Ok((point.1.to_degrees(), point.0.to_degrees()))
	}
}
