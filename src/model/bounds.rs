use crate::model::point::PointRecord;
use ord_subset::OrdSubsetIterExt;

/// Horizontal extent of a survey in projected coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
	pub min_easting: f64,
	pub max_easting: f64,
	pub min_northing: f64,
	pub max_northing: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_easting - self.min_easting
	}

	pub fn height(&self) -> f64 {
		self.max_northing - self.min_northing
	}
}

pub fn find_coordinate_boundaries(points: &[PointRecord]) -> Option<Bounds> {
	let eastings = || points.iter().map(|p| p.easting);
	let northings = || points.iter().map(|p| p.northing);

	Some(Bounds {
		min_easting: eastings().ord_subset_min()?,
		max_easting: eastings().ord_subset_max()?,
		min_northing: northings().ord_subset_min()?,
		max_northing: northings().ord_subset_max()?,
	})
}
