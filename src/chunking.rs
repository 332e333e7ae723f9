//! Coarse partitioning of a survey into chunks.
//!
//! A chunk is a contiguous run of the (easting, northing) sorted order, not a
//! geographic tile. The last chunk absorbs the integer division remainder.

use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::model::point::PointRecord;

pub fn chunk_label(index: usize) -> String {
	format!("Chunk_{}", index)
}

/// Sorts `points` by easting then northing and labels them `Chunk_1` to
/// `Chunk_<count>`. The first `count - 1` chunks hold `len / count` points.
pub fn partition_into_chunks(points: &mut [PointRecord], count: usize) -> Result<()> {
	if count == 0 {
		return Err(Error::InvalidPartition("chunk count must be at least 1".to_string()));
	}
	if points.is_empty() {
		return Err(Error::InvalidPartition("no points to partition".to_string()));
	}

	points.sort_by(|a, b| {
		a.easting
			.total_cmp(&b.easting)
			.then(a.northing.total_cmp(&b.northing))
	});

	let chunk_size = points.len() / count;
	for (i, point) in points.iter_mut().enumerate() {
		let index = if chunk_size == 0 {
			count
		} else {
			(i / chunk_size + 1).min(count)
		};
		point.chunk_label = chunk_label(index);
	}

	debug!(
		"Partitioned {} points into {} chunks of {} (last {})",
		points.len(),
		count,
		chunk_size,
		points.len() - (count - 1) * chunk_size
	);
	Ok(())
}

/// Points grouped by chunk label, in order of first appearance.
#[derive(Debug, Default)]
pub struct ChunkAssignment {
	labels: Vec<String>,
	groups: HashMap<String, Vec<PointRecord>>,
}

impl ChunkAssignment {
	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	pub fn get(&self, label: &str) -> Option<&[PointRecord]> {
		self.groups.get(label).map(|points| points.as_slice())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[PointRecord])> {
		self.labels
			.iter()
			.map(move |label| (label.as_str(), self.groups[label].as_slice()))
	}

	pub fn total_points(&self) -> usize {
		self.groups.values().map(|points| points.len()).sum()
	}
}

/// Regroups already labelled points. Fails on a point without a label.
pub fn group_by_chunk_index<I>(points: I) -> Result<ChunkAssignment>
where
	I: IntoIterator<Item = PointRecord>,
{
	let mut assignment = ChunkAssignment::default();
	for point in points {
		if !point.has_chunk() {
			return Err(Error::InvalidPartition(
				"point has no chunk label assigned".to_string(),
			));
		}
		match assignment.groups.get_mut(&point.chunk_label) {
			Some(group) => group.push(point),
			None => {
				assignment.labels.push(point.chunk_label.clone());
				assignment
					.groups
					.insert(point.chunk_label.clone(), vec![point]);
			}
		}
	}
	Ok(assignment)
}
