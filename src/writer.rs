use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use pcd_rs::{DataKind, PcdDeserialize, PcdSerialize, Reader, Writer, WriterInit};
use rand::Rng;

use crate::error::{Error, Result};
use crate::model::point::PointRecord;
use crate::sampling::{sample_size, Sampler};

/// On-disk layout of an LOD point. Depth is the vertical (y) axis of the
/// viewer, so northing goes to z.
#[derive(Debug, Clone, PartialEq, PcdSerialize, PcdDeserialize)]
pub struct PcdPoint {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl From<&PointRecord> for PcdPoint {
	fn from(point: &PointRecord) -> PcdPoint {
		PcdPoint {
			x: point.easting,
			y: point.depth,
			z: point.northing,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct LodFile {
	pub path: PathBuf,
	pub fraction: f64,
	pub sample_size: usize,
}

pub fn lod_file_name(basename: &str, sample_size: usize) -> String {
	format!("{}_lod_{}.pcd", basename, sample_size)
}

/// Forwards to `inner` until the first I/O error, then discards everything.
/// pcd-rs panics when its writer drops before `finish` succeeds, so the error
/// is held in `error` and reported once the writer is finished.
struct LatchedWriter<'a, W> {
	inner: W,
	error: &'a mut Option<io::Error>,
}

impl<'a, W: Write> Write for LatchedWriter<'a, W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if self.error.is_none() {
			if let Err(e) = self.inner.write_all(buf) {
				*self.error = Some(e);
			}
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		if self.error.is_none() {
			if let Err(e) = self.inner.flush() {
				*self.error = Some(e);
			}
		}
		Ok(())
	}
}

impl<'a, W: Seek> Seek for LatchedWriter<'a, W> {
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		if self.error.is_none() {
			match self.inner.seek(pos) {
				Ok(position) => return Ok(position),
				Err(e) => *self.error = Some(e),
			}
		}
		Ok(0)
	}
}

fn encode_pcd<W: Write + Seek>(out: W, points: &[&PointRecord]) -> pcd_rs::anyhow::Result<()> {
	let mut failure = None;
	let mut writer: Writer<PcdPoint, _> = WriterInit {
		width: points.len() as u64,
		height: 1,
		viewpoint: Default::default(),
		data_kind: DataKind::Binary,
		schema: None,
	}
	.build_from_writer(LatchedWriter {
		inner: out,
		error: &mut failure,
	})?;

	let pushed = points
		.iter()
		.try_for_each(|point| writer.push(&PcdPoint::from(*point)));
	writer.finish()?;
	pushed?;

	match failure {
		Some(e) => Err(e.into()),
		None => Ok(()),
	}
}

pub fn write_pcd(path: &Path, points: &[&PointRecord]) -> Result<()> {
	let pcd_error = |e: pcd_rs::anyhow::Error| Error::PointCloud {
		path: path.to_path_buf(),
		message: e.to_string(),
	};

	let mut out = BufWriter::new(File::create(path)?);
	encode_pcd(&mut out, points).map_err(pcd_error)?;
	out.flush().map_err(|e| pcd_error(e.into()))?;

	Ok(())
}

pub fn read_pcd(path: &Path) -> Result<Vec<PcdPoint>> {
	let pcd_error = |e: pcd_rs::anyhow::Error| Error::PointCloud {
		path: path.to_path_buf(),
		message: e.to_string(),
	};

	let reader: Reader<PcdPoint, _> = Reader::open(path).map_err(pcd_error)?;
	reader.collect::<std::result::Result<Vec<_>, _>>().map_err(pcd_error)
}

/// Writes one randomly sampled PCD file per fraction into `dir`.
pub fn write_lods<R: Rng>(
	points: &[PointRecord],
	basename: &str,
	dir: &Path,
	fractions: &[f64],
	sampler: &mut Sampler<R>,
) -> Result<Vec<LodFile>> {
	let mut files = Vec::with_capacity(fractions.len());

	for &fraction in fractions {
		let amount = sample_size(fraction, points.len());
		let selected = sampler.sample(points, amount)?;
		let path = dir.join(lod_file_name(basename, selected.len()));

		debug!("Writing {} of {} points to {}", selected.len(), points.len(), path.display());
		write_pcd(&path, &selected)?;

		files.push(LodFile {
			path,
			fraction,
			sample_size: selected.len(),
		});
	}

	info!("Exported {} LOD files for {}", files.len(), basename);
	Ok(files)
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::io::{self, Cursor, Seek, SeekFrom, Write};

	use rand::prelude::*;
	use tempfile::tempdir;

	use crate::error::Error;
	use crate::model::point::PointRecord;
	use crate::sampling::{Sampler, LOD_FRACTIONS};
	use crate::writer::{encode_pcd, lod_file_name, read_pcd, write_lods, write_pcd, PcdPoint};

	/// Accepts `capacity` bytes, then fails every write.
	struct FullDisk {
		written: usize,
		capacity: usize,
	}

	impl Write for FullDisk {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			if self.written + buf.len() > self.capacity {
				return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
			}
			self.written += buf.len();
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl Seek for FullDisk {
		fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
			Ok(self.written as u64)
		}
	}

	fn setup_points(count: usize) -> Vec<PointRecord> {
		let mut rng = StdRng::seed_from_u64(5);
		(0..count)
			.map(|i| {
				PointRecord::unzoned(
					300_000.0 + i as f64,
					rng.gen_range(1_770_000.0..1_780_000.0),
					rng.gen_range(-4100.0..-3900.0),
				)
			})
			.collect()
	}

	#[test]
	fn test_axis_mapping() {
		let point = PointRecord::unzoned(1.0, 2.0, -3.0);
		assert_eq!(PcdPoint::from(&point), PcdPoint { x: 1.0, y: -3.0, z: 2.0 });
	}

	#[test]
	fn test_write_and_read_pcd() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		let path = dir.path().join("points.pcd");
		let points = setup_points(25);
		let refs: Vec<&PointRecord> = points.iter().collect();

		write_pcd(&path, &refs)?;
		let read = read_pcd(&path)?;

		assert_eq!(read.len(), 25);
		assert_eq!(read[0], PcdPoint::from(&points[0]));
		assert_eq!(read[24], PcdPoint::from(&points[24]));

		Ok(())
	}

	#[test]
	fn test_write_lods() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		let points = setup_points(200);
		let mut sampler = Sampler::seeded(Some(1));

		let files = write_lods(&points, "survey", dir.path(), &LOD_FRACTIONS, &mut sampler)?;

		let sizes: Vec<usize> = files.iter().map(|f| f.sample_size).collect();
		assert_eq!(sizes, vec![20, 40, 100, 200]);

		for file in &files {
			assert_eq!(
				file.path,
				dir.path().join(lod_file_name("survey", file.sample_size))
			);
			let read = read_pcd(&file.path)?;
			assert_eq!(read.len(), file.sample_size);

			// easting is unique per source point
			let eastings: HashSet<u64> = read.iter().map(|p| p.x.to_bits()).collect();
			assert_eq!(eastings.len(), read.len());
			assert!(read.iter().all(|p| p.x >= 300_000.0 && p.x < 300_200.0));
		}

		Ok(())
	}

	#[test]
	fn test_failed_write_returns_error() {
		let points = setup_points(100);
		let refs: Vec<&PointRecord> = points.iter().collect();
		let out = FullDisk {
			written: 0,
			capacity: 400,
		};

		let result = encode_pcd(out, &refs);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("no space left"));
	}

	#[test]
	fn test_encode_in_memory() -> Result<(), Box<dyn std::error::Error>> {
		let points = setup_points(3);
		let refs: Vec<&PointRecord> = points.iter().collect();
		let mut buffer = Cursor::new(Vec::new());

		encode_pcd(&mut buffer, &refs).map_err(|e| e.to_string())?;
		assert!(buffer.get_ref().starts_with(b"# .PCD"));
		Ok(())
	}

	#[test]
	fn test_write_into_missing_directory() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		let path = dir.path().join("missing").join("points.pcd");
		let points = setup_points(2);
		let refs: Vec<&PointRecord> = points.iter().collect();

		assert!(matches!(write_pcd(&path, &refs), Err(Error::Io(_))));
		Ok(())
	}

	#[test]
	fn test_lod_file_name() {
		assert_eq!(lod_file_name("mb_raw", 1234), "mb_raw_lod_1234.pcd");
	}
}
