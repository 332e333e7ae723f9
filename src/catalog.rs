//! File naming conventions of the data directory.

use std::fs;
use std::path::Path;

use crate::error::Result;

const LOD_MARKER: &str = "_lod_";

/// Unique survey names among LOD file names, in order of first appearance.
/// `mb_raw_lod_120.pcd` lists as `mb_raw`.
pub fn lod_base_names<S: AsRef<str>>(file_names: &[S]) -> Vec<String> {
	let mut names: Vec<String> = Vec::new();
	for name in file_names.iter().map(|name| name.as_ref()) {
		if !name.contains("lod") {
			continue;
		}
		let base = name.split(LOD_MARKER).next().unwrap_or(name);
		if !names.iter().any(|known| known == base) {
			names.push(base.to_string());
		}
	}
	names
}

pub fn raw_file_names<S: AsRef<str>>(file_names: &[S]) -> Vec<String> {
	file_names
		.iter()
		.map(|name| name.as_ref())
		.filter(|name| name.ends_with(".xyz"))
		.map(|name| name.to_string())
		.collect()
}

/// Sorted names of the regular files in `dir`.
pub fn list_data_dir(dir: &Path) -> Result<Vec<String>> {
	let mut names = Vec::new();
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		if entry.file_type()?.is_file() {
			names.push(entry.file_name().to_string_lossy().into_owned());
		}
	}
	names.sort();
	Ok(names)
}

pub fn file_url(server_url: &str, file_name: &str) -> String {
	format!("{}/{}", server_url.trim_end_matches('/'), file_name)
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::tempdir;

	use crate::catalog::{file_url, list_data_dir, lod_base_names, raw_file_names};

	#[test]
	fn test_lod_base_names() {
		let files = [
			"mb_raw_lod_12.pcd",
			"mb_raw_lod_120.pcd",
			"mb_raw.xyz",
			"ridge_lod_5.pcd",
		];
		assert_eq!(lod_base_names(&files), vec!["mb_raw", "ridge"]);
	}

	#[test]
	fn test_raw_file_names() {
		let files = ["mb_raw.xyz", "mb_raw_lod_12.pcd", "mb_raw_mad.xyz", "notes.txt"];
		assert_eq!(raw_file_names(&files), vec!["mb_raw.xyz", "mb_raw_mad.xyz"]);
	}

	#[test]
	fn test_list_data_dir() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		fs::write(dir.path().join("b.xyz"), "")?;
		fs::write(dir.path().join("a_lod_1.pcd"), "")?;
		fs::create_dir(dir.path().join("nested"))?;

		assert_eq!(list_data_dir(dir.path())?, vec!["a_lod_1.pcd", "b.xyz"]);
		Ok(())
	}

	#[test]
	fn test_file_url() {
		assert_eq!(
			file_url("http://127.0.0.1:3333/", "mb_raw_lod_12.pcd"),
			"http://127.0.0.1:3333/mb_raw_lod_12.pcd"
		);
		assert_eq!(file_url("http://host", "a.xyz"), "http://host/a.xyz");
	}
}
