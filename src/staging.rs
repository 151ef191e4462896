// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Rename sequencing around destructive operations.
//!
//! None of these steps are transactional as a whole: a crash between them can
//! leave a `.bak` sibling or a half-filled staging directory behind.

use crate::error::Result;
use rand::{distributions::Alphanumeric, Rng};
use std::{
	ffi::OsString,
	fs,
	path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const BACKUP_SUFFIX: &str = ".bak";

/// Appends `suffix` to the last component of `path`. Trailing separators are
/// dropped first, so `data/` becomes `data.bak` rather than `data/.bak`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(path.components().collect::<PathBuf>());
	name.push(suffix);
	PathBuf::from(name)
}

pub fn backup_path(path: &Path) -> PathBuf {
	with_suffix(path, BACKUP_SUFFIX)
}

/// The directory `path` lives in, which is `.` for a bare file name.
pub fn parent_or_current(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}

/// Moves `path` aside to `<path>.bak`, freeing `path` for the output.
pub fn rotate_to_backup(path: &Path) -> Result<PathBuf> {
	let backup = backup_path(path);
	info!("Moving {:?} to {:?}", path, backup);
	fs::rename(path, &backup)?;
	Ok(backup)
}

/// Creates an empty, randomly named directory next to `beside`.
pub fn create_staging_dir(beside: &Path) -> Result<PathBuf> {
	let parent = parent_or_current(beside);
	let name: String = rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(12)
		.map(char::from)
		.collect();
	let staging = parent.join(format!("{name}.tmp"));
	fs::create_dir(&staging)?;
	debug!("Created staging directory {:?}", staging);
	Ok(staging)
}

/// Replaces the file at `original` with the fully populated `staging`
/// directory, placed at `output`. The original is kept as `<original>.bak`.
pub fn swap_in(original: &Path, staging: &Path, output: &Path) -> Result<PathBuf> {
	let backup = rotate_to_backup(original)?;
	if original.is_file() {
		fs::remove_file(original)?;
	}
	info!("Moving {:?} to {:?}", staging, output);
	fs::rename(staging, output)?;
	Ok(backup)
}
