// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::{ArchiveGateway, ArchiveHandle},
	error::{Error, Result},
	sanitize, staging,
};
use std::{
	fs::{self, File},
	io::{self, BufWriter, Write},
	path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Extracts the archive at `input` into the directory `output`, then moves
/// the archive aside to `<input>.bak`. Returns the backup path.
///
/// The first entry name is checked before anything is written; a file whose
/// first name is not a plausible entry name is not treated as an archive.
/// Entries are extracted into a staging directory beside `input`, which only
/// replaces anything once every entry has been written. An unsafe name found
/// part way through aborts the extraction and leaves the staging directory
/// behind.
pub fn unpack<G: ArchiveGateway>(
	gateway: &G,
	input: &Path,
	output: &Path,
	out: &mut dyn Write,
) -> Result<PathBuf> {
	if !input.is_file() {
		return Err(Error::MissingFile(input.to_path_buf()));
	}
	let archive = gateway.open(input)?;
	let entries = archive.entries();
	let first = entries.first().ok_or(Error::EmptyArchive)?;
	if !sanitize::is_safe_entry_name(first) {
		return Err(Error::UnsafeEntryName(first.clone()));
	}
	writeln!(out, "PAK format version: {}", archive.version())?;

	let staging = staging::create_staging_dir(input)?;
	for name in &entries {
		if !sanitize::is_safe_entry_name(name) {
			return Err(Error::UnsafeEntryName(name.clone()));
		}
		let normalized = sanitize::strip_parent_segments(name);
		let target = sanitize::extraction_path(&staging, &normalized);
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut file = BufWriter::new(File::create(&target)?);
		let mut reader = archive.open_entry(name)?;
		writeln!(out, "Extracting {normalized}")?;
		let copied = io::copy(&mut reader, &mut file)?;
		file.flush()?;
		debug!("Wrote {} bytes to {:?}", copied, target);
	}
	archive.close();

	let backup = staging::swap_in(input, &staging, output)?;
	info!("Unpacked {:?} into {:?}", input, output);
	Ok(backup)
}
