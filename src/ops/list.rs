// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::{ArchiveGateway, ArchiveHandle},
	error::{Error, Result},
};
use std::{io::Write, path::Path};

/// Writes the archive's format version and then one entry name per line.
pub fn list<G: ArchiveGateway>(gateway: &G, archive: &Path, out: &mut dyn Write) -> Result<()> {
	if !archive.is_file() {
		return Err(Error::MissingFile(archive.to_path_buf()));
	}
	let handle = gateway.open(archive)?;
	writeln!(out, "PAK format version: {}", handle.version())?;
	for name in handle.entries() {
		writeln!(out, "{name}")?;
	}
	handle.close();
	Ok(())
}
