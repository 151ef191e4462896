// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::{ArchiveGateway, ArchiveHandle},
	conflict::ConflictPolicy,
	error::{Error, Result},
	format::FormatVersion,
	staging,
	walk::{self, WalkOptions},
};
use std::{io::Write, path::Path};

/// Packs the directory `input` into a new archive at `output`.
///
/// The directory is first moved aside to `<input>.bak` so that `output` may
/// reuse its path. If anything fails after that move the backup stays where
/// it is and the error names it.
pub fn pack<G: ArchiveGateway>(
	gateway: &G,
	input: &Path,
	format: FormatVersion,
	output: &Path,
	walk: &WalkOptions,
	out: &mut dyn Write,
) -> Result<()> {
	if !input.is_dir() {
		return Err(Error::MissingDirectory(input.to_path_buf()));
	}
	let backup = staging::rotate_to_backup(input)?;
	pack_backup(gateway, &backup, format, output, walk, out).map_err(|source| Error::Staged {
		backup,
		source: Box::new(source),
	})
}

fn pack_backup<G: ArchiveGateway>(
	gateway: &G,
	backup: &Path,
	format: FormatVersion,
	output: &Path,
	walk: &WalkOptions,
	out: &mut dyn Write,
) -> Result<()> {
	let mut archive = gateway.create_empty(format);
	for file in walk::walk_files(backup, backup, walk)? {
		writeln!(out, "Adding {}", file.path.display())?;
		archive.add_file(&file.name, &file.path, ConflictPolicy::Ignore)?;
	}
	writeln!(out, "Saving...")?;
	archive.save(output)
}
