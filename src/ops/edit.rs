// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::{ArchiveGateway, ArchiveHandle},
	conflict::{self, ConflictPolicy, EditMode},
	dispatch::EditTarget,
	error::{Error, Result},
	walk::{self, WalkOptions},
};
use std::{io::Write, path::Path};
use tracing::info;

/// Writes `target` into the archive at `archive` and saves the result to
/// `output`.
///
/// Whole directories are merged whatever the mode: existing entries are
/// overwritten and new ones appended. A single entry in [`EditMode::Replace`]
/// must already exist.
pub fn edit<G: ArchiveGateway>(
	gateway: &G,
	mode: EditMode,
	archive: &Path,
	target: &EditTarget,
	output: &Path,
	walk: &WalkOptions,
	out: &mut dyn Write,
) -> Result<()> {
	if !archive.is_file() {
		return Err(Error::MissingFile(archive.to_path_buf()));
	}
	let mut handle = gateway.open(archive)?;
	match target {
		EditTarget::Directory(dir) => {
			for file in walk::walk_files(dir, dir, walk)? {
				let action = conflict::action(handle.exists(&file.name));
				writeln!(out, "{action} {}", file.path.display())?;
				handle.add_file(&file.name, &file.path, ConflictPolicy::Replace)?;
			}
		}
		EditTarget::Entry { name, source } => {
			let exists = handle.exists(name);
			mode.check_entry(name, exists)?;
			if !source.is_file() {
				return Err(Error::MissingSource(source.clone()));
			}
			writeln!(out, "{} {name}", conflict::action(exists))?;
			handle.add_file(name, source, ConflictPolicy::Replace)?;
		}
	}
	writeln!(out, "Saving...")?;
	handle.save(output)?;
	info!("Saved {:?}", output);
	Ok(())
}
