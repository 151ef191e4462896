// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::{ArchiveGateway, ArchiveHandle},
	conflict::ConflictPolicy,
	error::{Error, Result},
	format::FormatVersion,
	sanitize,
	walk::{self, WalkOptions, WalkedFile},
};
use std::{
	env, fs,
	io::Write,
	path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Packs loose files and directories into one new archive.
///
/// The archive is written into the parent directory of the last path given,
/// and is named after that directory. Entry names are relative to it.
/// Returns the path of the written archive.
pub fn pack_or_add<G: ArchiveGateway>(
	gateway: &G,
	format: FormatVersion,
	tokens: &[String],
	walk: &WalkOptions,
	out: &mut dyn Write,
) -> Result<PathBuf> {
	let mut directory = env::current_dir()?;
	let mut inputs = Vec::new();
	for token in tokens {
		let cleaned = sanitize::clean_path_token(token);
		let path = Path::new(&cleaned);
		if !path.exists() {
			warn!("Skipping {}, no such file or directory", cleaned);
			continue;
		}
		let path = fs::canonicalize(path)?;
		if let Some(parent) = path.parent() {
			directory = parent.to_path_buf();
		}
		debug!("Input {:?}, output directory {:?}", path, directory);
		inputs.push(path);
	}
	if inputs.is_empty() {
		return Err(Error::NoInputs);
	}
	let output = directory.join(
		directory
			.file_name()
			.ok_or_else(|| Error::NoArchiveName(directory.clone()))?,
	);

	let mut archive = gateway.create_empty(format);
	for input in &inputs {
		let files = if input.is_dir() {
			walk::walk_files(input, &directory, walk)?
		} else {
			vec![WalkedFile {
				name: sanitize::relative_entry_name(&directory, input)?,
				path: input.clone(),
			}]
		};
		for file in files {
			writeln!(out, "Adding {}", file.path.display())?;
			archive.add_file(&file.name, &file.path, ConflictPolicy::Ignore)?;
		}
	}
	writeln!(out, "Saving...")?;
	archive.save(&output)?;
	info!("Packed {} inputs into {:?}", inputs.len(), output);
	Ok(output)
}
