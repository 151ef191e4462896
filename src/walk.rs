// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	error::{Error, Result},
	sanitize,
};
use std::{
	io,
	path::{Path, PathBuf},
};
use tracing::debug;
use walkdir::WalkDir;
use wax::{Glob, Pattern};

/// Filters applied to every directory walk.
#[derive(Default)]
pub struct WalkOptions {
	exclude: Vec<Glob<'static>>,
	exclude_hidden: bool,
}

impl WalkOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Skip files whose entry name matches `pattern`.
	pub fn exclude(mut self, pattern: &str) -> Result<Self> {
		let glob = Glob::new(pattern).map_err(|err| Error::InvalidGlob {
			pattern: pattern.to_owned(),
			reason: err.to_string(),
		})?;
		self.exclude.push(glob.into_owned());
		Ok(self)
	}

	/// Skip files whose name starts with a `.`.
	pub fn exclude_hidden(mut self, exclude_hidden: bool) -> Self {
		self.exclude_hidden = exclude_hidden;
		self
	}

	fn is_excluded(&self, path: &Path, name: &str) -> bool {
		let hidden = path
			.file_name()
			.map(|file_name| file_name.to_string_lossy().starts_with('.'))
			.unwrap_or(false);
		(self.exclude_hidden && hidden)
			|| self
				.exclude
				.iter()
				.any(|glob| glob.is_match(Path::new(name)))
	}
}

/// A file found on disk, with the entry name it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
	pub path: PathBuf,
	pub name: String,
}

/// Lists every file below `dir`, naming each one relative to `root`.
pub fn walk_files(dir: &Path, root: &Path, options: &WalkOptions) -> Result<Vec<WalkedFile>> {
	let mut files = Vec::new();
	for entry in WalkDir::new(dir).sort_by_file_name() {
		let entry = entry.map_err(io::Error::from)?;
		if !entry.file_type().is_file() {
			continue;
		}
		let path = entry.into_path();
		let name = sanitize::relative_entry_name(root, &path)?;
		if options.is_excluded(&path, &name) {
			debug!("Excluding {}", name);
			continue;
		}
		files.push(WalkedFile { path, name });
	}
	Ok(files)
}
