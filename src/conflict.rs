// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::error::{Error, Result};

/// What to do when an entry is written to a name that is already taken.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
	/// Leave the existing entry untouched.
	Ignore,
	/// Overwrite the existing entry.
	Replace,
}

/// The outcome of writing one entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
	Insert,
	Skip,
	Overwrite,
}

impl ConflictPolicy {
	pub const fn resolve(self, exists: bool) -> Resolution {
		match (exists, self) {
			(false, _) => Resolution::Insert,
			(true, Self::Ignore) => Resolution::Skip,
			(true, Self::Replace) => Resolution::Overwrite,
		}
	}
}

/// Whether a single-entry edit may create a new entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EditMode {
	/// Create the entry if needed, otherwise overwrite it.
	Add,
	/// Only overwrite an entry that already exists.
	Replace,
}

impl EditMode {
	/// Decides a single-entry edit of `name`. Replacing a missing entry is an
	/// error and nothing is written.
	pub fn check_entry(self, name: &str, exists: bool) -> Result<Resolution> {
		match (self, exists) {
			(Self::Replace, false) => Err(Error::MissingEntry(name.to_owned())),
			_ => Ok(ConflictPolicy::Replace.resolve(exists)),
		}
	}
}

/// The word announcing a write, as shown to users.
pub const fn action(exists: bool) -> &'static str {
	if exists {
		"Replacing"
	} else {
		"Adding"
	}
}
