// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Validation and normalization of archive entry names.
//!
//! Entry names inside an archive always use `/` as the separator. Names read
//! back from an archive are untrusted: before anything is written to disk they
//! must pass [`is_safe_entry_name`], and they are joined onto the destination
//! with [`extraction_path`], which never climbs out of it.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Names of this length or shorter are rejected, which also catches files
/// that merely look like archives.
pub const MIN_ENTRY_NAME_EXCLUSIVE: usize = 4;

const fn is_entry_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '\\' | '_' | '-')
}

/// Whether an entry name is safe to extract: only ASCII letters, digits,
/// `.`, `/`, `\`, `_` and `-`, longer than four characters, and without any
/// `..` segment.
pub fn is_safe_entry_name(name: &str) -> bool {
	name.len() > MIN_ENTRY_NAME_EXCLUSIVE
		&& name.chars().all(is_entry_char)
		&& !name.split(['/', '\\']).any(|segment| segment == "..")
}

/// Drops every `../` from an entry name.
pub fn strip_parent_segments(name: &str) -> String {
	name.replace("../", "")
}

/// Joins an entry name onto `root`, keeping only normal segments so that the
/// result always stays below `root`.
pub fn extraction_path(root: &Path, name: &str) -> PathBuf {
	name.split(['/', '\\'])
		.filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
		.fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Computes the entry name of `path` relative to `root`: separators become
/// `/`, with none leading or trailing.
pub fn relative_entry_name(root: &Path, path: &Path) -> Result<String> {
	let stripped = path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
		root: root.to_path_buf(),
		path: path.to_path_buf(),
	})?;
	let segments: Vec<String> = stripped
		.components()
		.filter_map(|component| match component {
			Component::Normal(segment) => Some(
				segment
					.to_str()
					.map(str::to_string)
					.unwrap_or_else(|| segment.to_string_lossy().into_owned()),
			),
			_ => None,
		})
		.flat_map(|segment| {
			segment
				.split('\\')
				.filter(|part| !part.is_empty())
				.map(str::to_string)
				.collect::<Vec<_>>()
		})
		.collect();
	if segments.is_empty() {
		return Err(Error::OutsideRoot {
			root: root.to_path_buf(),
			path: path.to_path_buf(),
		});
	}
	Ok(segments.join("/"))
}

fn is_invalid_path_char(c: char) -> bool {
	c.is_control() || matches!(c, '"' | '<' | '>' | '|')
}

/// Cleans a path token taken from a command line: surrounding quotes and
/// characters that cannot appear in a path are removed, as are trailing
/// separators.
pub fn clean_path_token(token: &str) -> String {
	let cleaned: String = token
		.trim_matches('"')
		.chars()
		.filter(|c| !is_invalid_path_char(*c))
		.collect();
	let trimmed = cleaned.trim_end_matches(['/', '\\']);
	if trimmed.is_empty() && !cleaned.is_empty() {
		// a bare root such as "/"
		cleaned[..1].to_string()
	} else {
		trimmed.to_string()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn safe_names() {
		assert!(is_safe_entry_name("a/b.txt"));
		assert!(is_safe_entry_name("field\\map_01.bin"));
		assert!(is_safe_entry_name("init_free.bin"));
	}

	#[test]
	fn unsafe_names() {
		assert!(!is_safe_entry_name("a"));
		assert!(!is_safe_entry_name("abcd"));
		assert!(!is_safe_entry_name("with space.txt"));
		assert!(!is_safe_entry_name("../../etc/passwd"));
		assert!(!is_safe_entry_name("data\\..\\boot.ini"));
		assert!(!is_safe_entry_name("naïve.txt"));
		assert!(!is_safe_entry_name(""));
	}

	#[test]
	fn parent_segments_are_stripped() {
		assert_eq!(strip_parent_segments("../../x/y.bin"), "x/y.bin");
		assert_eq!(strip_parent_segments("a/../b.bin"), "a/b.bin");
	}

	#[test]
	fn extraction_stays_below_root() {
		let root = Path::new("out");
		assert_eq!(extraction_path(root, "a/b.txt"), root.join("a").join("b.txt"));
		assert_eq!(extraction_path(root, "/etc/passwd"), root.join("etc").join("passwd"));
		assert_eq!(extraction_path(root, "a\\..\\b.txt"), root.join("a").join("b.txt"));
		assert_eq!(extraction_path(root, "./c.txt"), root.join("c.txt"));
	}

	#[test]
	fn relative_names_use_forward_slashes() {
		let root = Path::new("/data/root.bak");
		let file = root.join("a").join("b").join("c.txt");
		assert_eq!(relative_entry_name(root, &file).unwrap(), "a/b/c.txt");
	}

	#[test]
	fn relative_names_require_the_prefix() {
		let err = relative_entry_name(Path::new("/data/x"), Path::new("/other/y.txt"));
		assert!(matches!(err, Err(Error::OutsideRoot { .. })));
		let err = relative_entry_name(Path::new("/data/x"), Path::new("/data/x"));
		assert!(matches!(err, Err(Error::OutsideRoot { .. })));
	}

	#[test]
	fn tokens_are_cleaned() {
		assert_eq!(clean_path_token("\"/tmp/my files/\""), "/tmp/my files");
		assert_eq!(clean_path_token("/tmp/a|b<c>.txt"), "/tmp/abc.txt");
		assert_eq!(clean_path_token("plain.txt"), "plain.txt");
		assert_eq!(clean_path_token("/"), "/");
	}
}
