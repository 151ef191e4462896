// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{coordinator::PeerFailure, format::FormatVersion};
use serde_json::Error as JsonError;
use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error as ThisError;

/// Which part of the workflow a failure belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Bad paths, unknown verbs or formats, missing arguments or entries.
	UserInput,
	/// The archive itself is unreadable, empty, or holds unsafe entry names.
	ArchiveIntegrity,
	/// Another instance of this program could not be queried or stopped.
	Process,
	/// The filesystem refused an operation.
	Io,
}

#[derive(Debug, ThisError)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] IoError),
	#[error("JSON error: {0}")]
	Json(#[from] JsonError),

	#[error("Invalid command specified.")]
	UnknownCommand(String),
	#[error("Expected at least {expected} arguments for '{command}', got {actual}.")]
	InsufficientArguments {
		command: &'static str,
		expected: usize,
		actual: usize,
	},
	#[error("Invalid format specified: '{0}'.")]
	UnknownFormat(String),
	#[error("Input directory doesn't exist: {}", .0.display())]
	MissingDirectory(PathBuf),
	#[error("Input file doesn't exist: {}", .0.display())]
	MissingFile(PathBuf),
	#[error("Specified entry doesn't exist: {0}")]
	MissingEntry(String),
	#[error("Specified replacement file doesn't exist: {}", .0.display())]
	MissingSource(PathBuf),
	#[error("None of the given paths exist")]
	NoInputs,
	#[error("Cannot name an archive after {}", .0.display())]
	NoArchiveName(PathBuf),
	#[error("Entry name '{name}' is longer than the {limit} bytes {version} allows")]
	EntryNameTooLong {
		name: String,
		limit: usize,
		version: FormatVersion,
	},
	#[error("Entry {0} was written twice")]
	FileAlreadyWritten(String),
	#[error("'{}' is not a prefix of '{}'", root.display(), path.display())]
	OutsideRoot { root: PathBuf, path: PathBuf },
	#[error("Invalid glob '{pattern}': {reason}")]
	InvalidGlob { pattern: String, reason: String },

	#[error("Invalid PAK file: {0}")]
	InvalidArchive(&'static str),
	#[error("Archive is truncated")]
	Truncated,
	#[error("Archive contains no entries")]
	EmptyArchive,
	#[error("Archive entry name '{0}' is not safe to extract")]
	UnsafeEntryName(String),
	#[error("Archive has no entry named '{0}'")]
	EntryNotFound(String),
	#[error(
		"Hash mismatch in {name}{}: expected {}, got {}",
		.block.map(|idx| format!(" (block {idx})")).unwrap_or_default(),
		hex::encode(.expected),
		hex::encode(.actual)
	)]
	HashMismatch {
		name: String,
		block: Option<usize>,
		expected: Vec<u8>,
		actual: Vec<u8>,
	},

	#[error("Could not identify the running process: {0}")]
	CurrentProcess(String),
	#[error("Could not recover the command line of process {pid}: {failure}")]
	PeerUnavailable { pid: u32, failure: PeerFailure },
	#[error("Failed to terminate process {0}")]
	KillFailed(u32),

	#[error("{source} (original input kept at {})", backup.display())]
	Staged {
		backup: PathBuf,
		#[source]
		source: Box<Error>,
	},
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::UnknownCommand(_)
			| Self::InsufficientArguments { .. }
			| Self::UnknownFormat(_)
			| Self::MissingDirectory(_)
			| Self::MissingFile(_)
			| Self::MissingEntry(_)
			| Self::MissingSource(_)
			| Self::NoInputs
			| Self::NoArchiveName(_)
			| Self::EntryNameTooLong { .. }
			| Self::FileAlreadyWritten(_)
			| Self::OutsideRoot { .. }
			| Self::InvalidGlob { .. } => ErrorKind::UserInput,
			Self::Json(_)
			| Self::InvalidArchive(_)
			| Self::Truncated
			| Self::EmptyArchive
			| Self::UnsafeEntryName(_)
			| Self::EntryNotFound(_)
			| Self::HashMismatch { .. } => ErrorKind::ArchiveIntegrity,
			Self::CurrentProcess(_) | Self::PeerUnavailable { .. } | Self::KillFailed(_) => {
				ErrorKind::Process
			}
			Self::Staged { source, .. } => source.kind(),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
