// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The narrow interface the workflow engine uses to read and write archives,
//! and the container backend shipped with this crate.
//!
//! Operations only ever see [`ArchiveGateway`] and [`ArchiveHandle`]. The
//! [`PakGateway`] backend stores entries in a simple versioned container
//! (preamble, JSON index, entry data); any other codec can be plugged in by
//! implementing the same two traits.

mod header;
mod integrity;
mod pak;
mod reader;
mod writer;

pub use header::{FileIntegrity, HashAlgorithm, Header, IndexEntry, MAGIC};
pub use integrity::BLOCK_SIZE;
pub use pak::{PakArchive, PakGateway};
pub use reader::{PakFile, PakReader};
pub use writer::PakWriter;

use crate::{
	conflict::{ConflictPolicy, Resolution},
	error::Result,
	format::FormatVersion,
};
use std::{
	io::Read,
	path::{Path, PathBuf},
};

/// Where the bytes of a new entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
	Bytes(Vec<u8>),
	/// A file on disk, read when the archive is saved.
	File(PathBuf),
}

/// Opens existing archives and creates new ones.
pub trait ArchiveGateway {
	type Handle: ArchiveHandle;

	/// Opens the archive at `path`, detecting its format version.
	fn open(&self, path: &Path) -> Result<Self::Handle>;

	/// Creates an empty archive that will be written as `version`.
	fn create_empty(&self, version: FormatVersion) -> Self::Handle;
}

/// An open archive. Dropping a handle without saving discards its changes.
pub trait ArchiveHandle {
	/// The version detected at open time, or chosen at creation.
	fn version(&self) -> FormatVersion;

	fn exists(&self, name: &str) -> bool;

	/// Writes an entry under `name`, resolving a clash with `policy`.
	fn add_entry(
		&mut self,
		name: &str,
		source: EntrySource,
		policy: ConflictPolicy,
	) -> Result<Resolution>;

	fn add_file(&mut self, name: &str, source: &Path, policy: ConflictPolicy) -> Result<Resolution> {
		self.add_entry(name, EntrySource::File(source.to_path_buf()), policy)
	}

	/// Entry names in the archive's own order.
	fn entries(&self) -> Vec<String>;

	fn open_entry(&self, name: &str) -> Result<Box<dyn Read + '_>>;

	/// Writes the archive to `output` and closes it.
	fn save(self, output: &Path) -> Result<()>
	where
		Self: Sized;

	/// Closes the archive without writing anything.
	fn close(self)
	where
		Self: Sized,
	{
	}
}
