// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::{
	header::FileIntegrity, reader::PakReader, writer::PakWriter, ArchiveGateway, ArchiveHandle,
	EntrySource,
};
use crate::{
	conflict::{ConflictPolicy, Resolution},
	error::{Error, Result},
	format::FormatVersion,
	staging,
};
use std::{
	collections::HashMap,
	fs::{self, File},
	io::{self, BufReader, BufWriter, Read},
	path::Path,
};
use tracing::{debug, info};

/// Opens and creates [`PakArchive`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PakGateway;

impl PakGateway {
	pub const fn new() -> Self {
		Self
	}
}

impl ArchiveGateway for PakGateway {
	type Handle = PakArchive;

	fn open(&self, path: &Path) -> Result<PakArchive> {
		PakArchive::open(path)
	}

	fn create_empty(&self, version: FormatVersion) -> PakArchive {
		PakArchive::new(version)
	}
}

#[derive(Debug)]
enum Slot {
	Stored {
		data: Vec<u8>,
		integrity: FileIntegrity,
	},
	Added(EntrySource),
}

/// An archive held in memory. The file it was opened from is not kept open,
/// so it can be saved back over itself.
#[derive(Debug)]
pub struct PakArchive {
	version: FormatVersion,
	entries: Vec<(String, Slot)>,
	index: HashMap<String, usize>,
}

impl PakArchive {
	pub fn new(version: FormatVersion) -> Self {
		Self {
			version,
			entries: Vec::new(),
			index: HashMap::new(),
		}
	}

	pub fn open(path: &Path) -> Result<Self> {
		info!("Opening archive at {:?}", path);
		let bytes = fs::read(path)?;
		Self::from_bytes(&bytes)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let reader = PakReader::new(bytes)?;
		let mut archive = Self::new(reader.version());
		for file in reader.files() {
			archive.insert(file.name().to_owned(), Slot::Stored {
				data: file.data().to_vec(),
				integrity: file.integrity().clone(),
			});
		}
		debug!(
			"Read {} entries from a {} archive",
			archive.entries.len(),
			archive.version
		);
		Ok(archive)
	}

	fn insert(&mut self, name: String, slot: Slot) {
		match self.index.get(&name) {
			Some(&idx) => self.entries[idx].1 = slot,
			None => {
				self.index.insert(name.clone(), self.entries.len());
				self.entries.push((name, slot));
			}
		}
	}

	fn write_to(writer: PakWriter, path: &Path) -> Result<()> {
		let mut out = BufWriter::new(File::create(path)?);
		writer.finalize(&mut out)?;
		out.into_inner()
			.map_err(|err| err.into_error())?
			.sync_all()?;
		Ok(())
	}
}

impl ArchiveHandle for PakArchive {
	fn version(&self) -> FormatVersion {
		self.version
	}

	fn exists(&self, name: &str) -> bool {
		self.index.contains_key(name)
	}

	fn add_entry(
		&mut self,
		name: &str,
		source: EntrySource,
		policy: ConflictPolicy,
	) -> Result<Resolution> {
		if name.len() > self.version.max_name_len() {
			return Err(Error::EntryNameTooLong {
				name: name.to_owned(),
				limit: self.version.max_name_len(),
				version: self.version,
			});
		}
		let resolution = policy.resolve(self.exists(name));
		match resolution {
			Resolution::Skip => debug!("Keeping existing entry {}", name),
			Resolution::Insert | Resolution::Overwrite => {
				debug!("Writing entry {} ({:?})", name, resolution);
				self.insert(name.to_owned(), Slot::Added(source));
			}
		}
		Ok(resolution)
	}

	fn entries(&self) -> Vec<String> {
		self.entries.iter().map(|(name, _)| name.clone()).collect()
	}

	fn open_entry(&self, name: &str) -> Result<Box<dyn Read + '_>> {
		let (_, slot) = self
			.index
			.get(name)
			.map(|&idx| &self.entries[idx])
			.ok_or_else(|| Error::EntryNotFound(name.to_owned()))?;
		Ok(match slot {
			Slot::Stored { data, integrity } => {
				integrity.verify(name, data)?;
				Box::new(&data[..])
			}
			Slot::Added(EntrySource::Bytes(data)) => Box::new(&data[..]),
			Slot::Added(EntrySource::File(path)) => Box::new(BufReader::new(File::open(path)?)),
		})
	}

	fn save(self, output: &Path) -> Result<()> {
		info!("Saving {} entries to {:?}", self.entries.len(), output);
		let mut writer = PakWriter::new(self.version);
		for (name, slot) in self.entries {
			let bytes = match slot {
				Slot::Stored { data, .. } | Slot::Added(EntrySource::Bytes(data)) => data,
				Slot::Added(EntrySource::File(path)) => match fs::read(&path) {
					Ok(bytes) => bytes,
					Err(err) if err.kind() == io::ErrorKind::NotFound => {
						return Err(Error::MissingSource(path))
					}
					Err(err) => return Err(err.into()),
				},
			};
			writer.write_file(name, bytes)?;
		}

		let temp = staging::with_suffix(output, ".tmp");
		if let Err(err) = Self::write_to(writer, &temp) {
			let _ = fs::remove_file(&temp);
			return Err(err);
		}
		fs::rename(&temp, output)?;
		Ok(())
	}
}
