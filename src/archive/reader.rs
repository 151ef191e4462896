// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::header::{FileIntegrity, Header};
use crate::{
	error::{Error, Result},
	format::FormatVersion,
};
use tracing::debug;

/// A PakReader takes the bytes of a whole PAK container and slices out the
/// entries listed in its index.
///
/// The lifetime of the [`PakReader`] is tied to the lifetime of the byte
/// buffer that it reads from.
///
/// ```rust,no_run
/// use pakpack::{archive::PakReader, Result};
/// use std::fs;
///
/// fn main() -> Result<()> {
/// 	let pak_file = fs::read("data.pak")?;
/// 	let reader = PakReader::new(&pak_file)?;
///
/// 	println!("data.pak ({}) has {} entries", reader.version(), reader.files().len());
/// 	Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PakReader<'a> {
	version: FormatVersion,
	files: Vec<PakFile<'a>>,
}

impl<'a> PakReader<'a> {
	pub fn new(data: &'a [u8]) -> Result<Self> {
		let (header, begin_offset) = Header::read(&mut &data[..])?;
		let mut files = Vec::with_capacity(header.entries().len());
		for entry in header.entries() {
			let start = begin_offset
				.checked_add(entry.offset())
				.ok_or(Error::Truncated)?;
			let end = start.checked_add(entry.size()).ok_or(Error::Truncated)?;
			if data.len() < end {
				debug!(
					"entry truncated name='{}', data_len={}, start={}, size={}, end={}",
					entry.name(),
					data.len(),
					start,
					entry.size(),
					end
				);
				return Err(Error::Truncated);
			}
			files.push(PakFile {
				name: entry.name().to_owned(),
				data: &data[start..end],
				integrity: entry.integrity().clone(),
			});
		}
		Ok(Self {
			version: header.version(),
			files,
		})
	}

	#[inline]
	pub const fn version(&self) -> FormatVersion {
		self.version
	}

	/// Gets all entries, in archive order.
	#[inline]
	pub fn files(&self) -> &[PakFile<'a>] {
		&self.files
	}
}

/// An entry in a PAK container, with a byte slice referencing the contents,
/// and the integrity details containing its hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PakFile<'a> {
	name: String,
	data: &'a [u8],
	integrity: FileIntegrity,
}

impl<'a> PakFile<'a> {
	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The stored bytes of the entry, not yet verified.
	#[inline]
	pub const fn data(&self) -> &'a [u8] {
		self.data
	}

	#[inline]
	pub const fn integrity(&self) -> &FileIntegrity {
		&self.integrity
	}
}

#[cfg(test)]
mod test {
	use super::PakReader;
	use crate::{archive::PakWriter, error::Error, format::FormatVersion};

	fn two_entries() -> Vec<u8> {
		let mut writer = PakWriter::new(FormatVersion::V3);
		writer.write_file("init.bin", b"first").unwrap();
		writer.write_file("sub/next.bin", b"second").unwrap();
		let mut out = Vec::new();
		writer.finalize(&mut out).unwrap();
		out
	}

	#[test]
	fn entries_keep_their_order() {
		let bytes = two_entries();
		let reader = PakReader::new(&bytes).unwrap();
		assert_eq!(reader.version(), FormatVersion::V3);
		let names: Vec<_> = reader.files().iter().map(|f| f.name()).collect();
		assert_eq!(names, ["init.bin", "sub/next.bin"]);
		assert_eq!(reader.files()[1].data(), b"second");
	}

	#[test]
	fn truncated_data_is_rejected() {
		let mut bytes = two_entries();
		bytes.pop();
		assert!(matches!(PakReader::new(&bytes), Err(Error::Truncated)));
	}
}
