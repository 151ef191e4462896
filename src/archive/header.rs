// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	error::{Error, Result},
	format::FormatVersion,
};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use std::io::{self, Read, Write};

pub const MAGIC: [u8; 4] = *b"PAKC";
/// Magic, format code, three reserved bytes, index length and entry count.
pub const PREAMBLE_LEN: usize = 16;

/// The preamble and index of a PAK container. Entry data follows it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
	version: FormatVersion,
	entries: Vec<IndexEntry>,
}

impl Header {
	pub const fn new(version: FormatVersion) -> Self {
		Self {
			version,
			entries: Vec::new(),
		}
	}

	#[inline]
	pub const fn version(&self) -> FormatVersion {
		self.version
	}

	/// The index, in archive order.
	#[inline]
	pub fn entries(&self) -> &[IndexEntry] {
		&self.entries
	}

	pub(crate) fn push(&mut self, entry: IndexEntry) {
		self.entries.push(entry);
	}

	/// Reads the header, returning it along with the offset the entry data
	/// starts at.
	pub fn read<R: Read>(data: &mut R) -> Result<(Self, usize)> {
		let mut magic = [0_u8; 4];
		data.read_exact(&mut magic).map_err(truncated)?;
		if magic != MAGIC {
			return Err(Error::InvalidArchive("bad magic"));
		}
		let version = FormatVersion::from_code(data.read_u8().map_err(truncated)?)
			.ok_or(Error::InvalidArchive("unknown format version"))?;
		let mut reserved = [0_u8; 3];
		data.read_exact(&mut reserved).map_err(truncated)?;
		let index_len = read_u32(data, version)? as usize;
		let count = read_u32(data, version)? as usize;

		let mut bytes = Vec::new();
		data.take(index_len as u64).read_to_end(&mut bytes)?;
		if bytes.len() < index_len {
			return Err(Error::Truncated);
		}
		let entries: Vec<IndexEntry> = serde_json::from_slice(&bytes)?;
		if entries.len() != count {
			return Err(Error::InvalidArchive("entry count does not match the index"));
		}
		Ok((Self { version, entries }, PREAMBLE_LEN + index_len))
	}

	/// Writes the header, returning the number of bytes written.
	pub fn write<W: Write>(&self, out: &mut W) -> Result<usize> {
		let json = serde_json::to_vec(&self.entries)?;
		let index_len =
			u32::try_from(json.len()).map_err(|_| Error::InvalidArchive("index too large"))?;
		let count = u32::try_from(self.entries.len())
			.map_err(|_| Error::InvalidArchive("too many entries"))?;
		out.write_all(&MAGIC)?;
		out.write_u8(self.version.code())?;
		out.write_all(&[0; 3])?;
		write_u32(out, self.version, index_len)?;
		write_u32(out, self.version, count)?;
		out.write_all(&json)?;
		Ok(PREAMBLE_LEN + json.len())
	}
}

fn read_u32<R: Read>(data: &mut R, version: FormatVersion) -> Result<u32> {
	let value = if version.is_big_endian() {
		data.read_u32::<BigEndian>()
	} else {
		data.read_u32::<LittleEndian>()
	};
	value.map_err(truncated)
}

fn write_u32<W: Write>(out: &mut W, version: FormatVersion, value: u32) -> io::Result<()> {
	if version.is_big_endian() {
		out.write_u32::<BigEndian>(value)
	} else {
		out.write_u32::<LittleEndian>(value)
	}
}

fn truncated(err: io::Error) -> Error {
	if err.kind() == io::ErrorKind::UnexpectedEof {
		Error::Truncated
	} else {
		Error::Io(err)
	}
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
	/// The `/`-separated name of the entry.
	name: String,
	/// The offset from the end of the header that this entry is located at.
	#[serde_as(as = "DisplayFromStr")]
	offset: usize,
	/// The total size of the entry.
	size: usize,
	/// Integrity details of the entry, such as hashes.
	integrity: FileIntegrity,
}

impl IndexEntry {
	pub const fn new(name: String, offset: usize, size: usize, integrity: FileIntegrity) -> Self {
		Self {
			name,
			offset,
			size,
			integrity,
		}
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The offset from the end of the header that this entry is located at.
	#[inline]
	pub const fn offset(&self) -> usize {
		self.offset
	}

	#[inline]
	pub const fn size(&self) -> usize {
		self.size
	}

	#[inline]
	pub const fn integrity(&self) -> &FileIntegrity {
		&self.integrity
	}
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIntegrity {
	/// The hashing algorithm used to calculate the hash.
	algorithm: HashAlgorithm,
	/// The hash of the entry, in hex format.
	#[serde_as(as = "Hex")]
	hash: Vec<u8>,
	/// The size of each "block" to be hashed in an entry.
	block_size: usize,
	/// The hash of each "block" in an entry.
	#[serde_as(as = "Vec<Hex>")]
	blocks: Vec<Vec<u8>>,
}

impl FileIntegrity {
	pub const fn new(
		algorithm: HashAlgorithm,
		hash: Vec<u8>,
		block_size: usize,
		blocks: Vec<Vec<u8>>,
	) -> Self {
		Self {
			algorithm,
			hash,
			block_size,
			blocks,
		}
	}

	/// The hashing algorithm used to calculate the hash.
	#[inline]
	pub const fn algorithm(&self) -> HashAlgorithm {
		self.algorithm
	}

	#[inline]
	pub fn hash(&self) -> &[u8] {
		&self.hash
	}

	/// The size of each "block" to be hashed in an entry.
	#[inline]
	pub const fn block_size(&self) -> usize {
		self.block_size
	}

	/// The hash of each "block" in an entry.
	#[inline]
	pub fn blocks(&self) -> &[Vec<u8>] {
		&self.blocks
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HashAlgorithm {
	/// The SHA-256 hashing algorithm
	#[serde(rename = "SHA256")]
	Sha256,
}
