// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::header::{FileIntegrity, Header, IndexEntry};
use crate::{
	error::{Error, Result},
	format::FormatVersion,
};
use std::{collections::HashSet, io::Write};

/// Builds a PAK container in memory.
pub struct PakWriter {
	header: Header,
	names: HashSet<String>,
	buffer: Vec<u8>,
	offset: usize,
}

impl PakWriter {
	pub fn new(version: FormatVersion) -> Self {
		Self {
			header: Header::new(version),
			names: HashSet::new(),
			buffer: Vec::new(),
			offset: 0,
		}
	}

	/// Write an entry to the container.
	/// This appends the contents to the writer, adds the entry to the index,
	/// and updates the offset.
	pub fn write_file(&mut self, name: impl Into<String>, bytes: impl AsRef<[u8]>) -> Result<()> {
		self.write_file_impl(name.into(), bytes.as_ref())
	}

	fn write_file_impl(&mut self, name: String, bytes: &[u8]) -> Result<()> {
		let version = self.header.version();
		if name.len() > version.max_name_len() {
			return Err(Error::EntryNameTooLong {
				name,
				limit: version.max_name_len(),
				version,
			});
		}
		if !self.names.insert(name.clone()) {
			return Err(Error::FileAlreadyWritten(name));
		}
		let entry = IndexEntry::new(name, self.offset, bytes.len(), FileIntegrity::compute(bytes));
		self.buffer.extend_from_slice(bytes);
		self.offset += bytes.len();
		self.header.push(entry);
		Ok(())
	}

	/// Finalizes the container, writing the header + entries to the writer.
	pub fn finalize<FinalWriter>(self, mut final_writer: FinalWriter) -> Result<usize>
	where
		FinalWriter: Write,
	{
		let mut written = self.header.write(&mut final_writer)?;
		final_writer.write_all(&self.buffer)?;
		written += self.buffer.len();
		final_writer.flush()?;
		Ok(written)
	}
}
