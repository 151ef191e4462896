// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::error::Error;
use std::{fmt, str::FromStr};

/// The on-disk variants a PAK archive can be written in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormatVersion {
	V1,
	V2,
	V2BigEndian,
	V3,
	V3BigEndian,
}

impl FormatVersion {
	/// Every version, in the order they are listed to users.
	pub const ALL: [Self; 5] = [
		Self::V1,
		Self::V2,
		Self::V2BigEndian,
		Self::V3,
		Self::V3BigEndian,
	];

	/// The name used for this version on the command line.
	pub const fn name(self) -> &'static str {
		match self {
			Self::V1 => "v1",
			Self::V2 => "v2",
			Self::V2BigEndian => "v2be",
			Self::V3 => "v3",
			Self::V3BigEndian => "v3be",
		}
	}

	/// Looks a version up by its command-line name. Names are case-sensitive.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|version| version.name() == name)
	}

	/// The byte identifying this version in an archive preamble.
	pub const fn code(self) -> u8 {
		match self {
			Self::V1 => 1,
			Self::V2 => 2,
			Self::V2BigEndian => 3,
			Self::V3 => 4,
			Self::V3BigEndian => 5,
		}
	}

	pub fn from_code(code: u8) -> Option<Self> {
		Self::ALL.into_iter().find(|version| version.code() == code)
	}

	/// Whether the integers in the preamble are stored big-endian.
	pub const fn is_big_endian(self) -> bool {
		matches!(self, Self::V2BigEndian | Self::V3BigEndian)
	}

	/// The longest entry name, in bytes, this version can store.
	pub const fn max_name_len(self) -> usize {
		match self {
			Self::V1 => 252,
			Self::V2 | Self::V2BigEndian => 32,
			Self::V3 | Self::V3BigEndian => 24,
		}
	}
}

impl fmt::Display for FormatVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for FormatVersion {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_name(s).ok_or_else(|| Error::UnknownFormat(s.to_owned()))
	}
}
