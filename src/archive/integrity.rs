// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::header::{FileIntegrity, HashAlgorithm};
use crate::error::{Error, Result};
use sha2::{digest::FixedOutputReset, Digest, Sha256};
use std::cell::RefCell;

pub const BLOCK_SIZE: usize = 4 * 1024 * 1024; // 4 MiB

thread_local! {
	pub static SHA256: RefCell<Sha256> = RefCell::new(Sha256::new());
}

impl HashAlgorithm {
	pub fn hash(&self, data: &[u8]) -> Vec<u8> {
		match self {
			Self::Sha256 => SHA256.with(|hasher| {
				let mut hasher = hasher.borrow_mut();
				hasher.update(data);
				hasher.finalize_fixed_reset().to_vec()
			}),
		}
	}

	pub fn hash_blocks(&self, block_size: usize, data: &[u8]) -> Vec<Vec<u8>> {
		data.chunks(block_size).map(|block| self.hash(block)).collect()
	}
}

impl FileIntegrity {
	/// Hashes `data` with the default algorithm and block size.
	pub fn compute(data: &[u8]) -> Self {
		let algorithm = HashAlgorithm::Sha256;
		Self::new(
			algorithm,
			algorithm.hash(data),
			BLOCK_SIZE,
			algorithm.hash_blocks(BLOCK_SIZE, data),
		)
	}

	/// Checks `data` against the recorded block hashes, then the whole-entry
	/// hash.
	pub fn verify(&self, name: &str, data: &[u8]) -> Result<()> {
		let algorithm = self.algorithm();
		let block_size = self.block_size();
		let blocks = self.blocks();
		if block_size > 0 && !blocks.is_empty() {
			for (idx, (block, expected_hash)) in data.chunks(block_size).zip(blocks).enumerate() {
				let hash = algorithm.hash(block);
				if hash != *expected_hash {
					return Err(Error::HashMismatch {
						name: name.to_owned(),
						block: Some(idx + 1),
						expected: expected_hash.to_owned(),
						actual: hash,
					});
				}
			}
		}
		let hash = algorithm.hash(data);
		if hash != self.hash() {
			return Err(Error::HashMismatch {
				name: name.to_owned(),
				block: None,
				expected: self.hash().to_owned(),
				actual: hash,
			});
		}
		Ok(())
	}
}
