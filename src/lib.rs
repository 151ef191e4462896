// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![warn(
	clippy::perf,
	clippy::complexity,
	clippy::style,
	clippy::correctness,
	clippy::missing_const_for_fn
)]
#![allow(clippy::tabs_in_doc_comments, clippy::too_many_arguments)]

//! This crate drives PAK archive workflows: packing a directory into an
//! archive, unpacking one back out, patching entries in place, and listing
//! what an archive holds. It also folds several launches of the same program
//! into a single packing run.
//!
//! # Examples
//!
//! ## Packing a directory
//! ```rust,no_run
//! use pakpack::{CommandTable, DispatchOptions, Dispatcher, PakGateway, Result};
//! use std::io;
//!
//! fn main() -> Result<()> {
//! 	let table = CommandTable::new();
//! 	let options = DispatchOptions::default();
//! 	let mut dispatcher = Dispatcher::new(&table, &PakGateway, &options, io::stdout());
//! 	let argv: Vec<String> = ["pack", "data", "v2", "data.pak"]
//! 		.iter()
//! 		.map(|s| s.to_string())
//! 		.collect();
//! 	dispatcher.dispatch(&argv)
//! }
//! ```
//!
//! ## Listing an archive
//! ```rust,no_run
//! use pakpack::{ArchiveGateway, ArchiveHandle, PakGateway, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//! 	let archive = PakGateway.open(Path::new("data.pak"))?;
//! 	println!("PAK format version: {}", archive.version());
//! 	for name in archive.entries() {
//! 		println!("{}", name);
//! 	}
//! 	Ok(())
//! }
//! ```
//!
//! # License
//!
//! `pakpack` is licensed under either the [MIT license](LICENSE-MIT) or the
//! [Apache License 2.0](LICENSE-APACHE), at the choice of the user.

/// The archive backend: container layout, reading, writing and integrity.
pub mod archive;
/// What happens when an entry name is written twice.
pub mod conflict;
pub mod coordinator;
pub mod dispatch;
/// Error handling for every workflow.
pub mod error;
/// Archive format versions and their names.
pub mod format;
/// The workflows behind each command.
pub mod ops;
/// Entry name validation and normalization.
pub mod sanitize;
pub mod staging;
/// Directory walking with exclusion filters.
pub mod walk;

pub use archive::{ArchiveGateway, ArchiveHandle, EntrySource, PakArchive, PakGateway};
pub use conflict::{ConflictPolicy, EditMode, Resolution};
pub use coordinator::{InstanceCoordinator, ProcessIntrospector, SystemIntrospector};
pub use dispatch::{Command, CommandTable, DispatchOptions, Dispatcher, EditTarget, Operation};
pub use error::{Error, ErrorKind, Result};
pub use format::FormatVersion;
pub use walk::WalkOptions;
