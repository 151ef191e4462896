// SPDX-License-Identifier: Apache-2.0 OR MIT
use clap::{ArgAction, Parser};
use pakpack::{DispatchOptions, WalkOptions};

const COMMANDS_HELP: &str = "\
COMMANDS:
    pack <dir> <format> [out]            Pack a directory into an archive
    packoradd <format> <path>...         Pack files and directories into an archive
                                         named after their parent directory
    unpack <archive> [outdir]            Extract an archive into a directory
    replace <archive> <entry> <file> [out]
                                         Replace one existing entry with a file
    replace <archive> <dir> [out]        Replace or add every file below a directory
    add <archive> <entry> <file> [out]   Add or replace one entry from a file
    add <archive> <dir> [out]            Add or replace every file below a directory
    list <archive>                       List the entries of an archive

FORMATS:
    v1, v2, v2be, v3, v3be";

#[derive(Parser)]
#[clap(author, version, about, long_about = None, after_help = COMMANDS_HELP)]
pub struct AppArgs {
	/// Log more; repeat for even more detail
	#[clap(short, long, action = ArgAction::Count)]
	pub verbose: u8,
	/// Do not pack files whose archive path matches glob <GLOB>
	#[clap(long, value_name = "GLOB")]
	pub exclude: Vec<String>,
	/// Exclude hidden files
	#[clap(long)]
	pub exclude_hidden: bool,
	/// Do not merge other running instances into `packoradd`
	#[clap(long)]
	pub no_coordinate: bool,
	/// The command to run, followed by its arguments
	#[clap(value_parser, allow_hyphen_values = true)]
	pub command: Vec<String>,
}

impl AppArgs {
	pub const fn log_level(&self) -> &'static str {
		match self.verbose {
			0 => "warn",
			1 => "info",
			2 => "debug",
			_ => "trace",
		}
	}

	pub fn dispatch_options(&self) -> pakpack::Result<DispatchOptions> {
		let mut walk = WalkOptions::new().exclude_hidden(self.exclude_hidden);
		for pattern in &self.exclude {
			walk = walk.exclude(pattern)?;
		}
		Ok(DispatchOptions {
			walk,
			coordinate: !self.no_coordinate,
		})
	}
}
