// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Turning a verb-first argument vector into an [`Operation`] and running it.

use crate::{
	archive::ArchiveGateway,
	conflict::EditMode,
	coordinator::{InstanceCoordinator, ProcessIntrospector, SystemIntrospector},
	error::{Error, Result},
	format::FormatVersion,
	ops,
	walk::WalkOptions,
};
use std::{
	collections::HashMap,
	io::Write,
	path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
	Pack,
	PackOrAdd,
	Unpack,
	Replace,
	Add,
	List,
}

/// A verb and how many arguments must follow it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandSpec {
	pub command: Command,
	pub verb: &'static str,
	pub min_args: usize,
}

const COMMANDS: [CommandSpec; 6] = [
	CommandSpec {
		command: Command::Pack,
		verb: "pack",
		min_args: 2,
	},
	CommandSpec {
		command: Command::PackOrAdd,
		verb: "packoradd",
		min_args: 2,
	},
	CommandSpec {
		command: Command::Unpack,
		verb: "unpack",
		min_args: 1,
	},
	CommandSpec {
		command: Command::Replace,
		verb: "replace",
		min_args: 2,
	},
	CommandSpec {
		command: Command::Add,
		verb: "add",
		min_args: 2,
	},
	CommandSpec {
		command: Command::List,
		verb: "list",
		min_args: 1,
	},
];

/// Verb lookup, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct CommandTable {
	commands: HashMap<&'static str, CommandSpec>,
}

impl CommandTable {
	pub fn new() -> Self {
		Self {
			commands: COMMANDS.iter().map(|spec| (spec.verb, *spec)).collect(),
		}
	}

	pub fn get(&self, verb: &str) -> Option<&CommandSpec> {
		self.commands.get(verb)
	}

	/// Looks up the verb at the front of `argv`.
	pub fn lookup(&self, argv: &[String]) -> Result<&CommandSpec> {
		let verb = argv.first().map(String::as_str).unwrap_or_default();
		self.get(verb)
			.ok_or_else(|| Error::UnknownCommand(verb.to_owned()))
	}
}

impl Default for CommandTable {
	fn default() -> Self {
		Self::new()
	}
}

/// What an add or replace writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
	/// Every file below a directory, named relative to it.
	Directory(PathBuf),
	/// One entry, filled from one file.
	Entry { name: String, source: PathBuf },
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	Pack {
		input: PathBuf,
		format: FormatVersion,
		output: PathBuf,
	},
	PackOrAdd {
		format: FormatVersion,
		inputs: Vec<String>,
	},
	Unpack {
		input: PathBuf,
		output: PathBuf,
	},
	Replace {
		archive: PathBuf,
		target: EditTarget,
		output: PathBuf,
	},
	Add {
		archive: PathBuf,
		target: EditTarget,
		output: PathBuf,
	},
	List {
		archive: PathBuf,
	},
}

impl Operation {
	pub fn parse(table: &CommandTable, argv: &[String]) -> Result<Self> {
		Self::parse_spec(table.lookup(argv)?, argv)
	}

	fn parse_spec(spec: &CommandSpec, argv: &[String]) -> Result<Self> {
		let actual = argv.len().saturating_sub(1);
		if actual < spec.min_args {
			return Err(Error::InsufficientArguments {
				command: spec.verb,
				expected: spec.min_args,
				actual,
			});
		}
		let path = |idx: usize| path_argument(&argv[idx]);
		let path_or = |idx: usize, default: &PathBuf| {
			argv.get(idx)
				.map_or_else(|| default.clone(), |arg| path_argument(arg))
		};

		Ok(match spec.command {
			Command::Pack => {
				let input = path(1);
				Self::Pack {
					format: argv[2].parse()?,
					output: path_or(3, &input),
					input,
				}
			}
			Command::PackOrAdd => Self::PackOrAdd {
				format: argv[1].parse()?,
				inputs: argv[2..].to_vec(),
			},
			Command::Unpack => {
				let input = path(1);
				Self::Unpack {
					output: path_or(2, &input),
					input,
				}
			}
			Command::Replace | Command::Add => {
				let archive = path(1);
				let (target, output) = if Path::new(&argv[2]).is_dir() {
					(EditTarget::Directory(path(2)), path_or(3, &archive))
				} else {
					if argv.len() < 4 {
						return Err(Error::InsufficientArguments {
							command: spec.verb,
							expected: 3,
							actual,
						});
					}
					let target = EditTarget::Entry {
						name: argv[2].clone(),
						source: path(3),
					};
					(target, path_or(4, &archive))
				};
				if spec.command == Command::Add {
					Self::Add {
						archive,
						target,
						output,
					}
				} else {
					Self::Replace {
						archive,
						target,
						output,
					}
				}
			}
			Command::List => Self::List { archive: path(1) },
		})
	}

	pub const fn command(&self) -> Command {
		match self {
			Self::Pack { .. } => Command::Pack,
			Self::PackOrAdd { .. } => Command::PackOrAdd,
			Self::Unpack { .. } => Command::Unpack,
			Self::Replace { .. } => Command::Replace,
			Self::Add { .. } => Command::Add,
			Self::List { .. } => Command::List,
		}
	}
}

/// A path given on the command line, without trailing separators.
fn path_argument(arg: &str) -> PathBuf {
	Path::new(arg).components().collect()
}

/// Runtime switches, fixed for the whole run.
pub struct DispatchOptions {
	pub walk: WalkOptions,
	/// Whether `packoradd` first merges in other running instances.
	pub coordinate: bool,
}

impl Default for DispatchOptions {
	fn default() -> Self {
		Self {
			walk: WalkOptions::default(),
			coordinate: true,
		}
	}
}

/// Runs commands against an archive backend, writing progress lines to `out`.
pub struct Dispatcher<'a, G, P, W> {
	table: &'a CommandTable,
	gateway: &'a G,
	options: &'a DispatchOptions,
	coordinator: Option<InstanceCoordinator<P>>,
	out: W,
}

impl<'a, G: ArchiveGateway, W: Write> Dispatcher<'a, G, SystemIntrospector, W> {
	pub fn new(
		table: &'a CommandTable,
		gateway: &'a G,
		options: &'a DispatchOptions,
		out: W,
	) -> Self {
		Self {
			table,
			gateway,
			options,
			coordinator: None,
			out,
		}
	}
}

impl<'a, G: ArchiveGateway, P: ProcessIntrospector, W: Write> Dispatcher<'a, G, P, W> {
	pub fn with_coordinator<Q: ProcessIntrospector>(
		self,
		coordinator: InstanceCoordinator<Q>,
	) -> Dispatcher<'a, G, Q, W> {
		Dispatcher {
			table: self.table,
			gateway: self.gateway,
			options: self.options,
			coordinator: Some(coordinator),
			out: self.out,
		}
	}

	pub fn into_output(self) -> W {
		self.out
	}

	/// Parses and runs one command. `argv` starts at the verb.
	pub fn dispatch(&mut self, argv: &[String]) -> Result<()> {
		let spec = *self.table.lookup(argv)?;
		let operation = if spec.command == Command::PackOrAdd && self.options.coordinate {
			let merged = self.coordinate(argv)?;
			Operation::parse_spec(&spec, &merged)?
		} else {
			Operation::parse_spec(&spec, argv)?
		};
		self.execute(operation)
	}

	/// Merges in other running instances. A peer that could not be merged
	/// fails the command before anything is packed; a peer that could not be
	/// stopped is only reported.
	fn coordinate(&mut self, argv: &[String]) -> Result<Vec<String>> {
		let mut coordination = match &self.coordinator {
			Some(coordinator) => coordinator.coordinate(argv)?,
			None => return Ok(argv.to_vec()),
		};
		if let Some(failure) = coordination.take_blocking_failure() {
			return Err(failure);
		}
		for failure in &coordination.failures {
			writeln!(self.out, "{failure}")?;
		}
		Ok(coordination.args)
	}

	pub fn execute(&mut self, operation: Operation) -> Result<()> {
		info!("Running {:?}", operation.command());
		let walk = &self.options.walk;
		let out: &mut dyn Write = &mut self.out;
		match operation {
			Operation::Pack {
				input,
				format,
				output,
			} => ops::pack::pack(self.gateway, &input, format, &output, walk, out),
			Operation::PackOrAdd { format, inputs } => {
				ops::pack_or_add::pack_or_add(self.gateway, format, &inputs, walk, out).map(drop)
			}
			Operation::Unpack { input, output } => {
				ops::unpack::unpack(self.gateway, &input, &output, out).map(drop)
			}
			Operation::Replace {
				archive,
				target,
				output,
			} => ops::edit::edit(
				self.gateway,
				EditMode::Replace,
				&archive,
				&target,
				&output,
				walk,
				out,
			),
			Operation::Add {
				archive,
				target,
				output,
			} => ops::edit::edit(
				self.gateway,
				EditMode::Add,
				&archive,
				&target,
				&output,
				walk,
				out,
			),
			Operation::List { archive } => ops::list::list(self.gateway, &archive, out),
		}
	}
}
