// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Folding near-simultaneous launches of this program into one.
//!
//! A shell "send to" action starts one process per batch of selected files.
//! The [`InstanceCoordinator`] finds the other running copies, takes over the
//! paths they were started with, and stops them, so that a single process
//! packs everything.
//!
//! This is best effort: the scan, the command-line queries and the kills are
//! separate steps, and a peer that starts or exits in between is missed.

mod system;

pub use system::SystemIntrospector;

use crate::error::{Error, Result};
use std::{fmt, path::PathBuf};
use tracing::{debug, info, warn};

/// Leading tokens of a peer's command line that are not paths when it was
/// started without flags: the program, the `packoradd` verb and the format
/// name. Peers started with flags before the verb are merged from after
/// their `packoradd` verb and format instead; see [`merge_arguments`].
pub const PEER_PREFIX_TOKENS: usize = 3;

/// The verb whose peers are merged.
pub const MERGE_VERB: &str = "packoradd";

/// A process as seen by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
	pub pid: u32,
	pub name: String,
	/// The resolved executable image, when the OS lets us see it.
	pub exe: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
	Available(String),
	Unavailable,
}

/// Why a peer's command line could not be read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PeerFailure {
	AccessDenied,
	ProcessExited,
	Unknown,
}

impl fmt::Display for PeerFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::AccessDenied => "access denied",
			Self::ProcessExited => "the process has exited",
			Self::Unknown => "unknown cause",
		})
	}
}

/// The OS facilities the coordinator needs.
pub trait ProcessIntrospector {
	fn current(&self) -> Result<ProcessInfo>;

	/// Every process that could be inspected. Processes that cannot be
	/// inspected are left out.
	fn list_processes(&self) -> Vec<ProcessInfo>;

	fn command_line(&self, pid: u32) -> CommandLine;

	/// Looks at `pid` more strictly than [`command_line`](Self::command_line)
	/// to find out why its command line was unavailable.
	fn probe(&self, pid: u32) -> PeerFailure;

	/// Stops `pid` immediately.
	fn kill(&self, pid: u32) -> Result<()>;
}

/// Another running instance of this program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerProcess {
	pub pid: u32,
	pub args: Vec<String>,
	pub alive: bool,
}

/// What one coordination pass did.
#[derive(Debug, Default)]
pub struct Coordination {
	/// The current arguments followed by every merged peer's paths.
	pub args: Vec<String>,
	/// Peers whose arguments were merged.
	pub merged: Vec<PeerProcess>,
	/// Peers that could not be merged or stopped.
	pub failures: Vec<Error>,
}

impl Coordination {
	/// Whether a matched peer could not be merged, which must stop the run.
	pub fn is_blocked(&self) -> bool {
		self.failures
			.iter()
			.any(|failure| matches!(failure, Error::PeerUnavailable { .. }))
	}

	/// Removes and returns the first failure that blocks the run.
	pub fn take_blocking_failure(&mut self) -> Option<Error> {
		let idx = self
			.failures
			.iter()
			.position(|failure| matches!(failure, Error::PeerUnavailable { .. }))?;
		Some(self.failures.remove(idx))
	}
}

pub struct InstanceCoordinator<P = SystemIntrospector> {
	introspector: P,
}

impl<P: ProcessIntrospector> InstanceCoordinator<P> {
	pub const fn new(introspector: P) -> Self {
		Self { introspector }
	}

	/// Other processes with the same name and executable image as this one.
	pub fn find_peers(&self) -> Result<Vec<ProcessInfo>> {
		let current = self.introspector.current()?;
		if current.exe.is_none() {
			warn!("Cannot resolve our own executable, skipping the peer scan");
			return Ok(Vec::new());
		}
		let peers: Vec<_> = self
			.introspector
			.list_processes()
			.into_iter()
			.filter(|process| {
				process.pid != current.pid
					&& process.name == current.name
					&& process.exe == current.exe
			})
			.collect();
		debug!("Found {} peer processes", peers.len());
		Ok(peers)
	}

	/// Appends the paths of every running peer to `args`, then stops the
	/// peers that were merged.
	///
	/// If any peer's command line cannot be recovered, no peer is stopped and
	/// the failure is left in [`Coordination::failures`]; the caller must not
	/// go on to pack the merged arguments.
	pub fn coordinate(&self, args: &[String]) -> Result<Coordination> {
		let mut coordination = Coordination {
			args: args.to_vec(),
			..Coordination::default()
		};
		for peer in self.find_peers()? {
			match self.introspector.command_line(peer.pid) {
				CommandLine::Available(line) => {
					let peer_args = tokenize_command_line(&line);
					info!("Merging arguments of process {}: {:?}", peer.pid, peer_args);
					coordination.args = merge_arguments(&coordination.args, &peer_args);
					coordination.merged.push(PeerProcess {
						pid: peer.pid,
						args: peer_args,
						alive: true,
					});
				}
				CommandLine::Unavailable => {
					let failure = self.introspector.probe(peer.pid);
					warn!("Command line of process {} unavailable: {}", peer.pid, failure);
					coordination.failures.push(Error::PeerUnavailable {
						pid: peer.pid,
						failure,
					});
				}
			}
		}
		if coordination.is_blocked() {
			warn!("Leaving every peer running, a peer could not be merged");
			return Ok(coordination);
		}
		for peer in &mut coordination.merged {
			match self.introspector.kill(peer.pid) {
				Ok(()) => peer.alive = false,
				Err(err) => {
					warn!("Failed to stop process {}: {}", peer.pid, err);
					coordination.failures.push(err);
				}
			}
		}
		Ok(coordination)
	}
}

/// Splits a command line into tokens: a double-quoted span (quotes kept) or
/// a run of non-space characters.
pub fn tokenize_command_line(line: &str) -> Vec<String> {
	let chars: Vec<char> = line.chars().collect();
	let mut tokens = Vec::new();
	let mut idx = 0;
	while idx < chars.len() {
		if chars[idx] == ' ' {
			idx += 1;
			continue;
		}
		let quoted = if chars[idx] == '"' {
			closing_quote(&chars, idx)
		} else {
			None
		};
		let end = quoted.unwrap_or_else(|| {
			chars[idx..]
				.iter()
				.position(|c| *c == ' ')
				.map_or(chars.len(), |len| idx + len)
		});
		tokens.push(chars[idx..end].iter().collect());
		idx = end;
	}
	tokens
}

/// The end (exclusive) of a quoted span opening at `open`, which must hold at
/// least one character and no line break.
fn closing_quote(chars: &[char], open: usize) -> Option<usize> {
	let first = open + 1;
	chars
		.get(first..)?
		.iter()
		.take_while(|c| **c != '\n')
		.enumerate()
		.skip(1)
		.find(|(_, c)| **c == '"')
		.map(|(offset, _)| first + offset + 1)
}

/// The current arguments followed by the peer's paths: everything after the
/// format token that follows the peer's [`MERGE_VERB`]. Global flags such as
/// `--exclude <GLOB>` sit before the verb and are never merged. A peer with
/// no verb past its program name falls back to skipping
/// [`PEER_PREFIX_TOKENS`].
pub fn merge_arguments(current: &[String], peer: &[String]) -> Vec<String> {
	let skip = peer
		.iter()
		.skip(1)
		.position(|token| token == MERGE_VERB)
		.map_or(PEER_PREFIX_TOKENS, |idx| idx + 3);
	current
		.iter()
		.chain(peer.iter().skip(skip))
		.cloned()
		.collect()
}

#[cfg(test)]
mod test {
	use super::*;
	use std::{cell::RefCell, collections::HashMap};

	#[derive(Default)]
	struct FakeProcesses {
		current: u32,
		processes: Vec<ProcessInfo>,
		command_lines: HashMap<u32, String>,
		probes: HashMap<u32, PeerFailure>,
		killed: RefCell<Vec<u32>>,
	}

	impl FakeProcesses {
		fn with(mut self, pid: u32, name: &str, exe: Option<&str>) -> Self {
			self.processes.push(ProcessInfo {
				pid,
				name: name.to_owned(),
				exe: exe.map(PathBuf::from),
			});
			self
		}
	}

	impl ProcessIntrospector for FakeProcesses {
		fn current(&self) -> Result<ProcessInfo> {
			self.processes
				.iter()
				.find(|p| p.pid == self.current)
				.cloned()
				.ok_or_else(|| Error::CurrentProcess("not listed".into()))
		}

		fn list_processes(&self) -> Vec<ProcessInfo> {
			self.processes.clone()
		}

		fn command_line(&self, pid: u32) -> CommandLine {
			self.command_lines
				.get(&pid)
				.map_or(CommandLine::Unavailable, |line| CommandLine::Available(line.clone()))
		}

		fn probe(&self, pid: u32) -> PeerFailure {
			self.probes.get(&pid).copied().unwrap_or(PeerFailure::Unknown)
		}

		fn kill(&self, pid: u32) -> Result<()> {
			self.killed.borrow_mut().push(pid);
			Ok(())
		}
	}

	fn args(list: &[&str]) -> Vec<String> {
		list.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn tokenizer_keeps_quoted_spans() {
		assert_eq!(
			tokenize_command_line(r#"prog packoradd v2 "C:\my files\a.bin"  b.bin"#),
			[
				"prog",
				"packoradd",
				"v2",
				r#""C:\my files\a.bin""#,
				"b.bin"
			]
		);
	}

	#[test]
	fn tokenizer_edge_cases() {
		assert!(tokenize_command_line("   ").is_empty());
		// unterminated quote falls back to a plain run
		assert_eq!(tokenize_command_line(r#""abc def"#), [r#""abc"#, "def"]);
		// an empty quoted span is not a quoted token
		assert_eq!(tokenize_command_line(r#""" x"#), [r#""""#, "x"]);
		assert_eq!(tokenize_command_line(r#"a"b c"#), [r#"a"b"#, "c"]);
	}

	#[test]
	fn merge_skips_the_peer_prefix() {
		let merged = merge_arguments(
			&args(&["packoradd", "v2", "mine.bin"]),
			&args(&["/bin/pakpack", "packoradd", "v2", "theirs.bin", "more.bin"]),
		);
		assert_eq!(merged, ["packoradd", "v2", "mine.bin", "theirs.bin", "more.bin"]);
		assert_eq!(merge_arguments(&args(&["x"]), &args(&["a", "b"])), ["x"]);
	}

	#[test]
	fn merge_skips_global_flags_of_the_peer() {
		let merged = merge_arguments(
			&args(&["packoradd", "v2", "mine.bin"]),
			&args(&[
				"/bin/pakpack",
				"-v",
				"--exclude",
				"*.log",
				"--no-coordinate",
				"packoradd",
				"v2",
				"theirs.bin",
			]),
		);
		assert_eq!(merged, ["packoradd", "v2", "mine.bin", "theirs.bin"]);
	}

	#[test]
	fn peers_must_match_name_and_image() {
		let fake = FakeProcesses {
			current: 1,
			..Default::default()
		}
		.with(1, "pakpack", Some("/opt/pakpack"))
		.with(2, "pakpack", Some("/opt/pakpack"))
		.with(3, "pakpack", Some("/home/other/pakpack"))
		.with(4, "bash", Some("/opt/pakpack"))
		.with(5, "pakpack", None);
		let peers = InstanceCoordinator::new(fake).find_peers().unwrap();
		let pids: Vec<_> = peers.iter().map(|p| p.pid).collect();
		assert_eq!(pids, [2]);
	}

	#[test]
	fn recoverable_and_unavailable_peers() {
		let mut fake = FakeProcesses {
			current: 1,
			..Default::default()
		}
		.with(1, "pakpack", Some("/opt/pakpack"))
		.with(7, "pakpack", Some("/opt/pakpack"))
		.with(8, "pakpack", Some("/opt/pakpack"));
		fake.command_lines
			.insert(7, "prog packoradd v2 fileA".to_owned());
		fake.probes.insert(8, PeerFailure::AccessDenied);

		let coordinator = InstanceCoordinator::new(fake);
		let coordination = coordinator
			.coordinate(&args(&["packoradd", "v2", "fileB"]))
			.unwrap();

		assert_eq!(coordination.args, ["packoradd", "v2", "fileB", "fileA"]);
		assert_eq!(coordination.merged.len(), 1);
		assert_eq!(coordination.merged[0].pid, 7);
		assert!(coordination.merged[0].alive);
		assert!(coordination.is_blocked());
		assert!(matches!(
			coordination.failures.as_slice(),
			[Error::PeerUnavailable {
				pid: 8,
				failure: PeerFailure::AccessDenied
			}]
		));
		// the run is aborted, so nobody may be stopped
		assert!(coordinator.introspector.killed.borrow().is_empty());
	}

	#[test]
	fn merged_peers_are_stopped() {
		let mut fake = FakeProcesses {
			current: 1,
			..Default::default()
		}
		.with(1, "pakpack", Some("/opt/pakpack"))
		.with(7, "pakpack", Some("/opt/pakpack"))
		.with(9, "pakpack", Some("/opt/pakpack"));
		fake.command_lines
			.insert(7, "prog packoradd v2 fileA".to_owned());
		fake.command_lines
			.insert(9, "prog packoradd v2 fileC fileD".to_owned());

		let coordinator = InstanceCoordinator::new(fake);
		let mut coordination = coordinator
			.coordinate(&args(&["packoradd", "v2", "fileB"]))
			.unwrap();

		assert_eq!(coordination.args, [
			"packoradd", "v2", "fileB", "fileA", "fileC", "fileD"
		]);
		assert!(coordination.merged.iter().all(|peer| !peer.alive));
		assert!(coordination.take_blocking_failure().is_none());
		assert_eq!(*coordinator.introspector.killed.borrow(), [7, 9]);
	}

	#[test]
	fn no_peers_leaves_arguments_alone() {
		let fake = FakeProcesses {
			current: 1,
			..Default::default()
		}
		.with(1, "pakpack", Some("/opt/pakpack"));
		let coordination = InstanceCoordinator::new(fake)
			.coordinate(&args(&["packoradd", "v1", "x.bin"]))
			.unwrap();
		assert_eq!(coordination.args, ["packoradd", "v1", "x.bin"]);
		assert!(coordination.failures.is_empty());
	}
}
