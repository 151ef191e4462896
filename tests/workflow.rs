// SPDX-License-Identifier: Apache-2.0 OR MIT
use pakpack::{
	coordinator::{CommandLine, PeerFailure, ProcessInfo},
	ArchiveGateway, ArchiveHandle, CommandTable, ConflictPolicy, DispatchOptions, Dispatcher,
	EntrySource, Error, ErrorKind, FormatVersion, InstanceCoordinator, PakGateway,
	ProcessIntrospector, Resolution,
};
use std::{
	cell::RefCell,
	collections::HashMap,
	fs,
	io::Read,
	path::{Path, PathBuf},
	rc::Rc,
};

const SELF_PID: u32 = 100;

/// A process table holding this program and some scripted peers.
#[derive(Default)]
struct ScriptedPeers {
	peers: Vec<u32>,
	command_lines: HashMap<u32, String>,
	probes: HashMap<u32, PeerFailure>,
	killed: Rc<RefCell<Vec<u32>>>,
}

impl ScriptedPeers {
	fn info(pid: u32) -> ProcessInfo {
		ProcessInfo {
			pid,
			name: "pakpack".to_owned(),
			exe: Some(PathBuf::from("/opt/pakpack/pakpack")),
		}
	}
}

impl ProcessIntrospector for ScriptedPeers {
	fn current(&self) -> pakpack::Result<ProcessInfo> {
		Ok(Self::info(SELF_PID))
	}

	fn list_processes(&self) -> Vec<ProcessInfo> {
		std::iter::once(SELF_PID)
			.chain(self.peers.iter().copied())
			.map(Self::info)
			.collect()
	}

	fn command_line(&self, pid: u32) -> CommandLine {
		self.command_lines
			.get(&pid)
			.map_or(CommandLine::Unavailable, |line| CommandLine::Available(line.clone()))
	}

	fn probe(&self, pid: u32) -> PeerFailure {
		self.probes.get(&pid).copied().unwrap_or(PeerFailure::Unknown)
	}

	fn kill(&self, pid: u32) -> pakpack::Result<()> {
		self.killed.borrow_mut().push(pid);
		Ok(())
	}
}

/// Runs one command with instance coordination against `peers`.
fn run_coordinated(list: &[&str], peers: ScriptedPeers) -> pakpack::Result<String> {
	let table = CommandTable::new();
	let options = DispatchOptions::default();
	let mut dispatcher = Dispatcher::new(&table, &PakGateway, &options, Vec::new())
		.with_coordinator(InstanceCoordinator::new(peers));
	dispatcher.dispatch(&argv(list))?;
	Ok(String::from_utf8(dispatcher.into_output()).unwrap())
}

fn argv(list: &[&str]) -> Vec<String> {
	list.iter().map(|s| s.to_string()).collect()
}

fn arg(path: &Path) -> &str {
	path.to_str().unwrap()
}

/// Runs one command and returns what it printed.
fn run(list: &[&str]) -> pakpack::Result<String> {
	let table = CommandTable::new();
	let options = DispatchOptions {
		coordinate: false,
		..DispatchOptions::default()
	};
	let mut dispatcher = Dispatcher::new(&table, &PakGateway, &options, Vec::new());
	dispatcher.dispatch(&argv(list))?;
	Ok(String::from_utf8(dispatcher.into_output()).unwrap())
}

fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
	let archive = PakGateway.open(archive).unwrap();
	let mut data = Vec::new();
	archive.open_entry(name).unwrap().read_to_end(&mut data).unwrap();
	data
}

#[test]
fn pack_into_named_output() {
	let dir = tempfile::tempdir().unwrap();
	let data = dir.path().join("data");
	let out = dir.path().join("out.pak");
	fs::create_dir_all(data.join("a")).unwrap();
	fs::write(data.join("a").join("b.txt"), b"hello").unwrap();

	run(&["pack", arg(&data), "v2", arg(&out)]).unwrap();

	let listing = run(&["list", arg(&out)]).unwrap();
	assert_eq!(listing, "PAK format version: v2\na/b.txt\n");
}

#[test]
fn pack_then_unpack_restores_the_tree() {
	let dir = tempfile::tempdir().unwrap();
	let data = dir.path().join("data");
	fs::create_dir_all(data.join("maps").join("field")).unwrap();
	fs::write(data.join("maps").join("field").join("f01.bin"), [0_u8, 1, 2, 3]).unwrap();
	fs::write(data.join("init.bin"), b"init data").unwrap();

	run(&["pack", arg(&data), "v3be"]).unwrap();
	assert!(data.is_file());
	fs::remove_dir_all(dir.path().join("data.bak")).unwrap();

	let printed = run(&["unpack", arg(&data)]).unwrap();
	assert!(printed.starts_with("PAK format version: v3be\n"));
	assert!(data.is_dir());
	assert_eq!(
		fs::read(data.join("maps").join("field").join("f01.bin")).unwrap(),
		[0_u8, 1, 2, 3]
	);
	assert_eq!(fs::read(data.join("init.bin")).unwrap(), b"init data");
	assert!(dir.path().join("data.bak").is_file());
}

#[test]
fn listing_is_stable_and_read_only() {
	let dir = tempfile::tempdir().unwrap();
	let data = dir.path().join("data");
	fs::create_dir_all(&data).unwrap();
	fs::write(data.join("one.bin"), b"1").unwrap();
	fs::write(data.join("two.bin"), b"2").unwrap();
	run(&["pack", arg(&data), "v1"]).unwrap();
	let before = fs::read(&data).unwrap();

	let first = run(&["list", arg(&data)]).unwrap();
	let second = run(&["list", arg(&data)]).unwrap();
	assert_eq!(first, second);
	assert_eq!(fs::read(&data).unwrap(), before);
}

#[test]
fn replace_and_add_differ_on_missing_entries() {
	let dir = tempfile::tempdir().unwrap();
	let data = dir.path().join("data");
	let patch = dir.path().join("patch.bin");
	fs::create_dir_all(&data).unwrap();
	fs::write(data.join("old.bin"), b"old").unwrap();
	fs::write(&patch, b"patch").unwrap();
	run(&["pack", arg(&data), "v1"]).unwrap();
	let before = fs::read(&data).unwrap();

	let err = run(&["replace", arg(&data), "new/entry.bin", arg(&patch)]).unwrap_err();
	assert!(matches!(err, Error::MissingEntry(_)));
	assert_eq!(err.kind(), ErrorKind::UserInput);
	assert_eq!(fs::read(&data).unwrap(), before);

	let printed = run(&["add", arg(&data), "new/entry.bin", arg(&patch)]).unwrap();
	assert_eq!(printed, "Adding new/entry.bin\nSaving...\n");
	assert_eq!(read_entry(&data, "new/entry.bin"), b"patch");

	let printed = run(&["replace", arg(&data), "old.bin", arg(&patch)]).unwrap();
	assert_eq!(printed, "Replacing old.bin\nSaving...\n");
	assert_eq!(read_entry(&data, "old.bin"), b"patch");
}

#[test]
fn conflict_policies() {
	let mut archive = PakGateway.create_empty(FormatVersion::V1);
	let first = || EntrySource::Bytes(b"first".to_vec());
	let second = || EntrySource::Bytes(b"second".to_vec());

	assert_eq!(
		archive.add_entry("dup/name.bin", first(), ConflictPolicy::Ignore).unwrap(),
		Resolution::Insert
	);
	assert_eq!(
		archive.add_entry("dup/name.bin", second(), ConflictPolicy::Ignore).unwrap(),
		Resolution::Skip
	);
	let mut data = Vec::new();
	archive.open_entry("dup/name.bin").unwrap().read_to_end(&mut data).unwrap();
	assert_eq!(data, b"first");

	assert_eq!(
		archive.add_entry("dup/name.bin", second(), ConflictPolicy::Replace).unwrap(),
		Resolution::Overwrite
	);
	let mut data = Vec::new();
	archive.open_entry("dup/name.bin").unwrap().read_to_end(&mut data).unwrap();
	assert_eq!(data, b"second");
	assert_eq!(archive.entries(), ["dup/name.bin"]);
}

#[test]
fn packoradd_names_the_archive_after_the_folder() {
	let dir = tempfile::tempdir().unwrap();
	let batch = dir.path().join("batch");
	fs::create_dir_all(batch.join("sub")).unwrap();
	fs::write(batch.join("x.bin"), b"x").unwrap();
	fs::write(batch.join("sub").join("y.bin"), b"y").unwrap();
	let file = format!("\"{}\"", batch.join("x.bin").display());

	run(&["packoradd", "v2", &file, arg(&batch.join("sub"))]).unwrap();

	let listing = run(&["list", arg(&batch.join("batch"))]).unwrap();
	assert_eq!(listing, "PAK format version: v2\nx.bin\nsub/y.bin\n");
}

#[test]
fn bad_invocations_are_reported() {
	assert!(matches!(
		run(&["frobnicate", "x"]),
		Err(Error::UnknownCommand(verb)) if verb == "frobnicate"
	));
	assert_eq!(
		run(&["frobnicate"]).unwrap_err().to_string(),
		"Invalid command specified."
	);
	assert!(matches!(
		run(&["unpack"]),
		Err(Error::InsufficientArguments {
			command: "unpack",
			expected: 1,
			actual: 0
		})
	));
	assert!(matches!(
		run(&["pack", "nowhere", "v7"]),
		Err(Error::UnknownFormat(_))
	));
	assert!(matches!(
		run(&["pack", "/definitely/not/here", "v1"]),
		Err(Error::MissingDirectory(_))
	));
}

#[test]
fn pack_accepts_a_trailing_separator() {
	let dir = tempfile::tempdir().unwrap();
	let data = dir.path().join("data");
	fs::create_dir_all(data.join("a")).unwrap();
	fs::write(data.join("a").join("b.txt"), b"hello").unwrap();
	let with_slash = format!("{}/", data.display());

	run(&["pack", &with_slash, "v2"]).unwrap();

	assert!(data.is_file());
	assert!(dir.path().join("data.bak").join("a").join("b.txt").is_file());
	let listing = run(&["list", arg(&data)]).unwrap();
	assert_eq!(listing, "PAK format version: v2\na/b.txt\n");
}

#[test]
fn packoradd_takes_over_running_peers() {
	let dir = tempfile::tempdir().unwrap();
	let batch = dir.path().join("batch");
	fs::create_dir_all(&batch).unwrap();
	fs::write(batch.join("mine.bin"), b"mine").unwrap();
	fs::write(batch.join("theirs.bin"), b"theirs").unwrap();

	let killed = Rc::new(RefCell::new(Vec::new()));
	let mut peers = ScriptedPeers {
		peers: vec![7],
		killed: Rc::clone(&killed),
		..ScriptedPeers::default()
	};
	peers.command_lines.insert(
		7,
		format!(
			"/opt/pakpack/pakpack --exclude-hidden packoradd v2 \"{}\"",
			batch.join("theirs.bin").display()
		),
	);

	run_coordinated(&["packoradd", "v2", arg(&batch.join("mine.bin"))], peers).unwrap();

	assert_eq!(*killed.borrow(), [7]);
	let listing = run(&["list", arg(&batch.join("batch"))]).unwrap();
	assert_eq!(listing, "PAK format version: v2\nmine.bin\ntheirs.bin\n");
}

#[test]
fn unreadable_peer_fails_packoradd() {
	let dir = tempfile::tempdir().unwrap();
	let batch = dir.path().join("batch");
	fs::create_dir_all(&batch).unwrap();
	fs::write(batch.join("mine.bin"), b"mine").unwrap();

	let killed = Rc::new(RefCell::new(Vec::new()));
	let mut peers = ScriptedPeers {
		peers: vec![7, 8],
		killed: Rc::clone(&killed),
		..ScriptedPeers::default()
	};
	peers
		.command_lines
		.insert(7, "/opt/pakpack/pakpack packoradd v2 other.bin".to_owned());
	peers.probes.insert(8, PeerFailure::AccessDenied);

	let err = run_coordinated(&["packoradd", "v2", arg(&batch.join("mine.bin"))], peers)
		.unwrap_err();

	assert!(matches!(
		err,
		Error::PeerUnavailable {
			pid: 8,
			failure: PeerFailure::AccessDenied
		}
	));
	assert_eq!(err.kind(), ErrorKind::Process);
	assert!(killed.borrow().is_empty());
	assert!(!batch.join("batch").exists());
}
