// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::{CommandLine, PeerFailure, ProcessInfo, ProcessIntrospector};
use crate::error::{Error, Result};
use std::{ffi::OsStr, path::Path};
use sysinfo::{Pid, Process, ProcessRefreshKind, RefreshKind, System};

/// Process introspection backed by the OS process table. On Linux, command
/// lines and failure causes come straight from `/proc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIntrospector;

impl SystemIntrospector {
	pub const fn new() -> Self {
		Self
	}

	fn snapshot(kind: ProcessRefreshKind) -> System {
		System::new_with_specifics(RefreshKind::new().with_processes(kind))
	}
}

fn describe(pid: Pid, process: &Process) -> ProcessInfo {
	ProcessInfo {
		pid: pid.as_u32(),
		name: OsStr::new(process.name()).to_string_lossy().into_owned(),
		exe: process.exe().map(Path::to_path_buf),
	}
}

impl ProcessIntrospector for SystemIntrospector {
	fn current(&self) -> Result<ProcessInfo> {
		let pid = sysinfo::get_current_pid().map_err(|err| Error::CurrentProcess(err.to_string()))?;
		let system = Self::snapshot(ProcessRefreshKind::everything());
		system
			.process(pid)
			.map(|process| describe(pid, process))
			.ok_or_else(|| Error::CurrentProcess(format!("process {pid} is not listed")))
	}

	fn list_processes(&self) -> Vec<ProcessInfo> {
		Self::snapshot(ProcessRefreshKind::everything())
			.processes()
			.iter()
			.map(|(pid, process)| describe(*pid, process))
			.collect()
	}

	fn command_line(&self, pid: u32) -> CommandLine {
		read_command_line(pid).map_or(CommandLine::Unavailable, CommandLine::Available)
	}

	fn probe(&self, pid: u32) -> PeerFailure {
		probe_process(pid)
	}

	fn kill(&self, pid: u32) -> Result<()> {
		let system = Self::snapshot(ProcessRefreshKind::new());
		match system.process(Pid::from_u32(pid)) {
			Some(process) if process.kill() => Ok(()),
			_ => Err(Error::KillFailed(pid)),
		}
	}
}

/// Joins arguments back into one line, quoting those with spaces.
fn join_command_line(args: &[String]) -> String {
	args.iter()
		.map(|arg| {
			if arg.contains(' ') {
				format!("\"{arg}\"")
			} else {
				arg.clone()
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(target_os = "linux")]
fn read_command_line(pid: u32) -> Option<String> {
	let raw = std::fs::read(format!("/proc/{pid}/cmdline")).ok()?;
	let args: Vec<String> = raw
		.split(|byte| *byte == 0)
		.filter(|arg| !arg.is_empty())
		.map(|arg| String::from_utf8_lossy(arg).into_owned())
		.collect();
	(!args.is_empty()).then(|| join_command_line(&args))
}

#[cfg(not(target_os = "linux"))]
fn read_command_line(pid: u32) -> Option<String> {
	let system = SystemIntrospector::snapshot(ProcessRefreshKind::everything());
	let process = system.process(Pid::from_u32(pid))?;
	let args: Vec<String> = process
		.cmd()
		.iter()
		.map(|arg| OsStr::new(arg).to_string_lossy().into_owned())
		.collect();
	(!args.is_empty()).then(|| join_command_line(&args))
}

#[cfg(target_os = "linux")]
fn probe_process(pid: u32) -> PeerFailure {
	use std::io::ErrorKind;

	match std::fs::read_link(format!("/proc/{pid}/exe")) {
		Ok(_) => PeerFailure::Unknown,
		Err(err) => match err.kind() {
			ErrorKind::PermissionDenied => PeerFailure::AccessDenied,
			ErrorKind::NotFound => PeerFailure::ProcessExited,
			_ => PeerFailure::Unknown,
		},
	}
}

#[cfg(not(target_os = "linux"))]
fn probe_process(pid: u32) -> PeerFailure {
	let system = SystemIntrospector::snapshot(ProcessRefreshKind::everything());
	match system.process(Pid::from_u32(pid)) {
		None => PeerFailure::ProcessExited,
		Some(process) if process.exe().is_none() => PeerFailure::AccessDenied,
		Some(_) => PeerFailure::Unknown,
	}
}
