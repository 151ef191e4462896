// SPDX-License-Identifier: Apache-2.0 OR MIT
mod app;

use self::app::args::AppArgs;
use clap::{CommandFactory, Parser};
use color_eyre::{eyre::WrapErr, Result};
use pakpack::{
	CommandTable, Dispatcher, Error, ErrorKind, InstanceCoordinator, PakGateway, SystemIntrospector,
};
use std::io;
use tracing::error;

fn main() -> Result<()> {
	color_eyre::install().wrap_err("failed to install color-eyre handler")?;
	let args = AppArgs::parse();
	app::logging::init(args.log_level())?;

	if args.command.is_empty() {
		AppArgs::command()
			.print_help()
			.wrap_err("failed to print usage")?;
		return Ok(());
	}

	let table = CommandTable::new();
	let gateway = PakGateway::new();
	let options = args
		.dispatch_options()
		.wrap_err("invalid command-line options")?;
	let mut dispatcher = Dispatcher::new(&table, &gateway, &options, io::stdout().lock())
		.with_coordinator(InstanceCoordinator::new(SystemIntrospector::new()));

	match dispatcher.dispatch(&args.command) {
		Ok(()) => println!("Command executed successfully."),
		Err(err) if err.kind() == ErrorKind::Io => {
			return Err(err).wrap_err("failed to run command");
		}
		Err(err) => {
			error!("{:?} failure: {}", err.kind(), err);
			println!("{err}");
			if matches!(err, Error::UnknownCommand(_)) {
				AppArgs::command()
					.print_help()
					.wrap_err("failed to print usage")?;
			}
		}
	}
	Ok(())
}
