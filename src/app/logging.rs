// SPDX-License-Identifier: Apache-2.0 OR MIT
use color_eyre::{eyre::WrapErr, Result};
use std::io;
use tracing_subscriber::EnvFilter;

/// Sends log events to stderr, so stdout carries only command output.
/// `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> Result<()> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.wrap_err_with(|| format!("invalid log level '{level}'"))?;
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.try_init()
		.map_err(|err| color_eyre::eyre::eyre!("failed to install log subscriber: {}", err))
}
