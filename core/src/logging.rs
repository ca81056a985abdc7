use foodie_utils::error::FileIOError;

use std::{fs, io, path::Path};

use thiserror::Error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::{LevelFilter, ParseError},
	fmt::{self, Layer},
	prelude::*,
	util::TryInitError,
	EnvFilter,
};

#[cfg(debug_assertions)]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::DEBUG;

#[cfg(not(debug_assertions))]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::INFO;

const OUR_CRATES: [&str; 8] = [
	"foodie_ai",
	"foodie_catalog",
	"foodie_cli",
	"foodie_config",
	"foodie_core",
	"foodie_images",
	"foodie_search",
	"foodie_server",
];

#[derive(Debug, Error)]
pub enum LoggingError {
	#[error("invalid log directive: {0}")]
	Directive(#[from] ParseError),
	#[error("failed to install logger: {0}")]
	Init(#[from] TryInitError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

/// Installs the global subscriber: console output on stderr plus a daily rolling file in
/// `logs_dir`.
///
/// `level` applies to our own crates and everything else logs warnings only. A valid `RUST_LOG`
/// replaces these defaults entirely. Keep the returned guard alive or buffered file lines get
/// lost.
pub fn init(logs_dir: impl AsRef<Path>, level: &str) -> Result<WorkerGuard, LoggingError> {
	let logs_dir = logs_dir.as_ref();
	fs::create_dir_all(logs_dir)
		.map_err(|e| FileIOError::from((logs_dir, e, "Failed to create logs directory")))?;

	let (non_blocking, guard) = tracing_appender::non_blocking(rolling::daily(logs_dir, "log"));

	let defaults = default_filter(level)?;
	let filter = EnvFilter::try_from_default_env().unwrap_or(defaults);

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(io::stderr)
				.with_filter(CONSOLE_LOG_FILTER),
		)
		.with(
			Layer::default()
				.with_writer(non_blocking)
				.with_ansi(false)
				.with_filter(LevelFilter::DEBUG),
		)
		.try_init()?;

	Ok(guard)
}

fn default_filter(level: &str) -> Result<EnvFilter, ParseError> {
	OUR_CRATES.iter().try_fold(
		EnvFilter::default().add_directive("warn".parse()?),
		|filter, krate| Ok(filter.add_directive(format!("{krate}={level}").parse()?)),
	)
}
