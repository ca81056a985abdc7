use foodie_config::AppConfig;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

pub struct Context {
	pub format: OutputFormat,
	pub config: AppConfig,
}

impl Context {
	pub const fn new(format: OutputFormat, config: AppConfig) -> Self {
		Self { format, config }
	}
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
