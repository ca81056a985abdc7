use foodie_config::{default_data_dir, AppConfig};
use foodie_core::logging;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};

mod macros;

mod context;
mod domains;

use context::{Context, OutputFormat};
use domains::{classify::ClassifyArgs, search::SearchArgs};

#[derive(Parser, Debug)]
#[command(name = "foodie", version, about = "Tells you which food is in a photo")]
struct Cli {
	/// Path to the foodie data directory
	#[arg(long, env = "DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Classify a photo on disk and show its food card
	Classify(ClassifyArgs),
	/// List the labels the classifier can predict
	Labels,
	/// Find pictures online when there is no photo at hand
	Search(SearchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
	match run(Cli::parse()).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{}", describe(&e));
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> Result<()> {
	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};

	let mut config = AppConfig::load_from(&data_dir)?;
	// Commands that need the classifier build it on first use
	config.model.eager_load = false;

	let _guard = logging::init(config.logs_dir(), &config.log_level)?;

	let ctx = Context::new(cli.format, config);

	match cli.command {
		Commands::Classify(args) => domains::classify::run(&ctx, args).await,
		Commands::Labels => domains::labels::run(&ctx),
		Commands::Search(args) => domains::search::run(&ctx, args).await,
	}
}

/// Failures from the pipeline carry their own wording for people
fn describe(e: &anyhow::Error) -> String {
	match e.downcast_ref::<foodie_core::Error>() {
		Some(e) => format!("Error: {}", e.user_message()),
		None => format!("Error: {e:#}"),
	}
}
