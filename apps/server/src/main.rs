use foodie_config::{default_data_dir, AppConfig};
use foodie_core::{logging, Node};
use foodie_utils::error::report_error;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::info;

mod error;
mod html;
mod picks;
mod routes;

#[derive(Debug, Parser)]
#[command(name = "foodie-server", version, about = "Serves the food photo classifier over HTTP")]
struct Args {
	/// Where configuration, downloaded weights and logs live
	#[arg(long, env = "DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Overrides the port from the configuration file
	#[arg(long, env = "PORT")]
	port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let data_dir = match args.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};

	let mut config = AppConfig::load_from(&data_dir)?;
	if let Some(port) = args.port {
		config.server.port = port;
	}

	let _guard = logging::init(config.logs_dir(), &config.log_level)?;

	let node = Node::new(&config)
		.await
		.context("Unable to start the classifier")?;
	let app = routes::router(node);

	// This listens on IPv6 and IPv4
	let mut addr = "[::]:8080".parse::<SocketAddr>()?;
	addr.set_port(config.server.port);

	let listener = TcpListener::bind(addr)
		.await
		.with_context(|| format!("Unable to bind {addr}"))?;
	info!("Listening on http://localhost:{}", config.server.port);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("Error with HTTP server")?;

	info!("Server stopped");

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		report_error(&signal::ctrl_c().await);
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				tracing::error!("Failed to listen for SIGTERM: {e}");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	info!("Shutting down, finishing in flight requests");
}
