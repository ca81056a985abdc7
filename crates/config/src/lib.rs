//! Application configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
};
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "foodie.json";

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	#[cfg(any(target_os = "macos", target_os = "ios", target_os = "android"))]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("foodie");

	#[cfg(target_os = "windows")]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("Foodie");

	#[cfg(not(any(
		target_os = "macos",
		target_os = "ios",
		target_os = "android",
		target_os = "windows"
	)))]
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("foodie");

	// Create directory if it doesn't exist
	fs::create_dir_all(&dir)?;

	Ok(dir)
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	/// Data directory path
	pub data_dir: PathBuf,

	/// Logging level
	pub log_level: String,

	/// Catalog resource, the bundled one is used when unset
	#[serde(default)]
	pub catalog_path: Option<PathBuf>,

	#[serde(default)]
	pub model: ModelConfig,

	#[serde(default)]
	pub search: SearchConfig,

	#[serde(default)]
	pub server: ServerConfig,
}

/// Where the classifier weights come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
	/// Base URL of the model hub
	pub endpoint: String,

	/// Repository holding the weight artifact, e.g. `owner/name`
	pub repo_id: String,

	/// Artifact file name inside the repository
	pub filename: String,

	/// Branch, tag or commit to resolve the artifact at
	pub revision: String,

	/// Environment variable holding an optional bearer token
	pub token_env: String,

	/// Fetch and build the model at startup instead of on the first request
	pub eager_load: bool,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			endpoint: "https://huggingface.co".to_string(),
			repo_id: "eNtangedAI/my_foodie_classifier_demo".to_string(),
			filename: "vit_best.onnx".to_string(),
			revision: "main".to_string(),
			token_env: "HF_TOKEN".to_string(),
			eager_load: true,
		}
	}
}

/// Image search fallback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
	pub enabled: bool,

	/// How many candidate images are requested per query
	pub max_results: usize,

	/// Per image fetch timeout, in seconds
	pub timeout_secs: u64,
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			max_results: 4,
			timeout_secs: 5,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { port: 8080 }
	}
}

impl AppConfig {
	/// Load configuration from the default location
	pub fn load() -> Result<Self> {
		let data_dir = default_data_dir()?;
		Self::load_from(&data_dir)
	}

	/// Load configuration from a specific data directory, writing the defaults if there is none
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)?;
			let mut config: AppConfig = serde_json::from_str(&json)?;

			// The directory may have been moved since the file was written
			config.data_dir = data_dir.to_path_buf();

			if config.version < Self::target_version() {
				info!(
					"Upgrading config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.version = Self::target_version();
				config.save()?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		}
	}

	/// Create default configuration with specific data directory
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			data_dir,
			log_level: "info".to_string(),
			catalog_path: None,
			model: ModelConfig::default(),
			search: SearchConfig::default(),
			server: ServerConfig::default(),
		}
	}

	/// Save configuration to disk
	pub fn save(&self) -> Result<()> {
		// Ensure directory exists
		fs::create_dir_all(&self.data_dir)?;

		let config_path = self.data_dir.join(CONFIG_FILE_NAME);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;

		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	/// Directory holding downloaded weight artifacts
	pub fn models_dir(&self) -> PathBuf {
		self.data_dir.join("models")
	}

	/// Directory holding rolling log files
	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	pub const fn target_version() -> u32 {
		1
	}
}
