use foodie_utils::error::FileIOError;

use std::{
	env,
	ffi::OsString,
	path::{Path, PathBuf},
	time::Duration,
};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WeightFetchError {
	#[error("invalid weight source: {0}")]
	InvalidSource(String),
	#[error("failed to build weight artifact url: {0}")]
	Url(#[from] url::ParseError),
	#[error("request for weight artifact failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("weight artifact request to '{url}' answered {status}")]
	Status { url: Url, status: StatusCode },
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

/// Names a weight artifact on a model hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSource {
	pub endpoint: String,
	pub repo_id: String,
	pub filename: String,
	pub revision: String,
	/// Environment variable holding an optional bearer token
	pub token_env: String,
}

impl WeightSource {
	/// `{endpoint}/{repo_id}/resolve/{revision}/{filename}`
	pub fn url(&self) -> Result<Url, WeightFetchError> {
		self.validate()?;

		let mut base = Url::parse(&self.endpoint)?;
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}

		Ok(base.join(&format!(
			"{}/resolve/{}/{}",
			self.repo_id, self.revision, self.filename
		))?)
	}

	/// Token read from the configured environment variable, if set and not blank
	#[must_use]
	pub fn token(&self) -> Option<String> {
		env::var(&self.token_env)
			.ok()
			.map(|token| token.trim().to_string())
			.filter(|token| !token.is_empty())
	}

	/// Where the artifact lives inside a cache directory
	pub fn cache_path(&self, cache_dir: &Path) -> Result<PathBuf, WeightFetchError> {
		self.validate()?;

		Ok(cache_dir
			.join(self.repo_id.replace('/', "--"))
			.join(self.revision.replace('/', "--"))
			.join(&self.filename))
	}

	fn validate(&self) -> Result<(), WeightFetchError> {
		let safe_segment = |segment: &str| {
			!segment.is_empty()
				&& segment != "."
				&& segment != ".."
				&& !segment.contains('\\')
				&& !segment.contains('\0')
		};

		if !self.repo_id.split('/').all(safe_segment) {
			return Err(WeightFetchError::InvalidSource(format!(
				"repository '{}'",
				self.repo_id
			)));
		}

		if !self.revision.split('/').all(safe_segment) {
			return Err(WeightFetchError::InvalidSource(format!(
				"revision '{}'",
				self.revision
			)));
		}

		if !safe_segment(&self.filename) || self.filename.contains('/') {
			return Err(WeightFetchError::InvalidSource(format!(
				"file name '{}'",
				self.filename
			)));
		}

		Ok(())
	}
}

/// Resolves a [`WeightSource`] to a local file holding the artifact.
#[async_trait]
pub trait WeightFetcher: Send + Sync {
	async fn fetch(&self, source: &WeightSource) -> Result<PathBuf, WeightFetchError>;
}

/// Downloads artifacts over HTTP, keeping them in a local cache directory.
///
/// A cached artifact is returned as is, without asking the hub whether it changed.
pub struct HubFetcher {
	client: reqwest::Client,
	cache_dir: PathBuf,
}

impl HubFetcher {
	pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, WeightFetchError> {
		Ok(Self {
			client: reqwest::Client::builder()
				.connect_timeout(CONNECT_TIMEOUT)
				.build()?,
			cache_dir: cache_dir.into(),
		})
	}

	async fn download(&self, source: &WeightSource, target: &Path) -> Result<(), WeightFetchError> {
		let url = source.url()?;

		let mut request = self.client.get(url.clone());
		if let Some(token) = source.token() {
			debug!("Forwarding token from ${}", source.token_env);
			request = request.bearer_auth(token);
		}

		let response = request.send().await?;
		if !response.status().is_success() {
			return Err(WeightFetchError::Status {
				url,
				status: response.status(),
			});
		}

		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent).await.map_err(|e| {
				FileIOError::from((parent, e, "Failed to create weights cache directory"))
			})?;
		}

		let partial = partial_path(target);
		let mut file = fs::File::create(&partial)
			.await
			.map_err(|e| FileIOError::from((&partial, e, "Failed to create weights file")))?;

		let mut total = 0usize;
		let mut stream = response.bytes_stream();
		while let Some(chunk) = stream.next().await {
			let chunk = chunk?;
			total += chunk.len();
			file.write_all(&chunk)
				.await
				.map_err(|e| FileIOError::from((&partial, e, "Failed to write weights file")))?;
		}

		file.flush()
			.await
			.map_err(|e| FileIOError::from((&partial, e, "Failed to flush weights file")))?;
		drop(file);

		fs::rename(&partial, target)
			.await
			.map_err(|e| FileIOError::from((target, e, "Failed to move weights into place")))?;

		info!("Downloaded {total} bytes of weights from {url}");

		Ok(())
	}
}

#[async_trait]
impl WeightFetcher for HubFetcher {
	async fn fetch(&self, source: &WeightSource) -> Result<PathBuf, WeightFetchError> {
		let target = source.cache_path(&self.cache_dir)?;

		match fs::metadata(&target).await {
			Ok(metadata) if metadata.is_file() => {
				debug!("Using cached weights at {}", target.display());
				return Ok(target);
			}
			Ok(_) => {}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => {
				return Err(FileIOError::from((&target, e, "Failed to inspect cached weights")).into())
			}
		}

		info!(
			repo_id = %source.repo_id,
			filename = %source.filename,
			revision = %source.revision,
			"Fetching classifier weights"
		);
		self.download(source, &target).await?;

		Ok(target)
	}
}

fn partial_path(target: &Path) -> PathBuf {
	let mut partial = OsString::from(target.as_os_str());
	partial.push(".part");
	PathBuf::from(partial)
}
