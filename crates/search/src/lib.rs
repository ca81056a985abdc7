//! Image search fallback: find a handful of pictures for a text query and let the user pick
//! one of them as classifier input.
//!
//! Candidates are fetched concurrently, each under a fixed timeout. A candidate that fails
//! to arrive or to decode is dropped without surfacing any error, so a query can yield
//! fewer pictures than asked for.

use foodie_images::{decode_image, InputImage};

use std::{sync::Arc, time::Duration};

use futures_concurrency::future::Join;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::{task::spawn_blocking, time::timeout};
use tracing::{debug, info};
use url::Url;

mod fetcher;
mod provider;

pub use fetcher::{HttpThumbnailFetcher, ThumbnailFetcher};
pub use provider::{parse_results, BingImageSearch, SearchProvider};

pub const DEFAULT_MAX_RESULTS: usize = 4;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// The query itself could not be answered
#[derive(Debug, Error)]
pub enum SearchError {
	#[error("search query is empty")]
	EmptyQuery,
	#[error("image search request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("image search answered {0}")]
	Status(StatusCode),
}

/// A single candidate could not be used, never shown to the user
#[derive(Debug, Error)]
pub enum SearchFetchError {
	#[error("request for '{url}' failed: {source}")]
	Request {
		url: Url,
		#[source]
		source: reqwest::Error,
	},
	#[error("'{url}' answered {status}")]
	Status { url: Url, status: StatusCode },
	#[error("'{url}' did not arrive within {timeout:?}")]
	Timeout { url: Url, timeout: Duration },
	#[error("'{url}' is not a usable image: {source}")]
	Decode {
		url: Url,
		#[source]
		source: foodie_images::Error,
	},
	#[error("decoding '{url}' was interrupted: {source}")]
	Interrupted {
		url: Url,
		#[source]
		source: tokio::task::JoinError,
	},
}

/// A search result that arrived and decoded in time
#[derive(Debug, Clone)]
pub struct Thumbnail {
	pub url: Url,
	pub image: InputImage,
}

pub struct ImageSearch {
	provider: Arc<dyn SearchProvider>,
	fetcher: Arc<dyn ThumbnailFetcher>,
	max_results: usize,
	fetch_timeout: Duration,
}

impl ImageSearch {
	pub fn new(
		provider: Arc<dyn SearchProvider>,
		fetcher: Arc<dyn ThumbnailFetcher>,
		max_results: usize,
		fetch_timeout: Duration,
	) -> Self {
		Self {
			provider,
			fetcher,
			max_results,
			fetch_timeout,
		}
	}

	/// Bing backed search sharing one HTTP client for queries and downloads
	pub fn public(max_results: usize, fetch_timeout: Duration) -> Result<Self, SearchError> {
		let client = reqwest::Client::builder()
			.connect_timeout(fetch_timeout)
			.build()?;

		Ok(Self::new(
			Arc::new(BingImageSearch::new(client.clone())),
			Arc::new(HttpThumbnailFetcher::new(client)),
			max_results,
			fetch_timeout,
		))
	}

	pub async fn candidates(&self, query: &str) -> Result<Vec<Thumbnail>, SearchError> {
		let query = query.trim();
		if query.is_empty() {
			return Err(SearchError::EmptyQuery);
		}

		let mut urls = self.provider.search(query, self.max_results).await?;
		urls.truncate(self.max_results);
		let requested = urls.len();

		let thumbnails = urls
			.into_iter()
			.map(|url| self.fetch_one(url))
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.filter_map(|res| {
				res.map_err(|e| debug!("Skipping search candidate: {e}"))
					.ok()
			})
			.collect::<Vec<_>>();

		info!(
			%query,
			requested,
			usable = thumbnails.len(),
			"Image search candidates ready"
		);

		Ok(thumbnails)
	}

	/// Downloads and decodes one image under the fetch timeout
	pub async fn fetch_one(&self, url: Url) -> Result<Thumbnail, SearchFetchError> {
		let bytes = timeout(self.fetch_timeout, self.fetcher.fetch(&url))
			.await
			.map_err(|_| SearchFetchError::Timeout {
				url: url.clone(),
				timeout: self.fetch_timeout,
			})??;

		let origin = url.to_string();
		let image = spawn_blocking(move || decode_image(&bytes, origin))
			.await
			.map_err(|source| SearchFetchError::Interrupted {
				url: url.clone(),
				source,
			})?
			.map_err(|source| SearchFetchError::Decode {
				url: url.clone(),
				source,
			})?;

		Ok(Thumbnail { url, image })
	}
}
