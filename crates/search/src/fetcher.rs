use crate::{provider::BROWSER_USER_AGENT, SearchFetchError};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::USER_AGENT;
use url::Url;

/// Downloads the bytes behind a candidate image URL.
#[async_trait]
pub trait ThumbnailFetcher: Send + Sync {
	async fn fetch(&self, url: &Url) -> Result<Bytes, SearchFetchError>;
}

pub struct HttpThumbnailFetcher {
	client: reqwest::Client,
}

impl HttpThumbnailFetcher {
	#[must_use]
	pub const fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl ThumbnailFetcher for HttpThumbnailFetcher {
	async fn fetch(&self, url: &Url) -> Result<Bytes, SearchFetchError> {
		let response = self
			.client
			.get(url.clone())
			.header(USER_AGENT, BROWSER_USER_AGENT)
			.send()
			.await
			.map_err(|source| SearchFetchError::Request {
				url: url.clone(),
				source,
			})?;

		if !response.status().is_success() {
			return Err(SearchFetchError::Status {
				url: url.clone(),
				status: response.status(),
			});
		}

		response
			.bytes()
			.await
			.map_err(|source| SearchFetchError::Request {
				url: url.clone(),
				source,
			})
	}
}
