use crate::SearchError;

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use tracing::debug;
use url::Url;

const BING_IMAGES_URL: &str = "https://www.bing.com/images/search";

/// Bing refuses to render results for clients it doesn't recognize
pub(crate) const BROWSER_USER_AGENT: &str =
	"Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

// Full size image urls live in the `m` attribute of every result tile, html escaped
static MEDIA_URL: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"murl&quot;:&quot;(.*?)&quot;").expect("media url regex is valid")
});

/// Turns a free text query into candidate image URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
	async fn search(&self, query: &str, limit: usize) -> Result<Vec<Url>, SearchError>;
}

/// Scrapes the public Bing image results page.
pub struct BingImageSearch {
	client: reqwest::Client,
}

impl BingImageSearch {
	#[must_use]
	pub const fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl SearchProvider for BingImageSearch {
	async fn search(&self, query: &str, limit: usize) -> Result<Vec<Url>, SearchError> {
		let response = self
			.client
			.get(BING_IMAGES_URL)
			.query(&[("q", query), ("form", "HDRSC2"), ("first", "1")])
			.header(USER_AGENT, BROWSER_USER_AGENT)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(SearchError::Status(response.status()));
		}

		let urls = parse_results(&response.text().await?, limit);
		debug!(%query, found = urls.len(), "Image search finished");

		Ok(urls)
	}
}

/// Extracts up to `limit` distinct http(s) image URLs from a results page, in page order.
pub fn parse_results(html: &str, limit: usize) -> Vec<Url> {
	let mut seen = HashSet::new();

	MEDIA_URL
		.captures_iter(html)
		.filter_map(|captures| captures.get(1))
		.map(|raw| raw.as_str().replace("&amp;", "&"))
		.filter_map(|raw| Url::parse(&raw).ok())
		.filter(|url| matches!(url.scheme(), "http" | "https"))
		.filter(|url| seen.insert(url.clone()))
		.take(limit)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const PAGE: &str = r#"
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;https://cdn.example.com/bibimbap.jpg&quot;,&quot;turl&quot;:&quot;https://tse1.mm.bing.net/th?id=1&quot;}"></a></div>
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;http://food.example.org/img?id=2&amp;size=l&quot;}"></a></div>
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;https://cdn.example.com/bibimbap.jpg&quot;}"></a></div>
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;data:image/png;base64,AAAA&quot;}"></a></div>
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;not a url&quot;}"></a></div>
		<div class="imgpt"><a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example.net/3.png&quot;}"></a></div>
	"#;

	#[test]
	fn extracts_distinct_http_urls_in_order() {
		let urls = parse_results(PAGE, 10);

		assert_eq!(
			urls.iter().map(Url::as_str).collect::<Vec<_>>(),
			[
				"https://cdn.example.com/bibimbap.jpg",
				"http://food.example.org/img?id=2&size=l",
				"https://img.example.net/3.png",
			]
		);
	}

	#[test]
	fn respects_limit() {
		assert_eq!(parse_results(PAGE, 1).len(), 1);
		assert!(parse_results(PAGE, 0).is_empty());
	}

	#[test]
	fn page_without_results_yields_nothing() {
		assert!(parse_results("<html><body>No results</body></html>", 4).is_empty());
	}
}
