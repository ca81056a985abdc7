use crate::{
	error::ServerError,
	html::{self, HtmlPresenter},
	picks::OfferedPictures,
};

use foodie_core::{Error as CoreError, Node, Outcome, Presenter, Request};
use foodie_images::{decode_image, InputImage, GENERIC_MAXIMUM_FILE_SIZE};

use std::sync::Arc;

use axum::{
	extract::{DefaultBodyLimit, Form, Multipart, Query, State},
	response::Html,
	routing::{get, post},
	Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::spawn_blocking;
use tracing::debug;

// Room for the multipart framing around the largest image we accept
const UPLOAD_LIMIT: usize = GENERIC_MAXIMUM_FILE_SIZE as usize + 64 * 1024;

#[derive(Clone)]
struct AppState {
	node: Arc<Node>,
	offered: Arc<OfferedPictures>,
}

pub fn router(node: Arc<Node>) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/classify", post(classify_upload))
		.route("/classify/pick", post(classify_pick))
		.route("/search", get(search))
		.route("/health", get(health))
		.layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
		.with_state(AppState {
			node,
			offered: Arc::new(OfferedPictures::default()),
		})
}

#[derive(Debug, Deserialize)]
struct SearchParams {
	#[serde(default)]
	q: String,
}

#[derive(Debug, Deserialize)]
struct ChosenPicture {
	#[serde(default)]
	pick: String,
}

async fn index() -> Html<String> {
	Html(HtmlPresenter::default().render(&Outcome::AwaitingInput))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"status": "OK",
		"labels": state.node.catalog().len(),
		"classifier_ready": state.node.is_classifier_ready(),
	}))
}

async fn classify_upload(
	State(state): State<AppState>,
	mut multipart: Multipart,
) -> Result<Html<String>, ServerError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some("file") {
			continue;
		}

		let origin = field.file_name().unwrap_or("upload").to_string();
		let data = field.bytes().await?;
		// Browsers send an empty part when nothing was picked
		if data.is_empty() {
			break;
		}

		debug!(%origin, size = data.len(), "Received upload");
		let image = spawn_blocking(move || decode_image(&data, origin))
			.await?
			.map_err(CoreError::from)?;

		return classify(&state.node, image).await;
	}

	Err(ServerError::MissingUpload)
}

async fn classify_pick(
	State(state): State<AppState>,
	Form(chosen): Form<ChosenPicture>,
) -> Result<Html<String>, ServerError> {
	let search = state.node.search().ok_or(ServerError::SearchDisabled)?;

	let url = state
		.offered
		.resolve(&chosen.pick)
		.await
		.ok_or(ServerError::UnknownPick)?;

	let thumbnail = search.fetch_one(url).await?;

	classify(&state.node, thumbnail.image).await
}

async fn search(
	State(state): State<AppState>,
	Query(params): Query<SearchParams>,
) -> Result<Html<String>, ServerError> {
	let search = state.node.search().ok_or(ServerError::SearchDisabled)?;

	let thumbnails = search
		.candidates(&params.q)
		.await
		.map_err(CoreError::from)?;

	let mut offers = Vec::with_capacity(thumbnails.len());
	for thumbnail in thumbnails {
		offers.push((state.offered.offer(thumbnail.url.clone()).await, thumbnail.url));
	}

	Ok(Html(html::search_results(params.q.trim(), &offers)))
}

async fn classify(node: &Node, image: InputImage) -> Result<Html<String>, ServerError> {
	let (image, preview) = spawn_blocking(move || {
		let preview = html::preview(image.image());
		(image, preview)
	})
	.await?;

	let mut request = Request::new();
	request.receive(image)?;
	request.classify(node).await?;
	request.render(&HtmlPresenter::with_preview(preview))?;

	Ok(Html(request.into_rendered().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use foodie_ai::{
		Classifier, ClassifierError, ImageTensor, ModelBuilder, WeightFetchError, WeightFetcher,
		WeightSource,
	};
	use foodie_catalog::Catalog;
	use foodie_search::{
		ImageSearch, SearchError, SearchFetchError, SearchProvider, ThumbnailFetcher,
	};

	use std::{
		io::Cursor,
		path::{Path, PathBuf},
		time::Duration,
	};

	use async_trait::async_trait;
	use axum::{
		body::{to_bytes, Body},
		http::{header, Request as HttpRequest, StatusCode},
		response::Response,
	};
	use bytes::Bytes;
	use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
	use tower::ServiceExt;
	use url::Url;

	const BOUNDARY: &str = "foodie-test-boundary";

	struct StubFetcher {
		fail: bool,
	}

	#[async_trait]
	impl WeightFetcher for StubFetcher {
		async fn fetch(&self, source: &WeightSource) -> Result<PathBuf, WeightFetchError> {
			if self.fail {
				Err(WeightFetchError::InvalidSource("hub is offline".to_string()))
			} else {
				Ok(PathBuf::from("/models").join(&source.filename))
			}
		}
	}

	struct Always(usize, usize);

	impl Classifier for Always {
		fn num_classes(&self) -> usize {
			self.1
		}

		fn predict(&self, _input: &ImageTensor) -> Result<usize, ClassifierError> {
			Ok(self.0)
		}
	}

	struct StubBuilder(usize);

	impl ModelBuilder for StubBuilder {
		fn build(
			&self,
			_weights: &Path,
			num_labels: usize,
		) -> Result<Arc<dyn Classifier>, ClassifierError> {
			Ok(Arc::new(Always(self.0, num_labels)))
		}
	}

	struct TwoResults;

	#[async_trait]
	impl SearchProvider for TwoResults {
		async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Url>, SearchError> {
			Ok(vec![
				Url::parse("https://img.test/a.png").unwrap(),
				Url::parse("https://img.test/b.png").unwrap(),
			])
		}
	}

	struct PngEverywhere;

	#[async_trait]
	impl ThumbnailFetcher for PngEverywhere {
		async fn fetch(&self, _url: &Url) -> Result<Bytes, SearchFetchError> {
			Ok(Bytes::from(png()))
		}
	}

	struct RecordingFetcher(Arc<std::sync::Mutex<Vec<String>>>);

	#[async_trait]
	impl ThumbnailFetcher for RecordingFetcher {
		async fn fetch(&self, url: &Url) -> Result<Bytes, SearchFetchError> {
			self.0.lock().unwrap().push(url.to_string());
			Ok(Bytes::from(png()))
		}
	}

	fn png() -> Vec<u8> {
		let mut bytes = Cursor::new(Vec::new());
		DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([200, 120, 40])))
			.write_to(&mut bytes, ImageOutputFormat::Png)
			.unwrap();
		bytes.into_inner()
	}

	fn app(fail_fetch: bool, with_search: bool) -> Router {
		let search = with_search.then(|| {
			ImageSearch::new(
				Arc::new(TwoResults),
				Arc::new(PngEverywhere),
				4,
				Duration::from_secs(5),
			)
		});

		app_with(fail_fetch, search)
	}

	fn app_recording_fetches() -> (Router, Arc<std::sync::Mutex<Vec<String>>>) {
		let fetched = Arc::new(std::sync::Mutex::new(Vec::new()));
		let search = ImageSearch::new(
			Arc::new(TwoResults),
			Arc::new(RecordingFetcher(Arc::clone(&fetched))),
			4,
			Duration::from_secs(5),
		);

		(app_with(false, Some(search)), fetched)
	}

	fn app_with(fail_fetch: bool, search: Option<ImageSearch>) -> Router {
		let catalog = Catalog::bundled().unwrap();
		let pizza = catalog
			.labels()
			.iter()
			.position(|label| label == "pizza")
			.unwrap();

		router(Arc::new(Node::with_parts(
			catalog,
			WeightSource {
				endpoint: "https://huggingface.co".to_string(),
				repo_id: "eNtangedAI/my_foodie_classifier_demo".to_string(),
				filename: "vit_best.onnx".to_string(),
				revision: "main".to_string(),
				token_env: "FOODIE_SERVER_TEST_TOKEN".to_string(),
			},
			Arc::new(StubFetcher { fail: fail_fetch }),
			Arc::new(StubBuilder(pizza)),
			search,
		)))
	}

	fn upload(field: &str, data: &[u8]) -> HttpRequest<Body> {
		let mut body = format!(
			"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
			 filename=\"dinner.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
		)
		.into_bytes();
		body.extend_from_slice(data);
		body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

		HttpRequest::post("/classify")
			.header(
				header::CONTENT_TYPE,
				format!("multipart/form-data; boundary={BOUNDARY}"),
			)
			.body(Body::from(body))
			.unwrap()
	}

	fn pick(id: &str) -> HttpRequest<Body> {
		HttpRequest::post("/classify/pick")
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(format!(
				"pick={}",
				id.replace(':', "%3A").replace('/', "%2F")
			)))
			.unwrap()
	}

	/// Offer ids in the order the search page lists them
	fn offered_ids(page: &str) -> Vec<String> {
		page.split("name=\"pick\" value=\"")
			.skip(1)
			.map(|rest| rest.split('"').next().unwrap().to_string())
			.collect()
	}

	async fn search_page(app: &Router, query: &str) -> String {
		let response = app
			.clone()
			.oneshot(
				HttpRequest::get(format!("/search?q={query}"))
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		text(response).await
	}

	async fn text(response: Response) -> String {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[tokio::test]
	async fn index_shows_the_upload_form() {
		let response = app(false, true)
			.oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let page = text(response).await;
		assert!(page.contains("action=\"/classify\""));
		assert!(page.contains("Upload a food photo"));
	}

	#[tokio::test]
	async fn health_reports_catalog_and_classifier() {
		let response = app(false, true)
			.oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();

		let health: Value = serde_json::from_str(&text(response).await).unwrap();
		assert_eq!(health["status"], "OK");
		assert_eq!(health["labels"], 8);
		assert_eq!(health["classifier_ready"], false);
	}

	#[tokio::test]
	async fn uploaded_photo_gets_a_food_card() {
		let response = app(false, true).oneshot(upload("file", &png())).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let page = text(response).await;
		assert!(page.contains("<h2>pizza</h2>"), "{page}");
		assert!(page.contains("<dt>Calories</dt>"));
	}

	#[tokio::test]
	async fn garbage_upload_asks_for_another_photo() {
		let response = app(false, true)
			.oneshot(upload("file", b"definitely not a picture"))
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
		assert!(text(response).await.contains("Please try another photo"));
	}

	#[tokio::test]
	async fn missing_file_field_is_a_bad_request() {
		let response = app(false, true)
			.oneshot(upload("something_else", &png()))
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn unavailable_weights_are_visible() {
		let response = app(true, true).oneshot(upload("file", &png())).await.unwrap();

		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert!(text(response)
			.await
			.contains("Failed to download the model from the hub"));
	}

	#[tokio::test]
	async fn search_lists_pickable_thumbnails() {
		let page = search_page(&app(false, true), "kimchi%20stew").await;

		assert_eq!(page.matches("action=\"/classify/pick\"").count(), 2);
		assert_eq!(offered_ids(&page).len(), 2);
		assert!(page.contains("src=\"https://img.test/b.png\""));
		assert!(page.contains("kimchi stew"));
	}

	#[tokio::test]
	async fn blank_search_is_rejected() {
		let response = app(false, true)
			.oneshot(HttpRequest::get("/search?q=%20").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
	}

	#[tokio::test]
	async fn search_can_be_disabled() {
		let response = app(false, false)
			.oneshot(HttpRequest::get("/search?q=pizza").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn picked_thumbnail_is_classified() {
		let (app, fetched) = app_recording_fetches();
		let page = search_page(&app, "pizza").await;
		let ids = offered_ids(&page);

		let response = app.oneshot(pick(&ids[1])).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let page = text(response).await;
		assert!(page.contains("<h2>pizza</h2>"));
		assert!(page.contains("src=\"data:image/jpeg;base64,"));
		assert_eq!(
			fetched.lock().unwrap().last().map(String::as_str),
			Some("https://img.test/b.png")
		);
	}

	#[tokio::test]
	async fn only_offered_pictures_can_be_picked() {
		let (app, fetched) = app_recording_fetches();
		search_page(&app, "pizza").await;
		let before = fetched.lock().unwrap().len();

		for forged in [
			"http://169.254.169.254/latest/meta-data/",
			"http://localhost:8080/health",
			"file:///etc/passwd",
			"6f9619ff-8b86-4011-b42d-00c04fc964ff",
			"",
		] {
			let response = app.clone().oneshot(pick(forged)).await.unwrap();

			assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{forged}");
			assert!(text(response).await.contains("search again"));
		}
		assert_eq!(fetched.lock().unwrap().len(), before);
	}

	#[tokio::test]
	async fn uploaded_photo_is_shown_with_its_card() {
		let response = app(false, true).oneshot(upload("file", &png())).await.unwrap();

		let page = text(response).await;
		let photo = page.find("src=\"data:image/jpeg;base64,").unwrap();
		assert!(photo < page.find("<h2>pizza</h2>").unwrap());
	}
}
